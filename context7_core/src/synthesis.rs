//! Contract between the session orchestrator and whatever performs
//! retrieval-augmented completion.

use async_trait::async_trait;

use crate::{ChatMessage, Turn};

/// Everything one retrieval-and-synthesis call needs.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub system_prompt: String,
    /// Prior turns of the active conversation, oldest first.
    pub history: Vec<Turn>,
    pub message: String,
}

impl SynthesisRequest {
    /// Flatten into chat messages: system prompt, prior turns, new message.
    #[must_use]
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.history.len() * 2 + 2);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        for turn in &self.history {
            messages.push(ChatMessage::user(turn.user.clone()));
            messages.push(ChatMessage::assistant(turn.assistant.clone()));
        }
        messages.push(ChatMessage::user(self.message.clone()));
        messages
    }
}

/// Performs one request-in, response-out synthesis.
///
/// Implementations own tool invocation and grounding; callers only see
/// the final text or an error.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> anyhow::Result<String>;
}

#[async_trait]
impl<T: Synthesizer + ?Sized> Synthesizer for std::sync::Arc<T> {
    async fn synthesize(&self, request: &SynthesisRequest) -> anyhow::Result<String> {
        (**self).synthesize(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn messages_follow_turn_order() {
        let request = SynthesisRequest {
            system_prompt: "sys".to_string(),
            history: vec![Turn::new("q1", "a1"), Turn::new("q2", "a2")],
            message: "q3".to_string(),
        };

        let messages = request.to_messages();
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            [
                Role::System,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant,
                Role::User
            ]
        );
        assert_eq!(messages[1].content, "q1");
        assert_eq!(messages[4].content, "a2");
        assert_eq!(messages[5].content, "q3");
    }
}
