//! Chat command: one-shot message or interactive session.

use context7_config::Config;
use context7_core::DEFAULT_CONVERSATION_ID;
use context7_core::util::generate_conversation_id;
use tracing::info;
use uuid::Uuid;

use super::{build_agent, open_store};
use crate::repl::Repl;

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    /// Conversation to continue (defaults to `default`)
    pub conversation: Option<String>,
    /// Single message to send (non-interactive mode)
    pub message: Option<String>,
    /// Model override
    pub model: Option<String>,
    /// Start a fresh conversation instead of continuing one
    pub new: bool,
}

impl ChatInput {
    fn conversation_id(&self) -> String {
        if self.new {
            let seed = self
                .message
                .clone()
                .unwrap_or_else(|| Uuid::now_v7().to_string());
            return generate_conversation_id(&seed);
        }
        self.conversation
            .clone()
            .unwrap_or_else(|| DEFAULT_CONVERSATION_ID.to_string())
    }
}

/// Strategy for executing the Chat command.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let store = open_store(&config).await?;
        let conversation_id = input.conversation_id();
        let agent = build_agent(&config, store, input.model.clone())?;

        info!(
            "Chat on conversation {conversation_id} with model {}",
            agent.synthesizer().model()
        );

        let result = match input.message {
            Some(message) => {
                let outcome = agent.chat(&message, Some(conversation_id.as_str())).await;
                if outcome.is_success() {
                    println!("{}", outcome.data());
                    Ok(())
                } else {
                    Err(anyhow::anyhow!("{}", outcome.data()))
                }
            }
            None => Repl::new(&agent, conversation_id).run().await,
        };

        agent.synthesizer().shutdown().await;
        result
    }
}
