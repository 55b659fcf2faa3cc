//! Session orchestrator: one utterance in, one committed turn out.

use std::sync::Arc;

use context7_core::{
    AGENT_SYSTEM_PROMPT, ChatOutcome, ConversationSummary, DEFAULT_CONVERSATION_ID,
    SynthesisRequest, Synthesizer, Turn,
};
use context7_history::{HistoryError, HistoryStore};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::turn::TurnState;

/// Errors that can occur while handling a turn.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Failed to get a response: {0}")]
    Synthesis(#[source] anyhow::Error),

    #[error("Failed to save conversation history: {0}")]
    History(#[from] HistoryError),
}

/// Drives turns against a shared history store.
///
/// At most one turn is in flight per agent. Dropping the future returned by
/// [`Context7Agent::chat`] before it resolves abandons the turn and writes
/// nothing.
pub struct Context7Agent<S> {
    synthesizer: S,
    store: Arc<HistoryStore>,
    system_prompt: String,
    /// Guards the single in-flight turn and remembers how the last one ended.
    turn_gate: Mutex<TurnState>,
}

impl<S: Synthesizer> Context7Agent<S> {
    pub fn new(synthesizer: S, store: Arc<HistoryStore>) -> Self {
        info!("Creating Context7 agent backed by {}", store.path().display());
        Self {
            synthesizer,
            store,
            system_prompt: AGENT_SYSTEM_PROMPT.to_string(),
            turn_gate: Mutex::new(TurnState::Idle),
        }
    }

    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<HistoryStore> {
        &self.store
    }

    #[must_use]
    pub const fn synthesizer(&self) -> &S {
        &self.synthesizer
    }

    /// `AwaitingResponse` while a turn is running, otherwise how the last
    /// turn ended.
    #[must_use]
    pub fn turn_state(&self) -> TurnState {
        self.turn_gate
            .try_lock()
            .map_or(TurnState::AwaitingResponse, |state| *state)
    }

    /// Handle one user turn. Never fails: every fault becomes an error
    /// outcome and leaves the history untouched.
    pub async fn chat(&self, message: &str, conversation_id: Option<&str>) -> ChatOutcome {
        let conversation_id = conversation_id.unwrap_or(DEFAULT_CONVERSATION_ID);
        match self.process_turn(message, conversation_id).await {
            Ok(turn) => ChatOutcome::Success {
                data: turn.assistant,
                timestamp: turn.timestamp,
            },
            Err(e) => {
                error!("Turn failed for conversation {conversation_id}: {e:?}");
                ChatOutcome::error(e.to_string())
            }
        }
    }

    /// Like [`Self::chat`] but with the typed error and the committed turn.
    pub async fn process_turn(
        &self,
        message: &str,
        conversation_id: &str,
    ) -> Result<Turn, ConversationError> {
        if message.trim().is_empty() {
            return Err(ConversationError::EmptyMessage);
        }

        let mut gate = self.turn_gate.lock().await;
        debug!("Turn state for {conversation_id}: {} -> {}", *gate, TurnState::AwaitingResponse);

        let result = self.run_turn(message, conversation_id).await;

        let next = if result.is_ok() {
            TurnState::TurnCommitted
        } else {
            TurnState::TurnFailed
        };
        debug!("Turn state for {conversation_id}: {} -> {next}", TurnState::AwaitingResponse);
        *gate = next;
        result
    }

    async fn run_turn(&self, message: &str, conversation_id: &str) -> Result<Turn, ConversationError> {
        let history = self.store.get_messages(conversation_id).await;
        info!(
            "Processing turn {} for conversation: {conversation_id}",
            history.len() + 1
        );

        let request = SynthesisRequest {
            system_prompt: self.system_prompt.clone(),
            history,
            message: message.to_string(),
        };

        let response = self
            .synthesizer
            .synthesize(&request)
            .await
            .map_err(ConversationError::Synthesis)?;

        let turn = self
            .store
            .add_turn(conversation_id, message, &response)
            .await?;

        debug!("Turn committed for conversation: {conversation_id}");
        Ok(turn)
    }

    pub async fn get_messages(&self, conversation_id: &str) -> Vec<Turn> {
        self.store.get_messages(conversation_id).await
    }

    pub async fn get_conversations(&self) -> Vec<ConversationSummary> {
        self.store.get_conversations().await
    }

    /// Remove one conversation, or all of them when `conversation_id` is `None`.
    pub async fn clear_history(&self, conversation_id: Option<&str>) -> Result<(), ConversationError> {
        self.store.clear(conversation_id).await?;
        Ok(())
    }
}
