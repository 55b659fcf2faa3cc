//! Conversation data model shared by the history store and the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Conversation key used when the caller does not name one.
pub const DEFAULT_CONVERSATION_ID: &str = "default";

/// One user utterance and the assistant response it resolved to.
///
/// Turns are immutable once written; a conversation is an ordered
/// sequence of them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub user: String,
    pub assistant: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a turn stamped with the current time.
    #[must_use]
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Listing metadata for one conversation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConversationSummary {
    pub id: String,
    /// Preview of the most recent assistant text.
    pub last_message: String,
    pub turn_count: usize,
    pub updated_at: DateTime<Utc>,
}

/// Result of one `chat` call.
///
/// Serialized with an explicit `type` discriminator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatOutcome {
    Success {
        data: String,
        timestamp: DateTime<Utc>,
    },
    Error {
        data: String,
        timestamp: DateTime<Utc>,
    },
}

impl ChatOutcome {
    #[must_use]
    pub fn success(data: impl Into<String>) -> Self {
        Self::Success {
            data: data.into(),
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn error(data: impl Into<String>) -> Self {
        Self::Error {
            data: data.into(),
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Response text on success, error description otherwise.
    #[must_use]
    pub fn data(&self) -> &str {
        match self {
            Self::Success { data, .. } | Self::Error { data, .. } => data,
        }
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Success { timestamp, .. } | Self::Error { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_carries_type_discriminator() {
        let json = serde_json::to_value(ChatOutcome::success("answer")).unwrap();
        assert_eq!(json["type"], "success");
        assert_eq!(json["data"], "answer");
        assert!(json["timestamp"].is_string());

        let json = serde_json::to_value(ChatOutcome::error("boom")).unwrap();
        assert_eq!(json["type"], "error");
    }

    #[test]
    fn outcome_accessors() {
        let outcome = ChatOutcome::error("provider unavailable");
        assert!(!outcome.is_success());
        assert_eq!(outcome.data(), "provider unavailable");
    }

    #[test]
    fn turn_serializes_both_speakers() {
        let turn = Turn::new("What is X?", "X is Y.");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["user"], "What is X?");
        assert_eq!(json["assistant"], "X is Y.");
        assert!(json["timestamp"].is_string());
    }
}
