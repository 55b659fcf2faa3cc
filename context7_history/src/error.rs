use std::path::PathBuf;

use context7_core::Role;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HistoryError>;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to write history file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("assistant message for conversation '{0}' has no pending user message")]
    UnpairedAssistant(String),

    #[error("role '{0}' cannot be stored in conversation history")]
    UnsupportedRole(Role),

    #[error("history update did not complete: {0}")]
    Interrupted(String),
}

impl HistoryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
