use thiserror::Error;

pub type Result<T> = std::result::Result<T, McpError>;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("Failed to start tool server `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Tool server I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Tool server error (code {code}): {message}")]
    Rpc { code: i64, message: String },

    #[error("Tool server closed the connection")]
    TransportClosed,

    #[error("Tool server did not answer `{0}` in time")]
    Timeout(String),

    #[error("Unexpected response to `{method}`: {detail}")]
    UnexpectedResponse { method: String, detail: String },
}

impl McpError {
    /// Whether the connection is unusable after this error.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::TransportClosed | Self::Timeout(_) | Self::Spawn { .. }
        )
    }
}
