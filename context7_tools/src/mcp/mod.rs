//! Client side of the Model Context Protocol over stdio.

mod client;
mod error;
pub mod protocol;
mod tool;

pub use client::McpClient;
pub use error::{McpError, Result};
pub use tool::{McpLauncher, McpTool};
