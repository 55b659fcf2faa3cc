//! Static strategy pattern for CLI commands.
//!
//! Each subcommand is a zero-sized strategy type with its own input type,
//! dispatched statically from `main`.

use std::sync::Arc;

use context7_agent::{Context7Agent, ToolAgent};
use context7_config::Config;
use context7_history::HistoryStore;
use context7_providers::OpenAIProvider;
use context7_tools::{CommandSpec, McpLauncher};
use tracing::info;

mod chat;
mod clear;
mod history;
mod info;
mod init;
mod show;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use clear::{ClearInput, ClearStrategy};
pub use history::{HistoryInput, HistoryStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use show::ShowStrategy;
pub use version::VersionStrategy;

/// The production agent: OpenAI-compatible completions plus Context7 tools.
pub type Agent = Context7Agent<ToolAgent<OpenAIProvider, McpLauncher>>;

/// Core trait defining the contract for all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Configuration for commands that never talk to the model, so a missing
/// API key is not an error for them.
fn load_local_config() -> anyhow::Result<Config> {
    Config::load_from(&Config::config_path()?, |key| std::env::var(key).ok())
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<HistoryStore>> {
    let path = config.history_path()?;
    info!("History file: {}", path.display());

    let mut store = HistoryStore::new(path);
    if let Some(max_turns) = config.history.max_turns {
        store = store.with_max_turns(max_turns);
    }
    let loaded = store.load().await;
    info!("Loaded {loaded} conversations");
    Ok(Arc::new(store))
}

fn build_agent(config: &Config, store: Arc<HistoryStore>, model: Option<String>) -> anyhow::Result<Agent> {
    let mut provider = OpenAIProvider::new(config.openai.api_key.clone(), config.openai.request_timeout())?
        .with_base_url(config.openai.base_url.clone())
        .with_default_model(config.openai.model.clone())
        .with_temperature(config.openai.temperature);
    if let Some(max_tokens) = config.openai.max_tokens {
        provider = provider.with_max_tokens(max_tokens);
    }

    let launcher = McpLauncher::new(
        CommandSpec::new(config.mcp.command.clone(), config.mcp.args.clone()),
        config.mcp.request_timeout(),
    );

    let mut synthesizer = ToolAgent::new(provider, launcher).with_max_tool_rounds(config.mcp.max_tool_rounds);
    if let Some(model) = model {
        synthesizer = synthesizer.with_model(model);
    }

    Ok(Context7Agent::new(synthesizer, store))
}
