use context7_config::Config;
use context7_tools::CommandSpec;

use super::load_local_config;
use crate::display::mask_secret;

/// Strategy for displaying configuration information.
///
/// Shows the effective configuration after environment overrides, with the
/// API key masked. Works without an API key so a broken setup can be
/// inspected.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = load_local_config()?;

        println!("=== context7 Configuration ===\n");

        println!("Config file: {}", Config::config_path()?.display());
        if let Err(e) = config.validate() {
            println!("  Problem: {e}");
        }
        println!();

        println!("Completion provider:");
        println!("  API Key: {}", mask_secret(&config.openai.api_key));
        println!("  Base URL: {}", config.openai.base_url);
        println!("  Model: {}", config.openai.model);
        println!("  Temperature: {}", config.openai.temperature);
        if let Some(max_tokens) = config.openai.max_tokens {
            println!("  Max Tokens: {max_tokens}");
        }
        println!("  Timeout: {}s", config.openai.request_timeout_secs);
        println!();

        println!("Knowledge base:");
        let spec = CommandSpec::new(config.mcp.command.clone(), config.mcp.args.clone());
        println!("  Command: {}", spec.display());
        println!("  Timeout: {}s", config.mcp.request_timeout_secs);
        println!("  Max Tool Rounds: {}", config.mcp.max_tool_rounds);
        println!();

        println!("History:");
        println!("  File: {}", config.history_path()?.display());
        match config.history.max_turns {
            Some(max) => println!("  Max Turns: {max}"),
            None => println!("  Max Turns: unlimited"),
        }

        Ok(())
    }
}
