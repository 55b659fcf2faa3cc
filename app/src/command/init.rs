use context7_config::{API_KEY_ENV, Config};

/// Strategy for initializing the configuration.
///
/// Creates `~/context7/config.json` with every default spelled out.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let path = Config::create_config()?;

        println!("Created config file at: {}", path.display());
        println!();
        println!("Next steps:");
        println!("   1. Add your OpenAI API key to the config file (or set {API_KEY_ENV})");
        println!("   2. Make sure `npx` is available to start the Context7 MCP server");
        println!("   3. Run 'context7 chat' to start a conversation");
        println!();
        Ok(())
    }
}
