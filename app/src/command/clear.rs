use super::{load_local_config, open_store};

/// Input parameters for the Clear command strategy.
#[derive(Debug, Clone)]
pub struct ClearInput {
    pub id: Option<String>,
    pub all: bool,
}

/// Strategy for deleting one conversation or all of them.
#[derive(Debug, Clone, Copy)]
pub struct ClearStrategy;

impl super::CommandStrategy for ClearStrategy {
    type Input = ClearInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let target = match (input.id, input.all) {
            (Some(id), false) => Some(id),
            (None, true) => None,
            _ => anyhow::bail!("Specify a conversation id or --all"),
        };

        let config = load_local_config()?;
        let store = open_store(&config).await?;
        store.clear(target.as_deref()).await?;

        match target {
            Some(id) => println!("Conversation '{id}' cleared."),
            None => println!("All conversations cleared."),
        }
        Ok(())
    }
}
