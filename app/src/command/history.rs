use tracing::debug;

use super::{load_local_config, open_store};
use crate::display::{filter_conversations, format_conversations};

/// Input parameters for the History command strategy.
#[derive(Debug, Clone)]
pub struct HistoryInput {
    pub filter: Option<String>,
}

/// Strategy for listing stored conversations, most recent first.
#[derive(Debug, Clone, Copy)]
pub struct HistoryStrategy;

impl super::CommandStrategy for HistoryStrategy {
    type Input = HistoryInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = load_local_config()?;
        let store = open_store(&config).await?;

        let mut conversations = store.get_conversations().await;
        if let Some(query) = input.filter.as_deref() {
            conversations = filter_conversations(conversations, query);
            debug!("{} conversations match '{query}'", conversations.len());
        }

        print!("{}", format_conversations(&conversations));
        Ok(())
    }
}
