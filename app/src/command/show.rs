use super::{load_local_config, open_store};
use crate::display::format_turns;

/// Strategy for printing every turn of one conversation.
#[derive(Debug, Clone, Copy)]
pub struct ShowStrategy;

impl super::CommandStrategy for ShowStrategy {
    type Input = String;

    async fn execute(&self, conversation_id: Self::Input) -> anyhow::Result<()> {
        let config = load_local_config()?;
        let store = open_store(&config).await?;

        let turns = store.get_messages(&conversation_id).await;
        print!("{}", format_turns(&conversation_id, &turns));
        Ok(())
    }
}
