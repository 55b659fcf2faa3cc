//! Interactive prompt.

use std::io::Write;

use context7_agent::Context7Agent;
use context7_core::util::{extract_code_blocks, generate_conversation_id};
use context7_core::{ChatOutcome, Synthesizer};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use uuid::Uuid;

use crate::display::{format_code_blocks, format_conversations};
use crate::slash::SlashCommand;

/// Conversations shown by `/history`.
const HISTORY_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct Repl<'a, S> {
    agent: &'a Context7Agent<S>,
    conversation_id: String,
    last_answer: Option<String>,
}

impl<'a, S: Synthesizer> Repl<'a, S> {
    pub const fn new(agent: &'a Context7Agent<S>, conversation_id: String) -> Self {
        Self {
            agent,
            conversation_id,
            last_answer: None,
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        println!(
            "Context7 chat, conversation '{}'. Type /help for commands.\n",
            self.conversation_id()
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => None,
            };
            let Some(line) = line else {
                println!();
                break;
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            if let Some(command) = SlashCommand::parse(input) {
                if self.handle(command).await? == Flow::Exit {
                    break;
                }
                continue;
            }

            let outcome = tokio::select! {
                outcome = self.agent.chat(input, Some(self.conversation_id.as_str())) => Some(outcome),
                _ = tokio::signal::ctrl_c() => None,
            };
            match outcome {
                Some(outcome) => self.show(&outcome),
                None => {
                    info!("Turn cancelled by user");
                    println!("\nCancelled. An unanswered question is not saved.\n");
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn show(&mut self, outcome: &ChatOutcome) {
        match outcome {
            ChatOutcome::Success { data, .. } => {
                println!("\n{data}\n");
                self.last_answer = Some(data.clone());
            }
            ChatOutcome::Error { data, .. } => eprintln!("\nError: {data}\n"),
        }
    }

    async fn handle(&mut self, command: SlashCommand) -> anyhow::Result<Flow> {
        debug!("Slash command: {command:?}");
        match command {
            SlashCommand::Help => println!("{}", SlashCommand::help_text()),
            SlashCommand::History => {
                let mut conversations = self.agent.get_conversations().await;
                conversations.truncate(HISTORY_ROWS);
                print!("{}", format_conversations(&conversations));
            }
            SlashCommand::Clear => {
                self.agent.clear_history(Some(self.conversation_id.as_str())).await?;
                self.last_answer = None;
                println!("History for conversation '{}' cleared.", self.conversation_id);
            }
            SlashCommand::ClearAll => {
                self.agent.clear_history(None).await?;
                self.last_answer = None;
                println!("All conversations cleared.");
            }
            SlashCommand::New => {
                self.conversation_id = generate_conversation_id(&Uuid::now_v7().to_string());
                self.last_answer = None;
                println!("Started conversation '{}'.", self.conversation_id);
            }
            SlashCommand::Switch(id) => {
                let turns = self.agent.get_messages(&id).await;
                self.last_answer = turns.last().map(|t| t.assistant.clone());
                println!("Switched to conversation '{id}' ({} turns).", turns.len());
                self.conversation_id = id;
            }
            SlashCommand::Code => {
                let blocks = self
                    .last_answer
                    .as_deref()
                    .map(extract_code_blocks)
                    .unwrap_or_default();
                print!("{}", format_code_blocks(&blocks));
            }
            SlashCommand::Exit => return Ok(Flow::Exit),
            SlashCommand::Unknown(text) => {
                println!("Unknown command: {text}. Type /help for commands.");
            }
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use context7_core::SynthesisRequest;
    use context7_history::HistoryStore;
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl Synthesizer for Echo {
        async fn synthesize(&self, request: &SynthesisRequest) -> anyhow::Result<String> {
            Ok(format!("```rust\n{}\n```", request.message))
        }
    }

    fn agent(dir: &tempfile::TempDir) -> Context7Agent<Echo> {
        Context7Agent::new(Echo, Arc::new(HistoryStore::new(dir.path().join("h.json"))))
    }

    #[tokio::test]
    async fn test_new_and_switch() {
        let dir = tempfile::tempdir().unwrap();
        let agent = agent(&dir);
        agent.chat("fn a() {}", Some("first")).await;

        let mut repl = Repl::new(&agent, "first".to_string());
        repl.handle(SlashCommand::New).await.unwrap();
        assert_ne!(repl.conversation_id(), "first");
        assert_eq!(repl.conversation_id().len(), 8);
        assert!(repl.last_answer.is_none());

        repl.handle(SlashCommand::Switch("first".to_string())).await.unwrap();
        assert_eq!(repl.conversation_id(), "first");
        assert_eq!(repl.last_answer.as_deref(), Some("```rust\nfn a() {}\n```"));
    }

    #[tokio::test]
    async fn test_clear_current_only() {
        let dir = tempfile::tempdir().unwrap();
        let agent = agent(&dir);
        agent.chat("one", Some("a")).await;
        agent.chat("two", Some("b")).await;

        let mut repl = Repl::new(&agent, "a".to_string());
        repl.handle(SlashCommand::Clear).await.unwrap();
        assert!(agent.get_messages("a").await.is_empty());
        assert_eq!(agent.get_messages("b").await.len(), 1);

        repl.handle(SlashCommand::ClearAll).await.unwrap();
        assert!(agent.get_conversations().await.is_empty());
    }

    #[tokio::test]
    async fn test_answers_are_remembered_for_code() {
        let dir = tempfile::tempdir().unwrap();
        let agent = agent(&dir);
        let mut repl = Repl::new(&agent, "c".to_string());

        let outcome = agent.chat("let x = 1;", Some("c")).await;
        repl.show(&outcome);
        let blocks = extract_code_blocks(repl.last_answer.as_deref().unwrap());
        assert_eq!(blocks[0].language, "rust");
        assert_eq!(blocks[0].code, "let x = 1;");

        assert_eq!(repl.handle(SlashCommand::Code).await.unwrap(), Flow::Continue);
        assert_eq!(repl.handle(SlashCommand::Exit).await.unwrap(), Flow::Exit);
    }
}
