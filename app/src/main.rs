#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;
mod display;
mod repl;
mod slash;

use clap::{ArgAction, Parser, Subcommand};
use command::{
    ChatInput, ChatStrategy, ClearInput, ClearStrategy, CommandStrategy, HistoryInput,
    HistoryStrategy, InfoStrategy, InitStrategy, ShowStrategy, VersionStrategy,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "context7")]
#[command(about = "Documentation-grounded chat assistant backed by Context7", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat interactively, or send a single message
    Chat {
        /// Conversation to continue
        #[arg(short = 'c', long = "conversation")]
        conversation: Option<String>,

        /// Single message to send
        #[arg(short = 'm', long)]
        message: Option<String>,

        /// Model to use
        #[arg(short = 'M', long)]
        model: Option<String>,

        /// Start a fresh conversation
        #[arg(long, conflicts_with = "conversation")]
        new: bool,
    },
    /// List conversations
    History {
        /// Only show conversations matching these words
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Print every turn of one conversation
    Show {
        /// Conversation id
        id: String,
    },
    /// Delete one conversation, or all of them
    Clear {
        /// Conversation id
        id: Option<String>,

        /// Delete every conversation
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },
    /// Initialize configuration
    Init,
    /// Show configuration
    Info,
    /// Show version
    Version,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Chat {
            conversation,
            message,
            model,
            new,
        } => {
            ChatStrategy
                .execute(ChatInput {
                    conversation,
                    message,
                    model,
                    new,
                })
                .await
        }
        Commands::History { filter } => HistoryStrategy.execute(HistoryInput { filter }).await,
        Commands::Show { id } => ShowStrategy.execute(id).await,
        Commands::Clear { id, all } => ClearStrategy.execute(ClearInput { id, all }).await,
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Info => InfoStrategy.execute(()).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chat_flags() {
        let cli = Cli::try_parse_from(["context7", "-vv", "chat", "-c", "react", "-m", "hooks?"]).unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Chat {
            conversation,
            message,
            new,
            ..
        } = cli.command
        else {
            panic!("expected chat");
        };
        assert_eq!(conversation.as_deref(), Some("react"));
        assert_eq!(message.as_deref(), Some("hooks?"));
        assert!(!new);
    }

    #[test]
    fn new_conflicts_with_conversation() {
        assert!(Cli::try_parse_from(["context7", "chat", "--new", "-c", "x"]).is_err());
    }

    #[test]
    fn clear_all_conflicts_with_id() {
        assert!(Cli::try_parse_from(["context7", "clear", "x", "--all"]).is_err());
        assert!(Cli::try_parse_from(["context7", "clear", "--all"]).is_ok());
    }
}
