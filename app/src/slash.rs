/// Commands understood by the interactive prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    History,
    Clear,
    ClearAll,
    New,
    Switch(String),
    Code,
    Exit,
    Unknown(String),
}

impl SlashCommand {
    /// `None` when `text` is an ordinary message rather than a command.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if !text.starts_with('/') {
            return None;
        }

        let mut parts = text.split_whitespace();
        let command = parts.next().unwrap_or_default().to_lowercase();
        let argument = parts.next();

        let parsed = match (command.as_str(), argument) {
            ("/help", _) => Self::Help,
            ("/history", _) => Self::History,
            ("/clear", None) => Self::Clear,
            ("/clear", Some(arg)) if arg.eq_ignore_ascii_case("all") => Self::ClearAll,
            ("/new", _) => Self::New,
            ("/switch", Some(id)) => Self::Switch(id.to_string()),
            ("/code", _) => Self::Code,
            ("/exit" | "/quit", _) => Self::Exit,
            _ => Self::Unknown(text.to_string()),
        };
        Some(parsed)
    }

    #[must_use]
    pub const fn help_text() -> &'static str {
        r"
Commands:
  /help          Show this help
  /history       List conversations
  /clear         Delete the current conversation
  /clear all     Delete every conversation
  /new           Start a new conversation
  /switch <id>   Continue another conversation
  /code          Print the code blocks of the last answer
  /exit          Leave (Ctrl-D works too)

Ctrl-C while waiting for an answer cancels that turn; it is not saved
unless the answer had already arrived.
"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(SlashCommand::parse("what is tokio?"), None);
        assert_eq!(SlashCommand::parse(""), None);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(SlashCommand::parse("/help"), Some(SlashCommand::Help));
        assert_eq!(SlashCommand::parse("  /HISTORY "), Some(SlashCommand::History));
        assert_eq!(SlashCommand::parse("/clear"), Some(SlashCommand::Clear));
        assert_eq!(SlashCommand::parse("/clear all"), Some(SlashCommand::ClearAll));
        assert_eq!(SlashCommand::parse("/new"), Some(SlashCommand::New));
        assert_eq!(
            SlashCommand::parse("/switch react-hooks"),
            Some(SlashCommand::Switch("react-hooks".to_string()))
        );
        assert_eq!(SlashCommand::parse("/code"), Some(SlashCommand::Code));
        assert_eq!(SlashCommand::parse("/quit"), Some(SlashCommand::Exit));
    }

    #[test]
    fn test_malformed_commands_are_unknown() {
        assert_eq!(
            SlashCommand::parse("/switch"),
            Some(SlashCommand::Unknown("/switch".to_string()))
        );
        assert_eq!(
            SlashCommand::parse("/clear everything"),
            Some(SlashCommand::Unknown("/clear everything".to_string()))
        );
        assert_eq!(
            SlashCommand::parse("/theme"),
            Some(SlashCommand::Unknown("/theme".to_string()))
        );
    }
}
