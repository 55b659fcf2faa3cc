//! Plain-text rendering for the terminal.

use std::fmt::Write as _;

use context7_core::util::{CodeBlock, fuzzy_match, truncate_preview};
use context7_core::{ConversationSummary, Turn};

/// Minimum share of query words a conversation must match to be listed.
const FILTER_THRESHOLD: f64 = 0.5;

const ID_WIDTH: usize = 12;

pub fn format_conversations(conversations: &[ConversationSummary]) -> String {
    if conversations.is_empty() {
        return "No conversation history\n".to_string();
    }

    let mut out = format!("{:<ID_WIDTH$}  {:>5}  {:<16}  LAST MESSAGE\n", "ID", "TURNS", "UPDATED");
    for conv in conversations {
        let _ = writeln!(
            out,
            "{:<ID_WIDTH$}  {:>5}  {:<16}  {}",
            truncate_preview(&conv.id, ID_WIDTH - 3),
            conv.turn_count,
            conv.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            conv.last_message.replace('\n', " ")
        );
    }
    out
}

pub fn format_turns(conversation_id: &str, turns: &[Turn]) -> String {
    if turns.is_empty() {
        return format!("Conversation '{conversation_id}' has no turns\n");
    }

    let mut out = String::new();
    for (n, turn) in turns.iter().enumerate() {
        let _ = writeln!(
            out,
            "--- {} [{}] ---",
            n + 1,
            turn.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "You: {}\n", turn.user);
        let _ = writeln!(out, "Assistant: {}\n", turn.assistant);
    }
    out
}

pub fn format_code_blocks(blocks: &[CodeBlock]) -> String {
    if blocks.is_empty() {
        return "No code blocks in the last answer\n".to_string();
    }

    let mut out = String::new();
    for (n, block) in blocks.iter().enumerate() {
        let _ = writeln!(out, "[{}] {}\n{}\n", n + 1, block.language, block.code);
    }
    out
}

/// Conversations whose id or preview match `query`, best match first.
pub fn filter_conversations(
    conversations: Vec<ConversationSummary>,
    query: &str,
) -> Vec<ConversationSummary> {
    let mut scored: Vec<(f64, ConversationSummary)> = conversations
        .into_iter()
        .map(|conv| {
            let haystack = format!("{} {}", conv.id, conv.last_message);
            (fuzzy_match(query, &haystack), conv)
        })
        .filter(|(score, _)| *score >= FILTER_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, conv)| conv).collect()
}

pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if secret.is_empty() {
        "(not set)".to_string()
    } else if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "***".to_string()
    }
}
