//! Text helpers for conversation keys, previews and code extraction.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```([\w+-]*)[ \t]*\n(.*?)\n?```").expect("valid code block pattern")
});

/// A fenced code block pulled out of markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: String,
    pub code: String,
}

/// Derive a short, stable conversation key from free text.
///
/// Returns the first 8 hex characters of the SHA-256 digest.
#[must_use]
pub fn generate_conversation_id(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut hex = format!("{digest:x}");
    hex.truncate(8);
    hex
}

/// Extract fenced code blocks. Untagged blocks are reported as `text`.
#[must_use]
pub fn extract_code_blocks(text: &str) -> Vec<CodeBlock> {
    CODE_BLOCK
        .captures_iter(text)
        .map(|caps| {
            let language = caps
                .get(1)
                .map(|m| m.as_str())
                .filter(|s| !s.is_empty())
                .unwrap_or("text");
            CodeBlock {
                language: language.to_string(),
                code: caps
                    .get(2)
                    .map_or("", |m| m.as_str())
                    .trim()
                    .to_string(),
            }
        })
        .collect()
}

/// Fraction of query words that appear inside some word of `text`.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "word counts are small")]
pub fn fuzzy_match(query: &str, text: &str) -> f64 {
    let text = text.to_lowercase();
    let text_words: Vec<&str> = text.split_whitespace().collect();
    let query = query.to_lowercase();
    let query_words: Vec<&str> = query.split_whitespace().collect();

    if query_words.is_empty() {
        return 0.0;
    }

    let matches = query_words
        .iter()
        .filter(|qw| text_words.iter().any(|tw| tw.contains(*qw)))
        .count();
    matches as f64 / query_words.len() as f64
}

/// Char-safe preview: at most `max_chars` characters, `...` appended when cut.
#[must_use]
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
