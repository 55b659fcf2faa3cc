use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use context7_core::util::truncate_preview;
use context7_core::{ConversationSummary, Role, Turn};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{HistoryError, Result};

/// Characters of the last assistant message shown in listings.
pub const PREVIEW_CHARS: usize = 50;

/// Conversation key → ordered turns. This is exactly what is persisted.
pub type History = BTreeMap<String, Vec<Turn>>;

#[derive(Debug, Default, Clone)]
struct HistoryState {
    conversations: History,
    /// User halves written through `add_message` that are still waiting
    /// for their assistant half. Never persisted, never readable.
    open_turns: HashMap<String, String>,
}

impl HistoryState {
    fn push_turn(&mut self, conversation_id: &str, turn: Turn, max_turns: Option<usize>) {
        let turns = self.conversations.entry(conversation_id.to_string()).or_default();
        turns.push(turn);
        if let Some(max) = max_turns
            && turns.len() > max
        {
            let excess = turns.len() - max;
            turns.drain(..excess);
            debug!("Pruned {excess} old turns from conversation {conversation_id}");
        }
    }
}

/// File-backed conversation history.
///
/// Every mutation is applied to a copy of the state, flushed to disk (write
/// to a temporary file, then rename over the target), and only then swapped
/// into memory. A failed flush leaves both the file and the in-memory state
/// untouched. The flush and the swap run on their own task, so a caller that
/// stops waiting cannot leave the file ahead of memory.
pub struct HistoryStore {
    path: PathBuf,
    max_turns: Option<usize>,
    state: Arc<Mutex<HistoryState>>,
}

impl HistoryStore {
    /// Create an empty store backed by `path`. Nothing is read until `load`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_turns: None,
            state: Arc::new(Mutex::new(HistoryState::default())),
        }
    }

    /// Keep at most `max_turns` turns per conversation, dropping the oldest.
    #[must_use]
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = Some(max_turns.max(1));
        self
    }

    /// Create a store and load it from `path`.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let store = Self::new(path);
        store.load().await;
        store
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory mapping with the contents of the history file.
    ///
    /// A missing, empty, unreadable or corrupt file yields an empty store.
    /// Returns the number of conversations loaded.
    pub async fn load(&self) -> usize {
        let history = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => {
                debug!("History file {} is empty", self.path.display());
                History::new()
            }
            Ok(content) => match serde_json::from_str::<History>(&content) {
                Ok(history) => history,
                Err(e) => {
                    warn!(
                        "Could not parse history file {}: {e}. Starting fresh.",
                        self.path.display()
                    );
                    History::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No history file at {}", self.path.display());
                History::new()
            }
            Err(e) => {
                warn!(
                    "Could not read history file {}: {e}. Starting fresh.",
                    self.path.display()
                );
                History::new()
            }
        };

        let count = history.len();
        let mut state = self.state.lock().await;
        state.conversations = history;
        state.open_turns.clear();
        info!("Loaded {count} conversations from {}", self.path.display());
        count
    }

    /// Turns of one conversation in insertion order; empty if unknown.
    pub async fn get_messages(&self, conversation_id: &str) -> Vec<Turn> {
        self.state
            .lock()
            .await
            .conversations
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Append one half of a turn.
    ///
    /// A `user` message is held in memory until the matching `assistant`
    /// message arrives; only then is the complete turn committed and
    /// flushed. A second `user` message before that replaces the first.
    pub async fn add_message(&self, conversation_id: &str, role: Role, content: &str) -> Result<()> {
        match role {
            Role::User => {
                let mut state = self.state.lock().await;
                if let Some(previous) = state
                    .open_turns
                    .insert(conversation_id.to_string(), content.to_string())
                {
                    warn!(
                        "Discarding unanswered user message in conversation {conversation_id}: {} chars",
                        previous.len()
                    );
                }
                debug!("Opened turn in conversation {conversation_id}");
                Ok(())
            }
            Role::Assistant => {
                let id = conversation_id.to_string();
                let assistant = content.to_string();
                let max_turns = self.max_turns;
                self.apply(move |state| {
                    let Some(user) = state.open_turns.remove(&id) else {
                        return Err(HistoryError::UnpairedAssistant(id));
                    };
                    state.push_turn(&id, Turn::new(user, assistant), max_turns);
                    Ok(())
                })
                .await?;
                debug!("Committed turn to conversation: {conversation_id}");
                Ok(())
            }
            other => Err(HistoryError::UnsupportedRole(other)),
        }
    }

    /// Append a complete turn in a single flush.
    ///
    /// Once called, the turn is either committed to both the file and
    /// memory or to neither, even if the returned future is dropped.
    pub async fn add_turn(&self, conversation_id: &str, user: &str, assistant: &str) -> Result<Turn> {
        let id = conversation_id.to_string();
        let turn = Turn::new(user, assistant);
        let max_turns = self.max_turns;
        let turn = self
            .apply(move |state| {
                state.push_turn(&id, turn.clone(), max_turns);
                Ok(turn)
            })
            .await?;
        debug!("Committed turn to conversation: {conversation_id}");
        Ok(turn)
    }

    /// Summaries of every conversation, most recently updated first.
    pub async fn get_conversations(&self) -> Vec<ConversationSummary> {
        let state = self.state.lock().await;
        let mut summaries: Vec<ConversationSummary> = state
            .conversations
            .iter()
            .filter_map(|(id, turns)| {
                let last = turns.last()?;
                Some(ConversationSummary {
                    id: id.clone(),
                    last_message: truncate_preview(&last.assistant, PREVIEW_CHARS),
                    turn_count: turns.len(),
                    updated_at: last.timestamp,
                })
            })
            .collect();

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        summaries
    }

    /// Delete one conversation, or all of them when `conversation_id` is `None`.
    ///
    /// The new state is flushed as a whole; clearing an unknown key still
    /// succeeds.
    pub async fn clear(&self, conversation_id: Option<&str>) -> Result<()> {
        let id = conversation_id.map(str::to_string);
        self.apply(move |state| {
            match id {
                Some(id) => {
                    state.conversations.remove(&id);
                    state.open_turns.remove(&id);
                }
                None => *state = HistoryState::default(),
            }
            Ok(())
        })
        .await?;

        match conversation_id {
            Some(id) => info!("Cleared conversation: {id}"),
            None => info!("Cleared all conversations"),
        }
        Ok(())
    }

    /// Run `edit` on a copy of the state, flush the copy, then swap it in.
    ///
    /// The whole sequence runs on a spawned task under the state lock.
    /// Dropping the returned future detaches that task instead of cancelling
    /// it, so the file and memory never disagree.
    async fn apply<T, F>(&self, edit: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut HistoryState) -> Result<T> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let path = self.path.clone();
        let task = tokio::spawn(async move {
            let mut state = state.lock().await;
            let mut next = state.clone();
            let value = edit(&mut next)?;
            persist(&path, &next.conversations).await?;
            *state = next;
            Ok::<_, HistoryError>(value)
        });

        task.await.map_err(|e| HistoryError::Interrupted(e.to_string()))?
    }
}

/// Write the full mapping atomically: temp file in the same directory,
/// fsync, rename over the target.
///
/// The temp file can outlive a process that dies mid-flush; the next flush
/// truncates and reuses it.
async fn persist(path: &Path, history: &History) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| HistoryError::io(parent, e))?;
    }

    let json = serde_json::to_vec_pretty(history)?;
    let tmp = temp_path(path);

    let mut file = tokio::fs::File::create(&tmp)
        .await
        .map_err(|e| HistoryError::io(&tmp, e))?;
    file.write_all(&json)
        .await
        .map_err(|e| HistoryError::io(&tmp, e))?;
    file.sync_all()
        .await
        .map_err(|e| HistoryError::io(&tmp, e))?;
    drop(file);

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
            warn!("Could not remove {}: {cleanup}", tmp.display());
        }
        return Err(HistoryError::io(path, e));
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_else(|| "history.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}
