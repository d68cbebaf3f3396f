//! Session journal: the tagged event stream every engine writes into
//!
//! Chatty per-sample lines go through `trace` and are dropped unless the
//! journal is verbose; state changes always land. The whole journal
//! serializes to JSON for offline inspection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::PlayerId;

/// One journal line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub frame: u64,
    /// Virtual room time (seconds)
    pub t: f32,
    /// Participant the entry concerns
    pub who: PlayerId,
    /// Short machine-greppable tag, e.g. "SEND", "RECV_START"
    pub tag: String,
    pub message: String,
}

/// Why a journal file operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalError {
    SerializeError,
    StorageError,
}

impl std::fmt::Display for JournalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JournalError::SerializeError => write!(f, "journal serialize error"),
            JournalError::StorageError => write!(f, "journal storage error"),
        }
    }
}

/// Collected event stream of one room session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionJournal {
    pub id: String,
    pub started_at: DateTime<Utc>,
    entries: Vec<JournalEntry>,
    #[serde(skip)]
    verbose: bool,
    #[serde(skip)]
    frame: u64,
    #[serde(skip)]
    now: f32,
}

impl SessionJournal {
    pub fn new(verbose: bool) -> Self {
        Self {
            id: generate_journal_id(),
            started_at: Utc::now(),
            entries: Vec::new(),
            verbose,
            frame: 0,
            now: 0.0,
        }
    }

    /// Stamp subsequent entries with the current frame and virtual time
    pub fn set_clock(&mut self, frame: u64, now: f32) {
        self.frame = frame;
        self.now = now;
    }

    /// Record an entry unconditionally (state changes, claims, drops)
    pub fn log(&mut self, who: PlayerId, tag: &str, message: impl Into<String>) {
        self.entries.push(JournalEntry {
            frame: self.frame,
            t: self.now,
            who,
            tag: tag.to_string(),
            message: message.into(),
        });
    }

    /// Record a chatty entry only when verbose (sends, samples, ignores)
    pub fn trace(&mut self, who: PlayerId, tag: &str, message: impl Into<String>) {
        if self.verbose {
            self.log(who, tag, message);
        }
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries carrying the given tag, newest last
    pub fn with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a JournalEntry> {
        self.entries.iter().filter(move |e| e.tag == tag)
    }
}

/// Save a journal as pretty JSON under `dir`, returning the path
pub fn save_journal(journal: &SessionJournal, dir: &str) -> Result<String, JournalError> {
    let filename = format!("{}/{}.json", dir, journal.id);

    let json =
        serde_json::to_string_pretty(journal).map_err(|_| JournalError::SerializeError)?;

    std::fs::create_dir_all(dir).map_err(|_| JournalError::StorageError)?;
    std::fs::write(&filename, json).map_err(|_| JournalError::StorageError)?;

    Ok(filename)
}

/// Load a journal from a JSON file
pub fn load_journal(path: &str) -> Result<SessionJournal, JournalError> {
    let json = std::fs::read_to_string(path).map_err(|_| JournalError::StorageError)?;
    serde_json::from_str(&json).map_err(|_| JournalError::SerializeError)
}

/// Journal id from the wall clock, unique enough for a journal directory
fn generate_journal_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("whisper_{:x}", nanos as u64)
}

// =============================================================================
// TESTS
// =============================================================================
