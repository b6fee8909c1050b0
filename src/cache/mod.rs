use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

mod storage;
use storage::CacheStorage;

/// A remembered remote answer, keyed by the digest of the text that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(rename = "log_hash")]
    pub content_hash: String,
    #[serde(rename = "error_line")]
    pub last_line: String,
    #[serde(rename = "gpt_answer")]
    pub answer: String,
}

#[derive(Debug)]
pub enum CacheError {
    Io(String),
    Format(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "Cache store I/O error: {}", msg),
            Self::Format(msg) => write!(f, "Cache store format error: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<std::io::Error> for CacheError {
    fn from(error: std::io::Error) -> Self {
        CacheError::Io(error.to_string())
    }
}

impl From<csv::Error> for CacheError {
    fn from(error: csv::Error) -> Self {
        if error.is_io_error() {
            CacheError::Io(error.to_string())
        } else {
            CacheError::Format(error.to_string())
        }
    }
}

/// SHA-256 of `text` as lowercase hex. Stable across runs.
pub fn digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Append-only answer cache. Reads are served from memory; writes go to memory and then the store.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Vec<CacheEntry>,
    storage: Option<CacheStorage>,
}

impl ResponseCache {
    /// A cache that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens (creating if needed) the CSV store at `path` and loads its rows.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let storage = CacheStorage::open(path)?;
        let entries = storage.read_all()?;
        info!(path = ?storage.path(), entries = entries.len(), "opened response cache");
        Ok(Self {
            entries,
            storage: Some(storage),
        })
    }

    /// First entry stored under exactly `hash`.
    pub fn lookup(&self, hash: &str) -> Option<&CacheEntry> {
        self.entries.iter().find(|entry| entry.content_hash == hash)
    }

    /// Records an answer. A hash already present is left untouched, so the store
    /// holds one row per digest.
    ///
    /// The entry is kept in memory even when the durable write fails; the error is
    /// returned for the caller to log.
    pub fn insert(
        &mut self,
        hash: &str,
        last_line: &str,
        answer: &str,
    ) -> Result<(), CacheError> {
        if self.lookup(hash).is_some() {
            debug!(hash, "cache entry already present, skipping insert");
            return Ok(());
        }

        let entry = CacheEntry {
            content_hash: hash.to_string(),
            last_line: last_line.to_string(),
            answer: answer.to_string(),
        };
        let persisted = match &self.storage {
            Some(storage) => storage.append(&entry),
            None => Ok(()),
        };
        self.entries.push(entry);
        persisted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
