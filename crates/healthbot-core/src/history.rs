use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::state::Message;

/// Storage key for the persisted chat log. Nothing outside this module
/// should care about it.
const HISTORY_KEY: &str = "healthbot_history";

/// Abstract key-value persistence capability. Injecting this keeps the
/// history store usable on any host, not just ones with a writable disk.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store for tests and hosts without persistence.
#[derive(Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed store: one JSON file per key under a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Default location under the platform config directory.
    pub fn default_dir() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(Self::new(config_dir.join("healthbot")))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Export artifact: the full log plus the instant it was taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: String,
    pub messages: Vec<Message>,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Suggested download file name, dated from the snapshot timestamp.
    pub fn file_name(&self) -> String {
        let date = self
            .timestamp
            .split('T')
            .next()
            .unwrap_or(&self.timestamp);
        format!("healthbot-chat-{}.json", date)
    }
}

/// Persists and restores the chat log through an injected key-value store.
/// Never holds a live reference to the session's log; it only sees
/// serialized snapshots.
pub struct HistoryStore {
    store: Box<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Write-through save of the full log.
    pub fn save(&mut self, log: &[Message]) -> Result<()> {
        let serialized = serde_json::to_string(log)?;
        self.store.set(HISTORY_KEY, &serialized)
    }

    /// Restore the persisted log. Missing or unreadable content fails open
    /// to an empty log; this never errors out to the caller.
    pub fn load(&self) -> Vec<Message> {
        let raw = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "failed to read chat history, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(messages) => messages,
            Err(err) => {
                warn!(error = %err, "stored chat history is corrupt, starting empty");
                Vec::new()
            }
        }
    }

    /// Reset the persisted log to empty.
    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(HISTORY_KEY)
    }

    /// Take an export snapshot of the given log.
    pub fn export(&self, log: &[Message]) -> Snapshot {
        Snapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            messages: log.to_vec(),
        }
    }
}
