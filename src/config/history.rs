use serde::Deserialize;
use std::path::PathBuf;

/// Client-side conversion history configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// File backing the key-value history store
    pub file: PathBuf,

    /// Key the history list is stored under
    pub key: String,

    /// Maximum number of entries kept, newest first
    pub capacity: usize,
}

impl HistoryConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.key.trim().is_empty() {
            return Err("HISTORY_KEY must not be empty".to_string());
        }

        if self.capacity == 0 {
            return Err("HISTORY_CAPACITY must be greater than 0".to_string());
        }

        Ok(())
    }
}
