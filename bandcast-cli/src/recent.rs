//! Recently forecast symbols: a bounded most-recently-used list persisted
//! as JSON between invocations.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Maximum number of remembered symbols.
pub const RECENT_CAPACITY: usize = 5;

/// Symbols ordered most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentList {
    symbols: Vec<String>,
}

impl RecentList {
    /// Record a use of `symbol`. An existing entry moves to the front; the
    /// oldest entry is dropped when the list is full.
    pub fn touch(&mut self, symbol: &str) {
        self.symbols.retain(|s| s != symbol);
        self.symbols.insert(0, symbol.to_string());
        self.symbols.truncate(RECENT_CAPACITY);
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Load the list from disk. Returns an empty list if the file is missing or corrupt.
pub fn load(path: &Path) -> RecentList {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let mut list: RecentList = serde_json::from_str(&content).unwrap_or_default();
            list.symbols.truncate(RECENT_CAPACITY);
            list
        }
        Err(_) => RecentList::default(),
    }
}

/// Save the list to disk. Creates parent directories if needed.
pub fn save(path: &Path, list: &RecentList) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(list)?;
    std::fs::write(path, json)?;
    Ok(())
}
