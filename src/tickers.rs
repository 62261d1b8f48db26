//! Ticker-list loader.
//!
//! Lists are a JSON object mapping list names to symbols, e.g.
//! `{"sp500": ["AAPL", ...], "crypto_yahoo": ["BTC-USD", ...]}`. The file is
//! parsed once on first access and kept until [`TickerStore::reset`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, warn};

use crate::config;
use crate::error::{Result, VibeError};

type TickerLists = HashMap<String, Vec<String>>;

/// Lazily loaded ticker lists, from a user file or the bundled copy.
pub struct TickerStore {
    path: Option<PathBuf>,
    lists: RefCell<Option<TickerLists>>,
}

impl TickerStore {
    /// Use the lists compiled into the crate.
    pub fn bundled() -> Self {
        Self {
            path: None,
            lists: RefCell::new(None),
        }
    }

    /// Read lists from `path`. Files ending in `.gz` are decompressed.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            lists: RefCell::new(None),
        }
    }

    /// Prefer `tickers.json` then `tickers.json.gz` in `data_dir` (the
    /// platform data directory when `None`), else the bundled lists.
    pub fn discover(data_dir: Option<PathBuf>) -> Self {
        let dir = data_dir.unwrap_or_else(config::default_data_dir);
        for name in [config::TICKERS_FILE, config::TICKERS_FILE_GZ] {
            let candidate = dir.join(name);
            if candidate.is_file() {
                debug!(path = %candidate.display(), "using ticker file");
                return Self::from_path(candidate);
            }
        }
        Self::bundled()
    }

    /// File the lists come from; `None` for the bundled copy.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.lists.borrow().is_some()
    }

    /// Symbols of the list named `key`.
    pub fn list(&self, key: &str) -> Result<Vec<String>> {
        self.ensure_loaded()?;
        let lists = self.lists.borrow();
        lists
            .as_ref()
            .and_then(|l| l.get(key))
            .cloned()
            .ok_or_else(|| VibeError::UnknownSource(format!("no ticker list named '{}'", key)))
    }

    /// Names of all available lists, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        self.ensure_loaded()?;
        let mut keys: Vec<String> = self
            .lists
            .borrow()
            .as_ref()
            .map(|l| l.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }

    /// Drop the parsed lists; the next access re-reads the source.
    pub fn reset(&self) {
        self.lists.borrow_mut().take();
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.is_loaded() {
            return Ok(());
        }
        let contents = match &self.path {
            Some(path) => read_text(path)?,
            None => config::BUNDLED_TICKERS.to_string(),
        };
        let lists: TickerLists = serde_json::from_str(&contents).map_err(|e| {
            warn!(
                path = %self.path.as_deref().map(|p| p.display().to_string()).unwrap_or_else(|| "<bundled>".to_string()),
                error = %e,
                "corrupt ticker file"
            );
            VibeError::from(e)
        })?;
        debug!(lists = lists.len(), "ticker lists loaded");
        *self.lists.borrow_mut() = Some(lists);
        Ok(())
    }
}

impl Default for TickerStore {
    fn default() -> Self {
        Self::bundled()
    }
}

fn read_text(path: &Path) -> Result<String> {
    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        let file = fs::File::open(path)?;
        let mut reader = BufReader::new(GzDecoder::new(BufReader::new(file)));
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        Ok(contents)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}
