//! Seasonal statistics for stock and crypto price series.
//!
//! Daily prices are normalized into calendar fields (`DayOfMonth`, `Weekday`,
//! `Month`) and a percentage `Change`, then summarized by weekday, day of
//! month or month, or pivoted into day-by-weekday heatmap tables. Grouping
//! and aggregation run in-process via DuckDB.
//!
//! # Quick start
//!
//! ```no_run
//! use vibequant::{InstrumentClass, VibeQuant};
//!
//! let vq = VibeQuant::builder().build()?;
//!
//! // Average change per weekday for a stock
//! let mut vf = vq.build_view("AAPL", Some("W"), None, None, Some(InstrumentClass::Stock))?;
//! vf.print()?;
//!
//! // Same data, by month
//! vf.change_view("M")?;
//! let ranked = vf.significant_groups("Weekday", 2.0)?;
//! # Ok::<(), vibequant::VibeError>(())
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod calendar;
pub mod config;
pub mod engine;
pub mod error;
pub mod frame;
pub mod normalize;
pub mod queries;
pub mod render;
pub mod source;
pub mod sql_builder;
pub mod stats;
pub mod tickers;
pub mod transforms;
pub mod vibe_frame;

#[cfg(feature = "async")]
pub use async_client::AsyncVibeQuant;
pub use calendar::{InstrumentClass, WeekdaySet};
pub use engine::Engine;
pub use error::{Result, VibeError};
pub use frame::{Column, ColumnLabel, Frame, RowIndex, Scalar};
pub use normalize::normalize;
pub use render::{RenderKind, Renderer, TextRenderer};
pub use source::{CachedSource, PriceSource, YahooSource};
pub use sql_builder::SqlBuilder;
pub use stats::{GroupStats, SignificantGroup};
pub use tickers::TickerStore;
pub use transforms::{summarize, ViewKind};
pub use vibe_frame::VibeFrame;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use tracing::info;

// ---------------------------------------------------------------------------
// VibeQuantBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`VibeQuant`] client.
///
/// Use [`VibeQuant::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](VibeQuantBuilder::build).
pub struct VibeQuantBuilder {
    timeout: Duration,
    fetch_cache_size: usize,
    tickers_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    sources: Vec<(String, Box<dyn PriceSource>)>,
    class_sources: HashMap<InstrumentClass, String>,
}

impl Default for VibeQuantBuilder {
    fn default() -> Self {
        Self {
            timeout: config::DEFAULT_TIMEOUT,
            fetch_cache_size: config::DEFAULT_FETCH_CACHE_SIZE,
            tickers_path: None,
            data_dir: None,
            sources: Vec::new(),
            class_sources: HashMap::new(),
        }
    }
}

impl VibeQuantBuilder {
    /// HTTP timeout for the Yahoo source. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of fetch results each source memoizes. Defaults to 128.
    pub fn fetch_cache_size(mut self, size: usize) -> Self {
        self.fetch_cache_size = size;
        self
    }

    /// Read ticker lists from this file instead of discovering one.
    pub fn tickers_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.tickers_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Directory searched for `tickers.json` / `tickers.json.gz`.
    ///
    /// If not set, the platform data directory is used (e.g.
    /// `~/.local/share/vibequant` on Linux).
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Register a price source under `name`. A source named `"yahoo"`
    /// replaces the built-in one.
    pub fn source(mut self, name: &str, source: impl PriceSource + 'static) -> Self {
        self.sources.push((name.to_string(), Box::new(source)));
        self
    }

    /// Fetch instruments of `class` from the source registered as `name`.
    pub fn class_source(mut self, class: InstrumentClass, name: &str) -> Self {
        self.class_sources.insert(class, name.to_string());
        self
    }

    /// Build the client. Every source is wrapped in a [`CachedSource`].
    pub fn build(self) -> Result<VibeQuant> {
        let mut sources: HashMap<String, Box<dyn PriceSource>> = HashMap::new();
        if !self.sources.iter().any(|(name, _)| name == config::DEFAULT_SOURCE) {
            let yahoo = CachedSource::new(YahooSource::new(self.timeout)?, self.fetch_cache_size)?;
            sources.insert(config::DEFAULT_SOURCE.to_string(), Box::new(yahoo));
        }
        for (name, source) in self.sources {
            let cached = CachedSource::new(source, self.fetch_cache_size)?;
            sources.insert(name, Box::new(cached));
        }

        for (class, name) in &self.class_sources {
            if !sources.contains_key(name) {
                return Err(VibeError::UnknownSource(format!(
                    "source '{}' for {} is not registered",
                    name, class
                )));
            }
        }

        let tickers = match self.tickers_path {
            Some(path) => TickerStore::from_path(path),
            None => TickerStore::discover(self.data_dir),
        };

        Ok(VibeQuant {
            sources,
            class_sources: self.class_sources,
            tickers,
        })
    }
}

// ---------------------------------------------------------------------------
// VibeQuant
// ---------------------------------------------------------------------------

/// Entry point: fetches price history and wraps it in a [`VibeFrame`].
///
/// Created via [`VibeQuant::builder()`].
pub struct VibeQuant {
    sources: HashMap<String, Box<dyn PriceSource>>,
    class_sources: HashMap<InstrumentClass, String>,
    tickers: TickerStore,
}

impl VibeQuant {
    pub fn builder() -> VibeQuantBuilder {
        VibeQuantBuilder::default()
    }

    // -- Instrument interfaces ---------------------------------------------

    pub fn stocks(&self) -> queries::InstrumentQuery<'_> {
        queries::InstrumentQuery::new(self, InstrumentClass::Stock)
    }

    pub fn crypto(&self) -> queries::InstrumentQuery<'_> {
        queries::InstrumentQuery::new(self, InstrumentClass::Crypto)
    }

    // -- Views -------------------------------------------------------------

    /// Fetch `ticker` and build a [`VibeFrame`] showing the view named by `tag`.
    ///
    /// The source is the one assigned to `class`, or `"yahoo"`. The weekday
    /// set follows `class` when given and is inferred from the data
    /// otherwise. A ticker without data yields an empty frame, not an error.
    pub fn build_view(
        &self,
        ticker: &str,
        tag: Option<&str>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        class: Option<InstrumentClass>,
    ) -> Result<VibeFrame> {
        let source = class
            .and_then(|c| self.class_sources.get(&c))
            .map(String::as_str)
            .unwrap_or(config::DEFAULT_SOURCE);
        self.build_view_from(source, ticker, tag, start, end, class)
    }

    /// Like [`build_view`](Self::build_view) with an explicit source name.
    pub fn build_view_from(
        &self,
        source: &str,
        ticker: &str,
        tag: Option<&str>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        class: Option<InstrumentClass>,
    ) -> Result<VibeFrame> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(VibeError::InvalidArgument(format!(
                    "start {} is after end {}",
                    s, e
                )));
            }
        }
        let provider = self
            .sources
            .get(source)
            .ok_or_else(|| VibeError::UnknownSource(source.to_string()))?;

        let prices = provider.fetch(ticker, start, end)?;
        info!(ticker, source, rows = prices.height(), "building view");
        VibeFrame::new(&prices, tag, class)
    }

    // -- Metadata and utility methods --------------------------------------

    /// Symbols of the ticker list for `class`.
    pub fn list_tickers(&self, class: InstrumentClass) -> Result<Vec<String>> {
        self.tickers.list(class.ticker_list_key())
    }

    pub fn ticker_store(&self) -> &TickerStore {
        &self.tickers
    }

    /// Names of the registered sources, sorted.
    pub fn sources(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sources.keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop memoized fetches and loaded ticker lists.
    pub fn clear_cache(&self) {
        for source in self.sources.values() {
            source.clear_cache();
        }
        self.tickers.reset();
    }
}

impl fmt::Display for VibeQuant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tickers = self
            .tickers
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "bundled".to_string());
        write!(
            f,
            "VibeQuant(sources=[{}], tickers={})",
            self.sources().join(", "),
            tickers
        )
    }
}
