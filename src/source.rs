//! Price-history sources and fetch memoization.
//!
//! A [`PriceSource`] returns a date-indexed OHLCV [`Frame`]. Provider
//! failures are logged and turned into an empty frame so callers never
//! special-case partial results; only an invalid ticker is an error.

use std::cell::RefCell;
use std::num::NonZeroUsize;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use lru::LruCache;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::config::{self, COL_CLOSE, COL_OPEN};
use crate::error::{Result, VibeError};
use crate::frame::{Column, ColumnLabel, Frame, RowIndex};

/// Fetches daily price history for a ticker.
pub trait PriceSource: Send {
    fn name(&self) -> &str;

    /// Daily rows between `start` and `end` (both optional), indexed by date.
    ///
    /// Returns an empty frame when there is no data.
    fn fetch(&self, ticker: &str, start: Option<NaiveDate>, end: Option<NaiveDate>)
        -> Result<Frame>;

    /// Drop any memoized results. No-op for uncached sources.
    fn clear_cache(&self) {}
}

impl<S: PriceSource + ?Sized> PriceSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Frame> {
        (**self).fetch(ticker, start, end)
    }

    fn clear_cache(&self) {
        (**self).clear_cache()
    }
}

/// Reject empty tickers; returns the trimmed symbol.
pub fn validate_ticker(ticker: &str) -> Result<&str> {
    let trimmed = ticker.trim();
    if trimmed.is_empty() {
        return Err(VibeError::InvalidArgument(
            "ticker must be a non-empty string".to_string(),
        ));
    }
    Ok(trimmed)
}

/// An OHLCV frame without rows.
pub fn empty_history() -> Result<Frame> {
    history_frame(Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new())
}

fn history_frame(
    dates: Vec<NaiveDate>,
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<i64>>,
) -> Result<Frame> {
    Frame::new(
        RowIndex::Dates {
            name: Some("Date".to_string()),
            values: dates,
        },
        vec![
            (ColumnLabel::new(COL_OPEN), Column::Float(open)),
            (ColumnLabel::new("High"), Column::Float(high)),
            (ColumnLabel::new("Low"), Column::Float(low)),
            (ColumnLabel::new(COL_CLOSE), Column::Float(close)),
            (ColumnLabel::new("Volume"), Column::Int(volume)),
        ],
    )
}

// ---------------------------------------------------------------------------
// YahooSource
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Daily bars from the Yahoo Finance chart API.
pub struct YahooSource {
    client: Client,
    base_url: String,
}

impl YahooSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("vibequant/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config::YAHOO_CHART_BASE.to_string(),
        })
    }

    /// Point the source at another chart endpoint.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Either bound switches to an explicit window; a missing start means the
    /// epoch and a missing end means now. `end` is exclusive.
    fn query(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Vec<(&'static str, String)> {
        let mut query = vec![("interval", "1d".to_string())];
        if start.is_none() && end.is_none() {
            query.push(("range", "max".to_string()));
            return query;
        }
        let period1 = start.map(epoch).unwrap_or(0);
        let period2 = end.map(epoch).unwrap_or_else(|| Utc::now().timestamp());
        query.push(("period1", period1.to_string()));
        query.push(("period2", period2.to_string()));
        query
    }
}

fn epoch(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0)
}

impl PriceSource for YahooSource {
    fn name(&self) -> &str {
        config::DEFAULT_SOURCE
    }

    fn fetch(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Frame> {
        let ticker = validate_ticker(ticker)?;
        let url = format!("{}/{}", self.base_url, ticker);
        info!(ticker, ?start, ?end, "fetching price history");

        let response = match self.client.get(&url).query(&self.query(start, end)).send() {
            Ok(resp) => resp,
            Err(e) => {
                error!(ticker, error = %e, "price history request failed");
                return empty_history();
            }
        };
        let status = response.status();
        let body: ChartResponse = match response.json() {
            Ok(body) => body,
            Err(e) => {
                error!(ticker, %status, error = %e, "undecodable price history response");
                return empty_history();
            }
        };

        if let Some(err) = body.chart.error {
            warn!(
                ticker,
                code = err.code.as_deref().unwrap_or(""),
                description = err.description.as_deref().unwrap_or(""),
                "provider returned no price history"
            );
            return empty_history();
        }
        if !status.is_success() {
            error!(ticker, %status, "price history request was rejected");
            return empty_history();
        }

        match body.chart.result.and_then(|r| r.into_iter().next()) {
            Some(result) => frame_from_chart(result),
            None => empty_history(),
        }
    }
}

/// Rows missing an open or close price are skipped; dates are taken in the
/// exchange's local time.
fn frame_from_chart(result: ChartResult) -> Result<Frame> {
    let offset = result.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let cell = |v: &[Option<f64>], i: usize| v.get(i).copied().flatten();

    let (mut dates, mut open, mut high, mut low, mut close, mut volume) =
        (Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let (Some(o), Some(c)) = (cell(&quote.open, i), cell(&quote.close, i)) else {
            continue;
        };
        let Some(dt) = DateTime::from_timestamp(ts + offset, 0) else {
            continue;
        };
        dates.push(dt.date_naive());
        open.push(Some(o));
        high.push(cell(&quote.high, i));
        low.push(cell(&quote.low, i));
        close.push(Some(c));
        volume.push(cell(&quote.volume, i).map(|v| v as i64));
    }
    debug!(rows = dates.len(), "decoded price history");

    history_frame(dates, open, high, low, close, volume)
}

// ---------------------------------------------------------------------------
// CachedSource
// ---------------------------------------------------------------------------

type FetchKey = (String, Option<NaiveDate>, Option<NaiveDate>);

/// Memoizes another source in a fixed-capacity LRU keyed by
/// `(ticker, start, end)`. Empty results are not cached.
pub struct CachedSource<S> {
    inner: S,
    cache: RefCell<LruCache<FetchKey, Frame>>,
}

impl<S: PriceSource> CachedSource<S> {
    pub fn new(inner: S, capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            VibeError::InvalidArgument("fetch cache capacity must be positive".to_string())
        })?;
        Ok(Self {
            inner,
            cache: RefCell::new(LruCache::new(capacity)),
        })
    }

    /// Number of memoized results.
    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Forget every memoized result.
    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }
}

impl<S: PriceSource> PriceSource for CachedSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Frame> {
        let key = (validate_ticker(ticker)?.to_string(), start, end);
        if let Some(hit) = self.cache.borrow_mut().get(&key).cloned() {
            debug!(ticker = %key.0, "fetch cache hit");
            return Ok(hit);
        }

        let frame = self.inner.fetch(&key.0, start, end)?;
        if !frame.is_empty() {
            self.cache.borrow_mut().put(key, frame.clone());
        }
        Ok(frame)
    }

    fn clear_cache(&self) {
        self.clear();
        self.inner.clear_cache();
    }
}
