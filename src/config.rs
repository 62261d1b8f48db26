use std::path::PathBuf;
use std::time::Duration;

pub const YAHOO_CHART_BASE: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Name under which the Yahoo source is registered on a default client.
pub const DEFAULT_SOURCE: &str = "yahoo";

pub const DEFAULT_FETCH_CACHE_SIZE: usize = 128;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Rows shown by the table printer before it truncates.
pub const DEFAULT_TABLE_ROWS: usize = 20;

// Canonical column names of a normalized table.
pub const COL_OPEN: &str = "Open";
pub const COL_CLOSE: &str = "Close";
pub const COL_CHANGE: &str = "Change";
pub const COL_DAY_OF_MONTH: &str = "DayOfMonth";
pub const COL_WEEKDAY: &str = "Weekday";
pub const COL_MONTH: &str = "Month";
pub const COL_AVG_CHANGE: &str = "AvgChange";

/// Column names (compared case-insensitively) accepted as a date source.
pub const DATE_COLUMN_NAMES: [&str; 4] = ["date", "datetime", "timestamp", "time"];

pub const TICKERS_STOCK_KEY: &str = "sp500";
pub const TICKERS_CRYPTO_KEY: &str = "crypto_yahoo";

pub const TICKERS_FILE: &str = "tickers.json";
pub const TICKERS_FILE_GZ: &str = "tickers.json.gz";

/// Ticker lists shipped with the crate.
pub const BUNDLED_TICKERS: &str = include_str!("../data/tickers.json");

pub fn default_data_dir() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("vibequant")
    } else {
        PathBuf::from(".vibequant")
    }
}
