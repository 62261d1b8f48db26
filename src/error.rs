#[derive(Debug, thiserror::Error)]
pub enum VibeError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Calendar or change fields could not be derived from the table.
    #[error("Schema error: {0}")]
    Schema(String),

    /// A data source, instrument class or ticker list that is not registered.
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, VibeError>;
