//! Async wrapper around [`VibeQuant`] for use in async runtimes (Tokio, etc.).
//!
//! Fetching and aggregation are blocking, so every call runs on the blocking
//! thread pool via [`tokio::task::spawn_blocking`].
//!
//! # Example
//!
//! ```no_run
//! use vibequant::{AsyncVibeQuant, InstrumentClass, VibeQuant};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> vibequant::Result<()> {
//!     let vq = AsyncVibeQuant::new(VibeQuant::builder()).await?;
//!
//!     let vf = vq
//!         .build_view("BTC-USD", Some("W"), None, None, Some(InstrumentClass::Crypto))
//!         .await?;
//!     println!("{}", vf);
//!
//!     // Any sync method via closure
//!     let sources = vq.run(|c| Ok(c.sources())).await?;
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::calendar::InstrumentClass;
use crate::error::{Result, VibeError};
use crate::vibe_frame::VibeFrame;
use crate::{VibeQuant, VibeQuantBuilder};

/// Async handle to a [`VibeQuant`] guarded by a [`Mutex`], since the
/// client's caches use `RefCell` internally.
#[derive(Clone)]
pub struct AsyncVibeQuant {
    inner: Arc<Mutex<VibeQuant>>,
}

impl AsyncVibeQuant {
    /// Build the client on the blocking pool.
    pub async fn new(builder: VibeQuantBuilder) -> Result<Self> {
        let client = tokio::task::spawn_blocking(move || builder.build())
            .await
            .map_err(|e| VibeError::InvalidArgument(format!("Task join error: {e}")))??;
        Ok(Self {
            inner: Arc::new(Mutex::new(client)),
        })
    }

    /// Run a sync client operation on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&VibeQuant) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let client = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = client
                .lock()
                .map_err(|_| VibeError::InvalidArgument("client lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| VibeError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// See [`VibeQuant::build_view`].
    pub async fn build_view(
        &self,
        ticker: &str,
        tag: Option<&str>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        class: Option<InstrumentClass>,
    ) -> Result<VibeFrame> {
        let ticker = ticker.to_string();
        let tag = tag.map(str::to_string);
        self.run(move |c| c.build_view(&ticker, tag.as_deref(), start, end, class))
            .await
    }

    pub async fn list_tickers(&self, class: InstrumentClass) -> Result<Vec<String>> {
        self.run(move |c| c.list_tickers(class)).await
    }

    pub async fn clear_cache(&self) -> Result<()> {
        self.run(|c| {
            c.clear_cache();
            Ok(())
        })
        .await
    }
}
