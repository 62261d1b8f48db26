//! Async client tests.

#![cfg(feature = "async")]

mod common;

use common::{two_mondays, FakeSource};
use vibequant::{AsyncVibeQuant, InstrumentClass, VibeQuant};

async fn client() -> AsyncVibeQuant {
    let builder = VibeQuant::builder()
        .source("fake", FakeSource::new("fake").with("AAPL", two_mondays()))
        .class_source(InstrumentClass::Stock, "fake");
    AsyncVibeQuant::new(builder).await.unwrap()
}

#[tokio::test]
async fn build_view_runs_on_blocking_pool() {
    let vq = client().await;
    let vf = vq
        .build_view("AAPL", Some("W"), None, None, Some(InstrumentClass::Stock))
        .await
        .unwrap();
    assert_eq!(vf.shape(), (5, 1));
}

#[tokio::test]
async fn run_exposes_sync_client() {
    let vq = client().await;
    let sources = vq.run(|c| Ok(c.sources())).await.unwrap();
    assert_eq!(sources, vec!["fake", "yahoo"]);

    let tickers = vq.list_tickers(InstrumentClass::Stock).await.unwrap();
    assert!(!tickers.is_empty());
    vq.clear_cache().await.unwrap();
}
