//! Shared fixtures for the vibequant integration tests.
//!
//! Builds small in-memory price tables and a `PriceSource` that serves them
//! without touching the network.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use vibequant::{Column, ColumnLabel, Frame, PriceSource, Result, RowIndex};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Date-indexed frame with `Open` and `Close` columns.
pub fn price_frame(rows: &[(NaiveDate, f64, f64)]) -> Frame {
    Frame::new(
        RowIndex::Dates {
            name: Some("Date".to_string()),
            values: rows.iter().map(|r| r.0).collect(),
        },
        vec![
            (ColumnLabel::new("Open"), Column::Float(rows.iter().map(|r| Some(r.1)).collect())),
            (ColumnLabel::new("Close"), Column::Float(rows.iter().map(|r| Some(r.2)).collect())),
        ],
    )
    .unwrap()
}

/// Two Mondays: +2% on 2023-01-02 and -2% on 2023-01-09.
pub fn two_mondays() -> Frame {
    price_frame(&[
        (date(2023, 1, 2), 100.0, 102.0),
        (date(2023, 1, 9), 100.0, 98.0),
    ])
}

/// `days` consecutive calendar days starting at `start`. Weekends are
/// skipped unless `weekends` is set. Changes cycle through a fixed pattern.
pub fn daily_prices(start: NaiveDate, days: usize, weekends: bool) -> Frame {
    let pattern = [1.0, -0.5, 2.0, 0.25, -1.5, 0.75, -0.25];
    let mut rows = Vec::new();
    let mut day = start;
    let mut i = 0;
    while rows.len() < days {
        let weekday = day.format("%a").to_string();
        if weekends || (weekday != "Sat" && weekday != "Sun") {
            let open = 100.0 + i as f64;
            let close = open * (1.0 + pattern[i % pattern.len()] / 100.0);
            rows.push((day, open, close));
            i += 1;
        }
        day += Duration::days(1);
    }
    price_frame(&rows)
}

/// Serves canned frames per ticker and counts fetches.
#[derive(Clone)]
pub struct FakeSource {
    name: String,
    frames: HashMap<String, Frame>,
    calls: Arc<AtomicUsize>,
}

impl FakeSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            frames: HashMap::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with(mut self, ticker: &str, frame: Frame) -> Self {
        self.frames.insert(ticker.to_string(), frame);
        self
    }

    /// Shared counter, still readable after the source is moved into a client.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl PriceSource for FakeSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(
        &self,
        ticker: &str,
        _start: Option<NaiveDate>,
        _end: Option<NaiveDate>,
    ) -> Result<Frame> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .frames
            .get(ticker)
            .cloned()
            .unwrap_or_else(|| vibequant::source::empty_history().unwrap()))
    }
}

pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

pub fn floats(frame: &Frame, column: &str) -> Vec<Option<f64>> {
    match frame.column(column) {
        Some(Column::Float(v)) => v.clone(),
        other => panic!("column {} is not a float column: {:?}", column, other),
    }
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
