//! Weekday sets and instrument classes.
//!
//! Equities trade on business days only, crypto trades every day. The
//! weekday set decides which rows and columns a seasonal summary carries.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::config;
use crate::error::VibeError;
use crate::frame::{Column, Frame};

static WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Full English weekday name of `date`.
pub fn weekday_name(date: NaiveDate) -> &'static str {
    WEEKDAY_NAMES[date.weekday().num_days_from_monday() as usize]
}

/// Calendar position (Monday = 0) of a full weekday name.
pub fn weekday_position(name: &str) -> Option<usize> {
    WEEKDAY_NAMES.iter().position(|w| *w == name)
}

// ---------------------------------------------------------------------------
// WeekdaySet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeekdaySet {
    /// Monday through Friday.
    Business,
    /// Monday through Sunday.
    Calendar,
}

impl WeekdaySet {
    /// Canonical, ordered weekday names of this set.
    pub fn names(self) -> &'static [&'static str] {
        match self {
            WeekdaySet::Business => &WEEKDAY_NAMES[..5],
            WeekdaySet::Calendar => &WEEKDAY_NAMES,
        }
    }

    pub fn len(self) -> usize {
        self.names().len()
    }

    pub fn position(self, name: &str) -> Option<usize> {
        self.names().iter().position(|w| *w == name)
    }

    /// Infer the set from the data: `Calendar` if any `Weekday` cell is a
    /// weekend day, otherwise `Business`.
    ///
    /// Only used when the caller did not state an instrument class.
    pub fn detect(frame: &Frame) -> Self {
        let weekend = match frame.column(config::COL_WEEKDAY) {
            Some(Column::Text(cells)) => cells
                .iter()
                .flatten()
                .any(|w| w == "Saturday" || w == "Sunday"),
            _ => false,
        };
        let set = if weekend {
            WeekdaySet::Calendar
        } else {
            WeekdaySet::Business
        };
        debug!(?set, "weekday set inferred from data");
        set
    }
}

// ---------------------------------------------------------------------------
// InstrumentClass
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentClass {
    Stock,
    Crypto,
}

impl InstrumentClass {
    pub fn weekdays(self) -> WeekdaySet {
        match self {
            InstrumentClass::Stock => WeekdaySet::Business,
            InstrumentClass::Crypto => WeekdaySet::Calendar,
        }
    }

    /// Key of this class's list in the ticker file.
    pub fn ticker_list_key(self) -> &'static str {
        match self {
            InstrumentClass::Stock => config::TICKERS_STOCK_KEY,
            InstrumentClass::Crypto => config::TICKERS_CRYPTO_KEY,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InstrumentClass::Stock => "stock",
            InstrumentClass::Crypto => "crypto",
        }
    }
}

impl fmt::Display for InstrumentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstrumentClass {
    type Err = VibeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stock" | "stocks" | "equity" | "equities" => Ok(InstrumentClass::Stock),
            "crypto" | "cryptocurrency" => Ok(InstrumentClass::Crypto),
            other => Err(VibeError::UnknownSource(format!(
                "unknown instrument class: {}",
                other
            ))),
        }
    }
}
