//! Stock and crypto interfaces.

use chrono::NaiveDate;

use crate::calendar::InstrumentClass;
use crate::error::Result;
use crate::vibe_frame::VibeFrame;
use crate::VibeQuant;

/// Views over one instrument class. The class fixes the ticker list, the
/// source and the weekday set (5 days for stocks, 7 for crypto).
pub struct InstrumentQuery<'a> {
    client: &'a VibeQuant,
    class: InstrumentClass,
}

impl<'a> InstrumentQuery<'a> {
    pub fn new(client: &'a VibeQuant, class: InstrumentClass) -> Self {
        Self { client, class }
    }

    pub fn class(&self) -> InstrumentClass {
        self.class
    }

    /// Tickers of this class's list.
    pub fn list_tickers(&self) -> Result<Vec<String>> {
        self.client.list_tickers(self.class)
    }

    /// Fetch `ticker` and summarize it with the view named by `tag`.
    pub fn analyze(
        &self,
        ticker: &str,
        tag: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<VibeFrame> {
        self.client
            .build_view(ticker, Some(tag), start, end, Some(self.class))
    }
}
