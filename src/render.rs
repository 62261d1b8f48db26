//! Routing of a summary to the renderer for its view.
//!
//! Chart drawing lives outside this crate behind [`Renderer`]. The bundled
//! [`TextRenderer`] prints titled tables.

use crate::config;
use crate::error::Result;
use crate::frame::Frame;
use crate::transforms::ViewKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderKind {
    WeekdayBar,
    DayOfMonthBar,
    MonthBar,
    CalendarHeatmap,
    /// Fallback for unsummarized tables.
    Line,
}

impl RenderKind {
    /// Renderer for a view; no active view falls back to a line chart.
    pub fn for_view(view: Option<ViewKind>) -> Self {
        match view {
            Some(ViewKind::Weekday) => RenderKind::WeekdayBar,
            Some(ViewKind::DayOfMonth) => RenderKind::DayOfMonthBar,
            Some(ViewKind::Month) => RenderKind::MonthBar,
            Some(ViewKind::DayWeekday) | Some(ViewKind::MonthDayWeekday) => {
                RenderKind::CalendarHeatmap
            }
            None => RenderKind::Line,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            RenderKind::WeekdayBar => "Average % Change by Weekday",
            RenderKind::DayOfMonthBar => "Average % Change by Day of Month",
            RenderKind::MonthBar => "Average % Change by Month",
            RenderKind::CalendarHeatmap => "Average % Change by Day of Month & Weekday",
            RenderKind::Line => "Line Plot",
        }
    }
}

/// Produces a chart artifact from a table.
pub trait Renderer {
    type Output;

    fn render(&self, kind: RenderKind, frame: &Frame) -> Result<Self::Output>;
}

/// Renders the title followed by the table as text.
#[derive(Debug, Clone, Copy)]
pub struct TextRenderer {
    rows: usize,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            rows: config::DEFAULT_TABLE_ROWS,
        }
    }
}

impl TextRenderer {
    /// Show at most `rows` table rows.
    pub fn new(rows: usize) -> Self {
        Self { rows }
    }
}

impl Renderer for TextRenderer {
    type Output = String;

    fn render(&self, kind: RenderKind, frame: &Frame) -> Result<String> {
        Ok(format!("{}\n{}", kind.title(), frame.table(self.rows)))
    }
}
