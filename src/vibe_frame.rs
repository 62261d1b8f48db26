//! `VibeFrame`: a normalized price table plus its active seasonal summary.

use std::fmt;

use tracing::{debug, warn};

use crate::calendar::{InstrumentClass, WeekdaySet};
use crate::engine::{Engine, TableSchema};
use crate::error::Result;
use crate::frame::Frame;
use crate::normalize::normalize;
use crate::render::{RenderKind, Renderer, TextRenderer};
use crate::stats::{self, GroupStats, SignificantGroup};
use crate::transforms::{ViewKind, ORIGINAL_TABLE};

/// Holds the normalized observations (`original`) and the table produced by
/// the active view (`current`).
///
/// `original` never changes after construction; every view is recomputed
/// from it, so switching views is order-independent.
///
/// # Example
///
/// ```rust,no_run
/// use vibequant::{Frame, VibeFrame};
/// # fn prices() -> Frame { Frame::empty() }
/// let mut vf = VibeFrame::new(&prices(), Some("W"), None)?;
/// println!("{}", vf);
/// vf.change_view("M")?;
/// # Ok::<(), vibequant::VibeError>(())
/// ```
pub struct VibeFrame {
    engine: Engine,
    schema: TableSchema,
    original: Frame,
    current: Frame,
    view: Option<ViewKind>,
    weekdays: WeekdaySet,
}

impl VibeFrame {
    /// Normalize `frame` and apply the view named by `tag`.
    ///
    /// The weekday set comes from `class` when given, otherwise from the
    /// weekday names present in the data. An absent or unknown tag leaves the
    /// current table equal to the normalized input.
    pub fn new(frame: &Frame, tag: Option<&str>, class: Option<InstrumentClass>) -> Result<Self> {
        let original = normalize(frame)?;
        let engine = Engine::open()?;
        let schema = engine.register_frame(ORIGINAL_TABLE, &original)?;
        let weekdays = match class {
            Some(class) => class.weekdays(),
            None => WeekdaySet::detect(&original),
        };

        let mut vf = Self {
            engine,
            schema,
            current: original.clone(),
            original,
            view: None,
            weekdays,
        };
        if let Some(tag) = tag {
            vf.change_view(tag)?;
        }
        Ok(vf)
    }

    /// Recompute the current table for `tag`.
    ///
    /// Returns `Ok(false)` and keeps the current table when the tag is not
    /// one of `W`, `D`, `M`, `WM`, `DWM`.
    pub fn change_view(&mut self, tag: &str) -> Result<bool> {
        match ViewKind::parse(tag) {
            Some(kind) => {
                self.set_view(kind)?;
                Ok(true)
            }
            None => {
                warn!(tag, "unknown view tag; table unchanged");
                Ok(false)
            }
        }
    }

    pub fn set_view(&mut self, kind: ViewKind) -> Result<()> {
        self.current = kind.apply(&self.engine, &self.schema, self.weekdays)?;
        self.view = Some(kind);
        debug!(view = %kind, shape = ?self.current.shape(), "view applied");
        Ok(())
    }

    /// Drop the active view; the current table becomes the normalized input.
    pub fn reset_view(&mut self) {
        self.current = self.original.clone();
        self.view = None;
    }

    pub fn view(&self) -> Option<ViewKind> {
        self.view
    }

    pub fn weekdays(&self) -> WeekdaySet {
        self.weekdays
    }

    /// `(rows, columns)` of the current table.
    pub fn shape(&self) -> (usize, usize) {
        self.current.shape()
    }

    /// Copy of the current table.
    pub fn current_table(&self) -> Frame {
        self.current.clone()
    }

    /// Copy of the normalized observations.
    pub fn original_table(&self) -> Frame {
        self.original.clone()
    }

    // -- statistics -------------------------------------------------------

    /// Summary statistics of every numeric column of the current table.
    pub fn describe(&self) -> Result<Frame> {
        stats::describe(&self.engine, &self.current)
    }

    /// Per-group aggregates of `column` over the original observations.
    pub fn grouped_stats(&self, by: &str, column: &str) -> Result<Vec<GroupStats>> {
        stats::grouped_stats(&self.engine, &self.schema, by, column)
    }

    pub fn t_statistics(&self, by: &str) -> Result<Vec<SignificantGroup>> {
        stats::t_statistics(&self.engine, &self.schema, by)
    }

    /// Groups of `by` whose mean change has `|t| > threshold`.
    pub fn significant_groups(&self, by: &str, threshold: f64) -> Result<Vec<SignificantGroup>> {
        stats::significant_groups(&self.engine, &self.schema, by, threshold)
    }

    // -- output -----------------------------------------------------------

    pub fn render_kind(&self) -> RenderKind {
        RenderKind::for_view(self.view)
    }

    /// Hand the current table to `renderer` with the kind for the active view.
    pub fn render<R: Renderer>(&self, renderer: &R) -> Result<R::Output> {
        renderer.render(self.render_kind(), &self.current)
    }

    /// Print the summary line and the current table to stdout.
    pub fn print(&self) -> Result<()> {
        println!("{}", self.render(&TextRenderer::default())?);
        Ok(())
    }
}

impl fmt::Display for VibeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rows, cols) = self.shape();
        let tag = self.view.map(ViewKind::tag).unwrap_or("None");
        write!(f, "VibeFrame(type={}, shape=({}, {}))", tag, rows, cols)
    }
}

impl fmt::Debug for VibeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VibeFrame")
            .field("view", &self.view)
            .field("weekdays", &self.weekdays)
            .field("shape", &self.shape())
            .finish()
    }
}
