//! Per-instrument-class interfaces borrowing a [`VibeQuant`](crate::VibeQuant).

pub mod instruments;

pub use instruments::InstrumentQuery;
