//! Result container tests: construction, view switching and output.

mod common;

use common::{approx, daily_prices, date, floats, two_mondays};
use vibequant::{
    Column, Frame, InstrumentClass, RenderKind, TextRenderer, VibeError, VibeFrame, ViewKind, WeekdaySet,
};

#[test]
fn new_applies_initial_view() {
    let vf = VibeFrame::new(&two_mondays(), Some("W"), Some(InstrumentClass::Stock)).unwrap();
    assert_eq!(vf.view(), Some(ViewKind::Weekday));
    assert_eq!(vf.shape(), (5, 1));
}

#[test]
fn new_without_tag_keeps_normalized_table() {
    let vf = VibeFrame::new(&two_mondays(), None, None).unwrap();
    assert_eq!(vf.view(), None);
    assert_eq!(vf.current_table(), vf.original_table());
    assert!(vf.original_table().column("Change").is_some());
}

#[test]
fn new_with_unknown_tag_is_passthrough() {
    let vf = VibeFrame::new(&two_mondays(), Some("Q"), None).unwrap();
    assert_eq!(vf.view(), None);
    assert_eq!(vf.current_table(), vf.original_table());
}

#[test]
fn new_propagates_schema_errors() {
    let bad = Frame::from_columns(vec![("Open".into(), Column::Float(vec![Some(1.0)]))]).unwrap();
    assert!(matches!(VibeFrame::new(&bad, Some("W"), None), Err(VibeError::Schema(_))));
}

#[test]
fn frame_without_rows_is_accepted() {
    let frame = Frame::empty()
        .with_column("x".into(), Column::Int(Vec::new()))
        .unwrap();
    let vf = VibeFrame::new(&frame, Some("M"), None).unwrap();
    assert_eq!(vf.shape(), (12, 1));
}

#[test]
fn weekday_set_follows_class() {
    let stock = VibeFrame::new(&two_mondays(), Some("W"), Some(InstrumentClass::Stock)).unwrap();
    let crypto = VibeFrame::new(&two_mondays(), Some("W"), Some(InstrumentClass::Crypto)).unwrap();
    assert_eq!(stock.weekdays(), WeekdaySet::Business);
    assert_eq!(crypto.weekdays(), WeekdaySet::Calendar);
    assert_eq!(stock.shape(), (5, 1));
    assert_eq!(crypto.shape(), (7, 1));
}

#[test]
fn weekday_set_is_detected_without_class() {
    let weekdays_only = VibeFrame::new(&daily_prices(date(2023, 1, 2), 10, false), None, None).unwrap();
    let every_day = VibeFrame::new(&daily_prices(date(2023, 1, 2), 10, true), None, None).unwrap();
    assert_eq!(weekdays_only.weekdays(), WeekdaySet::Business);
    assert_eq!(every_day.weekdays(), WeekdaySet::Calendar);
}

#[test]
fn change_view_switches_summary() {
    let mut vf = VibeFrame::new(&two_mondays(), Some("W"), Some(InstrumentClass::Stock)).unwrap();

    assert!(vf.change_view("D").unwrap());
    assert_eq!(vf.view(), Some(ViewKind::DayOfMonth));
    assert_eq!(vf.shape(), (31, 1));

    assert!(vf.change_view("WM").unwrap());
    assert_eq!(vf.shape(), (31, 5));

    assert!(vf.change_view("M").unwrap());
    assert_eq!(vf.shape(), (12, 1));
}

#[test]
fn change_view_is_repeatable() {
    let mut vf = VibeFrame::new(&two_mondays(), Some("W"), Some(InstrumentClass::Stock)).unwrap();
    let first = vf.current_table();
    vf.change_view("DWM").unwrap();
    vf.change_view("W").unwrap();
    assert_eq!(vf.current_table(), first);
    vf.change_view("W").unwrap();
    assert_eq!(vf.current_table(), first);
}

#[test]
fn unknown_tag_leaves_view_unchanged() {
    let mut vf = VibeFrame::new(&two_mondays(), Some("M"), None).unwrap();
    let before = vf.current_table();

    assert!(!vf.change_view("weekly").unwrap());
    assert_eq!(vf.view(), Some(ViewKind::Month));
    assert_eq!(vf.current_table(), before);
}

#[test]
fn original_is_never_changed_by_views() {
    let mut vf = VibeFrame::new(&two_mondays(), None, None).unwrap();
    let original = vf.original_table();
    for kind in ViewKind::ALL {
        vf.set_view(kind).unwrap();
        assert_eq!(vf.original_table(), original);
    }
    vf.reset_view();
    assert_eq!(vf.current_table(), original);
}

#[test]
fn monday_scenario_matches_across_views() {
    let mut vf = VibeFrame::new(&two_mondays(), Some("W"), Some(InstrumentClass::Stock)).unwrap();
    let w = floats(&vf.current_table(), "AvgChange");
    assert!(approx(w[0].unwrap(), 0.0));
    assert!(w[1..].iter().all(Option::is_none));

    vf.change_view("WM").unwrap();
    let table = vf.current_table();
    for name in ["Tuesday", "Wednesday", "Thursday", "Friday"] {
        assert!(floats(&table, name).iter().all(|v| *v == Some(0.0)));
    }
}

#[test]
fn display_shows_tag_and_shape() {
    let mut vf = VibeFrame::new(&two_mondays(), Some("W"), Some(InstrumentClass::Stock)).unwrap();
    assert_eq!(vf.to_string(), "VibeFrame(type=W, shape=(5, 1))");
    vf.reset_view();
    assert_eq!(vf.to_string(), "VibeFrame(type=None, shape=(2, 6))");
}

#[test]
fn render_dispatches_on_view() {
    let mut vf = VibeFrame::new(&two_mondays(), Some("W"), None).unwrap();
    assert_eq!(vf.render_kind(), RenderKind::WeekdayBar);
    let text = vf.render(&TextRenderer::default()).unwrap();
    assert!(text.starts_with("Average % Change by Weekday\n"));

    vf.change_view("DWM").unwrap();
    assert_eq!(vf.render_kind(), RenderKind::CalendarHeatmap);

    vf.reset_view();
    assert_eq!(vf.render_kind(), RenderKind::Line);
}

#[test]
fn empty_input_builds_empty_summaries() {
    let empty = vibequant::source::empty_history().unwrap();
    let mut vf = VibeFrame::new(&empty, Some("W"), Some(InstrumentClass::Stock)).unwrap();
    assert_eq!(vf.shape(), (5, 1));
    assert!(vf.original_table().is_empty());
    vf.change_view("DWM").unwrap();
    assert_eq!(vf.shape(), (0, 5));
}
