//! Descriptive statistics and t-statistic ranking tests.

mod common;

use common::{approx, two_mondays};
use vibequant::stats::{describe, round_to, t_statistic};
use vibequant::{Column, ColumnLabel, Engine, Frame, InstrumentClass, Scalar, VibeError, VibeFrame};

/// Pre-normalized observations: one `(weekday, change)` per row.
fn observations(rows: &[(&str, f64)]) -> Frame {
    let n = rows.len();
    Frame::from_columns(vec![
        (ColumnLabel::new("DayOfMonth"), Column::Int(vec![Some(1); n])),
        (
            ColumnLabel::new("Weekday"),
            Column::Text(rows.iter().map(|r| Some(r.0.to_string())).collect()),
        ),
        (ColumnLabel::new("Month"), Column::Int(vec![Some(1); n])),
        (ColumnLabel::new("Change"), Column::Float(rows.iter().map(|r| Some(r.1)).collect())),
    ])
    .unwrap()
}

fn mixed_week() -> VibeFrame {
    let mut rows = Vec::new();
    for i in 0..10 {
        rows.push(("Monday", if i % 2 == 0 { 1.9 } else { 2.1 }));
    }
    for v in [5.1, -4.9, 5.1, -4.9, 0.1] {
        rows.push(("Tuesday", v));
    }
    rows.push(("Wednesday", 3.0));
    for _ in 0..3 {
        rows.push(("Thursday", 1.0));
    }
    rows.push(("Friday", -1.0));
    rows.push(("Friday", -3.0));
    VibeFrame::new(&observations(&rows), None, Some(InstrumentClass::Stock)).unwrap()
}

// ---------------------------------------------------------------------------
// t_statistic / round_to
// ---------------------------------------------------------------------------

#[test]
fn t_statistic_formula() {
    let t = t_statistic(2.0, 0.1, 10);
    assert!((t - 63.245_553).abs() < 1e-5);
    assert!(t_statistic(0.1, 5.0, 5).abs() < 0.05);
}

#[test]
fn t_statistic_is_undefined_for_degenerate_groups() {
    assert!(t_statistic(1.0, 0.5, 1).is_nan());
    assert!(t_statistic(1.0, 0.0, 10).is_nan());
    assert!(t_statistic(1.0, f64::NAN, 10).is_nan());
}

#[test]
fn round_to_three_places() {
    assert_eq!(round_to(63.245_553, 3), 63.246);
    assert_eq!(round_to(-2.0004, 3), -2.0);
}

// ---------------------------------------------------------------------------
// grouped_stats
// ---------------------------------------------------------------------------

#[test]
fn grouped_stats_in_weekday_order() {
    let vf = mixed_week();
    let groups = vf.grouped_stats("Weekday", "Change").unwrap();

    let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str().unwrap()).collect();
    assert_eq!(keys, vec!["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"]);

    let monday = &groups[0];
    assert_eq!(monday.count, 10);
    assert!(approx(monday.mean, 2.0));
    assert!((monday.std - 0.105_409).abs() < 1e-5);
    assert!(approx(monday.min, 1.9));
    assert!(approx(monday.max, 2.1));
    assert!(approx(monday.median, 2.0));

    let wednesday = &groups[2];
    assert_eq!(wednesday.count, 1);
    assert!(wednesday.std.is_nan());
}

#[test]
fn grouped_stats_by_numeric_key_sorts_ascending() {
    let vf = VibeFrame::new(&two_mondays(), None, None).unwrap();
    let groups = vf.grouped_stats("DayOfMonth", "Change").unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].key, Scalar::Int(2));
    assert_eq!(groups[1].key, Scalar::Int(9));
}

#[test]
fn grouped_stats_rejects_unknown_columns() {
    let vf = mixed_week();
    assert!(matches!(
        vf.grouped_stats("Quarter", "Change"),
        Err(VibeError::InvalidArgument(_))
    ));
    assert!(matches!(
        vf.grouped_stats("Weekday", "Volume"),
        Err(VibeError::InvalidArgument(_))
    ));
}

#[test]
fn grouped_stats_rejects_text_column() {
    let vf = mixed_week();
    assert!(matches!(
        vf.grouped_stats("Month", "Weekday"),
        Err(VibeError::InvalidArgument(_))
    ));
}

// ---------------------------------------------------------------------------
// t_statistics / significant_groups
// ---------------------------------------------------------------------------

#[test]
fn t_statistics_keeps_every_group() {
    let vf = mixed_week();
    let all = vf.t_statistics("Weekday").unwrap();
    assert_eq!(all.len(), 5);
    assert!(all[2].t_stat.is_nan());
    assert!(!all[3].t_stat.is_finite());
}

#[test]
fn significant_groups_filters_and_ranks() {
    let vf = mixed_week();
    let ranked = vf.significant_groups("Weekday", 1.5).unwrap();

    let keys: Vec<&str> = ranked.iter().map(|g| g.key.as_str().unwrap()).collect();
    assert_eq!(keys, vec!["Monday", "Friday"]);

    assert!((ranked[0].t_stat - 60.0).abs() < 1e-3);
    assert_eq!(ranked[0].mean, 2.0);
    assert_eq!(ranked[0].std, 0.105);
    assert_eq!(ranked[0].count, 10);
    assert_eq!(ranked[1].t_stat, -2.0);
}

#[test]
fn significant_groups_with_high_threshold_is_empty() {
    let vf = mixed_week();
    assert!(vf.significant_groups("Weekday", 100.0).unwrap().is_empty());
}

#[test]
fn equal_magnitudes_keep_group_order() {
    let frame = observations(&[
        ("Friday", -1.0),
        ("Friday", -3.0),
        ("Monday", 1.0),
        ("Monday", 3.0),
    ]);
    let vf = VibeFrame::new(&frame, None, Some(InstrumentClass::Stock)).unwrap();
    let ranked = vf.significant_groups("Weekday", 1.0).unwrap();

    let keys: Vec<&str> = ranked.iter().map(|g| g.key.as_str().unwrap()).collect();
    assert_eq!(keys, vec!["Monday", "Friday"]);
}

#[test]
fn near_ties_rank_by_unrounded_magnitude() {
    // Both round to |t| = 2.0; Friday is larger by about 1.5e-4.
    let frame = observations(&[
        ("Monday", 1.0),
        ("Monday", 3.0),
        ("Friday", -1.0),
        ("Friday", -2.9997),
    ]);
    let vf = VibeFrame::new(&frame, None, Some(InstrumentClass::Stock)).unwrap();
    let ranked = vf.significant_groups("Weekday", 1.0).unwrap();

    let keys: Vec<&str> = ranked.iter().map(|g| g.key.as_str().unwrap()).collect();
    assert_eq!(keys, vec!["Friday", "Monday"]);
    assert_eq!(ranked[0].t_stat, -2.0);
    assert_eq!(ranked[1].t_stat, 2.0);
}

// ---------------------------------------------------------------------------
// describe
// ---------------------------------------------------------------------------

#[test]
fn describe_summarizes_numeric_columns() {
    let frame = Frame::from_columns(vec![
        (ColumnLabel::new("a"), Column::Float(vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)])),
        (ColumnLabel::new("b"), Column::Int(vec![Some(10), Some(20), Some(30), None])),
        (ColumnLabel::new("c"), Column::Text(vec![None, None, None, None])),
    ])
    .unwrap();
    let engine = Engine::open().unwrap();
    let out = describe(&engine, &frame).unwrap();

    assert_eq!(out.shape(), (2, 8));
    assert_eq!(out.index().key(0), vec![Scalar::Text("a".into())]);
    let names: Vec<String> = out.labels().iter().map(|l| l.to_string()).collect();
    assert_eq!(names, vec!["count", "mean", "std", "min", "25%", "50%", "75%", "max"]);

    let a = |col: &str| out.column(col).unwrap().f64_at(0).unwrap();
    assert_eq!(a("count"), 4.0);
    assert!(approx(a("mean"), 2.5));
    assert!((a("std") - 1.290_994).abs() < 1e-6);
    assert!(approx(a("25%"), 1.75));
    assert!(approx(a("50%"), 2.5));
    assert!(approx(a("75%"), 3.25));

    let b = |col: &str| out.column(col).unwrap().f64_at(1).unwrap();
    assert_eq!(b("count"), 3.0);
    assert!(approx(b("max"), 30.0));
}

#[test]
fn describe_rows_match_numeric_columns_of_current_view() {
    let mut vf = VibeFrame::new(&two_mondays(), None, None).unwrap();
    let numeric = vf.current_table().numeric_columns().len();
    assert_eq!(vf.describe().unwrap().height(), numeric);

    vf.change_view("WM").unwrap();
    assert_eq!(vf.describe().unwrap().height(), 5);
}
