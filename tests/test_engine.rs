//! DuckDB engine tests.

mod common;

use common::{date, two_mondays};
use vibequant::{Column, ColumnLabel, Engine, Frame, Scalar};

fn sample() -> Frame {
    Frame::from_columns(vec![
        (ColumnLabel::new("name"), Column::Text(vec![Some("x".into()), Some("it's".into()), None])),
        (ColumnLabel::new("n"), Column::Int(vec![Some(1), Some(2), Some(3)])),
        (ColumnLabel::new("v"), Column::Float(vec![Some(0.5), None, Some(f64::NAN)])),
        (ColumnLabel::new("Name"), Column::Date(vec![Some(date(2023, 1, 2)), None, None])),
    ])
    .unwrap()
}

#[test]
fn register_maps_labels_to_positional_idents() {
    let engine = Engine::open().unwrap();
    let schema = engine.register_frame("t", &sample()).unwrap();

    assert_eq!(schema.table, "t");
    let idents: Vec<&str> = schema.columns.iter().map(|c| c.ident.as_str()).collect();
    assert_eq!(idents, vec!["c0", "c1", "c2", "c3"]);
    assert_eq!(schema.require("Name").unwrap().ident, "c3");
    assert_eq!(schema.numeric().count(), 2);
    assert!(schema.require("missing").is_err());
}

#[test]
fn rows_round_trip_through_duckdb() {
    let engine = Engine::open().unwrap();
    engine.register_frame("t", &sample()).unwrap();

    let rows = engine.execute("SELECT c0, c1, c2, c3 FROM t ORDER BY c1", &[]).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["c0"], Scalar::Text("x".into()));
    assert_eq!(rows[0]["c1"], Scalar::Int(1));
    assert_eq!(rows[0]["c2"], Scalar::Float(0.5));
    assert_eq!(rows[0]["c3"], Scalar::Text("2023-01-02".into()));
    assert_eq!(rows[1]["c2"], Scalar::Null);
    assert_eq!(rows[2]["c0"], Scalar::Null);
    assert!(rows[2]["c2"].as_f64().unwrap().is_nan());
}

#[test]
fn execute_binds_parameters() {
    let engine = Engine::open().unwrap();
    engine.register_frame("t", &sample()).unwrap();

    let rows = engine
        .execute("SELECT c1 FROM t WHERE c0 = ?", &["it's".to_string()])
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["c1"], Scalar::Int(2));
}

#[test]
fn execute_scalar_returns_first_cell() {
    let engine = Engine::open().unwrap();
    engine.register_frame("t", &sample()).unwrap();

    let total = engine.execute_scalar("SELECT SUM(c1) FROM t", &[]).unwrap();
    assert_eq!(total.and_then(|s| s.as_i64()), Some(6));
    let none = engine.execute_scalar("SELECT c1 FROM t WHERE c1 > 10", &[]).unwrap();
    assert_eq!(none, None);
}

#[test]
fn register_replaces_existing_table() {
    let engine = Engine::open().unwrap();
    engine.register_frame("t", &sample()).unwrap();
    engine.register_frame("t", &two_mondays()).unwrap();

    let count = engine.execute_scalar("SELECT COUNT(*) FROM t", &[]).unwrap();
    assert_eq!(count.and_then(|s| s.as_i64()), Some(2));
}

#[test]
fn empty_frames_register() {
    let engine = Engine::open().unwrap();
    let schema = engine.register_frame("e", &Frame::empty()).unwrap();
    assert!(schema.columns.is_empty());

    let count = engine.execute_scalar("SELECT COUNT(*) FROM e", &[]).unwrap();
    assert_eq!(count.and_then(|s| s.as_i64()), Some(0));
}

#[test]
fn tracks_and_resets_tables() {
    let engine = Engine::open().unwrap();
    engine.register_frame("b", &sample()).unwrap();
    engine.register_frame("a", &sample()).unwrap();

    assert!(engine.has_table("a"));
    assert_eq!(engine.tables(), vec!["a", "b"]);

    engine.reset_tables().unwrap();
    assert!(engine.tables().is_empty());
    assert!(engine.execute("SELECT * FROM a", &[]).is_err());
}
