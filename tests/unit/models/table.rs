//! Unit tests for the tabular models

use chrono::{TimeZone, Utc};
use investia::models::{MetricsTable, TimeSeriesTable};

fn sample_table(rows: usize) -> TimeSeriesTable {
    let index = (0..rows)
        .map(|i| Utc.with_ymd_and_hms(2024, 1, 1 + i as u32, 0, 0, 0).unwrap())
        .collect();
    let close = (0..rows).map(|i| 100.0 + i as f64).collect();
    TimeSeriesTable::from_columns(vec![("close".to_string(), close)]).with_index(index)
}

#[test]
fn empty_table_reports_empty() {
    let table = TimeSeriesTable::new();
    assert!(table.is_empty());
    assert_eq!(table.height(), 0);
    assert!(!table.has_time_index());
}

#[test]
fn column_lookup_by_name() {
    let table = sample_table(3);
    assert_eq!(table.column("close").unwrap(), &[100.0, 101.0, 102.0]);
    assert!(table.column("missing").is_none());
}

#[test]
fn set_column_replaces_existing_values() {
    let mut table = sample_table(3);
    table.set_column("close", vec![1.0, 2.0, 3.0]);
    table.set_column("extra", vec![9.0, 9.0, 9.0]);

    assert_eq!(table.column("close").unwrap(), &[1.0, 2.0, 3.0]);
    assert_eq!(table.column_names(), vec!["close", "extra"]);
}

#[test]
fn tail_fraction_keeps_trailing_half_rounded_up() {
    // Five rows at 0.5 drop trunc(5 * 0.5) = 2 and keep the last 3, the
    // same window the dashboard historically showed.
    let table = sample_table(5).tail_fraction(0.5);

    assert_eq!(table.height(), 3);
    assert_eq!(table.column("close").unwrap(), &[102.0, 103.0, 104.0]);
    assert_eq!(table.index().len(), 3);
    assert_eq!(
        table.index()[0],
        Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap()
    );
}

#[test]
fn tail_fraction_full_window_is_identity() {
    let table = sample_table(4);
    assert_eq!(table.tail_fraction(1.0).height(), 4);
}

#[test]
fn tail_fraction_out_of_range_is_identity() {
    let table = sample_table(4);
    assert_eq!(table.tail_fraction(0.0).height(), 4);
    assert_eq!(table.tail_fraction(1.5).height(), 4);
}

#[test]
fn metrics_table_passthrough() {
    let metrics = MetricsTable::from_columns(vec![
        ("sharpe".to_string(), vec![1.2]),
        ("max_drawdown".to_string(), vec![-0.3]),
    ]);

    assert!(!metrics.is_empty());
    assert_eq!(metrics.column_names(), vec!["sharpe", "max_drawdown"]);
    assert_eq!(metrics.column("sharpe").unwrap(), &[1.2]);
}
