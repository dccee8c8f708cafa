//! Unit tests for the moving-average trend signal

use investia::models::{columns, TimeSeriesTable};
use investia::signals::{apply_trend_signal, pct_change, rolling_mean, sign, TrendStrategy};

const EPS: f64 = 1e-9;

fn close_table(prices: &[f64]) -> TimeSeriesTable {
    TimeSeriesTable::from_columns(vec![(columns::CLOSE.to_string(), prices.to_vec())])
}

fn assert_series(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        if e.is_nan() {
            assert!(a.is_nan(), "position {}: expected NaN, got {}", i, a);
        } else {
            assert!(
                (a - e).abs() < EPS,
                "position {}: expected {}, got {}",
                i,
                e,
                a
            );
        }
    }
}

#[test]
fn rolling_mean_scenario() {
    let out = rolling_mean(&[10.0, 11.0, 9.0, 12.0], 2);
    assert_series(&out, &[f64::NAN, 10.5, 10.0, 10.5]);
}

#[test]
fn rolling_mean_window_larger_than_series() {
    let out = rolling_mean(&[10.0, 11.0], 5);
    assert!(out.iter().all(|v| v.is_nan()));
}

#[test]
fn pct_change_first_position_undefined() {
    let out = pct_change(&[10.0, 11.0, 9.0, 12.0]);
    assert_series(
        &out,
        &[f64::NAN, 0.1, -2.0 / 11.0, 3.0 / 9.0],
    );
}

#[test]
fn pct_change_zero_prior_is_nan_not_error() {
    let out = pct_change(&[0.0, 5.0, 10.0]);
    assert!(out[0].is_nan());
    assert!(out[1].is_nan());
    assert!((out[2] - 1.0).abs() < EPS);
}

#[test]
fn sign_directions() {
    let out = sign(&[0.3, -0.2, 0.0, f64::NAN]);
    assert_series(&out, &[1.0, -1.0, 0.0, f64::NAN]);
}

#[test]
fn trend_signal_scenario() {
    let table = apply_trend_signal(close_table(&[10.0, 11.0, 9.0, 12.0]), 2);

    assert_series(
        table.column(columns::MA).unwrap(),
        &[f64::NAN, 10.5, 10.0, 10.5],
    );
    assert_series(
        table.column(columns::SIGNAL).unwrap(),
        &[f64::NAN, f64::NAN, -1.0, 1.0],
    );
    assert_series(
        table.column(columns::RETURN).unwrap(),
        &[f64::NAN, 0.1, -2.0 / 11.0, 3.0 / 9.0],
    );
    // Signal at t earns the return realized over t -> t+1. The last row has
    // no next return, so it stays undefined.
    assert_series(
        table.column(columns::ST).unwrap(),
        &[f64::NAN, f64::NAN, -3.0 / 9.0, f64::NAN],
    );
    assert_series(
        table.column(columns::CUMSUM).unwrap(),
        &[0.0, 0.0, -3.0 / 9.0, -3.0 / 9.0],
    );
}

#[test]
fn trend_signal_preserves_rows_and_order() {
    let prices: Vec<f64> = (1..=50).map(|i| 100.0 + (i as f64).sin()).collect();
    let table = apply_trend_signal(close_table(&prices), 9);

    assert_eq!(table.height(), prices.len());
    assert_series(table.column(columns::CLOSE).unwrap(), &prices);
}

#[test]
fn cumsum_increments_by_defined_strategy_returns() {
    let prices: Vec<f64> = (1..=30).map(|i| 50.0 + ((i * 7) % 13) as f64).collect();
    let table = apply_trend_signal(close_table(&prices), 3);

    let st = table.column(columns::ST).unwrap();
    let cumsum = table.column(columns::CUMSUM).unwrap();
    let mut acc = 0.0;
    for t in 0..prices.len() {
        if !st[t].is_nan() {
            acc += st[t];
        }
        assert!((cumsum[t] - acc).abs() < EPS, "cumsum diverges at {}", t);
    }
}

#[test]
fn window_at_least_row_count_flattens_strategy() {
    let table = apply_trend_signal(close_table(&[10.0, 11.0, 9.0, 12.0]), 4);

    assert!(table
        .column(columns::SIGNAL)
        .unwrap()
        .iter()
        .all(|v| v.is_nan()));
    assert!(table
        .column(columns::CUMSUM)
        .unwrap()
        .iter()
        .all(|&v| v == 0.0));
}

#[test]
fn missing_close_column_degrades_to_identity() {
    let table = TimeSeriesTable::from_columns(vec![("volume".to_string(), vec![1.0, 2.0])]);
    let out = apply_trend_signal(table, 9);

    assert_eq!(out.column_names(), vec!["volume"]);
    assert!(out.column(columns::MA).is_none());
}

#[test]
fn zero_window_degrades_to_identity() {
    let out = apply_trend_signal(close_table(&[10.0, 11.0]), 0);
    assert_eq!(out.column_names(), vec![columns::CLOSE]);
}

#[test]
fn strategy_names_parse_moving_average_family() {
    assert_eq!("mm9".parse::<TrendStrategy>().unwrap().window, 9);
    assert_eq!("mm2".parse::<TrendStrategy>().unwrap().window, 2);
    assert!("mm0".parse::<TrendStrategy>().is_err());
    assert!("macd".parse::<TrendStrategy>().is_err());
    assert!("".parse::<TrendStrategy>().is_err());
}
