//! Moving-average trend signal and strategy return
//!
//! The strategy is deliberately simple: go with the direction of the rolling
//! mean, earn the next period's raw return. All undefined positions are NaN
//! and never raise.

use crate::models::{columns, TimeSeriesTable};
use tracing::warn;

/// Rolling mean over `window` periods. The first `window - 1` positions are
/// NaN, as is any window containing a NaN.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    if window == 0 {
        return vec![f64::NAN; n];
    }
    let mut out = vec![f64::NAN; n];
    for t in (window - 1)..n {
        let slice = &values[t + 1 - window..=t];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[t] = slice.iter().sum::<f64>() / window as f64;
    }
    out
}

/// Period-over-period relative change. The first position is NaN; a zero or
/// NaN prior value yields NaN rather than an error.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    for t in 1..values.len() {
        let prev = values[t - 1];
        let curr = values[t];
        if prev == 0.0 || prev.is_nan() || curr.is_nan() {
            continue;
        }
        out[t] = (curr - prev) / prev;
    }
    out
}

/// Direction of each value: +1.0, -1.0, 0.0, or NaN when undefined.
pub fn sign(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .map(|&v| {
            if v.is_nan() {
                f64::NAN
            } else if v > 0.0 {
                1.0
            } else if v < 0.0 {
                -1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Running sum with NaN contributions counted as zero, so the cumulative
/// series is defined for every row and flat at 0 when no value is defined.
pub fn running_sum(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut acc = 0.0;
    for &v in values {
        if !v.is_nan() {
            acc += v;
        }
        out.push(acc);
    }
    out
}

/// Annotate `table` with the trend signal columns derived from `close`:
/// rolling mean (`ma`), direction signal (`signal`), raw return (`return`),
/// lagged strategy return (`st`), and its running sum (`cumsum`).
///
/// Row count and order are preserved. A missing `close` column or a zero
/// window degrades to returning the table unchanged with a warning; it is
/// not an error.
pub fn apply_trend_signal(mut table: TimeSeriesTable, window: usize) -> TimeSeriesTable {
    if window == 0 {
        warn!("signal window must be at least 1, returning table without signal columns");
        return table;
    }
    let Some(close) = table.column(columns::CLOSE).map(|c| c.to_vec()) else {
        warn!(
            window,
            "missing '{}' column, returning table without signal columns",
            columns::CLOSE
        );
        return table;
    };
    let n = close.len();

    let ma = rolling_mean(&close, window);
    let signal = sign(&pct_change(&ma));
    let ret = pct_change(&close);

    // One-period execution lag: the signal decided at t is paid the return
    // realized over t -> t+1.
    let mut st = vec![f64::NAN; n];
    for t in 0..n {
        if t + 1 < n && !signal[t].is_nan() && !ret[t + 1].is_nan() {
            st[t] = signal[t] * ret[t + 1];
        }
    }

    let cumsum = running_sum(&st);

    table.set_column(columns::MA, ma);
    table.set_column(columns::SIGNAL, signal);
    table.set_column(columns::RETURN, ret);
    table.set_column(columns::ST, st);
    table.set_column(columns::CUMSUM, cumsum);
    table
}
