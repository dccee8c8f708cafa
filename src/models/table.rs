//! Tabular models shared by the fetch and signal paths
//!
//! A [`TimeSeriesTable`] is an ordered set of `f64` columns, optionally keyed
//! by a UTC date index. Undefined values are `f64::NAN`; the index, when
//! present, is strictly increasing and unique.

use chrono::{DateTime, Utc};

/// Per-symbol time series with named numeric columns.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesTable {
    index: Vec<DateTime<Utc>>,
    columns: Vec<(String, Vec<f64>)>,
}

impl TimeSeriesTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from named columns without a time index.
    ///
    /// Invariant: all columns share the same length.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Self {
        if let Some((_, first)) = columns.first() {
            let height = first.len();
            debug_assert!(columns.iter().all(|(_, values)| values.len() == height));
        }
        Self {
            index: Vec::new(),
            columns,
        }
    }

    /// Attach a date index. Invariant: strictly increasing, one entry per row.
    pub fn with_index(mut self, index: Vec<DateTime<Utc>>) -> Self {
        debug_assert_eq!(index.len(), self.height());
        debug_assert!(index.windows(2).all(|w| w[0] < w[1]));
        self.index = index;
        self
    }

    pub fn height(&self) -> usize {
        self.columns
            .first()
            .map(|(_, values)| values.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    pub fn has_time_index(&self) -> bool {
        !self.index.is_empty()
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn columns(&self) -> &[(String, Vec<f64>)] {
        &self.columns
    }

    /// Insert or replace a column. Invariant: `values.len() == height`.
    pub fn set_column(&mut self, name: &str, values: Vec<f64>) {
        debug_assert!(self.columns.is_empty() || values.len() == self.height());
        if let Some(slot) = self.columns.iter_mut().find(|(n, _)| n == name) {
            slot.1 = values;
        } else {
            self.columns.push((name.to_string(), values));
        }
    }

    /// Keep only the trailing `fraction` of rows, in row order.
    ///
    /// `fraction` is clamped to (0, 1]; the row count kept is
    /// `height - trunc(height * (1 - fraction))`, matching the dashboard's
    /// historical "last half of the series" window for `fraction = 0.5`.
    pub fn tail_fraction(&self, fraction: f64) -> Self {
        let fraction = if fraction > 0.0 && fraction <= 1.0 {
            fraction
        } else {
            1.0
        };
        let skip = (self.height() as f64 * (1.0 - fraction)) as usize;
        let index = if self.index.is_empty() {
            Vec::new()
        } else {
            self.index[skip..].to_vec()
        };
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| (name.clone(), values[skip..].to_vec()))
            .collect();
        Self { index, columns }
    }
}

/// Companion summary-statistics table. Opaque to the core: columns are
/// carried through to the presentation boundary unmodified.
#[derive(Debug, Clone, Default)]
pub struct MetricsTable {
    columns: Vec<(String, Vec<f64>)>,
}

impl MetricsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Self {
        Self { columns }
    }

    pub fn height(&self) -> usize {
        self.columns
            .first()
            .map(|(_, values)| values.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn columns(&self) -> &[(String, Vec<f64>)] {
        &self.columns
    }
}

/// Column names shared across the fetch and signal paths.
pub mod columns {
    /// Closing price, as published by the strategy pipeline
    pub const CLOSE: &str = "close";
    /// Rolling mean of the close
    pub const MA: &str = "ma";
    /// Direction signal derived from the rolling mean
    pub const SIGNAL: &str = "signal";
    /// Per-period raw return of the close
    pub const RETURN: &str = "return";
    /// Per-period strategy return (signal applied with one-period lag)
    pub const ST: &str = "st";
    /// Running sum of the strategy returns
    pub const CUMSUM: &str = "cumsum";
    /// Date key column in serialized tables
    pub const DATE: &str = "date";
}
