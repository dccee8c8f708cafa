//! Signal computation interfaces.

pub mod trend;

pub use trend::{apply_trend_signal, pct_change, rolling_mean, running_sum, sign};

use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unrecognized strategy '{0}'")]
pub struct UnknownStrategy(String);

/// A dashboard-selectable strategy. Only the moving-average family
/// `mm<window>` (e.g. `mm9`) is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendStrategy {
    pub window: usize,
}

impl TrendStrategy {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn apply(&self, table: crate::models::TimeSeriesTable) -> crate::models::TimeSeriesTable {
        apply_trend_signal(table, self.window)
    }
}

impl FromStr for TrendStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("mm")
            .and_then(|w| w.parse::<usize>().ok())
            .filter(|&w| w >= 1)
            .map(TrendStrategy::new)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}
