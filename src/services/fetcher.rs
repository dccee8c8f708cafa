//! Strategy data fetcher
//!
//! Resolves the two backing objects for a symbol, deserializes them, and
//! normalizes the strategy table's date index. Failure is reported in-band:
//! callers receive empty tables plus a descriptive message, never an `Err`.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use crate::metrics::Metrics;
use crate::models::{MetricsTable, TimeSeriesTable};
use crate::store::{format, DataFormat, ObjectStore, StoreError};

/// Outcome of one fetch. `error` is `Some` exactly when both tables are the
/// uniform empty failure signal.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub strategy: TimeSeriesTable,
    pub metrics: MetricsTable,
    pub error: Option<String>,
    pub warnings: Vec<String>,
}

impl FetchReport {
    fn failed(message: String) -> Self {
        Self {
            error: Some(message),
            ..Default::default()
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

type CachedFetch = (TimeSeriesTable, MetricsTable, Vec<String>);

pub struct StrategyDataFetcher {
    store: Arc<dyn ObjectStore>,
    format: DataFormat,
    prefix: String,
    cache: Option<RwLock<HashMap<String, CachedFetch>>>,
    metrics: Option<Arc<Metrics>>,
}

impl StrategyDataFetcher {
    pub fn new(store: Arc<dyn ObjectStore>, format: DataFormat, prefix: impl Into<String>) -> Self {
        Self {
            store,
            format,
            prefix: prefix.into(),
            cache: None,
            metrics: None,
        }
    }

    /// Enable per-symbol memoization of successful fetches. The cache is
    /// never invalidated within the process lifetime; the refresh model is
    /// "restart the process", and upstream changes are stale until then.
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(RwLock::new(HashMap::new()));
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn strategy_key(&self, symbol: &str) -> String {
        format!(
            "{}/{}_strategy_data.{}",
            self.prefix,
            symbol,
            self.format.ext()
        )
    }

    pub fn metrics_key(&self, symbol: &str) -> String {
        format!("{}/{}_metrics.{}", self.prefix, symbol, self.format.ext())
    }

    /// Fetch both backing tables for `symbol`.
    pub async fn fetch(&self, symbol: &str) -> FetchReport {
        if let Some(metrics) = &self.metrics {
            metrics.fetch_total.inc();
        }
        if symbol.is_empty() {
            return self.failure("symbol must not be empty".to_string());
        }

        if let Some(cache) = &self.cache {
            if let Some((strategy, metrics_table, warnings)) = cache.read().await.get(symbol) {
                debug!(symbol, "fetch served from memo cache");
                if let Some(metrics) = &self.metrics {
                    metrics.fetch_cache_hits_total.inc();
                }
                return FetchReport {
                    strategy: strategy.clone(),
                    metrics: metrics_table.clone(),
                    error: None,
                    warnings: warnings.clone(),
                };
            }
        }

        match self.try_fetch(symbol).await {
            Ok((strategy, metrics_table, warnings)) => {
                if let Some(cache) = &self.cache {
                    cache.write().await.insert(
                        symbol.to_string(),
                        (strategy.clone(), metrics_table.clone(), warnings.clone()),
                    );
                }
                FetchReport {
                    strategy,
                    metrics: metrics_table,
                    error: None,
                    warnings,
                }
            }
            Err(e) => {
                error!(symbol, error = %e, "strategy data fetch failed");
                self.failure(format!("error retrieving data for {}: {}", symbol, e))
            }
        }
    }

    fn failure(&self, message: String) -> FetchReport {
        if let Some(metrics) = &self.metrics {
            metrics.fetch_failures_total.inc();
        }
        FetchReport::failed(message)
    }

    async fn try_fetch(&self, symbol: &str) -> Result<CachedFetch, StoreError> {
        let strategy_bytes = self.store.get_object(&self.strategy_key(symbol)).await?;
        let metrics_bytes = self.store.get_object(&self.metrics_key(symbol)).await?;

        let (strategy, warnings) = format::read_table(&strategy_bytes, self.format)?;
        let metrics_table = format::read_metrics(&metrics_bytes, self.format)?;

        for warning in &warnings {
            warn!(symbol, "{}", warning);
        }
        Ok((strategy, metrics_table, warnings))
    }
}
