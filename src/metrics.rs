//! Prometheus metrics for the API server and the fetch path

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_requests_in_flight: IntGauge,
    pub http_request_duration_seconds: Histogram,
    pub fetch_total: IntCounter,
    pub fetch_failures_total: IntCounter,
    pub fetch_cache_hits_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total HTTP requests served")?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests currently in flight")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let fetch_total = IntCounter::new(
            "strategy_fetch_total",
            "Strategy data fetches attempted, per symbol request",
        )?;
        let fetch_failures_total = IntCounter::new(
            "strategy_fetch_failures_total",
            "Strategy data fetches that returned empty tables",
        )?;
        let fetch_cache_hits_total = IntCounter::new(
            "strategy_fetch_cache_hits_total",
            "Strategy data fetches served from the memo cache",
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(fetch_total.clone()))?;
        registry.register(Box::new(fetch_failures_total.clone()))?;
        registry.register(Box::new(fetch_cache_hits_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_requests_in_flight,
            http_request_duration_seconds,
            fetch_total,
            fetch_failures_total,
            fetch_cache_hits_total,
        })
    }

    /// Export all registered metrics in the Prometheus text format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}
