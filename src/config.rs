//! Environment-based configuration
//!
//! All knobs are plain environment variables with defaults, loaded once per
//! call site. `.env` files are honored by the binaries via dotenvy.

use crate::store::DataFormat;

/// Deployment environment name ("production", "prod", "sandbox", ...)
pub fn get_environment() -> String {
    std::env::var("ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string())
}

/// HTTP port for the API server
pub fn get_http_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080)
}

/// Base URL of the S3-compatible object store endpoint
pub fn get_store_endpoint() -> String {
    std::env::var("STORE_ENDPOINT").unwrap_or_else(|_| "https://s3.us-east-1.amazonaws.com".to_string())
}

/// Bucket holding the per-symbol strategy and metrics objects
pub fn get_store_bucket() -> String {
    std::env::var("STORE_BUCKET").unwrap_or_else(|_| "invest.ia".to_string())
}

/// Key prefix under which the strategy pipeline publishes its outputs
pub fn get_store_prefix() -> String {
    std::env::var("STORE_PREFIX").unwrap_or_else(|_| "first_strategy".to_string())
}

/// Serialization format of the backing objects. Fixed per deployment:
/// parquet and ipc objects are not interchangeable.
pub fn get_data_format() -> DataFormat {
    std::env::var("DATA_FORMAT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DataFormat::Parquet)
}

/// Base URL of the market-data chart API
pub fn get_market_api_url() -> String {
    std::env::var("MARKET_API_URL").unwrap_or_else(|_| "https://query1.finance.yahoo.com".to_string())
}

/// Whether fetch results are memoized per symbol for the process lifetime.
/// Stale reads are accepted; the refresh model is "restart the process".
pub fn get_cache_enabled() -> bool {
    std::env::var("FETCH_CACHE_ENABLED")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(true)
}

/// Trailing fraction of rows kept for presentation, in (0, 1].
/// The original dashboard showed only the last half of each series; this
/// makes that window an explicit knob instead of a hidden slice.
pub fn get_display_fraction() -> f64 {
    let fraction = std::env::var("DISPLAY_FRACTION")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0.5);
    if fraction > 0.0 && fraction <= 1.0 {
        fraction
    } else {
        0.5
    }
}

/// Default moving-average window when the request does not select a strategy
pub fn get_default_signal_window() -> usize {
    std::env::var("SIGNAL_WINDOW")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(9)
}
