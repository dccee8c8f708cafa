//! HTTP endpoint server using Axum
//!
//! The presentation boundary: the rendering layer sends a symbol and a
//! strategy selection, and receives the annotated time series plus the
//! pass-through metrics table as JSON. Undefined numeric values serialize
//! as `null`.

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

use crate::metrics::Metrics;
use crate::models::{columns, MetricsTable, TimeSeriesTable};
use crate::services::fetcher::StrategyDataFetcher;
use crate::services::market::MarketDataProvider;
use crate::signals::TrendStrategy;

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub fetcher: Arc<StrategyDataFetcher>,
    pub market: Arc<dyn MarketDataProvider>,
    pub display_fraction: f64,
    pub default_window: usize,
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "service": "investia-strategy-engine"
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();
    state.metrics.http_requests_in_flight.dec();

    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

#[derive(Debug, Deserialize)]
struct StrategyQuery {
    strategy: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuoteQuery {
    interval: Option<String>,
    range: Option<String>,
}

/// Fetch a symbol's strategy table, annotate it with the trend signal, and
/// return the display window of it plus the pass-through metrics table.
///
/// Fetch failures stay in-band: the body carries empty `rows` and a
/// non-null `error` message, mirroring the fetcher's uniform failure
/// signal. Only an unknown strategy name is an HTTP-level error.
async fn get_strategy(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<StrategyQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let strategy = match params.strategy.as_deref() {
        None => TrendStrategy::new(state.default_window),
        Some(name) => name.parse::<TrendStrategy>().map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": e.to_string() })),
            )
        })?,
    };

    let report = state.fetcher.fetch(&symbol).await;
    if report.is_failure() || report.strategy.is_empty() {
        let message = report
            .error
            .unwrap_or_else(|| format!("no strategy data for {}", symbol));
        return Ok(Json(json!({
            "symbol": symbol,
            "window": strategy.window,
            "rows": [],
            "metrics": {},
            "warnings": report.warnings,
            "error": message,
        })));
    }

    let annotated = strategy.apply(report.strategy);
    let mut windowed = annotated.tail_fraction(state.display_fraction);

    // The displayed cumulative return re-accumulates over the visible
    // window; contributions from dropped leading rows are not carried in.
    if let Some(st) = windowed.column(columns::ST).map(|s| s.to_vec()) {
        let cumsum = crate::signals::running_sum(&st);
        windowed.set_column(columns::CUMSUM, cumsum);
    }

    let st_return = windowed
        .column(columns::CUMSUM)
        .and_then(|c| c.last().copied())
        .unwrap_or(f64::NAN);
    let latest_close = windowed
        .column(columns::CLOSE)
        .and_then(|c| c.last().copied())
        .unwrap_or(f64::NAN);

    Ok(Json(json!({
        "symbol": symbol,
        "window": strategy.window,
        "rows": table_rows(&windowed),
        "summary": {
            "st_return": json_f64(st_return),
            "latest_close": json_f64(latest_close),
        },
        "metrics": metrics_json(&report.metrics),
        "warnings": report.warnings,
        "error": Value::Null,
    })))
}

/// Historical quotes for a symbol straight from the market-data API, with
/// the card summary (latest close, simple period return).
async fn get_quote(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<QuoteQuery>,
) -> Result<Json<Value>, StatusCode> {
    let interval = params.interval.as_deref().unwrap_or("1d");
    let range = params.range.as_deref().unwrap_or("1mo");

    let history = match state.market.get_history(&symbol, interval, range).await {
        Ok(history) => history,
        Err(e) => {
            return Ok(Json(json!({
                "symbol": symbol,
                "rows": [],
                "error": e.to_string(),
            })));
        }
    };

    let close = history.column(columns::CLOSE).unwrap_or(&[]);
    let latest_close = close.iter().rev().find(|v| !v.is_nan()).copied();
    let first_close = close.iter().find(|v| !v.is_nan()).copied();
    let period_return = match (first_close, latest_close) {
        (Some(first), Some(last)) if first != 0.0 => (last - first) / first,
        _ => f64::NAN,
    };

    Ok(Json(json!({
        "symbol": symbol,
        "interval": interval,
        "range": range,
        "rows": table_rows(&history),
        "summary": {
            "latest_close": latest_close.map(json_f64).unwrap_or(Value::Null),
            "period_return": json_f64(period_return),
        },
        "error": Value::Null,
    })))
}

fn table_rows(table: &TimeSeriesTable) -> Vec<Value> {
    let mut rows = Vec::with_capacity(table.height());
    for i in 0..table.height() {
        let mut row = Map::new();
        let date = table
            .index()
            .get(i)
            .map(|d| Value::String(d.to_rfc3339()))
            .unwrap_or(Value::Null);
        row.insert(columns::DATE.to_string(), date);
        for (name, values) in table.columns() {
            row.insert(name.clone(), json_f64(values[i]));
        }
        rows.push(Value::Object(row));
    }
    rows
}

fn metrics_json(metrics: &MetricsTable) -> Value {
    let mut out = Map::new();
    for (name, values) in metrics.columns() {
        out.insert(
            name.clone(),
            Value::Array(values.iter().map(|&v| json_f64(v)).collect()),
        );
    }
    Value::Object(out)
}

fn json_f64(v: f64) -> Value {
    if v.is_finite() {
        json!(v)
    } else {
        Value::Null
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/strategies/{symbol}", get(get_strategy))
        .route("/api/quotes/{symbol}", get(get_quote))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(port: u16, state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "HTTP server listening on port {}", port);
    info!(
        "Metrics endpoint available at http://0.0.0.0:{}/metrics",
        port
    );
    axum::serve(listener, app).await?;

    Ok(())
}
