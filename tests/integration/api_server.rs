//! Integration tests for the API Server
//!
//! Tests HTTP endpoints against wiremock-backed object store and
//! market-data dependencies.

#[path = "test_utils.rs"]
mod test_utils;

use serde_json::Value;

use test_utils::TestApp;

#[tokio::test]
async fn health_endpoint_reports_healthy_status() {
    let app = TestApp::new().await;
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_seconds"].as_u64().is_some());
    assert_eq!(body["service"], "investia-strategy-engine");
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_metrics() {
    let app = TestApp::new().await;
    let response = app.server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);

    let body = response.text();
    assert!(
        body.contains("http_requests_total"),
        "Expected Prometheus metrics output"
    );
}

#[tokio::test]
async fn strategy_endpoint_returns_annotated_display_window() {
    let app = TestApp::new().await;
    let response = app.server.get("/api/strategies/BTCUSD").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["symbol"], "BTCUSD");
    assert_eq!(body["window"], 2);
    assert!(body["error"].is_null());

    // Eight fetched rows, display fraction 0.5: the trailing four remain.
    let rows = body["rows"].as_array().expect("rows array");
    assert_eq!(rows.len(), 4);

    let last = rows.last().unwrap();
    assert_eq!(last["close"].as_f64().unwrap(), 17.0);
    assert!(last["date"].as_str().is_some());
    // The final row has no next-period return, so its strategy return is
    // undefined and serializes as null.
    assert!(last["st"].is_null());
    assert!(last["cumsum"].as_f64().is_some());

    let summary = &body["summary"];
    assert_eq!(summary["latest_close"].as_f64().unwrap(), 17.0);
    // The cumulative return shown is re-accumulated over the visible four
    // rows: -1/13 + 0 + 3/14 = 25/182.
    let st_return = summary["st_return"].as_f64().unwrap();
    assert!((st_return - 25.0 / 182.0).abs() < 1e-9);
}

#[tokio::test]
async fn strategy_endpoint_passes_metrics_table_through() {
    let app = TestApp::new().await;
    let body: Value = app.server.get("/api/strategies/BTCUSD").await.json();

    assert_eq!(body["metrics"]["sharpe"][0].as_f64().unwrap(), 1.4);
    assert_eq!(body["metrics"]["max_drawdown"][0].as_f64().unwrap(), -0.25);
}

#[tokio::test]
async fn strategy_endpoint_reports_missing_symbol_in_band() {
    let app = TestApp::new().await;
    let response = app.server.get("/api/strategies/ETHUSD").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert!(body["rows"].as_array().unwrap().is_empty());
    let message = body["error"].as_str().expect("error message");
    assert!(message.contains("ETHUSD"));
}

#[tokio::test]
async fn strategy_endpoint_accepts_selected_strategy() {
    let app = TestApp::new().await;
    let response = app
        .server
        .get("/api/strategies/BTCUSD")
        .add_query_param("strategy", "mm3")
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["window"], 3);
}

#[tokio::test]
async fn strategy_endpoint_rejects_unknown_strategy() {
    let app = TestApp::new().await;
    let response = app
        .server
        .get("/api/strategies/BTCUSD")
        .add_query_param("strategy", "macd")
        .await;
    assert_eq!(response.status_code(), 400);

    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("macd"));
}

#[tokio::test]
async fn strategy_requests_are_counted() {
    let app = TestApp::new().await;
    app.server.get("/api/strategies/BTCUSD").await;
    app.server.get("/api/strategies/ETHUSD").await;

    assert!(app.metrics.fetch_total.get() >= 2);
    assert!(app.metrics.fetch_failures_total.get() >= 1);
}

#[tokio::test]
async fn quote_endpoint_returns_history_with_summary() {
    let app = TestApp::new().await;
    let response = app.server.get("/api/quotes/AAPL").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["symbol"], "AAPL");
    assert!(body["error"].is_null());

    let rows = body["rows"].as_array().expect("rows array");
    assert_eq!(rows.len(), 4);
    // The third data point is null upstream and stays null here.
    assert!(rows[2]["close"].is_null());

    let summary = &body["summary"];
    assert_eq!(summary["latest_close"].as_f64().unwrap(), 103.0);
    assert!((summary["period_return"].as_f64().unwrap() - 0.03).abs() < 1e-9);
}

#[tokio::test]
async fn quote_endpoint_reports_unknown_symbol_in_band() {
    let app = TestApp::new().await;
    let response = app.server.get("/api/quotes/MSFT").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert!(body["rows"].as_array().unwrap().is_empty());
    assert!(!body["error"].as_str().unwrap().is_empty());
}
