//! HTTP surface of the revenue service

use axum::{extract::{Query, State}, http::{header, HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use validator::Validate;
use crate::domain::aggregates::{
    parse_orders, DailyBucket, MonthlyBucket, MonthlyReport, Order, RevenueAggregator, RevenueStats, RevenueWindow,
    StatusCounts, StatusPercentages,
};
use crate::domain::value_objects::{is_supported_instant, SUPPORTED_YEARS};
use crate::source::OrderSource;
use crate::RevenueError;

/// Upper bound on orders accepted by `POST /api/v1/revenue/compute`.
pub const MAX_COMPUTE_ORDERS: u64 = 10_000;

#[derive(Clone)]
pub struct AppState { pub source: Arc<dyn OrderSource>, pub aggregator: RevenueAggregator }

impl AppState {
    pub fn new(source: Arc<dyn OrderSource>, aggregator: RevenueAggregator) -> Self { Self { source, aggregator } }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "winchpoint-revenue"})) }))
        .route("/api/v1/revenue/stats", get(revenue_stats))
        .route("/api/v1/revenue/total", get(revenue_total))
        .route("/api/v1/revenue/monthly", get(monthly_breakdown))
        .route("/api/v1/revenue/daily", get(daily_breakdown))
        .route("/api/v1/revenue/report", get(monthly_report))
        .route("/api/v1/revenue/compute", post(compute))
        .route("/api/v1/orders/status-counts", get(status_counts))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

fn error_response(e: RevenueError) -> (StatusCode, String) {
    let status = match &e {
        RevenueError::BackendUnavailable(_) | RevenueError::MalformedPayload(_) => StatusCode::BAD_GATEWAY,
        RevenueError::InvalidWindow(_) => StatusCode::BAD_REQUEST,
        RevenueError::InvalidTimezone(_) | RevenueError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!(%status, error = %e, "revenue request failed");
    (status, e.to_string())
}

async fn load_orders(s: &AppState, headers: &HeaderMap) -> Result<Vec<Order>, (StatusCode, String)> {
    let cookie = headers.get(header::COOKIE).and_then(|v| v.to_str().ok());
    let payload = s.source.fetch_orders(cookie).await.map_err(error_response)?;
    let orders = parse_orders(&payload, &s.aggregator.timezone()).map_err(error_response)?;
    tracing::debug!(count = orders.len(), "loaded order snapshot");
    Ok(orders)
}

fn parse_window(raw: Option<&str>) -> Result<RevenueWindow, (StatusCode, String)> {
    raw.map(str::parse::<RevenueWindow>).transpose().map(Option::unwrap_or_default).map_err(error_response)
}

async fn revenue_stats(State(s): State<AppState>, headers: HeaderMap) -> ApiResult<RevenueStats> {
    let orders = load_orders(&s, &headers).await?;
    Ok(Json(s.aggregator.compute_stats(&orders, Utc::now())))
}

#[derive(Debug, Deserialize)] pub struct TotalParams { pub window: Option<String> }
#[derive(Debug, Serialize)] pub struct TotalResponse { pub window: RevenueWindow, pub total: Decimal }

async fn revenue_total(State(s): State<AppState>, headers: HeaderMap, Query(p): Query<TotalParams>) -> ApiResult<TotalResponse> {
    let window = parse_window(p.window.as_deref())?;
    let orders = load_orders(&s, &headers).await?;
    Ok(Json(TotalResponse { window, total: s.aggregator.compute_total(&orders, window, Utc::now()) }))
}

async fn monthly_breakdown(State(s): State<AppState>, headers: HeaderMap) -> ApiResult<Vec<MonthlyBucket>> {
    let orders = load_orders(&s, &headers).await?;
    Ok(Json(s.aggregator.compute_monthly_breakdown(&orders)))
}

async fn daily_breakdown(State(s): State<AppState>, headers: HeaderMap) -> ApiResult<Vec<DailyBucket>> {
    let orders = load_orders(&s, &headers).await?;
    Ok(Json(s.aggregator.compute_daily_breakdown(&orders)))
}

async fn monthly_report(State(s): State<AppState>, headers: HeaderMap) -> ApiResult<MonthlyReport> {
    let orders = load_orders(&s, &headers).await?;
    Ok(Json(s.aggregator.compute_monthly_report(&orders)))
}

#[derive(Debug, Serialize)]
pub struct StatusCountsResponse { #[serde(flatten)] pub counts: StatusCounts, pub percentages: StatusPercentages }

async fn status_counts(State(s): State<AppState>, headers: HeaderMap) -> ApiResult<StatusCountsResponse> {
    let orders = load_orders(&s, &headers).await?;
    let counts = s.aggregator.compute_status_counts(&orders);
    Ok(Json(StatusCountsResponse { counts, percentages: counts.percentages() }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ComputeRequest {
    // keep in step with MAX_COMPUTE_ORDERS
    #[validate(length(max = 10000))]
    pub orders: Vec<Value>,
    #[serde(default)] pub window: Option<String>,
    /// Reference instant; the server clock when absent.
    #[serde(default)] pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    pub window: RevenueWindow,
    pub now: DateTime<Utc>,
    pub total: Decimal,
    pub stats: RevenueStats,
    pub monthly: Vec<MonthlyBucket>,
    pub daily: Vec<DailyBucket>,
    pub status_counts: StatusCounts,
    pub status_percentages: StatusPercentages,
    pub report: MonthlyReport,
}

/// Runs every computation over a caller-supplied snapshot; the backend is not contacted.
async fn compute(State(s): State<AppState>, Json(r): Json<ComputeRequest>) -> ApiResult<RevenueSummary> {
    r.validate().map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    let window = parse_window(r.window.as_deref())?;
    let now = r.now.unwrap_or_else(Utc::now);
    if !is_supported_instant(now) {
        return Err((StatusCode::BAD_REQUEST, format!("now must fall within years {}..={}", SUPPORTED_YEARS.start(), SUPPORTED_YEARS.end())));
    }
    let agg = s.aggregator;
    let orders = parse_orders(&Value::Array(r.orders), &agg.timezone()).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let status_counts = agg.compute_status_counts(&orders);
    Ok(Json(RevenueSummary {
        window, now,
        total: agg.compute_total(&orders, window, now),
        stats: agg.compute_stats(&orders, now),
        monthly: agg.compute_monthly_breakdown(&orders),
        daily: agg.compute_daily_breakdown(&orders),
        status_percentages: status_counts.percentages(),
        status_counts,
        report: agg.compute_monthly_report(&orders),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticOrderSource;
    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use chrono_tz::Asia::Manila;
    use serde_json::json;
    use tower::ServiceExt;

    struct DownSource;

    #[async_trait]
    impl OrderSource for DownSource {
        async fn fetch_orders(&self, _cookie: Option<&str>) -> crate::Result<Value> {
            Err(RevenueError::BackendUnavailable("connection refused".into()))
        }
    }

    fn snapshot() -> Value {
        json!([
            {"id": 1, "status": "Completed", "created_at": "2024-03-05T10:00:00+08:00", "total_price": "100.00", "proof_of_payment": "/media/1.png"},
            {"id": 2, "status": "Completed", "created_at": "2024-03-20T10:00:00+08:00", "total_price": 50, "proof_of_payment": null},
            {"id": 3, "status": "Cancelled", "created_at": "2024-03-10T10:00:00+08:00", "total_price": "999", "proof_of_payment": "/media/3.png"},
            {"id": 4, "status": "Pending", "created_at": "not a date", "total_price": "abc", "proof_of_payment": "/media/4.png"}
        ])
    }

    fn app(source: Arc<dyn OrderSource>) -> Router { router(AppState::new(source, RevenueAggregator::new(Manila))) }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn get_req(uri: &str) -> Request<Body> { Request::builder().uri(uri).body(Body::empty()).unwrap() }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(Arc::new(StaticOrderSource::default())), get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_total_all_window() {
        let (status, body) = send(app(Arc::new(StaticOrderSource::new(snapshot()))), get_req("/api/v1/revenue/total?window=all")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["window"], "all");
        assert_eq!(body["total"].as_f64(), Some(100.0));
    }

    #[tokio::test]
    async fn test_invalid_window_is_bad_request() {
        let (status, _) = send(app(Arc::new(StaticOrderSource::new(snapshot()))), get_req("/api/v1/revenue/total?window=decade")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_monthly_endpoint() {
        let (status, body) = send(app(Arc::new(StaticOrderSource::new(snapshot()))), get_req("/api/v1/revenue/monthly")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"monthKey": "2024-03", "label": "March 2024", "orderCount": 2, "revenueTotal": 150.0}]));
    }

    #[tokio::test]
    async fn test_status_counts_endpoint() {
        let (status, body) = send(app(Arc::new(StaticOrderSource::new(snapshot()))), get_req("/api/v1/orders/status-counts")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["completed"], 2);
        assert_eq!(body["total"], 4);
        assert_eq!(body["percentages"]["completed"], 50);
        assert_eq!(body["percentages"]["cancelled"], 25);
    }

    #[tokio::test]
    async fn test_backend_down_is_bad_gateway() {
        let (status, _) = send(app(Arc::new(DownSource)), get_req("/api/v1/revenue/stats")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_non_array_backend_payload_is_bad_gateway() {
        let (status, _) = send(app(Arc::new(StaticOrderSource::new(json!({"detail": "nope"})))), get_req("/api/v1/revenue/daily")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_compute_with_explicit_now() {
        let body = json!({"orders": snapshot(), "window": "month", "now": "2024-03-25T04:00:00Z"});
        let req = Request::builder()
            .method("POST").uri("/api/v1/revenue/compute")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())).unwrap();
        let (status, body) = send(app(Arc::new(DownSource)), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["window"], "month");
        assert_eq!(body["total"].as_f64(), Some(100.0));
        assert_eq!(body["stats"]["orderCount"], 4);
        assert_eq!(body["monthly"][0]["orderCount"], 2);
        assert_eq!(body["daily"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["report"]["rows"][0]["note"], "Below target");
    }

    #[tokio::test]
    async fn test_compute_rejects_oversized_snapshot() {
        let orders: Vec<Value> = (0..=MAX_COMPUTE_ORDERS).map(|id| json!({"id": id})).collect();
        let req = Request::builder()
            .method("POST").uri("/api/v1/revenue/compute")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"orders": orders}).to_string())).unwrap();
        let (status, _) = send(app(Arc::new(DownSource)), req).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_compute_rejects_out_of_range_now() {
        for now in ["-262143-01-01T00:00:00Z", "1969-12-31T23:59:59Z"] {
            let body = json!({"orders": snapshot(), "window": "today", "now": now});
            let req = Request::builder()
                .method("POST").uri("/api/v1/revenue/compute")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())).unwrap();
            let (status, _) = send(app(Arc::new(DownSource)), req).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "now {now}");
        }
    }

    #[tokio::test]
    async fn test_compute_with_huge_prices() {
        let body = json!({"orders": [
            {"id": 1, "status": "Completed", "created_at": "2024-03-05", "total_price": "50000000000000000000000000000", "proof_of_payment": "a"},
            {"id": 2, "status": "Completed", "created_at": "2024-03-06", "total_price": "50000000000000000000000000000", "proof_of_payment": "b"}
        ], "now": "2024-03-25T04:00:00Z"});
        let req = Request::builder()
            .method("POST").uri("/api/v1/revenue/compute")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())).unwrap();
        let (status, body) = send(app(Arc::new(DownSource)), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["report"]["totals"]["orders"], 2);
    }

    #[test]
    fn test_compute_order_limit_matches_validation() {
        let request = |n: u64| ComputeRequest { orders: vec![Value::Null; n as usize], window: None, now: None };
        assert!(request(MAX_COMPUTE_ORDERS).validate().is_ok());
        assert!(request(MAX_COMPUTE_ORDERS + 1).validate().is_err());
    }
}
