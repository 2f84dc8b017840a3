use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::domain::{SalesDraft, SalesRecord, SalesSummary};
use crate::observability::{MetricsRegistry, TimingGuard};
use crate::service::{SalesService, ServiceError};
use crate::storage::SalesStore;

use super::request::SummaryQuery;
use super::response::{
    ApiError, BatchImportResponse, ErrorResponse, HealthResponse, ReadyResponse,
};

/// Shared application state.
pub struct AppState {
    /// Sales business logic
    pub service: SalesService,

    /// Store handle for readiness checks
    pub store: Arc<dyn SalesStore>,

    /// Request and record counters
    pub metrics: MetricsRegistry,

    /// Application start time
    pub start_time: Instant,

    /// Application version
    pub version: String,
}

impl AppState {
    pub fn new(store: Arc<dyn SalesStore>, version: impl Into<String>) -> Self {
        AppState {
            service: SalesService::new(Arc::clone(&store)),
            store,
            metrics: MetricsRegistry::new(),
            start_time: Instant::now(),
            version: version.into(),
        }
    }

    /// Count a failed service call and convert it for the response.
    fn fail(&self, err: ServiceError) -> ApiError {
        self.metrics.record_error(&err);
        ApiError::from(err)
    }
}

/// Create the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/sales", get(handle_list).post(handle_create))
        .route("/api/sales/summary", get(handle_summary))
        .route("/api/sales/batch", post(handle_batch_import))
        .route(
            "/api/sales/:id",
            get(handle_get).put(handle_update).delete(handle_delete),
        )
        .route("/health", get(handle_health))
        .route("/ready", get(handle_ready))
        .route("/metrics", get(handle_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn path_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// List all sales records.
async fn handle_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SalesRecord>>, ApiError> {
    let _timer = TimingGuard::new(&state.metrics);

    let records = state.service.list_all().await.map_err(|e| state.fail(e))?;
    Ok(Json(records))
}

/// Get one sales record.
async fn handle_get(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<axum::response::Response, ApiError> {
    let _timer = TimingGuard::new(&state.metrics);
    let id = path_id(path)?;

    let record = state
        .service
        .get_by_id(Some(id))
        .await
        .map_err(|e| state.fail(e))?;

    Ok(match record {
        Some(record) => Json(record).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    })
}

/// Create a sales record.
async fn handle_create(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Option<SalesDraft>>, JsonRejection>,
) -> Result<(StatusCode, Json<SalesRecord>), ApiError> {
    let _timer = TimingGuard::new(&state.metrics);
    let draft = json_body(body)?;

    let record = state
        .service
        .create(draft.as_ref())
        .await
        .map_err(|e| state.fail(e))?;

    state.metrics.record_created();
    Ok((StatusCode::CREATED, Json(record)))
}

/// Replace a sales record. The path id wins over any id in the body.
async fn handle_update(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<Option<SalesDraft>>, JsonRejection>,
) -> Result<Json<SalesRecord>, ApiError> {
    let _timer = TimingGuard::new(&state.metrics);
    let id = path_id(path)?;
    let draft = json_body(body)?;

    let record = state
        .service
        .update(Some(id), draft.as_ref())
        .await
        .map_err(|e| state.fail(e))?;

    state.metrics.record_updated();
    Ok(Json(record))
}

/// Delete a sales record.
async fn handle_delete(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let _timer = TimingGuard::new(&state.metrics);
    let id = path_id(path)?;

    let deleted = state
        .service
        .delete(Some(id))
        .await
        .map_err(|e| state.fail(e))?;

    if deleted {
        state.metrics.record_deleted();
        Ok(StatusCode::NO_CONTENT)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}

/// Aggregate sales by date, product and region.
async fn handle_summary(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> Result<Json<Vec<SalesSummary>>, ApiError> {
    let _timer = TimingGuard::new(&state.metrics);
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let summaries = state
        .service
        .aggregate(
            query.date.as_deref(),
            query.product.as_deref(),
            query.region.as_deref(),
        )
        .await
        .map_err(|e| state.fail(e))?;

    Ok(Json(summaries))
}

/// Import a list of sales records, all or nothing.
async fn handle_batch_import(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Option<Vec<SalesDraft>>>, JsonRejection>,
) -> Result<axum::response::Response, ApiError> {
    let _timer = TimingGuard::new(&state.metrics);
    let drafts = json_body(body)?;

    let success = state
        .service
        .batch_import(drafts.as_deref())
        .await
        .map_err(|e| state.fail(e))?;

    let count = drafts.map_or(0, |d| d.len());
    state.metrics.record_batch_import(success, count);

    if success {
        Ok((StatusCode::OK, Json(BatchImportResponse::new(count))).into_response())
    } else {
        warn!(count, "Batch import failed");
        Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(
                "Batch import failed",
                "BATCH_IMPORT_FAILED",
            )),
        )
            .into_response())
    }
}

/// Health check endpoint.
async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Readiness check endpoint.
async fn handle_ready(State(state): State<Arc<AppState>>) -> axum::response::Response {
    if let Err(e) = state.store.ping().await {
        warn!(error = %e, "Store not reachable");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("Database unavailable", "NOT_READY")),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(ReadyResponse {
            ready: true,
            database: "ok".to_string(),
        }),
    )
        .into_response()
}

/// Metrics endpoint (Prometheus format).
async fn handle_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let metrics = state
        .metrics
        .to_prometheus(state.start_time.elapsed().as_secs());

    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; charset=utf-8",
        )],
        metrics,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewSale;
    use crate::observability::tracing::init_test_tracing;
    use crate::storage::MockStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> (Arc<MockStore>, Router) {
        init_test_tracing();
        let store = Arc::new(MockStore::new());
        let state = Arc::new(AppState::new(store.clone(), "0.1.0-test"));
        (store, create_router(state))
    }

    fn seed(store: &MockStore, day: &str, product: &str, region: &str, cents: i64) -> i32 {
        store.seed(&[NewSale {
            sale_date: NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
            product: product.to_string(),
            region: region.to_string(),
            amount: Decimal::new(cents, 2),
        }])[0]
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, value)
    }

    fn sale_json(product: &str, amount: f64) -> Value {
        json!({
            "saleDate": "2023-01-15",
            "product": product,
            "region": "East",
            "amount": amount
        })
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (_, app) = test_app();

        let (status, body) = send(app, Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_ready_endpoint() {
        let (_, app) = test_app();

        let (status, body) = send(app, Method::GET, "/ready", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], true);
    }

    #[tokio::test]
    async fn test_list_sales() {
        let (store, app) = test_app();
        seed(&store, "2023-01-15", "A", "East", 129900);

        let (status, body) = send(app, Method::GET, "/api/sales", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], 1);
        assert_eq!(body[0]["product"], "A");
    }

    #[tokio::test]
    async fn test_get_sale() {
        let (store, app) = test_app();
        let id = seed(&store, "2023-01-15", "A", "East", 129900);

        let (status, body) = send(app.clone(), Method::GET, &format!("/api/sales/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["saleDate"], "2023-01-15");

        let (status, _) = send(app, Method::GET, "/api/sales/100", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_sale_bad_id() {
        let (_, app) = test_app();

        let (status, body) = send(app, Method::GET, "/api/sales/abc", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_create_sale() {
        let (store, app) = test_app();

        let (status, body) = send(
            app,
            Method::POST,
            "/api/sales",
            Some(sale_json("A", 1299.00)),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], 1);
        assert_eq!(body["product"], "A");
        assert_eq!(body["amount"].to_string(), "1299.00");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_create_invalid_sale() {
        let (store, app) = test_app();

        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/api/sales",
            Some(sale_json("   ", 10.0)),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Product cannot be null or empty");
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) = send(app, Method::POST, "/api/sales", Some(Value::Null)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Sales cannot be null");

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_create_malformed_date() {
        let (_, app) = test_app();

        let body = json!({"saleDate": "15/01/2023", "product": "A", "region": "East", "amount": 1});
        let (status, body) = send(app, Method::POST, "/api/sales", Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_update_sale() {
        let (store, app) = test_app();
        let id = seed(&store, "2023-01-15", "A", "East", 129900);

        let mut payload = sale_json("B", 1599.00);
        payload["id"] = json!(999);

        let (status, body) = send(app, Method::PUT, &format!("/api/sales/{id}"), Some(payload)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id);
        assert_eq!(body["product"], "B");
    }

    #[tokio::test]
    async fn test_update_missing_sale_is_server_error() {
        let (_, app) = test_app();

        let (status, body) = send(app, Method::PUT, "/api/sales/5", Some(sale_json("B", 10.0))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Sales record not found with id: 5");
    }

    #[tokio::test]
    async fn test_delete_sale() {
        let (store, app) = test_app();
        let id = seed(&store, "2023-01-15", "A", "East", 129900);

        let (status, _) = send(app.clone(), Method::DELETE, &format!("/api/sales/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(app, Method::DELETE, &format!("/api/sales/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sales_summary() {
        let (store, app) = test_app();
        seed(&store, "2023-01-01", "A", "East", 10000);
        seed(&store, "2023-01-01", "A", "East", 20000);
        seed(&store, "2023-01-01", "A", "West", 5000);

        let (status, body) = send(
            app,
            Method::GET,
            "/api/sales/summary?date=2023-01-01&product=A&region=East",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["date"], "2023-01-01");
        assert_eq!(body[0]["totalAmount"].to_string(), "300.00");
        assert_eq!(body[0]["count"], 2);
    }

    #[tokio::test]
    async fn test_sales_summary_bad_date() {
        let (_, app) = test_app();

        let (status, _) = send(app, Method::GET, "/api/sales/summary?date=2023-02-29", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_batch_import() {
        let (store, app) = test_app();

        let body = json!([sale_json("A", 10.0), sale_json("B", 20.0)]);
        let (status, body) = send(app, Method::POST, "/api/sales/batch", Some(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("Batch import successful"));
        assert_eq!(body["imported"], 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_batch_import_validation() {
        let (store, app) = test_app();

        let (status, _) = send(app.clone(), Method::POST, "/api/sales/batch", Some(json!([]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let body = json!([sale_json("A", 10.0), sale_json("B", -1.0)]);
        let (status, _) = send(app, Method::POST, "/api/sales/batch", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_batch_import_shortfall() {
        let (store, app) = test_app();
        store.set_bulk_insert_cap(Some(1));

        let body = json!([sale_json("A", 10.0), sale_json("B", 20.0)]);
        let (status, body) = send(app, Method::POST, "/api/sales/batch", Some(body)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Batch import failed");
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let (_, app) = test_app();

        send(app.clone(), Method::POST, "/api/sales", Some(sale_json("A", 5.0))).await;

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();

        assert!(text.contains("salesr_records{op=\"create\"} 1"));
    }
}
