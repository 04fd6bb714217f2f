mod categories;
mod products;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use mercato_core::{FieldError, Page, ValidationErrors};

use crate::middleware::{request_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Default catalog page size, from configuration. Per-request `per_page`
    /// overrides are clamped by [`normalize_per_page`].
    pub page_size: u32,
}

/// JSON error body: an `error` message plus, for validation failures, the
/// rejected fields.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl ApiError {
    pub fn validation(errors: ValidationErrors) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            error: "invalid request parameters".to_string(),
            errors: Some(errors.0),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: message.into(),
            errors: None,
        }
    }

    pub fn storage_unavailable() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "product store unavailable".to_string(),
            errors: None,
        }
    }

    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "internal server error".to_string(),
            errors: None,
        }
    }

    #[cfg(test)]
    fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self)).into_response()
    }
}

/// Maps a storage failure onto the API error surface, logging the detail.
/// Unreachable-store failures and query faults both answer 500; the body
/// never leaks the underlying message.
pub(super) fn map_db_error(request_id: &str, error: &mercato_db::DbError) -> ApiError {
    if error.is_unavailable() {
        tracing::error!(request_id, error = %error, "product store unavailable");
        ApiError::storage_unavailable()
    } else {
        tracing::error!(request_id, error = %error, "database query failed");
        ApiError::internal()
    }
}

/// Clamp a requested page size into [1, 100], falling back to the configured
/// default.
pub(super) fn normalize_per_page(requested: Option<u32>, default: u32) -> u32 {
    requested.unwrap_or(default).clamp(1, 100)
}

/// Paginated response body mirroring the classic length-aware paginator:
/// the item slice plus position metadata and navigation links.
///
/// Under a geo post-filter, `total` and `last_page` keep describing the
/// unfiltered result set while `data` holds the filtered items — a page can
/// hold fewer than `per_page` items without being the last page.
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub current_page: u32,
    pub data: Vec<T>,
    pub first_page_url: String,
    pub from: Option<u64>,
    pub last_page: u64,
    pub last_page_url: String,
    pub next_page_url: Option<String>,
    pub path: String,
    pub per_page: u32,
    pub prev_page_url: Option<String>,
    pub to: Option<u64>,
    pub total: u64,
}

impl<T: Serialize> PageResponse<T> {
    pub fn new(page: Page<T>, uri: &Uri) -> Self {
        let path = uri.path().to_string();
        let query = uri.query();
        let last_page = page.last_page();
        let current = page.current_page;

        let next_page_url = (u64::from(current) < last_page)
            .then(|| page_url(&path, query, u64::from(current) + 1));
        let prev_page_url =
            (current > 1).then(|| page_url(&path, query, u64::from(current) - 1));

        Self {
            current_page: current,
            first_page_url: page_url(&path, query, 1),
            from: page.from_index(),
            last_page,
            last_page_url: page_url(&path, query, last_page),
            next_page_url,
            per_page: page.per_page,
            prev_page_url,
            to: page.to_index(),
            total: page.total,
            data: page.items,
            path,
        }
    }
}

/// Rebuilds the request URL pointing at `page`, preserving every other
/// query-string pair as received.
fn page_url(path: &str, query: Option<&str>, page: u64) -> String {
    let mut pairs: Vec<&str> = query
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty() && !pair.starts_with("page="))
        .collect();
    let page_pair = format!("page={page}");
    pairs.push(&page_pair);
    format!("{path}?{}", pairs.join("&"))
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/products", get(products::list_products))
        .route("/api/v1/products/top", get(products::top_products))
        .route("/api/v1/products/{id}", get(products::get_product))
        .route("/api/v1/categories", get(categories::list_categories))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match mercato_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthData {
                status: "ok",
                database: "ok",
            }),
        ),
        Err(e) => {
            tracing::warn!(request_id = %req_id.0, error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthData {
                    status: "degraded",
                    database: "unavailable",
                }),
            )
        }
    }
}
