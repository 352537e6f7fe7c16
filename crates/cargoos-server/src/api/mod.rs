mod export;
mod landed_cost;
mod rfq;
mod search;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use cargoos_core::AppConfig;
use cargoos_fx::FxResolver;
use cargoos_scraper::SearchPipeline;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SearchPipeline>,
    pub fx: Arc<FxResolver>,
    pub config: Arc<AppConfig>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    version: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    pub(super) fn validation(request_id: String, error: &impl std::fmt::Display) -> Self {
        Self::new(request_id, "validation_error", error.to_string())
    }

    pub(super) fn internal(request_id: String, error: &impl std::fmt::Display) -> Self {
        tracing::error!(error = %error, "request failed");
        Self::new(request_id, "internal_error", error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/search", get(search::search_batch))
        .route("/api/v1/search/stream", get(search::search_stream))
        .route("/api/v1/export/{fmt}", post(export::export_records))
        .route("/api/v1/rfq", post(rfq::create_rfq))
        .route("/api/v1/landed-cost", post(landed_cost::quote))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    Json(ApiResponse::new(
        HealthData {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
        req_id.0,
    ))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
