pub mod search;
pub mod server;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use thesis_search::error::{ApiError, Error, ErrorType};

/// Success envelope: the interpreted request and the results / 成功响应
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub request: Value,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(request: Value, data: T) -> Self {
        Self { request, data }
    }
}

/// Error response carrying `{errorType, message}` / 错误响应
#[derive(Debug)]
pub struct ApiFailure(pub ApiError);

impl ApiFailure {
    pub fn new(error_type: ErrorType) -> Self {
        Self(ApiError::new(error_type))
    }

    pub fn with_message(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self(ApiError::with_message(error_type, message))
    }

    /// Classify a library error raised while serving `request_kind`
    pub fn from_error(err: Error, request_kind: ErrorType) -> Self {
        Self(ApiError::from_error(&err, request_kind))
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.error_type.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }
        (status, Json(self.0)).into_response()
    }
}

/// HTTP routes / 路由
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(server::health_check))
        .route("/api/cores", get(server::list_cores))
        .route("/api/search", get(search::search))
        .route("/api/document", get(search::get_document))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
