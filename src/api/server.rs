use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::state::AppState;

/// GET /api/health - 健康检查
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "build_time": env!("BUILD_TIME"),
    }))
}

/// GET /api/cores - 已发现的 Solr 核心
pub async fn list_cores(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.connection.core_names())
}
