use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use super::types::{parse_pagination, DocumentParams, SearchParams};
use crate::api::{ApiFailure, ApiResponse};
use crate::state::AppState;
use thesis_search::error::ErrorType;
use thesis_search::search::{
    build_document_query, build_search_query, collect_hits, resolve_cores, resolve_return_fields,
    schema,
};
use thesis_search::solr::QueryParams;

/// Fields returned as lists even when they hold one value
const KEEP_AS_LIST: &[&str] = &["keywords"];

/// GET /api/search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Vec<Value>>>, ApiFailure> {
    let kind = ErrorType::InvalidSearchRequest;

    let q = params.q.as_deref().map(str::trim).unwrap_or_default();
    if q.is_empty() {
        return Err(ApiFailure::new(kind));
    }

    let start = parse_pagination("start", params.start.as_deref())?;
    let rows = parse_pagination("rows", params.rows.as_deref())?;

    let connection = &state.connection;
    let cores = resolve_cores(params.types.as_deref().unwrap_or_default(), &connection.core_names())
        .map_err(|e| ApiFailure::from_error(e, kind))?;
    let field_list = resolve_return_fields(params.return_fields.as_deref().unwrap_or_default(), &cores)
        .map_err(|e| ApiFailure::from_error(e, kind))?;

    let base = QueryParams {
        sort: params.sort.clone(),
        start,
        rows,
        field_list: Some(field_list.clone()),
        omit_header: true,
        ..Default::default()
    };

    let mut data = Vec::new();
    for core in &cores {
        let (query, core_params) =
            build_search_query(core, q, &base).map_err(|e| ApiFailure::from_error(e, kind))?;
        let response = connection
            .query(core, &query, &core_params)
            .await
            .map_err(|e| ApiFailure::from_error(e, kind))?;
        let hits = collect_hits(response, &field_list, KEEP_AS_LIST)
            .map_err(|e| ApiFailure::from_error(e, kind))?;
        data.extend(hits);
    }

    let request = json!({
        "q": q,
        "types": cores,
        "sort": params.sort,
        "start": start,
        "rows": rows,
        "return": field_list,
    });
    Ok(Json(ApiResponse::success(request, data)))
}

/// GET /api/document
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DocumentParams>,
) -> Result<Json<ApiResponse<Vec<Value>>>, ApiFailure> {
    let kind = ErrorType::InvalidDocumentRequest;

    let id = params.id.as_deref().map(str::trim).unwrap_or_default();
    if id.is_empty() {
        return Err(ApiFailure::new(kind));
    }

    let connection = &state.connection;
    let cores: Vec<String> = connection
        .core_names()
        .into_iter()
        .filter(|core| schema::model_for(core).is_some())
        .collect();
    let field_list = resolve_return_fields(params.return_fields.as_deref().unwrap_or_default(), &cores)
        .map_err(|e| ApiFailure::from_error(e, kind))?;

    let base = QueryParams {
        field_list: Some(field_list.clone()),
        omit_header: true,
        ..Default::default()
    };
    let (query, query_params) = build_document_query(id, &base);

    let mut data = Vec::new();
    for core in &cores {
        let response = connection
            .query(core, &query, &query_params)
            .await
            .map_err(|e| ApiFailure::from_error(e, kind))?;
        data.extend(
            collect_hits(response, &field_list, KEEP_AS_LIST)
                .map_err(|e| ApiFailure::from_error(e, kind))?,
        );
    }

    let request = json!({
        "id": id,
        "types": cores,
        "return": field_list,
    });
    Ok(Json(ApiResponse::success(request, data)))
}
