use serde::Deserialize;

use crate::api::ApiFailure;
use thesis_search::error::ErrorType;

/// GET /api/search 查询参数
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    /// Comma separated core names, empty for all
    #[serde(default)]
    pub types: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    // kept as text so a bad value is reported as a search error, not a 422
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub rows: Option<String>,
    #[serde(default, rename = "return")]
    pub return_fields: Option<String>,
}

/// GET /api/document 查询参数
#[derive(Debug, Default, Deserialize)]
pub struct DocumentParams {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "return")]
    pub return_fields: Option<String>,
}

/// Parse `start` / `rows`, blank means unset / 解析分页参数
pub fn parse_pagination(name: &str, value: Option<&str>) -> Result<Option<u64>, ApiFailure> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    value.parse().map(Some).map_err(|_| {
        ApiFailure::with_message(
            ErrorType::SolrSearchError,
            format!("Parameter {} must be a non-negative integer, got {:?}.", name, value),
        )
    })
}
