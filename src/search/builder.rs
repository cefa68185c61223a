//! Search request assembly / 搜索请求构建
//!
//! Validates requested cores and return fields, turns a raw search string into the
//! weighted query for one core, and flattens what Solr sends back.

use serde_json::{Map, Value};

use super::query::{Query, QueryOptions};
use super::schema::{self, DocumentModel, ID_FIELD, MANDATORY_FIELDS, SORT_SUFFIX};
use crate::error::{Error, Result};
use crate::solr::types::{QueryParams, SelectResponse};

/// Core used for diagnostics, bypasses field validation and weighting / 诊断核心
pub const DIAGNOSTIC_CORE: &str = "test";

/// Field holding highlight fragments on a flattened hit / 高亮字段
pub const HIGHLIGHT_FIELD: &str = "highlight";

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Cores to search / 解析要搜索的核心
///
/// Empty → every known core, `test` → the diagnostic core, otherwise a comma list
/// where every name must be known.
pub fn resolve_cores(requested: &str, known: &[String]) -> Result<Vec<String>> {
    let requested = requested.trim();
    if requested.is_empty() {
        return Ok(known.to_vec());
    }

    if requested == DIAGNOSTIC_CORE {
        return Ok(vec![DIAGNOSTIC_CORE.to_string()]);
    }

    let cores: Vec<String> = split_list(requested).map(str::to_string).collect();
    let invalid: Vec<&str> = cores
        .iter()
        .filter(|core| !known.contains(core))
        .map(String::as_str)
        .collect();

    if !invalid.is_empty() {
        return Err(Error::invalid(format!(
            "Invalid type(s) requested: {}",
            invalid.join(",")
        )));
    }

    Ok(cores)
}

/// `fl` parameter for the resolved cores / 解析返回字段
pub fn resolve_return_fields(requested: &str, cores: &[String]) -> Result<String> {
    if cores.len() == 1 && cores[0] == DIAGNOSTIC_CORE {
        return Ok(requested.to_string());
    }

    let valid = schema::model_fields(cores);
    if valid.is_empty() {
        return Err(Error::invalid(format!(
            "Invalid type(s) requested: {}",
            cores.join(",")
        )));
    }

    let requested = requested.trim();
    if requested.is_empty() {
        return Ok(valid.join(","));
    }

    let fields: Vec<&str> = split_list(requested).collect();
    let invalid: Vec<&str> = fields
        .iter()
        .copied()
        .filter(|field| !valid.contains(field))
        .collect();

    if !invalid.is_empty() {
        return Err(Error::invalid(format!(
            "Invalid return field(s) requested: {}",
            invalid.join(",")
        )));
    }

    let mut resolved: Vec<&str> = MANDATORY_FIELDS.to_vec();
    for field in fields {
        if !resolved.contains(&field) {
            resolved.push(field);
        }
    }
    Ok(resolved.join(","))
}

/// Weighted query and parameters for one core / 为单个核心构建查询
pub fn build_search_query(core: &str, raw: &str, base: &QueryParams) -> Result<(String, QueryParams)> {
    let mut params = base.clone();

    let Some(model) = schema::model_for(core) else {
        // diagnostic and unmodelled cores take the raw query
        return Ok((raw.to_string(), params));
    };

    let query = if raw.contains(char::is_whitespace) {
        Query::with_options(raw, QueryOptions::default().sanitize(true)).fuzz(0)?
    } else {
        Query::with_options(
            raw,
            QueryOptions::default().phrase(false).escape(raw != "*"),
        )
    };

    let query = query.for_fields(&model.weights_for(raw))?;

    params.default_field = Some(model.default_field.to_string());
    params.highlight_fields = Some(model.highlight_fields.join(","));
    if let Some(sort) = params.sort.take() {
        params.sort = Some(remap_sort(&sort, model));
    }

    let text = query.text();
    tracing::debug!("Built query for core {}: {}", core, text);
    Ok((text, params))
}

/// Rewrite sort clauses on tokenized fields to their sortable copy / 排序字段映射
///
/// `title asc, yearpub desc` → `title_str asc,yearpub desc`
pub fn remap_sort(sort: &str, model: &DocumentModel) -> String {
    split_list(sort)
        .map(|clause| {
            let mut parts = clause.split_whitespace();
            let field = parts.next().unwrap_or_default();
            let rest: Vec<&str> = parts.collect();

            let field = if model.is_text_field(field) {
                format!("{}{}", field, SORT_SUFFIX)
            } else {
                field.to_string()
            };

            if rest.is_empty() {
                field
            } else {
                format!("{} {}", field, rest.join(" "))
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Query matching a single document id / 按ID查询文档
pub fn build_document_query(id: &str, base: &QueryParams) -> (String, QueryParams) {
    let mut params = base.clone();
    params.default_field = Some(ID_FIELD.to_string());
    let query = Query::escaped_term(id).for_field(ID_FIELD);
    (query.text(), params)
}

/// Collapse single-element lists of the requested fields / 展平单元素列表
pub fn flatten_document(doc: Value, return_fields: &str, exceptions: &[&str]) -> Result<Value> {
    let Value::Object(mut map) = doc else {
        return Err(Error::invalid("Document must be a dictionary."));
    };

    for field in split_list(return_fields) {
        if exceptions.contains(&field) {
            continue;
        }
        if let Some(value) = map.get_mut(field) {
            if let Value::Array(items) = value {
                if items.len() == 1 {
                    let single = items.remove(0);
                    *value = single;
                }
            }
        }
    }

    Ok(Value::Object(map))
}

/// Flattened hits of one select response, each with its highlight map / 整理查询结果
pub fn collect_hits(response: Value, return_fields: &str, exceptions: &[&str]) -> Result<Vec<Value>> {
    let parsed: SelectResponse = serde_json::from_value(response)
        .map_err(|e| Error::UnexpectedResponse(format!("Malformed select response: {}", e)))?;
    let highlighting = parsed.highlighting.unwrap_or_default();

    let mut hits = Vec::with_capacity(parsed.response.docs.len());
    for doc in parsed.response.docs {
        let mut hit = flatten_document(doc, return_fields, exceptions)?;
        attach_highlight(&mut hit, &highlighting);
        hits.push(hit);
    }
    Ok(hits)
}

fn attach_highlight(hit: &mut Value, highlighting: &Map<String, Value>) {
    let Some(id) = hit.get(ID_FIELD).and_then(Value::as_str) else {
        return;
    };
    if let Some(fragments) = highlighting.get(id).cloned() {
        if let Value::Object(map) = hit {
            map.insert(HIGHLIGHT_FIELD.to_string(), fragments);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::schema::THESIS;
    use serde_json::json;

    fn known() -> Vec<String> {
        vec!["thesis".to_string(), "test".to_string()]
    }

    #[test]
    fn test_resolve_cores() {
        assert_eq!(resolve_cores("", &known()).unwrap(), known());
        assert_eq!(resolve_cores("test", &known()).unwrap(), vec!["test"]);
        assert_eq!(resolve_cores("thesis", &known()).unwrap(), vec!["thesis"]);
        assert_eq!(resolve_cores(" thesis , test", &known()).unwrap(), known());
    }

    #[test]
    fn test_resolve_cores_names_every_unknown() {
        let err = resolve_cores("x,thesis,y", &known()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(err.to_string(), "Invalid type(s) requested: x,y");
    }

    #[test]
    fn test_resolve_return_fields() {
        let thesis = vec!["thesis".to_string()];
        let all = resolve_return_fields("", &thesis).unwrap();
        assert!(all.starts_with("id,type,title"));
        assert!(all.contains("yearpub"));

        assert_eq!(resolve_return_fields("title,author", &thesis).unwrap(), "id,type,title,author");
        assert_eq!(resolve_return_fields("id,title", &thesis).unwrap(), "id,type,title");
    }

    #[test]
    fn test_resolve_return_fields_errors() {
        let thesis = vec!["thesis".to_string()];
        let err = resolve_return_fields("title,salary,age", &thesis).unwrap_err();
        assert_eq!(err.to_string(), "Invalid return field(s) requested: salary,age");

        let err = resolve_return_fields("", &["person".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid type(s) requested: person");
    }

    #[test]
    fn test_diagnostic_core_passthrough() {
        let test = vec!["test".to_string()];
        assert_eq!(resolve_return_fields("anything", &test).unwrap(), "anything");

        let (q, params) = build_search_query("test", "a:b c", &QueryParams::default()).unwrap();
        assert_eq!(q, "a:b c");
        assert_eq!(params, QueryParams::default());
    }

    #[test]
    fn test_single_term_is_escaped_and_weighted() {
        let (q, params) = build_search_query("thesis", "C++", &QueryParams::default()).unwrap();
        assert!(q.starts_with(r"(C\+\+) OR ((id:(C\+\+)^1) OR "));
        assert!(q.contains(r"title:(C\+\+)^10"));
        assert!(q.contains(r"keywords:(C\+\+)^6"));
        assert_eq!(params.default_field.as_deref(), Some("title"));
        assert_eq!(params.highlight_fields.as_deref(), Some("title,description"));
    }

    #[test]
    fn test_wildcard_not_escaped() {
        let (q, _) = build_search_query("thesis", "*", &QueryParams::default()).unwrap();
        assert!(q.starts_with("(*) OR"));
    }

    #[test]
    fn test_phrase_is_sanitized_and_fuzzed() {
        let (q, _) = build_search_query("thesis", "the history of Hanoi", &QueryParams::default()).unwrap();
        assert!(q.starts_with("(\"history Hanoi\"~0) OR"));
    }

    #[test]
    fn test_numeric_query_adds_yearpub() {
        let (q, _) = build_search_query("thesis", "2020", &QueryParams::default()).unwrap();
        assert!(q.contains("yearpub:(2020)^1"));

        let (q, _) = build_search_query("thesis", "abcd", &QueryParams::default()).unwrap();
        assert!(!q.contains("yearpub"));
    }

    #[test]
    fn test_sort_is_remapped() {
        let base = QueryParams {
            sort: Some("title asc, yearpub desc".to_string()),
            ..Default::default()
        };
        let (_, params) = build_search_query("thesis", "x", &base).unwrap();
        assert_eq!(params.sort.as_deref(), Some("title_str asc,yearpub desc"));
        assert_eq!(remap_sort("keywords", &THESIS), "keywords_str");
    }

    #[test]
    fn test_document_query() {
        let (q, params) = build_document_query("VNU:12/3", &QueryParams::default());
        assert_eq!(q, r"id:VNU\:12\/3");
        assert_eq!(params.default_field.as_deref(), Some("id"));
    }

    #[test]
    fn test_flatten_document() {
        let flat = flatten_document(json!({"k": ["v"]}), "k", &[]).unwrap();
        assert_eq!(flat, json!({"k": "v"}));

        let untouched = flatten_document(json!({"k": ["v", "w"]}), "k", &[]).unwrap();
        assert_eq!(untouched, json!({"k": ["v", "w"]}));

        let excepted = flatten_document(json!({"keywords": ["ai"], "title": ["T"]}), "title,keywords", &["keywords"]).unwrap();
        assert_eq!(excepted, json!({"keywords": ["ai"], "title": "T"}));

        let unrequested = flatten_document(json!({"k": ["v"]}), "other", &[]).unwrap();
        assert_eq!(unrequested, json!({"k": ["v"]}));

        assert!(matches!(
            flatten_document(json!(["v"]), "k", &[]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_collect_hits_attaches_highlight() {
        let response = json!({
            "response": {"numFound": 2, "start": 0, "docs": [
                {"id": "t1", "title": ["Deep"]},
                {"id": "t2", "title": ["Wide"]}
            ]},
            "highlighting": {"t1": {"title": ["<em>Deep</em>"]}}
        });
        let hits = collect_hits(response, "id,title", &["keywords"]).unwrap();
        assert_eq!(hits[0], json!({"id": "t1", "title": "Deep", "highlight": {"title": ["<em>Deep</em>"]}}));
        assert_eq!(hits[1], json!({"id": "t2", "title": "Wide"}));
    }
}
