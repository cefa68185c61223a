//! Solr request parameters and response shapes / Solr 请求参数与响应结构

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fragment size requested whenever highlighting is on / 高亮片段长度
pub const HIGHLIGHT_FRAGSIZE: u32 = 200;

/// Optional `select` parameters / 查询参数
///
/// Anything left at its default is not sent, so Solr's own defaults apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    /// Filter queries (`fq`), one parameter per entry
    pub filters: Vec<String>,
    pub sort: Option<String>,
    pub start: Option<u64>,
    pub rows: Option<u64>,
    /// Return field list (`fl`)
    pub field_list: Option<String>,
    /// Default search field (`df`)
    pub default_field: Option<String>,
    /// Highlighted fields (`hl.fl`), turns highlighting on
    pub highlight_fields: Option<String>,
    pub omit_header: bool,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl QueryParams {
    /// Marshal into query-string pairs / 序列化为查询参数
    pub fn to_pairs(&self, query: &str) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("q".to_string(), query.to_string()),
            ("wt".to_string(), "json".to_string()),
        ];

        if self.omit_header {
            pairs.push(("omitHeader".to_string(), "true".to_string()));
        }
        for filter in self.filters.iter().filter(|f| !f.trim().is_empty()) {
            pairs.push(("fq".to_string(), filter.clone()));
        }
        if let Some(sort) = non_empty(&self.sort) {
            pairs.push(("sort".to_string(), sort.to_string()));
        }
        if let Some(start) = self.start {
            pairs.push(("start".to_string(), start.to_string()));
        }
        if let Some(rows) = self.rows {
            pairs.push(("rows".to_string(), rows.to_string()));
        }
        if let Some(fl) = non_empty(&self.field_list) {
            pairs.push(("fl".to_string(), fl.to_string()));
        }
        if let Some(df) = non_empty(&self.default_field) {
            pairs.push(("df".to_string(), df.to_string()));
        }
        if let Some(hl) = non_empty(&self.highlight_fields) {
            pairs.push(("hl".to_string(), "on".to_string()));
            pairs.push(("hl.fl".to_string(), hl.to_string()));
            pairs.push(("hl.fragsize".to_string(), HIGHLIGHT_FRAGSIZE.to_string()));
        }

        pairs
    }
}

/// Decoded `select` response / 查询响应
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectResponse {
    pub response: ResultSet,
    /// doc id -> field -> fragments
    #[serde(default)]
    pub highlighting: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResultSet {
    #[serde(rename = "numFound")]
    pub num_found: u64,
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub docs: Vec<Value>,
}

/// `{"error": {"msg": ..., "code": ...}}` / Solr 错误响应
#[derive(Debug, Clone, Deserialize)]
pub struct SolrErrorBody {
    pub error: SolrErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolrErrorDetail {
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
}

/// Outcome of queueing or flushing documents / 入队或提交结果
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Nothing was sent, `pending` documents wait in the queue
    Queued { pending: usize },
    /// Queue was empty at flush time, nothing was sent
    Empty,
    /// A batch of `count` documents was sent; `ack` is Solr's reply
    Submitted { count: usize, ack: Value },
    /// The batch was rejected and put back; `pending` documents wait in the queue
    Failed { pending: usize, message: String },
}

impl Submission {
    pub fn submitted_count(&self) -> usize {
        match self {
            Submission::Submitted { count, .. } => *count,
            _ => 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Submission::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(pairs: &[(String, String)]) -> Vec<&str> {
        pairs.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn test_defaults_send_only_query() {
        let pairs = QueryParams::default().to_pairs("*:*");
        assert_eq!(keys(&pairs), vec!["q", "wt"]);
    }

    #[test]
    fn test_full_params() {
        let params = QueryParams {
            filters: vec!["type:thesis".to_string(), "".to_string()],
            sort: Some("title_str asc".to_string()),
            start: Some(0),
            rows: Some(20),
            field_list: Some("id,type,title".to_string()),
            default_field: Some("title".to_string()),
            highlight_fields: Some("title,description".to_string()),
            omit_header: true,
        };
        let pairs = params.to_pairs("q");
        assert_eq!(
            keys(&pairs),
            vec!["q", "wt", "omitHeader", "fq", "sort", "start", "rows", "fl", "df", "hl", "hl.fl", "hl.fragsize"]
        );
        assert!(pairs.contains(&("hl.fragsize".to_string(), "200".to_string())));
    }

    #[test]
    fn test_blank_strings_are_omitted() {
        let params = QueryParams {
            sort: Some("  ".to_string()),
            highlight_fields: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(keys(&params.to_pairs("q")), vec!["q", "wt"]);
    }

    #[test]
    fn test_decode_select_response() {
        let raw = json!({
            "response": {"numFound": 1, "start": 0, "docs": [{"id": "t1"}]},
            "highlighting": {"t1": {"title": ["<em>deep</em>"]}}
        });
        let parsed: SelectResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.response.num_found, 1);
        assert_eq!(parsed.response.docs.len(), 1);
        assert!(parsed.highlighting.unwrap().contains_key("t1"));
    }
}
