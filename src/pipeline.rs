//! Ingest pipeline for crawled thesis records / 爬取论文的入库流水线
//!
//! Crawled JSON lines → [`ThesisItem`] → duplicate filter → [`Document`] → core queue.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::search::schema::{Document, FieldValue, THESIS};
use crate::solr::{IndexConnection, Submission};

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\b").expect("valid year regex"));
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// One crawled thesis record / 爬取的论文记录
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThesisItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<FieldValue>,
    #[serde(default)]
    pub advisor: Option<FieldValue>,
    #[serde(default)]
    pub publish_date: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default, rename = "abstract")]
    pub description: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub keywords: Option<FieldValue>,
}

/// `"Nguyễn, Văn A"` → `"Nguyễn Văn A"` / 规范人名
pub fn clean_name(name: &str) -> String {
    let joined = name
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    SPACE_RE.replace_all(&joined, " ").into_owned()
}

fn clean_names(value: &FieldValue) -> FieldValue {
    match value {
        FieldValue::Single(name) => FieldValue::Single(clean_name(name)),
        FieldValue::Multi(names) => FieldValue::Multi(names.iter().map(|n| clean_name(n)).collect()),
    }
}

fn joined(value: &FieldValue) -> String {
    match value {
        FieldValue::Single(value) => value.clone(),
        FieldValue::Multi(values) => values.join("; "),
    }
}

/// First four-digit year in a date string / 提取年份
pub fn extract_year(date: &str) -> Option<String> {
    YEAR_RE.captures(date).map(|caps| caps[1].to_string())
}

impl ThesisItem {
    /// Title and cleaned author, both required / 标题与作者
    fn identity(&self) -> Result<(String, String)> {
        let title = self.title.as_deref().map(str::trim).unwrap_or_default();
        let author = self
            .author
            .as_ref()
            .map(|a| joined(&clean_names(a)))
            .unwrap_or_default();

        if title.is_empty() || author.trim().is_empty() {
            return Err(Error::invalid("Item must have both a title and an author."));
        }
        Ok((title.to_string(), author))
    }

    /// Stable document id derived from title and author / 由标题和作者生成ID
    pub fn document_id(&self) -> Result<String> {
        let (title, author) = self.identity()?;
        let mut hasher = Sha256::new();
        hasher.update(title.as_bytes());
        hasher.update(b"\n");
        hasher.update(author.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }

    /// Convert to a thesis document stamped at `now` / 转换为文档
    pub fn into_document(self, now: DateTime<Utc>) -> Result<Document> {
        let id = self.document_id()?;
        let mut doc = Document::new(id, THESIS.doc_type)
            .with("updatedAt", now.to_rfc3339_opts(SecondsFormat::Secs, true));

        if let Some(title) = self.title {
            doc.set("title", title.trim());
        }
        if let Some(author) = &self.author {
            doc.set("author", clean_names(author));
        }
        if let Some(advisor) = &self.advisor {
            doc.set("advisor", clean_names(advisor));
        }
        if let Some(year) = self.publish_date.as_deref().and_then(extract_year) {
            doc.set("yearpub", year);
        }

        let optional = [
            ("publisher", self.publisher),
            ("description", self.description),
            ("uri", self.uri),
            ("file_url", self.file_url),
            ("language", self.language),
        ];
        for (field, value) in optional {
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                doc.set(field, value);
            }
        }
        if let Some(keywords) = self.keywords {
            doc.set("keywords", keywords);
        }

        Ok(doc)
    }
}

/// Outcome of the duplicate filter / 去重结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filtered {
    Accepted,
    Duplicate,
}

/// Drops items whose title + author was already seen / 重复项过滤器
#[derive(Default)]
pub struct DuplicateFilter {
    seen: Mutex<HashSet<String>>,
}

impl DuplicateFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&self, item: &ThesisItem) -> Result<Filtered> {
        let (title, author) = item.identity()?;
        let key = format!("{}\n{}", title, author);
        if self.seen.lock().insert(key) {
            Ok(Filtered::Accepted)
        } else {
            Ok(Filtered::Duplicate)
        }
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }
}

/// What happened to one processed item / 单条处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum Processed {
    Indexed(Submission),
    Duplicate,
}

/// Filter, convert and queue crawled items / 入库流水线
pub struct IndexPipeline {
    connection: Arc<IndexConnection>,
    filter: DuplicateFilter,
    core: String,
}

impl IndexPipeline {
    pub fn new(connection: Arc<IndexConnection>) -> Self {
        Self {
            connection,
            filter: DuplicateFilter::new(),
            core: THESIS.doc_type.to_string(),
        }
    }

    pub async fn process_item(&self, item: ThesisItem) -> Result<Processed> {
        if self.filter.check(&item)? == Filtered::Duplicate {
            tracing::debug!("Duplicate item dropped: {:?}", item.title);
            return Ok(Processed::Duplicate);
        }

        let doc = item.into_document(Utc::now())?;
        let submission = self.connection.add_document(&self.core, doc).await?;
        Ok(Processed::Indexed(submission))
    }

    /// Flush every queue / 结束时提交所有队列
    ///
    /// Every core is attempted; an error names the cores still holding documents.
    pub async fn close(&self) -> Result<usize> {
        let results = self.connection.flush_all().await;
        let count = results.values().map(Submission::submitted_count).sum();
        tracing::info!("Pipeline closed, flushed {} document(s)", count);

        let failed: Vec<String> = results
            .iter()
            .filter_map(|(core, outcome)| match outcome {
                Submission::Failed { pending, message } => {
                    Some(format!("{} ({} pending: {})", core, pending, message))
                }
                _ => None,
            })
            .collect();
        if !failed.is_empty() {
            return Err(Error::Connection(format!(
                "Flush failed for core(s) {}",
                failed.join(", ")
            )));
        }
        Ok(count)
    }
}

/// Parse one crawled JSON line, `None` for blank lines / 解析一行 JSON
pub fn parse_json_line(line: &str) -> Result<Option<ThesisItem>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|e| Error::invalid(format!("Malformed item: {}", e)))
}
