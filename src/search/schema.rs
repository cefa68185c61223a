//! Search index schema definition / 搜索索引的 Schema 定义
//!
//! Every Solr core holds one document type. A [`DocumentModel`] lists the fields a
//! type declares and how queries against its core are weighted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::query::FieldWeights;

/// Document id field / 文档ID字段
pub const ID_FIELD: &str = "id";
/// Document type field / 文档类型字段
pub const TYPE_FIELD: &str = "type";
/// Fields every document carries and every response returns / 必需字段
pub const MANDATORY_FIELDS: &[&str] = &[ID_FIELD, TYPE_FIELD];
/// Suffix of the string copy Solr keeps for sorting text fields / 排序字段后缀
pub const SORT_SUFFIX: &str = "_str";

/// Field value: a single string or a list of strings / 字段值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multi(Vec<String>),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Single(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Single(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::Multi(values)
    }
}

/// Flat document sent to Solr / 发送到 Solr 的扁平文档
///
/// Always carries `id` and `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<String, FieldValue>", try_from = "BTreeMap<String, FieldValue>")]
pub struct Document {
    fields: BTreeMap<String, FieldValue>,
}

impl Document {
    pub fn new(id: impl Into<String>, doc_type: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(ID_FIELD.to_string(), FieldValue::Single(id.into()));
        fields.insert(TYPE_FIELD.to_string(), FieldValue::Single(doc_type.into()));
        Self { fields }
    }

    /// Builder-style setter / 链式设置字段
    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn id(&self) -> &str {
        self.single(ID_FIELD).unwrap_or_default()
    }

    pub fn doc_type(&self) -> &str {
        self.single(TYPE_FIELD).unwrap_or_default()
    }

    fn single(&self, field: &str) -> Option<&str> {
        match self.fields.get(field) {
            Some(FieldValue::Single(value)) => Some(value.as_str()),
            Some(FieldValue::Multi(values)) => values.first().map(String::as_str),
            None => None,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl From<Document> for BTreeMap<String, FieldValue> {
    fn from(doc: Document) -> Self {
        doc.fields
    }
}

impl TryFrom<BTreeMap<String, FieldValue>> for Document {
    type Error = String;

    fn try_from(fields: BTreeMap<String, FieldValue>) -> Result<Self, Self::Error> {
        for field in MANDATORY_FIELDS {
            if !fields.contains_key(*field) {
                return Err(format!("Document is missing the mandatory field {}", field));
            }
        }
        Ok(Self { fields })
    }
}

/// Declared fields and query weighting of one document type / 文档类型定义
#[derive(Debug)]
pub struct DocumentModel {
    /// Value of the `type` field, also the name of the core holding these documents
    pub doc_type: &'static str,
    /// Declared fields in declaration order
    pub fields: &'static [&'static str],
    /// Tokenized (multivalued) fields that sort through their `_str` copy
    pub text_fields: &'static [&'static str],
    /// Boost per field used when expanding a search over fields
    pub weights: &'static [(&'static str, f64)],
    /// Extra weighted field used only for purely numeric queries
    pub numeric_field: Option<(&'static str, f64)>,
    /// Default search field (`df`)
    pub default_field: &'static str,
    /// Highlighted fields (`hl.fl`)
    pub highlight_fields: &'static [&'static str],
}

impl DocumentModel {
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }

    pub fn is_text_field(&self, field: &str) -> bool {
        self.text_fields.contains(&field)
    }

    /// Field weights for a raw query / 根据查询生成字段权重
    pub fn weights_for(&self, raw_query: &str) -> FieldWeights {
        let mut weights: FieldWeights = self.weights.iter().copied().collect();
        if let Some((field, weight)) = self.numeric_field {
            if is_numeric(raw_query) {
                weights.insert(field, weight);
            }
        }
        weights
    }
}

/// Thesis document / 学位论文
pub const THESIS: DocumentModel = DocumentModel {
    doc_type: "thesis",
    fields: &[
        "id",
        "type",
        "title",
        "author",
        "description",
        "updatedAt",
        "yearpub",
        "advisor",
        "publisher",
        "uri",
        "file_url",
        "language",
        "keywords",
    ],
    text_fields: &[
        "title",
        "author",
        "description",
        "advisor",
        "publisher",
        "language",
        "keywords",
    ],
    weights: &[
        ("id", 1.0),
        ("title", 10.0),
        ("author", 5.0),
        ("description", 8.0),
        ("advisor", 5.0),
        ("publisher", 4.0),
        ("keywords", 6.0),
    ],
    numeric_field: Some(("yearpub", 1.0)),
    default_field: "title",
    highlight_fields: &["title", "description"],
};

/// All document types known to the application / 所有文档类型
pub const MODELS: &[&DocumentModel] = &[&THESIS];

/// Model for a document type / 按类型查找模型
pub fn model_for(doc_type: &str) -> Option<&'static DocumentModel> {
    MODELS.iter().copied().find(|model| model.doc_type == doc_type)
}

/// Union of declared fields of the given types, in declaration order / 字段并集
pub fn model_fields<S: AsRef<str>>(types: &[S]) -> Vec<&'static str> {
    let mut fields: Vec<&'static str> = Vec::new();
    for model in MODELS {
        if !types.iter().any(|t| t.as_ref() == model.doc_type) {
            continue;
        }
        for field in model.fields {
            if !fields.contains(field) {
                fields.push(*field);
            }
        }
    }
    fields
}

/// Non-empty and ASCII digits only / 纯数字
pub fn is_numeric(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}
