//! Solr query construction / Solr 查询构建
//!
//! A [`Query`] is an immutable value wrapping a [`QueryNode`] tree. Every combinator
//! returns a new query, and the standard-parser string is only produced by rendering
//! the tree, so nesting order can be inspected without looking at text.
//!
//! ```
//! use thesis_search::search::Query;
//!
//! let q = Query::escaped_term("VNU:123")
//!     .for_field("id")
//!     .or(&Query::escaped_term("Trần").for_field("author"));
//! assert_eq!(q.text(), r"(id:VNU\:123) OR (author:Trần)");
//! ```

use std::fmt;

use serde_json::Value;

use super::sanitizer::sanitize;
use crate::error::{Error, Result};

/// Characters the standard query parser treats as syntax / 查询语法特殊字符
pub const SPECIAL_CHARS: &[char] = &[
    '\\', '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '/',
];

/// Largest edit distance / phrase slop Solr accepts / 最大模糊因子
pub const MAX_FUZZ: i32 = 2;

/// Query syntax tree / 查询语法树
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    /// Already escaped/sanitized/quoted fragment
    Term(String),
    And(Box<QueryNode>, Box<QueryNode>),
    Or(Box<QueryNode>, Box<QueryNode>),
    Boost(Box<QueryNode>, f64),
    Field(String, Box<QueryNode>),
    Fuzz(Box<QueryNode>, u8),
    Require(Box<QueryNode>, Vec<String>),
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Term(text) => f.write_str(text),
            QueryNode::And(left, right) => write!(f, "({}) AND ({})", left, right),
            QueryNode::Or(left, right) => write!(f, "({}) OR ({})", left, right),
            QueryNode::Boost(inner, factor) => write!(f, "({})^{}", inner, factor),
            QueryNode::Field(field, inner) => write!(f, "{}:{}", field, inner),
            QueryNode::Fuzz(inner, factor) => write!(f, "{}~{}", inner, factor),
            QueryNode::Require(inner, terms) => {
                write!(f, "{}", inner)?;
                for term in terms {
                    write!(f, " +{}", term)?;
                }
                Ok(())
            }
        }
    }
}

/// How raw text is turned into a term / 原始文本的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Wrap the term in double quotes
    pub as_phrase: bool,
    /// Backslash-escape special characters
    pub escape: bool,
    /// Strip low-information words
    pub sanitize: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            as_phrase: true,
            escape: false,
            sanitize: false,
        }
    }
}

impl QueryOptions {
    pub fn phrase(mut self, val: bool) -> Self {
        self.as_phrase = val;
        self
    }

    pub fn escape(mut self, val: bool) -> Self {
        self.escape = val;
        self
    }

    pub fn sanitize(mut self, val: bool) -> Self {
        self.sanitize = val;
        self
    }
}

/// Ordered `field -> boost` pairs / 有序的字段权重
///
/// Insertion order decides the nesting of the OR tree built by [`Query::for_fields`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldWeights {
    pairs: Vec<(String, f64)>,
}

impl FieldWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, replacing the weight in place if it is already present / 添加字段
    pub fn with(mut self, field: impl Into<String>, weight: f64) -> Self {
        self.insert(field, weight);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, weight: f64) {
        let field = field.into();
        match self.pairs.iter_mut().find(|(name, _)| *name == field) {
            Some(pair) => pair.1 = weight,
            None => self.pairs.push((field, weight)),
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.pairs.iter().any(|(name, _)| name == field)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.pairs.iter().map(|(name, weight)| (name.as_str(), *weight))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for FieldWeights {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut weights = FieldWeights::new();
        for (field, weight) in iter {
            weights.insert(field, weight);
        }
        weights
    }
}

impl<'a> TryFrom<&'a Value> for FieldWeights {
    type Error = Error;

    /// Build weights from a JSON object, keeping key order / 从 JSON 对象构建
    fn try_from(value: &'a Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            Error::invalid("Fields must be a dictionary of field names and boost factors.")
        })?;

        let mut weights = FieldWeights::new();
        for (field, weight) in map {
            let weight = weight.as_f64().ok_or_else(|| {
                Error::invalid(format!("Boost factor for field {} must be a number.", field))
            })?;
            weights.insert(field.as_str(), weight);
        }
        Ok(weights)
    }
}

/// Immutable query value / 不可变查询
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    node: QueryNode,
}

impl Query {
    /// Phrase query from raw text / 短语查询
    pub fn new(text: &str) -> Self {
        Self::with_options(text, QueryOptions::default())
    }

    /// Unquoted, unescaped term / 原样词项
    pub fn term(text: &str) -> Self {
        Self::with_options(text, QueryOptions::default().phrase(false))
    }

    /// Unquoted term with special characters escaped / 转义后的词项
    pub fn escaped_term(text: &str) -> Self {
        Self::with_options(text, QueryOptions::default().phrase(false).escape(true))
    }

    /// Build a term applying escape, sanitize, then phrase-wrap / 按固定顺序处理文本
    pub fn with_options(text: &str, options: QueryOptions) -> Self {
        let mut text = text.to_string();

        if options.escape {
            text = escape(&text);
        }

        if options.sanitize {
            text = sanitize(&text);
        }

        if options.as_phrase {
            text = format!("\"{}\"", text);
        }

        Self {
            node: QueryNode::Term(text),
        }
    }

    pub fn from_node(node: QueryNode) -> Self {
        Self { node }
    }

    pub fn node(&self) -> &QueryNode {
        &self.node
    }

    /// Rendered query string / 查询字符串
    pub fn text(&self) -> String {
        self.node.to_string()
    }

    /// `(self) AND (other)`
    pub fn and(&self, other: &Query) -> Query {
        Query::from_node(QueryNode::And(
            Box::new(self.node.clone()),
            Box::new(other.node.clone()),
        ))
    }

    /// `(self) OR (other)`
    pub fn or(&self, other: &Query) -> Query {
        Query::from_node(QueryNode::Or(
            Box::new(self.node.clone()),
            Box::new(other.node.clone()),
        ))
    }

    /// Append ` +term` for each required term / 必须包含的词
    pub fn require<S: AsRef<str>>(&self, terms: &[S]) -> Query {
        if terms.is_empty() {
            return self.clone();
        }

        Query::from_node(QueryNode::Require(
            Box::new(self.node.clone()),
            terms.iter().map(|t| t.as_ref().to_string()).collect(),
        ))
    }

    /// `(self)^factor` / 提升权重
    pub fn boost(&self, factor: f64) -> Result<Query> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(Error::OutOfRange(format!(
                "Boost factor must be a non-negative number, got {}.",
                factor
            )));
        }

        Ok(Query::from_node(QueryNode::Boost(
            Box::new(self.node.clone()),
            factor,
        )))
    }

    /// `field:self`, unchanged when `field` is empty / 限定字段
    pub fn for_field(&self, field: &str) -> Query {
        if field.is_empty() {
            return self.clone();
        }

        Query::from_node(QueryNode::Field(field.to_string(), Box::new(self.node.clone())))
    }

    /// `(self) OR (<weighted per-field tree>)` / 多字段加权展开
    ///
    /// The tree is right-nested in insertion order:
    /// `{A: 1, B: 2}` gives `(T) OR ((A:(T)^1) OR (B:(T)^2))`.
    pub fn for_fields(&self, weights: &FieldWeights) -> Result<Query> {
        let tree = self.field_tree(&weights.pairs)?;
        Ok(self.or(&tree))
    }

    fn field_tree(&self, pairs: &[(String, f64)]) -> Result<Query> {
        let ((field, weight), rest) = pairs.split_first().ok_or_else(|| {
            Error::invalid("Fields must contain at least one field name and boost factor.")
        })?;

        let scoped = self.boost(*weight)?.for_field(field);
        if rest.is_empty() {
            Ok(scoped)
        } else {
            Ok(scoped.or(&self.field_tree(rest)?))
        }
    }

    /// `self~factor` with 0 <= factor <= 2 / 模糊匹配
    ///
    /// On a phrase the factor is the slop between words, on a term it is the edit distance.
    pub fn fuzz(&self, factor: i32) -> Result<Query> {
        if !(0..=MAX_FUZZ).contains(&factor) {
            return Err(Error::OutOfRange("Factor must be between 0 and 2.".to_string()));
        }

        Ok(Query::from_node(QueryNode::Fuzz(
            Box::new(self.node.clone()),
            factor as u8,
        )))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.node.fmt(f)
    }
}

/// Backslash-escape every special character in one pass / 转义特殊字符
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if SPECIAL_CHARS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
