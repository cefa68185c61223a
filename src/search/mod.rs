//! Search module - query construction for the thesis index / 搜索模块
//!
//! - `query`: composable query values rendered to the standard query syntax
//! - `sanitizer` / `tokenizer`: language-aware removal of low-information words
//! - `schema`: document types and their field weighting
//! - `builder`: request validation, per-core query assembly, result flattening

pub mod builder;
pub mod query;
pub mod sanitizer;
pub mod schema;
pub mod tokenizer;

pub use builder::{
    build_document_query, build_search_query, collect_hits, flatten_document, resolve_cores,
    resolve_return_fields, DIAGNOSTIC_CORE,
};
pub use query::{escape, FieldWeights, Query, QueryNode, QueryOptions};
pub use sanitizer::{sanitize, Language, PosTagger, TaggedToken};
pub use schema::{Document, DocumentModel, FieldValue};
