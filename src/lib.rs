//! Thesis search backend library / 论文搜索后端库
//!
//! Query construction for a multi-core Solr index and batched document indexing.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod search;
pub mod solr;

pub use error::{ApiError, Error, ErrorType, Result};
pub use solr::{HttpTransport, IndexConnection, IndexTransport};
