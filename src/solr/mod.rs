//! Solr client side / Solr 客户端
//!
//! `transport` speaks HTTP, `connection` owns the per-core document queues.

pub mod connection;
pub mod transport;
pub mod types;

pub use connection::{ConnectionSettings, IndexConnection, QUEUE_THRESHOLD};
pub use transport::{HttpTransport, IndexTransport, DEFAULT_TIMEOUT};
pub use types::{QueryParams, SelectResponse, Submission};
