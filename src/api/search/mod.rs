mod query;
mod types;

pub use query::{get_document, search};
