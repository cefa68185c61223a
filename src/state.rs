use std::sync::Arc;

use thesis_search::solr::IndexConnection;

/// Shared application state / 共享应用状态
pub struct AppState {
    pub connection: Arc<IndexConnection>,
}

impl AppState {
    pub fn new(connection: Arc<IndexConnection>) -> Self {
        Self { connection }
    }
}
