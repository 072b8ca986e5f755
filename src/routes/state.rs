use std::sync::Arc;

use crate::services::Recommender;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    /// Per-domain result count when the caller passes no `top_k`
    pub default_top_k: usize,
}

impl AppState {
    pub fn new(recommender: Recommender, default_top_k: usize) -> Self {
        Self {
            recommender: Arc::new(recommender),
            default_top_k,
        }
    }
}
