use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{error::AppResult, models::ContentId};

pub mod pinecone;

pub use pinecone::PineconeIndex;

/// Metadata key the index stores each item's domain under
pub const TYPE_FILTER_KEY: &str = "type";

/// A nearest-neighbor hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: ContentId,
    pub score: f64,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// External nearest-neighbor index over content embeddings
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Items closest to the stored vector of `id`, best first
    ///
    /// Every `filter` entry must match the hit's metadata exactly. An id the
    /// index does not know yields an empty list, not an error.
    async fn query_by_item_id(
        &self,
        id: &ContentId,
        top_k: usize,
        filter: &HashMap<String, String>,
    ) -> AppResult<Vec<VectorMatch>>;
}
