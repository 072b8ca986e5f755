use std::{future::Future, time::Duration};

use crate::error::{AppError, AppResult};

pub mod franchise;
pub mod library;
pub mod recommendations;
pub mod seen;
pub mod sequels;
pub mod similar_items;
pub mod similarity;
pub mod vector;

pub use recommendations::{Recommender, RecommenderSettings};
pub use seen::SeenIds;
pub use similar_items::VectorSimilarity;
pub use vector::{PineconeIndex, VectorIndex, VectorMatch};

/// Runs an external call under a deadline, turning expiry into [`AppError::Timeout`]
pub(crate) async fn with_timeout<T, F>(limit: Duration, operation: &str, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(format!(
            "{} exceeded {}ms",
            operation,
            limit.as_millis()
        ))),
    }
}
