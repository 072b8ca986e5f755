use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use super::{VectorIndex, VectorMatch};
use crate::{
    error::{AppError, AppResult},
    models::ContentId,
};

const API_VERSION: &str = "2024-07";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    id: &'a str,
    top_k: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    metadata: Option<HashMap<String, Value>>,
}

impl From<QueryMatch> for VectorMatch {
    fn from(m: QueryMatch) -> Self {
        Self {
            id: ContentId(m.id),
            score: m.score,
            metadata: m.metadata.unwrap_or_default(),
        }
    }
}

/// Pinecone data-plane client
///
/// Queries by stored vector id so the service never handles embeddings itself.
#[derive(Debug, Clone)]
pub struct PineconeIndex {
    http_client: Client,
    api_key: String,
    index_host: String,
}

impl PineconeIndex {
    pub fn new(api_key: String, index_host: String) -> Self {
        let index_host = if index_host.starts_with("http://") || index_host.starts_with("https://")
        {
            index_host
        } else {
            format!("https://{}", index_host)
        };

        Self {
            http_client: Client::new(),
            api_key,
            index_host: index_host.trim_end_matches('/').to_string(),
        }
    }

    /// Converts a flat key/value filter into Pinecone's `$eq` filter syntax
    fn build_filter(filter: &HashMap<String, String>) -> Option<Value> {
        if filter.is_empty() {
            return None;
        }

        let clauses: Map<String, Value> = filter
            .iter()
            .map(|(key, value)| (key.clone(), json!({ "$eq": value })))
            .collect();

        Some(Value::Object(clauses))
    }
}

#[async_trait::async_trait]
impl VectorIndex for PineconeIndex {
    async fn query_by_item_id(
        &self,
        id: &ContentId,
        top_k: usize,
        filter: &HashMap<String, String>,
    ) -> AppResult<Vec<VectorMatch>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let request = QueryRequest {
            id: id.as_str(),
            top_k,
            filter: Self::build_filter(filter),
            include_metadata: true,
            include_values: false,
        };

        let response = self
            .http_client
            .post(format!("{}/query", self.index_host))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(item_id = %id, "Item not present in vector index");
            return Ok(Vec::new());
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                item_id = %id,
                status = %status,
                error = %error_text,
                "Pinecone query failed"
            );
            return Err(AppError::ExternalApi(format!(
                "Pinecone query returned {}",
                status
            )));
        }

        let body: QueryResponse = response.json().await?;

        tracing::debug!(item_id = %id, matches = body.matches.len(), "Pinecone query complete");

        Ok(body.matches.into_iter().map(VectorMatch::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_host() {
        let index = PineconeIndex::new(
            "key".to_string(),
            "content-abc.svc.pinecone.io/".to_string(),
        );
        assert_eq!(index.index_host, "https://content-abc.svc.pinecone.io");

        let index = PineconeIndex::new("key".to_string(), "http://localhost:5080".to_string());
        assert_eq!(index.index_host, "http://localhost:5080");
    }

    #[test]
    fn test_build_filter_uses_eq_clauses() {
        let filter = HashMap::from([("type".to_string(), "tvseries".to_string())]);
        assert_eq!(
            PineconeIndex::build_filter(&filter),
            Some(json!({ "type": { "$eq": "tvseries" } }))
        );
        assert_eq!(PineconeIndex::build_filter(&HashMap::new()), None);
    }

    #[test]
    fn test_query_request_wire_format() {
        let request = QueryRequest {
            id: "m1",
            top_k: 6,
            filter: None,
            include_metadata: true,
            include_values: false,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "id": "m1", "topK": 6, "includeMetadata": true, "includeValues": false })
        );
    }

    #[test]
    fn test_query_response_tolerates_missing_metadata() {
        let body: QueryResponse = serde_json::from_value(json!({
            "matches": [
                { "id": "a1", "score": 0.91, "metadata": { "type": "anime" } },
                { "id": "a2", "score": 0.87 }
            ],
            "namespace": ""
        }))
        .unwrap();

        let matches: Vec<VectorMatch> = body.matches.into_iter().map(VectorMatch::from).collect();
        assert_eq!(matches[0].id, ContentId::from("a1"));
        assert_eq!(matches[0].metadata["type"], json!("anime"));
        assert!(matches[1].metadata.is_empty());
    }

    #[tokio::test]
    async fn test_zero_top_k_skips_request() {
        let index = PineconeIndex::new("key".to_string(), "http://127.0.0.1:1".to_string());
        let matches = index
            .query_by_item_id(&ContentId::from("m1"), 0, &HashMap::new())
            .await
            .unwrap();
        assert!(matches.is_empty());
    }
}
