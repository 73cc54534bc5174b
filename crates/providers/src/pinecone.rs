//! Pinecone-style vector index client.
//!
//! Two-step search per namespace: `POST /query` returns the nearest match
//! ids (descending similarity), `POST /vectors/fetch` resolves ids to full
//! records. Document metadata carries the PDF extraction fields:
//! `text`, `source`, `pageNumber`, `totalPages`.

use std::collections::HashMap;

use async_trait::async_trait;
use lectern_core::{RetrievedDocument, UpstreamError, VectorIndex};
use serde::Deserialize;
use tracing::debug;

/// Client for one Pinecone-style index host.
pub struct PineconeIndexClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl PineconeIndexClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, UpstreamError> {
        let response = self
            .client
            .post(url)
            .header("Api-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let message = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Api {
                status_code: status,
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndexClient {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: &str,
    ) -> Result<Vec<String>, UpstreamError> {
        let url = format!("{}/query", self.base_url);
        let body = serde_json::json!({
            "vector": vector,
            "topK": top_k,
            "namespace": namespace,
            "includeMetadata": false,
        });

        debug!(namespace, top_k, "Sending similarity query");

        let response = self.post_json(&url, &body).await?;
        let parsed: QueryApiResponse = response.json().await.map_err(|e| UpstreamError::Api {
            status_code: 200,
            message: format!("Failed to parse query response: {e}"),
        })?;

        Ok(parsed.matches.into_iter().map(|m| m.id).collect())
    }

    async fn fetch(
        &self,
        ids: &[String],
        namespace: &str,
    ) -> Result<HashMap<String, RetrievedDocument>, UpstreamError> {
        let url = format!("{}/vectors/fetch", self.base_url);
        let body = serde_json::json!({
            "ids": ids,
            "namespace": namespace,
        });

        debug!(namespace, count = ids.len(), "Fetching records");

        let response = self.post_json(&url, &body).await?;
        let parsed: FetchApiResponse = response.json().await.map_err(|e| UpstreamError::Api {
            status_code: 200,
            message: format!("Failed to parse fetch response: {e}"),
        })?;

        Ok(parsed
            .vectors
            .into_iter()
            .map(|(id, record)| (id, record.metadata.into_document()))
            .collect())
    }
}

// --- API types (internal) ---

#[derive(Debug, Deserialize)]
struct QueryApiResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FetchApiResponse {
    #[serde(default)]
    vectors: HashMap<String, FetchedRecord>,
}

#[derive(Debug, Deserialize)]
struct FetchedRecord {
    metadata: RecordMetadata,
}

#[derive(Debug, Clone, Deserialize)]
struct RecordMetadata {
    #[serde(default)]
    text: String,
    #[serde(default)]
    source: String,
    #[serde(rename = "pageNumber", default)]
    page_number: u32,
    #[serde(rename = "totalPages", default)]
    total_pages: u32,
}

impl RecordMetadata {
    fn into_document(self) -> RetrievedDocument {
        RetrievedDocument {
            text: self.text,
            source: self.source,
            page_number: self.page_number,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_query_response() {
        let data = r#"{
            "matches": [
                {"id": "chunk-17", "score": 0.91},
                {"id": "chunk-4", "score": 0.88}
            ],
            "namespace": "INFO 2950 Lecture 3"
        }"#;
        let parsed: QueryApiResponse = serde_json::from_str(data).unwrap();
        let ids: Vec<&str> = parsed.matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["chunk-17", "chunk-4"]);
    }

    #[test]
    fn parse_empty_query_response() {
        let parsed: QueryApiResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.matches.is_empty());
    }

    #[test]
    fn parse_fetch_response_metadata() {
        let data = r#"{
            "vectors": {
                "chunk-17": {
                    "id": "chunk-17",
                    "values": [0.1, 0.2],
                    "metadata": {
                        "text": "Sampling distributions describe...",
                        "source": "INFO2950_Lec3_20230828.pdf",
                        "pageNumber": 12,
                        "totalPages": 44
                    }
                }
            },
            "namespace": "INFO 2950 Lecture 3"
        }"#;
        let parsed: FetchApiResponse = serde_json::from_str(data).unwrap();
        let document = parsed.vectors["chunk-17"].metadata.clone().into_document();
        assert_eq!(document.source, "INFO2950_Lec3_20230828.pdf");
        assert_eq!(document.page_number, 12);
        assert_eq!(document.total_pages, 44);
    }

    #[test]
    fn missing_metadata_fields_default() {
        let data = r#"{"vectors": {"x": {"metadata": {"text": "t"}}}}"#;
        let parsed: FetchApiResponse = serde_json::from_str(data).unwrap();
        let document = parsed.vectors["x"].metadata.clone().into_document();
        assert_eq!(document.text, "t");
        assert_eq!(document.source, "");
        assert_eq!(document.page_number, 0);
    }
}
