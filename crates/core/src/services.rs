//! Service traits — the abstraction over the three upstream services.
//!
//! The QA pipeline calls `embed()`, `query()`/`fetch()`, and `generate()`
//! without knowing which backend is being used — pure polymorphism.
//! Implementations live in `lectern-providers`; tests substitute mocks.
//!
//! All three return `UpstreamError` so the retry layer can inspect the
//! status code uniformly.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::document::RetrievedDocument;
use crate::error::UpstreamError;

/// Computes embedding vectors for question text.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Compute a single embedding vector for `text`.
    ///
    /// An empty vector means the service produced nothing usable; the
    /// retriever turns that into `Error::EmbeddingFailure`.
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, UpstreamError>;
}

/// Nearest-neighbor search and record fetch over a namespaced vector index.
///
/// Retrieval is a two-step search: a similarity query returns opaque ids in
/// descending similarity rank, then a fetch resolves those ids to full
/// records. Both steps are scoped to one namespace and both are retryable.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Run a similarity query within `namespace`, returning up to `top_k`
    /// match ids ordered by descending similarity.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: &str,
    ) -> std::result::Result<Vec<String>, UpstreamError>;

    /// Fetch full records for `ids` within `namespace`, keyed by id.
    ///
    /// The map carries no ordering; callers re-order by query rank.
    async fn fetch(
        &self,
        ids: &[String],
        namespace: &str,
    ) -> std::result::Result<HashMap<String, RetrievedDocument>, UpstreamError>;
}

/// Single-shot text generation from an assembled prompt.
///
/// No streaming contract — the pipeline treats generation as one call whose
/// failure statuses drive the retry whitelist.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, UpstreamError>;
}
