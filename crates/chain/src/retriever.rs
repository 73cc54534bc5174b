//! Budgeted multi-namespace document retrieval.
//!
//! A question is embedded once, then each namespace in scope is searched in
//! catalog order: similarity query for match ids, then a fetch of the full
//! records for as many ids as the remaining budget allows. Iteration stops
//! the moment the budget is exhausted — a namespace past that point is never
//! queried.
//!
//! Namespace iteration is sequential by design: the result ordering
//! (namespace order, then similarity rank) and the budget accounting are
//! deterministic for identical upstream responses.

use std::sync::Arc;

use lectern_core::{EmbeddingService, Error, Namespace, RetrievalResult, VectorIndex};
use tracing::{debug, info, warn};

use crate::retry::RetryExecutor;

/// Tuning for one retriever instance.
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Maximum documents fetched across all namespaces in one call.
    pub document_budget: usize,
    /// Nearest matches requested per namespace.
    pub per_namespace_top_k: usize,
    /// Maximum namespaces searched per call.
    pub max_namespaces: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            document_budget: 30,
            per_namespace_top_k: 10,
            max_namespaces: 5,
        }
    }
}

/// Searches a course's namespaces under a global document-count budget.
pub struct NamespaceBudgetedRetriever {
    embeddings: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorIndex>,
    retry: RetryExecutor,
    config: RetrieverConfig,
}

impl NamespaceBudgetedRetriever {
    pub fn new(
        embeddings: Arc<dyn EmbeddingService>,
        index: Arc<dyn VectorIndex>,
        retry: RetryExecutor,
        config: RetrieverConfig,
    ) -> Self {
        Self {
            embeddings,
            index,
            retry,
            config,
        }
    }

    /// Retrieve up to `document_budget` documents relevant to `question`,
    /// drawn from the namespaces in `namespaces` that match `filter`,
    /// preserving catalog order.
    ///
    /// Every upstream call (embedding, query, fetch) goes through the retry
    /// executor. The result is a fresh value each call.
    pub async fn retrieve(
        &self,
        question: &str,
        namespaces: &[Namespace],
        filter: &str,
    ) -> Result<RetrievalResult, Error> {
        let vector = self
            .retry
            .execute(|| self.embeddings.embed(question))
            .await?;
        if vector.is_empty() {
            return Err(Error::EmbeddingFailure);
        }

        let selected: Vec<&Namespace> = namespaces
            .iter()
            .filter(|ns| ns.matches(filter))
            .take(self.config.max_namespaces)
            .collect();
        debug!(
            selected = selected.len(),
            filter, "namespaces selected for search"
        );

        let mut result = RetrievalResult::new();
        let mut remaining = self.config.document_budget;

        for namespace in selected {
            if remaining == 0 {
                break;
            }

            let ids = self
                .retry
                .execute(|| {
                    self.index
                        .query(&vector, self.config.per_namespace_top_k, namespace.as_str())
                })
                .await?;
            if ids.is_empty() {
                debug!(namespace = %namespace, "no matches in namespace");
                continue;
            }

            let to_fetch = &ids[..ids.len().min(remaining)];
            let mut records = self
                .retry
                .execute(|| self.index.fetch(to_fetch, namespace.as_str()))
                .await?;

            // The fetch response is keyed by id; reassemble in query rank
            // order so intra-namespace ordering stays deterministic.
            let mut fetched = 0usize;
            for id in to_fetch {
                if let Some(document) = records.remove(id) {
                    result.push(document);
                    fetched += 1;
                } else {
                    warn!(namespace = %namespace, id = %id, "fetch response missing record");
                }
            }
            remaining -= fetched;

            debug!(
                namespace = %namespace,
                fetched,
                remaining,
                "namespace search complete"
            );
        }

        info!(documents = result.len(), "retrieval complete");
        Ok(result)
    }
}
