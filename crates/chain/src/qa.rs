//! The QA orchestration cycle: retrieve → assemble → generate → sanitize.
//!
//! One orchestrator serves one session. Each `call` is independent and
//! repeatable; the only state shared across calls is the process-wide rate
//! window (inside the retry executor) and this instance's history buffer.

use std::sync::Arc;

use lectern_core::{Error, GenerativeModel, Namespace, QaResult};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::history::ChatHistoryBuffer;
use crate::prompt::{PromptAssembler, PromptInput};
use crate::retriever::NamespaceBudgetedRetriever;
use crate::retry::RetryExecutor;

/// Composes retrieval, prompt assembly, and generation into one
/// request/response cycle.
pub struct QaOrchestrator {
    retriever: NamespaceBudgetedRetriever,
    assembler: PromptAssembler,
    model: Arc<dyn GenerativeModel>,
    retry: RetryExecutor,
    /// The catalog namespaces this orchestrator may search, in catalog order.
    namespaces: Vec<Namespace>,
    /// Session-scoped conversation log. Not shared across sessions.
    history: Mutex<ChatHistoryBuffer>,
}

impl QaOrchestrator {
    pub fn new(
        retriever: NamespaceBudgetedRetriever,
        assembler: PromptAssembler,
        model: Arc<dyn GenerativeModel>,
        retry: RetryExecutor,
        namespaces: Vec<Namespace>,
        history_max_size: usize,
    ) -> Self {
        Self {
            retriever,
            assembler,
            model,
            retry,
            namespaces,
            history: Mutex::new(ChatHistoryBuffer::new(history_max_size)),
        }
    }

    /// Run one full QA cycle.
    ///
    /// Either a complete [`QaResult`] is returned or a failure propagates —
    /// no partial results.
    pub async fn call(
        &self,
        question: &str,
        history: &str,
        namespace_filter: &str,
    ) -> Result<QaResult, Error> {
        let request_id = uuid::Uuid::new_v4();
        info!(%request_id, filter = namespace_filter, "qa call started");

        let documents = self
            .retriever
            .retrieve(question, &self.namespaces, namespace_filter)
            .await?;

        // Observational log of the incoming history; the prompt consumes
        // the caller's history text directly.
        self.history.lock().await.add_message(history);

        let prompt = self.assembler.assemble(&PromptInput {
            question,
            course_label: namespace_filter,
            catalog_namespaces: &self.namespaces,
            documents: &documents,
            history,
        });
        debug!(%request_id, prompt_chars = prompt.len(), "prompt assembled");

        let raw = self.retry.execute(|| self.model.generate(&prompt)).await?;
        if raw.trim().is_empty() {
            return Err(Error::GenerationFailure);
        }

        let answer = sanitize_answer(&raw);

        self.history
            .lock()
            .await
            .add_message(format!("Question: {question}"));

        info!(
            %request_id,
            answer_len = answer.len(),
            sources = documents.len(),
            "qa call complete"
        );
        Ok(QaResult {
            answer,
            source_documents: documents,
        })
    }

    /// The buffered conversation log, oldest first.
    pub async fn history(&self) -> String {
        self.history.lock().await.history()
    }

    /// Empty the session's conversation log.
    pub async fn clear_history(&self) {
        self.history.lock().await.clear();
    }
}

/// Strip exactly one trailing `" +"` continuation marker, if present.
///
/// The marker mid-string, or a bare trailing `"+"`, is left untouched.
pub fn sanitize_answer(raw: &str) -> String {
    raw.strip_suffix(" +").unwrap_or(raw).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_marker_removed_exactly_once() {
        assert_eq!(sanitize_answer("The answer is 42. +"), "The answer is 42.");
        assert_eq!(sanitize_answer("doubled + +"), "doubled +");
    }

    #[test]
    fn input_without_marker_is_unchanged() {
        assert_eq!(sanitize_answer("The answer is 42."), "The answer is 42.");
        assert_eq!(sanitize_answer(""), "");
        assert_eq!(sanitize_answer("ends with plus+"), "ends with plus+");
    }

    #[test]
    fn mid_string_marker_is_unchanged() {
        assert_eq!(sanitize_answer("a + b equals c"), "a + b equals c");
    }
}
