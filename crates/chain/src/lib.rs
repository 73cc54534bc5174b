//! # Lectern Chain
//!
//! The QA orchestration core: the component that turns a raw user question
//! into a budgeted, multi-namespace document retrieval, survives transient
//! upstream failures, respects a process-wide request-rate ceiling, and
//! produces a reproducible, citation-bearing answer.
//!
//! # Flow
//!
//! 1. Embed the question
//! 2. Search the course's namespaces under a global document budget
//! 3. Assemble a grounded prompt under a character budget
//! 4. Generate through the retry executor
//! 5. Sanitize and return the answer with structured source citations
//!
//! Every upstream call passes through [`RateLimiter`] admission and
//! [`RetryExecutor`] backoff.

pub mod history;
pub mod prompt;
pub mod qa;
pub mod rate_limit;
pub mod retriever;
pub mod retry;

pub use history::ChatHistoryBuffer;
pub use prompt::{PromptAssembler, PromptInput};
pub use qa::{QaOrchestrator, sanitize_answer};
pub use rate_limit::RateLimiter;
pub use retriever::{NamespaceBudgetedRetriever, RetrieverConfig};
pub use retry::{RetryExecutor, RetryPolicy, is_transient};
