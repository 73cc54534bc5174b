//! # Lectern Core
//!
//! Domain types, traits, and error definitions for the Lectern course
//! question-answering service. This crate has **zero framework dependencies**
//! beyond serde and tokio's sync primitives — it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every upstream service (embedding, vector index, generative model) and
//! every external collaborator (quota store, course catalog) is defined as a
//! trait or value type here. Implementations live in their respective
//! crates. This enables:
//! - Swapping service backends via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod catalog;
pub mod document;
pub mod error;
pub mod quota;
pub mod services;

// Re-export key types at crate root for ergonomics
pub use catalog::CourseCatalog;
pub use document::{Namespace, QaResult, RetrievalResult, RetrievedDocument};
pub use error::{Error, Result, UpstreamError};
pub use quota::{InMemoryQuotaStore, QuotaDecision, QuotaGate};
pub use services::{EmbeddingService, GenerativeModel, VectorIndex};
