//! Document and result value objects.
//!
//! These are the values that flow through the QA pipeline:
//! a question is embedded → namespaces are searched → `RetrievedDocument`s
//! are fetched → a `QaResult` pairs the generated answer with its sources.

use serde::{Deserialize, Serialize};

/// Identifier for one logical document corpus (a lecture, a syllabus, an
/// "All Materials" aggregate) scoped to a single course.
///
/// Namespaces are immutable and enumerated by the course catalog; the
/// pipeline only ever reads them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(pub String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Course-scope predicate: namespaces carry their course label as a
    /// prefix (e.g. `"INFO 2950 Lecture 3"`), so scoping is a substring
    /// match on the filter.
    pub fn matches(&self, filter: &str) -> bool {
        self.0.contains(filter)
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Namespace {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One fetched document chunk. Never mutated after creation; owned
/// exclusively by the retrieval result of one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// The chunk text.
    pub text: String,
    /// Human-readable source name (filename of the course material).
    pub source: String,
    /// Page the chunk was extracted from.
    pub page_number: u32,
    /// Total pages in the source document.
    pub total_pages: u32,
}

/// Ordered sequence of documents from one retrieval call.
///
/// Insertion order is namespace iteration order, then intra-namespace
/// similarity rank. Length never exceeds the configured document budget —
/// the retriever enforces this, the type just preserves order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetrievalResult {
    documents: Vec<RetrievedDocument>,
}

impl RetrievalResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, document: RetrievedDocument) {
        self.documents.push(document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[RetrievedDocument] {
        &self.documents
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RetrievedDocument> {
        self.documents.iter()
    }

    pub fn into_documents(self) -> Vec<RetrievedDocument> {
        self.documents
    }
}

impl FromIterator<RetrievedDocument> for RetrievalResult {
    fn from_iter<I: IntoIterator<Item = RetrievedDocument>>(iter: I) -> Self {
        Self {
            documents: iter.into_iter().collect(),
        }
    }
}

/// The unit returned to the caller: the sanitized answer plus the documents
/// it was grounded on. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaResult {
    /// The generated, sanitized answer text.
    pub answer: String,
    /// The documents the prompt was grounded on, in retrieval order.
    pub source_documents: RetrievalResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> RetrievedDocument {
        RetrievedDocument {
            text: text.into(),
            source: "INFO2950_Lec3.pdf".into(),
            page_number: 4,
            total_pages: 40,
        }
    }

    #[test]
    fn namespace_scope_predicate() {
        let ns = Namespace::new("INFO 2950 Lecture 3");
        assert!(ns.matches("INFO 2950"));
        assert!(!ns.matches("PUBPOL 2350"));
        // An empty filter scopes to everything
        assert!(ns.matches(""));
    }

    #[test]
    fn retrieval_result_preserves_insertion_order() {
        let mut result = RetrievalResult::new();
        result.push(doc("first"));
        result.push(doc("second"));
        result.push(doc("third"));

        let texts: Vec<&str> = result.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn namespace_serializes_transparently() {
        let ns = Namespace::new("INFO 2950 All Materials");
        let json = serde_json::to_string(&ns).unwrap();
        assert_eq!(json, "\"INFO 2950 All Materials\"");

        let back: Namespace = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ns);
    }

    #[test]
    fn qa_result_serialization() {
        let mut sources = RetrievalResult::new();
        sources.push(doc("lecture content"));
        let result = QaResult {
            answer: "The lecture covers sampling.".into(),
            source_documents: sources,
        };

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("lecture content"));
        assert!(json.contains("page_number"));
    }
}
