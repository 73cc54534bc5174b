//! Course catalog — the external course → namespace mapping.
//!
//! The catalog is an injected collaborator, not a pipeline responsibility:
//! it is loaded once from a JSON file and consulted as a read-only lookup
//! table. Namespace order within a course is the catalog's order and is
//! preserved all the way through retrieval.

use serde::{Deserialize, Serialize};

use crate::document::Namespace;
use crate::error::{Error, Result};

/// One course and its document namespaces, in catalog order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseEntry {
    /// The course label users select (e.g. `"INFO 2950"`).
    pub label: String,
    /// The namespaces of this course's materials, ordered.
    pub namespaces: Vec<Namespace>,
}

/// Ordered mapping from course label to document namespaces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseCatalog {
    courses: Vec<CourseEntry>,
}

impl CourseCatalog {
    pub fn new(courses: Vec<CourseEntry>) -> Self {
        Self { courses }
    }

    /// Parse a catalog from its JSON representation: an array of
    /// `{label, namespaces}` entries.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a catalog from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read catalog {}: {e}", path.display()),
        })?;
        Self::from_json_str(&contents)
    }

    /// The namespaces for `course`, in catalog order. `None` for unknown
    /// courses.
    pub fn namespaces_for(&self, course: &str) -> Option<&[Namespace]> {
        self.courses
            .iter()
            .find(|entry| entry.label == course)
            .map(|entry| entry.namespaces.as_slice())
    }

    /// All course labels, in catalog order.
    pub fn courses(&self) -> impl Iterator<Item = &str> {
        self.courses.iter().map(|entry| entry.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}
