//! Schema history for tryapi
//!
//! Remembers which API documents were opened, from where, and when. Entries
//! are keyed by `"<title> <version>"`, so re-opening the same document
//! replaces its entry instead of adding another one.

mod error;
mod file;
mod memory;
mod store;

pub use error::{HistoryError, Result};
pub use file::FileHistoryStore;
pub use memory::InMemoryHistoryStore;
pub use store::SchemaHistoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a document was loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    File,
    Url,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSource {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    /// File name or URL
    pub name: String,
}

impl SchemaSource {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::File,
            name: name.into(),
        }
    }

    pub fn url(name: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Url,
            name: name.into(),
        }
    }
}

/// One opened document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub title: String,
    pub version: String,
    pub source: SchemaSource,
    pub last_opened: DateTime<Utc>,
    /// Raw document text
    pub schema: String,
}

impl HistoryEntry {
    /// Create an entry opened now
    pub fn new(
        title: impl Into<String>,
        version: impl Into<String>,
        source: SchemaSource,
        schema: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            source,
            last_opened: Utc::now(),
            schema: schema.into(),
        }
    }

    pub fn with_last_opened(mut self, last_opened: DateTime<Utc>) -> Self {
        self.last_opened = last_opened;
        self
    }

    /// Identity of the entry within a store
    pub fn key(&self) -> String {
        history_key(&self.title, &self.version)
    }
}

/// Build the store key for a document title and version
pub fn history_key(title: &str, version: &str) -> String {
    format!("{} {}", title, version)
}

/// Most recently opened first
pub(crate) fn sort_by_recency(entries: &mut [HistoryEntry]) {
    entries.sort_by(|a, b| b.last_opened.cmp(&a.last_opened));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_key() {
        let entry = HistoryEntry::new("Petstore", "1.0.0", SchemaSource::file("pets.yaml"), "{}");
        assert_eq!(entry.key(), "Petstore 1.0.0");
    }

    #[test]
    fn test_entry_serialization_shape() {
        let entry = HistoryEntry::new(
            "Petstore",
            "1.0.0",
            SchemaSource::url("https://example.com/openapi.json"),
            "{}",
        );
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["source"]["type"], "url");
        assert_eq!(json["source"]["name"], "https://example.com/openapi.json");
        assert!(json.get("lastOpened").is_some());
    }
}
