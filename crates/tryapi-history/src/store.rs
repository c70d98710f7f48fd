//! History store trait definition

use crate::{HistoryEntry, Result};
use async_trait::async_trait;

/// Storage for recently opened documents.
#[async_trait]
pub trait SchemaHistoryStore: Send + Sync {
    /// Insert an entry, replacing any entry with the same key.
    async fn record(&self, entry: HistoryEntry) -> Result<()>;

    /// Load one entry by key.
    async fn get(&self, key: &str) -> Result<Option<HistoryEntry>>;

    /// All entries, most recently opened first.
    async fn list(&self) -> Result<Vec<HistoryEntry>>;

    /// Remove an entry. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Load an entry and mark it as opened now.
    async fn reopen(&self, key: &str) -> Result<HistoryEntry> {
        let entry = self
            .get(key)
            .await?
            .ok_or_else(|| crate::HistoryError::NotFound(key.to_string()))?
            .with_last_opened(chrono::Utc::now());
        self.record(entry.clone()).await?;
        Ok(entry)
    }
}
