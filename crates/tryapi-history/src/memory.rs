//! In-memory history store

use crate::*;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// In-memory history store.
///
/// Nothing is persisted; used in tests and when history is disabled.
#[derive(Clone, Default)]
pub struct InMemoryHistoryStore {
    entries: Arc<RwLock<BTreeMap<String, HistoryEntry>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SchemaHistoryStore for InMemoryHistoryStore {
    async fn record(&self, entry: HistoryEntry) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(entry.key(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<HistoryEntry>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    async fn list(&self) -> Result<Vec<HistoryEntry>> {
        let mut list: Vec<_> = {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            entries.values().cloned().collect()
        };
        sort_by_recency(&mut list);
        Ok(list)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}
