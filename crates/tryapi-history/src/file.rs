//! JSON file history store

use crate::*;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// History store backed by a single JSON file.
///
/// The file holds an object mapping each key to its entry. It is created on
/// first write; a missing file reads as an empty history.
pub struct FileHistoryStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, HistoryEntry>> {
        if !fs::try_exists(&self.path).await? {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path).await?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    async fn write_all(&self, entries: &BTreeMap<String, HistoryEntry>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(entries)?;
        let mut file = fs::File::create(&self.path).await?;
        file.write_all(json.as_bytes()).await?;
        file.flush().await?;

        debug!(path = %self.path.display(), count = entries.len(), "Wrote schema history");
        Ok(())
    }
}

#[async_trait]
impl SchemaHistoryStore for FileHistoryStore {
    async fn record(&self, entry: HistoryEntry) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(entry.key(), entry);
        self.write_all(&entries).await
    }

    async fn get(&self, key: &str) -> Result<Option<HistoryEntry>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn list(&self) -> Result<Vec<HistoryEntry>> {
        let _guard = self.lock.lock().await;
        let mut list: Vec<_> = self.read_all().await?.into_values().collect();
        sort_by_recency(&mut list);
        Ok(list)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}
