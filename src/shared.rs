//! Thread-safe handle to an [`NgramIndex`]
//!
//! Searches take a shared read lock and may run concurrently. Every `add`
//! holds the write lock for the whole update of a document's postings, so
//! readers never observe a half-indexed document.

use crate::error::Result;
use crate::index::{count_batch, DocId, IndexConfig, IndexStats, NgramIndex, SearchHit};
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::Arc;
use tracing::debug;

/// Cloneable, shareable index handle
#[derive(Debug, Clone, Default)]
pub struct SharedIndex {
    inner: Arc<RwLock<NgramIndex>>,
}

impl SharedIndex {
    /// Create an empty shared trigram index
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty shared index with a custom configuration
    pub fn with_config(config: IndexConfig) -> Result<Self> {
        Ok(Self::from(NgramIndex::with_config(config)?))
    }

    pub fn add(&self, doc_id: DocId, text: impl Into<String>) {
        self.inner.write().add(doc_id, text);
    }

    /// Index many documents at once
    ///
    /// Grams are counted on the rayon pool before the write lock is taken;
    /// the lock is held only while the counts are merged.
    pub fn add_batch(&self, docs: &[(DocId, String)]) {
        let gram_size = self.inner.read().gram_size();
        let counts = count_batch(docs, gram_size);

        let mut index = self.inner.write();
        index.merge_counted(docs, counts);
        debug!(documents = docs.len(), total = index.len(), "batch committed");
    }

    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        self.inner.read().search(query)
    }

    /// Stored text for a document
    pub fn document(&self, doc_id: DocId) -> Option<String> {
        self.inner.read().document(doc_id).map(str::to_string)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        self.inner.read().stats()
    }

    /// Borrow the index for several reads against one stable snapshot
    pub fn read(&self) -> RwLockReadGuard<'_, NgramIndex> {
        self.inner.read()
    }
}

impl From<NgramIndex> for SharedIndex {
    fn from(index: NgramIndex) -> Self {
        Self {
            inner: Arc::new(RwLock::new(index)),
        }
    }
}
