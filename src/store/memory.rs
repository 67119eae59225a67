//! In-process document store.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{Document, DocumentStore, Filter, StoreError, stamp};

/// Collections held in memory, each in insertion order.
///
/// Backs tests and embeddings that have no database; contents are lost when
/// the process exits.
pub struct MemoryStore {
    name: String,
    collections: Mutex<BTreeMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), collections: Mutex::new(BTreeMap::new()) }
    }

    /// Stores `doc` as-is, without generated fields. Used to seed gigs, which
    /// this API never creates itself.
    pub fn insert_raw(&self, kind: &str, doc: Document) -> Result<(), StoreError> {
        self.lock()?.entry(kind.to_owned()).or_default().push(doc);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Vec<Document>>>, StoreError> {
        self.collections
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_owned()))
    }
}

impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_document(&self, kind: &str, payload: Document) -> Result<String, StoreError> {
        let (id, doc) = stamp(payload);
        self.insert_raw(kind, doc)?;
        Ok(id)
    }

    fn get_documents(&self, kind: &str, filter: &Filter, limit: usize) -> Result<Vec<Document>, StoreError> {
        let collections = self.lock()?;
        let docs = collections.get(kind).map(Vec::as_slice).unwrap_or_default();
        Ok(docs.iter().filter(|d| filter.matches(d)).take(limit).cloned().collect())
    }

    fn list_collection_names(&self) -> Result<Option<Vec<String>>, StoreError> {
        Ok(Some(self.lock()?.keys().cloned().collect()))
    }
}
