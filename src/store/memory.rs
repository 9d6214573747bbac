use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::{document_id, merge_fields, Document, DocumentStore, Fields, Filter};

/// In-process document store for the native dev server and tests.
///
/// Collections keep insertion order. Writes to a collection can be made to
/// fail with [`MemoryDocumentStore::fail_writes`] to exercise partial-failure
/// paths.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent write to `collection` returns an error.
    pub fn fail_writes(&self, collection: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(collection.to_string());
        }
    }

    /// Number of documents in `collection`, regardless of their content.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .map(|c| c.get(collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, HashMap<String, Vec<Document>>>> {
        self.collections
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))
    }

    fn check_writable(&self, collection: &str) -> anyhow::Result<()> {
        let failing = self
            .failing
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        if failing.contains(collection) {
            anyhow::bail!("write to {} rejected", collection);
        }
        Ok(())
    }
}

fn has_id(doc: &Document, id: &str) -> bool {
    doc.get("id").and_then(|v| v.as_str()) == Some(id)
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>> {
        let collections = self.lock()?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| has_id(doc, id)))
            .cloned())
    }

    fn insert(&self, collection: &str, doc: Document) -> anyhow::Result<()> {
        self.check_writable(collection)?;
        let id = document_id(&doc)?;
        let mut collections = self.lock()?;
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|existing| has_id(existing, &id)) {
            Some(existing) => *existing = doc,
            None => docs.push(doc),
        }
        Ok(())
    }

    fn update(&self, collection: &str, id: &str, fields: Fields) -> anyhow::Result<bool> {
        self.check_writable(collection)?;
        let mut collections = self.lock()?;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| has_id(doc, id)));
        match doc {
            Some(doc) => {
                merge_fields(doc, &fields);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_where(&self, collection: &str, filter: &Filter) -> anyhow::Result<usize> {
        self.check_writable(collection)?;
        let mut collections = self.lock()?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|doc| !filter.matches(doc));
        Ok(before - docs.len())
    }

    fn update_where(&self, collection: &str, filter: &Filter, fields: Fields) -> anyhow::Result<usize> {
        self.check_writable(collection)?;
        let mut collections = self.lock()?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let mut updated = 0;
        for doc in docs.iter_mut().filter(|doc| filter.matches(doc)) {
            merge_fields(doc, &fields);
            updated += 1;
        }
        Ok(updated)
    }

    fn query(&self, collection: &str, filter: &Filter) -> anyhow::Result<Vec<Document>> {
        let collections = self.lock()?;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fields;
    use serde_json::json;

    fn seeded() -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        store.insert("likes", json!({"id": "a", "post_id": "p1", "user_id": "u1"})).unwrap();
        store.insert("likes", json!({"id": "b", "post_id": "p1", "user_id": "u2"})).unwrap();
        store.insert("likes", json!({"id": "c", "post_id": "p2", "user_id": "u1"})).unwrap();
        store
    }

    #[test]
    fn insert_replaces_document_with_same_id() {
        let store = seeded();
        store.insert("likes", json!({"id": "a", "post_id": "p9", "user_id": "u1"})).unwrap();

        assert_eq!(store.len("likes"), 3);
        assert_eq!(store.get("likes", "a").unwrap().unwrap()["post_id"], "p9");
    }

    #[test]
    fn remove_where_counts_removed_documents() {
        let store = seeded();

        let removed = store.remove_where("likes", &Filter::all().eq("post_id", "p1")).unwrap();

        assert_eq!(removed, 2);
        assert_eq!(store.len("likes"), 1);
        assert!(store.get("likes", "c").unwrap().is_some());
        assert_eq!(store.remove_where("missing", &Filter::all()).unwrap(), 0);
    }

    #[test]
    fn update_where_merges_into_every_match() {
        let store = seeded();

        let updated = store
            .update_where("likes", &Filter::all().eq("user_id", "u1"), fields(json!({"seen": true})))
            .unwrap();

        assert_eq!(updated, 2);
        assert_eq!(store.query("likes", &Filter::all().eq("seen", true)).unwrap().len(), 2);
    }

    #[test]
    fn update_reports_missing_document() {
        let store = seeded();
        assert!(!store.update("likes", "zzz", fields(json!({"x": 1}))).unwrap());
        assert!(store.update("likes", "a", fields(json!({"x": 1}))).unwrap());
    }

    #[test]
    fn failing_collection_rejects_writes_but_allows_reads() {
        let store = seeded();
        store.fail_writes("likes");

        assert!(store.remove_where("likes", &Filter::all()).is_err());
        assert!(store.insert("likes", json!({"id": "d"})).is_err());
        assert_eq!(store.query("likes", &Filter::all()).unwrap().len(), 3);
    }
}
