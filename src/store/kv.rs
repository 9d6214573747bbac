use spin_sdk::key_value::Store;

use super::{document_id, merge_fields, Document, DocumentStore, Fields, Filter};
use crate::config::{document_key, index_key};

/// Document store over the Spin key-value store.
///
/// Every document lives under `<collection>:<id>` and each collection keeps
/// its ids in a JSON list under `<collection>_list`, newest first.
///
/// The Spin key-value API has no compare-and-swap, so the index is updated
/// with a plain read-modify-write. When `insert` and `remove_where` race on
/// the same collection, one of them can overwrite the other's index write.
/// A lost insert leaves its document stored under `<collection>:<id>` and
/// reachable through `get`, but hidden from `query`, `remove_where` and
/// `update_where`. A lost removal leaves a dangling id that `matching` skips
/// because its document is gone.
pub struct KvDocumentStore {
    store: Store,
}

impl KvDocumentStore {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::new(Store::open_default()?))
    }

    fn ids(&self, collection: &str) -> anyhow::Result<Vec<String>> {
        Ok(self.store.get_json(&index_key(collection))?.unwrap_or_default())
    }

    fn matching(&self, collection: &str, filter: &Filter) -> anyhow::Result<Vec<(String, Document)>> {
        let mut found = Vec::new();
        for id in self.ids(collection)? {
            if let Some(doc) = self.store.get_json::<Document>(&document_key(collection, &id))? {
                if filter.matches(&doc) {
                    found.push((id, doc));
                }
            }
        }
        Ok(found)
    }
}

impl DocumentStore for KvDocumentStore {
    fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>> {
        self.store.get_json(&document_key(collection, id))
    }

    fn insert(&self, collection: &str, doc: Document) -> anyhow::Result<()> {
        let id = document_id(&doc)?;
        self.store.set_json(&document_key(collection, &id), &doc)?;

        let mut ids = self.ids(collection)?;
        if !ids.contains(&id) {
            ids.insert(0, id);
            self.store.set_json(&index_key(collection), &ids)?;
        }
        Ok(())
    }

    fn update(&self, collection: &str, id: &str, fields: Fields) -> anyhow::Result<bool> {
        let key = document_key(collection, id);
        match self.store.get_json::<Document>(&key)? {
            Some(mut doc) => {
                merge_fields(&mut doc, &fields);
                self.store.set_json(&key, &doc)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_where(&self, collection: &str, filter: &Filter) -> anyhow::Result<usize> {
        let removed: Vec<String> = self
            .matching(collection, filter)?
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        if removed.is_empty() {
            return Ok(0);
        }

        for id in &removed {
            self.store.delete(&document_key(collection, id))?;
        }

        let mut ids = self.ids(collection)?;
        ids.retain(|id| !removed.contains(id));
        self.store.set_json(&index_key(collection), &ids)?;

        Ok(removed.len())
    }

    fn update_where(&self, collection: &str, filter: &Filter, fields: Fields) -> anyhow::Result<usize> {
        let matched = self.matching(collection, filter)?;
        for (id, mut doc) in matched.iter().cloned() {
            merge_fields(&mut doc, &fields);
            self.store.set_json(&document_key(collection, &id), &doc)?;
        }
        Ok(matched.len())
    }

    fn query(&self, collection: &str, filter: &Filter) -> anyhow::Result<Vec<Document>> {
        Ok(self
            .matching(collection, filter)?
            .into_iter()
            .map(|(_, doc)| doc)
            .collect())
    }
}
