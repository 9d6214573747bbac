//! Document store abstraction.
//!
//! Documents are JSON objects carrying a string `id` field, grouped into
//! named collections. Filters are conjunctions of field equalities, which is
//! all the post, comment and like bookkeeping needs.

pub mod kv;
pub mod memory;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

pub use kv::KvDocumentStore;
pub use memory::MemoryDocumentStore;

pub type Document = Value;
pub type Fields = Map<String, Value>;

pub trait DocumentStore {
    fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>>;

    /// Stores `doc` under its `id`, replacing any existing document.
    fn insert(&self, collection: &str, doc: Document) -> anyhow::Result<()>;

    /// Merges `fields` into the document. Returns `false` when it does not exist.
    fn update(&self, collection: &str, id: &str, fields: Fields) -> anyhow::Result<bool>;

    fn remove_where(&self, collection: &str, filter: &Filter) -> anyhow::Result<usize>;

    fn update_where(&self, collection: &str, filter: &Filter, fields: Fields)
        -> anyhow::Result<usize>;

    fn query(&self, collection: &str, filter: &Filter) -> anyhow::Result<Vec<Document>>;
}

/// Typed access on top of [`DocumentStore`].
pub trait DocumentStoreExt: DocumentStore {
    fn get_as<T: DeserializeOwned>(&self, collection: &str, id: &str) -> anyhow::Result<Option<T>> {
        match self.get(collection, id)? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    fn query_as<T: DeserializeOwned>(&self, collection: &str, filter: &Filter) -> anyhow::Result<Vec<T>> {
        self.query(collection, filter)?
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(anyhow::Error::from))
            .collect()
    }

    fn insert_as<T: Serialize>(&self, collection: &str, value: &T) -> anyhow::Result<()> {
        self.insert(collection, serde_json::to_value(value)?)
    }
}

impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Matches every document in a collection.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push((field.to_string(), value.into()));
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }
}

/// Builds an update field set from a `json!` object literal.
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

pub(crate) fn document_id(doc: &Document) -> anyhow::Result<String> {
    doc.get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("document is missing a string id"))
}

pub(crate) fn merge_fields(doc: &mut Document, fields: &Fields) {
    if let Value::Object(map) = doc {
        for (key, value) in fields {
            map.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_requires_every_condition() {
        let doc = json!({"id": "1", "post_id": "p", "user_id": "u"});

        assert!(Filter::all().matches(&doc));
        assert!(Filter::all().eq("post_id", "p").matches(&doc));
        assert!(Filter::all().eq("post_id", "p").eq("user_id", "u").matches(&doc));
        assert!(!Filter::all().eq("post_id", "p").eq("user_id", "other").matches(&doc));
        assert!(!Filter::all().eq("missing", "p").matches(&doc));
    }

    #[test]
    fn merge_overwrites_and_adds() {
        let mut doc = json!({"id": "1", "content": "hello", "like_count": 2});
        merge_fields(&mut doc, &fields(json!({"content": "", "is_deleted": true})));

        assert_eq!(doc["content"], "");
        assert_eq!(doc["is_deleted"], true);
        assert_eq!(doc["like_count"], 2);
    }

    #[test]
    fn document_id_rejects_blank_ids() {
        assert_eq!(document_id(&json!({"id": "abc"})).unwrap(), "abc");
        assert!(document_id(&json!({"id": ""})).is_err());
        assert!(document_id(&json!({"id": 7})).is_err());
    }
}
