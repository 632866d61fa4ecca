//! In-process document store backend.
//!
//! Collections are plain vectors guarded by a single mutex, so every store
//! operation — including `find_one_and_update` — is atomic with respect to
//! concurrent requests. Insertion order is preserved, which is what gives
//! default listings their stable ordering.
//!
//! Unique indexes are declared per collection at construction time. An index
//! is sparse: documents that do not carry the indexed field (for example,
//! non-doctor users and `professional_id`) are not indexed at all.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use uuid::Uuid;

use super::{Document, DocumentStore, Filter, StoreError, StoreResult, Update};

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    unique_indexes: HashMap<String, Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a unique index on `field` within `collection`. Must be called
    /// before the store is shared.
    pub fn with_unique_index(mut self, collection: &str, field: &str) -> Self {
        self.unique_indexes
            .entry(collection.to_string())
            .or_default()
            .push(field.to_string());
        self
    }

    /// Check `candidate` against the unique indexes of `collection`, ignoring
    /// the document at `skip` (the one being updated, if any).
    fn check_unique(
        &self,
        collection: &str,
        docs: &[Document],
        candidate: &Document,
        skip: Option<usize>,
    ) -> StoreResult<()> {
        let Some(fields) = self.unique_indexes.get(collection) else {
            return Ok(());
        };

        for field in fields {
            let Some(value) = candidate.get(field) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let collision = docs
                .iter()
                .enumerate()
                .filter(|(position, _)| Some(*position) != skip)
                .any(|(_, existing)| existing.get(field) == Some(value));
            if collision {
                return Err(StoreError::DuplicateKey {
                    field: field.clone(),
                });
            }
        }
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn insert(&self, collection: &str, mut doc: Document) -> StoreResult<Uuid> {
        let mut collections = self
            .collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let docs = collections.entry(collection.to_string()).or_default();

        let id = match doc
            .get("_id")
            .and_then(Value::as_str)
            .and_then(|raw| Uuid::parse_str(raw).ok())
        {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                doc.insert("_id".into(), Value::String(id.to_string()));
                id
            }
        };

        self.check_unique(collection, docs, &doc, None)?;
        docs.push(doc);
        Ok(id)
    }

    fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let collections = self
            .collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let docs = collections.get(collection).map(Vec::as_slice).unwrap_or(&[]);
        Ok(docs.iter().find(|doc| filter.matches(doc)).cloned())
    }

    fn find(&self, collection: &str, filter: &Filter, limit: usize) -> StoreResult<Vec<Document>> {
        let collections = self
            .collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let docs = collections.get(collection).map(Vec::as_slice).unwrap_or(&[]);
        Ok(docs
            .iter()
            .filter(|doc| filter.matches(doc))
            .take(limit)
            .cloned()
            .collect())
    }

    fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<Option<Document>> {
        let mut collections = self
            .collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(position) = docs.iter().position(|doc| filter.matches(doc)) else {
            return Ok(None);
        };

        let mut candidate = docs[position].clone();
        update.apply(&mut candidate);
        self.check_unique(collection, docs, &candidate, Some(position))?;

        docs[position] = candidate.clone();
        Ok(Some(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_doc(email: &str) -> Document {
        let mut doc = Document::new();
        doc.insert("email".into(), json!(email));
        doc.insert("is_active".into(), json!(true));
        doc
    }

    #[test]
    fn insert_assigns_an_id_and_find_one_returns_it() {
        let store = MemoryStore::new();
        let id = store.insert("users", user_doc("ada@example.com")).unwrap();

        let found = store
            .find_one("users", &Filter::new().eq("email", "ada@example.com"))
            .unwrap()
            .unwrap();
        assert_eq!(found.get("_id"), Some(&json!(id.to_string())));
    }

    #[test]
    fn unique_index_rejects_second_insert() {
        let store = MemoryStore::new().with_unique_index("users", "email");
        store.insert("users", user_doc("ada@example.com")).unwrap();

        let err = store
            .insert("users", user_doc("ada@example.com"))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { field } if field == "email"));
    }

    #[test]
    fn unique_index_is_sparse() {
        let store = MemoryStore::new().with_unique_index("users", "professional_id");
        store.insert("users", user_doc("ada@example.com")).unwrap();
        // Neither document carries the indexed field, so both insert fine.
        store.insert("users", user_doc("grace@example.com")).unwrap();
    }

    #[test]
    fn find_preserves_insertion_order_and_caps_at_limit() {
        let store = MemoryStore::new();
        for email in ["a@x.com", "b@x.com", "c@x.com"] {
            store.insert("users", user_doc(email)).unwrap();
        }

        let docs = store
            .find("users", &Filter::new().eq("is_active", true), 2)
            .unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].get("email"), Some(&json!("a@x.com")));
        assert_eq!(docs[1].get("email"), Some(&json!("b@x.com")));
    }

    #[test]
    fn find_one_and_update_returns_post_update_state() {
        let store = MemoryStore::new();
        store.insert("users", user_doc("ada@example.com")).unwrap();

        let updated = store
            .find_one_and_update(
                "users",
                &Filter::new().eq("email", "ada@example.com"),
                &Update::new().set("is_active", false),
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.get("is_active"), Some(&json!(false)));

        let stored = store
            .find_one("users", &Filter::new().eq("email", "ada@example.com"))
            .unwrap()
            .unwrap();
        assert_eq!(stored.get("is_active"), Some(&json!(false)));
    }

    #[test]
    fn find_one_and_update_misses_return_none() {
        let store = MemoryStore::new();
        let result = store
            .find_one_and_update(
                "users",
                &Filter::new().eq("email", "nobody@example.com"),
                &Update::new().set("is_active", false),
            )
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn update_cannot_steal_a_unique_value() {
        let store = MemoryStore::new().with_unique_index("users", "email");
        store.insert("users", user_doc("ada@example.com")).unwrap();
        store.insert("users", user_doc("grace@example.com")).unwrap();

        let err = store
            .find_one_and_update(
                "users",
                &Filter::new().eq("email", "grace@example.com"),
                &Update::new().set("email", "ada@example.com"),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { field } if field == "email"));
    }

    #[test]
    fn set_operators_are_idempotent_on_array_fields() {
        let store = MemoryStore::new();
        let mut doc = user_doc("doc@example.com");
        doc.insert("patients".into(), json!(["p1"]));
        store.insert("users", doc).unwrap();

        let filter = Filter::new().eq("email", "doc@example.com");
        let add = Update::new().add_to_set("patients", vec![json!("p1"), json!("p2")]);
        store.find_one_and_update("users", &filter, &add).unwrap();
        let after = store
            .find_one_and_update("users", &filter, &add)
            .unwrap()
            .unwrap();
        assert_eq!(after.get("patients"), Some(&json!(["p1", "p2"])));

        let removed = store
            .find_one_and_update(
                "users",
                &filter,
                &Update::new().pull_all("patients", vec![json!("p2"), json!("p9")]),
            )
            .unwrap()
            .unwrap();
        assert_eq!(removed.get("patients"), Some(&json!(["p1"])));
    }
}
