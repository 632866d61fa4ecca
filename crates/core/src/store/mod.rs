//! Document store abstraction.
//!
//! The record layer talks to persistence through the narrow [`DocumentStore`]
//! trait: insert, exact-match find, and an atomic single-document
//! find-and-update that returns the post-update state. Anything a backend
//! offers beyond that (multi-document transactions, cursors, aggregation) is
//! deliberately out of reach of the core.
//!
//! Updates carry `$set`-style field assignments plus set-atomic
//! `add_to_set`/`pull_all` operators. Membership changes to array fields go
//! through the set operators so that two concurrent updates against the same
//! document cannot clobber each other's change.

mod memory;

pub use memory::MemoryStore;

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use serde_json::Value;
use uuid::Uuid;

/// A stored document: a flat JSON object keyed by field name.
pub type Document = serde_json::Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate key on `{field}`")]
    DuplicateKey { field: String },
    #[error("store connection has already been initialised")]
    AlreadyConnected,
    #[error("store connection has not been initialised")]
    NotConnected,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A single field constraint inside a [`Filter`].
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// Field must equal the value exactly.
    Eq(Value),
    /// Field must be one of the listed values.
    In(Vec<Value>),
}

/// An exact-match query over document fields.
///
/// Conditions are ANDed together. Fields are kept in a `BTreeMap` so that
/// filters have a stable, order-independent representation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    conditions: BTreeMap<String, Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality constraint, replacing any previous constraint on the
    /// same field.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(field.into(), Condition::Eq(value.into()));
        self
    }

    /// Add a membership constraint, replacing any previous constraint on the
    /// same field.
    pub fn is_in(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.conditions.insert(field.into(), Condition::In(values));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Overlay `other` on top of this filter. Constraints in `other` win on
    /// conflicting fields.
    pub fn merge(mut self, other: Filter) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    /// Whether `doc` satisfies every condition. A missing field is treated as
    /// JSON `null`.
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|(field, condition)| {
            let actual = doc.get(field).unwrap_or(&Value::Null);
            match condition {
                Condition::Eq(expected) => actual == expected,
                Condition::In(allowed) => allowed.contains(actual),
            }
        })
    }
}

/// A single-document mutation.
///
/// `set` assigns fields wholesale; `add_to_set` appends values to an array
/// field unless already present; `pull_all` removes every listed value.
/// A backend must apply all three parts atomically.
#[derive(Clone, Debug, Default)]
pub struct Update {
    set: Document,
    add_to_set: Vec<(String, Vec<Value>)>,
    pull_all: Vec<(String, Vec<Value>)>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }

    pub fn add_to_set(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.add_to_set.push((field.into(), values));
        self
    }

    pub fn pull_all(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.pull_all.push((field.into(), values));
        self
    }

    /// Fields assigned by the `set` part.
    pub fn set_fields(&self) -> &Document {
        &self.set
    }

    /// Apply the mutation to `doc` in place.
    ///
    /// Set operators treat a missing or non-array target as an empty array.
    pub(crate) fn apply(&self, doc: &mut Document) {
        for (field, value) in &self.set {
            doc.insert(field.clone(), value.clone());
        }
        for (field, values) in &self.add_to_set {
            let entry = doc.entry(field.clone()).or_insert_with(|| Value::Array(vec![]));
            if !entry.is_array() {
                *entry = Value::Array(vec![]);
            }
            if let Value::Array(items) = entry {
                for value in values {
                    if !items.contains(value) {
                        items.push(value.clone());
                    }
                }
            }
        }
        for (field, values) in &self.pull_all {
            if let Some(Value::Array(items)) = doc.get_mut(field) {
                items.retain(|item| !values.contains(item));
            }
        }
    }
}

/// The persistence contract required by the record layer.
///
/// `find_one_and_update` is the only mutation primitive after insert; it must
/// be atomic per document and return the post-update state.
pub trait DocumentStore: Send + Sync {
    /// Insert a document, assigning a fresh `_id` when absent. Fails with
    /// [`StoreError::DuplicateKey`] when a unique index collides.
    fn insert(&self, collection: &str, doc: Document) -> StoreResult<Uuid>;

    /// First matching document in insertion order, if any.
    fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>>;

    /// All matching documents in insertion order, capped at `limit`.
    fn find(&self, collection: &str, filter: &Filter, limit: usize) -> StoreResult<Vec<Document>>;

    /// Atomically apply `update` to the first matching document and return the
    /// post-update state, or `None` when nothing matched.
    fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<Option<Document>>;
}

static GLOBAL_STORE: OnceLock<Arc<dyn DocumentStore>> = OnceLock::new();

/// Process-wide store handle with an explicit init-once lifecycle.
///
/// The handle is shared by reference; [`Connection::get`] before
/// [`Connection::initialise`] is an error rather than a silently cached null
/// handle, and initialising twice is rejected.
pub struct Connection;

impl Connection {
    pub fn initialise(store: Arc<dyn DocumentStore>) -> StoreResult<()> {
        GLOBAL_STORE
            .set(store)
            .map_err(|_| StoreError::AlreadyConnected)
    }

    pub fn get() -> StoreResult<Arc<dyn DocumentStore>> {
        GLOBAL_STORE.get().cloned().ok_or(StoreError::NotConnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(pairs: &[(&str, Value)]) -> Document {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn filter_matches_on_equality_and_membership() {
        let record = doc(&[("name", json!("Ada")), ("is_active", json!(true))]);

        assert!(Filter::new().eq("name", "Ada").matches(&record));
        assert!(!Filter::new().eq("name", "Grace").matches(&record));
        assert!(Filter::new()
            .is_in("name", vec![json!("Ada"), json!("Grace")])
            .matches(&record));
        assert!(!Filter::new().is_in("name", vec![json!("Grace")]).matches(&record));
    }

    #[test]
    fn filter_treats_missing_fields_as_null() {
        let record = doc(&[("name", json!("Ada"))]);
        assert!(Filter::new().eq("deleted_at", Value::Null).matches(&record));
        assert!(!Filter::new().eq("surname", "Lovelace").matches(&record));
    }

    #[test]
    fn filter_merge_overrides_conflicting_fields() {
        let base = Filter::new().eq("is_active", true).eq("role", "viewer");
        let merged = base.merge(Filter::new().eq("role", "doctor"));
        let record = doc(&[("is_active", json!(true)), ("role", json!("doctor"))]);
        assert!(merged.matches(&record));
    }

    #[test]
    fn update_applies_set_and_set_operators() {
        let mut record = doc(&[("name", json!("Ada")), ("tags", json!(["a", "b"]))]);

        let update = Update::new()
            .set("name", "Grace")
            .add_to_set("tags", vec![json!("b"), json!("c")])
            .pull_all("tags", vec![json!("a")]);
        update.apply(&mut record);

        assert_eq!(record.get("name"), Some(&json!("Grace")));
        assert_eq!(record.get("tags"), Some(&json!(["b", "c"])));
    }

    #[test]
    fn update_add_to_set_starts_from_empty_array() {
        let mut record = doc(&[("name", json!("Ada"))]);
        Update::new()
            .add_to_set("tags", vec![json!("x")])
            .apply(&mut record);
        assert_eq!(record.get("tags"), Some(&json!(["x"])));
    }

    #[test]
    fn connection_lifecycle_is_explicit() {
        assert!(matches!(Connection::get(), Err(StoreError::NotConnected)));

        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        Connection::initialise(store).unwrap();
        assert!(Connection::get().is_ok());

        let other: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        assert!(matches!(
            Connection::initialise(other),
            Err(StoreError::AlreadyConnected)
        ));
    }
}
