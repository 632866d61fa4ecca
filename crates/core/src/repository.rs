//! Generic record repository.
//!
//! One `Repository<E>` implements the whole CRUD + soft-delete contract for
//! every entity type; an [`Entity`] impl supplies the collection name, the
//! scope filter (doctors share the `users` collection with other roles) and
//! id access.
//!
//! Repository lookups report absence as `Ok(None)`, never as an error; the
//! API layer is the one that turns absence into a user-visible 404.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{RecordError, RecordResult};
use crate::store::{Document, DocumentStore, Filter, StoreError, Update};

/// Hard cap applied to unfiltered listings. There is no pagination; results
/// beyond the cap are simply not returned.
pub const DEFAULT_LIST_LIMIT: usize = 1000;

/// Storage description of an entity type.
pub trait Entity: Serialize + DeserializeOwned + Clone {
    /// Collection the entity lives in.
    const COLLECTION: &'static str;
    /// Human-readable kind, used in error messages.
    const KIND: &'static str;

    /// Filter narrowing the collection to this entity type. Applied to every
    /// repository operation.
    fn scope() -> Filter {
        Filter::new()
    }

    fn id(&self) -> Option<Uuid>;
}

/// How to single out a record: by id or by email. Every lookup names exactly
/// one of the two.
#[derive(Clone, Copy, Debug)]
pub enum LookupKey<'a> {
    Id(Uuid),
    Email(&'a str),
}

pub struct Repository<E> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// Insert a new record.
    ///
    /// The repository owns the lifecycle fields: any client-supplied id is
    /// dropped, `created_at`/`updated_at` are stamped to now and the record
    /// starts active. A unique-index collision surfaces as
    /// [`RecordError::DuplicateKey`] naming the conflicting field.
    pub fn create(&self, entity: &E) -> RecordResult<E> {
        let mut doc = to_document(entity)?;
        doc.remove("_id");

        let stamp = serde_json::to_value(Utc::now()).map_err(RecordError::Serialization)?;
        doc.insert("created_at".into(), stamp.clone());
        doc.insert("updated_at".into(), stamp);
        doc.insert("is_active".into(), Value::Bool(true));

        let id = match self.store.insert(E::COLLECTION, doc) {
            Ok(id) => id,
            Err(StoreError::DuplicateKey { field }) => {
                return Err(RecordError::DuplicateKey { field })
            }
            Err(err) => return Err(err.into()),
        };

        self.get(LookupKey::Id(id), true)?
            .ok_or(RecordError::MissingAfterInsert { kind: E::KIND, id })
    }

    /// Look a record up. Default visibility is active records only; pass
    /// `is_active = false` for audit lookups of soft-deleted records.
    pub fn get(&self, key: LookupKey<'_>, is_active: bool) -> RecordResult<Option<E>> {
        match self
            .store
            .find_one(E::COLLECTION, &Self::key_filter(key, is_active))?
        {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    /// List records matching `filter` in insertion order, capped at `limit`.
    /// An empty filter defaults to active records.
    pub fn list(&self, filter: Filter, limit: usize) -> RecordResult<Vec<E>> {
        let filter = if filter.is_empty() {
            Filter::new().eq("is_active", true)
        } else {
            filter
        };
        self.store
            .find(E::COLLECTION, &filter.merge(E::scope()), limit)?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// Apply a field changeset to an active record. `updated_at` is always
    /// stamped. A soft-deleted or missing target yields `Ok(None)`.
    pub fn update(&self, key: LookupKey<'_>, changeset: Document) -> RecordResult<Option<E>> {
        let mut update = Update::new();
        for (field, value) in changeset {
            update = update.set(field, value);
        }
        self.update_with(key, update)
    }

    /// Like [`Repository::update`] but taking a full [`Update`], so callers
    /// can use the set-atomic array operators. When the atomic update matches
    /// nothing the outcome is delegated to a plain `get`.
    pub fn update_with(&self, key: LookupKey<'_>, update: Update) -> RecordResult<Option<E>> {
        let stamp = serde_json::to_value(Utc::now()).map_err(RecordError::Serialization)?;
        let update = update.set("updated_at", stamp);

        match self
            .store
            .find_one_and_update(E::COLLECTION, &Self::key_filter(key, true), &update)
        {
            Ok(Some(doc)) => Ok(Some(from_document(doc)?)),
            Ok(None) => self.get(key, true),
            Err(StoreError::DuplicateKey { field }) => Err(RecordError::DuplicateKey { field }),
            Err(err) => Err(err.into()),
        }
    }

    /// Remove a record. Only soft deletion exists: the record is flagged
    /// inactive and stays queryable by id for audit. Requesting a hard delete
    /// is a configuration error, not a supported operation.
    pub fn delete(&self, key: LookupKey<'_>, soft: bool) -> RecordResult<Option<E>> {
        if !soft {
            return Err(RecordError::HardDeleteNotDefined(E::KIND));
        }
        let mut changeset = Document::new();
        changeset.insert("is_active".into(), Value::Bool(false));
        self.update(key, changeset)
    }

    fn key_filter(key: LookupKey<'_>, is_active: bool) -> Filter {
        let filter = E::scope().eq("is_active", is_active);
        match key {
            LookupKey::Id(id) => filter.eq("_id", id.to_string()),
            LookupKey::Email(email) => filter.eq("email", email),
        }
    }
}

/// Serialize a changeset struct into a field document, dropping `null`s so a
/// missing field can never clear a stored value.
pub fn changeset_document<C: Serialize>(changeset: &C) -> RecordResult<Document> {
    match serde_json::to_value(changeset).map_err(RecordError::Serialization)? {
        Value::Object(map) => Ok(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        _ => Err(RecordError::InvalidInput(
            "changeset must serialize to an object".into(),
        )),
    }
}

fn to_document<E: Serialize>(entity: &E) -> RecordResult<Document> {
    match serde_json::to_value(entity).map_err(RecordError::Serialization)? {
        Value::Object(map) => Ok(map),
        _ => Err(RecordError::InvalidInput(
            "entity must serialize to an object".into(),
        )),
    }
}

fn from_document<E: DeserializeOwned>(doc: Document) -> RecordResult<E> {
    serde_json::from_value(Value::Object(doc)).map_err(RecordError::Deserialization)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Doctor, Genre, Patient, PatientChangeset, Role, User};
    use crate::store::MemoryStore;

    fn store() -> Arc<dyn DocumentStore> {
        Arc::new(
            MemoryStore::new()
                .with_unique_index("users", "email")
                .with_unique_index("users", "professional_id"),
        )
    }

    fn sample_user(email: &str) -> User {
        User::new(
            email.into(),
            "$2b$04$hash".into(),
            Role::Viewer,
            "Ada".into(),
            "Lovelace".into(),
        )
    }

    fn sample_patient(email: &str) -> Patient {
        Patient::new("Alan".into(), "Turing".into(), Genre::Masc, email.into(), None)
    }

    #[test]
    fn create_assigns_id_and_lifecycle_fields() {
        let users: Repository<User> = Repository::new(store());
        let created = users.create(&sample_user("ada@example.com")).unwrap();

        assert!(created.id.is_some());
        assert!(created.is_active);
        assert_eq!(created.created_at, created.updated_at);
    }

    #[test]
    fn create_rejects_duplicate_email_and_keeps_first_record() {
        let users: Repository<User> = Repository::new(store());
        let first = users.create(&sample_user("ada@example.com")).unwrap();

        let mut second = sample_user("ada@example.com");
        second.name = "Impostor".into();
        let err = users.create(&second).unwrap_err();
        assert!(matches!(err, RecordError::DuplicateKey { field } if field == "email"));

        let kept = users
            .get(LookupKey::Email("ada@example.com"), true)
            .unwrap()
            .unwrap();
        assert_eq!(kept.id, first.id);
        assert_eq!(kept.name, "Ada");
    }

    #[test]
    fn get_finds_by_email() {
        let users: Repository<User> = Repository::new(store());
        let created = users.create(&sample_user("ada@example.com")).unwrap();

        let found = users
            .get(LookupKey::Email("ada@example.com"), true)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
        assert!(users
            .get(LookupKey::Email("nobody@example.com"), true)
            .unwrap()
            .is_none());
    }

    #[test]
    fn soft_delete_hides_but_does_not_remove() {
        let users: Repository<User> = Repository::new(store());
        let created = users.create(&sample_user("ada@example.com")).unwrap();
        let id = created.id.unwrap();

        let deleted = users.delete(LookupKey::Id(id), true).unwrap().unwrap();
        assert!(!deleted.is_active);

        // Default visibility misses the record...
        assert!(users.get(LookupKey::Id(id), true).unwrap().is_none());
        // ...but an audit lookup still finds it.
        let archived = users.get(LookupKey::Id(id), false).unwrap().unwrap();
        assert_eq!(archived.id, Some(id));
    }

    #[test]
    fn hard_delete_is_not_defined() {
        let users: Repository<User> = Repository::new(store());
        let created = users.create(&sample_user("ada@example.com")).unwrap();

        let err = users
            .delete(LookupKey::Id(created.id.unwrap()), false)
            .unwrap_err();
        assert!(matches!(err, RecordError::HardDeleteNotDefined("user")));
    }

    #[test]
    fn changeset_nulls_never_clear_fields() {
        let patients: Repository<Patient> = Repository::new(store());
        let created = patients.create(&sample_patient("alan@example.com")).unwrap();

        let changeset = PatientChangeset {
            email: Some("turing@example.com".into()),
            ..Default::default()
        };
        std::thread::sleep(std::time::Duration::from_millis(5));
        let updated = patients
            .update(
                LookupKey::Id(created.id.unwrap()),
                changeset_document(&changeset).unwrap(),
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.email, "turing@example.com");
        assert_eq!(updated.name, "Alan");
        assert!(updated.updated_at > created.updated_at);
    }

    #[test]
    fn updating_a_soft_deleted_record_is_a_no_op() {
        let users: Repository<User> = Repository::new(store());
        let created = users.create(&sample_user("ada@example.com")).unwrap();
        let id = created.id.unwrap();
        users.delete(LookupKey::Id(id), true).unwrap();

        let mut changeset = Document::new();
        changeset.insert("name".into(), Value::String("Ghost".into()));
        assert!(users.update(LookupKey::Id(id), changeset).unwrap().is_none());

        let archived = users.get(LookupKey::Id(id), false).unwrap().unwrap();
        assert_eq!(archived.name, "Ada");
    }

    #[test]
    fn list_defaults_to_active_records_in_insertion_order() {
        let users: Repository<User> = Repository::new(store());
        let first = users.create(&sample_user("a@example.com")).unwrap();
        let second = users.create(&sample_user("b@example.com")).unwrap();
        users
            .delete(LookupKey::Id(second.id.unwrap()), true)
            .unwrap();
        users.create(&sample_user("c@example.com")).unwrap();

        let listed = users.list(Filter::new(), DEFAULT_LIST_LIMIT).unwrap();
        let emails: Vec<_> = listed.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, vec!["a@example.com", "c@example.com"]);
        assert_eq!(listed[0].id, first.id);
    }

    #[test]
    fn doctor_scope_excludes_other_roles() {
        let shared = store();
        let users: Repository<User> = Repository::new(shared.clone());
        let doctors: Repository<Doctor> = Repository::new(shared);

        users.create(&sample_user("viewer@example.com")).unwrap();
        doctors
            .create(&Doctor::new(
                "doc@example.com".into(),
                "$2b$04$hash".into(),
                "Gregory".into(),
                "House".into(),
                "MD-1".into(),
                "Johns Hopkins".into(),
                None,
            ))
            .unwrap();

        let listed_doctors = doctors.list(Filter::new(), DEFAULT_LIST_LIMIT).unwrap();
        assert_eq!(listed_doctors.len(), 1);
        assert_eq!(listed_doctors[0].role, Role::Doctor);
        assert_eq!(listed_doctors[0].speciality, "General");

        let listed_users = users.list(Filter::new(), DEFAULT_LIST_LIMIT).unwrap();
        assert_eq!(listed_users.len(), 2);
    }

    #[test]
    fn changeset_document_drops_nulls() {
        let changeset = PatientChangeset {
            name: Some("Joan".into()),
            ..Default::default()
        };
        let doc = changeset_document(&changeset).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get("name"), Some(&Value::String("Joan".into())));
    }
}
