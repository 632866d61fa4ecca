//! # medrec Core
//!
//! Core business logic for the medrec clinical-records system:
//! - Token-based authentication and role checks (`auth`, `policy`)
//! - Generic record repositories with soft deletion (`repository`)
//! - Doctor ↔ patient roster management (`relations`)
//! - The document store contract and in-process backend (`store`)
//!
//! **No API concerns**: HTTP servers, request parsing and status-code mapping
//! belong in `api-rest`.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod relations;
pub mod repository;
pub mod store;

pub use auth::{Claims, CredentialStore};
pub use config::{
    auth_algorithm_from_env_value, CoreConfig, DEFAULT_BCRYPT_COST, DEFAULT_TOKEN_TTL_MINUTES,
};
pub use error::{RecordError, RecordResult};
pub use models::{
    Doctor, DoctorChangeset, Genre, Patient, PatientChangeset, Role, User, UserChangeset,
};
pub use relations::{PatientStats, RelationshipService};
pub use repository::{changeset_document, Entity, LookupKey, Repository, DEFAULT_LIST_LIMIT};
pub use store::{
    Connection, Document, DocumentStore, Filter, MemoryStore, StoreError, StoreResult, Update,
};
