use uuid::Uuid;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("duplicate key on `{field}`")]
    DuplicateKey { field: String },
    #[error("doctor {0} not found")]
    DoctorNotFound(Uuid),
    #[error("{kind} {id} missing after insert")]
    MissingAfterInsert { kind: &'static str, id: Uuid },
    #[error("hard delete not defined for {0} records")]
    HardDeleteNotDefined(&'static str),
    #[error("invalid credentials")]
    Unauthenticated,
    #[error("not authorized to use this resource")]
    Unauthorized,
    #[error("failed to hash password: {0}")]
    PasswordHash(bcrypt::BcryptError),
    #[error("failed to sign token: {0}")]
    TokenSign(jsonwebtoken::errors::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;
