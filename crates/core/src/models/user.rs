use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::repository::Entity;

/// Account role. Immutable after creation — no changeset carries it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Viewer => "viewer",
        }
    }
}

/// A user account as stored in the `users` collection.
///
/// The password hash travels with the record through the storage layer; API
/// response bodies are built from dedicated DTOs that leave it out.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub name: String,
    pub surname: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a new account ready for `Repository::create`. The repository
    /// stamps the definitive timestamps and activity flag on insert.
    pub fn new(
        email: String,
        password_hash: String,
        role: Role,
        name: String,
        surname: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            email,
            password_hash,
            role,
            name,
            surname,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for User {
    const COLLECTION: &'static str = "users";
    const KIND: &'static str = "user";

    fn id(&self) -> Option<Uuid> {
        self.id
    }
}

/// Partial update for a user. `None` fields are left unchanged.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UserChangeset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
