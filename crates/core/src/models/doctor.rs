use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::user::Role;
use crate::repository::Entity;
use crate::store::Filter;

fn default_speciality() -> String {
    "General".to_string()
}

/// A doctor: a `users` document tagged `role = doctor` with professional
/// fields and the ordered set of assigned patient ids.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Doctor {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub name: String,
    pub surname: String,
    pub professional_id: String,
    pub university: String,
    #[serde(default = "default_speciality")]
    pub speciality: String,
    #[serde(default)]
    pub patients: Vec<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Doctor {
    /// Build a new doctor account. The role tag is forced to `Doctor`; there
    /// is no other way to construct one.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        email: String,
        password_hash: String,
        name: String,
        surname: String,
        professional_id: String,
        university: String,
        speciality: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            email,
            password_hash,
            role: Role::Doctor,
            name,
            surname,
            professional_id,
            university,
            speciality: speciality.unwrap_or_else(default_speciality),
            patients: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Doctor {
    const COLLECTION: &'static str = "users";
    const KIND: &'static str = "doctor";

    fn scope() -> Filter {
        Filter::new().eq("role", Role::Doctor.as_str())
    }

    fn id(&self) -> Option<Uuid> {
        self.id
    }
}

/// Partial update for a doctor. `None` fields are left unchanged; the role
/// tag, professional id and patient set are not reachable from here.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct DoctorChangeset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speciality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
}
