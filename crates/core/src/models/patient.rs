use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::repository::Entity;

/// Registered genre of a patient, as used by the roster statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Genre {
    #[serde(rename = "M")]
    Masc,
    #[serde(rename = "F")]
    Fem,
}

/// A patient record in the `patients` collection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Patient {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    pub surname: String,
    pub genre: Genre,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<DateTime<Utc>>,
    pub is_new: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn new(
        name: String,
        surname: String,
        genre: Genre,
        email: String,
        birthdate: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            name,
            surname,
            genre,
            email,
            birthdate,
            is_new: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Patient {
    const COLLECTION: &'static str = "patients";
    const KIND: &'static str = "patient";

    fn id(&self) -> Option<Uuid> {
        self.id
    }
}

/// Partial update for a patient. `None` fields are left unchanged.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct PatientChangeset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<Genre>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<DateTime<Utc>>,
}
