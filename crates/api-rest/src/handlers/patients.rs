//! Patient records.
//!
//! Reads are open to any authenticated account, viewers included; mutations
//! require an admin or a doctor.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use medrec_core::{changeset_document, Genre, LookupKey, Patient, PatientChangeset};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{CarePrincipal, Principal};
use crate::handlers::{GetQuery, ListQuery};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePatientReq {
    pub name: String,
    pub surname: String,
    pub genre: Genre,
    pub email: String,
    pub birthdate: Option<DateTime<Utc>>,
}

/// Patient record as returned to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct PatientBody {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub genre: Genre,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<DateTime<Utc>>,
    pub is_new: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Patient> for PatientBody {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id.unwrap_or_default(),
            name: patient.name,
            surname: patient.surname,
            genre: patient.genre,
            email: patient.email,
            birthdate: patient.birthdate,
            is_new: patient.is_new,
            is_active: patient.is_active,
            created_at: patient.created_at,
            updated_at: patient.updated_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = CreatePatientReq,
    responses(
        (status = 201, description = "Patient created", body = PatientBody),
        (status = 403, description = "Not authorized")
    )
)]
/// Register a new patient record.
pub async fn create(
    State(state): State<AppState>,
    CarePrincipal(_principal): CarePrincipal,
    Json(req): Json<CreatePatientReq>,
) -> Result<(StatusCode, Json<PatientBody>), ApiError> {
    let patient = Patient::new(req.name, req.surname, req.genre, req.email, req.birthdate);
    let created = state.patients.create(&patient)?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/patients",
    params(ListQuery),
    responses(
        (status = 200, description = "All matching patients", body = [PatientBody])
    )
)]
/// List patients. Unpaginated, capped at 1000 results.
pub async fn list(
    State(state): State<AppState>,
    Principal(_principal): Principal,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PatientBody>>, ApiError> {
    let patients = state.patients.list(query.filter(), query.limit())?;
    Ok(Json(patients.into_iter().map(PatientBody::from).collect()))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient id"), GetQuery),
    responses(
        (status = 200, description = "The patient", body = PatientBody),
        (status = 404, description = "No such patient")
    )
)]
/// Fetch one patient by id.
pub async fn get(
    State(state): State<AppState>,
    Principal(_principal): Principal,
    Path(id): Path<Uuid>,
    Query(query): Query<GetQuery>,
) -> Result<Json<PatientBody>, ApiError> {
    state
        .patients
        .get(LookupKey::Id(id), query.is_active.unwrap_or(true))?
        .map(|patient| Json(patient.into()))
        .ok_or_else(|| ApiError::not_found("Patient", id))
}

#[utoipa::path(
    patch,
    path = "/patients/{id}",
    request_body = PatientChangeset,
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Updated patient", body = PatientBody),
        (status = 404, description = "No such patient")
    )
)]
/// Update individual fields of a patient record. Missing or `null` fields
/// are ignored.
pub async fn update(
    State(state): State<AppState>,
    CarePrincipal(_principal): CarePrincipal,
    Path(id): Path<Uuid>,
    Json(changeset): Json<PatientChangeset>,
) -> Result<Json<PatientBody>, ApiError> {
    state
        .patients
        .update(LookupKey::Id(id), changeset_document(&changeset)?)?
        .map(|patient| Json(patient.into()))
        .ok_or_else(|| ApiError::not_found("Patient", id))
}

#[utoipa::path(
    delete,
    path = "/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Deactivated patient", body = PatientBody),
        (status = 404, description = "No such patient")
    )
)]
/// Soft-delete a patient record.
pub async fn delete(
    State(state): State<AppState>,
    CarePrincipal(_principal): CarePrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<PatientBody>, ApiError> {
    state
        .patients
        .delete(LookupKey::Id(id), true)?
        .map(|patient| Json(patient.into()))
        .ok_or_else(|| ApiError::not_found("Patient", id))
}
