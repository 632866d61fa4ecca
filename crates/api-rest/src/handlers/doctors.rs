//! Doctor profiles and their patient rosters.
//!
//! Profile management is admin-only. Roster routes are doctor-only and
//! ownership-checked: the authenticated doctor must be the one named in the
//! path, and the check runs before any repository call.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use medrec_core::{
    changeset_document, policy, Doctor, DoctorChangeset, LookupKey, PatientStats, Role,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{AdminPrincipal, Principal};
use crate::handlers::patients::PatientBody;
use crate::handlers::{GetQuery, ListQuery};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDoctorReq {
    pub email: String,
    pub password: String,
    pub name: String,
    pub surname: String,
    pub professional_id: String,
    pub university: String,
    pub speciality: Option<String>,
}

/// Doctor profile as returned to clients. Never carries the password hash.
#[derive(Debug, Serialize, ToSchema)]
pub struct DoctorBody {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub name: String,
    pub surname: String,
    pub professional_id: String,
    pub university: String,
    pub speciality: String,
    pub patients: Vec<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Doctor> for DoctorBody {
    fn from(doctor: Doctor) -> Self {
        Self {
            id: doctor.id.unwrap_or_default(),
            email: doctor.email,
            role: doctor.role,
            name: doctor.name,
            surname: doctor.surname,
            professional_id: doctor.professional_id,
            university: doctor.university,
            speciality: doctor.speciality,
            patients: doctor.patients,
            is_active: doctor.is_active,
            created_at: doctor.created_at,
            updated_at: doctor.updated_at,
        }
    }
}

/// Patient ids to add to or remove from a roster.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PatientsChangeset {
    pub patients: Vec<Uuid>,
}

#[utoipa::path(
    post,
    path = "/doctors",
    request_body = CreateDoctorReq,
    responses(
        (status = 201, description = "Doctor created", body = DoctorBody),
        (status = 403, description = "Not authorized"),
        (status = 409, description = "Email or professional id already registered")
    )
)]
/// Register a new doctor. The role tag is forced to `doctor`.
pub async fn create(
    State(state): State<AppState>,
    AdminPrincipal(_principal): AdminPrincipal,
    Json(req): Json<CreateDoctorReq>,
) -> Result<(StatusCode, Json<DoctorBody>), ApiError> {
    let password_hash = state.credentials.hash(&req.password)?;
    let doctor = Doctor::new(
        req.email,
        password_hash,
        req.name,
        req.surname,
        req.professional_id,
        req.university,
        req.speciality,
    );
    let created = state.doctors.create(&doctor)?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/doctors",
    params(ListQuery),
    responses(
        (status = 200, description = "All matching doctors", body = [DoctorBody]),
        (status = 403, description = "Not authorized")
    )
)]
/// List doctors. Unpaginated, capped at 1000 results.
pub async fn list(
    State(state): State<AppState>,
    AdminPrincipal(_principal): AdminPrincipal,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<DoctorBody>>, ApiError> {
    let doctors = state.doctors.list(query.filter(), query.limit())?;
    Ok(Json(doctors.into_iter().map(DoctorBody::from).collect()))
}

#[utoipa::path(
    get,
    path = "/doctors/{id}",
    params(("id" = Uuid, Path, description = "Doctor id"), GetQuery),
    responses(
        (status = 200, description = "The doctor", body = DoctorBody),
        (status = 404, description = "No such doctor")
    )
)]
/// Fetch one doctor by id.
pub async fn get(
    State(state): State<AppState>,
    Principal(_principal): Principal,
    Path(id): Path<Uuid>,
    Query(query): Query<GetQuery>,
) -> Result<Json<DoctorBody>, ApiError> {
    state
        .doctors
        .get(LookupKey::Id(id), query.is_active.unwrap_or(true))?
        .map(|doctor| Json(doctor.into()))
        .ok_or_else(|| ApiError::not_found("Doctor", id))
}

#[utoipa::path(
    put,
    path = "/doctors/{id}",
    request_body = DoctorChangeset,
    params(("id" = Uuid, Path, description = "Doctor id")),
    responses(
        (status = 200, description = "Updated doctor", body = DoctorBody),
        (status = 404, description = "No such doctor")
    )
)]
/// Update individual fields of a doctor profile. Missing or `null` fields
/// are ignored.
pub async fn update(
    State(state): State<AppState>,
    AdminPrincipal(_principal): AdminPrincipal,
    Path(id): Path<Uuid>,
    Json(changeset): Json<DoctorChangeset>,
) -> Result<Json<DoctorBody>, ApiError> {
    state
        .doctors
        .update(LookupKey::Id(id), changeset_document(&changeset)?)?
        .map(|doctor| Json(doctor.into()))
        .ok_or_else(|| ApiError::not_found("Doctor", id))
}

#[utoipa::path(
    delete,
    path = "/doctors/{id}",
    params(("id" = Uuid, Path, description = "Doctor id")),
    responses(
        (status = 200, description = "Deactivated doctor", body = DoctorBody),
        (status = 404, description = "No such doctor")
    )
)]
/// Soft-delete a doctor profile.
pub async fn delete(
    State(state): State<AppState>,
    AdminPrincipal(_principal): AdminPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<DoctorBody>, ApiError> {
    state
        .doctors
        .delete(LookupKey::Id(id), true)?
        .map(|doctor| Json(doctor.into()))
        .ok_or_else(|| ApiError::not_found("Doctor", id))
}

#[utoipa::path(
    patch,
    path = "/doctors/{id}/patients",
    request_body = PatientsChangeset,
    params(("id" = Uuid, Path, description = "Doctor id")),
    responses(
        (status = 201, description = "Updated roster", body = DoctorBody),
        (status = 403, description = "Not the roster owner")
    )
)]
/// Add patients to the doctor's own roster. Unknown ids are skipped; adding
/// a patient twice is a no-op.
pub async fn add_patients(
    State(state): State<AppState>,
    Principal(user): Principal,
    Path(id): Path<Uuid>,
    Json(changeset): Json<PatientsChangeset>,
) -> Result<(StatusCode, Json<DoctorBody>), ApiError> {
    policy::authorize_roster_owner(&user, id)?;
    let doctor = state.relations.add_patients(id, &changeset.patients)?;
    Ok((StatusCode::CREATED, Json(doctor.into())))
}

#[utoipa::path(
    delete,
    path = "/doctors/{id}/patients",
    request_body = PatientsChangeset,
    params(("id" = Uuid, Path, description = "Doctor id")),
    responses(
        (status = 200, description = "Updated roster", body = DoctorBody),
        (status = 403, description = "Not the roster owner")
    )
)]
/// Remove patients from the doctor's own roster. Ids not on the roster are
/// ignored.
pub async fn remove_patients(
    State(state): State<AppState>,
    Principal(user): Principal,
    Path(id): Path<Uuid>,
    Json(changeset): Json<PatientsChangeset>,
) -> Result<Json<DoctorBody>, ApiError> {
    policy::authorize_roster_owner(&user, id)?;
    let doctor = state.relations.remove_patients(id, &changeset.patients)?;
    Ok(Json(doctor.into()))
}

#[utoipa::path(
    get,
    path = "/doctors/{id}/patients",
    params(("id" = Uuid, Path, description = "Doctor id"), ListQuery),
    responses(
        (status = 200, description = "The doctor's patients", body = [PatientBody]),
        (status = 403, description = "Not the roster owner")
    )
)]
/// List the doctor's own patients, optionally filtered.
pub async fn list_patients(
    State(state): State<AppState>,
    Principal(user): Principal,
    Path(id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PatientBody>>, ApiError> {
    policy::authorize_roster_owner(&user, id)?;
    let patients = state.relations.list_patients(id, query.filter(), query.limit())?;
    Ok(Json(patients.into_iter().map(PatientBody::from).collect()))
}

#[utoipa::path(
    get,
    path = "/doctors/{id}/patients/stats",
    params(("id" = Uuid, Path, description = "Doctor id")),
    responses(
        (status = 200, description = "Roster genre breakdown", body = PatientStats),
        (status = 403, description = "Not the roster owner")
    )
)]
/// Genre breakdown of the doctor's own roster, recomputed on every call.
pub async fn patient_stats(
    State(state): State<AppState>,
    Principal(user): Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<PatientStats>, ApiError> {
    policy::authorize_roster_owner(&user, id)?;
    Ok(Json(state.relations.patient_stats(id)?))
}
