//! User account management. Every route here is admin-only.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use medrec_core::{changeset_document, LookupKey, Role, User, UserChangeset};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::AdminPrincipal;
use crate::handlers::{GetQuery, ListQuery};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserReq {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub name: String,
    pub surname: String,
}

/// User account as returned to clients. Never carries the password hash.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserBody {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub name: String,
    pub surname: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserBody {
    fn from(user: User) -> Self {
        Self {
            id: user.id.unwrap_or_default(),
            email: user.email,
            role: user.role,
            name: user.name,
            surname: user.surname,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserReq,
    responses(
        (status = 201, description = "User created", body = UserBody),
        (status = 403, description = "Not authorized"),
        (status = 409, description = "Email already registered")
    )
)]
/// Register a new account. The password is hashed before it is stored.
pub async fn create(
    State(state): State<AppState>,
    AdminPrincipal(_principal): AdminPrincipal,
    Json(req): Json<CreateUserReq>,
) -> Result<(StatusCode, Json<UserBody>), ApiError> {
    let password_hash = state.credentials.hash(&req.password)?;
    let user = User::new(req.email, password_hash, req.role, req.name, req.surname);
    let created = state.users.create(&user)?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/users",
    params(ListQuery),
    responses(
        (status = 200, description = "All matching users", body = [UserBody]),
        (status = 403, description = "Not authorized")
    )
)]
/// List accounts. Unpaginated, capped at 1000 results.
pub async fn list(
    State(state): State<AppState>,
    AdminPrincipal(_principal): AdminPrincipal,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<UserBody>>, ApiError> {
    let users = state.users.list(query.filter(), query.limit())?;
    Ok(Json(users.into_iter().map(UserBody::from).collect()))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User id"), GetQuery),
    responses(
        (status = 200, description = "The user", body = UserBody),
        (status = 404, description = "No such user")
    )
)]
/// Fetch one account by id. `is_active=false` looks up soft-deleted records.
pub async fn get(
    State(state): State<AppState>,
    AdminPrincipal(_principal): AdminPrincipal,
    Path(id): Path<Uuid>,
    Query(query): Query<GetQuery>,
) -> Result<Json<UserBody>, ApiError> {
    state
        .users
        .get(LookupKey::Id(id), query.is_active.unwrap_or(true))?
        .map(|user| Json(user.into()))
        .ok_or_else(|| ApiError::not_found("User", id))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    request_body = UserChangeset,
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Updated user", body = UserBody),
        (status = 404, description = "No such user")
    )
)]
/// Update individual fields of an account. Missing or `null` fields are
/// ignored; the role is not updatable.
pub async fn update(
    State(state): State<AppState>,
    AdminPrincipal(_principal): AdminPrincipal,
    Path(id): Path<Uuid>,
    Json(changeset): Json<UserChangeset>,
) -> Result<Json<UserBody>, ApiError> {
    state
        .users
        .update(LookupKey::Id(id), changeset_document(&changeset)?)?
        .map(|user| Json(user.into()))
        .ok_or_else(|| ApiError::not_found("User", id))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Deactivated user", body = UserBody),
        (status = 404, description = "No such user")
    )
)]
/// Soft-delete an account. The record stays queryable for audit.
pub async fn delete(
    State(state): State<AppState>,
    AdminPrincipal(_principal): AdminPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<UserBody>, ApiError> {
    state
        .users
        .delete(LookupKey::Id(id), true)?
        .map(|user| Json(user.into()))
        .ok_or_else(|| ApiError::not_found("User", id))
}
