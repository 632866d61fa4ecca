//! Bearer-token extractors.
//!
//! `Principal` performs the Anonymous → Authenticated transition from the
//! `Authorization` header; the role-checked wrappers add the Authenticated →
//! Authorized transition for routes with a fixed allowed-role set. Rejection
//! at either step ends the request before the handler body runs.

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use medrec_core::{policy, RecordError, Role, User};

use crate::error::ApiError;
use crate::AppState;

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// The authenticated account behind the request.
pub struct Principal(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        let token = bearer_token(parts).ok_or(ApiError::from(RecordError::Unauthenticated))?;
        let user = app.credentials.current_user(token)?;
        Ok(Principal(user))
    }
}

/// An authenticated admin account.
pub struct AdminPrincipal(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AdminPrincipal
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Principal(user) = Principal::from_request_parts(parts, state).await?;
        policy::authorize(&user, &[Role::Admin])?;
        Ok(AdminPrincipal(user))
    }
}

/// An authenticated account allowed to manage patient records.
pub struct CarePrincipal(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CarePrincipal
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Principal(user) = Principal::from_request_parts(parts, state).await?;
        policy::authorize(&user, &[Role::Admin, Role::Doctor])?;
        Ok(CarePrincipal(user))
    }
}
