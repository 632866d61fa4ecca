//! Login and whoami.

use axum::extract::State;
use axum::Json;
use medrec_core::RecordError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::extract::Principal;
use crate::handlers::users::UserBody;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenRes {
    pub access_token: String,
    pub token_type: String,
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Bearer token issued", body = TokenRes),
        (status = 401, description = "Incorrect email or password")
    )
)]
/// Exchange an email/password pair for a bearer token.
///
/// Unknown email and wrong password produce the same response, so the
/// endpoint cannot be used to enumerate accounts.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> Result<Json<TokenRes>, ApiError> {
    let user = state
        .credentials
        .authenticate(&req.email, &req.password)?
        .ok_or(ApiError::from(RecordError::Unauthenticated))?;

    let access_token = state.credentials.issue_token(&user)?;
    Ok(Json(TokenRes {
        access_token,
        token_type: "bearer".into(),
    }))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "The authenticated account", body = UserBody),
        (status = 401, description = "Missing or invalid token")
    )
)]
/// Return the account behind the presented token.
pub async fn me(Principal(user): Principal) -> Json<UserBody> {
    Json(user.into())
}
