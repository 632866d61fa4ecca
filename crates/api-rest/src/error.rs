//! Error-to-status mapping for the REST surface.
//!
//! Repository absence arrives here as a handler-built `NotFound`; everything
//! else wraps a core [`RecordError`]. Internal causes are logged, never sent
//! to the client.

use std::fmt::Display;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use medrec_core::RecordError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    NotFound { detail: String },
    Record(RecordError),
}

impl ApiError {
    /// A 404 for a record the caller asked for by id.
    pub fn not_found(kind: &str, id: impl Display) -> Self {
        ApiError::NotFound {
            detail: format!("{kind} {id} not found"),
        }
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        ApiError::Record(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound { detail } => (StatusCode::NOT_FOUND, detail),
            ApiError::Record(RecordError::Unauthenticated) => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            ApiError::Record(RecordError::Unauthorized) => (
                StatusCode::FORBIDDEN,
                "Not authorized to use this resource".to_string(),
            ),
            ApiError::Record(RecordError::DuplicateKey { field }) => (
                StatusCode::CONFLICT,
                format!("duplicate value for `{field}`"),
            ),
            ApiError::Record(RecordError::DoctorNotFound(id)) => {
                (StatusCode::NOT_FOUND, format!("doctor {id} not found"))
            }
            ApiError::Record(RecordError::InvalidInput(detail)) => {
                (StatusCode::BAD_REQUEST, detail)
            }
            ApiError::Record(err) => {
                tracing::error!("request failed: {err:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let mut response = (status, Json(json!({ "detail": detail }))).into_response();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
