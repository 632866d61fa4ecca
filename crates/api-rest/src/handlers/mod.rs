//! Request handlers, grouped per resource the way the routes are.

pub mod auth;
pub mod doctors;
pub mod patients;
pub mod users;

use axum::Json;
use medrec_core::{Filter, DEFAULT_LIST_LIMIT};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Exact-match listing filters shared by the collection endpoints.
///
/// `is_active` defaults to true: listings only show active records unless the
/// caller asks otherwise. Responses are unpaginated and capped.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListQuery {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn filter(&self) -> Filter {
        let mut filter = Filter::new().eq("is_active", self.is_active.unwrap_or(true));
        if let Some(name) = &self.name {
            filter = filter.eq("name", name.clone());
        }
        if let Some(surname) = &self.surname {
            filter = filter.eq("surname", surname.clone());
        }
        if let Some(email) = &self.email {
            filter = filter.eq("email", email.clone());
        }
        filter
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT)
    }
}

/// Visibility switch for single-record lookups.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct GetQuery {
    pub is_active: Option<bool>,
}

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint, used for monitoring and load balancers.
pub async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "medrec REST API is alive".into(),
    })
}
