//! # medrec REST API
//!
//! Axum front-end for the medrec core: bearer-token auth, user and doctor
//! administration, patient records, and per-doctor patient rosters. Serves a
//! Swagger UI at `/swagger-ui` backed by the utoipa-generated document.

pub mod error;
pub mod extract;
pub mod handlers;


use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use medrec_core::{
    CoreConfig, CredentialStore, Doctor, DocumentStore, Patient, RelationshipService, Repository,
    User,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Shared per-request state. Cloning is cheap, everything inside is an `Arc`
/// or a handle over one.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialStore>,
    pub users: Repository<User>,
    pub doctors: Repository<Doctor>,
    pub patients: Repository<Patient>,
    pub relations: RelationshipService,
}

impl AppState {
    pub fn new(config: &CoreConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            credentials: Arc::new(CredentialStore::new(config, store.clone())),
            users: Repository::new(store.clone()),
            doctors: Repository::new(store.clone()),
            patients: Repository::new(store.clone()),
            relations: RelationshipService::new(store),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::auth::login,
        handlers::auth::me,
        handlers::users::create,
        handlers::users::list,
        handlers::users::get,
        handlers::users::update,
        handlers::users::delete,
        handlers::doctors::create,
        handlers::doctors::list,
        handlers::doctors::get,
        handlers::doctors::update,
        handlers::doctors::delete,
        handlers::doctors::add_patients,
        handlers::doctors::remove_patients,
        handlers::doctors::list_patients,
        handlers::doctors::patient_stats,
        handlers::patients::create,
        handlers::patients::list,
        handlers::patients::get,
        handlers::patients::update,
        handlers::patients::delete,
    ),
    components(schemas(
        handlers::HealthRes,
        handlers::auth::LoginReq,
        handlers::auth::TokenRes,
        handlers::users::CreateUserReq,
        handlers::users::UserBody,
        handlers::doctors::CreateDoctorReq,
        handlers::doctors::DoctorBody,
        handlers::doctors::PatientsChangeset,
        handlers::patients::CreatePatientReq,
        handlers::patients::PatientBody,
        medrec_core::Role,
        medrec_core::Genre,
        medrec_core::PatientStats,
        medrec_core::UserChangeset,
        medrec_core::DoctorChangeset,
        medrec_core::PatientChangeset,
    )),
    info(
        title = "medrec REST API",
        description = "Clinical records: users, doctors, patients and rosters."
    )
)]
pub struct ApiDoc;

/// Build the full application router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/me", get(handlers::auth::me))
        .route(
            "/users",
            post(handlers::users::create).get(handlers::users::list),
        )
        .route(
            "/users/:id",
            get(handlers::users::get)
                .put(handlers::users::update)
                .delete(handlers::users::delete),
        )
        .route(
            "/doctors",
            post(handlers::doctors::create).get(handlers::doctors::list),
        )
        .route(
            "/doctors/:id",
            get(handlers::doctors::get)
                .put(handlers::doctors::update)
                .delete(handlers::doctors::delete),
        )
        .route(
            "/doctors/:id/patients",
            patch(handlers::doctors::add_patients)
                .delete(handlers::doctors::remove_patients)
                .get(handlers::doctors::list_patients),
        )
        .route(
            "/doctors/:id/patients/stats",
            get(handlers::doctors::patient_stats),
        )
        .route(
            "/patients",
            post(handlers::patients::create).get(handlers::patients::list),
        )
        .route(
            "/patients/:id",
            get(handlers::patients::get)
                .patch(handlers::patients::update)
                .delete(handlers::patients::delete),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
