//! Entity models and their changesets.
//!
//! Doctors are not a separate collection: a doctor is a `users` document whose
//! `role` tag is `doctor`, carrying the extra professional fields. Keeping one
//! collection keeps storage and queries uniform across roles.

pub mod doctor;
pub mod patient;
pub mod user;

pub use doctor::{Doctor, DoctorChangeset};
pub use patient::{Genre, Patient, PatientChangeset};
pub use user::{Role, User, UserChangeset};
