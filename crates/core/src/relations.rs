//! Doctor ↔ patient roster management.
//!
//! The doctor is the anchor of the relationship: roster operations fail with
//! [`RecordError::DoctorNotFound`] when the doctor is missing, while patient
//! ids that do not resolve to an active patient are silently skipped. That
//! asymmetry is deliberate — the anchor must exist, the referenced records
//! are best-effort.
//!
//! Membership changes go through the store's set-atomic operators rather than
//! a read-modify-write of the whole array, so two concurrent roster updates
//! against the same doctor cannot lose each other's change.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{RecordError, RecordResult};
use crate::models::{Doctor, Genre, Patient};
use crate::repository::{LookupKey, Repository, DEFAULT_LIST_LIMIT};
use crate::store::{DocumentStore, Filter, Update};

/// Read-side roster aggregate, recomputed on every call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct PatientStats {
    pub masc: usize,
    pub fem: usize,
    pub total: usize,
}

#[derive(Clone)]
pub struct RelationshipService {
    doctors: Repository<Doctor>,
    patients: Repository<Patient>,
}

impl RelationshipService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            doctors: Repository::new(store.clone()),
            patients: Repository::new(store),
        }
    }

    /// Add patients to a doctor's roster.
    ///
    /// Ids that do not resolve to an active patient, or that are already on
    /// the roster, are skipped; adding twice is a no-op, not an error.
    pub fn add_patients(&self, doctor_id: Uuid, patient_ids: &[Uuid]) -> RecordResult<Doctor> {
        let doctor = self.require_doctor(doctor_id)?;

        let mut additions: Vec<Value> = Vec::new();
        for patient_id in patient_ids {
            if doctor.patients.contains(patient_id) {
                continue;
            }
            if self.patients.get(LookupKey::Id(*patient_id), true)?.is_none() {
                tracing::debug!(%doctor_id, %patient_id, "skipping unknown patient id");
                continue;
            }
            let value = Value::String(patient_id.to_string());
            if !additions.contains(&value) {
                additions.push(value);
            }
        }

        self.doctors
            .update_with(
                LookupKey::Id(doctor_id),
                Update::new().add_to_set("patients", additions),
            )?
            .ok_or(RecordError::DoctorNotFound(doctor_id))
    }

    /// Remove patients from a doctor's roster. Ids not on the roster are
    /// silently ignored.
    pub fn remove_patients(&self, doctor_id: Uuid, patient_ids: &[Uuid]) -> RecordResult<Doctor> {
        self.require_doctor(doctor_id)?;

        let removals = patient_ids
            .iter()
            .map(|id| Value::String(id.to_string()))
            .collect();
        self.doctors
            .update_with(
                LookupKey::Id(doctor_id),
                Update::new().pull_all("patients", removals),
            )?
            .ok_or(RecordError::DoctorNotFound(doctor_id))
    }

    /// List the doctor's patients, intersecting the roster with `filter`.
    pub fn list_patients(
        &self,
        doctor_id: Uuid,
        filter: Filter,
        limit: usize,
    ) -> RecordResult<Vec<Patient>> {
        let doctor = self.require_doctor(doctor_id)?;
        let member_ids = doctor
            .patients
            .iter()
            .map(|id| Value::String(id.to_string()))
            .collect();
        self.patients.list(filter.is_in("_id", member_ids), limit)
    }

    /// Genre breakdown of the doctor's full roster. A full re-scan on every
    /// call; the listing cap bounds the cost.
    pub fn patient_stats(&self, doctor_id: Uuid) -> RecordResult<PatientStats> {
        let roster = self.list_patients(doctor_id, Filter::new(), DEFAULT_LIST_LIMIT)?;

        let masc = roster.iter().filter(|p| p.genre == Genre::Masc).count();
        let fem = roster.iter().filter(|p| p.genre == Genre::Fem).count();
        Ok(PatientStats {
            masc,
            fem,
            total: roster.len(),
        })
    }

    fn require_doctor(&self, doctor_id: Uuid) -> RecordResult<Doctor> {
        self.doctors
            .get(LookupKey::Id(doctor_id), true)?
            .ok_or(RecordError::DoctorNotFound(doctor_id))
    }
}
