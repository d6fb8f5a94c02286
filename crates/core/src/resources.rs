//! One generic manager for every backend collection.
//!
//! Each resource page used to carry its own copy of list/create/edit/delete. [`ResourceManager`]
//! is the single version: it binds a backend and a session to one resource type, validates
//! drafts before they are sent, and adds the foreign-key filters pages need.

use crate::auth::AuthContext;
use crate::backend::{Backend, Filter};
use crate::error::{HmsError, HmsResult};
use crate::lifecycle::LifecycleStatus;
use crate::models::{
    Appointment, Diagnosis, InsuranceClaim, InsuranceContract, LabRequest, LabResult,
    Prescription, Resource, Tracked,
};
use hms_types::RecordId;
use serde_json::Value;
use std::marker::PhantomData;

pub struct ResourceManager<'a, R, B> {
    backend: &'a B,
    auth: &'a AuthContext,
    _resource: PhantomData<fn() -> R>,
}

impl<'a, R, B> ResourceManager<'a, R, B>
where
    R: Resource,
    B: Backend,
{
    pub fn new(backend: &'a B, auth: &'a AuthContext) -> Self {
        Self {
            backend,
            auth,
            _resource: PhantomData,
        }
    }

    pub fn auth(&self) -> &AuthContext {
        self.auth
    }

    pub async fn list(&self) -> HmsResult<Vec<R>> {
        self.backend.list(self.auth).await
    }

    /// Lists records matching `filter`.
    ///
    /// The filter is sent to the backend and applied again to what comes back, because a
    /// backend may ignore query parameters it does not recognise.
    pub async fn list_filtered(&self, filter: &Filter) -> HmsResult<Vec<R>> {
        let records: Vec<R> = self.backend.list_filtered(self.auth, filter).await?;
        if filter.is_empty() {
            return Ok(records);
        }

        let mut kept = Vec::with_capacity(records.len());
        for record in records {
            let wire = serde_json::to_value(&record)
                .map_err(|e| HmsError::Validation(e.to_string()))?;
            if filter.matches(&wire) {
                kept.push(record);
            }
        }
        Ok(kept)
    }

    pub async fn get(&self, id: RecordId) -> HmsResult<R> {
        self.backend.retrieve(self.auth, id).await
    }

    /// Validates `draft` and creates the record.
    ///
    /// # Errors
    ///
    /// Returns [`HmsError::Validation`] without contacting the backend if the draft fails
    /// [`Resource::validate_draft`].
    pub async fn create(&self, draft: &R::Draft) -> HmsResult<R> {
        R::validate_draft(draft)?;
        let created: R = self.backend.create(self.auth, draft).await?;
        tracing::info!("created {} {}", R::KIND, created.id());
        Ok(created)
    }

    /// Partially updates a record.
    ///
    /// Status changes are refused here; they go through
    /// [`StatusTransitions`](crate::services::StatusTransitions) so the lifecycle rules apply.
    ///
    /// # Errors
    ///
    /// Returns [`HmsError::Validation`] without writing if the body is not a non-empty object,
    /// or if the current record with `fields` merged in fails [`Resource::validate_record`].
    pub async fn update(&self, id: RecordId, fields: &Value) -> HmsResult<R> {
        let Some(object) = fields.as_object() else {
            return Err(HmsError::Validation("update must be a JSON object".into()));
        };
        if object.is_empty() {
            return Err(HmsError::Validation("update has no fields".into()));
        }
        if R::KIND.has_lifecycle() && object.contains_key(crate::constants::STATUS_FIELD) {
            return Err(HmsError::Validation(format!(
                "{} status must be changed through a transition",
                R::KIND
            )));
        }

        let current = self.get(id).await?;
        let mut merged =
            serde_json::to_value(&current).map_err(|e| HmsError::Validation(e.to_string()))?;
        if let Some(record) = merged.as_object_mut() {
            for (key, value) in object {
                if key != "id" {
                    record.insert(key.clone(), value.clone());
                }
            }
        }
        let candidate: R = serde_json::from_value(merged)
            .map_err(|e| HmsError::Validation(format!("invalid {} update: {e}", R::KIND)))?;
        candidate.validate_record()?;

        let updated = self.backend.patch(self.auth, id, fields).await?;
        tracing::info!("updated {} {}", R::KIND, id);
        Ok(updated)
    }

    pub async fn delete(&self, id: RecordId) -> HmsResult<()> {
        self.backend.delete::<R>(self.auth, id).await?;
        tracing::info!("deleted {} {}", R::KIND, id);
        Ok(())
    }
}

impl<R, B> ResourceManager<'_, R, B>
where
    R: Tracked,
    B: Backend,
{
    /// Records still in the initial state.
    pub async fn pending(&self) -> HmsResult<Vec<R>> {
        let initial = <R::Status as LifecycleStatus>::ALL[0];
        self.list_filtered(&Filter::none().eq(crate::constants::STATUS_FIELD, initial))
            .await
    }

    pub async fn with_status(&self, status: R::Status) -> HmsResult<Vec<R>> {
        self.list_filtered(&Filter::none().eq(crate::constants::STATUS_FIELD, status))
            .await
    }
}

macro_rules! filter_helper {
    ($resource:ty, $name:ident, $field:literal) => {
        impl<B: Backend> ResourceManager<'_, $resource, B> {
            #[doc = concat!("Records whose `", $field, "` is `id`.")]
            pub async fn $name(&self, id: RecordId) -> HmsResult<Vec<$resource>> {
                self.list_filtered(&Filter::none().eq($field, id)).await
            }
        }
    };
}

filter_helper!(Appointment, by_patient, "patient");
filter_helper!(Appointment, by_doctor, "doctor_id");
filter_helper!(Diagnosis, by_patient, "patient_id");
filter_helper!(Diagnosis, by_doctor, "doctor");
filter_helper!(Prescription, by_patient, "patient_id");
filter_helper!(Prescription, by_diagnosis, "diagnosis_id");
filter_helper!(LabRequest, by_patient, "patient_id");
filter_helper!(LabRequest, by_doctor, "doctor_id");
filter_helper!(LabResult, by_request, "lab_request");
filter_helper!(InsuranceContract, by_patient, "patient_id");
filter_helper!(InsuranceClaim, by_contract, "contract");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::AppointmentStatus;
    use crate::memory::InMemoryBackend;
    use crate::models::{
        AppointmentDraft, InsuranceContractDraft, Medicine, MedicineDraft, Patient, PatientDraft,
    };
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use hms_types::{NonEmptyText, Role};
    use serde_json::json;

    fn admin() -> AuthContext {
        AuthContext::new(Some("token".into()), Role::Admin, RecordId::new(1))
    }

    fn appointment_draft(patient: i64, doctor: i64) -> AppointmentDraft {
        AppointmentDraft {
            patient: RecordId::new(patient),
            doctor_id: RecordId::new(doctor),
            appointment_date: Utc.with_ymd_and_hms(2025, 5, 2, 9, 30, 0).unwrap(),
            reason: NonEmptyText::new("Follow-up").expect("reason"),
        }
    }

    #[tokio::test]
    async fn create_rejects_invalid_draft_before_backend() {
        let backend = InMemoryBackend::new();
        let auth = admin();
        let patients = ResourceManager::<Patient, _>::new(&backend, &auth);

        let draft = PatientDraft {
            user_id: RecordId::new(9),
            date_of_birth: Utc::now().date_naive() + Duration::days(2),
            address: NonEmptyText::new("1 High Street").expect("address"),
            medical_history: None,
        };
        let err = patients.create(&draft).await.expect_err("future birth date");
        assert!(matches!(err, HmsError::Validation(_)));
        assert_eq!(backend.count(Patient::KIND), 0);

        let draft = PatientDraft {
            date_of_birth: NaiveDate::from_ymd_opt(1980, 4, 1).expect("date"),
            ..draft
        };
        let created = patients.create(&draft).await.expect("valid draft");
        assert_eq!(patients.get(created.id).await.expect("get"), created);
    }

    #[tokio::test]
    async fn typed_filters_select_by_foreign_key() {
        let backend = InMemoryBackend::new();
        let auth = admin();
        let appointments = ResourceManager::<Appointment, _>::new(&backend, &auth);

        for (patient, doctor) in [(5, 3), (6, 3), (5, 4)] {
            appointments
                .create(&appointment_draft(patient, doctor))
                .await
                .expect("create");
        }

        let for_patient = appointments.by_patient(RecordId::new(5)).await.expect("list");
        assert_eq!(for_patient.len(), 2);
        let for_doctor = appointments.by_doctor(RecordId::new(3)).await.expect("list");
        assert_eq!(for_doctor.len(), 2);
        assert_eq!(appointments.pending().await.expect("pending").len(), 3);
        assert!(appointments
            .with_status(AppointmentStatus::Confirmed)
            .await
            .expect("confirmed")
            .is_empty());
    }

    #[tokio::test]
    async fn update_refuses_status_changes() {
        let backend = InMemoryBackend::new();
        let auth = admin();
        let appointments = ResourceManager::<Appointment, _>::new(&backend, &auth);
        let created = appointments
            .create(&appointment_draft(5, 3))
            .await
            .expect("create");

        let err = appointments
            .update(created.id, &json!({"status": "confirmed"}))
            .await
            .expect_err("status patch");
        assert!(matches!(err, HmsError::Validation(_)));

        let updated = appointments
            .update(created.id, &json!({"reason": "Annual check"}))
            .await
            .expect("reason patch");
        assert_eq!(updated.reason, "Annual check");
        assert_eq!(updated.status, AppointmentStatus::Pending);
    }

    #[tokio::test]
    async fn update_rechecks_the_merged_record() {
        let backend = InMemoryBackend::new();
        let auth = admin();

        let medicines = ResourceManager::<Medicine, _>::new(&backend, &auth);
        let medicine = medicines
            .create(&MedicineDraft {
                name: NonEmptyText::new("Ibuprofen").expect("name"),
                description: None,
                quantity: 10,
                price: "4.20".parse().expect("price"),
            })
            .await
            .expect("medicine");
        let err = medicines
            .update(medicine.id, &json!({"price": "-1.00"}))
            .await
            .expect_err("negative price");
        assert!(matches!(err, HmsError::Validation(_)));
        assert_eq!(medicines.get(medicine.id).await.expect("get").price, medicine.price);

        let contracts = ResourceManager::<InsuranceContract, _>::new(&backend, &auth);
        let contract = contracts
            .create(&InsuranceContractDraft {
                patient_id: RecordId::new(5),
                policy_number: NonEmptyText::new("POL-7").expect("policy"),
                provider: NonEmptyText::new("Acme").expect("provider"),
                start_date: NaiveDate::from_ymd_opt(2025, 1, 1).expect("date"),
                end_date: NaiveDate::from_ymd_opt(2025, 12, 31).expect("date"),
                details: None,
            })
            .await
            .expect("contract");
        let err = contracts
            .update(contract.id, &json!({"end_date": "2024-06-30"}))
            .await
            .expect_err("ends before start");
        assert!(matches!(err, HmsError::Validation(_)));

        let extended = contracts
            .update(contract.id, &json!({"end_date": "2026-12-31"}))
            .await
            .expect("extend");
        assert_eq!(extended.end_date, NaiveDate::from_ymd_opt(2026, 12, 31).expect("date"));

        let err = contracts
            .update(RecordId::new(999), &json!({"details": "n/a"}))
            .await
            .expect_err("missing");
        assert!(matches!(err, HmsError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let backend = InMemoryBackend::new();
        let auth = admin();
        let appointments = ResourceManager::<Appointment, _>::new(&backend, &auth);
        let created = appointments
            .create(&appointment_draft(5, 3))
            .await
            .expect("create");

        appointments.delete(created.id).await.expect("delete");
        let err = appointments.get(created.id).await.expect_err("deleted");
        assert!(matches!(err, HmsError::NotFound { .. }));
    }
}
