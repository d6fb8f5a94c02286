//! Status changes against the backend.
//!
//! A transition is checked in a fixed order: the record must exist, the move must be in the
//! lifecycle table, the target must not need an accompanying payload, and the acting role must
//! be allowed to make it. Only then is `{"status": ...}` sent. Any failure leaves the stored
//! record untouched.

use crate::auth::AuthContext;
use crate::backend::Backend;
use crate::constants::STATUS_FIELD;
use crate::error::{HmsError, HmsResult};
use crate::lifecycle::{authorise, validate_transition, LifecycleStatus};
use crate::models::{Appointment, InsuranceClaim, LabRequest, Prescription, ResourceKind, Tracked};
use hms_types::RecordId;
use serde::Serialize;
use serde_json::json;

/// What a string-addressed transition did, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    pub kind: ResourceKind,
    pub id: RecordId,
    pub from: String,
    pub to: String,
}

pub struct StatusTransitions<'a, B> {
    backend: &'a B,
    auth: &'a AuthContext,
}

impl<'a, B: Backend> StatusTransitions<'a, B> {
    pub fn new(backend: &'a B, auth: &'a AuthContext) -> Self {
        Self { backend, auth }
    }

    /// Moves record `id` of `R` into `target` and returns the updated record.
    ///
    /// # Errors
    ///
    /// - [`HmsError::NotFound`] if the record does not exist.
    /// - [`HmsError::InvalidTransition`] if the lifecycle forbids the move.
    /// - [`HmsError::Validation`] if `target` needs a payload (lab completion needs a result;
    ///   use [`LabWorkflow`](super::LabWorkflow)).
    /// - [`HmsError::Forbidden`] if the session's role may not make the move.
    pub async fn transition<R: Tracked>(&self, id: RecordId, target: R::Status) -> HmsResult<R> {
        self.apply::<R>(id, target).await.map(|(_, updated)| updated)
    }

    /// [`transition`](Self::transition) addressed by resource kind and wire status name.
    pub async fn transition_named(
        &self,
        kind: ResourceKind,
        id: RecordId,
        target: &str,
    ) -> HmsResult<TransitionOutcome> {
        match kind {
            ResourceKind::Appointment => self.named::<Appointment>(id, target).await,
            ResourceKind::LabRequest => self.named::<LabRequest>(id, target).await,
            ResourceKind::Prescription => self.named::<Prescription>(id, target).await,
            ResourceKind::InsuranceClaim => self.named::<InsuranceClaim>(id, target).await,
            other => Err(HmsError::Validation(format!(
                "{other} has no status lifecycle"
            ))),
        }
    }

    async fn named<R: Tracked>(&self, id: RecordId, target: &str) -> HmsResult<TransitionOutcome> {
        let target = R::Status::parse(target)?;
        let (from, updated) = self.apply::<R>(id, target).await?;
        Ok(TransitionOutcome {
            kind: R::KIND,
            id,
            from: from.as_str().to_string(),
            to: updated.status().as_str().to_string(),
        })
    }

    async fn apply<R: Tracked>(
        &self,
        id: RecordId,
        target: R::Status,
    ) -> HmsResult<(R::Status, R)> {
        let current: R = self.backend.retrieve(self.auth, id).await?;
        let from = current.status();

        validate_transition(from, target)?;
        if target.requires_payload() {
            return Err(HmsError::Validation(format!(
                "{} {id} cannot be marked {target} without a result",
                R::KIND
            )));
        }
        authorise(target, self.auth.role())?;

        let updated: R = self
            .backend
            .patch(self.auth, id, &json!({ STATUS_FIELD: target }))
            .await?;
        tracing::info!("{} {} status {} -> {}", R::KIND, id, from, updated.status());
        Ok((from, updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{AppointmentStatus, ClaimStatus, LabRequestStatus, PrescriptionStatus};
    use crate::memory::InMemoryBackend;
    use hms_types::Role;
    use serde_json::json;

    fn auth(role: Role) -> AuthContext {
        AuthContext::new(Some("token".into()), role, RecordId::new(1))
    }

    fn seed_appointment(backend: &InMemoryBackend, id: i64) {
        let appointment: Appointment = serde_json::from_value(json!({
            "id": id, "patient": 5, "doctor_id": 3,
            "appointment_date": "2025-05-02T09:30:00Z", "reason": "Check-up",
            "status": "pending"
        }))
        .expect("appointment");
        backend.seed(&appointment).expect("seed");
    }

    fn seed_lab_request(backend: &InMemoryBackend, id: i64) {
        let request: LabRequest = serde_json::from_value(json!({
            "id": id, "patient_id": 5, "doctor_id": 3, "test_type": "blood", "status": "pending"
        }))
        .expect("lab request");
        backend.seed(&request).expect("seed");
    }

    #[tokio::test]
    async fn cancelled_appointment_cannot_be_confirmed() {
        let backend = InMemoryBackend::new();
        seed_appointment(&backend, 42);
        let auth = auth(Role::Doctor);
        let transitions = StatusTransitions::new(&backend, &auth);

        let cancelled: Appointment = transitions
            .transition(RecordId::new(42), AppointmentStatus::Cancelled)
            .await
            .expect("cancel");
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

        let err = transitions
            .transition::<Appointment>(RecordId::new(42), AppointmentStatus::Confirmed)
            .await
            .expect_err("cancelled is terminal");
        assert!(matches!(err, HmsError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn repeated_confirmation_is_rejected() {
        let backend = InMemoryBackend::new();
        seed_appointment(&backend, 1);
        let auth = auth(Role::Doctor);
        let transitions = StatusTransitions::new(&backend, &auth);

        let outcome = transitions
            .transition_named(ResourceKind::Appointment, RecordId::new(1), "confirmed")
            .await
            .expect("first confirmation");
        assert_eq!(outcome.from, "pending");
        assert_eq!(outcome.to, "confirmed");

        let err = transitions
            .transition_named(ResourceKind::Appointment, RecordId::new(1), "confirmed")
            .await
            .expect_err("second confirmation");
        assert!(matches!(err, HmsError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn lab_completion_without_result_is_rejected() {
        let backend = InMemoryBackend::new();
        seed_lab_request(&backend, 7);
        let auth = auth(Role::LabTechnician);
        let transitions = StatusTransitions::new(&backend, &auth);

        let err = transitions
            .transition::<LabRequest>(RecordId::new(7), LabRequestStatus::Completed)
            .await
            .expect_err("needs a result");
        assert!(matches!(err, HmsError::Validation(_)));

        let stored: LabRequest = backend
            .retrieve(&auth, RecordId::new(7))
            .await
            .expect("request");
        assert_eq!(stored.status, LabRequestStatus::Pending);
    }

    #[tokio::test]
    async fn forbidden_role_leaves_status_unchanged() {
        let backend = InMemoryBackend::new();
        let claim: InsuranceClaim = serde_json::from_value(json!({
            "id": 3, "contract": 1, "amount": "120.50",
            "claim_date": "2025-03-01T10:00:00Z", "description": "X-ray"
        }))
        .expect("claim");
        backend.seed(&claim).expect("seed");
        let patient = auth(Role::Patient);

        let err = StatusTransitions::new(&backend, &patient)
            .transition::<InsuranceClaim>(RecordId::new(3), ClaimStatus::Approved)
            .await
            .expect_err("patients cannot approve claims");
        assert!(matches!(err, HmsError::Forbidden(_)));

        let stored: InsuranceClaim = backend
            .retrieve(&patient, RecordId::new(3))
            .await
            .expect("claim");
        assert_eq!(stored.status, ClaimStatus::Pending);

        let provider = auth(Role::InsuranceProvider);
        let approved: InsuranceClaim = StatusTransitions::new(&backend, &provider)
            .transition(RecordId::new(3), ClaimStatus::Approved)
            .await
            .expect("provider approves");
        assert_eq!(approved.status, ClaimStatus::Approved);
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let backend = InMemoryBackend::new();
        let auth = auth(Role::Admin);
        let err = StatusTransitions::new(&backend, &auth)
            .transition::<Prescription>(RecordId::new(9), PrescriptionStatus::Dispensed)
            .await
            .expect_err("missing");
        assert!(matches!(err, HmsError::NotFound { kind: ResourceKind::Prescription, .. }));
    }

    #[tokio::test]
    async fn named_transition_rejects_unknown_targets() {
        let backend = InMemoryBackend::new();
        seed_appointment(&backend, 1);
        let auth = auth(Role::Admin);
        let transitions = StatusTransitions::new(&backend, &auth);

        let err = transitions
            .transition_named(ResourceKind::Appointment, RecordId::new(1), "rescheduled")
            .await
            .expect_err("unknown status");
        assert!(matches!(err, HmsError::Validation(_)));

        let err = transitions
            .transition_named(ResourceKind::Medicine, RecordId::new(1), "pending")
            .await
            .expect_err("no lifecycle");
        assert!(matches!(err, HmsError::Validation(_)));
    }
}
