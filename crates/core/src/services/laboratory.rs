//! Completing a lab request together with its result.

use crate::auth::AuthContext;
use crate::backend::Backend;
use crate::constants::STATUS_FIELD;
use crate::error::{HmsError, HmsResult};
use crate::lifecycle::{authorise, validate_transition, LabRequestStatus};
use crate::models::{LabRequest, LabResult, LabResultDraft, Resource};
use crate::resources::ResourceManager;
use hms_types::RecordId;
use serde::Serialize;
use serde_json::json;

/// A completed request and the result that completed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedLab {
    pub request: LabRequest,
    pub result: LabResult,
}

pub struct LabWorkflow<'a, B> {
    backend: &'a B,
    auth: &'a AuthContext,
}

impl<'a, B: Backend> LabWorkflow<'a, B> {
    pub fn new(backend: &'a B, auth: &'a AuthContext) -> Self {
        Self { backend, auth }
    }

    /// Records `result` for lab request `request_id` and marks the request completed.
    ///
    /// If a result was already stored for the request (a previous attempt created it and then
    /// failed to update the status), that result is kept and only the status is updated.
    ///
    /// # Errors
    ///
    /// - [`HmsError::Validation`] if `result` is `None` or names a different request. Nothing is
    ///   fetched or stored in that case.
    /// - [`HmsError::NotFound`] if the request does not exist.
    /// - [`HmsError::InvalidTransition`] if the request is no longer pending.
    /// - [`HmsError::Forbidden`] if the session's role may not complete lab requests.
    pub async fn complete(
        &self,
        request_id: RecordId,
        result: Option<LabResultDraft>,
    ) -> HmsResult<CompletedLab> {
        let Some(draft) = result else {
            return Err(HmsError::Validation(format!(
                "lab request {request_id} cannot be completed without a result"
            )));
        };
        if draft.lab_request != request_id {
            return Err(HmsError::Validation(format!(
                "result is for lab request {}, not {request_id}",
                draft.lab_request
            )));
        }

        let request: LabRequest = self.backend.retrieve(self.auth, request_id).await?;
        validate_transition(request.status, LabRequestStatus::Completed)?;
        authorise(LabRequestStatus::Completed, self.auth.role())?;

        let results = ResourceManager::<LabResult, B>::new(self.backend, self.auth);
        let existing = results.by_request(request_id).await?;
        let result = match existing.into_iter().next() {
            Some(stored) => {
                tracing::warn!(
                    "lab request {} already has result {}; reusing it",
                    request_id,
                    stored.id
                );
                stored
            }
            None => results.create(&draft).await?,
        };

        let request: LabRequest = self
            .backend
            .patch(
                self.auth,
                request_id,
                &json!({ STATUS_FIELD: LabRequestStatus::Completed }),
            )
            .await?;
        tracing::info!(
            "{} {} completed with result {}",
            LabRequest::KIND,
            request_id,
            result.id
        );
        Ok(CompletedLab { request, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;
    use crate::models::ResourceKind;
    use hms_types::{NonEmptyText, Role};

    fn auth(role: Role) -> AuthContext {
        AuthContext::new(Some("token".into()), role, RecordId::new(1))
    }

    fn seeded(id: i64, status: &str) -> InMemoryBackend {
        let backend = InMemoryBackend::new();
        let request: LabRequest = serde_json::from_value(json!({
            "id": id, "patient_id": 5, "doctor_id": 3, "test_type": "urine", "status": status
        }))
        .expect("lab request");
        backend.seed(&request).expect("seed");
        backend
    }

    fn draft(request: i64) -> LabResultDraft {
        LabResultDraft::now(
            RecordId::new(request),
            NonEmptyText::new("Glucose 5.4 mmol/L").expect("details"),
        )
    }

    #[tokio::test]
    async fn completion_creates_exactly_one_result() {
        let backend = seeded(7, "pending");
        let auth = auth(Role::LabTechnician);

        let done = LabWorkflow::new(&backend, &auth)
            .complete(RecordId::new(7), Some(draft(7)))
            .await
            .expect("complete");

        assert_eq!(done.request.status, LabRequestStatus::Completed);
        assert_eq!(done.result.lab_request, RecordId::new(7));
        assert_eq!(backend.count(ResourceKind::LabResult), 1);
    }

    #[tokio::test]
    async fn missing_result_mutates_nothing() {
        let backend = seeded(7, "pending");
        let auth = auth(Role::LabTechnician);

        let err = LabWorkflow::new(&backend, &auth)
            .complete(RecordId::new(7), None)
            .await
            .expect_err("no payload");
        assert!(matches!(err, HmsError::Validation(_)));

        let stored: LabRequest = backend
            .retrieve(&auth, RecordId::new(7))
            .await
            .expect("request");
        assert_eq!(stored.status, LabRequestStatus::Pending);
        assert_eq!(backend.count(ResourceKind::LabResult), 0);
    }

    #[tokio::test]
    async fn result_for_another_request_is_rejected() {
        let backend = seeded(7, "pending");
        let auth = auth(Role::LabTechnician);

        let err = LabWorkflow::new(&backend, &auth)
            .complete(RecordId::new(7), Some(draft(8)))
            .await
            .expect_err("mismatched request");
        assert!(matches!(err, HmsError::Validation(msg) if msg.contains('8')));
    }

    #[tokio::test]
    async fn completed_request_cannot_be_completed_again() {
        let backend = seeded(7, "completed");
        let auth = auth(Role::LabTechnician);

        let err = LabWorkflow::new(&backend, &auth)
            .complete(RecordId::new(7), Some(draft(7)))
            .await
            .expect_err("already completed");
        assert!(matches!(err, HmsError::InvalidTransition { .. }));
        assert_eq!(backend.count(ResourceKind::LabResult), 0);
    }

    #[tokio::test]
    async fn doctors_cannot_complete_requests() {
        let backend = seeded(7, "pending");
        let auth = auth(Role::Doctor);

        let err = LabWorkflow::new(&backend, &auth)
            .complete(RecordId::new(7), Some(draft(7)))
            .await
            .expect_err("doctor");
        assert!(matches!(err, HmsError::Forbidden(_)));
        assert_eq!(backend.count(ResourceKind::LabResult), 0);
    }

    #[tokio::test]
    async fn existing_result_is_reused() {
        let backend = seeded(7, "pending");
        let auth = auth(Role::LabTechnician);
        let earlier: LabResult = backend.create(&auth, &draft(7)).await.expect("result");

        let done = LabWorkflow::new(&backend, &auth)
            .complete(RecordId::new(7), Some(draft(7)))
            .await
            .expect("complete");

        assert_eq!(done.result.id, earlier.id);
        assert_eq!(backend.count(ResourceKind::LabResult), 1);
    }
}
