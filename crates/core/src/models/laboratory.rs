//! Lab requests and their results.
//!
//! A result should exist exactly when its request is `completed`. The backend does not enforce
//! this, so completion goes through `services::LabWorkflow`, which creates the result and moves
//! the request in one operation.

use super::{Audit, Resource, ResourceKind, Tracked};
use crate::lifecycle::LabRequestStatus;
use chrono::{DateTime, Utc};
use hms_types::{NonEmptyText, RecordId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabRequest {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub doctor_id: RecordId,
    /// Kind of test, e.g. "blood" or "urine".
    pub test_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: LabRequestStatus,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabRequestDraft {
    pub patient_id: RecordId,
    pub doctor_id: RecordId,
    pub test_type: NonEmptyText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Resource for LabRequest {
    const KIND: ResourceKind = ResourceKind::LabRequest;
    type Draft = LabRequestDraft;

    fn id(&self) -> RecordId {
        self.id
    }
}

impl Tracked for LabRequest {
    type Status = LabRequestStatus;

    fn status(&self) -> LabRequestStatus {
        self.status
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabResult {
    pub id: RecordId,
    pub lab_request: RecordId,
    pub result_date: DateTime<Utc>,
    pub details: String,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabResultDraft {
    pub lab_request: RecordId,
    pub result_date: DateTime<Utc>,
    pub details: NonEmptyText,
}

impl LabResultDraft {
    /// Draft dated now.
    pub fn now(lab_request: RecordId, details: NonEmptyText) -> Self {
        Self {
            lab_request,
            result_date: Utc::now(),
            details,
        }
    }
}

impl Resource for LabResult {
    const KIND: ResourceKind = ResourceKind::LabResult;
    type Draft = LabResultDraft;

    fn id(&self) -> RecordId {
        self.id
    }
}
