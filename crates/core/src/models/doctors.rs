//! Doctor profiles and diagnoses.

use super::{Audit, Resource, ResourceKind};
use chrono::{DateTime, Utc};
use hms_types::{NonEmptyText, RecordId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: RecordId,
    pub user_id: RecordId,
    pub specialty: String,
    pub clinic: String,
    /// Free-text working hours, e.g. "Mon-Fri, 9AM-5PM".
    #[serde(default)]
    pub schedule: String,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DoctorDraft {
    pub user_id: RecordId,
    pub specialty: NonEmptyText,
    pub clinic: NonEmptyText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
}

impl Resource for Doctor {
    const KIND: ResourceKind = ResourceKind::Doctor;
    type Draft = DoctorDraft;

    fn id(&self) -> RecordId {
        self.id
    }
}

/// Diagnosis recorded by a doctor. `doctor` is the doctor profile id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub doctor: RecordId,
    pub diagnosis_date: DateTime<Utc>,
    pub description: String,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagnosisDraft {
    pub patient_id: RecordId,
    pub doctor: RecordId,
    pub diagnosis_date: DateTime<Utc>,
    pub description: NonEmptyText,
}

impl Resource for Diagnosis {
    const KIND: ResourceKind = ResourceKind::Diagnosis;
    type Draft = DiagnosisDraft;

    fn id(&self) -> RecordId {
        self.id
    }
}
