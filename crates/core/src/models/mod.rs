//! Backend entities and their creation drafts.
//!
//! Modules are grouped the way the backend splits its services: patients (profiles and
//! appointments), doctors (profiles and diagnoses), pharmacy, laboratory and insurance.
//!
//! Persisted records use plain `String` fields because the backend may legitimately return blank
//! optional text. Drafts use [`NonEmptyText`](hms_types::NonEmptyText) for every required field,
//! so blank input is rejected before a request is made.

pub mod doctors;
pub mod insurance;
pub mod laboratory;
pub mod patients;
pub mod pharmacy;

pub use doctors::{Diagnosis, DiagnosisDraft, Doctor, DoctorDraft};
pub use insurance::{InsuranceClaim, InsuranceClaimDraft, InsuranceContract, InsuranceContractDraft};
pub use laboratory::{LabRequest, LabRequestDraft, LabResult, LabResultDraft};
pub use patients::{Appointment, AppointmentDraft, Patient, PatientDraft};
pub use pharmacy::{Medicine, MedicineDraft, Prescription, PrescriptionDraft};

use crate::error::{HmsError, HmsResult};
use crate::lifecycle::LifecycleStatus;
use chrono::{DateTime, Utc};
use hms_types::RecordId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every resource type the backend manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Patient,
    Doctor,
    Appointment,
    Diagnosis,
    Prescription,
    LabRequest,
    LabResult,
    Medicine,
    InsuranceContract,
    InsuranceClaim,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::Patient,
        ResourceKind::Doctor,
        ResourceKind::Appointment,
        ResourceKind::Diagnosis,
        ResourceKind::Prescription,
        ResourceKind::LabRequest,
        ResourceKind::LabResult,
        ResourceKind::Medicine,
        ResourceKind::InsuranceContract,
        ResourceKind::InsuranceClaim,
    ];

    /// Collection segment used in backend URLs.
    pub fn collection(self) -> &'static str {
        match self {
            ResourceKind::Patient => "patients",
            ResourceKind::Doctor => "doctors",
            ResourceKind::Appointment => "appointments",
            ResourceKind::Diagnosis => "diagnoses",
            ResourceKind::Prescription => "prescriptions",
            ResourceKind::LabRequest => "lab_requests",
            ResourceKind::LabResult => "lab_results",
            ResourceKind::Medicine => "medicines",
            ResourceKind::InsuranceContract => "insurance_contracts",
            ResourceKind::InsuranceClaim => "claims",
        }
    }

    /// Whether records of this kind carry a status lifecycle.
    pub fn has_lifecycle(self) -> bool {
        matches!(
            self,
            ResourceKind::Appointment
                | ResourceKind::LabRequest
                | ResourceKind::Prescription
                | ResourceKind::InsuranceClaim
        )
    }

    fn label(self) -> &'static str {
        match self {
            ResourceKind::Patient => "patient",
            ResourceKind::Doctor => "doctor",
            ResourceKind::Appointment => "appointment",
            ResourceKind::Diagnosis => "diagnosis",
            ResourceKind::Prescription => "prescription",
            ResourceKind::LabRequest => "lab request",
            ResourceKind::LabResult => "lab result",
            ResourceKind::Medicine => "medicine",
            ResourceKind::InsuranceContract => "insurance contract",
            ResourceKind::InsuranceClaim => "insurance claim",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ResourceKind {
    type Err = HmsError;

    /// Accepts the collection name (`lab_requests`), the singular snake or kebab form
    /// (`lab_request`, `lab-request`) and the label (`lab request`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        ResourceKind::ALL
            .into_iter()
            .find(|kind| {
                kind.collection() == wanted || kind.label().replace(' ', "_") == wanted
            })
            .ok_or_else(|| HmsError::Validation(format!("unknown resource type: {s}")))
    }
}

/// Server-maintained bookkeeping timestamps present on every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A backend-managed entity.
pub trait Resource: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    const KIND: ResourceKind;

    /// Payload accepted by the create endpoint.
    type Draft: Serialize + DeserializeOwned + fmt::Debug + Send + Sync;

    fn id(&self) -> RecordId;

    /// Semantic checks a draft must pass before it is submitted.
    ///
    /// Field presence is already guaranteed by the draft's types; this covers cross-field rules.
    fn validate_draft(_draft: &Self::Draft) -> HmsResult<()> {
        Ok(())
    }

    /// The same rules, applied to a stored record after a partial update has been merged in.
    fn validate_record(&self) -> HmsResult<()> {
        Ok(())
    }
}

/// A resource whose `status` field follows a lifecycle.
pub trait Tracked: Resource {
    type Status: LifecycleStatus;

    fn status(&self) -> Self::Status;
}
