//! Patient profiles and appointments.

use super::{Audit, Resource, ResourceKind, Tracked};
use crate::lifecycle::AppointmentStatus;
use chrono::{DateTime, NaiveDate, Utc};
use hms_types::{NonEmptyText, RecordId};
use serde::{Deserialize, Serialize};

/// Patient profile linked to a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: RecordId,
    pub user_id: RecordId,
    pub date_of_birth: NaiveDate,
    pub address: String,
    #[serde(default)]
    pub medical_history: String,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatientDraft {
    pub user_id: RecordId,
    pub date_of_birth: NaiveDate,
    pub address: NonEmptyText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
}

impl Resource for Patient {
    const KIND: ResourceKind = ResourceKind::Patient;
    type Draft = PatientDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn validate_draft(draft: &PatientDraft) -> crate::HmsResult<()> {
        check_birth_date(draft.date_of_birth)
    }

    fn validate_record(&self) -> crate::HmsResult<()> {
        check_birth_date(self.date_of_birth)
    }
}

fn check_birth_date(date_of_birth: NaiveDate) -> crate::HmsResult<()> {
    if date_of_birth > Utc::now().date_naive() {
        return Err(crate::HmsError::Validation(
            "date_of_birth cannot be in the future".into(),
        ));
    }
    Ok(())
}

/// Appointment booked by a patient with a doctor.
///
/// `patient` is the patient profile id; `doctor_id` is the doctor profile id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: RecordId,
    pub patient: RecordId,
    pub doctor_id: RecordId,
    pub appointment_date: DateTime<Utc>,
    pub reason: String,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppointmentDraft {
    pub patient: RecordId,
    pub doctor_id: RecordId,
    pub appointment_date: DateTime<Utc>,
    pub reason: NonEmptyText,
}

impl Resource for Appointment {
    const KIND: ResourceKind = ResourceKind::Appointment;
    type Draft = AppointmentDraft;

    fn id(&self) -> RecordId {
        self.id
    }
}

impl Tracked for Appointment {
    type Status = AppointmentStatus;

    fn status(&self) -> AppointmentStatus {
        self.status
    }
}
