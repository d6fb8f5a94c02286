//! Prescriptions and medicine inventory.

use super::{Audit, Resource, ResourceKind, Tracked};
use crate::error::{HmsError, HmsResult};
use crate::lifecycle::PrescriptionStatus;
use hms_types::{NonEmptyText, RecordId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Prescription written against a diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub doctor_id: RecordId,
    pub diagnosis_id: RecordId,
    /// Medicines and dosage, free text.
    pub details: String,
    #[serde(default)]
    pub status: PrescriptionStatus,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrescriptionDraft {
    pub patient_id: RecordId,
    pub doctor_id: RecordId,
    pub diagnosis_id: RecordId,
    pub details: NonEmptyText,
}

impl Resource for Prescription {
    const KIND: ResourceKind = ResourceKind::Prescription;
    type Draft = PrescriptionDraft;

    fn id(&self) -> RecordId {
        self.id
    }
}

impl Tracked for Prescription {
    type Status = PrescriptionStatus;

    fn status(&self) -> PrescriptionStatus {
        self.status
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub quantity: u32,
    /// Unit price with two decimal places.
    pub price: Decimal,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MedicineDraft {
    pub name: NonEmptyText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub quantity: u32,
    pub price: Decimal,
}

impl Resource for Medicine {
    const KIND: ResourceKind = ResourceKind::Medicine;
    type Draft = MedicineDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn validate_draft(draft: &MedicineDraft) -> HmsResult<()> {
        check_price(draft.name.as_str(), draft.price)
    }

    fn validate_record(&self) -> HmsResult<()> {
        check_price(&self.name, self.price)
    }
}

fn check_price(name: &str, price: Decimal) -> HmsResult<()> {
    if price.is_sign_negative() {
        return Err(HmsError::Validation(format!("price for {name} cannot be negative")));
    }
    if price.scale() > 2 {
        return Err(HmsError::Validation(format!(
            "price for {name} has more than two decimal places"
        )));
    }
    Ok(())
}
