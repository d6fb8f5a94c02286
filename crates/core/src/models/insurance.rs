//! Insurance contracts and the claims filed against them.

use super::{Audit, Resource, ResourceKind, Tracked};
use crate::error::{HmsError, HmsResult};
use crate::lifecycle::ClaimStatus;
use chrono::{DateTime, NaiveDate, Utc};
use hms_types::{NonEmptyText, RecordId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceContract {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub policy_number: String,
    pub provider: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub details: String,
    #[serde(flatten)]
    pub audit: Audit,
}

impl InsuranceContract {
    /// Whether `date` falls inside the contract period, both ends inclusive.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsuranceContractDraft {
    pub patient_id: RecordId,
    pub policy_number: NonEmptyText,
    pub provider: NonEmptyText,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Resource for InsuranceContract {
    const KIND: ResourceKind = ResourceKind::InsuranceContract;
    type Draft = InsuranceContractDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn validate_draft(draft: &InsuranceContractDraft) -> HmsResult<()> {
        check_contract(draft.policy_number.as_str(), draft.start_date, draft.end_date)
    }

    fn validate_record(&self) -> HmsResult<()> {
        check_contract(&self.policy_number, self.start_date, self.end_date)
    }
}

fn check_contract(
    policy_number: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> HmsResult<()> {
    if policy_number.trim().is_empty() || policy_number.chars().any(char::is_whitespace) {
        return Err(HmsError::Validation(
            "policy_number must be a single non-empty token".into(),
        ));
    }
    if end_date < start_date {
        return Err(HmsError::Validation(format!(
            "contract {policy_number} ends ({end_date}) before it starts ({start_date})"
        )));
    }
    Ok(())
}

/// Claim against a contract. `contract` is the contract id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceClaim {
    pub id: RecordId,
    pub contract: RecordId,
    pub amount: Decimal,
    pub claim_date: DateTime<Utc>,
    pub description: String,
    #[serde(default)]
    pub status: ClaimStatus,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsuranceClaimDraft {
    pub contract: RecordId,
    pub amount: Decimal,
    pub claim_date: DateTime<Utc>,
    pub description: NonEmptyText,
}

impl Resource for InsuranceClaim {
    const KIND: ResourceKind = ResourceKind::InsuranceClaim;
    type Draft = InsuranceClaimDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn validate_draft(draft: &InsuranceClaimDraft) -> HmsResult<()> {
        check_amount(draft.amount)
    }

    fn validate_record(&self) -> HmsResult<()> {
        check_amount(self.amount)
    }
}

fn check_amount(amount: Decimal) -> HmsResult<()> {
    if amount <= Decimal::ZERO {
        return Err(HmsError::Validation(format!(
            "claim amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

impl Tracked for InsuranceClaim {
    type Status = ClaimStatus;

    fn status(&self) -> ClaimStatus {
        self.status
    }
}
