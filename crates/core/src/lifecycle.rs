//! Status lifecycles for appointments, lab requests, prescriptions and insurance claims.
//!
//! Each lifecycle is a closed enum with a single non-terminal state (`pending`) and a fixed set
//! of successors. The rule table lives here and nowhere else; callers ask
//! [`validate_transition`] (typed) or [`validate`] (wire strings) instead of comparing status
//! strings inline.
//!
//! | Resource       | Terminal              | Allowed from `pending`   |
//! |----------------|-----------------------|--------------------------|
//! | Appointment    | confirmed, cancelled  | confirmed, cancelled     |
//! | LabRequest     | completed, cancelled  | completed (with result)  |
//! | Prescription   | dispensed, cancelled  | dispensed, cancelled     |
//! | InsuranceClaim | approved, rejected    | approved, rejected       |
//!
//! Role permissions are a second table, checked by [`authorise`]. `admin` passes every check.

use crate::error::{HmsError, HmsResult};
use crate::models::ResourceKind;
use hms_types::Role;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A status enum with a transition table.
pub trait LifecycleStatus:
    Copy + Eq + fmt::Debug + fmt::Display + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Resource type this lifecycle belongs to.
    const KIND: ResourceKind;

    /// Every state, initial state first.
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;

    /// States reachable from `self` in one step. Empty for terminal states.
    fn successors(self) -> &'static [Self];

    /// Roles other than `admin` that may move a resource into this state.
    fn permitted_roles(self) -> &'static [Role];

    /// Whether entering this state needs an accompanying payload, so a bare status change
    /// must be refused.
    fn requires_payload(self) -> bool {
        false
    }

    fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    fn can_transition_to(self, target: Self) -> bool {
        self.successors().contains(&target)
    }

    /// Parses a wire status value for this lifecycle.
    fn parse(value: &str) -> HmsResult<Self> {
        let wanted = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| {
                HmsError::Validation(format!("unknown {} status: {value}", Self::KIND))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

impl LifecycleStatus for AppointmentStatus {
    const KIND: ResourceKind = ResourceKind::Appointment;
    const ALL: &'static [Self] = &[Self::Pending, Self::Confirmed, Self::Cancelled];

    fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    fn successors(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed | Self::Cancelled => &[],
        }
    }

    fn permitted_roles(self) -> &'static [Role] {
        match self {
            Self::Pending => &[],
            Self::Confirmed => &[Role::Doctor],
            Self::Cancelled => &[Role::Doctor, Role::Patient],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabRequestStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl LifecycleStatus for LabRequestStatus {
    const KIND: ResourceKind = ResourceKind::LabRequest;
    const ALL: &'static [Self] = &[Self::Pending, Self::Completed, Self::Cancelled];

    fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    // `cancelled` is a recognised terminal state that only the backend can set.
    fn successors(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Completed],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    fn permitted_roles(self) -> &'static [Role] {
        match self {
            Self::Completed => &[Role::LabTechnician],
            Self::Pending | Self::Cancelled => &[],
        }
    }

    fn requires_payload(self) -> bool {
        self == Self::Completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrescriptionStatus {
    #[default]
    Pending,
    Dispensed,
    Cancelled,
}

impl LifecycleStatus for PrescriptionStatus {
    const KIND: ResourceKind = ResourceKind::Prescription;
    const ALL: &'static [Self] = &[Self::Pending, Self::Dispensed, Self::Cancelled];

    fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Dispensed => "dispensed",
            Self::Cancelled => "cancelled",
        }
    }

    fn successors(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Dispensed, Self::Cancelled],
            Self::Dispensed | Self::Cancelled => &[],
        }
    }

    fn permitted_roles(self) -> &'static [Role] {
        match self {
            Self::Pending => &[],
            Self::Dispensed => &[Role::Pharmacist],
            Self::Cancelled => &[Role::Doctor, Role::Pharmacist],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl LifecycleStatus for ClaimStatus {
    const KIND: ResourceKind = ResourceKind::InsuranceClaim;
    const ALL: &'static [Self] = &[Self::Pending, Self::Approved, Self::Rejected];

    fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    fn successors(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Approved, Self::Rejected],
            Self::Approved | Self::Rejected => &[],
        }
    }

    fn permitted_roles(self) -> &'static [Role] {
        match self {
            Self::Pending => &[],
            Self::Approved | Self::Rejected => &[Role::InsuranceProvider],
        }
    }
}

macro_rules! display_as_wire_name {
    ($($status:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $status {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )+
    };
}

display_as_wire_name!(AppointmentStatus, LabRequestStatus, PrescriptionStatus, ClaimStatus);

/// Checks a typed transition against the rule table.
///
/// # Errors
///
/// Returns [`HmsError::InvalidTransition`] if `current` is terminal or `target` is not one of
/// its successors.
pub fn validate_transition<S: LifecycleStatus>(current: S, target: S) -> HmsResult<()> {
    if current.can_transition_to(target) {
        Ok(())
    } else {
        Err(HmsError::InvalidTransition {
            kind: S::KIND,
            from: current.as_str().to_string(),
            to: target.as_str().to_string(),
        })
    }
}

/// Checks a transition given as wire strings.
///
/// # Errors
///
/// - [`HmsError::Validation`] if `kind` has no lifecycle or either status is unknown for it.
/// - [`HmsError::InvalidTransition`] if the rule table forbids the move.
pub fn validate(kind: ResourceKind, current: &str, target: &str) -> HmsResult<()> {
    fn check<S: LifecycleStatus>(current: &str, target: &str) -> HmsResult<()> {
        validate_transition(S::parse(current)?, S::parse(target)?)
    }

    match kind {
        ResourceKind::Appointment => check::<AppointmentStatus>(current, target),
        ResourceKind::LabRequest => check::<LabRequestStatus>(current, target),
        ResourceKind::Prescription => check::<PrescriptionStatus>(current, target),
        ResourceKind::InsuranceClaim => check::<ClaimStatus>(current, target),
        other => Err(no_lifecycle(other)),
    }
}

/// Wire names of the states reachable from `current`.
pub fn allowed_targets(kind: ResourceKind, current: &str) -> HmsResult<Vec<&'static str>> {
    fn targets<S: LifecycleStatus>(current: &str) -> HmsResult<Vec<&'static str>> {
        Ok(S::parse(current)?
            .successors()
            .iter()
            .map(|s| s.as_str())
            .collect())
    }

    match kind {
        ResourceKind::Appointment => targets::<AppointmentStatus>(current),
        ResourceKind::LabRequest => targets::<LabRequestStatus>(current),
        ResourceKind::Prescription => targets::<PrescriptionStatus>(current),
        ResourceKind::InsuranceClaim => targets::<ClaimStatus>(current),
        other => Err(no_lifecycle(other)),
    }
}

/// Checks that `role` may move a resource into `target`.
///
/// # Errors
///
/// Returns [`HmsError::Forbidden`] when the role is neither `admin` nor listed for `target`.
pub fn authorise<S: LifecycleStatus>(target: S, role: Role) -> HmsResult<()> {
    if role == Role::Admin || target.permitted_roles().contains(&role) {
        Ok(())
    } else {
        Err(HmsError::Forbidden(format!(
            "role {role} may not mark a {} as {target}",
            S::KIND
        )))
    }
}

fn no_lifecycle(kind: ResourceKind) -> HmsError {
    HmsError::Validation(format!("{kind} has no status lifecycle"))
}
