//! Workflows that span more than one backend call.

pub mod laboratory;
pub mod pharmacy;
pub mod transitions;

pub use laboratory::{CompletedLab, LabWorkflow};
pub use pharmacy::{Pharmacy, Receipt, ReceiptLine};
pub use transitions::{StatusTransitions, TransitionOutcome};
