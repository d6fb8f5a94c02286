//! Medicine purchases and prescription dispensing.
//!
//! Stock is decremented with a read-then-write against the backend. There is no
//! compare-and-swap, so two sessions buying the last units at once can both succeed.

use super::transitions::StatusTransitions;
use crate::auth::AuthContext;
use crate::backend::Backend;
use crate::constants::QUANTITY_FIELD;
use crate::error::{HmsError, HmsResult};
use crate::lifecycle::PrescriptionStatus;
use crate::models::{Medicine, Prescription};
use hms_types::RecordId;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptLine {
    pub medicine: RecordId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    /// Stock left after this purchase.
    pub remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub lines: Vec<ReceiptLine>,
    pub total: Decimal,
}

pub struct Pharmacy<'a, B> {
    backend: &'a B,
    auth: &'a AuthContext,
}

impl<'a, B: Backend> Pharmacy<'a, B> {
    pub fn new(backend: &'a B, auth: &'a AuthContext) -> Self {
        Self { backend, auth }
    }

    /// Buys `quantity` units of one medicine and returns the updated stock record.
    ///
    /// # Errors
    ///
    /// - [`HmsError::Validation`] if `quantity` is zero.
    /// - [`HmsError::NotFound`] if the medicine does not exist.
    /// - [`HmsError::InsufficientStock`] if fewer than `quantity` units are in stock. The stored
    ///   quantity is left as it was.
    pub async fn purchase(&self, medicine_id: RecordId, quantity: u32) -> HmsResult<Medicine> {
        check_quantity(medicine_id, quantity)?;
        let medicine: Medicine = self.backend.retrieve(self.auth, medicine_id).await?;
        let remaining = remaining_after(&medicine, quantity)?;
        self.set_stock(medicine_id, remaining).await
    }

    /// Buys every line of `cart` (medicine id to quantity).
    ///
    /// All lines are checked against current stock before any is decremented, so a shortfall on
    /// one line leaves every medicine's stock as it was.
    pub async fn purchase_cart(&self, cart: &BTreeMap<RecordId, u32>) -> HmsResult<Receipt> {
        if cart.is_empty() {
            return Err(HmsError::Validation("cart is empty".into()));
        }

        let mut planned = Vec::with_capacity(cart.len());
        for (&medicine_id, &quantity) in cart {
            check_quantity(medicine_id, quantity)?;
            let medicine: Medicine = self.backend.retrieve(self.auth, medicine_id).await?;
            let remaining = remaining_after(&medicine, quantity)?;
            planned.push((medicine, quantity, remaining));
        }

        let mut lines = Vec::with_capacity(planned.len());
        for (medicine, quantity, remaining) in planned {
            let updated = self.set_stock(medicine.id, remaining).await?;
            lines.push(ReceiptLine {
                medicine: medicine.id,
                name: medicine.name,
                quantity,
                unit_price: medicine.price,
                line_total: medicine.price * Decimal::from(quantity),
                remaining: updated.quantity,
            });
        }

        let total = lines.iter().map(|line| line.line_total).sum();
        Ok(Receipt { lines, total })
    }

    /// Marks a prescription dispensed.
    pub async fn dispense(&self, prescription_id: RecordId) -> HmsResult<Prescription> {
        StatusTransitions::new(self.backend, self.auth)
            .transition(prescription_id, PrescriptionStatus::Dispensed)
            .await
    }

    async fn set_stock(&self, medicine_id: RecordId, quantity: u32) -> HmsResult<Medicine> {
        let updated: Medicine = self
            .backend
            .patch(self.auth, medicine_id, &json!({ QUANTITY_FIELD: quantity }))
            .await?;
        tracing::info!("medicine {} stock now {}", medicine_id, updated.quantity);
        Ok(updated)
    }
}

fn check_quantity(medicine_id: RecordId, quantity: u32) -> HmsResult<()> {
    if quantity == 0 {
        return Err(HmsError::Validation(format!(
            "purchase quantity for medicine {medicine_id} must be at least 1"
        )));
    }
    Ok(())
}

fn remaining_after(medicine: &Medicine, quantity: u32) -> HmsResult<u32> {
    medicine
        .quantity
        .checked_sub(quantity)
        .ok_or_else(|| HmsError::InsufficientStock {
            medicine: medicine.id,
            name: medicine.name.clone(),
            requested: quantity,
            available: medicine.quantity,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;
    use hms_types::Role;

    fn auth(role: Role) -> AuthContext {
        AuthContext::new(Some("token".into()), role, RecordId::new(1))
    }

    fn medicine(id: i64, name: &str, quantity: u32, price: &str) -> Medicine {
        serde_json::from_value(json!({
            "id": id, "name": name, "quantity": quantity, "price": price
        }))
        .expect("medicine")
    }

    async fn stock(backend: &InMemoryBackend, id: i64) -> u32 {
        let auth = auth(Role::Admin);
        let medicine: Medicine = backend
            .retrieve(&auth, RecordId::new(id))
            .await
            .expect("medicine");
        medicine.quantity
    }

    #[tokio::test]
    async fn purchase_beyond_stock_changes_nothing() {
        let backend = InMemoryBackend::new();
        backend.seed(&medicine(1, "Paracetamol", 5, "2.50")).expect("seed");
        let auth = auth(Role::Patient);
        let pharmacy = Pharmacy::new(&backend, &auth);

        let err = pharmacy
            .purchase(RecordId::new(1), 7)
            .await
            .expect_err("only 5 in stock");
        assert!(matches!(
            err,
            HmsError::InsufficientStock { requested: 7, available: 5, .. }
        ));
        assert_eq!(stock(&backend, 1).await, 5);

        let updated = pharmacy.purchase(RecordId::new(1), 5).await.expect("buy all");
        assert_eq!(updated.quantity, 0);
    }

    #[tokio::test]
    async fn zero_quantity_is_invalid() {
        let backend = InMemoryBackend::new();
        backend.seed(&medicine(1, "Paracetamol", 5, "2.50")).expect("seed");
        let auth = auth(Role::Patient);

        let err = Pharmacy::new(&backend, &auth)
            .purchase(RecordId::new(1), 0)
            .await
            .expect_err("zero");
        assert!(matches!(err, HmsError::Validation(_)));
    }

    #[tokio::test]
    async fn cart_totals_every_line() {
        let backend = InMemoryBackend::new();
        backend.seed(&medicine(1, "Paracetamol", 5, "2.50")).expect("seed");
        backend.seed(&medicine(2, "Ibuprofen", 10, "3.10")).expect("seed");
        let auth = auth(Role::Patient);

        let cart = BTreeMap::from([(RecordId::new(1), 2), (RecordId::new(2), 3)]);
        let receipt = Pharmacy::new(&backend, &auth)
            .purchase_cart(&cart)
            .await
            .expect("cart");

        assert_eq!(receipt.lines.len(), 2);
        assert_eq!(receipt.lines[0].line_total, Decimal::new(500, 2));
        assert_eq!(receipt.total, Decimal::new(1430, 2));
        assert_eq!(stock(&backend, 1).await, 3);
        assert_eq!(stock(&backend, 2).await, 7);
    }

    #[tokio::test]
    async fn short_cart_line_mutates_nothing() {
        let backend = InMemoryBackend::new();
        backend.seed(&medicine(1, "Paracetamol", 5, "2.50")).expect("seed");
        backend.seed(&medicine(2, "Ibuprofen", 1, "3.10")).expect("seed");
        let auth = auth(Role::Patient);

        let cart = BTreeMap::from([(RecordId::new(1), 2), (RecordId::new(2), 3)]);
        let err = Pharmacy::new(&backend, &auth)
            .purchase_cart(&cart)
            .await
            .expect_err("ibuprofen is short");
        assert!(matches!(err, HmsError::InsufficientStock { name, .. } if name == "Ibuprofen"));
        assert_eq!(stock(&backend, 1).await, 5);
        assert_eq!(stock(&backend, 2).await, 1);
    }

    #[tokio::test]
    async fn pharmacist_dispenses_prescription() {
        let backend = InMemoryBackend::new();
        let prescription: Prescription = serde_json::from_value(json!({
            "id": 4, "patient_id": 5, "doctor_id": 3, "diagnosis_id": 2, "details": "Amoxicillin"
        }))
        .expect("prescription");
        backend.seed(&prescription).expect("seed");

        let pharmacist = auth(Role::Pharmacist);
        let dispensed = Pharmacy::new(&backend, &pharmacist)
            .dispense(RecordId::new(4))
            .await
            .expect("dispense");
        assert_eq!(dispensed.status, PrescriptionStatus::Dispensed);

        let err = Pharmacy::new(&backend, &pharmacist)
            .dispense(RecordId::new(4))
            .await
            .expect_err("already dispensed");
        assert!(matches!(err, HmsError::InvalidTransition { .. }));
    }
}
