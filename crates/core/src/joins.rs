//! Client-side joins between fetched collections.
//!
//! The backend has no embedded relations, so pages fetch both sides and match foreign keys
//! locally. [`join_one`] pairs each parent with at most one child; when the backend holds
//! duplicates (nothing stops two results for one lab request) the first child in input order
//! wins. [`join_many`] keeps every child.
//!
//! Both are lazy: nothing is scanned until the iterator is advanced, and each parent costs one
//! pass over the children.

use crate::models::{
    Appointment, Diagnosis, InsuranceClaim, InsuranceContract, LabRequest, LabResult, Patient,
    Prescription, Resource,
};
use hms_types::RecordId;

/// A record holding a foreign key to a parent resource `P`.
pub trait BelongsTo<P: Resource> {
    fn parent_id(&self) -> RecordId;
}

impl BelongsTo<LabRequest> for LabResult {
    fn parent_id(&self) -> RecordId {
        self.lab_request
    }
}

impl BelongsTo<Diagnosis> for Prescription {
    fn parent_id(&self) -> RecordId {
        self.diagnosis_id
    }
}

impl BelongsTo<InsuranceContract> for InsuranceClaim {
    fn parent_id(&self) -> RecordId {
        self.contract
    }
}

impl BelongsTo<Patient> for Appointment {
    fn parent_id(&self) -> RecordId {
        self.patient
    }
}

/// Pairs every parent with its first matching child, or `None`.
///
/// Every parent is yielded exactly once, in input order.
pub fn join_one<'a, P, C>(parents: &'a [P], children: &'a [C]) -> JoinOne<'a, P, C>
where
    P: Resource,
    C: BelongsTo<P>,
{
    JoinOne {
        parents: parents.iter(),
        children,
    }
}

/// Pairs every parent with all of its children, in input order.
pub fn join_many<'a, P, C>(parents: &'a [P], children: &'a [C]) -> JoinMany<'a, P, C>
where
    P: Resource,
    C: BelongsTo<P>,
{
    JoinMany {
        parents: parents.iter(),
        children,
    }
}

pub struct JoinOne<'a, P, C> {
    parents: std::slice::Iter<'a, P>,
    children: &'a [C],
}

impl<'a, P, C> Iterator for JoinOne<'a, P, C>
where
    P: Resource,
    C: BelongsTo<P>,
{
    type Item = (&'a P, Option<&'a C>);

    fn next(&mut self) -> Option<Self::Item> {
        let parent = self.parents.next()?;
        let id = parent.id();
        let child = self.children.iter().find(|c| c.parent_id() == id);
        Some((parent, child))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.parents.size_hint()
    }
}

impl<P, C> ExactSizeIterator for JoinOne<'_, P, C>
where
    P: Resource,
    C: BelongsTo<P>,
{
}

pub struct JoinMany<'a, P, C> {
    parents: std::slice::Iter<'a, P>,
    children: &'a [C],
}

impl<'a, P, C> Iterator for JoinMany<'a, P, C>
where
    P: Resource,
    C: BelongsTo<P>,
{
    type Item = (&'a P, Vec<&'a C>);

    fn next(&mut self) -> Option<Self::Item> {
        let parent = self.parents.next()?;
        let id = parent.id();
        let matched = self
            .children
            .iter()
            .filter(|c| c.parent_id() == id)
            .collect();
        Some((parent, matched))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.parents.size_hint()
    }
}

impl<P, C> ExactSizeIterator for JoinMany<'_, P, C>
where
    P: Resource,
    C: BelongsTo<P>,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{ClaimStatus, LabRequestStatus};
    use crate::models::Audit;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn request(id: i64) -> LabRequest {
        LabRequest {
            id: RecordId::new(id),
            patient_id: RecordId::new(5),
            doctor_id: RecordId::new(3),
            test_type: "blood".into(),
            description: String::new(),
            status: LabRequestStatus::Pending,
            audit: Audit::default(),
        }
    }

    fn result(id: i64, lab_request: i64) -> LabResult {
        LabResult {
            id: RecordId::new(id),
            lab_request: RecordId::new(lab_request),
            result_date: Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
            details: format!("result {id}"),
            audit: Audit::default(),
        }
    }

    fn claim(id: i64, contract: i64) -> InsuranceClaim {
        InsuranceClaim {
            id: RecordId::new(id),
            contract: RecordId::new(contract),
            amount: Decimal::new(1000, 2),
            claim_date: Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
            description: "visit".into(),
            status: ClaimStatus::Pending,
            audit: Audit::default(),
        }
    }

    fn contract(id: i64) -> InsuranceContract {
        serde_json::from_value(serde_json::json!({
            "id": id, "patient_id": 5, "policy_number": format!("POL-{id}"),
            "provider": "Acme", "start_date": "2025-01-01", "end_date": "2025-12-31"
        }))
        .expect("contract")
    }

    #[test]
    fn pairs_requests_with_results() {
        let requests = vec![request(1), request(2)];
        let results = vec![result(10, 1)];

        let pairs: Vec<(i64, Option<i64>)> = join_one(&requests, &results)
            .map(|(req, res)| (req.id.get(), res.map(|r| r.id.get())))
            .collect();

        assert_eq!(pairs, vec![(1, Some(10)), (2, None)]);
    }

    #[test]
    fn first_duplicate_child_wins() {
        let requests = vec![request(1)];
        let results = vec![result(11, 1), result(12, 1)];

        let (_, matched) = join_one(&requests, &results).next().expect("one pair");
        assert_eq!(matched.map(|r| r.id), Some(RecordId::new(11)));
    }

    #[test]
    fn every_parent_appears_once() {
        let requests = vec![request(3), request(1), request(2)];
        let results = vec![result(10, 2), result(11, 2), result(12, 99)];

        let joined = join_one(&requests, &results);
        assert_eq!(joined.len(), 3);
        let order: Vec<i64> = joined.map(|(req, _)| req.id.get()).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn empty_inputs() {
        let none: Vec<LabRequest> = Vec::new();
        assert_eq!(join_one(&none, &[result(1, 1)]).count(), 0);

        let requests = vec![request(1)];
        let empty: Vec<LabResult> = Vec::new();
        let pairs: Vec<_> = join_one(&requests, &empty).collect();
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].1.is_none());
    }

    #[test]
    fn join_many_keeps_all_children_in_order() {
        let contracts = vec![contract(1), contract(2)];
        let claims = vec![claim(20, 2), claim(21, 1), claim(22, 2)];

        let grouped: Vec<(i64, Vec<i64>)> = join_many(&contracts, &claims)
            .map(|(c, cs)| (c.id.get(), cs.iter().map(|cl| cl.id.get()).collect()))
            .collect();

        assert_eq!(grouped, vec![(1, vec![21]), (2, vec![20, 22])]);
    }
}
