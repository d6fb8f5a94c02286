//! Per-role page data.
//!
//! Each view loads the collections one role's page shows, issuing independent fetches
//! concurrently. Related collections are kept side by side and joined on demand with
//! [`join_one`]/[`join_many`], so a view owns its data once and borrows it for display.

use crate::auth::AuthContext;
use crate::backend::{Backend, Filter};
use crate::error::{HmsError, HmsResult};
use crate::joins::{join_many, join_one, JoinMany, JoinOne};
use crate::lifecycle::{ClaimStatus, LabRequestStatus, PrescriptionStatus};
use crate::models::{
    Appointment, Diagnosis, Doctor, InsuranceClaim, InsuranceContract, LabRequest, LabResult,
    Medicine, Patient, Prescription, Resource,
};
use crate::resources::ResourceManager;
use hms_types::Role;

fn manager<'a, R: Resource, B: Backend>(
    backend: &'a B,
    auth: &'a AuthContext,
) -> ResourceManager<'a, R, B> {
    ResourceManager::new(backend, auth)
}

/// Finds the profile of kind `R` linked to the session's user account.
async fn own_profile<R: Resource, B: Backend>(backend: &B, auth: &AuthContext) -> HmsResult<R> {
    manager::<R, B>(backend, auth)
        .list_filtered(&Filter::none().eq("user_id", auth.user_id()))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            HmsError::Validation(format!(
                "no {} profile is linked to user {}",
                R::KIND,
                auth.user_id()
            ))
        })
}

#[derive(Debug, Clone)]
pub struct PatientView {
    pub patient: Patient,
    pub appointments: Vec<Appointment>,
    pub lab_requests: Vec<LabRequest>,
    pub lab_results: Vec<LabResult>,
    pub contracts: Vec<InsuranceContract>,
    pub claims: Vec<InsuranceClaim>,
}

impl PatientView {
    pub async fn load<B: Backend>(backend: &B, auth: &AuthContext) -> HmsResult<Self> {
        let patient: Patient = own_profile(backend, auth).await?;
        let appointments = manager::<Appointment, B>(backend, auth);
        let requests = manager::<LabRequest, B>(backend, auth);
        let results = manager::<LabResult, B>(backend, auth);
        let contracts = manager::<InsuranceContract, B>(backend, auth);
        let claims = manager::<InsuranceClaim, B>(backend, auth);
        let (appointments, lab_requests, lab_results, contracts, claims) = tokio::try_join!(
            appointments.by_patient(patient.id),
            requests.by_patient(patient.id),
            results.list(),
            contracts.by_patient(patient.id),
            claims.list(),
        )?;

        // Results and claims are listed unfiltered; keep only those for this patient.
        let lab_results = lab_results
            .into_iter()
            .filter(|r| lab_requests.iter().any(|q| q.id == r.lab_request))
            .collect();
        let claims = claims
            .into_iter()
            .filter(|c| contracts.iter().any(|k| k.id == c.contract))
            .collect();

        Ok(Self {
            patient,
            appointments,
            lab_requests,
            lab_results,
            contracts,
            claims,
        })
    }

    pub fn lab_pairs(&self) -> JoinOne<'_, LabRequest, LabResult> {
        join_one(&self.lab_requests, &self.lab_results)
    }

    pub fn coverage(&self) -> JoinMany<'_, InsuranceContract, InsuranceClaim> {
        join_many(&self.contracts, &self.claims)
    }
}

#[derive(Debug, Clone)]
pub struct DoctorView {
    pub doctor: Doctor,
    pub appointments: Vec<Appointment>,
    pub diagnoses: Vec<Diagnosis>,
    pub prescriptions: Vec<Prescription>,
    pub lab_requests: Vec<LabRequest>,
    pub lab_results: Vec<LabResult>,
}

impl DoctorView {
    pub async fn load<B: Backend>(backend: &B, auth: &AuthContext) -> HmsResult<Self> {
        let doctor: Doctor = own_profile(backend, auth).await?;
        let appointments = manager::<Appointment, B>(backend, auth);
        let diagnoses = manager::<Diagnosis, B>(backend, auth);
        let prescriptions = manager::<Prescription, B>(backend, auth);
        let requests = manager::<LabRequest, B>(backend, auth);
        let results = manager::<LabResult, B>(backend, auth);
        let written_by = Filter::none().eq("doctor_id", doctor.id);
        let (appointments, diagnoses, prescriptions, lab_requests, lab_results) = tokio::try_join!(
            appointments.by_doctor(doctor.id),
            diagnoses.by_doctor(doctor.id),
            prescriptions.list_filtered(&written_by),
            requests.by_doctor(doctor.id),
            results.list(),
        )?;

        let lab_results = lab_results
            .into_iter()
            .filter(|r| lab_requests.iter().any(|q| q.id == r.lab_request))
            .collect();

        Ok(Self {
            doctor,
            appointments,
            diagnoses,
            prescriptions,
            lab_requests,
            lab_results,
        })
    }

    /// Each diagnosis with the prescription written for it, if any.
    pub fn treatment(&self) -> JoinOne<'_, Diagnosis, Prescription> {
        join_one(&self.diagnoses, &self.prescriptions)
    }

    pub fn lab_pairs(&self) -> JoinOne<'_, LabRequest, LabResult> {
        join_one(&self.lab_requests, &self.lab_results)
    }
}

#[derive(Debug, Clone)]
pub struct PharmacistView {
    pub pending_prescriptions: Vec<Prescription>,
    pub medicines: Vec<Medicine>,
}

impl PharmacistView {
    pub async fn load<B: Backend>(backend: &B, auth: &AuthContext) -> HmsResult<Self> {
        let prescriptions = manager::<Prescription, B>(backend, auth);
        let medicines = manager::<Medicine, B>(backend, auth);
        let (pending_prescriptions, medicines) = tokio::try_join!(
            prescriptions.with_status(PrescriptionStatus::Pending),
            medicines.list(),
        )?;
        Ok(Self {
            pending_prescriptions,
            medicines,
        })
    }

    /// Medicines with nothing left in stock.
    pub fn out_of_stock(&self) -> impl Iterator<Item = &Medicine> {
        self.medicines.iter().filter(|m| m.quantity == 0)
    }
}

#[derive(Debug, Clone)]
pub struct LabTechnicianView {
    pub pending: Vec<LabRequest>,
    pub completed: Vec<LabRequest>,
    pub results: Vec<LabResult>,
}

impl LabTechnicianView {
    pub async fn load<B: Backend>(backend: &B, auth: &AuthContext) -> HmsResult<Self> {
        let requests = manager::<LabRequest, B>(backend, auth);
        let results = manager::<LabResult, B>(backend, auth);
        let (pending, completed, results) = tokio::try_join!(
            requests.with_status(LabRequestStatus::Pending),
            requests.with_status(LabRequestStatus::Completed),
            results.list(),
        )?;
        Ok(Self {
            pending,
            completed,
            results,
        })
    }

    pub fn completed_pairs(&self) -> JoinOne<'_, LabRequest, LabResult> {
        join_one(&self.completed, &self.results)
    }
}

#[derive(Debug, Clone)]
pub struct InsuranceView {
    pub contracts: Vec<InsuranceContract>,
    pub claims: Vec<InsuranceClaim>,
}

impl InsuranceView {
    pub async fn load<B: Backend>(backend: &B, auth: &AuthContext) -> HmsResult<Self> {
        let contracts = manager::<InsuranceContract, B>(backend, auth);
        let claims = manager::<InsuranceClaim, B>(backend, auth);
        let (contracts, claims) = tokio::try_join!(contracts.list(), claims.list())?;
        Ok(Self { contracts, claims })
    }

    pub fn coverage(&self) -> JoinMany<'_, InsuranceContract, InsuranceClaim> {
        join_many(&self.contracts, &self.claims)
    }

    pub fn pending_claims(&self) -> usize {
        self.claims
            .iter()
            .filter(|c| c.status == ClaimStatus::Pending)
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct AdminView {
    pub patients: Vec<Patient>,
    pub doctors: Vec<Doctor>,
    pub medicines: Vec<Medicine>,
}

impl AdminView {
    pub async fn load<B: Backend>(backend: &B, auth: &AuthContext) -> HmsResult<Self> {
        let patients = manager::<Patient, B>(backend, auth);
        let doctors = manager::<Doctor, B>(backend, auth);
        let medicines = manager::<Medicine, B>(backend, auth);
        let (patients, doctors, medicines) =
            tokio::try_join!(patients.list(), doctors.list(), medicines.list())?;
        Ok(Self {
            patients,
            doctors,
            medicines,
        })
    }
}

/// The page for whichever role the session holds.
#[derive(Debug, Clone)]
pub enum RoleView {
    Patient(PatientView),
    Doctor(DoctorView),
    Pharmacist(PharmacistView),
    LabTechnician(LabTechnicianView),
    Insurance(InsuranceView),
    Admin(AdminView),
}

impl RoleView {
    /// # Errors
    ///
    /// Returns [`HmsError::Forbidden`] for roles without a page (`nurse`), and otherwise any
    /// error from the underlying fetches.
    pub async fn load<B: Backend>(backend: &B, auth: &AuthContext) -> HmsResult<Self> {
        tracing::debug!("loading {} view for user {}", auth.role(), auth.user_id());
        Ok(match auth.role() {
            Role::Patient => RoleView::Patient(PatientView::load(backend, auth).await?),
            Role::Doctor => RoleView::Doctor(DoctorView::load(backend, auth).await?),
            Role::Pharmacist => RoleView::Pharmacist(PharmacistView::load(backend, auth).await?),
            Role::LabTechnician => {
                RoleView::LabTechnician(LabTechnicianView::load(backend, auth).await?)
            }
            Role::InsuranceProvider => {
                RoleView::Insurance(InsuranceView::load(backend, auth).await?)
            }
            Role::Admin => RoleView::Admin(AdminView::load(backend, auth).await?),
            Role::Nurse => {
                return Err(HmsError::Forbidden(format!(
                    "role {} has no page",
                    Role::Nurse
                )))
            }
        })
    }
}
