//! Plain-text rendering of views and command results.

use std::io::{self, Write};

use hms_core::ResourceKind;
use hms_core::models::{Appointment, LabRequest, LabResult, Medicine};
use hms_core::services::{CompletedLab, Receipt, TransitionOutcome};
use hms_core::views::{
    AdminView, DoctorView, InsuranceView, LabTechnicianView, PatientView, PharmacistView, RoleView,
};

const DATE_TIME: &str = "%Y-%m-%d %H:%M";

pub fn view(out: &mut impl Write, view: &RoleView) -> io::Result<()> {
    match view {
        RoleView::Patient(v) => patient(out, v),
        RoleView::Doctor(v) => doctor(out, v),
        RoleView::Pharmacist(v) => pharmacist(out, v),
        RoleView::LabTechnician(v) => lab_technician(out, v),
        RoleView::Insurance(v) => insurance(out, v),
        RoleView::Admin(v) => admin(out, v),
    }
}

fn patient(out: &mut impl Write, v: &PatientView) -> io::Result<()> {
    writeln!(
        out,
        "Patient #{} (born {}), {}",
        v.patient.id, v.patient.date_of_birth, v.patient.address
    )?;

    heading(out, "Appointments", v.appointments.len())?;
    for a in &v.appointments {
        appointment(out, a)?;
    }

    heading(out, "Lab requests", v.lab_requests.len())?;
    for (request, result) in v.lab_pairs() {
        lab_pair(out, request, result)?;
    }

    heading(out, "Insurance", v.contracts.len())?;
    for (contract, claims) in v.coverage() {
        writeln!(
            out,
            "  {} ({}, {} to {}): {} claim(s)",
            contract.policy_number,
            contract.provider,
            contract.start_date,
            contract.end_date,
            claims.len()
        )?;
        for c in claims {
            writeln!(out, "    #{} {} {} [{}]", c.id, c.amount, c.description, c.status)?;
        }
    }
    Ok(())
}

fn doctor(out: &mut impl Write, v: &DoctorView) -> io::Result<()> {
    writeln!(out, "Dr #{}, {} ({})", v.doctor.id, v.doctor.specialty, v.doctor.clinic)?;

    heading(out, "Appointments", v.appointments.len())?;
    for a in &v.appointments {
        appointment(out, a)?;
    }

    heading(out, "Diagnoses", v.diagnoses.len())?;
    for (diagnosis, prescription) in v.treatment() {
        match prescription {
            Some(p) => writeln!(
                out,
                "  #{} patient {}: {} -> {} [{}]",
                diagnosis.id, diagnosis.patient_id, diagnosis.description, p.details, p.status
            )?,
            None => writeln!(
                out,
                "  #{} patient {}: {} -> no prescription",
                diagnosis.id, diagnosis.patient_id, diagnosis.description
            )?,
        }
    }

    heading(out, "Lab requests", v.lab_requests.len())?;
    for (request, result) in v.lab_pairs() {
        lab_pair(out, request, result)?;
    }
    Ok(())
}

fn pharmacist(out: &mut impl Write, v: &PharmacistView) -> io::Result<()> {
    heading(out, "Pending prescriptions", v.pending_prescriptions.len())?;
    for p in &v.pending_prescriptions {
        writeln!(out, "  #{} patient {}: {}", p.id, p.patient_id, p.details)?;
    }

    heading(out, "Inventory", v.medicines.len())?;
    for m in &v.medicines {
        medicine(out, m)?;
    }
    Ok(())
}

fn lab_technician(out: &mut impl Write, v: &LabTechnicianView) -> io::Result<()> {
    heading(out, "Pending requests", v.pending.len())?;
    for r in &v.pending {
        writeln!(out, "  #{} {} for patient {}", r.id, r.test_type, r.patient_id)?;
    }

    heading(out, "Completed requests", v.completed.len())?;
    for (request, result) in v.completed_pairs() {
        lab_pair(out, request, result)?;
    }
    Ok(())
}

fn insurance(out: &mut impl Write, v: &InsuranceView) -> io::Result<()> {
    writeln!(out, "{} claim(s) awaiting a decision", v.pending_claims())?;
    heading(out, "Contracts", v.contracts.len())?;
    for (contract, claims) in v.coverage() {
        writeln!(
            out,
            "  {} patient {} ({}): {} claim(s)",
            contract.policy_number,
            contract.patient_id,
            contract.provider,
            claims.len()
        )?;
        for c in claims {
            writeln!(out, "    #{} {} {} [{}]", c.id, c.amount, c.description, c.status)?;
        }
    }
    Ok(())
}

fn admin(out: &mut impl Write, v: &AdminView) -> io::Result<()> {
    heading(out, "Patients", v.patients.len())?;
    for p in &v.patients {
        writeln!(out, "  #{} user {} born {}", p.id, p.user_id, p.date_of_birth)?;
    }
    heading(out, "Doctors", v.doctors.len())?;
    for d in &v.doctors {
        writeln!(out, "  #{} user {} {} ({})", d.id, d.user_id, d.specialty, d.clinic)?;
    }
    heading(out, "Medicines", v.medicines.len())?;
    for m in &v.medicines {
        medicine(out, m)?;
    }
    Ok(())
}

fn heading(out: &mut impl Write, title: &str, count: usize) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{title} ({count})")
}

fn appointment(out: &mut impl Write, a: &Appointment) -> io::Result<()> {
    writeln!(
        out,
        "  #{} {} patient {} with doctor {}: {} [{}]",
        a.id,
        a.appointment_date.format(DATE_TIME),
        a.patient,
        a.doctor_id,
        a.reason,
        a.status
    )
}

fn lab_pair(
    out: &mut impl Write,
    request: &LabRequest,
    result: Option<&LabResult>,
) -> io::Result<()> {
    match result {
        Some(r) => writeln!(
            out,
            "  #{} {} [{}] -> {} ({})",
            request.id,
            request.test_type,
            request.status,
            r.details,
            r.result_date.format(DATE_TIME)
        ),
        None => writeln!(
            out,
            "  #{} {} [{}] -> no result",
            request.id, request.test_type, request.status
        ),
    }
}

fn medicine(out: &mut impl Write, m: &Medicine) -> io::Result<()> {
    if m.quantity == 0 {
        writeln!(out, "  #{} {} @ {}: out of stock", m.id, m.name, m.price)
    } else {
        writeln!(out, "  #{} {} @ {}: {} left", m.id, m.name, m.price, m.quantity)
    }
}

pub fn transition(out: &mut impl Write, outcome: &TransitionOutcome) -> io::Result<()> {
    writeln!(
        out,
        "{} {}: {} -> {}",
        outcome.kind, outcome.id, outcome.from, outcome.to
    )
}

pub fn completed_lab(out: &mut impl Write, done: &CompletedLab) -> io::Result<()> {
    writeln!(
        out,
        "lab request {} is {} with result #{}",
        done.request.id, done.request.status, done.result.id
    )
}

pub fn stock(out: &mut impl Write, updated: &Medicine) -> io::Result<()> {
    writeln!(out, "{}: {} left", updated.name, updated.quantity)
}

pub fn receipt(out: &mut impl Write, receipt: &Receipt) -> io::Result<()> {
    for line in &receipt.lines {
        writeln!(
            out,
            "{} x{} @ {} = {} ({} left)",
            line.name, line.quantity, line.unit_price, line.line_total, line.remaining
        )?;
    }
    writeln!(out, "total: {}", receipt.total)
}

pub fn allowed(
    out: &mut impl Write,
    kind: ResourceKind,
    from: &str,
    targets: &[&str],
) -> io::Result<()> {
    if targets.is_empty() {
        writeln!(out, "{kind} {from} is terminal")
    } else {
        writeln!(out, "{kind} {from} may move to: {}", targets.join(", "))
    }
}

pub fn line(out: &mut impl Write, text: &str) -> io::Result<()> {
    writeln!(out, "{text}")
}
