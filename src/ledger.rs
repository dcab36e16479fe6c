//! The Appointment Ledger: the single authoritative owner of appointment
//! lifecycle and slot-booking consistency.
//!
//! Every status transition in the system goes through the small operation
//! set here, never through ad hoc writes. Slot uniqueness is decided
//! atomically by the storage layer's UNIQUE index; all transitions are
//! single-statement compare-and-swaps, so concurrent mutators resolve to one
//! winner and the loser observes a domain error. Notifications are queued
//! fire-and-forget and never gate a transaction.

use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveTime};
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::db::repository::{self, AppointmentParty};
use crate::db::DatabaseError;
use crate::models::*;
use crate::notify::{Notification, NotificationSink};
use crate::principal::{Principal, Role};

// ─── Error taxonomy ───────────────────────────────────────────────────────────

/// Domain errors surfaced by the ledger. Raw storage errors never leak:
/// conflicts are translated at this boundary, everything else is wrapped as
/// a retryable `Store` fault.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Doctor {0} is not approved and cannot be booked")]
    Unapproved(Uuid),

    #[error("You are not authorized to perform this action")]
    Unauthorized,

    #[error("Appointment date cannot be in the past")]
    InvalidDate,

    #[error("Appointments can only be scheduled between 9:00 AM and 6:00 PM")]
    InvalidTime,

    #[error("This time slot is already booked. Please choose another time")]
    SlotTaken,

    #[error("Appointment in state {0:?} does not allow this transition")]
    InvalidTransition(AppointmentStatus),

    #[error("This appointment cannot be cancelled")]
    NotCancellable,

    #[error("Follow-up is inconsistent: {0}")]
    FollowUpInconsistent(&'static str),

    #[error("End time must be after start time")]
    InvalidSlotWindow,

    #[error("Storage unavailable, safe to retry: {0}")]
    Store(DatabaseError),
}

impl From<DatabaseError> for LedgerError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound { entity_type, id } => Self::NotFound {
                entity: match entity_type.as_str() {
                    "Doctor" => "Doctor",
                    "Patient" => "Patient",
                    "Appointment" => "Appointment",
                    "AvailabilitySlot" => "AvailabilitySlot",
                    _ => "Entity",
                },
                id: Uuid::parse_str(&id).unwrap_or_default(),
            },
            other => Self::Store(other),
        }
    }
}

// ─── Ledger ───────────────────────────────────────────────────────────────────

/// Owns the appointment lifecycle. Stateless beyond the notification sink;
/// every operation takes the caller's connection.
pub struct Ledger {
    notifier: Arc<dyn NotificationSink>,
}

impl Ledger {
    pub fn new(notifier: Arc<dyn NotificationSink>) -> Self {
        Self { notifier }
    }

    // ─── Booking ──────────────────────────────────────────────────────────────

    /// Books a slot with an approved doctor. The caller must hold the
    /// patient role; date and time are validated locally before any write
    /// so feedback is immediate, and the UNIQUE index decides slot
    /// contention atomically.
    pub fn create_appointment(
        &self,
        conn: &Connection,
        principal: Principal,
        doctor_id: &Uuid,
        date: NaiveDate,
        time: NaiveTime,
        notes: &str,
    ) -> Result<Appointment, LedgerError> {
        if !principal.is(Role::Patient) {
            return Err(LedgerError::Unauthorized);
        }

        let patient = repository::get_patient(conn, &principal.id)?
            .ok_or(LedgerError::NotFound { entity: "Patient", id: principal.id })?;
        let doctor = repository::get_doctor(conn, doctor_id)?
            .ok_or(LedgerError::NotFound { entity: "Doctor", id: *doctor_id })?;
        if !doctor.is_approved {
            return Err(LedgerError::Unapproved(*doctor_id));
        }

        let today = Local::now().date_naive();
        if date < today {
            return Err(LedgerError::InvalidDate);
        }
        if time < config::business_open() || time > config::business_close() {
            return Err(LedgerError::InvalidTime);
        }

        let now = Local::now().naive_local();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            doctor_id: doctor.id,
            date,
            time,
            status: AppointmentStatus::Pending,
            notes: notes.to_string(),
            doctor_notes: String::new(),
            prescription: String::new(),
            follow_up_required: false,
            follow_up_date: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = repository::insert_appointment(conn, &appointment) {
            if e.is_unique_violation() {
                return Err(LedgerError::SlotTaken);
            }
            return Err(e.into());
        }

        tracing::info!(appointment = %appointment.id, doctor = %doctor.id, %date, "appointment booked");

        self.notifier.deliver(Notification {
            recipient: patient.email.clone(),
            subject: "Appointment Booked".into(),
            body: format!(
                "Your appointment with Dr. {} on {} at {} is booked (Status: Pending).",
                doctor.name,
                date,
                time.format("%H:%M"),
            ),
        });
        self.notifier.deliver(Notification {
            recipient: doctor.email.clone(),
            subject: "New Appointment Scheduled".into(),
            body: format!(
                "Patient {} booked an appointment on {} at {}.",
                patient.name,
                date,
                time.format("%H:%M"),
            ),
        });

        Ok(appointment)
    }

    // ─── Transitions ──────────────────────────────────────────────────────────

    /// Doctor accepts a pending appointment: Pending → Confirmed.
    pub fn accept(
        &self,
        conn: &Connection,
        appointment_id: &Uuid,
        acting: Principal,
    ) -> Result<Appointment, LedgerError> {
        let appointment = self.doctor_owned(conn, appointment_id, acting)?;

        let changed = repository::cas_status(
            conn,
            appointment_id,
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
        )?;
        if changed == 0 {
            return Err(self.transition_loss(conn, appointment_id)?);
        }

        tracing::info!(appointment = %appointment_id, "appointment confirmed");
        self.notify_patient(
            conn,
            &appointment,
            "Appointment Confirmed",
            format!(
                "Your appointment on {} at {} has been confirmed.",
                appointment.date,
                appointment.time.format("%H:%M"),
            ),
        );

        self.reread(conn, appointment_id)
    }

    /// Doctor rejects a pending appointment: Pending → Cancelled.
    pub fn reject(
        &self,
        conn: &Connection,
        appointment_id: &Uuid,
        acting: Principal,
    ) -> Result<Appointment, LedgerError> {
        let appointment = self.doctor_owned(conn, appointment_id, acting)?;

        let changed = repository::cas_status(
            conn,
            appointment_id,
            AppointmentStatus::Pending,
            AppointmentStatus::Cancelled,
        )?;
        if changed == 0 {
            return Err(self.transition_loss(conn, appointment_id)?);
        }

        tracing::info!(appointment = %appointment_id, "appointment rejected");
        self.notify_patient(
            conn,
            &appointment,
            "Appointment Rejected",
            format!(
                "Your appointment on {} at {} has been rejected. Please book another time slot.",
                appointment.date,
                appointment.time.format("%H:%M"),
            ),
        );

        self.reread(conn, appointment_id)
    }

    /// Either party cancels a live, future-dated appointment.
    pub fn cancel(
        &self,
        conn: &Connection,
        appointment_id: &Uuid,
        acting: Principal,
    ) -> Result<Appointment, LedgerError> {
        let appointment = repository::get_appointment(conn, appointment_id)?
            .ok_or(LedgerError::NotFound { entity: "Appointment", id: *appointment_id })?;
        if acting.id != appointment.patient_id && acting.id != appointment.doctor_id {
            return Err(LedgerError::Unauthorized);
        }

        let today = Local::now().date_naive();
        let changed = repository::cas_cancel(conn, appointment_id, today)?;
        if changed == 0 {
            // Row exists (just read); the cancellable guard failed or a
            // concurrent transition won.
            return Err(LedgerError::NotCancellable);
        }

        tracing::info!(appointment = %appointment_id, by = %acting.id, "appointment cancelled");
        self.reread(conn, appointment_id)
    }

    /// Doctor files the medical record for a visit; as a side effect the
    /// appointment completes. Allowed from Pending or Confirmed, never from
    /// a terminal state. Record insert and status flip are one transaction.
    pub fn record_completion(
        &self,
        conn: &Connection,
        appointment_id: &Uuid,
        acting: Principal,
        input: &NewMedicalRecord,
    ) -> Result<MedicalRecord, LedgerError> {
        let appointment = self.doctor_owned(conn, appointment_id, acting)?;

        let record = MedicalRecord {
            id: Uuid::new_v4(),
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            appointment_id: Some(appointment.id),
            diagnosis: input.diagnosis.clone(),
            treatment: input.treatment.clone(),
            prescription: input.prescription.clone(),
            notes: input.notes.clone(),
            created_at: Local::now().naive_local(),
        };

        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| LedgerError::Store(e.into()))?;

        let result = (|| -> Result<(), LedgerError> {
            let changed = repository::cas_complete(conn, appointment_id)?;
            if changed == 0 {
                return Err(self.transition_loss(conn, appointment_id)?);
            }
            repository::insert_medical_record(conn, &record)?;
            Ok(())
        })();

        match result {
            Ok(()) => {
                conn.execute_batch("COMMIT")
                    .map_err(|e| LedgerError::Store(e.into()))?;
                tracing::info!(appointment = %appointment_id, record = %record.id, "appointment completed");
                Ok(record)
            }
            Err(e) => {
                if let Err(rollback) = conn.execute_batch("ROLLBACK") {
                    tracing::warn!("Rollback failed: {rollback}");
                }
                Err(e)
            }
        }
    }

    /// Doctor-side edits: notes, prescription, follow-up. Enforces the
    /// follow-up consistency invariant; applies only while the appointment
    /// is live.
    pub fn update_details(
        &self,
        conn: &Connection,
        appointment_id: &Uuid,
        acting: Principal,
        details: &AppointmentDetails,
    ) -> Result<Appointment, LedgerError> {
        self.doctor_owned(conn, appointment_id, acting)?;

        if details.follow_up_required && details.follow_up_date.is_none() {
            return Err(LedgerError::FollowUpInconsistent(
                "follow-up date is required when follow-up is needed",
            ));
        }
        if let Some(follow_up) = details.follow_up_date {
            if follow_up <= Local::now().date_naive() {
                return Err(LedgerError::FollowUpInconsistent(
                    "follow-up date must be in the future",
                ));
            }
        }

        let changed = repository::update_appointment_details(conn, appointment_id, details)?;
        if changed == 0 {
            return Err(self.transition_loss(conn, appointment_id)?);
        }

        self.reread(conn, appointment_id)
    }

    // ─── Projections ──────────────────────────────────────────────────────────

    /// A patient's appointments, newest first, optionally status-filtered.
    pub fn list_for_patient(
        &self,
        conn: &Connection,
        patient_id: &Uuid,
        status: Option<AppointmentStatus>,
        page: u32,
    ) -> Result<Page<Appointment>, LedgerError> {
        self.list(conn, AppointmentParty::Patient, patient_id, status, page)
    }

    /// A doctor's appointments, newest first, optionally status-filtered.
    pub fn list_for_doctor(
        &self,
        conn: &Connection,
        doctor_id: &Uuid,
        status: Option<AppointmentStatus>,
        page: u32,
    ) -> Result<Page<Appointment>, LedgerError> {
        self.list(conn, AppointmentParty::Doctor, doctor_id, status, page)
    }

    fn list(
        &self,
        conn: &Connection,
        party: AppointmentParty,
        party_id: &Uuid,
        status: Option<AppointmentStatus>,
        page: u32,
    ) -> Result<Page<Appointment>, LedgerError> {
        let total = repository::count_appointments(conn, party, party_id, status)?;
        let (mut envelope, offset) =
            Page::envelope(total, page, config::APPOINTMENTS_PAGE_SIZE);
        envelope.items = repository::list_appointments(
            conn,
            party,
            party_id,
            status,
            offset,
            config::APPOINTMENTS_PAGE_SIZE,
        )?;
        Ok(envelope)
    }

    /// Per-status counts for a patient dashboard.
    pub fn stats_for_patient(
        &self,
        conn: &Connection,
        patient_id: &Uuid,
    ) -> Result<AppointmentStats, LedgerError> {
        Ok(repository::appointment_stats(conn, AppointmentParty::Patient, patient_id)?)
    }

    /// Per-status counts for a doctor dashboard.
    pub fn stats_for_doctor(
        &self,
        conn: &Connection,
        doctor_id: &Uuid,
    ) -> Result<AppointmentStats, LedgerError> {
        Ok(repository::appointment_stats(conn, AppointmentParty::Doctor, doctor_id)?)
    }

    /// A patient's medical history, newest first.
    pub fn medical_history(
        &self,
        conn: &Connection,
        patient_id: &Uuid,
        page: u32,
    ) -> Result<Page<MedicalRecord>, LedgerError> {
        let total = repository::count_records_for_patient(conn, patient_id)?;
        let (mut envelope, offset) =
            Page::envelope(total, page, config::MEDICAL_RECORDS_PAGE_SIZE);
        envelope.items = repository::list_records_for_patient(
            conn,
            patient_id,
            offset,
            config::MEDICAL_RECORDS_PAGE_SIZE,
        )?;
        Ok(envelope)
    }

    /// Records filed against one appointment.
    pub fn records_for_appointment(
        &self,
        conn: &Connection,
        appointment_id: &Uuid,
    ) -> Result<Vec<MedicalRecord>, LedgerError> {
        Ok(repository::list_records_for_appointment(conn, appointment_id)?)
    }

    /// Approved doctors matching the search filters, newest first.
    pub fn search_doctors(
        &self,
        conn: &Connection,
        search: &DoctorSearch,
        page: u32,
    ) -> Result<Page<DoctorRecord>, LedgerError> {
        let total = repository::count_doctors(conn, search)?;
        let (mut envelope, offset) = Page::envelope(total, page, config::DOCTORS_PAGE_SIZE);
        envelope.items =
            repository::search_doctors(conn, search, offset, config::DOCTORS_PAGE_SIZE)?;
        Ok(envelope)
    }

    // ─── Internal helpers ─────────────────────────────────────────────────────

    /// Loads the appointment and checks the acting principal is its
    /// assigned doctor.
    fn doctor_owned(
        &self,
        conn: &Connection,
        appointment_id: &Uuid,
        acting: Principal,
    ) -> Result<Appointment, LedgerError> {
        let appointment = repository::get_appointment(conn, appointment_id)?
            .ok_or(LedgerError::NotFound { entity: "Appointment", id: *appointment_id })?;
        if !acting.is(Role::Doctor) || acting.id != appointment.doctor_id {
            return Err(LedgerError::Unauthorized);
        }
        Ok(appointment)
    }

    /// A compare-and-swap changed zero rows: re-read to report the loser's
    /// view. The row existed moments ago, so absence means a concurrent
    /// delete; otherwise the current status names the refused transition.
    fn transition_loss(
        &self,
        conn: &Connection,
        appointment_id: &Uuid,
    ) -> Result<LedgerError, LedgerError> {
        match repository::get_appointment(conn, appointment_id)? {
            Some(current) => Ok(LedgerError::InvalidTransition(current.status)),
            None => Ok(LedgerError::NotFound { entity: "Appointment", id: *appointment_id }),
        }
    }

    fn reread(
        &self,
        conn: &Connection,
        appointment_id: &Uuid,
    ) -> Result<Appointment, LedgerError> {
        repository::get_appointment(conn, appointment_id)?
            .ok_or(LedgerError::NotFound { entity: "Appointment", id: *appointment_id })
    }

    /// Best-effort patient notification; lookup failure is logged, never
    /// propagated.
    fn notify_patient(
        &self,
        conn: &Connection,
        appointment: &Appointment,
        subject: &str,
        body: String,
    ) {
        match repository::get_patient(conn, &appointment.patient_id) {
            Ok(Some(patient)) => self.notifier.deliver(Notification {
                recipient: patient.email,
                subject: subject.to_string(),
                body,
            }),
            Ok(None) => {
                tracing::warn!(patient = %appointment.patient_id, "notification skipped: patient missing")
            }
            Err(e) => tracing::warn!("notification skipped: {e}"),
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
