use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AppointmentStatus;

/// A booked slot: one patient with one doctor at one (date, time).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    /// Patient-authored notes given at booking time.
    pub notes: String,
    /// Doctor-authored notes after the visit.
    pub doctor_notes: String,
    pub prescription: String,
    pub follow_up_required: bool,
    pub follow_up_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    pub fn is_past(&self, today: NaiveDate) -> bool {
        self.date < today
    }

    /// Cancellable = not in the past and not already in a terminal state.
    pub fn can_be_cancelled(&self, today: NaiveDate) -> bool {
        !self.is_past(today) && !self.status.is_terminal()
    }
}

/// Doctor-side edits to an appointment: notes, prescription, follow-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDetails {
    pub doctor_notes: String,
    pub prescription: String,
    pub follow_up_required: bool,
    pub follow_up_date: Option<NaiveDate>,
}

/// Per-status appointment counts for a dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentStats {
    pub total: u64,
    pub pending: u64,
    pub confirmed: u64,
    pub completed: u64,
    pub cancelled: u64,
}
