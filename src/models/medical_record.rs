use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable record of a completed visit. Filed by the treating doctor;
/// filing one completes the linked appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub diagnosis: String,
    pub treatment: String,
    pub prescription: String,
    pub notes: String,
    pub created_at: NaiveDateTime,
}

/// Input for filing a medical record against an appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedicalRecord {
    pub diagnosis: String,
    pub treatment: String,
    pub prescription: String,
    pub notes: String,
}
