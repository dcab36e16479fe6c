use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Specialty;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub specialty: Specialty,
    pub bio: String,
    /// "City, State" free text.
    pub location: String,
    pub consultation_fee: f64,
    pub experience_years: u32,
    /// Gates visibility to patients; flipped by an admin.
    pub is_approved: bool,
    pub profile_picture: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input for registering a doctor with the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDoctor {
    pub name: String,
    pub email: String,
    pub specialty: Specialty,
    pub bio: String,
    pub location: String,
    pub consultation_fee: f64,
    pub experience_years: u32,
}

/// Owner-editable profile fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfileUpdate {
    pub specialty: Specialty,
    pub bio: String,
    pub location: String,
    pub consultation_fee: f64,
    pub experience_years: u32,
    pub profile_picture: Option<String>,
}

/// Search filters for the doctor listing. All independently optional,
/// combined with AND when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorSearch {
    pub specialty: Option<Specialty>,
    pub location: Option<String>,
    pub min_experience: Option<u32>,
    pub max_fee: Option<f64>,
}
