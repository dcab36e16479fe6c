use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

use super::{now_text, parse_datetime, DATE_FMT, DATETIME_FMT};

struct PatientRow {
    id: String,
    name: String,
    email: String,
    date_of_birth: Option<String>,
    gender: Option<String>,
    blood_type: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    emergency_contact: Option<String>,
    emergency_phone: Option<String>,
    medical_history: Option<String>,
    current_medications: Option<String>,
    allergies: Option<String>,
    profile_picture: Option<String>,
    created_at: String,
    updated_at: String,
}

fn patient_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok(PatientRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        date_of_birth: row.get(3)?,
        gender: row.get(4)?,
        blood_type: row.get(5)?,
        phone: row.get(6)?,
        address: row.get(7)?,
        emergency_contact: row.get(8)?,
        emergency_phone: row.get(9)?,
        medical_history: row.get(10)?,
        current_medications: row.get(11)?,
        allergies: row.get(12)?,
        profile_picture: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<PatientRecord, DatabaseError> {
    let gender = match row.gender {
        Some(ref s) => Some(Gender::from_str(s)?),
        None => None,
    };
    let blood_type = match row.blood_type {
        Some(ref s) => Some(BloodType::from_str(s)?),
        None => None,
    };
    Ok(PatientRecord {
        id: Uuid::parse_str(&row.id).unwrap_or_default(),
        name: row.name,
        email: row.email,
        date_of_birth: row
            .date_of_birth
            .and_then(|d| chrono::NaiveDate::parse_from_str(&d, DATE_FMT).ok()),
        gender,
        blood_type,
        phone: row.phone,
        address: row.address,
        emergency_contact: row.emergency_contact,
        emergency_phone: row.emergency_phone,
        medical_history: row.medical_history,
        current_medications: row.current_medications,
        allergies: row.allergies,
        profile_picture: row.profile_picture,
        created_at: parse_datetime(&row.created_at),
        updated_at: parse_datetime(&row.updated_at),
    })
}

pub fn insert_patient(conn: &Connection, patient: &PatientRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, name, email, date_of_birth, gender, blood_type, phone,
         address, emergency_contact, emergency_phone, medical_history, current_medications,
         allergies, profile_picture, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            patient.id.to_string(),
            patient.name,
            patient.email,
            patient.date_of_birth.map(|d| d.to_string()),
            patient.gender.map(|g| g.as_str()),
            patient.blood_type.map(|b| b.as_str()),
            patient.phone,
            patient.address,
            patient.emergency_contact,
            patient.emergency_phone,
            patient.medical_history,
            patient.current_medications,
            patient.allergies,
            patient.profile_picture,
            patient.created_at.format(DATETIME_FMT).to_string(),
            patient.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<PatientRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, date_of_birth, gender, blood_type, phone, address,
         emergency_contact, emergency_phone, medical_history, current_medications,
         allergies, profile_picture, created_at, updated_at
         FROM patients WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id.to_string()], patient_row);

    match result {
        Ok(row) => Ok(Some(patient_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_patient_profile(
    conn: &Connection,
    id: &Uuid,
    update: &PatientProfileUpdate,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET date_of_birth = ?1, gender = ?2, blood_type = ?3, phone = ?4,
         address = ?5, emergency_contact = ?6, emergency_phone = ?7, medical_history = ?8,
         current_medications = ?9, allergies = ?10, profile_picture = ?11, updated_at = ?12
         WHERE id = ?13",
        params![
            update.date_of_birth.map(|d| d.to_string()),
            update.gender.map(|g| g.as_str()),
            update.blood_type.map(|b| b.as_str()),
            update.phone,
            update.address,
            update.emergency_contact,
            update.emergency_phone,
            update.medical_history,
            update.current_medications,
            update.allergies,
            update.profile_picture,
            now_text(),
            id.to_string(),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
