use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

use super::{parse_datetime, DATETIME_FMT};

const RECORD_COLUMNS: &str =
    "id, patient_id, doctor_id, appointment_id, diagnosis, treatment, prescription, notes, created_at";

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MedicalRecord> {
    Ok(MedicalRecord {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        patient_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        doctor_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap_or_default(),
        appointment_id: row
            .get::<_, Option<String>>(3)?
            .and_then(|s| Uuid::parse_str(&s).ok()),
        diagnosis: row.get(4)?,
        treatment: row.get(5)?,
        prescription: row.get(6)?,
        notes: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

pub fn insert_medical_record(
    conn: &Connection,
    record: &MedicalRecord,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medical_records (id, patient_id, doctor_id, appointment_id, diagnosis,
         treatment, prescription, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            record.id.to_string(),
            record.patient_id.to_string(),
            record.doctor_id.to_string(),
            record.appointment_id.map(|id| id.to_string()),
            record.diagnosis,
            record.treatment,
            record.prescription,
            record.notes,
            record.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

/// A patient's medical history, newest first.
pub fn list_records_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
    offset: u32,
    limit: u32,
) -> Result<Vec<MedicalRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM medical_records WHERE patient_id = ?1
         ORDER BY created_at DESC, rowid DESC LIMIT {limit} OFFSET {offset}"
    ))?;

    let rows = stmt.query_map(params![patient_id.to_string()], record_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn count_records_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<u64, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM medical_records WHERE patient_id = ?1",
        params![patient_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

/// Records filed against one appointment (zero-or-more in the schema).
pub fn list_records_for_appointment(
    conn: &Connection,
    appointment_id: &Uuid,
) -> Result<Vec<MedicalRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM medical_records WHERE appointment_id = ?1
         ORDER BY created_at DESC, rowid DESC"
    ))?;

    let rows = stmt.query_map(params![appointment_id.to_string()], record_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
