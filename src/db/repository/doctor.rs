use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

use super::{now_text, parse_datetime};

const DOCTOR_COLUMNS: &str =
    "id, name, email, specialty, bio, location, consultation_fee, experience_years,
     is_approved, profile_picture, created_at, updated_at";

struct DoctorRow {
    id: String,
    name: String,
    email: String,
    specialty: String,
    bio: String,
    location: String,
    consultation_fee: f64,
    experience_years: u32,
    is_approved: i32,
    profile_picture: Option<String>,
    created_at: String,
    updated_at: String,
}

fn doctor_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DoctorRow> {
    Ok(DoctorRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        specialty: row.get(3)?,
        bio: row.get(4)?,
        location: row.get(5)?,
        consultation_fee: row.get(6)?,
        experience_years: row.get::<_, i64>(7)? as u32,
        is_approved: row.get(8)?,
        profile_picture: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn doctor_from_row(row: DoctorRow) -> Result<DoctorRecord, DatabaseError> {
    Ok(DoctorRecord {
        id: Uuid::parse_str(&row.id).unwrap_or_default(),
        name: row.name,
        email: row.email,
        specialty: Specialty::from_str(&row.specialty)?,
        bio: row.bio,
        location: row.location,
        consultation_fee: row.consultation_fee,
        experience_years: row.experience_years,
        is_approved: row.is_approved != 0,
        profile_picture: row.profile_picture,
        created_at: parse_datetime(&row.created_at),
        updated_at: parse_datetime(&row.updated_at),
    })
}

pub fn insert_doctor(conn: &Connection, doctor: &DoctorRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (id, name, email, specialty, bio, location, consultation_fee,
         experience_years, is_approved, profile_picture, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            doctor.id.to_string(),
            doctor.name,
            doctor.email,
            doctor.specialty.as_str(),
            doctor.bio,
            doctor.location,
            doctor.consultation_fee,
            doctor.experience_years,
            doctor.is_approved as i32,
            doctor.profile_picture,
            doctor.created_at.format(super::DATETIME_FMT).to_string(),
            doctor.updated_at.format(super::DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_doctor(conn: &Connection, id: &Uuid) -> Result<Option<DoctorRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], doctor_row);

    match result {
        Ok(row) => Ok(Some(doctor_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Flips the approval flag. Admin-only at the caller.
pub fn set_doctor_approval(
    conn: &Connection,
    id: &Uuid,
    approved: bool,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE doctors SET is_approved = ?1, updated_at = ?2 WHERE id = ?3",
        params![approved as i32, now_text(), id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Doctor".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn update_doctor_profile(
    conn: &Connection,
    id: &Uuid,
    update: &DoctorProfileUpdate,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE doctors SET specialty = ?1, bio = ?2, location = ?3, consultation_fee = ?4,
         experience_years = ?5, profile_picture = ?6, updated_at = ?7
         WHERE id = ?8",
        params![
            update.specialty.as_str(),
            update.bio,
            update.location,
            update.consultation_fee,
            update.experience_years,
            update.profile_picture,
            now_text(),
            id.to_string(),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Doctor".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Builds the WHERE clause shared by search and count: approved doctors,
/// filtered by the independently optional search fields.
fn search_clause(
    search: &DoctorSearch,
) -> (String, Vec<Box<dyn rusqlite::types::ToSql>>) {
    let mut sql = String::from(" WHERE is_approved = 1");
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(specialty) = search.specialty {
        params_vec.push(Box::new(specialty.as_str().to_string()));
        sql.push_str(&format!(" AND specialty = ?{}", params_vec.len()));
    }
    if let Some(ref location) = search.location {
        params_vec.push(Box::new(format!("%{location}%")));
        sql.push_str(&format!(" AND location LIKE ?{} COLLATE NOCASE", params_vec.len()));
    }
    if let Some(min_experience) = search.min_experience {
        params_vec.push(Box::new(min_experience as i64));
        sql.push_str(&format!(" AND experience_years >= ?{}", params_vec.len()));
    }
    if let Some(max_fee) = search.max_fee {
        params_vec.push(Box::new(max_fee));
        sql.push_str(&format!(" AND consultation_fee <= ?{}", params_vec.len()));
    }

    (sql, params_vec)
}

/// Approved doctors matching the search filters, newest first.
pub fn search_doctors(
    conn: &Connection,
    search: &DoctorSearch,
    offset: u32,
    limit: u32,
) -> Result<Vec<DoctorRecord>, DatabaseError> {
    let (clause, params_vec) = search_clause(search);
    let sql = format!(
        "SELECT {DOCTOR_COLUMNS} FROM doctors{clause}
         ORDER BY created_at DESC, rowid DESC LIMIT {limit} OFFSET {offset}"
    );

    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(param_refs.as_slice(), doctor_row)?;

    let mut doctors = Vec::new();
    for row in rows {
        doctors.push(doctor_from_row(row?)?);
    }
    Ok(doctors)
}

pub fn count_doctors(conn: &Connection, search: &DoctorSearch) -> Result<u64, DatabaseError> {
    let (clause, params_vec) = search_clause(search);
    let sql = format!("SELECT COUNT(*) FROM doctors{clause}");

    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let count: i64 = conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))?;
    Ok(count as u64)
}
