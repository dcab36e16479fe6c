use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

use super::{now_text, parse_date, parse_datetime, parse_time, DATE_FMT, TIME_FMT};

const APPOINTMENT_COLUMNS: &str =
    "id, patient_id, doctor_id, date, time, status, notes, doctor_notes, prescription,
     follow_up_required, follow_up_date, created_at, updated_at";

struct AppointmentRow {
    id: String,
    patient_id: String,
    doctor_id: String,
    date: String,
    time: String,
    status: String,
    notes: String,
    doctor_notes: String,
    prescription: String,
    follow_up_required: i32,
    follow_up_date: Option<String>,
    created_at: String,
    updated_at: String,
}

fn appointment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        date: row.get(3)?,
        time: row.get(4)?,
        status: row.get(5)?,
        notes: row.get(6)?,
        doctor_notes: row.get(7)?,
        prescription: row.get(8)?,
        follow_up_required: row.get(9)?,
        follow_up_date: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: Uuid::parse_str(&row.id).unwrap_or_default(),
        patient_id: Uuid::parse_str(&row.patient_id).unwrap_or_default(),
        doctor_id: Uuid::parse_str(&row.doctor_id).unwrap_or_default(),
        date: parse_date(&row.date),
        time: parse_time(&row.time),
        status: AppointmentStatus::from_str(&row.status)?,
        notes: row.notes,
        doctor_notes: row.doctor_notes,
        prescription: row.prescription,
        follow_up_required: row.follow_up_required != 0,
        follow_up_date: row
            .follow_up_date
            .and_then(|d| NaiveDate::parse_from_str(&d, DATE_FMT).ok()),
        created_at: parse_datetime(&row.created_at),
        updated_at: parse_datetime(&row.updated_at),
    })
}

/// Inserts a new appointment row. A violation of the slot uniqueness index
/// surfaces as `DatabaseError::Sqlite`; the ledger translates it.
pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, patient_id, doctor_id, date, time, status, notes,
         doctor_notes, prescription, follow_up_required, follow_up_date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            appt.id.to_string(),
            appt.patient_id.to_string(),
            appt.doctor_id.to_string(),
            appt.date.to_string(),
            appt.time.format(TIME_FMT).to_string(),
            appt.status.as_str(),
            appt.notes,
            appt.doctor_notes,
            appt.prescription,
            appt.follow_up_required as i32,
            appt.follow_up_date.map(|d| d.to_string()),
            appt.created_at.format(super::DATETIME_FMT).to_string(),
            appt.updated_at.format(super::DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], appointment_row);

    match result {
        Ok(row) => Ok(Some(appointment_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Compare-and-swap on status: the UPDATE applies only while the row still
/// holds `expected`. Returns the number of rows changed (0 = lost the race
/// or wrong state; the caller re-reads to tell which).
pub fn cas_status(
    conn: &Connection,
    id: &Uuid,
    expected: AppointmentStatus,
    to: AppointmentStatus,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2
         WHERE id = ?3 AND status = ?4",
        params![to.as_str(), now_text(), id.to_string(), expected.as_str()],
    )?;
    Ok(changed)
}

/// Cancellation compare-and-swap: guarded by the cancellable predicate
/// (live status AND date not in the past) in the same statement.
pub fn cas_cancel(conn: &Connection, id: &Uuid, today: NaiveDate) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = 'Cancelled', updated_at = ?1
         WHERE id = ?2 AND status IN ('Pending', 'Confirmed') AND date >= ?3",
        params![now_text(), id.to_string(), today.to_string()],
    )?;
    Ok(changed)
}

/// Completion compare-and-swap: allowed from either live state, never from
/// a terminal one.
pub fn cas_complete(conn: &Connection, id: &Uuid) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = 'Completed', updated_at = ?1
         WHERE id = ?2 AND status IN ('Pending', 'Confirmed')",
        params![now_text(), id.to_string()],
    )?;
    Ok(changed)
}

/// Writes the doctor-side fields (notes, prescription, follow-up) without
/// touching status. Applies only while the appointment is live.
pub fn update_appointment_details(
    conn: &Connection,
    id: &Uuid,
    details: &AppointmentDetails,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET doctor_notes = ?1, prescription = ?2,
         follow_up_required = ?3, follow_up_date = ?4, updated_at = ?5
         WHERE id = ?6 AND status IN ('Pending', 'Confirmed')",
        params![
            details.doctor_notes,
            details.prescription,
            details.follow_up_required as i32,
            details.follow_up_date.map(|d| d.to_string()),
            now_text(),
            id.to_string(),
        ],
    )?;
    Ok(changed)
}

/// Which side of the appointment a listing belongs to.
#[derive(Debug, Clone, Copy)]
pub enum AppointmentParty {
    Patient,
    Doctor,
}

impl AppointmentParty {
    fn column(self) -> &'static str {
        match self {
            Self::Patient => "patient_id",
            Self::Doctor => "doctor_id",
        }
    }
}

/// Appointments for one party, optionally status-filtered, newest first.
pub fn list_appointments(
    conn: &Connection,
    party: AppointmentParty,
    party_id: &Uuid,
    status: Option<AppointmentStatus>,
    offset: u32,
    limit: u32,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE {} = ?1",
        party.column()
    );
    if status.is_some() {
        sql.push_str(" AND status = ?2");
    }
    sql.push_str(&format!(
        " ORDER BY created_at DESC, rowid DESC LIMIT {limit} OFFSET {offset}"
    ));

    let mut stmt = conn.prepare(&sql)?;

    let raw: Vec<rusqlite::Result<AppointmentRow>> = match status {
        Some(s) => stmt
            .query_map(params![party_id.to_string(), s.as_str()], appointment_row)?
            .collect(),
        None => stmt
            .query_map(params![party_id.to_string()], appointment_row)?
            .collect(),
    };

    let mut appointments = Vec::new();
    for row in raw {
        appointments.push(appointment_from_row(row?)?);
    }
    Ok(appointments)
}

pub fn count_appointments(
    conn: &Connection,
    party: AppointmentParty,
    party_id: &Uuid,
    status: Option<AppointmentStatus>,
) -> Result<u64, DatabaseError> {
    let count: i64 = match status {
        Some(s) => conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM appointments WHERE {} = ?1 AND status = ?2",
                party.column()
            ),
            params![party_id.to_string(), s.as_str()],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM appointments WHERE {} = ?1",
                party.column()
            ),
            params![party_id.to_string()],
            |row| row.get(0),
        )?,
    };
    Ok(count as u64)
}

/// Per-status counts for one party's dashboard.
pub fn appointment_stats(
    conn: &Connection,
    party: AppointmentParty,
    party_id: &Uuid,
) -> Result<AppointmentStats, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT status, COUNT(*) FROM appointments WHERE {} = ?1 GROUP BY status",
        party.column()
    ))?;

    let rows = stmt.query_map(params![party_id.to_string()], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut stats = AppointmentStats::default();
    for row in rows {
        let (status, count) = row?;
        let count = count as u64;
        stats.total += count;
        match AppointmentStatus::from_str(&status)? {
            AppointmentStatus::Pending => stats.pending = count,
            AppointmentStatus::Confirmed => stats.confirmed = count,
            AppointmentStatus::Completed => stats.completed = count,
            AppointmentStatus::Cancelled => stats.cancelled = count,
        }
    }
    Ok(stats)
}
