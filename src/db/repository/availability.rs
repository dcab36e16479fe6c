use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

use super::{parse_datetime, parse_time, TIME_FMT};

fn slot_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(AvailabilitySlot, String)> {
    // Weekday parsing is deferred to the caller so enum errors surface as
    // DatabaseError rather than a rusqlite conversion failure.
    Ok((
        AvailabilitySlot {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
            doctor_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
            day_of_week: Weekday::Monday,
            start_time: parse_time(&row.get::<_, String>(3)?),
            end_time: parse_time(&row.get::<_, String>(4)?),
            is_available: row.get::<_, i32>(5)? != 0,
            created_at: parse_datetime(&row.get::<_, String>(6)?),
        },
        row.get::<_, String>(2)?,
    ))
}

/// Sets the availability window for a (doctor, weekday) pair, replacing any
/// existing one. At most one slot per pair. The replacement takes the new
/// row's id, so the caller's `slot` stays a valid handle to the stored row.
pub fn upsert_availability_slot(
    conn: &Connection,
    slot: &AvailabilitySlot,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO availability_slots (id, doctor_id, day_of_week, start_time, end_time,
         is_available, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT (doctor_id, day_of_week) DO UPDATE SET
         id = excluded.id,
         start_time = excluded.start_time,
         end_time = excluded.end_time,
         is_available = excluded.is_available",
        params![
            slot.id.to_string(),
            slot.doctor_id.to_string(),
            slot.day_of_week.as_str(),
            slot.start_time.format(TIME_FMT).to_string(),
            slot.end_time.format(TIME_FMT).to_string(),
            slot.is_available as i32,
            slot.created_at.format(super::DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

/// A doctor's advertised windows, weekday order then start time.
pub fn list_availability(
    conn: &Connection,
    doctor_id: &Uuid,
    only_available: bool,
) -> Result<Vec<AvailabilitySlot>, DatabaseError> {
    let mut sql = String::from(
        "SELECT id, doctor_id, day_of_week, start_time, end_time, is_available, created_at
         FROM availability_slots WHERE doctor_id = ?1",
    );
    if only_available {
        sql.push_str(" AND is_available = 1");
    }
    sql.push_str(
        " ORDER BY CASE day_of_week
            WHEN 'Monday' THEN 1 WHEN 'Tuesday' THEN 2 WHEN 'Wednesday' THEN 3
            WHEN 'Thursday' THEN 4 WHEN 'Friday' THEN 5 WHEN 'Saturday' THEN 6
            ELSE 7 END, start_time",
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![doctor_id.to_string()], slot_from_row)?;

    let mut slots = Vec::new();
    for row in rows {
        let (mut slot, day) = row?;
        slot.day_of_week = Weekday::from_str(&day)?;
        slots.push(slot);
    }
    Ok(slots)
}

pub fn delete_availability_slot(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM availability_slots WHERE id = ?1",
        params![id.to_string()],
    )?;
    if deleted == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "AvailabilitySlot".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Owning doctor of a slot, for authorization checks.
pub fn slot_owner(conn: &Connection, id: &Uuid) -> Result<Option<Uuid>, DatabaseError> {
    let result = conn.query_row(
        "SELECT doctor_id FROM availability_slots WHERE id = ?1",
        params![id.to_string()],
        |row| row.get::<_, String>(0),
    );
    match result {
        Ok(s) => Ok(Some(Uuid::parse_str(&s).unwrap_or_default())),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
