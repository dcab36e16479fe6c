//! Repository layer: entity-scoped database operations.
//!
//! Free functions over `&Connection`, one sub-module per entity. All public
//! functions are re-exported here.

mod appointment;
mod availability;
mod doctor;
mod medical_record;
mod patient;

pub use appointment::*;
pub use availability::*;
pub use doctor::*;
pub use medical_record::*;
pub use patient::*;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

pub(crate) const DATE_FMT: &str = "%Y-%m-%d";
pub(crate) const TIME_FMT: &str = "%H:%M:%S";
pub(crate) const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FMT).unwrap_or_default()
}

pub(crate) fn parse_time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, TIME_FMT).unwrap_or_default()
}

pub(crate) fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_default()
}

/// Current local timestamp in storage format.
pub(crate) fn now_text() -> String {
    chrono::Local::now().naive_local().format(DATETIME_FMT).to_string()
}
