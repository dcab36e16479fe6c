use std::path::PathBuf;

use chrono::NaiveTime;

/// Application-level constants
pub const APP_NAME: &str = "CareLedger";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Earliest bookable time of day, inclusive.
pub fn business_open() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).expect("valid time")
}

/// Latest bookable time of day, inclusive.
pub fn business_close() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 0, 0).expect("valid time")
}

/// Fixed page sizes for the listing projections.
pub const DOCTORS_PAGE_SIZE: u32 = 6;
pub const APPOINTMENTS_PAGE_SIZE: u32 = 10;
pub const MEDICAL_RECORDS_PAGE_SIZE: u32 = 10;

/// Get the application data directory (~/CareLedger/)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("CareLedger")
}

/// Default database path
pub fn database_path() -> PathBuf {
    app_data_dir().join("careledger.db")
}

/// Default log filter used when RUST_LOG is unset
pub fn default_log_filter() -> String {
    "careledger=info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("CareLedger"));
    }

    #[test]
    fn database_path_under_app_data() {
        let db = database_path();
        assert!(db.starts_with(app_data_dir()));
    }

    #[test]
    fn business_window_bounds() {
        assert!(business_open() < business_close());
        assert_eq!(business_open(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(business_close(), NaiveTime::from_hms_opt(18, 0, 0).unwrap());
    }
}
