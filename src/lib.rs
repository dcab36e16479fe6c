//! CareLedger: the appointment-booking core of a doctor-appointment system.
//!
//! Owns appointment records and their lifecycle (Pending → Confirmed /
//! Cancelled → Completed), enforces the booking invariants (one live booking
//! per slot, no past dates, business hours, follow-up consistency), and
//! carries the doctor/patient directories and availability data the ledger
//! references. Transport, authentication, and mail delivery belong to the
//! embedding application: callers supply an opaque `Principal` and a
//! `NotificationSink`.

pub mod config;
pub mod db;
pub mod directory;
pub mod ledger;
pub mod models;
pub mod notify;
pub mod principal;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for an embedding binary. Honors RUST_LOG.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("CareLedger starting v{}", config::APP_VERSION);
}
