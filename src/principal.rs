//! Acting principal supplied by the surrounding identity provider.
//!
//! The ledger trusts these values and performs no credential verification.
//! Roles are a tagged variant rather than boolean flags, so an account that
//! is neither patient nor doctor is unrepresentable.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

/// The authenticated actor performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn patient(id: Uuid) -> Self {
        Self { id, role: Role::Patient }
    }

    pub fn doctor(id: Uuid) -> Self {
        Self { id, role: Role::Doctor }
    }

    pub fn admin(id: Uuid) -> Self {
        Self { id, role: Role::Admin }
    }

    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}
