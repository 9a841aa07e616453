//! Identity and organizational unit models exchanged with the auth endpoints.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Identifier of an organizational unit.
pub type UnitId = u64;

/// The authenticated person.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: u64,
    pub name: String,
    pub email: String,
}

/// An organizational unit ("team") the identity belongs to, with the
/// permissions the identity holds inside it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Unit {
    pub fn permission_set(&self) -> HashSet<String> {
        self.permissions.iter().cloned().collect()
    }
}

/// Identity, unit memberships and the designated active unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthProfile {
    pub identity: Identity,
    pub units: Vec<Unit>,
    pub active_unit_id: UnitId,
}

/// Response body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    pub token: String,
    #[serde(flatten)]
    pub profile: AuthProfile,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/switch-unit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchUnitRequest {
    pub unit_id: UnitId,
}

/// Response body of `POST /auth/switch-unit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchUnitResponse {
    pub active_unit_id: UnitId,
    #[serde(default)]
    pub permissions: Vec<String>,
}
