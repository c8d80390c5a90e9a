//! Employee accounts as listed and edited by administrators

use serde::{Deserialize, Serialize};
use std::fmt;

use super::wire;

/// Access role of an employee (`rol`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(rename = "administrador")]
    Administrator,
    Supervisor,
    /// Sales advisor; the role that produces quotes
    #[serde(rename = "asesor")]
    Advisor,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Administrator, Role::Supervisor, Role::Advisor];

    pub fn wire_name(self) -> &'static str {
        match self {
            Role::Administrator => "administrador",
            Role::Supervisor => "supervisor",
            Role::Advisor => "asesor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Stored account state (`estado`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeState {
    #[serde(rename = "activo")]
    Active,
    #[serde(rename = "inactivo")]
    Inactive,
}

impl EmployeeState {
    pub fn toggled(self) -> Self {
        match self {
            EmployeeState::Active => EmployeeState::Inactive,
            EmployeeState::Inactive => EmployeeState::Active,
        }
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            EmployeeState::Active => "activo",
            EmployeeState::Inactive => "inactivo",
        }
    }
}

/// Status shown to administrators. An inactive account whose email was
/// never confirmed is a fresh registration awaiting approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayStatus {
    Active,
    Pending,
    Inactive,
}

impl DisplayStatus {
    pub fn label(self) -> &'static str {
        match self {
            DisplayStatus::Active => "activo",
            DisplayStatus::Pending => "pendiente",
            DisplayStatus::Inactive => "inactivo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub legajo: u64,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub nombre: String,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub apellido: String,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub email: String,
    pub rol: Role,
    pub estado: EmployeeState,
    #[serde(default, deserialize_with = "wire::flag")]
    pub email_confirmado: bool,
    #[serde(default)]
    pub supervisor_id: Option<u64>,
}

impl Employee {
    pub fn display_status(&self) -> DisplayStatus {
        match (self.estado, self.email_confirmado) {
            (EmployeeState::Active, _) => DisplayStatus::Active,
            (EmployeeState::Inactive, false) => DisplayStatus::Pending,
            (EmployeeState::Inactive, true) => DisplayStatus::Inactive,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellido)
    }
}
