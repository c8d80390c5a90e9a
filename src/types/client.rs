//! Client (prospect) data as edited in the wizard and as exchanged with the backend.

use serde::{Deserialize, Serialize};

use super::wire;

/// Identity and contact data for the person being quoted.
///
/// `locality` is the single source of truth for the place of residence; the
/// backend still stores it under both `ciudad` and `direccion`, so the split
/// only happens in [`ClientPayload`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientDraft {
    pub dni: String,
    pub given_names: String,
    pub family_names: String,
    pub email: String,
    pub phone: String,
    pub locality: String,
    pub age: Option<u8>,
}

impl ClientDraft {
    /// Draft for an identifier that has not been seen before
    pub fn with_dni(dni: impl Into<String>) -> Self {
        Self {
            dni: dni.into(),
            ..Self::default()
        }
    }

    /// Build a draft from a server record; age is owned by the family group
    /// and filled in by the caller.
    pub fn from_record(record: &ClientRecord) -> Self {
        Self {
            dni: record.dni.clone(),
            given_names: record.nombres.clone(),
            family_names: record.apellidos.clone(),
            email: record.email.clone(),
            phone: record.telefono.clone(),
            locality: record.locality().to_string(),
            age: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_names, self.family_names)
            .trim()
            .to_string()
    }

    pub fn to_payload(&self) -> ClientPayload {
        ClientPayload {
            dni: self.dni.clone(),
            nombres: self.given_names.clone(),
            apellidos: self.family_names.clone(),
            email: self.email.clone(),
            telefono: self.phone.clone(),
            ciudad: self.locality.clone(),
            direccion: self.locality.clone(),
            edad: self.age,
        }
    }
}

/// Client object as returned inside lookups and fetched quotes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub dni: String,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub nombres: String,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub apellidos: String,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub email: String,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub telefono: String,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub ciudad: String,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub direccion: String,
}

impl ClientRecord {
    /// Older rows only filled one of the two locality columns
    pub fn locality(&self) -> &str {
        if self.ciudad.trim().is_empty() {
            &self.direccion
        } else {
            &self.ciudad
        }
    }
}

/// `clienteData` section of calculate/create/update requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientPayload {
    pub dni: String,
    pub nombres: String,
    pub apellidos: String,
    pub email: String,
    pub telefono: String,
    pub ciudad: String,
    pub direccion: String,
    pub edad: Option<u8>,
}
