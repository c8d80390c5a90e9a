//! Local checks that gate wizard transitions. None of these reach the network.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::types::{ClientDraft, FamilyMember, QuoteConfig};

static DNI_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{7,8}$").expect("DNI pattern must be a valid regex"));

pub const MAX_AGE: u8 = 99;
pub const MAX_DNI_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("El DNI debe tener 7 u 8 dígitos numéricos.")]
    InvalidDni,
    #[error("Complete los campos obligatorios: {}.", .0.join(", "))]
    MissingClientFields(Vec<&'static str>),
    #[error("Seleccione un plan.")]
    MissingPlan,
    #[error("Seleccione el tipo de ingreso.")]
    MissingChannel,
    #[error("Complete parentesco y edad de todos los integrantes.")]
    IncompleteMembers,
}

pub fn is_valid_dni(dni: &str) -> bool {
    DNI_PATTERN.is_match(dni.trim())
}

pub fn check_dni(dni: &str) -> Result<(), ValidationError> {
    if is_valid_dni(dni) {
        Ok(())
    } else {
        Err(ValidationError::InvalidDni)
    }
}

/// Identify step: names, email, phone, age and the locality are required
pub fn check_client(client: &ClientDraft) -> Result<(), ValidationError> {
    let mut missing = Vec::new();
    let required = [
        ("nombres", &client.given_names),
        ("apellidos", &client.family_names),
        ("email", &client.email),
        ("teléfono", &client.phone),
    ];
    for (label, value) in required {
        if value.trim().is_empty() {
            missing.push(label);
        }
    }
    if client.age.is_none() {
        missing.push("edad");
    }
    if client.locality.trim().is_empty() {
        missing.push("ciudad/dirección");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingClientFields(missing))
    }
}

/// Configure step. The monotributo category is deliberately not required
/// here; the backend rejects the calculation if it matters.
pub fn check_configuration(
    config: &QuoteConfig,
    members: &[FamilyMember],
) -> Result<(), ValidationError> {
    if config.plan_id.is_none() {
        return Err(ValidationError::MissingPlan);
    }
    if config.channel.is_none() {
        return Err(ValidationError::MissingChannel);
    }
    if !members.iter().all(FamilyMember::is_complete) {
        return Err(ValidationError::IncompleteMembers);
    }
    Ok(())
}

/// Keystroke filter for age inputs: digits only, 0..=99.
/// Returns the accepted value or `None` to reject the edit.
pub fn filter_age_input(raw: &str) -> Option<Option<u8>> {
    if raw.is_empty() {
        return Some(None);
    }
    if !raw.chars().all(|c| c.is_ascii_digit()) || raw.len() > 2 {
        return None;
    }
    raw.parse::<u8>()
        .ok()
        .filter(|age| *age <= MAX_AGE)
        .map(Some)
}

/// Keystroke filter for the identifier: digits only, at most 8
pub fn filter_dni_input(raw: &str) -> Option<String> {
    if raw.len() <= MAX_DNI_LEN && raw.chars().all(|c| c.is_ascii_digit()) {
        Some(raw.to_string())
    } else {
        None
    }
}
