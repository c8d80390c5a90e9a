//! Remote failure taxonomy for the quoting backend

use std::fmt;

/// Errors that can occur when talking to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 401 Unauthorized - token invalid or expired
    Unauthorized { message: Option<String> },
    /// 403 Forbidden - token lacks the role for this resource
    Forbidden { message: Option<String> },
    /// 429 Too many attempts
    RateLimited { message: Option<String> },
    /// Any other non-success status; `message` is the server's explanation
    Business { status: u16, message: String },
    /// Connection refused, DNS, timeout
    Network { message: String },
    /// A 2xx body that does not match the expected shape
    Decode { message: String },
    /// The owning controller was torn down before the response arrived
    Cancelled,
    /// A call that needs a session was issued while signed out
    NotAuthenticated,
}

impl ApiError {
    /// Check if this is an authentication error (401 or 403)
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized { .. } | ApiError::Forbidden { .. } | ApiError::NotAuthenticated
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }

    pub fn unauthorized(message: Option<String>) -> Self {
        ApiError::Unauthorized { message }
    }

    pub fn forbidden(message: Option<String>) -> Self {
        ApiError::Forbidden { message }
    }

    pub fn rate_limited(message: Option<String>) -> Self {
        ApiError::RateLimited { message }
    }

    pub fn business(status: u16, message: impl Into<String>) -> Self {
        ApiError::Business {
            status,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        ApiError::Network {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        ApiError::Decode {
            message: message.into(),
        }
    }

    /// HTTP status behind this error, if it came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::RateLimited { .. } => Some(429),
            ApiError::Business { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text suitable for a notice body: the server's own message when it
    /// sent one, otherwise a generic description.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized { message: Some(m) }
            | ApiError::Forbidden { message: Some(m) }
            | ApiError::RateLimited { message: Some(m) } => m.clone(),
            ApiError::Business { message, .. } if !message.trim().is_empty() => message.clone(),
            ApiError::Network { .. } => {
                "No se pudo conectar con el servidor. Intente nuevamente.".to_string()
            }
            ApiError::Decode { .. } => "Respuesta inesperada del servidor.".to_string(),
            ApiError::RateLimited { message: None } => {
                "Demasiados intentos. Espere unos minutos.".to_string()
            }
            ApiError::Unauthorized { message: None } | ApiError::NotAuthenticated => {
                "Su sesión ha expirado. Inicie sesión nuevamente.".to_string()
            }
            ApiError::Forbidden { message: None } => {
                "No tiene permisos para realizar esta acción.".to_string()
            }
            ApiError::Cancelled => "Operación cancelada.".to_string(),
            ApiError::Business { status, .. } => format!("Error del servidor ({})", status),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized { message } => match message {
                Some(m) => write!(f, "Unauthorized (401) - {}", m),
                None => write!(f, "Unauthorized (401)"),
            },
            ApiError::Forbidden { message } => match message {
                Some(m) => write!(f, "Forbidden (403) - {}", m),
                None => write!(f, "Forbidden (403) - insufficient permissions"),
            },
            ApiError::RateLimited { message } => match message {
                Some(m) => write!(f, "Rate limited (429) - {}", m),
                None => write!(f, "Rate limited (429)"),
            },
            ApiError::Business { status, message } => {
                write!(f, "HTTP {} - {}", status, message)
            }
            ApiError::Network { message } => write!(f, "Network error - {}", message),
            ApiError::Decode { message } => write!(f, "Unexpected response - {}", message),
            ApiError::Cancelled => write!(f, "Request cancelled"),
            ApiError::NotAuthenticated => write!(f, "Not signed in"),
        }
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_auth_error() {
        assert!(ApiError::unauthorized(None).is_auth_error());
        assert!(ApiError::forbidden(None).is_auth_error());
        assert!(ApiError::NotAuthenticated.is_auth_error());
        assert!(!ApiError::rate_limited(None).is_auth_error());
        assert!(!ApiError::network("timeout").is_auth_error());
        assert!(!ApiError::business(409, "duplicado").is_auth_error());
    }

    #[test]
    fn test_status() {
        assert_eq!(ApiError::unauthorized(None).status(), Some(401));
        assert_eq!(ApiError::business(422, "x").status(), Some(422));
        assert_eq!(ApiError::Cancelled.status(), None);
    }

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = ApiError::business(400, "El DNI ya existe");
        assert_eq!(err.user_message(), "El DNI ya existe");

        let err = ApiError::business(500, "  ");
        assert_eq!(err.user_message(), "Error del servidor (500)");

        let err = ApiError::rate_limited(Some("Espere 15 minutos".to_string()));
        assert_eq!(err.user_message(), "Espere 15 minutos");
    }

    #[test]
    fn test_display() {
        let err = ApiError::business(404, "Cotización no encontrada");
        assert_eq!(err.to_string(), "HTTP 404 - Cotización no encontrada");

        let err = ApiError::forbidden(None);
        assert_eq!(err.to_string(), "Forbidden (403) - insufficient permissions");
    }
}
