//! Modal notices raised by the wizard and the list pages

use crate::api::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// What acknowledging a notice does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeAction {
    Dismiss,
    /// Session expired; leave for the login screen
    RedirectToLogin,
    /// The quote opened for editing could not be loaded
    ReturnToList,
    /// Load the operator's previous quote for the client just found
    LoadExistingClient,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub action: NoticeAction,
}

pub const SESSION_EXPIRED_TITLE: &str = "Sesión Expirada";

impl Notice {
    pub fn new(severity: Severity, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            message: message.into(),
            confirm_label: "Aceptar".to_string(),
            action: NoticeAction::Dismiss,
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, title, message)
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Success, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, title, message)
    }

    pub fn with_action(mut self, action: NoticeAction, label: impl Into<String>) -> Self {
        self.action = action;
        self.confirm_label = label.into();
        self
    }

    pub fn session_expired() -> Self {
        Self::error(
            SESSION_EXPIRED_TITLE,
            "Su sesión ha caducado. Será redirigido al login.",
        )
        .with_action(NoticeAction::RedirectToLogin, "Aceptar")
    }

    /// Notice for a failed remote call. Authorization failures always
    /// become the session-expired notice regardless of `title`.
    pub fn from_api_error(title: &str, err: &ApiError) -> Self {
        if err.is_auth_error() {
            Self::session_expired()
        } else {
            Self::error(title, err.user_message())
        }
    }

    pub fn is_session_expired(&self) -> bool {
        self.action == NoticeAction::RedirectToLogin
    }
}
