//! Sign-in form

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::{ApiError, AuthApi};
use crate::quoter::Notice;
use crate::session::Session;

pub struct LoginPage {
    api: Arc<dyn AuthApi>,
    session: Session,
    cancel: CancellationToken,
    pub legajo: String,
    pub password: String,
    pub remember: bool,
    notice: Option<Notice>,
}

impl LoginPage {
    pub fn new(api: Arc<dyn AuthApi>, session: Session) -> Self {
        Self {
            api,
            session,
            cancel: CancellationToken::new(),
            legajo: String::new(),
            password: String::new(),
            remember: false,
            notice: None,
        }
    }

    /// Digits only; anything else is dropped at the field
    pub fn set_legajo(&mut self, raw: &str) -> bool {
        if !raw.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        self.legajo = raw.to_string();
        true
    }

    /// Sign in with the typed credentials. Returns true once the session holds
    /// the new identity.
    pub async fn submit(&mut self) -> bool {
        let Ok(legajo) = self.legajo.trim().parse::<u64>() else {
            self.notice = Some(Notice::warning(
                "Datos Incompletos",
                "Ingrese su legajo y contraseña.",
            ));
            return false;
        };
        if self.password.is_empty() {
            self.notice = Some(Notice::warning(
                "Datos Incompletos",
                "Ingrese su legajo y contraseña.",
            ));
            return false;
        }

        let identity = match self.api.login(legajo, &self.password, &self.cancel).await {
            Ok(identity) => identity,
            Err(err) => {
                self.notice = Some(login_failure(&err));
                return false;
            }
        };

        if let Err(e) = self.session.login(identity, self.remember) {
            warn!("could not persist session: {:#}", e);
            self.notice = Some(Notice::error(
                "Error de Sesión",
                "No se pudo guardar la sesión. Intente nuevamente.",
            ));
            return false;
        }
        info!(legajo, "operator signed in");
        self.password.clear();
        true
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn acknowledge_notice(&mut self) {
        self.notice = None;
    }
}

impl Drop for LoginPage {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// On the login endpoint 401 means bad credentials, not an expired session
fn login_failure(err: &ApiError) -> Notice {
    match err {
        ApiError::Unauthorized { .. } => Notice::error(
            "Credenciales Inválidas",
            "Legajo o contraseña incorrectos.",
        ),
        ApiError::Forbidden { message } => Notice::error(
            "Cuenta Inactiva",
            message
                .clone()
                .unwrap_or_else(|| "Su cuenta aún no fue habilitada.".to_string()),
        ),
        ApiError::RateLimited { .. } => Notice::warning("Demasiados Intentos", err.user_message()),
        other => Notice::error("Error de Conexión", other.user_message()),
    }
}
