//! REST implementation of [`AuthApi`]

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::{Ack, ApiError, AuthApi, HttpClient};
use crate::session::Identity;

/// Self-service registration form. New accounts start inactive and wait for
/// an administrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationDraft {
    pub legajo: u64,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub telefono: String,
    pub direccion: String,
    pub password: String,
}

impl RegistrationDraft {
    /// First missing required field, if any
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.legajo == 0 {
            Some("legajo")
        } else if self.nombre.trim().is_empty() {
            Some("nombre")
        } else if self.apellido.trim().is_empty() {
            Some("apellido")
        } else if self.email.trim().is_empty() {
            Some("email")
        } else if self.password.is_empty() {
            Some("password")
        } else {
            None
        }
    }
}

#[derive(Serialize)]
struct ProfileUpdate<'a> {
    email: &'a str,
    telefono: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
}

pub struct RestAuthApi {
    http: HttpClient,
}

impl RestAuthApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AuthApi for RestAuthApi {
    /// 401 here means wrong credentials, not an expired session
    async fn login(
        &self,
        legajo: u64,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<Identity, ApiError> {
        let body = json!({ "legajo": legajo, "password": password });
        self.http.post_json("/employees/login", &body, cancel).await
    }

    async fn register(
        &self,
        draft: &RegistrationDraft,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        let ack: Ack = self
            .http
            .post_json("/employees/register", draft, cancel)
            .await?;
        Ok(ack.into_message(
            "Registro exitoso. Un administrador debe activar su cuenta.",
        ))
    }

    async fn forgot_password(
        &self,
        email: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        let ack: Ack = self
            .http
            .post_json("/employees/forgot-password", &json!({ "email": email }), cancel)
            .await?;
        Ok(ack.into_message(
            "Si el correo está registrado, recibirá un enlace para restablecer su contraseña.",
        ))
    }

    async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        let ack: Ack = self
            .http
            .post_json(
                &format!("/employees/reset-password/{}", token),
                &json!({ "newPassword": new_password }),
                cancel,
            )
            .await?;
        Ok(ack.into_message("Contraseña actualizada."))
    }

    async fn confirm_email(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        let ack: Ack = self
            .http
            .get_json(&format!("/employees/confirm-email/{}", token), cancel)
            .await?;
        Ok(ack.into_message("Correo confirmado."))
    }

    async fn update_profile(
        &self,
        email: &str,
        telefono: &str,
        password: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        self.http.require_session()?;
        let body = ProfileUpdate {
            email,
            telefono,
            password: password.filter(|p| !p.is_empty()),
        };
        let ack: Ack = self
            .http
            .put_json("/employees/myprofile", &body, cancel)
            .await?;
        Ok(ack.into_message("Perfil actualizado."))
    }
}
