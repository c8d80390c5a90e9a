//! Bearer-authenticated JSON client for the quoting backend

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::ApiError;
use crate::config::Config;
use crate::session::Session;

const USER_AGENT: &str = concat!("sigec/", env!("CARGO_PKG_VERSION"));

/// Error body shape shared by every backend route
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Shared HTTP adapter. Reads the credential from the [`Session`] on every
/// request and never mutates it.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    session: Session,
}

impl HttpClient {
    pub fn new(config: &Config, session: Session) -> Result<Self, ApiError> {
        Self::with_base_url(&config.api.base_url, config.request_timeout(), session)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Duration,
        session: Session,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fail fast for routes that are meaningless without a credential
    pub fn require_session(&self) -> Result<(), ApiError> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(ApiError::NotAuthenticated)
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "backend request");

        let builder = self.client.request(method, url);
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute(
        &self,
        builder: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<Response, ApiError> {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            result = builder.send() => result.map_err(|e| ApiError::network(e.to_string()))?,
        };

        check_status(response).await
    }

    async fn read_json<T: DeserializeOwned>(
        response: Response,
        cancel: &CancellationToken,
    ) -> Result<T, ApiError> {
        let bytes = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            result = response.bytes() => result.map_err(|e| ApiError::network(e.to_string()))?,
        };
        decode_body(&bytes)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<T, ApiError> {
        let response = self.execute(self.request(Method::GET, path), cancel).await?;
        Self::read_json(response, cancel).await
    }

    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path).json(body);
        let response = self.execute(builder, cancel).await?;
        Self::read_json(response, cancel).await
    }

    pub async fn put_json<B, T>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::PUT, path).json(body);
        let response = self.execute(builder, cancel).await?;
        Self::read_json(response, cancel).await
    }

    /// PUT with no request body (status transitions such as voiding)
    pub async fn put_empty<T: DeserializeOwned>(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<T, ApiError> {
        let response = self.execute(self.request(Method::PUT, path), cancel).await?;
        Self::read_json(response, cancel).await
    }

    pub async fn delete(&self, path: &str, cancel: &CancellationToken) -> Result<(), ApiError> {
        self.execute(self.request(Method::DELETE, path), cancel)
            .await
            .map(|_| ())
    }

    /// Binary download (quote documents)
    pub async fn get_bytes(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ApiError> {
        let response = self.execute(self.request(Method::GET, path), cancel).await?;
        let bytes = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            result = response.bytes() => result.map_err(|e| ApiError::network(e.to_string()))?,
        };
        Ok(bytes.to_vec())
    }
}

/// Map a response status onto [`ApiError`], pulling the server's
/// `message` out of the body when there is one.
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = server_message(&body);
    warn!(status = status.as_u16(), "backend returned error status");

    Err(match status.as_u16() {
        401 => ApiError::unauthorized(message),
        403 => ApiError::forbidden(message),
        429 => ApiError::rate_limited(message),
        code => ApiError::business(code, message.unwrap_or(body)),
    })
}

fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty())
}

/// Empty bodies decode as JSON `null` so `()`/`Option`/`Value` targets work
/// for routes that answer 204.
fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let slice: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        bytes
    };
    serde_json::from_slice(slice).map_err(|e| ApiError::decode(e.to_string()))
}
