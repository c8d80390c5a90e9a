//! REST implementation of [`QuoteApi`]

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::{ApiError, HttpClient, QuoteApi};
use crate::types::{
    CalculatedQuote, Plan, QuoteListItem, QuotePayload, QuoteRecord, VerificationResponse,
};

#[derive(Debug, Deserialize)]
struct CreatedQuote {
    #[serde(alias = "cotizacionId")]
    id: u64,
}

pub struct RestQuoteApi {
    http: HttpClient,
}

impl RestQuoteApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl QuoteApi for RestQuoteApi {
    async fn verify_client(
        &self,
        dni: &str,
        cancel: &CancellationToken,
    ) -> Result<VerificationResponse, ApiError> {
        self.http.require_session()?;
        self.http
            .get_json(&format!("/cotizaciones/verify-dni/{}", dni), cancel)
            .await
    }

    async fn active_plans(&self, cancel: &CancellationToken) -> Result<Vec<Plan>, ApiError> {
        self.http.require_session()?;
        self.http.get_json("/plans/active", cancel).await
    }

    async fn calculate(
        &self,
        payload: &QuotePayload,
        cancel: &CancellationToken,
    ) -> Result<CalculatedQuote, ApiError> {
        self.http.require_session()?;
        self.http
            .post_json("/cotizaciones/calculate", payload, cancel)
            .await
    }

    async fn create_quote(
        &self,
        payload: &QuotePayload,
        cancel: &CancellationToken,
    ) -> Result<u64, ApiError> {
        self.http.require_session()?;
        let created: CreatedQuote = self.http.post_json("/cotizaciones", payload, cancel).await?;
        Ok(created.id)
    }

    async fn update_quote(
        &self,
        id: u64,
        payload: &QuotePayload,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.http.require_session()?;
        let _: Value = self
            .http
            .put_json(&format!("/cotizaciones/{}", id), payload, cancel)
            .await?;
        Ok(())
    }

    async fn fetch_quote(
        &self,
        id: u64,
        cancel: &CancellationToken,
    ) -> Result<QuoteRecord, ApiError> {
        self.http.require_session()?;
        self.http
            .get_json(&format!("/cotizaciones/{}", id), cancel)
            .await
    }

    async fn void_quote(&self, id: u64, cancel: &CancellationToken) -> Result<(), ApiError> {
        self.http.require_session()?;
        let _: Value = self
            .http
            .put_empty(&format!("/cotizaciones/anular/{}", id), cancel)
            .await?;
        Ok(())
    }

    async fn download_pdf(
        &self,
        id: u64,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ApiError> {
        self.http.require_session()?;
        self.http
            .get_bytes(&format!("/cotizaciones/{}/pdf", id), cancel)
            .await
    }

    async fn my_quotes(&self, cancel: &CancellationToken) -> Result<Vec<QuoteListItem>, ApiError> {
        self.http.require_session()?;
        self.http.get_json("/cotizaciones/asesor", cancel).await
    }
}
