//! Backend clients
//!
//! This module provides:
//! - [`HttpClient`], the bearer-authenticated adapter every call goes through
//! - Domain traits ([`QuoteApi`], [`AdminApi`], [`AuthApi`]) that controllers
//!   depend on, so tests can swap in in-memory fakes
//! - REST implementations of those traits
//! - [`ApiError`], the remote failure taxonomy

pub mod admin;
pub mod auth;
pub mod client;
pub mod error;
pub mod quotes;

pub use admin::RestAdminApi;
pub use auth::{RegistrationDraft, RestAuthApi};
pub use client::HttpClient;
pub use error::ApiError;
pub use quotes::RestQuoteApi;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use crate::session::Identity;
use crate::types::{
    CalculatedQuote, Employee, EmployeeState, IncomeChannel, IncreaseScope, NewPriceEntry, Plan,
    PlanDraft, PriceEntry, QuoteListItem, QuotePayload, QuoteRecord, Role, VerificationResponse,
};

/// Operations the quote wizard and the quote history need
#[async_trait]
pub trait QuoteApi: Send + Sync {
    /// Resolve whether a client exists and who quoted them
    async fn verify_client(
        &self,
        dni: &str,
        cancel: &CancellationToken,
    ) -> Result<VerificationResponse, ApiError>;

    async fn active_plans(&self, cancel: &CancellationToken) -> Result<Vec<Plan>, ApiError>;

    /// Server-side premium computation
    async fn calculate(
        &self,
        payload: &QuotePayload,
        cancel: &CancellationToken,
    ) -> Result<CalculatedQuote, ApiError>;

    /// Persist a new quote, returning its id
    async fn create_quote(
        &self,
        payload: &QuotePayload,
        cancel: &CancellationToken,
    ) -> Result<u64, ApiError>;

    async fn update_quote(
        &self,
        id: u64,
        payload: &QuotePayload,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError>;

    async fn fetch_quote(&self, id: u64, cancel: &CancellationToken)
        -> Result<QuoteRecord, ApiError>;

    async fn void_quote(&self, id: u64, cancel: &CancellationToken) -> Result<(), ApiError>;

    /// Rendered quote document (PDF bytes)
    async fn download_pdf(&self, id: u64, cancel: &CancellationToken)
        -> Result<Vec<u8>, ApiError>;

    /// Quotes created by the signed-in operator
    async fn my_quotes(&self, cancel: &CancellationToken) -> Result<Vec<QuoteListItem>, ApiError>;
}

/// Back-office operations (employees, plans, price lists)
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn employees(&self, cancel: &CancellationToken) -> Result<Vec<Employee>, ApiError>;

    async fn update_employee_role(
        &self,
        legajo: u64,
        rol: Role,
        supervisor_id: Option<u64>,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError>;

    async fn set_employee_status(
        &self,
        legajo: u64,
        estado: EmployeeState,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError>;

    async fn plans(&self, cancel: &CancellationToken) -> Result<Vec<Plan>, ApiError>;

    /// Create a plan, returning its id
    async fn create_plan(
        &self,
        draft: &PlanDraft,
        cancel: &CancellationToken,
    ) -> Result<u64, ApiError>;

    async fn update_plan(
        &self,
        id: u64,
        draft: &PlanDraft,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError>;

    async fn deactivate_plan(&self, id: u64, cancel: &CancellationToken) -> Result<(), ApiError>;

    async fn price_list(
        &self,
        plan_id: u64,
        channel: IncomeChannel,
        cancel: &CancellationToken,
    ) -> Result<Vec<PriceEntry>, ApiError>;

    async fn bulk_load_prices(
        &self,
        entries: &[NewPriceEntry],
        cancel: &CancellationToken,
    ) -> Result<(), ApiError>;

    async fn update_price(
        &self,
        id: u64,
        precio: Decimal,
        rango_etario: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError>;

    async fn delete_price(&self, id: u64, cancel: &CancellationToken) -> Result<(), ApiError>;

    async fn bulk_increase(
        &self,
        porcentaje: Decimal,
        scope: IncreaseScope,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError>;
}

/// Account flows; none of these require an existing session except
/// [`AuthApi::update_profile`].
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(
        &self,
        legajo: u64,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<Identity, ApiError>;

    /// Returns the server's confirmation message
    async fn register(
        &self,
        draft: &RegistrationDraft,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError>;

    async fn forgot_password(
        &self,
        email: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError>;

    async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError>;

    async fn confirm_email(&self, token: &str, cancel: &CancellationToken)
        -> Result<String, ApiError>;

    async fn update_profile(
        &self,
        email: &str,
        telefono: &str,
        password: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError>;
}

/// `{ "message": "..." }` acknowledgement body
#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

impl Ack {
    pub fn into_message(self, fallback: &str) -> String {
        self.message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}
