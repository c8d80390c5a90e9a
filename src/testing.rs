//! In-memory fakes of the backend traits for controller tests

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::api::{AdminApi, ApiError, AuthApi, QuoteApi, RegistrationDraft};
use crate::session::{Identity, Session};
use crate::types::{
    CalculatedQuote, Employee, EmployeeState, IncomeChannel, IncreaseScope, NewPriceEntry, Plan,
    PlanDraft, PriceEntry, QuoteListItem, QuotePayload, QuoteRecord, Role, VerificationResponse,
};

pub(crate) fn signed_in_session(rol: Role) -> Session {
    let session = Session::new(None);
    session
        .login(
            Identity {
                token: "test-token".to_string(),
                legajo: 1500,
                nombre: "Paula".to_string(),
                apellido: "Vera".to_string(),
                email: "pvera@example.com".to_string(),
                rol,
            },
            false,
        )
        .unwrap();
    session
}

pub(crate) fn plan(id: u64, nombre: &str) -> Plan {
    Plan {
        id,
        nombre: nombre.to_string(),
        descripcion: String::new(),
        activo: true,
    }
}

pub(crate) fn employee(legajo: u64, rol: Role, estado: EmployeeState, confirmed: bool) -> Employee {
    Employee {
        legajo,
        nombre: format!("Nombre{}", legajo),
        apellido: "Ríos".to_string(),
        email: format!("e{}@example.com", legajo),
        rol,
        estado,
        email_confirmado: confirmed,
        supervisor_id: None,
    }
}

pub(crate) fn sample_calculation() -> CalculatedQuote {
    serde_json::from_value(json!({
        "cotizacionCalculada": {
            "valor_base_plan": "52000.00",
            "valor_descuento_comercial": "0.00",
            "valor_iva": "5460.00",
            "valor_total": "57460.00"
        },
        "miembrosConPrecios": [
            { "parentesco": "Titular", "edad": 30, "valor_individual": "52000.00" }
        ]
    }))
    .unwrap()
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum QuoteCall {
    Verify(String),
    ActivePlans,
    Calculate(QuotePayload),
    Create(QuotePayload),
    Update(u64, QuotePayload),
    Fetch(u64),
    Void(u64),
    Pdf(u64),
    MyQuotes,
}

/// Scripted [`QuoteApi`]. Unset responses fall back to a happy default.
#[derive(Default)]
pub(crate) struct FakeQuoteApi {
    pub verify: Mutex<Option<Result<VerificationResponse, ApiError>>>,
    pub plans: Mutex<Option<Result<Vec<Plan>, ApiError>>>,
    pub calculation: Mutex<Option<Result<CalculatedQuote, ApiError>>>,
    pub created: Mutex<Option<Result<u64, ApiError>>>,
    pub stored: Mutex<HashMap<u64, QuoteRecord>>,
    pub quotes: Mutex<Vec<QuoteListItem>>,
    /// Consumed by the next update/void/pdf call
    pub fail_next: Mutex<Option<ApiError>>,
    pub calls: Mutex<Vec<QuoteCall>>,
}

impl FakeQuoteApi {
    pub fn with_plans(plans: Vec<Plan>) -> Self {
        let fake = Self::default();
        *fake.plans.lock().unwrap() = Some(Ok(plans));
        fake
    }

    pub fn set_verify(&self, value: serde_json::Value) {
        *self.verify.lock().unwrap() = Some(Ok(serde_json::from_value(value).unwrap()));
    }

    pub fn calls(&self) -> Vec<QuoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&QuoteCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: QuoteCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn take_failure(&self) -> Result<(), ApiError> {
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl QuoteApi for FakeQuoteApi {
    async fn verify_client(
        &self,
        dni: &str,
        _cancel: &CancellationToken,
    ) -> Result<VerificationResponse, ApiError> {
        self.record(QuoteCall::Verify(dni.to_string()));
        self.verify
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(VerificationResponse::default()))
    }

    async fn active_plans(&self, _cancel: &CancellationToken) -> Result<Vec<Plan>, ApiError> {
        self.record(QuoteCall::ActivePlans);
        self.plans.lock().unwrap().clone().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn calculate(
        &self,
        payload: &QuotePayload,
        _cancel: &CancellationToken,
    ) -> Result<CalculatedQuote, ApiError> {
        self.record(QuoteCall::Calculate(payload.clone()));
        self.calculation
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(sample_calculation()))
    }

    async fn create_quote(
        &self,
        payload: &QuotePayload,
        _cancel: &CancellationToken,
    ) -> Result<u64, ApiError> {
        self.record(QuoteCall::Create(payload.clone()));
        self.created.lock().unwrap().clone().unwrap_or(Ok(501))
    }

    async fn update_quote(
        &self,
        id: u64,
        payload: &QuotePayload,
        _cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.record(QuoteCall::Update(id, payload.clone()));
        self.take_failure()
    }

    async fn fetch_quote(
        &self,
        id: u64,
        _cancel: &CancellationToken,
    ) -> Result<QuoteRecord, ApiError> {
        self.record(QuoteCall::Fetch(id));
        self.take_failure()?;
        self.stored
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::business(404, "Cotización no encontrada"))
    }

    async fn void_quote(&self, id: u64, _cancel: &CancellationToken) -> Result<(), ApiError> {
        self.record(QuoteCall::Void(id));
        self.take_failure()
    }

    async fn download_pdf(
        &self,
        id: u64,
        _cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ApiError> {
        self.record(QuoteCall::Pdf(id));
        self.take_failure()?;
        Ok(b"%PDF-1.4 fake".to_vec())
    }

    async fn my_quotes(&self, _cancel: &CancellationToken) -> Result<Vec<QuoteListItem>, ApiError> {
        self.record(QuoteCall::MyQuotes);
        Ok(self.quotes.lock().unwrap().clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AdminCall {
    Employees,
    UpdateRole(u64, Role, Option<u64>),
    SetStatus(u64, EmployeeState),
    Plans,
    CreatePlan(PlanDraft),
    UpdatePlan(u64, PlanDraft),
    DeactivatePlan(u64),
    PriceList(u64, IncomeChannel),
    BulkLoad(usize),
    UpdatePrice(u64, Decimal, String),
    DeletePrice(u64),
    BulkIncrease(Decimal, IncreaseScope),
}

/// Scripted [`AdminApi`] backed by plain vectors
#[derive(Default)]
pub(crate) struct FakeAdminApi {
    pub employees: Mutex<Vec<Employee>>,
    pub plans: Mutex<Vec<Plan>>,
    pub prices: Mutex<Vec<PriceEntry>>,
    pub next_plan_id: Mutex<u64>,
    /// Consumed by the next call of any kind
    pub fail_next: Mutex<Option<ApiError>>,
    pub calls: Mutex<Vec<AdminCall>>,
}

impl FakeAdminApi {
    pub fn calls(&self) -> Vec<AdminCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_next_with(&self, err: ApiError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    fn record(&self, call: AdminCall) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AdminApi for FakeAdminApi {
    async fn employees(&self, _cancel: &CancellationToken) -> Result<Vec<Employee>, ApiError> {
        self.record(AdminCall::Employees)?;
        Ok(self.employees.lock().unwrap().clone())
    }

    async fn update_employee_role(
        &self,
        legajo: u64,
        rol: Role,
        supervisor_id: Option<u64>,
        _cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.record(AdminCall::UpdateRole(legajo, rol, supervisor_id))
    }

    async fn set_employee_status(
        &self,
        legajo: u64,
        estado: EmployeeState,
        _cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.record(AdminCall::SetStatus(legajo, estado))
    }

    async fn plans(&self, _cancel: &CancellationToken) -> Result<Vec<Plan>, ApiError> {
        self.record(AdminCall::Plans)?;
        Ok(self.plans.lock().unwrap().clone())
    }

    async fn create_plan(
        &self,
        draft: &PlanDraft,
        _cancel: &CancellationToken,
    ) -> Result<u64, ApiError> {
        self.record(AdminCall::CreatePlan(draft.clone()))?;
        let mut next = self.next_plan_id.lock().unwrap();
        *next += 1;
        Ok(100 + *next)
    }

    async fn update_plan(
        &self,
        id: u64,
        draft: &PlanDraft,
        _cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.record(AdminCall::UpdatePlan(id, draft.clone()))
    }

    async fn deactivate_plan(&self, id: u64, _cancel: &CancellationToken) -> Result<(), ApiError> {
        self.record(AdminCall::DeactivatePlan(id))
    }

    async fn price_list(
        &self,
        plan_id: u64,
        channel: IncomeChannel,
        _cancel: &CancellationToken,
    ) -> Result<Vec<PriceEntry>, ApiError> {
        self.record(AdminCall::PriceList(plan_id, channel))?;
        let channel = channel.price_list_channel();
        Ok(self
            .prices
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.plan_id == plan_id && p.tipo_ingreso == channel)
            .cloned()
            .collect())
    }

    async fn bulk_load_prices(
        &self,
        entries: &[NewPriceEntry],
        _cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.record(AdminCall::BulkLoad(entries.len()))
    }

    async fn update_price(
        &self,
        id: u64,
        precio: Decimal,
        rango_etario: &str,
        _cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.record(AdminCall::UpdatePrice(id, precio, rango_etario.to_string()))
    }

    async fn delete_price(&self, id: u64, _cancel: &CancellationToken) -> Result<(), ApiError> {
        self.record(AdminCall::DeletePrice(id))
    }

    async fn bulk_increase(
        &self,
        porcentaje: Decimal,
        scope: IncreaseScope,
        _cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.record(AdminCall::BulkIncrease(porcentaje, scope))
    }
}

/// [`AuthApi`] that accepts one legajo/password pair
pub(crate) struct FakeAuthApi {
    pub legajo: u64,
    pub password: String,
    pub rol: Role,
    pub fail_next: Mutex<Option<ApiError>>,
    pub attempts: Mutex<u32>,
}

impl FakeAuthApi {
    pub fn accepting(legajo: u64, password: &str, rol: Role) -> Self {
        Self {
            legajo,
            password: password.to_string(),
            rol,
            fail_next: Mutex::new(None),
            attempts: Mutex::new(0),
        }
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn login(
        &self,
        legajo: u64,
        password: &str,
        _cancel: &CancellationToken,
    ) -> Result<Identity, ApiError> {
        *self.attempts.lock().unwrap() += 1;
        if let Some(err) = self.fail_next.lock().unwrap().take() {
            return Err(err);
        }
        if legajo != self.legajo || password != self.password {
            return Err(ApiError::unauthorized(Some(
                "Legajo o contraseña incorrectos".to_string(),
            )));
        }
        Ok(Identity {
            token: "issued-token".to_string(),
            legajo,
            nombre: "Paula".to_string(),
            apellido: "Vera".to_string(),
            email: "pvera@example.com".to_string(),
            rol: self.rol,
        })
    }

    async fn register(
        &self,
        _draft: &RegistrationDraft,
        _cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        Ok("Registro exitoso".to_string())
    }

    async fn forgot_password(
        &self,
        _email: &str,
        _cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        Ok("Correo enviado".to_string())
    }

    async fn reset_password(
        &self,
        _token: &str,
        _new_password: &str,
        _cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        Ok("Contraseña actualizada".to_string())
    }

    async fn confirm_email(
        &self,
        _token: &str,
        _cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        Ok("Email confirmado".to_string())
    }

    async fn update_profile(
        &self,
        _email: &str,
        _telefono: &str,
        _password: Option<&str>,
        _cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        Ok("Perfil actualizado".to_string())
    }
}
