//! Integration tests for the REST adapters
//!
//! These tests verify that:
//! - Requests carry the bearer token from the session
//! - Status codes map onto the `ApiError` taxonomy
//! - The quote wizard completes end to end over HTTP
//!
//! Each test binds an in-process axum backend to `127.0.0.1:0`, so tests can
//! run in parallel without port bookkeeping.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use sigec::api::{AdminApi, ApiError, AuthApi, HttpClient, QuoteApi};
use sigec::api::{RestAdminApi, RestAuthApi, RestQuoteApi};
use sigec::config::Config;
use sigec::quoter::{ClientField, QuoteWorkflow, QuoterEntry, SavedAction, WizardStep};
use sigec::session::{Identity, Session};
use sigec::types::{IncomeChannel, Role};

const TOKEN: &str = "tok-123";

// ─── Fake backend ─────────────────────────────────────────────────────────────

/// Request bodies the backend received, keyed by route
#[derive(Clone, Default)]
struct Recorded {
    bodies: Arc<Mutex<Vec<(&'static str, Value)>>>,
}

impl Recorded {
    fn push(&self, route: &'static str, body: Value) {
        self.bodies.lock().unwrap().push((route, body));
    }

    fn find(&self, route: &str) -> Option<Value> {
        self.bodies
            .lock()
            .unwrap()
            .iter()
            .find(|(r, _)| *r == route)
            .map(|(_, b)| b.clone())
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TOKEN))
}

fn rejected() -> axum::response::Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Token inválido" }))).into_response()
}

async fn login(Json(body): Json<Value>) -> axum::response::Response {
    if body["legajo"] == 1001 && body["password"] == "secreta" {
        Json(json!({
            "token": TOKEN,
            "legajo": 1001,
            "nombre": "Ana",
            "apellido": "Gómez",
            "email": "ana@sigec.test",
            "rol": "asesor"
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Credenciales inválidas" })),
        )
            .into_response()
    }
}

async fn active_plans(headers: HeaderMap) -> axum::response::Response {
    if !authorized(&headers) {
        return rejected();
    }
    Json(json!([
        { "id": 1, "nombre": "Plan 200", "descripcion": "Básico" },
        { "id": 2, "nombre": "Plan 300", "descripcion": null }
    ]))
    .into_response()
}

async fn verify(headers: HeaderMap, Path(dni): Path<String>) -> axum::response::Response {
    if !authorized(&headers) {
        return rejected();
    }
    if dni == "20111222" {
        return Json(json!({
            "existe": true,
            "cotizado_por_mi": false,
            "asesor_cotizador": "Luis Pérez",
            "fecha_cotizacion": "2026-02-01"
        }))
        .into_response();
    }
    Json(json!({ "existe": false })).into_response()
}

async fn calculate(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> axum::response::Response {
    if !authorized(&headers) {
        return rejected();
    }
    recorded.push("calculate", body);
    Json(json!({
        "cotizacionCalculada": {
            "valor_base_plan": "52000.00",
            "valor_iva": "5460.10",
            "valor_total": "57460.10"
        },
        "miembrosConPrecios": [
            { "parentesco": "Titular", "edad": 30, "valor_individual": "52000.00" }
        ]
    }))
    .into_response()
}

async fn create_quote(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> axum::response::Response {
    if !authorized(&headers) {
        return rejected();
    }
    recorded.push("create", body);
    (StatusCode::CREATED, Json(json!({ "cotizacionId": 77 }))).into_response()
}

async fn quote_pdf(headers: HeaderMap, Path(id): Path<u64>) -> axum::response::Response {
    if !authorized(&headers) {
        return rejected();
    }
    if id != 77 {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "No existe" }))).into_response();
    }
    (
        [("content-type", "application/pdf")],
        b"%PDF-1.4 integration".to_vec(),
    )
        .into_response()
}

async fn void_quote(headers: HeaderMap, Path(id): Path<u64>) -> axum::response::Response {
    if !authorized(&headers) {
        return rejected();
    }
    if id == 5 {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "message": "La cotización ya fue anulada" })),
        )
            .into_response();
    }
    Json(json!({ "message": "Cotización anulada" })).into_response()
}

async fn delete_plan(headers: HeaderMap, Path(_id): Path<u64>) -> axum::response::Response {
    if !authorized(&headers) {
        return rejected();
    }
    (StatusCode::FORBIDDEN, Json(json!({ "message": "Solo administradores" }))).into_response()
}

async fn slow_employees() -> axum::response::Response {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!([])).into_response()
}

async fn spawn_backend() -> (SocketAddr, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/api/employees/login", post(login))
        .route("/api/employees", get(slow_employees))
        .route("/api/plans/active", get(active_plans))
        .route("/api/plans/:id", delete(delete_plan))
        .route("/api/cotizaciones/verify-dni/:dni", get(verify))
        .route("/api/cotizaciones/calculate", post(calculate))
        .route("/api/cotizaciones", post(create_quote))
        .route("/api/cotizaciones/:id/pdf", get(quote_pdf))
        .route("/api/cotizaciones/anular/:id", put(void_quote))
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, recorded)
}

// ─── Test Context ─────────────────────────────────────────────────────────────

struct TestContext {
    _temp_dir: TempDir,
    config: Config,
    session: Session,
    http: HttpClient,
    recorded: Recorded,
}

impl TestContext {
    async fn new() -> Self {
        let (addr, recorded) = spawn_backend().await;
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.api.base_url = format!("http://{}/api", addr);
        config.api.timeout_secs = 5;
        config.paths.state = temp_dir.path().join("state").to_string_lossy().to_string();
        config.ui.download_dir = temp_dir.path().join("downloads").to_string_lossy().to_string();

        let session = Session::new(Some(config.session_file_path()));
        let http = HttpClient::new(&config, session.clone()).unwrap();
        Self {
            _temp_dir: temp_dir,
            config,
            session,
            http,
            recorded,
        }
    }

    async fn sign_in(&self) {
        let identity = RestAuthApi::new(self.http.clone())
            .login(1001, "secreta", &CancellationToken::new())
            .await
            .unwrap();
        self.session.login(identity, false).unwrap();
    }
}

// ─── Adapters ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_returns_identity() {
    let ctx = TestContext::new().await;
    let auth = RestAuthApi::new(ctx.http.clone());

    let identity = auth
        .login(1001, "secreta", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(identity.rol, Role::Advisor);
    assert_eq!(identity.display_name(), "Ana Gómez");

    let err = auth
        .login(1001, "otra", &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::unauthorized(Some("Credenciales inválidas".to_string()))
    );
}

#[tokio::test]
async fn test_calls_need_a_session_and_send_its_token() {
    let ctx = TestContext::new().await;
    let api = RestQuoteApi::new(ctx.http.clone());

    let err = api.active_plans(&CancellationToken::new()).await.unwrap_err();
    assert_eq!(err, ApiError::NotAuthenticated);

    ctx.sign_in().await;
    let plans = api.active_plans(&CancellationToken::new()).await.unwrap();
    assert_eq!(plans.len(), 2);
    assert_eq!(plans[1].descripcion, "");
    assert!(plans.iter().all(|p| p.activo));
}

#[tokio::test]
async fn test_stale_token_is_unauthorized() {
    let ctx = TestContext::new().await;
    ctx.session
        .login(
            Identity {
                token: "expired".to_string(),
                legajo: 1001,
                nombre: String::new(),
                apellido: String::new(),
                email: String::new(),
                rol: Role::Advisor,
            },
            false,
        )
        .unwrap();

    let err = RestQuoteApi::new(ctx.http.clone())
        .active_plans(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_auth_error());
    // The adapter reports; it never signs the operator out itself
    assert!(ctx.session.is_authenticated());
}

#[tokio::test]
async fn test_server_messages_surface_in_errors() {
    let ctx = TestContext::new().await;
    ctx.sign_in().await;

    let quotes = RestQuoteApi::new(ctx.http.clone());
    let err = quotes.void_quote(5, &CancellationToken::new()).await.unwrap_err();
    assert_eq!(err, ApiError::business(409, "La cotización ya fue anulada"));
    quotes.void_quote(6, &CancellationToken::new()).await.unwrap();

    let admin = RestAdminApi::new(ctx.http.clone());
    let err = admin.deactivate_plan(1, &CancellationToken::new()).await.unwrap_err();
    assert_eq!(err, ApiError::forbidden(Some("Solo administradores".to_string())));
}

#[tokio::test]
async fn test_pdf_download_returns_raw_bytes() {
    let ctx = TestContext::new().await;
    ctx.sign_in().await;

    let bytes = RestQuoteApi::new(ctx.http.clone())
        .download_pdf(77, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(bytes, b"%PDF-1.4 integration");
}

#[tokio::test]
async fn test_cancelled_request_returns_promptly() {
    let ctx = TestContext::new().await;
    ctx.sign_in().await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = RestAdminApi::new(ctx.http.clone())
        .employees(&cancel)
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let session = Session::new(None);
    let http = HttpClient::with_base_url("http://127.0.0.1:9/api", Duration::from_secs(2), session)
        .unwrap();
    let err = RestAuthApi::new(http)
        .login(1, "x", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Network { .. }));
}

// ─── Quote wizard over HTTP ───────────────────────────────────────────────────

fn wizard(ctx: &TestContext) -> QuoteWorkflow {
    QuoteWorkflow::new(
        Arc::new(RestQuoteApi::new(ctx.http.clone())),
        ctx.session.clone(),
        &ctx.config,
        QuoterEntry::default(),
    )
}

#[tokio::test]
async fn test_wizard_quotes_new_client_end_to_end() {
    let ctx = TestContext::new().await;
    ctx.sign_in().await;
    let mut wf = wizard(&ctx);
    wf.wait_for_plans().await;
    assert_eq!(wf.plans().len(), 2);

    assert!(wf.set_client_field(ClientField::Dni, "30123456"));
    wf.search_client().await;
    assert_eq!(wf.notice().unwrap().title, "Cliente Nuevo");
    wf.acknowledge_notice(true);

    wf.set_client_field(ClientField::GivenNames, "Ana");
    wf.set_client_field(ClientField::FamilyNames, "Pérez");
    wf.set_client_field(ClientField::Email, "ana@example.com");
    wf.set_client_field(ClientField::Phone, "3415550000");
    wf.set_client_field(ClientField::Locality, "Rosario");
    wf.set_client_field(ClientField::Age, "30");
    wf.next().await;
    assert_eq!(wf.step(), WizardStep::Configure);

    wf.set_plan(Some(1));
    wf.set_channel(Some(IncomeChannel::Voluntary));
    wf.next().await;
    assert_eq!(wf.step(), WizardStep::Summary);
    assert_eq!(
        wf.calculated().unwrap().figures.total.to_string(),
        "57460.10"
    );

    let sent = ctx.recorded.find("calculate").unwrap();
    assert_eq!(sent["clienteData"]["dni"], "30123456");
    assert_eq!(sent["miembrosData"].as_array().unwrap().len(), 1);

    wf.generate().await;
    assert_eq!(wf.saved().unwrap().id, 77);
    let stored = ctx.recorded.find("create").unwrap();
    assert!(stored["miembrosData"][0].get("valor_individual").is_some());

    assert_eq!(wf.saved_action(SavedAction::DownloadDocument).await, None);
    let pdf = ctx.config.download_path().join("Cotizacion_77.pdf");
    assert_eq!(std::fs::read(pdf).unwrap(), b"%PDF-1.4 integration");
}

#[tokio::test]
async fn test_wizard_blocks_client_of_another_advisor() {
    let ctx = TestContext::new().await;
    ctx.sign_in().await;
    let mut wf = wizard(&ctx);

    wf.set_client_field(ClientField::Dni, "20111222");
    wf.search_client().await;

    let notice = wf.notice().unwrap();
    assert_eq!(notice.title, "Cliente Ya Cotizado");
    assert!(notice.message.contains("Luis Pérez"));
    assert!(notice.message.contains("el 01/02/2026"));
    assert!(!wf.can_proceed());
    wf.acknowledge_notice(true);
    assert!(wf.is_search_mode());
}
