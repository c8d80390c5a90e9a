//! The quote wizard controller.
//!
//! Owns every piece of wizard state, drives step transitions and calls the
//! [`QuoteApi`]. Step renders only read from it and forward edits to it.

use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::family::FamilyGroup;
use super::notice::{Notice, NoticeAction};
use super::resolution::{ClientResolution, RequoteSnapshot};
use super::validation::{self, ValidationError};
use super::{document_file_name, Exit, QuoterEntry};
use crate::api::{ApiError, QuoteApi};
use crate::config::{Config, QuoterConfig};
use crate::session::{LogoutReason, Session};
use crate::types::{
    CalculatedQuote, ClientDraft, IncomeChannel, Plan, QuoteConfig, QuotePayload, QuoteRecord,
    QuoteTerms, Relationship,
};

pub const LOADING_VERIFY: &str = "Verificando...";
pub const LOADING_CALCULATE: &str = "Procesando...";
pub const LOADING_SAVE: &str = "Guardando...";
pub const LOADING_FETCH: &str = "Cargando...";
pub const LOADING_DOCUMENT: &str = "Generando PDF...";

const INCOMPLETE_TITLE: &str = "Datos Incompletos";

/// Wizard steps, strictly ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Identify,
    Configure,
    Summary,
}

impl WizardStep {
    pub const ALL: [WizardStep; 3] = [
        WizardStep::Identify,
        WizardStep::Configure,
        WizardStep::Summary,
    ];

    pub fn index(self) -> usize {
        match self {
            WizardStep::Identify => 0,
            WizardStep::Configure => 1,
            WizardStep::Summary => 2,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Identify => "Datos del Cliente",
            WizardStep::Configure => "Plan y Grupo Familiar",
            WizardStep::Summary => "Resumen",
        }
    }

    pub fn previous(self) -> Option<Self> {
        match self {
            WizardStep::Identify => None,
            WizardStep::Configure => Some(WizardStep::Identify),
            WizardStep::Summary => Some(WizardStep::Configure),
        }
    }

    /// Label for the loading frame shown while leaving this step
    pub fn advance_label(self) -> Option<&'static str> {
        match self {
            WizardStep::Configure => Some(LOADING_CALCULATE),
            WizardStep::Summary => Some(LOADING_SAVE),
            WizardStep::Identify => None,
        }
    }
}

/// Client form fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientField {
    Dni,
    GivenNames,
    FamilyNames,
    Email,
    Phone,
    Locality,
    Age,
}

impl ClientField {
    pub const ALL: [ClientField; 7] = [
        ClientField::Dni,
        ClientField::GivenNames,
        ClientField::FamilyNames,
        ClientField::Email,
        ClientField::Phone,
        ClientField::Locality,
        ClientField::Age,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ClientField::Dni => "DNI",
            ClientField::GivenNames => "Nombres",
            ClientField::FamilyNames => "Apellidos",
            ClientField::Email => "Email",
            ClientField::Phone => "Teléfono",
            ClientField::Locality => "Ciudad / Dirección",
            ClientField::Age => "Edad",
        }
    }

    fn is_identity(self) -> bool {
        matches!(
            self,
            ClientField::GivenNames | ClientField::FamilyNames | ClientField::Email
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountKind {
    Commercial,
    Affinity,
    Card,
}

impl DiscountKind {
    pub const ALL: [DiscountKind; 3] = [
        DiscountKind::Commercial,
        DiscountKind::Affinity,
        DiscountKind::Card,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DiscountKind::Commercial => "Descuento comercial",
            DiscountKind::Affinity => "Descuento afinidad",
            DiscountKind::Card => "Descuento tarjeta",
        }
    }
}

/// Actions offered by the saved overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavedAction {
    ViewList,
    DownloadDocument,
    StartNew,
}

impl SavedAction {
    pub const ALL: [SavedAction; 3] = [
        SavedAction::ViewList,
        SavedAction::DownloadDocument,
        SavedAction::StartNew,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SavedAction::ViewList => "Ver en Mis Cotizaciones",
            SavedAction::DownloadDocument => "Descargar PDF",
            SavedAction::StartNew => "Nueva Cotización",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedQuote {
    pub id: u64,
    pub message: String,
}

type PlanLoad = oneshot::Receiver<Result<Vec<Plan>, ApiError>>;

/// Per-session wizard state. Everything here is discarded by [`QuoteWorkflow::reset`].
#[derive(Debug, Default)]
struct WizardState {
    step: Option<WizardStep>,
    client: ClientDraft,
    config: QuoteConfig,
    family: FamilyGroup,
    can_proceed: bool,
    existing_client: bool,
    edit_id: Option<u64>,
    resolution: Option<ClientResolution>,
    pending_snapshot: Option<Box<RequoteSnapshot>>,
    calculated: Option<CalculatedQuote>,
    saved: Option<SavedQuote>,
}

pub struct QuoteWorkflow {
    api: Arc<dyn QuoteApi>,
    session: Session,
    options: QuoterConfig,
    download_dir: PathBuf,
    entry: QuoterEntry,
    cancel: CancellationToken,
    state: WizardState,
    notice: Option<Notice>,
    plans: Vec<Plan>,
    plans_rx: Option<PlanLoad>,
}

impl QuoteWorkflow {
    /// Create the controller and start loading the plan catalogue in the
    /// background. Must be called inside a tokio runtime.
    pub fn new(
        api: Arc<dyn QuoteApi>,
        session: Session,
        config: &Config,
        entry: QuoterEntry,
    ) -> Self {
        let cancel = CancellationToken::new();
        let plans_rx = Some(spawn_plan_load(Arc::clone(&api), cancel.clone()));

        Self {
            api,
            session,
            options: config.quoter.clone(),
            download_dir: config.download_path(),
            entry,
            cancel,
            state: WizardState::default(),
            notice: None,
            plans: Vec::new(),
            plans_rx,
        }
    }

    /// Preload the stored quote when opened for editing
    pub async fn open(&mut self) {
        let Some(id) = self.entry.edit_id else {
            return;
        };

        match self.api.fetch_quote(id, &self.cancel).await {
            Ok(record) => self.load_for_editing(id, &record),
            Err(err) if err.is_auth_error() => self.expire_session(),
            Err(ApiError::Cancelled) => {}
            Err(err) => {
                warn!(id, "could not load quote for editing: {}", err);
                self.notice = Some(
                    Notice::error(
                        "Error al Cargar",
                        "No se pudo cargar la cotización para editar.",
                    )
                    .with_action(NoticeAction::ReturnToList, "Aceptar"),
                );
            }
        }
    }

    fn load_for_editing(&mut self, id: u64, record: &QuoteRecord) {
        let snapshot = RequoteSnapshot::from_record(record);
        self.apply_snapshot(snapshot);
        self.state.edit_id = Some(id);
        self.state.step = Some(WizardStep::Identify);
        info!(id, "quote loaded for editing");
    }

    fn apply_snapshot(&mut self, snapshot: RequoteSnapshot) {
        self.state.client = snapshot.client;
        self.state.config = snapshot.config;
        self.state.family = snapshot.family;
        self.state.can_proceed = true;
        self.state.existing_client = true;
        self.state.edit_id = None;
        self.state.calculated = None;
    }

    // ─── Plan catalogue ─────────────────────────────────────────────────────

    /// Pick up the background plan load if it has finished
    pub fn poll_plans(&mut self) {
        let Some(rx) = self.plans_rx.as_mut() else {
            return;
        };
        match rx.try_recv() {
            Ok(result) => {
                self.plans_rx = None;
                self.accept_plans(result);
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => self.plans_rx = None,
        }
    }

    /// Wait for the plan load to finish (CLI and tests)
    pub async fn wait_for_plans(&mut self) {
        if let Some(rx) = self.plans_rx.take() {
            if let Ok(result) = rx.await {
                self.accept_plans(result);
            }
        }
    }

    fn accept_plans(&mut self, result: Result<Vec<Plan>, ApiError>) {
        match result {
            Ok(plans) => {
                debug!(count = plans.len(), "active plans loaded");
                self.plans = plans;
            }
            Err(err) if err.is_auth_error() => self.expire_session(),
            Err(ApiError::Cancelled) => {}
            Err(err) => {
                warn!("could not load plans: {}", err);
                self.notice = Some(Notice::error(
                    "Error de Carga",
                    "No se pudieron cargar los planes. Intente nuevamente.",
                ));
            }
        }
    }

    pub fn plans_loading(&self) -> bool {
        self.plans_rx.is_some()
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn selected_plan(&self) -> Option<&Plan> {
        let id = self.state.config.plan_id?;
        self.plans.iter().find(|p| p.id == id)
    }

    // ─── Read access ────────────────────────────────────────────────────────

    pub fn step(&self) -> WizardStep {
        self.state.step.unwrap_or(WizardStep::Identify)
    }

    pub fn client(&self) -> &ClientDraft {
        &self.state.client
    }

    pub fn config(&self) -> &QuoteConfig {
        &self.state.config
    }

    pub fn family(&self) -> &FamilyGroup {
        &self.state.family
    }

    pub fn options(&self) -> &QuoterConfig {
        &self.options
    }

    pub fn entry(&self) -> QuoterEntry {
        self.entry
    }

    pub fn calculated(&self) -> Option<&CalculatedQuote> {
        self.state.calculated.as_ref()
    }

    pub fn saved(&self) -> Option<&SavedQuote> {
        self.state.saved.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn resolution(&self) -> Option<&ClientResolution> {
        self.state.resolution.as_ref()
    }

    pub fn can_proceed(&self) -> bool {
        self.state.can_proceed || self.is_edit_mode()
    }

    pub fn is_edit_mode(&self) -> bool {
        self.state.edit_id.is_some()
    }

    pub fn edit_id(&self) -> Option<u64> {
        self.state.edit_id
    }

    pub fn is_existing_client(&self) -> bool {
        self.state.existing_client
    }

    /// Only the identifier is editable until a lookup lets the wizard proceed
    pub fn is_search_mode(&self) -> bool {
        !self.state.can_proceed && !self.is_edit_mode()
    }

    pub fn is_field_enabled(&self, field: ClientField) -> bool {
        if field == ClientField::Dni {
            return self.is_search_mode();
        }
        if self.is_search_mode() {
            return false;
        }
        !(field.is_identity() && self.state.existing_client)
    }

    pub fn title(&self) -> String {
        match self.state.edit_id {
            Some(id) => format!("Editar Cotización #{}", id),
            None => "Nueva Cotización".to_string(),
        }
    }

    pub fn discount_options(&self, kind: DiscountKind) -> Vec<Decimal> {
        let table = match kind {
            DiscountKind::Commercial => &self.options.commercial_discounts,
            DiscountKind::Affinity => &self.options.affinity_discounts,
            DiscountKind::Card => &self.options.card_discounts,
        };
        table.iter().copied().map(Decimal::from).collect()
    }

    pub fn discount(&self, kind: DiscountKind) -> Decimal {
        match kind {
            DiscountKind::Commercial => self.state.config.commercial_discount,
            DiscountKind::Affinity => self.state.config.affinity_discount,
            DiscountKind::Card => self.state.config.card_discount,
        }
    }

    pub fn member_role_options(&self, index: usize) -> Vec<Relationship> {
        self.state.family.role_options(index)
    }

    // ─── Edits ──────────────────────────────────────────────────────────────

    /// Apply a keystroke-level edit. Returns false when the field is
    /// disabled or the value is rejected by the field filter.
    pub fn set_client_field(&mut self, field: ClientField, value: &str) -> bool {
        if !self.is_field_enabled(field) {
            return false;
        }
        let client = &mut self.state.client;
        match field {
            ClientField::Dni => match validation::filter_dni_input(value) {
                Some(dni) => client.dni = dni,
                None => return false,
            },
            ClientField::GivenNames => client.given_names = value.to_string(),
            ClientField::FamilyNames => client.family_names = value.to_string(),
            ClientField::Email => client.email = value.to_string(),
            ClientField::Phone => client.phone = value.to_string(),
            ClientField::Locality => client.locality = value.to_string(),
            ClientField::Age => match validation::filter_age_input(value) {
                Some(age) => {
                    client.age = age;
                    self.state.family.set_holder_age(age);
                }
                None => return false,
            },
        }
        true
    }

    pub fn client_field_value(&self, field: ClientField) -> String {
        let client = &self.state.client;
        match field {
            ClientField::Dni => client.dni.clone(),
            ClientField::GivenNames => client.given_names.clone(),
            ClientField::FamilyNames => client.family_names.clone(),
            ClientField::Email => client.email.clone(),
            ClientField::Phone => client.phone.clone(),
            ClientField::Locality => client.locality.clone(),
            ClientField::Age => client.age.map(|a| a.to_string()).unwrap_or_default(),
        }
    }

    pub fn set_plan(&mut self, plan_id: Option<u64>) {
        self.state.config.plan_id = plan_id;
    }

    pub fn set_channel(&mut self, channel: Option<IncomeChannel>) {
        self.state.config.channel = channel;
    }

    /// Blank clears the amount; anything else must be a non-negative number
    pub fn set_employer_contribution(&mut self, raw: &str) -> bool {
        let raw = raw.trim();
        if raw.is_empty() {
            self.state.config.employer_contribution = None;
            return true;
        }
        match Decimal::from_str(raw) {
            Ok(amount) if !amount.is_sign_negative() => {
                self.state.config.employer_contribution = Some(amount);
                true
            }
            _ => false,
        }
    }

    pub fn set_monotributo_category(&mut self, category: Option<&str>) -> bool {
        match category {
            None => {
                self.state.config.monotributo_category = None;
                true
            }
            Some(code) if self.options.monotributo_categories.iter().any(|c| c == code) => {
                self.state.config.monotributo_category = Some(code.to_string());
                true
            }
            Some(_) => false,
        }
    }

    pub fn set_monotributo_dependents(&mut self, count: u32) {
        self.state.config.monotributo_dependents = count;
    }

    /// Only values from the configured option table are accepted
    pub fn set_discount(&mut self, kind: DiscountKind, value: Decimal) -> bool {
        if !self.discount_options(kind).contains(&value) {
            return false;
        }
        let config = &mut self.state.config;
        match kind {
            DiscountKind::Commercial => config.commercial_discount = value,
            DiscountKind::Affinity => config.affinity_discount = value,
            DiscountKind::Card => config.card_discount = value,
        }
        true
    }

    pub fn add_member(&mut self) -> usize {
        self.state.family.add_member()
    }

    pub fn remove_member(&mut self, index: usize) -> bool {
        self.state.family.remove_member(index)
    }

    pub fn set_member_role(&mut self, index: usize, role: Relationship) -> bool {
        self.state.family.set_role(index, role)
    }

    /// Age edit on a member row; the holder's age is mirrored into the client
    pub fn set_member_age(&mut self, index: usize, raw: &str) -> bool {
        let Some(age) = validation::filter_age_input(raw) else {
            return false;
        };
        if !self.state.family.set_age(index, age) {
            return false;
        }
        if index == 0 {
            self.state.client.age = age;
        }
        true
    }

    // ─── Transitions ────────────────────────────────────────────────────────

    /// Look up the typed identifier. Malformed identifiers never reach the network.
    pub async fn search_client(&mut self) {
        if !self.is_search_mode() {
            return;
        }
        let dni = self.state.client.dni.trim().to_string();
        if let Err(err) = validation::check_dni(&dni) {
            self.notice = Some(Notice::warning("DNI Inválido", err.to_string()));
            return;
        }

        let response = match self.api.verify_client(&dni, &self.cancel).await {
            Ok(response) => response,
            Err(err) => return self.fail("Error de Búsqueda", &err),
        };

        let resolution = ClientResolution::from_response(&dni, response);
        info!(
            can_proceed = resolution.can_proceed(),
            existing = resolution.is_existing(),
            "client lookup resolved"
        );
        self.notice = Some(resolution.notice());
        self.state.can_proceed = resolution.can_proceed();

        match &resolution {
            ClientResolution::CreateAllowed { client } => {
                self.prefill_client(client);
                self.state.existing_client = false;
            }
            ClientResolution::ReuseAllowed { client, snapshot } => match snapshot {
                Some(snapshot) => self.state.pending_snapshot = Some(snapshot.clone()),
                None => {
                    self.prefill_client(client);
                    self.state.existing_client = true;
                }
            },
            ClientResolution::Blocked { .. } => {}
        }
        self.state.resolution = Some(resolution);
    }

    fn prefill_client(&mut self, found: &ClientDraft) {
        let age = self.state.client.age;
        self.state.client = ClientDraft {
            age,
            ..found.clone()
        };
    }

    /// Dismiss the current notice. `confirmed` is false when the operator
    /// cancels instead of accepting.
    pub fn acknowledge_notice(&mut self, confirmed: bool) -> Option<Exit> {
        let notice = self.notice.take()?;
        match notice.action {
            NoticeAction::RedirectToLogin => Some(Exit::Login),
            NoticeAction::ReturnToList => Some(Exit::QuoteHistory),
            NoticeAction::LoadExistingClient => {
                let pending = self.state.pending_snapshot.take();
                if let (true, Some(snapshot)) = (confirmed, pending) {
                    info!(source = ?snapshot.source_id, "re-quoting from previous quote");
                    self.apply_snapshot(*snapshot);
                }
                None
            }
            NoticeAction::Dismiss => None,
        }
    }

    /// Advance one step. Leaving Configure issues exactly one calculate call.
    pub async fn next(&mut self) {
        match self.step() {
            WizardStep::Identify => {
                if !self.can_proceed() {
                    return;
                }
                if let Err(err) = validation::check_client(&self.state.client) {
                    self.notice = Some(incomplete_notice(&err));
                    return;
                }
                self.state.step = Some(WizardStep::Configure);
            }
            WizardStep::Configure => {
                if let Err(err) =
                    validation::check_configuration(&self.state.config, self.state.family.members())
                {
                    self.notice = Some(incomplete_notice(&err));
                    return;
                }
                let payload = match self.calculation_payload() {
                    Some(payload) => payload,
                    None => return,
                };
                match self.api.calculate(&payload, &self.cancel).await {
                    Ok(calculated) => {
                        debug!(total = %calculated.figures.total, "quote calculated");
                        self.state.calculated = Some(calculated);
                        self.state.step = Some(WizardStep::Summary);
                    }
                    Err(err) => self.fail("Error de Cálculo", &err),
                }
            }
            WizardStep::Summary => {}
        }
    }

    /// Step back without discarding anything entered
    pub fn back(&mut self) {
        if let Some(previous) = self.step().previous() {
            self.state.step = Some(previous);
        }
    }

    fn terms(&self) -> Option<QuoteTerms> {
        self.state.config.terms(self.state.family.has_spouse())
    }

    /// Calculate request for the current state; `None` while incomplete
    pub fn calculation_payload(&self) -> Option<QuotePayload> {
        let terms = self.terms()?;
        let members = self.state.family.payloads()?;
        QuotePayload::for_calculation(self.state.client.to_payload(), &terms, &members).ok()
    }

    /// Persist the reviewed quote: update in edit mode, create otherwise
    pub async fn generate(&mut self) {
        if self.step() != WizardStep::Summary || self.state.saved.is_some() {
            return;
        }
        let (Some(terms), Some(calculated)) = (self.terms(), self.state.calculated.as_ref())
        else {
            return;
        };
        let payload = match QuotePayload::for_persistence(
            self.state.client.to_payload(),
            &terms,
            calculated,
        ) {
            Ok(payload) => payload,
            Err(e) => {
                self.notice = Some(Notice::error("Error al Guardar", e.to_string()));
                return;
            }
        };

        let result = match self.state.edit_id {
            Some(id) => self
                .api
                .update_quote(id, &payload, &self.cancel)
                .await
                .map(|()| id),
            None => self.api.create_quote(&payload, &self.cancel).await,
        };

        match result {
            Ok(id) => {
                info!(id, edit = self.is_edit_mode(), "quote saved");
                let message = if self.is_edit_mode() {
                    "Cotización actualizada con éxito."
                } else {
                    "Cotización generada con éxito."
                };
                self.state.saved = Some(SavedQuote {
                    id,
                    message: message.to_string(),
                });
            }
            Err(err) => self.fail("Error al Guardar", &err),
        }
    }

    /// Handle a choice on the saved overlay
    pub async fn saved_action(&mut self, action: SavedAction) -> Option<Exit> {
        let id = self.state.saved.as_ref()?.id;
        match action {
            SavedAction::ViewList => Some(Exit::QuoteHistory),
            SavedAction::DownloadDocument => {
                self.download_document(id).await;
                None
            }
            SavedAction::StartNew => {
                if self.entry.from_list {
                    Some(Exit::QuoteHistory)
                } else {
                    self.reset();
                    None
                }
            }
        }
    }

    async fn download_document(&mut self, id: u64) {
        let bytes = match self.api.download_pdf(id, &self.cancel).await {
            Ok(bytes) => bytes,
            Err(err) => return self.fail("Error PDF", &err),
        };

        let path = self.download_dir.join(document_file_name(id));
        let written = async {
            tokio::fs::create_dir_all(&self.download_dir).await?;
            tokio::fs::write(&path, &bytes).await
        }
        .await;

        self.notice = Some(match written {
            Ok(()) => {
                info!(id, path = %path.display(), "quote document saved");
                Notice::success("PDF Descargado", format!("Guardado en {}", path.display()))
            }
            Err(e) => Notice::error("Error PDF", format!("No se pudo guardar el archivo: {}", e)),
        });
    }

    /// Back to the empty initial state. The plan catalogue is kept.
    pub fn reset(&mut self) {
        self.state = WizardState::default();
        self.notice = None;
    }

    /// Route a remote failure: auth failures end the session and wipe the
    /// wizard, everything else leaves state untouched behind a notice.
    fn fail(&mut self, title: &str, err: &ApiError) {
        if err.is_cancelled() {
            return;
        }
        if err.is_auth_error() {
            self.expire_session();
            return;
        }
        warn!("{}: {}", title, err);
        self.notice = Some(Notice::from_api_error(title, err));
    }

    fn expire_session(&mut self) {
        warn!("session rejected by backend");
        self.session.logout(LogoutReason::Expired);
        self.reset();
        self.notice = Some(Notice::session_expired());
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Drop for QuoteWorkflow {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn spawn_plan_load(api: Arc<dyn QuoteApi>, cancel: CancellationToken) -> PlanLoad {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let result = api.active_plans(&cancel).await;
        let _ = tx.send(result);
    });
    rx
}

fn incomplete_notice(err: &ValidationError) -> Notice {
    let message = match err {
        ValidationError::MissingClientFields(_) => {
            "Por favor, complete todos los campos requeridos del cliente.".to_string()
        }
        ValidationError::MissingPlan | ValidationError::MissingChannel => {
            "Debe seleccionar un Tipo de Ingreso y un Plan.".to_string()
        }
        ValidationError::IncompleteMembers => {
            "Todos los integrantes del grupo familiar deben tener un parentesco y una edad."
                .to_string()
        }
        ValidationError::InvalidDni => err.to_string(),
    };
    Notice::warning(INCOMPLETE_TITLE, message).with_action(NoticeAction::Dismiss, "Entendido")
}
