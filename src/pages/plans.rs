//! Coverage plan administration

use std::sync::Arc;

use tracing::info;

use super::listing::{Confirmation, ListPage, ListRow};
use crate::api::AdminApi;
use crate::config::Config;
use crate::quoter::Notice;
use crate::session::Session;
use crate::types::{Plan, PlanDraft};

impl ListRow for Plan {
    type Key = u64;

    fn key(&self) -> u64 {
        self.id
    }

    fn search_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.id,
            self.nombre,
            self.descripcion,
            if self.activo { "activo" } else { "inactivo" }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    Deactivate(u64),
}

pub struct PlansPage {
    api: Arc<dyn AdminApi>,
    page: ListPage<Plan>,
    confirmation: Option<Confirmation<PlanAction>>,
}

impl PlansPage {
    pub fn new(api: Arc<dyn AdminApi>, session: Session, config: &Config) -> Self {
        Self {
            api,
            page: ListPage::new(session, config.ui.page_size),
            confirmation: None,
        }
    }

    pub async fn load(&mut self) {
        let result = self.api.plans(self.page.cancel_token()).await;
        self.page.accept_load("Error de Carga", result);
    }

    pub fn page(&self) -> &ListPage<Plan> {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut ListPage<Plan> {
        &mut self.page
    }

    fn reject_draft(&mut self) {
        self.page.set_notice(Notice::warning(
            "Datos Incompletos",
            "El nombre del plan es obligatorio.",
        ));
    }

    /// Create a plan; it is listed only once the backend returns its id
    pub async fn create(&mut self, draft: PlanDraft) -> Option<u64> {
        if !draft.is_valid() {
            self.reject_draft();
            return None;
        }
        match self.api.create_plan(&draft, self.page.cancel_token()).await {
            Ok(id) => {
                info!(id, "plan created");
                self.page.list_mut().prepend(Plan {
                    id,
                    nombre: draft.nombre,
                    descripcion: draft.descripcion,
                    activo: true,
                });
                self.page
                    .set_notice(Notice::success("Plan Creado", "Plan creado exitosamente."));
                Some(id)
            }
            Err(err) => {
                self.page.fail("Error al Guardar", &err);
                None
            }
        }
    }

    pub fn update(&mut self, id: u64, draft: PlanDraft) -> bool {
        if !draft.is_valid() {
            self.reject_draft();
            return false;
        }
        let api = Arc::clone(&self.api);
        let cancel = self.page.cancel_token().clone();
        let edited = draft.clone();
        self.page.mutate(
            &id,
            "Error al Guardar",
            move |plan| {
                plan.nombre = edited.nombre;
                plan.descripcion = edited.descripcion;
            },
            async move { api.update_plan(id, &draft, &cancel).await },
        )
    }

    pub fn request_deactivate(&mut self, id: u64) {
        let Some(plan) = self.page.list().get(&id) else {
            return;
        };
        if !plan.activo {
            return;
        }
        self.confirmation = Some(
            Confirmation::new(
                "Confirmar Desactivación",
                format!(
                    "¿Desea desactivar el plan \"{}\"? Ya no será visible para nuevas cotizaciones.",
                    plan.nombre
                ),
                PlanAction::Deactivate(id),
            )
            .with_label("Desactivar"),
        );
    }

    pub fn confirmation(&self) -> Option<&Confirmation<PlanAction>> {
        self.confirmation.as_ref()
    }

    pub fn cancel_confirmation(&mut self) {
        self.confirmation = None;
    }

    pub fn confirm(&mut self) -> bool {
        let Some(confirmation) = self.confirmation.take() else {
            return false;
        };
        match confirmation.confirm() {
            PlanAction::Deactivate(id) => {
                let api = Arc::clone(&self.api);
                let cancel = self.page.cancel_token().clone();
                info!(id, "deactivating plan");
                self.page.mutate(
                    &id,
                    "Error al Desactivar",
                    |plan| plan.activo = false,
                    async move { api.deactivate_plan(id, &cancel).await },
                )
            }
        }
    }

    pub fn poll(&mut self) {
        self.page.poll();
    }

    pub async fn settle(&mut self) {
        self.page.settle().await;
    }
}
