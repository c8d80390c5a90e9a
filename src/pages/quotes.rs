//! The operator's quote history

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use super::listing::{Confirmation, ListPage, ListRow};
use crate::api::QuoteApi;
use crate::config::Config;
use crate::quoter::{document_file_name, Notice, QuoterEntry};
use crate::session::Session;
use crate::types::{QuoteListItem, QuoteRecord, QuoteStatus};

impl ListRow for QuoteListItem {
    type Key = u64;

    fn key(&self) -> u64 {
        self.id
    }

    fn search_text(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.cliente_apellido, self.cliente_nombre, self.cliente_dni, self.id, self.estado
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteAction {
    Void(u64),
}

pub struct QuoteHistoryPage {
    api: Arc<dyn QuoteApi>,
    page: ListPage<QuoteListItem>,
    download_dir: PathBuf,
    confirmation: Option<Confirmation<QuoteAction>>,
    /// Stored quote shown read-only over the list
    detail: Option<QuoteRecord>,
}

impl QuoteHistoryPage {
    pub fn new(api: Arc<dyn QuoteApi>, session: Session, config: &Config) -> Self {
        Self {
            api,
            page: ListPage::new(session, config.ui.page_size),
            download_dir: config.download_path(),
            confirmation: None,
            detail: None,
        }
    }

    pub async fn load(&mut self) {
        let result = self.api.my_quotes(self.page.cancel_token()).await;
        self.page.accept_load("Error de Carga", result);
    }

    pub fn page(&self) -> &ListPage<QuoteListItem> {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut ListPage<QuoteListItem> {
        &mut self.page
    }

    /// The row, unless it is voided; voided rows accept no actions
    fn actionable(&mut self, id: u64) -> Option<&QuoteListItem> {
        let status = self.page.list().get(&id)?.estado;
        if status.is_terminal() {
            self.page.set_notice(Notice::warning(
                "Cotización Anulada",
                "La cotización está anulada y no admite cambios.",
            ));
            return None;
        }
        self.page.list().get(&id)
    }

    /// Load the full stored quote for the read-only detail view. Voided
    /// quotes can still be viewed.
    pub async fn view(&mut self, id: u64) -> bool {
        match self.api.fetch_quote(id, self.page.cancel_token()).await {
            Ok(record) => {
                info!(id, "quote detail loaded");
                self.detail = Some(record);
                true
            }
            Err(err) => {
                self.page.fail("Error al Cargar Detalle", &err);
                false
            }
        }
    }

    pub fn detail(&self) -> Option<&QuoteRecord> {
        self.detail.as_ref()
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    /// Wizard entry for editing the quote
    pub fn edit(&mut self, id: u64) -> Option<QuoterEntry> {
        self.actionable(id)?;
        Some(QuoterEntry::edit(id))
    }

    pub fn request_void(&mut self, id: u64) {
        if self.actionable(id).is_none() {
            return;
        }
        self.confirmation = Some(
            Confirmation::new(
                "Anular Cotización",
                format!(
                    "¿Está seguro de que desea anular la cotización #{}? Esta acción no se puede deshacer.",
                    id
                ),
                QuoteAction::Void(id),
            )
            .with_label("Anular"),
        );
    }

    pub fn confirmation(&self) -> Option<&Confirmation<QuoteAction>> {
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
            QuoteAction::Void(id) => {
                let api = Arc::clone(&self.api);
                let cancel = self.page.cancel_token().clone();
                info!(id, "voiding quote");
                self.page.mutate(
                    &id,
                    "Error al Anular",
                    |quote| quote.estado = QuoteStatus::Voided,
                    async move { api.void_quote(id, &cancel).await },
                )
            }
        }
    }

    /// Save the quote document into the download directory
    pub async fn download(&mut self, id: u64) -> Option<PathBuf> {
        self.actionable(id)?;
        let bytes = match self.api.download_pdf(id, self.page.cancel_token()).await {
            Ok(bytes) => bytes,
            Err(err) => {
                self.page.fail("Error PDF", &err);
                return None;
            }
        };

        let path = self.download_dir.join(document_file_name(id));
        let written = async {
            tokio::fs::create_dir_all(&self.download_dir).await?;
            tokio::fs::write(&path, &bytes).await
        }
        .await;

        match written {
            Ok(()) => {
                info!(id, path = %path.display(), "quote document saved");
                self.page.set_notice(Notice::success(
                    "PDF Descargado",
                    format!("Guardado en {}", path.display()),
                ));
                Some(path)
            }
            Err(e) => {
                self.page.set_notice(Notice::error(
                    "Error PDF",
                    format!("No se pudo guardar el archivo: {}", e),
                ));
                None
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
