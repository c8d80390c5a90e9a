//! Price list administration: per-band edits, bulk load and bulk increase

use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use super::listing::{Confirmation, ListPage, ListRow};
use crate::api::AdminApi;
use crate::config::Config;
use crate::quoter::Notice;
use crate::session::Session;
use crate::types::{IncomeChannel, IncreaseScope, NewPriceEntry, Plan, PriceEntry};

/// Channels that carry their own price list
pub const PRICE_LIST_CHANNELS: [IncomeChannel; 2] =
    [IncomeChannel::Obligatory, IncomeChannel::Voluntary];

impl ListRow for PriceEntry {
    type Key = u64;

    fn key(&self) -> u64 {
        self.id
    }

    fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.rango_etario,
            self.precio,
            self.lista_nombre.as_deref().unwrap_or_default()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceAction {
    Delete(u64),
}

/// Parse a user-typed amount; must be strictly positive
pub fn parse_positive(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim().replace(',', ".").as_str())
        .ok()
        .filter(|value| *value > Decimal::ZERO)
}

pub struct PricesPage {
    api: Arc<dyn AdminApi>,
    page: ListPage<PriceEntry>,
    plans: Vec<Plan>,
    plan_id: Option<u64>,
    channel: IncomeChannel,
    confirmation: Option<Confirmation<PriceAction>>,
}

impl PricesPage {
    pub fn new(api: Arc<dyn AdminApi>, session: Session, config: &Config) -> Self {
        Self {
            api,
            page: ListPage::new(session, config.ui.page_size),
            plans: Vec::new(),
            plan_id: None,
            channel: IncomeChannel::Obligatory,
            confirmation: None,
        }
    }

    /// Load the plan selector, then the first plan's list
    pub async fn load(&mut self) {
        match self.api.plans(self.page.cancel_token()).await {
            Ok(plans) => {
                self.plan_id = plans.first().map(|p| p.id);
                self.plans = plans;
            }
            Err(err) => {
                self.page.fail("Error de Carga", &err);
                return;
            }
        }
        self.load_prices().await;
    }

    pub async fn load_prices(&mut self) {
        let Some(plan_id) = self.plan_id else {
            return;
        };
        let result = self
            .api
            .price_list(plan_id, self.channel, self.page.cancel_token())
            .await
            .map(|mut entries| {
                entries.sort_by_key(PriceEntry::band_order);
                entries
            });
        self.page.accept_load("Error de Carga", result);
    }

    /// Change the plan/channel selection and reload
    pub async fn select(&mut self, plan_id: u64, channel: IncomeChannel) {
        self.plan_id = Some(plan_id);
        self.channel = channel.price_list_channel();
        self.load_prices().await;
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn plan_id(&self) -> Option<u64> {
        self.plan_id
    }

    pub fn channel(&self) -> IncomeChannel {
        self.channel
    }

    pub fn page(&self) -> &ListPage<PriceEntry> {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut ListPage<PriceEntry> {
        &mut self.page
    }

    /// Post one entry per band with a parsable price. `inputs` pairs a band
    /// label with the typed amount. Returns how many entries were sent.
    pub async fn bulk_load(
        &mut self,
        plan_id: u64,
        channel: IncomeChannel,
        inputs: &[(&str, &str)],
    ) -> usize {
        let entries = NewPriceEntry::from_inputs(
            plan_id,
            channel.price_list_channel(),
            inputs.iter().copied(),
        );
        if entries.is_empty() {
            self.page.set_notice(Notice::warning(
                "Sin Precios",
                "Ingrese al menos un precio válido.",
            ));
            return 0;
        }

        match self
            .api
            .bulk_load_prices(&entries, self.page.cancel_token())
            .await
        {
            Ok(()) => {
                info!(plan_id, count = entries.len(), "price list loaded");
                self.page.set_notice(Notice::success(
                    "Carga Masiva",
                    "Precios cargados masivamente con éxito.",
                ));
                if self.plan_id == Some(plan_id) && self.channel == channel.price_list_channel() {
                    self.load_prices().await;
                }
                entries.len()
            }
            Err(err) => {
                self.page.fail("Fallo en Carga Masiva", &err);
                0
            }
        }
    }

    pub fn update_price(&mut self, id: u64, raw: &str) -> bool {
        let Some(precio) = parse_positive(raw) else {
            self.page
                .set_notice(Notice::warning("Precio Inválido", "Ingrese un importe mayor a cero."));
            return false;
        };
        let Some(rango_etario) = self.page.list().get(&id).map(|e| e.rango_etario.clone()) else {
            return false;
        };
        let api = Arc::clone(&self.api);
        let cancel = self.page.cancel_token().clone();
        self.page.mutate(
            &id,
            "Error al Actualizar",
            |entry| entry.precio = precio,
            async move { api.update_price(id, precio, &rango_etario, &cancel).await },
        )
    }

    pub fn request_delete(&mut self, id: u64) {
        if self.page.list().get(&id).is_none() {
            return;
        }
        self.confirmation = Some(
            Confirmation::new(
                "Eliminar Precio",
                "¿Está seguro de que desea eliminar este precio? Esta acción no se puede deshacer.",
                PriceAction::Delete(id),
            )
            .with_label("Eliminar"),
        );
    }

    pub fn confirmation(&self) -> Option<&Confirmation<PriceAction>> {
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
            PriceAction::Delete(id) => {
                let api = Arc::clone(&self.api);
                let cancel = self.page.cancel_token().clone();
                info!(id, "deleting price entry");
                self.page.remove(&id, "Error al Eliminar", async move {
                    api.delete_price(id, &cancel).await
                })
            }
        }
    }

    /// Raise every price in scope by a percentage, then reload
    pub async fn bulk_increase(&mut self, raw_percentage: &str, scope: IncreaseScope) -> bool {
        let Some(porcentaje) = parse_positive(raw_percentage) else {
            self.page.set_notice(Notice::warning(
                "Porcentaje Inválido",
                "El porcentaje debe ser mayor a cero.",
            ));
            return false;
        };
        match self
            .api
            .bulk_increase(porcentaje, scope, self.page.cancel_token())
            .await
        {
            Ok(()) => {
                info!(%porcentaje, scope = scope.wire_name(), "bulk increase applied");
                self.page.set_notice(Notice::success(
                    "Aumento Aplicado",
                    "Aumento aplicado correctamente.",
                ));
                self.load_prices().await;
                true
            }
            Err(err) => {
                self.page.fail("Fallo en Aumento Masivo", &err);
                false
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{plan, signed_in_session, AdminCall, FakeAdminApi};
    use crate::types::Role;

    fn entry(id: u64, plan_id: u64, channel: IncomeChannel, band: &str, precio: i64) -> PriceEntry {
        PriceEntry {
            id,
            plan_id,
            tipo_ingreso: channel,
            lista_nombre: Some(channel.wire_name().to_string()),
            rango_etario: band.to_string(),
            precio: Decimal::from(precio),
        }
    }

    async fn loaded_page(api: &Arc<FakeAdminApi>) -> PricesPage {
        *api.plans.lock().unwrap() = vec![plan(1, "Plan 200"), plan(2, "Plan 300")];
        *api.prices.lock().unwrap() = vec![
            entry(10, 1, IncomeChannel::Obligatory, "HIJO 0-1", 9000),
            entry(11, 1, IncomeChannel::Obligatory, "0-25", 30000),
            entry(12, 1, IncomeChannel::Voluntary, "0-25", 35000),
            entry(13, 2, IncomeChannel::Obligatory, "26-35", 41000),
        ];
        let mut page = PricesPage::new(
            api.clone(),
            signed_in_session(Role::Supervisor),
            &Config::default(),
        );
        page.load().await;
        page
    }

    fn ids(page: &PricesPage) -> Vec<u64> {
        page.page().list().items().iter().map(|e| e.id).collect()
    }

    #[tokio::test]
    async fn test_first_plan_loaded_in_band_order() {
        let api = Arc::new(FakeAdminApi::default());
        let page = loaded_page(&api).await;

        assert_eq!(page.plan_id(), Some(1));
        assert_eq!(ids(&page), vec![11, 10]);
    }

    #[tokio::test]
    async fn test_self_employed_selects_obligatory_list() {
        let api = Arc::new(FakeAdminApi::default());
        let mut page = loaded_page(&api).await;

        page.select(2, IncomeChannel::SelfEmployed).await;

        assert_eq!(page.channel(), IncomeChannel::Obligatory);
        assert_eq!(ids(&page), vec![13]);
    }

    #[tokio::test]
    async fn test_bulk_load_skips_unparsable_inputs() {
        let api = Arc::new(FakeAdminApi::default());
        let mut page = loaded_page(&api).await;

        let sent = page
            .bulk_load(
                2,
                IncomeChannel::Voluntary,
                &[("0-25", "31000"), ("26-35", ""), ("36-40", "abc"), ("FAMILIAR A CARGO", "5000.50")],
            )
            .await;

        assert_eq!(sent, 2);
        assert!(api.calls().contains(&AdminCall::BulkLoad(2)));

        assert_eq!(page.bulk_load(2, IncomeChannel::Voluntary, &[("0-25", " ")]).await, 0);
        assert_eq!(page.page().notice().unwrap().title, "Sin Precios");
    }

    #[tokio::test]
    async fn test_update_price_is_optimistic() {
        let api = Arc::new(FakeAdminApi::default());
        let mut page = loaded_page(&api).await;

        assert!(!page.update_price(11, "-3"));
        assert!(page.update_price(11, "32500,50"));
        assert_eq!(
            page.page().list().get(&11).unwrap().precio,
            Decimal::from_str("32500.50").unwrap()
        );
        page.settle().await;
        assert!(api.calls().contains(&AdminCall::UpdatePrice(
            11,
            Decimal::from_str("32500.50").unwrap(),
            "0-25".to_string()
        )));
    }

    #[tokio::test]
    async fn test_delete_is_confirmed_and_rolled_back_on_failure() {
        let api = Arc::new(FakeAdminApi::default());
        let mut page = loaded_page(&api).await;

        page.request_delete(10);
        assert_eq!(page.confirmation().unwrap().title, "Eliminar Precio");
        api.fail_next_with(crate::api::ApiError::business(500, "No se pudo eliminar"));
        assert!(page.confirm());
        assert_eq!(ids(&page), vec![11]);

        page.settle().await;
        assert_eq!(ids(&page), vec![11, 10]);
        assert_eq!(page.page().notice().unwrap().title, "Error al Eliminar");
    }

    #[tokio::test]
    async fn test_bulk_increase_requires_positive_percentage() {
        let api = Arc::new(FakeAdminApi::default());
        let mut page = loaded_page(&api).await;

        assert!(!page.bulk_increase("0", IncreaseScope::All).await);
        assert!(!page.bulk_increase("", IncreaseScope::All).await);
        assert!(page.bulk_increase("7.5", IncreaseScope::All).await);

        let calls = api.calls();
        assert!(calls.contains(&AdminCall::BulkIncrease(
            Decimal::from_str("7.5").unwrap(),
            IncreaseScope::All
        )));
        // Reloaded after the increase
        assert_eq!(
            calls
                .iter()
                .filter(|c| matches!(c, AdminCall::PriceList(1, _)))
                .count(),
            2
        );
    }
}
