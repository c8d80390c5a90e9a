//! Read-only price lookup open to every role

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::api::{AdminApi, ApiError, QuoteApi};
use crate::quoter::Notice;
use crate::session::{LogoutReason, Session};
use crate::types::{AgeBand, AgeBandGroup, IncomeChannel, Plan, PriceEntry};

pub struct PriceViewPage {
    plans_api: Arc<dyn QuoteApi>,
    prices_api: Arc<dyn AdminApi>,
    session: Session,
    cancel: CancellationToken,
    plans: Vec<Plan>,
    plan_id: Option<u64>,
    channel: IncomeChannel,
    entries: Vec<PriceEntry>,
    notice: Option<Notice>,
}

impl PriceViewPage {
    pub fn new(plans_api: Arc<dyn QuoteApi>, prices_api: Arc<dyn AdminApi>, session: Session) -> Self {
        Self {
            plans_api,
            prices_api,
            session,
            cancel: CancellationToken::new(),
            plans: Vec::new(),
            plan_id: None,
            channel: IncomeChannel::Obligatory,
            entries: Vec::new(),
            notice: None,
        }
    }

    /// Load the active plans. Nothing is selected until the operator picks one.
    pub async fn load(&mut self) {
        match self.plans_api.active_plans(&self.cancel).await {
            Ok(plans) => self.plans = plans,
            Err(err) => self.fail("No se pudieron cargar los planes disponibles", &err),
        }
    }

    pub async fn select(&mut self, plan_id: u64, channel: IncomeChannel) {
        self.plan_id = Some(plan_id);
        self.channel = channel.price_list_channel();
        match self
            .prices_api
            .price_list(plan_id, self.channel, &self.cancel)
            .await
        {
            Ok(mut entries) => {
                entries.sort_by_key(PriceEntry::band_order);
                self.entries = entries;
            }
            Err(err) => {
                self.entries.clear();
                self.fail("No se pudieron cargar los precios para esta selección", &err);
            }
        }
    }

    fn fail(&mut self, context: &str, err: &ApiError) {
        if err.is_cancelled() {
            return;
        }
        if err.is_auth_error() {
            self.session.logout(LogoutReason::Expired);
            self.notice = Some(Notice::session_expired());
            return;
        }
        warn!("{}: {}", context, err);
        self.notice = Some(Notice::error(
            "Error de Carga",
            format!("{}: {}", context, err.user_message()),
        ));
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn selected_plan(&self) -> Option<&Plan> {
        let id = self.plan_id?;
        self.plans.iter().find(|p| p.id == id)
    }

    pub fn channel(&self) -> IncomeChannel {
        self.channel
    }

    pub fn entries(&self) -> &[PriceEntry] {
        &self.entries
    }

    /// Entries split into the grid sections: holder, couple, children, dependents
    pub fn sections(&self) -> Vec<(AgeBandGroup, Vec<&PriceEntry>)> {
        let mut sections: Vec<(AgeBandGroup, Vec<&PriceEntry>)> = Vec::new();
        for entry in &self.entries {
            let Some(group) = AgeBand::find(&entry.rango_etario).map(|b| b.group) else {
                continue;
            };
            match sections.iter_mut().find(|(g, _)| *g == group) {
                Some((_, rows)) => rows.push(entry),
                None => sections.push((group, vec![entry])),
            }
        }
        sections
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// True when the session ended and the caller must go to the login screen
    pub fn acknowledge_notice(&mut self) -> bool {
        self.notice
            .take()
            .is_some_and(|notice| notice.is_session_expired())
    }
}

impl Drop for PriceViewPage {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{plan, signed_in_session, FakeAdminApi, FakeQuoteApi};
    use crate::types::Role;
    use rust_decimal::Decimal;

    fn entry(id: u64, band: &str) -> PriceEntry {
        PriceEntry {
            id,
            plan_id: 1,
            tipo_ingreso: IncomeChannel::Obligatory,
            lista_nombre: None,
            rango_etario: band.to_string(),
            precio: Decimal::from(1000 + id),
        }
    }

    #[tokio::test]
    async fn test_entries_grouped_by_band_section() {
        let quotes = Arc::new(FakeQuoteApi::with_plans(vec![plan(1, "Plan 200")]));
        let admin = Arc::new(FakeAdminApi::default());
        *admin.prices.lock().unwrap() = vec![
            entry(1, "HIJO 2-20"),
            entry(2, "MAT 0-25"),
            entry(3, "0-25"),
            entry(4, "26-35"),
            entry(5, "FAMILIAR A CARGO"),
        ];
        let mut page = PriceViewPage::new(quotes, admin, signed_in_session(Role::Advisor));

        page.load().await;
        page.select(1, IncomeChannel::SelfEmployed).await;

        assert_eq!(page.selected_plan().unwrap().nombre, "Plan 200");
        assert_eq!(page.channel(), IncomeChannel::Obligatory);
        let sections = page.sections();
        let groups: Vec<AgeBandGroup> = sections.iter().map(|(g, _)| *g).collect();
        assert_eq!(
            groups,
            vec![
                AgeBandGroup::Holder,
                AgeBandGroup::Couple,
                AgeBandGroup::Child,
                AgeBandGroup::Dependent
            ]
        );
        assert_eq!(sections[0].1.len(), 2);
    }

    #[tokio::test]
    async fn test_price_failure_clears_grid() {
        let quotes = Arc::new(FakeQuoteApi::default());
        let admin = Arc::new(FakeAdminApi::default());
        *admin.prices.lock().unwrap() = vec![entry(1, "0-25")];
        let mut page = PriceViewPage::new(quotes, admin.clone(), signed_in_session(Role::Advisor));

        page.select(1, IncomeChannel::Obligatory).await;
        assert_eq!(page.entries().len(), 1);

        admin.fail_next_with(ApiError::network("timeout"));
        page.select(1, IncomeChannel::Voluntary).await;
        assert!(page.entries().is_empty());
        assert_eq!(page.notice().unwrap().title, "Error de Carga");
        assert!(!page.acknowledge_notice());
    }
}
