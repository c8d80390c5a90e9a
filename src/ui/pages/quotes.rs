//! The operator's quote history screen

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Paragraph,
    Frame,
};

use super::{hint_line, notice_key, LOADING_LIST};
use crate::nav::Route;
use crate::pages::QuoteHistoryPage;
use crate::quoter::workflow::LOADING_DOCUMENT;
use crate::quoter::QuoterEntry;
use crate::types::QuoteListItem;
use crate::ui::dialogs::{
    closes_detail, render_quote_detail, ConfirmChoice, ConfirmDialog, NoticeDialog,
};
use crate::ui::screen::{navigate_list, Command, FilterInput, Screen};
use crate::ui::table::{render_table, Columns};

enum Job {
    Load,
    View(u64),
    Download(u64),
}

pub struct QuotesScreen {
    page: QuoteHistoryPage,
    filter: FilterInput,
    confirm: ConfirmDialog,
    notice: NoticeDialog,
    job: Option<Job>,
}

impl QuotesScreen {
    pub fn new(page: QuoteHistoryPage) -> Self {
        Self {
            page,
            filter: FilterInput::default(),
            confirm: ConfirmDialog::new(),
            notice: NoticeDialog::new(),
            job: None,
        }
    }
}

#[async_trait]
impl Screen for QuotesScreen {
    fn title(&self) -> String {
        Route::QuoteHistory.title().to_string()
    }

    fn keys(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("↑↓ / j k", "Elegir cotización"),
            ("n / p", "Página siguiente / anterior"),
            ("/", "Buscar"),
            ("a", "Nueva cotización"),
            ("v", "Ver detalle"),
            ("e / Enter", "Editar cotización"),
            ("d", "Descargar PDF"),
            ("x", "Anular cotización"),
            ("r", "Recargar"),
            ("Esc", "Volver al inicio"),
        ]
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(1)])
            .split(area);

        let columns = Columns {
            headers: &["#", "Fecha", "Cliente", "DNI", "Plan", "Total", "Estado"],
            widths: &[
                Constraint::Length(6),
                Constraint::Length(11),
                Constraint::Percentage(25),
                Constraint::Length(10),
                Constraint::Percentage(15),
                Constraint::Length(14),
                Constraint::Length(10),
            ],
        };
        render_table(
            frame,
            chunks[0],
            "Mis Cotizaciones",
            self.page.page().list(),
            &columns,
            self.filter.editing,
            |q: &QuoteListItem| {
                vec![
                    q.id.to_string(),
                    q.created_on(),
                    format!("{}, {}", q.cliente_apellido, q.cliente_nombre),
                    q.cliente_dni.clone(),
                    q.plan_nombre.clone().unwrap_or_default(),
                    q.valor_total
                        .map(|v| format!("$ {:.2}", v))
                        .unwrap_or_default(),
                    q.estado.to_string(),
                ]
            },
        );
        frame.render_widget(
            Paragraph::new(hint_line(&[
                ("a", "Nueva"),
                ("v", "Ver"),
                ("e", "Editar"),
                ("d", "PDF"),
                ("x", "Anular"),
                ("/", "Buscar"),
            ])),
            chunks[1],
        );

        if let Some(record) = self.page.detail() {
            render_quote_detail(frame, record);
        }
        if let Some(confirmation) = self.page.confirmation() {
            self.confirm.render(frame, confirmation);
        }
        if let Some(notice) = self.page.page().notice() {
            self.notice.render(frame, notice);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Command {
        if let Some(command) = notice_key(self.page.page_mut(), &mut self.notice, key.code) {
            return command;
        }
        if self.page.detail().is_some() {
            if closes_detail(key.code) {
                self.page.close_detail();
            }
            return Command::None;
        }
        if self.page.confirmation().is_some() {
            match self.confirm.handle_key(key.code) {
                Some(ConfirmChoice::Confirm) => {
                    self.page.confirm();
                }
                Some(ConfirmChoice::Cancel) => self.page.cancel_confirmation(),
                None => {}
            }
            return Command::None;
        }
        if self.filter.handle_key(self.page.page_mut().list_mut(), key.code)
            || navigate_list(self.page.page_mut().list_mut(), key.code)
        {
            return Command::None;
        }
        let selected = self.page.page().list().selected_key();
        match key.code {
            KeyCode::Esc => return Command::Navigate(Route::Dashboard),
            KeyCode::Char('a') => {
                return Command::Navigate(Route::Quoter(QuoterEntry {
                    edit_id: None,
                    from_list: true,
                }))
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(entry) = selected.and_then(|id| self.page.edit(id)) {
                    return Command::Navigate(Route::Quoter(entry));
                }
            }
            KeyCode::Char('v') => {
                if let Some(id) = selected {
                    self.job = Some(Job::View(id));
                    return Command::Busy(LOADING_LIST);
                }
            }
            KeyCode::Char('x') => {
                if let Some(id) = selected {
                    self.page.request_void(id);
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = selected {
                    self.job = Some(Job::Download(id));
                    return Command::Busy(LOADING_DOCUMENT);
                }
            }
            KeyCode::Char('r') => {
                self.job = Some(Job::Load);
                return Command::Busy(LOADING_LIST);
            }
            _ => {}
        }
        Command::None
    }

    async fn work(&mut self) -> Command {
        match self.job.take() {
            Some(Job::Load) => self.page.load().await,
            Some(Job::View(id)) => {
                self.page.view(id).await;
            }
            Some(Job::Download(id)) => {
                self.page.download(id).await;
            }
            None => {}
        }
        Command::None
    }

    fn start(&mut self) -> Command {
        self.job = Some(Job::Load);
        Command::Busy(LOADING_LIST)
    }

    fn tick(&mut self) {
        self.page.poll();
    }

    fn is_typing(&self) -> bool {
        self.filter.editing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::testing::{signed_in_session, FakeQuoteApi, QuoteCall};
    use crate::types::{QuoteStatus, Role};
    use crossterm::event::KeyModifiers;
    use serde_json::json;
    use std::sync::Arc;

    fn press(screen: &mut QuotesScreen, code: KeyCode) -> Command {
        screen.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn item(id: u64, estado: &str) -> QuoteListItem {
        serde_json::from_value(json!({
            "id": id,
            "fecha_creacion": "2026-03-14T10:22:00Z",
            "cliente_nombre": "Ana",
            "cliente_apellido": "Pérez",
            "cliente_dni": "30123456",
            "plan_nombre": "Plan 200",
            "valor_total": "57460.00",
            "estado": estado
        }))
        .unwrap()
    }

    async fn loaded(api: &Arc<FakeQuoteApi>) -> QuotesScreen {
        *api.quotes.lock().unwrap() = vec![item(7, "cotizado"), item(8, "cancelado")];
        let page = QuoteHistoryPage::new(
            api.clone(),
            signed_in_session(Role::Advisor),
            &Config::default(),
        );
        let mut screen = QuotesScreen::new(page);
        screen.start();
        screen.work().await;
        screen
    }

    #[tokio::test]
    async fn test_edit_opens_wizard_from_list() {
        let api = Arc::new(FakeQuoteApi::default());
        let mut screen = loaded(&api).await;

        assert_eq!(
            press(&mut screen, KeyCode::Enter),
            Command::Navigate(Route::Quoter(QuoterEntry::edit(7)))
        );
        assert_eq!(
            press(&mut screen, KeyCode::Char('a')),
            Command::Navigate(Route::Quoter(QuoterEntry {
                edit_id: None,
                from_list: true
            }))
        );
    }

    #[tokio::test]
    async fn test_view_opens_detail_over_list() {
        let api = Arc::new(FakeQuoteApi::default());
        api.stored.lock().unwrap().insert(
            7,
            serde_json::from_value(json!({
                "id": 7,
                "cliente": { "dni": "30123456", "nombres": "Ana", "apellidos": "Pérez" },
                "valor_total": "57460.00",
                "estado": "cotizado"
            }))
            .unwrap(),
        );
        let mut screen = loaded(&api).await;

        assert_eq!(press(&mut screen, KeyCode::Char('v')), Command::Busy(LOADING_LIST));
        screen.work().await;
        assert_eq!(screen.page.detail().and_then(|d| d.id), Some(7));

        // Keys stay with the overlay until it is closed
        assert_eq!(press(&mut screen, KeyCode::Char('x')), Command::None);
        assert!(screen.page.confirmation().is_none());
        press(&mut screen, KeyCode::Esc);
        assert!(screen.page.detail().is_none());
        assert_eq!(press(&mut screen, KeyCode::Esc), Command::Navigate(Route::Dashboard));
    }

    #[tokio::test]
    async fn test_view_with_expired_session_goes_to_login() {
        let api = Arc::new(FakeQuoteApi::default());
        let mut screen = loaded(&api).await;
        *api.fail_next.lock().unwrap() = Some(crate::api::ApiError::unauthorized(None));

        press(&mut screen, KeyCode::Char('v'));
        screen.work().await;

        assert!(screen.page.detail().is_none());
        assert!(screen.page.page().notice().unwrap().is_session_expired());
        assert_eq!(press(&mut screen, KeyCode::Enter), Command::Navigate(Route::Login));
    }

    #[tokio::test]
    async fn test_voided_rows_refuse_actions() {
        let api = Arc::new(FakeQuoteApi::default());
        let mut screen = loaded(&api).await;

        press(&mut screen, KeyCode::Down);
        assert_eq!(press(&mut screen, KeyCode::Enter), Command::None);
        assert_eq!(
            screen.page.page().notice().unwrap().title,
            "Cotización Anulada"
        );
        press(&mut screen, KeyCode::Enter);
        press(&mut screen, KeyCode::Char('x'));
        assert!(screen.page.confirmation().is_none());
    }

    #[tokio::test]
    async fn test_void_after_confirmation() {
        let api = Arc::new(FakeQuoteApi::default());
        let mut screen = loaded(&api).await;

        press(&mut screen, KeyCode::Char('x'));
        press(&mut screen, KeyCode::Left);
        press(&mut screen, KeyCode::Enter);
        screen.page.settle().await;

        assert_eq!(api.count(|c| *c == QuoteCall::Void(7)), 1);
        assert_eq!(
            screen.page.page().list().get(&7).unwrap().estado,
            QuoteStatus::Voided
        );
    }
}
