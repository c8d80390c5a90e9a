//! Coverage plan administration screen

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Paragraph,
    Frame,
};

use super::{hint_line, notice_key, LOADING_LIST};
use crate::nav::Route;
use crate::pages::PlansPage;
use crate::types::{Plan, PlanDraft};
use crate::ui::dialogs::{ConfirmChoice, ConfirmDialog, FormDialog, FormOutcome, NoticeDialog};
use crate::ui::form_field::FormField;
use crate::ui::screen::{navigate_list, Command, FilterInput, Screen};
use crate::ui::table::{render_table, Columns};

const LOADING_SAVE: &str = "Guardando...";

enum Job {
    Load,
    Create(PlanDraft),
}

/// Open plan form: `None` creates, `Some(id)` edits
struct PlanForm {
    id: Option<u64>,
    dialog: FormDialog,
}

impl PlanForm {
    fn draft(&self) -> PlanDraft {
        PlanDraft {
            nombre: self.dialog.value(0).trim().to_string(),
            descripcion: self.dialog.value(1).trim().to_string(),
        }
    }
}

pub struct PlansScreen {
    page: PlansPage,
    filter: FilterInput,
    confirm: ConfirmDialog,
    notice: NoticeDialog,
    form: Option<PlanForm>,
    job: Option<Job>,
}

impl PlansScreen {
    pub fn new(page: PlansPage) -> Self {
        Self {
            page,
            filter: FilterInput::default(),
            confirm: ConfirmDialog::new(),
            notice: NoticeDialog::new(),
            form: None,
            job: None,
        }
    }

    fn open_form(&mut self, plan: Option<&Plan>) {
        let draft = plan.map(Plan::draft).unwrap_or_default();
        let title = if plan.is_some() { "Editar Plan" } else { "Nuevo Plan" };
        self.form = Some(PlanForm {
            id: plan.map(|p| p.id),
            dialog: FormDialog::new(
                title,
                vec![
                    FormField::text("Nombre", draft.nombre),
                    FormField::text("Descripción", draft.descripcion),
                ],
            ),
        });
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Command {
        let Some(form) = self.form.as_mut() else {
            return Command::None;
        };
        match form.dialog.handle_key(key) {
            FormOutcome::Editing => Command::None,
            FormOutcome::Cancelled => {
                self.form = None;
                Command::None
            }
            FormOutcome::Submitted => {
                let Some(form) = self.form.take() else {
                    return Command::None;
                };
                match form.id {
                    Some(id) => {
                        self.page.update(id, form.draft());
                        Command::None
                    }
                    None => {
                        self.job = Some(Job::Create(form.draft()));
                        Command::Busy(LOADING_SAVE)
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Screen for PlansScreen {
    fn title(&self) -> String {
        Route::Plans.title().to_string()
    }

    fn keys(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("↑↓ / j k", "Elegir plan"),
            ("n / p", "Página siguiente / anterior"),
            ("/", "Buscar"),
            ("a", "Nuevo plan"),
            ("e / Enter", "Editar plan"),
            ("d", "Desactivar plan"),
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
            headers: &["ID", "Nombre", "Descripción", "Estado"],
            widths: &[
                Constraint::Length(6),
                Constraint::Percentage(30),
                Constraint::Percentage(50),
                Constraint::Length(10),
            ],
        };
        render_table(
            frame,
            chunks[0],
            "Planes",
            self.page.page().list(),
            &columns,
            self.filter.editing,
            |p: &Plan| {
                vec![
                    p.id.to_string(),
                    p.nombre.clone(),
                    p.descripcion.clone(),
                    if p.activo { "activo" } else { "inactivo" }.to_string(),
                ]
            },
        );
        frame.render_widget(
            Paragraph::new(hint_line(&[
                ("a", "Nuevo"),
                ("e", "Editar"),
                ("d", "Desactivar"),
                ("/", "Buscar"),
            ])),
            chunks[1],
        );

        if let Some(form) = &self.form {
            form.dialog.render(frame);
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
        if self.form.is_some() {
            return self.handle_form_key(key);
        }
        if self.filter.handle_key(self.page.page_mut().list_mut(), key.code)
            || navigate_list(self.page.page_mut().list_mut(), key.code)
        {
            return Command::None;
        }
        match key.code {
            KeyCode::Esc => return Command::Navigate(Route::Dashboard),
            KeyCode::Char('a') => self.open_form(None),
            KeyCode::Char('e') | KeyCode::Enter => {
                let selected = self.page.page().list().selected_row().cloned();
                if let Some(plan) = selected {
                    self.open_form(Some(&plan));
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.page.page().list().selected_key() {
                    self.page.request_deactivate(id);
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
            Some(Job::Create(draft)) => {
                self.page.create(draft).await;
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
        self.filter.editing || self.form.is_some()
    }
}
