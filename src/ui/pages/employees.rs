//! Employee administration screen

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::{hint_line, notice_key, LOADING_LIST};
use crate::nav::Route;
use crate::pages::EmployeesPage;
use crate::types::{Employee, Role};
use crate::ui::dialogs::{ConfirmChoice, ConfirmDialog, FormDialog, FormOutcome, NoticeDialog};
use crate::ui::form_field::FormField;
use crate::ui::screen::{navigate_list, Command, FilterInput, Screen};
use crate::ui::table::{render_table, Columns};

const ROLE: usize = 0;
const SUPERVISOR: usize = 1;

/// Role form for one employee; `supervisors` backs the second selector,
/// whose first option is "none"
struct RoleForm {
    legajo: u64,
    supervisors: Vec<u64>,
    dialog: FormDialog,
}

pub struct EmployeesScreen {
    page: EmployeesPage,
    filter: FilterInput,
    confirm: ConfirmDialog,
    notice: NoticeDialog,
    form: Option<RoleForm>,
    load_pending: bool,
}

impl EmployeesScreen {
    pub fn new(page: EmployeesPage) -> Self {
        Self {
            page,
            filter: FilterInput::default(),
            confirm: ConfirmDialog::new(),
            notice: NoticeDialog::new(),
            form: None,
            load_pending: false,
        }
    }

    fn open_role_form(&mut self) {
        let Some(employee) = self.page.page().list().selected_row().cloned() else {
            return;
        };
        let supervisors: Vec<&Employee> = self
            .page
            .supervisors()
            .into_iter()
            .filter(|s| s.legajo != employee.legajo)
            .collect();
        let mut options = vec!["Ninguno".to_string()];
        options.extend(supervisors.iter().map(|s| format!("{} ({})", s.full_name(), s.legajo)));
        let current = employee
            .supervisor_id
            .and_then(|id| supervisors.iter().position(|s| s.legajo == id))
            .map_or(0, |i| i + 1);
        let role_index = Role::ALL.iter().position(|r| *r == employee.rol).unwrap_or(0);

        let dialog = FormDialog::new(
            format!("Editar Rol: {}", employee.full_name()),
            vec![
                FormField::select(
                    "Rol",
                    Role::ALL.iter().map(|r| r.to_string()).collect(),
                    role_index,
                ),
                FormField::select("Supervisor", options, current),
            ],
        );
        self.form = Some(RoleForm {
            legajo: employee.legajo,
            supervisors: supervisors.iter().map(|s| s.legajo).collect(),
            dialog,
        });
    }

    fn submit_role_form(&mut self, form: RoleForm) {
        let rol = form
            .dialog
            .field(ROLE)
            .and_then(FormField::selected_index)
            .and_then(|i| Role::ALL.get(i).copied());
        let Some(rol) = rol else {
            return;
        };
        let supervisor_id = form
            .dialog
            .field(SUPERVISOR)
            .and_then(FormField::selected_index)
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| form.supervisors.get(i).copied());
        self.page.update_role(form.legajo, rol, supervisor_id);
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Command {
        let Some(form) = self.form.as_mut() else {
            return Command::None;
        };
        match form.dialog.handle_key(key) {
            FormOutcome::Editing => {}
            FormOutcome::Cancelled => self.form = None,
            FormOutcome::Submitted => {
                if let Some(form) = self.form.take() {
                    self.submit_role_form(form);
                }
            }
        }
        Command::None
    }
}

#[async_trait]
impl Screen for EmployeesScreen {
    fn title(&self) -> String {
        Route::Employees.title().to_string()
    }

    fn keys(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("↑↓ / j k", "Elegir empleado"),
            ("n / p", "Página siguiente / anterior"),
            ("/", "Buscar"),
            ("s", "Filtrar por estado"),
            ("e / Enter", "Editar rol y supervisor"),
            ("t", "Activar / desactivar"),
            ("r", "Recargar"),
            ("Esc", "Volver al inicio"),
        ]
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(5), Constraint::Length(1)])
            .split(area);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("Estado: ", Style::default().fg(Color::Gray)),
                Span::styled(
                    self.page.status_filter().label(),
                    Style::default().fg(Color::Cyan),
                ),
            ])),
            chunks[0],
        );

        let columns = Columns {
            headers: &["Legajo", "Nombre", "Email", "Rol", "Estado"],
            widths: &[
                Constraint::Length(8),
                Constraint::Percentage(30),
                Constraint::Percentage(30),
                Constraint::Length(15),
                Constraint::Length(10),
            ],
        };
        render_table(
            frame,
            chunks[1],
            "Empleados",
            self.page.page().list(),
            &columns,
            self.filter.editing,
            |e: &Employee| {
                vec![
                    e.legajo.to_string(),
                    e.full_name(),
                    e.email.clone(),
                    e.rol.to_string(),
                    e.display_status().label().to_string(),
                ]
            },
        );
        frame.render_widget(
            Paragraph::new(hint_line(&[
                ("e", "Editar rol"),
                ("t", "Activar/Desactivar"),
                ("s", "Estado"),
                ("/", "Buscar"),
            ])),
            chunks[2],
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
        if self.filter.handle_key(self.page.page_mut().list_mut(), key.code) {
            return Command::None;
        }
        if navigate_list(self.page.page_mut().list_mut(), key.code) {
            return Command::None;
        }
        match key.code {
            KeyCode::Esc => return Command::Navigate(Route::Dashboard),
            KeyCode::Char('s') => {
                let next = self.page.status_filter().cycle();
                self.page.set_status_filter(next);
            }
            KeyCode::Char('e') | KeyCode::Enter => self.open_role_form(),
            KeyCode::Char('t') => {
                if let Some(legajo) = self.page.page().list().selected_key() {
                    self.page.request_toggle(legajo);
                }
            }
            KeyCode::Char('r') => {
                self.load_pending = true;
                return Command::Busy(LOADING_LIST);
            }
            _ => {}
        }
        Command::None
    }

    async fn work(&mut self) -> Command {
        if std::mem::take(&mut self.load_pending) {
            self.page.load().await;
        }
        Command::None
    }

    fn start(&mut self) -> Command {
        self.load_pending = true;
        Command::Busy(LOADING_LIST)
    }

    fn tick(&mut self) {
        self.page.poll();
    }

    fn is_typing(&self) -> bool {
        self.filter.editing || self.form.is_some()
    }
}
