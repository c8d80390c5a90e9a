//! Price list administration screen

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::{cycle_index, hint_line, notice_key, LOADING_LIST};
use crate::nav::Route;
use crate::pages::{PricesPage, PRICE_LIST_CHANNELS};
use crate::types::{IncomeChannel, IncreaseScope, PriceEntry, AGE_BANDS};
use crate::ui::dialogs::{ConfirmChoice, ConfirmDialog, FormDialog, FormOutcome, NoticeDialog};
use crate::ui::form_field::FormField;
use crate::ui::screen::{navigate_list, Command, FilterInput, Screen};
use crate::ui::table::{render_table, Columns};

const LOADING_SAVE: &str = "Guardando...";

/// Leading selector fields of the bulk-load form; band inputs follow
const BULK_PLAN: usize = 0;
const BULK_CHANNEL: usize = 1;
const BULK_BANDS: usize = 2;

const INCREASE_SCOPES: [IncreaseScope; 3] = [
    IncreaseScope::Channel(IncomeChannel::Obligatory),
    IncreaseScope::Channel(IncomeChannel::Voluntary),
    IncreaseScope::All,
];

enum Job {
    Load,
    Select(u64, IncomeChannel),
    BulkLoad {
        plan_id: u64,
        channel: IncomeChannel,
        inputs: Vec<(&'static str, String)>,
    },
    Increase(String, IncreaseScope),
}

enum PriceForm {
    Edit(u64, FormDialog),
    BulkLoad(FormDialog),
    Increase(FormDialog),
}

impl PriceForm {
    fn dialog(&self) -> &FormDialog {
        match self {
            PriceForm::Edit(_, dialog) | PriceForm::BulkLoad(dialog) | PriceForm::Increase(dialog) => {
                dialog
            }
        }
    }

    fn dialog_mut(&mut self) -> &mut FormDialog {
        match self {
            PriceForm::Edit(_, dialog) | PriceForm::BulkLoad(dialog) | PriceForm::Increase(dialog) => {
                dialog
            }
        }
    }
}

pub struct PricesScreen {
    page: PricesPage,
    filter: FilterInput,
    confirm: ConfirmDialog,
    notice: NoticeDialog,
    form: Option<PriceForm>,
    job: Option<Job>,
}

impl PricesScreen {
    pub fn new(page: PricesPage) -> Self {
        Self {
            page,
            filter: FilterInput::default(),
            confirm: ConfirmDialog::new(),
            notice: NoticeDialog::new(),
            form: None,
            job: None,
        }
    }

    fn plan_index(&self) -> usize {
        self.page
            .plan_id()
            .and_then(|id| self.page.plans().iter().position(|p| p.id == id))
            .unwrap_or(0)
    }

    fn channel_index(&self) -> usize {
        PRICE_LIST_CHANNELS
            .iter()
            .position(|c| *c == self.page.channel())
            .unwrap_or(0)
    }

    fn select(&mut self, plan_index: usize, channel: IncomeChannel) -> Command {
        let Some(plan) = self.page.plans().get(plan_index) else {
            return Command::None;
        };
        self.job = Some(Job::Select(plan.id, channel));
        Command::Busy(LOADING_LIST)
    }

    fn open_edit_form(&mut self) {
        let Some(entry) = self.page.page().list().selected_row() else {
            return;
        };
        let dialog = FormDialog::new(
            format!("Editar Precio: {}", entry.rango_etario),
            vec![FormField::text("Precio", entry.precio.to_string())],
        );
        self.form = Some(PriceForm::Edit(entry.id, dialog));
    }

    fn open_bulk_form(&mut self) {
        let mut fields = vec![
            FormField::select(
                "Plan",
                self.page.plans().iter().map(|p| p.nombre.clone()).collect(),
                self.plan_index(),
            ),
            FormField::select(
                "Tipo de ingreso",
                PRICE_LIST_CHANNELS.iter().map(|c| c.to_string()).collect(),
                self.channel_index(),
            ),
        ];
        fields.extend(
            AGE_BANDS
                .iter()
                .map(|band| FormField::text(band.display_label(), "")),
        );
        self.form = Some(PriceForm::BulkLoad(FormDialog::new("Carga Masiva", fields)));
    }

    fn open_increase_form(&mut self) {
        let dialog = FormDialog::new(
            "Aumento Masivo",
            vec![
                FormField::text("Porcentaje", ""),
                FormField::select(
                    "Aplicar a",
                    INCREASE_SCOPES.iter().map(|s| s.wire_name().to_string()).collect(),
                    INCREASE_SCOPES.len() - 1,
                ),
            ],
        );
        self.form = Some(PriceForm::Increase(dialog));
    }

    fn submit(&mut self, form: PriceForm) -> Command {
        match form {
            PriceForm::Edit(id, dialog) => {
                self.page.update_price(id, &dialog.value(0));
                Command::None
            }
            PriceForm::BulkLoad(dialog) => {
                let plan = dialog
                    .field(BULK_PLAN)
                    .and_then(FormField::selected_index)
                    .and_then(|i| self.page.plans().get(i))
                    .map(|p| p.id);
                let channel = dialog
                    .field(BULK_CHANNEL)
                    .and_then(FormField::selected_index)
                    .and_then(|i| PRICE_LIST_CHANNELS.get(i).copied());
                let (Some(plan_id), Some(channel)) = (plan, channel) else {
                    return Command::None;
                };
                let inputs = AGE_BANDS
                    .iter()
                    .enumerate()
                    .map(|(i, band)| (band.label, dialog.value(BULK_BANDS + i)))
                    .collect();
                self.job = Some(Job::BulkLoad {
                    plan_id,
                    channel,
                    inputs,
                });
                Command::Busy(LOADING_SAVE)
            }
            PriceForm::Increase(dialog) => {
                let scope = dialog
                    .field(1)
                    .and_then(FormField::selected_index)
                    .and_then(|i| INCREASE_SCOPES.get(i).copied())
                    .unwrap_or(IncreaseScope::All);
                self.job = Some(Job::Increase(dialog.value(0), scope));
                Command::Busy(LOADING_SAVE)
            }
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Command {
        let Some(form) = self.form.as_mut() else {
            return Command::None;
        };
        match form.dialog_mut().handle_key(key) {
            FormOutcome::Editing => Command::None,
            FormOutcome::Cancelled => {
                self.form = None;
                Command::None
            }
            FormOutcome::Submitted => match self.form.take() {
                Some(form) => self.submit(form),
                None => Command::None,
            },
        }
    }

    fn selection_line(&self) -> Line<'static> {
        let plan = self
            .page
            .plans()
            .get(self.plan_index())
            .map(|p| p.nombre.clone())
            .unwrap_or_else(|| "-".to_string());
        Line::from(vec![
            Span::styled("Plan: ", Style::default().fg(Color::Gray)),
            Span::styled(plan, Style::default().fg(Color::Cyan)),
            Span::styled(" [←→]   ", Style::default().fg(Color::Yellow)),
            Span::styled("Tipo de ingreso: ", Style::default().fg(Color::Gray)),
            Span::styled(self.page.channel().to_string(), Style::default().fg(Color::Cyan)),
            Span::styled(" [c]", Style::default().fg(Color::Yellow)),
        ])
    }
}

#[async_trait]
impl Screen for PricesScreen {
    fn title(&self) -> String {
        Route::Prices.title().to_string()
    }

    fn keys(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("← →", "Cambiar de plan"),
            ("c", "Cambiar tipo de ingreso"),
            ("↑↓ / j k", "Elegir banda"),
            ("/", "Buscar"),
            ("e / Enter", "Editar precio"),
            ("d", "Eliminar precio"),
            ("b", "Carga masiva"),
            ("i", "Aumento masivo"),
            ("r", "Recargar"),
            ("Esc", "Volver al inicio"),
        ]
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(5), Constraint::Length(1)])
            .split(area);

        frame.render_widget(Paragraph::new(self.selection_line()), chunks[0]);

        let columns = Columns {
            headers: &["Rango etario", "Precio", "Lista"],
            widths: &[
                Constraint::Percentage(40),
                Constraint::Percentage(30),
                Constraint::Percentage(30),
            ],
        };
        render_table(
            frame,
            chunks[1],
            "Precios",
            self.page.page().list(),
            &columns,
            self.filter.editing,
            |e: &PriceEntry| {
                vec![
                    e.rango_etario.replace("66-00", "66+"),
                    format!("$ {:.2}", e.precio),
                    e.lista_nombre.clone().unwrap_or_default(),
                ]
            },
        );
        frame.render_widget(
            Paragraph::new(hint_line(&[
                ("e", "Editar"),
                ("d", "Eliminar"),
                ("b", "Carga masiva"),
                ("i", "Aumento"),
            ])),
            chunks[2],
        );

        if let Some(form) = &self.form {
            form.dialog().render(frame);
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
            KeyCode::Left | KeyCode::Right => {
                let forward = key.code == KeyCode::Right;
                let next = cycle_index(self.plan_index(), self.page.plans().len(), forward);
                return self.select(next, self.page.channel());
            }
            KeyCode::Char('c') => {
                let next = PRICE_LIST_CHANNELS[cycle_index(
                    self.channel_index(),
                    PRICE_LIST_CHANNELS.len(),
                    true,
                )];
                return self.select(self.plan_index(), next);
            }
            KeyCode::Char('e') | KeyCode::Enter => self.open_edit_form(),
            KeyCode::Char('d') => {
                if let Some(id) = self.page.page().list().selected_key() {
                    self.page.request_delete(id);
                }
            }
            KeyCode::Char('b') => self.open_bulk_form(),
            KeyCode::Char('i') => self.open_increase_form(),
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
            Some(Job::Select(plan_id, channel)) => self.page.select(plan_id, channel).await,
            Some(Job::BulkLoad {
                plan_id,
                channel,
                inputs,
            }) => {
                let inputs: Vec<(&str, &str)> =
                    inputs.iter().map(|(band, raw)| (*band, raw.as_str())).collect();
                self.page.bulk_load(plan_id, channel, &inputs).await;
            }
            Some(Job::Increase(raw, scope)) => {
                self.page.bulk_increase(&raw, scope).await;
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
