//! Quote wizard screen: focus handling and key routing over [`QuoteWorkflow`]

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{layout::Rect, Frame};
use rust_decimal::{Decimal, RoundingStrategy};

use super::dialogs::{NoticeChoice, NoticeDialog};
use super::form_field::edit_text;
use super::screen::{Command, Screen};
use crate::nav::Route;
use crate::quoter::workflow::{LOADING_DOCUMENT, LOADING_FETCH, LOADING_VERIFY};
use crate::quoter::{ClientField, DiscountKind, Exit, QuoteWorkflow, SavedAction, WizardStep};
use crate::types::IncomeChannel;

pub mod steps;


/// Upper bound offered by the dependents selector
const MAX_DEPENDENTS: u32 = 10;

/// Focusable rows of the configure step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigItem {
    Plan,
    Channel,
    Contribution,
    Category,
    Dependents,
    Discount(DiscountKind),
    MemberRole(usize),
    MemberAge(usize),
}

/// Remote work announced by the last key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Job {
    Open,
    Search,
    Next,
    Generate,
    Saved(SavedAction),
}

pub struct QuoterScreen {
    workflow: QuoteWorkflow,
    focus: usize,
    saved_selected: usize,
    notice_dialog: NoticeDialog,
    job: Option<Job>,
}

impl QuoterScreen {
    pub fn new(workflow: QuoteWorkflow) -> Self {
        Self {
            workflow,
            focus: 0,
            saved_selected: 0,
            notice_dialog: NoticeDialog::new(),
            job: None,
        }
    }

    pub fn workflow(&self) -> &QuoteWorkflow {
        &self.workflow
    }

    pub(crate) fn focus(&self) -> usize {
        self.focus
    }

    pub(crate) fn saved_selected(&self) -> SavedAction {
        SavedAction::ALL[self.saved_selected.min(SavedAction::ALL.len() - 1)]
    }

    /// Client fields the operator can currently reach with Tab
    pub(crate) fn identify_items(&self) -> Vec<ClientField> {
        if self.workflow.is_search_mode() {
            vec![ClientField::Dni]
        } else {
            ClientField::ALL
                .into_iter()
                .filter(|f| self.workflow.is_field_enabled(*f))
                .collect()
        }
    }

    pub(crate) fn config_items(&self) -> Vec<ConfigItem> {
        let mut items = vec![ConfigItem::Plan, ConfigItem::Channel];
        match self.workflow.config().channel {
            Some(IncomeChannel::Obligatory) => items.push(ConfigItem::Contribution),
            Some(IncomeChannel::SelfEmployed) => {
                items.push(ConfigItem::Category);
                items.push(ConfigItem::Dependents);
            }
            _ => {}
        }
        items.extend(DiscountKind::ALL.map(ConfigItem::Discount));
        for index in 0..self.workflow.family().len() {
            if self.workflow.family().is_role_editable(index) {
                items.push(ConfigItem::MemberRole(index));
            }
            items.push(ConfigItem::MemberAge(index));
        }
        items
    }

    fn focus_count(&self) -> usize {
        match self.workflow.step() {
            WizardStep::Identify => self.identify_items().len(),
            WizardStep::Configure => self.config_items().len(),
            WizardStep::Summary => 0,
        }
    }

    fn clamp_focus(&mut self) {
        let count = self.focus_count();
        if self.focus >= count {
            self.focus = count.saturating_sub(1);
        }
    }

    fn move_focus(&mut self, forward: bool) {
        let count = self.focus_count();
        if count == 0 {
            return;
        }
        self.focus = if forward {
            (self.focus + 1) % count
        } else {
            self.focus.checked_sub(1).unwrap_or(count - 1)
        };
    }

    fn run(&mut self, job: Job, label: Option<&'static str>) -> Command {
        self.job = Some(job);
        label.map_or(Command::Work, Command::Busy)
    }

    /// Where leaving the wizard goes
    fn leave(&self) -> Command {
        if self.workflow.entry().from_list {
            Command::Navigate(Route::QuoteHistory)
        } else {
            Command::Navigate(Route::Dashboard)
        }
    }

    fn exit(exit: Option<Exit>) -> Command {
        match exit {
            Some(Exit::Login) => Command::Navigate(Route::Login),
            Some(Exit::QuoteHistory) => Command::Navigate(Route::QuoteHistory),
            None => Command::None,
        }
    }

    // ─── Key routing ────────────────────────────────────────────────────────

    fn handle_notice_key(&mut self, key: KeyCode) -> Command {
        let Some(notice) = self.workflow.notice().cloned() else {
            return Command::None;
        };
        match self.notice_dialog.handle_key(&notice, key) {
            Some(choice) => {
                let exit = self
                    .workflow
                    .acknowledge_notice(choice == NoticeChoice::Accept);
                self.clamp_focus();
                Self::exit(exit)
            }
            None => Command::None,
        }
    }

    fn handle_saved_key(&mut self, key: KeyCode) -> Command {
        let count = SavedAction::ALL.len();
        match key {
            KeyCode::Left | KeyCode::BackTab => {
                self.saved_selected = self.saved_selected.checked_sub(1).unwrap_or(count - 1);
            }
            KeyCode::Right | KeyCode::Tab => {
                self.saved_selected = (self.saved_selected + 1) % count;
            }
            KeyCode::Enter => {
                let action = self.saved_selected();
                let label = (action == SavedAction::DownloadDocument).then_some(LOADING_DOCUMENT);
                return self.run(Job::Saved(action), label);
            }
            _ => {}
        }
        Command::None
    }

    fn handle_identify_key(&mut self, key: KeyCode) -> Command {
        if key == KeyCode::Enter {
            return if self.workflow.is_search_mode() {
                self.run(Job::Search, Some(LOADING_VERIFY))
            } else {
                self.run(Job::Next, WizardStep::Identify.advance_label())
            };
        }
        let Some(field) = self.identify_items().get(self.focus).copied() else {
            return Command::None;
        };
        let current = self.workflow.client_field_value(field);
        if let Some(value) = edit_text(&current, key) {
            self.workflow.set_client_field(field, &value);
        }
        Command::None
    }

    fn handle_configure_key(&mut self, key: KeyCode) -> Command {
        match key {
            KeyCode::Enter => return self.run(Job::Next, WizardStep::Configure.advance_label()),
            KeyCode::Char('+') => {
                self.workflow.add_member();
                return Command::None;
            }
            _ => {}
        }
        let Some(item) = self.config_items().get(self.focus).copied() else {
            return Command::None;
        };
        match key {
            KeyCode::Left => self.cycle(item, false),
            KeyCode::Right | KeyCode::Char(' ') => self.cycle(item, true),
            KeyCode::Char('-') => {
                if let ConfigItem::MemberRole(index) | ConfigItem::MemberAge(index) = item {
                    self.workflow.remove_member(index);
                    self.clamp_focus();
                }
            }
            code => self.edit(item, code),
        }
        Command::None
    }

    fn edit(&mut self, item: ConfigItem, key: KeyCode) {
        match item {
            ConfigItem::Contribution => {
                let current = self
                    .workflow
                    .config()
                    .employer_contribution
                    .map(|d| d.to_string())
                    .unwrap_or_default();
                if let Some(value) = edit_text(&current, key) {
                    self.workflow.set_employer_contribution(&value);
                }
            }
            ConfigItem::MemberAge(index) => {
                let current = self
                    .workflow
                    .family()
                    .members()
                    .get(index)
                    .and_then(|m| m.age)
                    .map(|a| a.to_string())
                    .unwrap_or_default();
                if let Some(value) = edit_text(&current, key) {
                    self.workflow.set_member_age(index, &value);
                }
            }
            _ => {}
        }
    }

    /// Step a selector to its next or previous option
    fn cycle(&mut self, item: ConfigItem, forward: bool) {
        let wf = &mut self.workflow;
        match item {
            ConfigItem::Plan => {
                let options: Vec<Option<u64>> = std::iter::once(None)
                    .chain(wf.plans().iter().map(|p| Some(p.id)))
                    .collect();
                let next = step_option(&options, &wf.config().plan_id, forward);
                wf.set_plan(next);
            }
            ConfigItem::Channel => {
                let options: Vec<Option<IncomeChannel>> = std::iter::once(None)
                    .chain(IncomeChannel::ALL.into_iter().map(Some))
                    .collect();
                let next = step_option(&options, &wf.config().channel, forward);
                wf.set_channel(next);
                self.clamp_focus();
            }
            ConfigItem::Category => {
                let options: Vec<Option<String>> = std::iter::once(None)
                    .chain(wf.options().monotributo_categories.iter().cloned().map(Some))
                    .collect();
                let next = step_option(&options, &wf.config().monotributo_category, forward);
                wf.set_monotributo_category(next.as_deref());
            }
            ConfigItem::Dependents => {
                let current = wf.config().monotributo_dependents;
                let next = if forward {
                    (current + 1).min(MAX_DEPENDENTS)
                } else {
                    current.saturating_sub(1)
                };
                wf.set_monotributo_dependents(next);
            }
            ConfigItem::Discount(kind) => {
                let options = wf.discount_options(kind);
                let next = step_option(&options, &wf.discount(kind), forward);
                wf.set_discount(kind, next);
            }
            ConfigItem::MemberRole(index) => {
                let options: Vec<_> = wf.member_role_options(index).into_iter().map(Some).collect();
                let current = wf.family().members().get(index).and_then(|m| m.role);
                if let Some(role) = step_option(&options, &current, forward) {
                    wf.set_member_role(index, role);
                }
            }
            ConfigItem::MemberAge(_) | ConfigItem::Contribution => {}
        }
    }
}

/// The option after (or before) `current`, wrapping; the first option when
/// `current` is not in the list
fn step_option<T: Clone + PartialEq>(options: &[T], current: &T, forward: bool) -> T
where
    T: Default,
{
    if options.is_empty() {
        return T::default();
    }
    let next = match options.iter().position(|o| o == current) {
        Some(i) if forward => (i + 1) % options.len(),
        Some(i) => i.checked_sub(1).unwrap_or(options.len() - 1),
        None => 0,
    };
    options[next].clone()
}

#[async_trait]
impl Screen for QuoterScreen {
    fn title(&self) -> String {
        self.workflow.title()
    }

    fn keys(&self) -> &'static [(&'static str, &'static str)] {
        match self.workflow.step() {
            WizardStep::Identify => &[
                ("Tab / ↑↓", "Cambiar de campo"),
                ("Enter", "Buscar DNI / Siguiente"),
                ("Esc", "Salir del cotizador"),
            ],
            WizardStep::Configure => &[
                ("Tab / ↑↓", "Cambiar de campo"),
                ("← →", "Cambiar opción"),
                ("+", "Agregar integrante"),
                ("-", "Quitar integrante"),
                ("Enter", "Calcular"),
                ("Esc", "Volver"),
            ],
            WizardStep::Summary => &[
                ("Enter", "Generar cotización"),
                ("← →", "Elegir acción (cotización guardada)"),
                ("Esc", "Volver"),
            ],
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        self.render_wizard(frame, area);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Command {
        if self.workflow.notice().is_some() {
            return self.handle_notice_key(key.code);
        }
        if self.workflow.saved().is_some() {
            return self.handle_saved_key(key.code);
        }
        match key.code {
            KeyCode::Esc => {
                if self.workflow.step() == WizardStep::Identify {
                    return self.leave();
                }
                self.workflow.back();
                self.focus = 0;
                return Command::None;
            }
            KeyCode::Tab | KeyCode::Down => {
                self.move_focus(true);
                return Command::None;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.move_focus(false);
                return Command::None;
            }
            _ => {}
        }
        match self.workflow.step() {
            WizardStep::Identify => self.handle_identify_key(key.code),
            WizardStep::Configure => self.handle_configure_key(key.code),
            WizardStep::Summary if key.code == KeyCode::Enter => {
                self.run(Job::Generate, WizardStep::Summary.advance_label())
            }
            WizardStep::Summary => Command::None,
        }
    }

    async fn work(&mut self) -> Command {
        let Some(job) = self.job.take() else {
            return Command::None;
        };
        let step = self.workflow.step();
        let command = match job {
            Job::Open => {
                self.workflow.open().await;
                Command::None
            }
            Job::Search => {
                self.workflow.search_client().await;
                Command::None
            }
            Job::Next => {
                self.workflow.next().await;
                Command::None
            }
            Job::Generate => {
                self.workflow.generate().await;
                self.saved_selected = 0;
                Command::None
            }
            Job::Saved(action) => Self::exit(self.workflow.saved_action(action).await),
        };
        if self.workflow.step() != step {
            self.focus = 0;
        }
        self.clamp_focus();
        command
    }

    fn start(&mut self) -> Command {
        if self.workflow.entry().edit_id.is_some() {
            self.run(Job::Open, Some(LOADING_FETCH))
        } else {
            Command::None
        }
    }

    fn tick(&mut self) {
        self.workflow.poll_plans();
    }

    fn is_typing(&self) -> bool {
        self.workflow.step() == WizardStep::Identify && self.workflow.notice().is_none()
    }
}

/// Money as shown in the wizard
pub(crate) fn money(amount: Decimal) -> String {
    format!(
        "$ {:.2}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}
