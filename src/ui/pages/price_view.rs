//! Read-only price lookup screen

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{cycle_index, LOADING_LIST};
use crate::nav::Route;
use crate::pages::{PriceViewPage, PRICE_LIST_CHANNELS};
use crate::types::{AgeBand, AgeBandGroup, IncomeChannel};
use crate::ui::dialogs::NoticeDialog;
use crate::ui::screen::{Command, Screen};

enum Job {
    Load,
    Select(u64, IncomeChannel),
}

fn section_title(group: AgeBandGroup) -> &'static str {
    match group {
        AgeBandGroup::Holder => " Titular ",
        AgeBandGroup::Couple => " Matrimonio ",
        AgeBandGroup::Child => " Hijos ",
        AgeBandGroup::Dependent => " Familiar a cargo ",
    }
}

pub struct PriceViewScreen {
    page: PriceViewPage,
    notice: NoticeDialog,
    job: Option<Job>,
}

impl PriceViewScreen {
    pub fn new(page: PriceViewPage) -> Self {
        Self {
            page,
            notice: NoticeDialog::new(),
            job: None,
        }
    }

    fn plan_index(&self) -> Option<usize> {
        let id = self.page.selected_plan()?.id;
        self.page.plans().iter().position(|p| p.id == id)
    }

    fn select(&mut self, plan_index: usize, channel: IncomeChannel) -> Command {
        let Some(plan) = self.page.plans().get(plan_index) else {
            return Command::None;
        };
        self.job = Some(Job::Select(plan.id, channel));
        Command::Busy(LOADING_LIST)
    }
}

#[async_trait]
impl Screen for PriceViewScreen {
    fn title(&self) -> String {
        Route::PriceView.title().to_string()
    }

    fn keys(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("← →", "Elegir plan"),
            ("c", "Cambiar tipo de ingreso"),
            ("Esc", "Volver al inicio"),
        ]
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(5)])
            .split(area);

        let plan = self
            .page
            .selected_plan()
            .map(|p| p.nombre.clone())
            .unwrap_or_else(|| "Seleccione un plan".to_string());
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("Plan: ", Style::default().fg(Color::Gray)),
                Span::styled(plan, Style::default().fg(Color::Cyan)),
                Span::styled(" [←→]   ", Style::default().fg(Color::Yellow)),
                Span::styled("Tipo de ingreso: ", Style::default().fg(Color::Gray)),
                Span::styled(self.page.channel().to_string(), Style::default().fg(Color::Cyan)),
                Span::styled(" [c]", Style::default().fg(Color::Yellow)),
            ])),
            chunks[0],
        );

        let sections = self.page.sections();
        if sections.is_empty() {
            let message = if self.page.selected_plan().is_some() {
                "No hay precios cargados para esta selección."
            } else {
                "Elija un plan para ver sus precios."
            };
            frame.render_widget(
                Paragraph::new(Span::styled(message, Style::default().fg(Color::DarkGray)))
                    .block(Block::default().borders(Borders::ALL)),
                chunks[1],
            );
        } else {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(
                    sections
                        .iter()
                        .map(|_| Constraint::Ratio(1, sections.len() as u32))
                        .collect::<Vec<_>>(),
                )
                .split(chunks[1]);
            for ((group, entries), column) in sections.iter().zip(columns.iter()) {
                let lines: Vec<Line> = entries
                    .iter()
                    .map(|entry| {
                        let band = AgeBand::find(&entry.rango_etario)
                            .map(AgeBand::display_label)
                            .unwrap_or_else(|| entry.rango_etario.clone());
                        Line::from(vec![
                            Span::styled(format!("{:<18}", band), Style::default().fg(Color::Gray)),
                            Span::styled(
                                format!("$ {:.2}", entry.precio),
                                Style::default().add_modifier(Modifier::BOLD),
                            ),
                        ])
                    })
                    .collect();
                frame.render_widget(
                    Paragraph::new(lines).block(
                        Block::default()
                            .title(section_title(*group))
                            .borders(Borders::ALL)
                            .border_style(Style::default().fg(Color::Cyan)),
                    ),
                    *column,
                );
            }
        }

        if let Some(notice) = self.page.notice() {
            self.notice.render(frame, notice);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Command {
        if let Some(notice) = self.page.notice().cloned() {
            if self.notice.handle_key(&notice, key.code).is_some() && self.page.acknowledge_notice()
            {
                return Command::Navigate(Route::Login);
            }
            return Command::None;
        }
        let plans = self.page.plans().len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Command::Navigate(Route::Dashboard),
            KeyCode::Right | KeyCode::Char('l') => {
                let next = self.plan_index().map_or(0, |i| cycle_index(i, plans, true));
                self.select(next, self.page.channel())
            }
            KeyCode::Left | KeyCode::Char('h') => {
                let next = self
                    .plan_index()
                    .map_or(plans.saturating_sub(1), |i| cycle_index(i, plans, false));
                self.select(next, self.page.channel())
            }
            KeyCode::Char('c') => {
                let Some(index) = self.plan_index() else {
                    return Command::None;
                };
                let current = PRICE_LIST_CHANNELS
                    .iter()
                    .position(|c| *c == self.page.channel())
                    .unwrap_or(0);
                let next = PRICE_LIST_CHANNELS[cycle_index(current, PRICE_LIST_CHANNELS.len(), true)];
                self.select(index, next)
            }
            _ => Command::None,
        }
    }

    async fn work(&mut self) -> Command {
        match self.job.take() {
            Some(Job::Load) => self.page.load().await,
            Some(Job::Select(plan_id, channel)) => self.page.select(plan_id, channel).await,
            None => {}
        }
        Command::None
    }

    fn start(&mut self) -> Command {
        self.job = Some(Job::Load);
        Command::Busy(LOADING_LIST)
    }
}
