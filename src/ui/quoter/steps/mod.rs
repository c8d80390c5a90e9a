//! Render methods for each wizard step

mod configure;
mod identify;
mod saved;
mod summary;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::QuoterScreen;
use crate::quoter::WizardStep;

/// Style for a label/value row, highlighted when focused
pub(crate) fn field_line(label: &str, value: String, focused: bool, enabled: bool) -> Line<'static> {
    let marker = if focused { "> " } else { "  " };
    let value_style = if !enabled {
        Style::default().fg(Color::DarkGray)
    } else if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Yellow)),
        Span::styled(format!("{:<22}", label), Style::default().fg(Color::Gray)),
        Span::styled(value, value_style),
    ])
}

impl QuoterScreen {
    pub(crate) fn render_wizard(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(5)])
            .split(area);

        frame.render_widget(self.step_indicator(), chunks[0]);

        match self.workflow.step() {
            WizardStep::Identify => self.render_identify_step(frame, chunks[1]),
            WizardStep::Configure => self.render_configure_step(frame, chunks[1]),
            WizardStep::Summary => self.render_summary_step(frame, chunks[1]),
        }

        if self.workflow.saved().is_some() {
            self.render_saved_overlay(frame);
        }
        if let Some(notice) = self.workflow.notice() {
            self.notice_dialog.render(frame, notice);
        }
    }

    fn step_indicator(&self) -> Paragraph<'static> {
        let current = self.workflow.step();
        let mut spans = Vec::new();
        for step in WizardStep::ALL {
            if step.index() > 0 {
                spans.push(Span::styled("  ›  ", Style::default().fg(Color::DarkGray)));
            }
            let style = if step == current {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if step < current {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(
                format!(" {}. {} ", step.index() + 1, step.title()),
                style,
            ));
        }
        Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
    }
}
