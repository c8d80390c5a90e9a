use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::{button_line, centered_rect};
use crate::quoter::{Notice, NoticeAction, Severity};

/// How the operator answered a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeChoice {
    Accept,
    /// Only offered by notices that ask a question
    Decline,
}

#[derive(Debug, Default)]
pub struct NoticeDialog {
    decline_selected: bool,
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::Cyan,
        Severity::Success => Color::Green,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
    }
}

fn asks_question(notice: &Notice) -> bool {
    notice.action == NoticeAction::LoadExistingClient
}

impl NoticeDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_key(&mut self, notice: &Notice, key: KeyCode) -> Option<NoticeChoice> {
        let question = asks_question(notice);
        let choice = match key {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab if question => {
                self.decline_selected = !self.decline_selected;
                return None;
            }
            KeyCode::Enter if self.decline_selected => NoticeChoice::Decline,
            KeyCode::Enter | KeyCode::Char(' ') => NoticeChoice::Accept,
            KeyCode::Esc if question => NoticeChoice::Decline,
            KeyCode::Esc => NoticeChoice::Accept,
            _ => return None,
        };
        self.decline_selected = false;
        Some(choice)
    }

    pub fn render(&self, frame: &mut Frame, notice: &Notice) {
        let color = severity_color(notice.severity);
        let area = centered_rect(55, 30, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(Line::from(Span::styled(
                format!(" {} ", notice.title),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(2), Constraint::Length(2)])
            .margin(1)
            .split(inner);

        frame.render_widget(
            Paragraph::new(notice.message.clone()).wrap(Wrap { trim: true }),
            chunks[0],
        );

        let buttons = if asks_question(notice) {
            button_line(&[
                (notice.confirm_label.as_str(), color, !self.decline_selected),
                ("No", Color::Gray, self.decline_selected),
            ])
        } else {
            button_line(&[(notice.confirm_label.as_str(), color, true)])
        };
        frame.render_widget(Paragraph::new(buttons).alignment(Alignment::Center), chunks[1]);
    }
}
