use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::{button_line, centered_rect};
use crate::pages::Confirmation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmChoice {
    Confirm,
    Cancel,
}

/// Yes/no prompt in front of a destructive action. Cancel is preselected.
#[derive(Debug, Default)]
pub struct ConfirmDialog {
    confirm_selected: bool,
}

impl ConfirmDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.confirm_selected = false;
    }

    pub fn handle_key(&mut self, key: KeyCode) -> Option<ConfirmChoice> {
        match key {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
                self.confirm_selected = !self.confirm_selected;
                None
            }
            KeyCode::Char('y' | 's') => Some(self.finish(ConfirmChoice::Confirm)),
            KeyCode::Char('n') | KeyCode::Esc => Some(self.finish(ConfirmChoice::Cancel)),
            KeyCode::Enter => {
                let choice = if self.confirm_selected {
                    ConfirmChoice::Confirm
                } else {
                    ConfirmChoice::Cancel
                };
                Some(self.finish(choice))
            }
            _ => None,
        }
    }

    fn finish(&mut self, choice: ConfirmChoice) -> ConfirmChoice {
        self.reset();
        choice
    }

    pub fn render<A>(&self, frame: &mut Frame, confirmation: &Confirmation<A>) {
        let area = centered_rect(55, 30, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(format!(" {} ", confirmation.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(2), Constraint::Length(2)])
            .margin(1)
            .split(inner);

        let message = Paragraph::new(confirmation.message.clone())
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::White));
        frame.render_widget(message, chunks[0]);

        let buttons = button_line(&[
            (confirmation.confirm_label.as_str(), Color::Red, self.confirm_selected),
            ("Cancelar", Color::Gray, !self.confirm_selected),
        ]);
        frame.render_widget(Paragraph::new(buttons).alignment(Alignment::Center), chunks[1]);
    }
}
