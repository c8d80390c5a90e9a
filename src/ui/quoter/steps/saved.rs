//! Overlay shown once the quote is persisted

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::quoter::SavedAction;
use crate::ui::dialogs::{button_line, centered_rect};
use crate::ui::quoter::QuoterScreen;

impl QuoterScreen {
    pub(crate) fn render_saved_overlay(&self, frame: &mut Frame) {
        let Some(saved) = self.workflow().saved() else {
            return;
        };
        let area = centered_rect(60, 30, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(Line::from(Span::styled(
                format!(" Cotización #{} ", saved.id),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([Constraint::Min(2), Constraint::Length(1)])
            .split(inner);

        frame.render_widget(
            Paragraph::new(saved.message.clone())
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            chunks[0],
        );

        let selected = self.saved_selected();
        let buttons: Vec<(&str, Color, bool)> = SavedAction::ALL
            .iter()
            .map(|action| (action.label(), Color::Green, *action == selected))
            .collect();
        frame.render_widget(
            Paragraph::new(button_line(&buttons)).alignment(Alignment::Center),
            chunks[1],
        );
    }
}
