mod confirm;
mod form;
mod help;
mod notice;
mod quote_detail;

pub use confirm::{ConfirmChoice, ConfirmDialog};
pub use form::{FormDialog, FormOutcome};
pub use help::HelpDialog;
pub use notice::{NoticeChoice, NoticeDialog};
pub use quote_detail::{closes_detail, render_quote_detail};

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

/// Helper to create a centered rect
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Frame drawn while a request is outstanding; no input is read until it returns
pub fn render_loading(frame: &mut Frame, label: &str) {
    let area = centered_rect(30, 15, frame.area());
    frame.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let text = Paragraph::new(Line::from(Span::styled(
        label.to_string(),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(block);
    frame.render_widget(text, area);
}

/// Button row shared by the modal dialogs
pub(crate) fn button_line(buttons: &[(&str, Color, bool)]) -> Line<'static> {
    let mut spans = Vec::new();
    for (label, color, selected) in buttons {
        spans.push(Span::raw("   "));
        let style = if *selected {
            Style::default()
                .fg(Color::Black)
                .bg(*color)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(*color)
        };
        spans.push(Span::styled(format!(" {} ", label), style));
    }
    Line::from(spans)
}
