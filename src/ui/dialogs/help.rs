use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::centered_rect;

/// Key reference for the current screen, toggled with `?`
pub struct HelpDialog {
    pub visible: bool,
}

impl HelpDialog {
    pub fn new() -> Self {
        Self { visible: false }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn render(&self, frame: &mut Frame, title: &str, keys: &[(&str, &str)]) {
        if !self.visible {
            return;
        }

        let area = centered_rect(60, 70, frame.area());
        frame.render_widget(Clear, area);

        let mut help_text = vec![
            Line::from(Span::styled(
                title.to_string(),
                Style::default()
                    .add_modifier(Modifier::BOLD)
                    .fg(Color::Cyan),
            )),
            Line::from(""),
        ];
        for (key, description) in keys.iter().chain(GLOBAL_KEYS) {
            help_text.push(Line::from(vec![
                Span::styled(format!("{:<14}", key), Style::default().fg(Color::Yellow)),
                Span::raw(description.to_string()),
            ]));
        }
        help_text.push(Line::from(""));
        help_text.push(Line::from(Span::styled(
            "Presione ? para cerrar",
            Style::default().fg(Color::DarkGray),
        )));

        let block = Block::default()
            .title(" Ayuda ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        frame.render_widget(Paragraph::new(help_text).block(block), area);
    }
}

const GLOBAL_KEYS: &[(&str, &str)] = &[
    ("?", "Mostrar u ocultar esta ayuda"),
    ("Ctrl+C", "Salir"),
];
