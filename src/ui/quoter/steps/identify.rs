//! Client identification step

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::field_line;
use crate::quoter::{ClientResolution, QuoteWorkflow};
use crate::ui::quoter::QuoterScreen;

impl QuoterScreen {
    pub(crate) fn render_identify_step(&self, frame: &mut Frame, area: Rect) {
        let wf = self.workflow();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(9), Constraint::Length(3)])
            .split(area);

        let items = self.identify_items();
        let focused = items.get(self.focus()).copied();
        let mut lines = Vec::new();
        for field in crate::quoter::ClientField::ALL {
            let enabled = items.contains(&field);
            let mut value = wf.client_field_value(field);
            if Some(field) == focused {
                value.push('_');
            }
            lines.push(field_line(field.label(), value, Some(field) == focused, enabled));
        }

        let title = if wf.is_search_mode() {
            " Buscar cliente por DNI "
        } else {
            " Datos del cliente "
        };
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            ),
            chunks[0],
        );

        frame.render_widget(
            Paragraph::new(status_line(wf)).wrap(Wrap { trim: true }),
            chunks[1],
        );
    }
}

fn status_line(wf: &QuoteWorkflow) -> Line<'static> {
    let (text, color) = match wf.resolution() {
        _ if wf.is_edit_mode() => (
            "Editando una cotización guardada: datos de identidad bloqueados".to_string(),
            Color::Cyan,
        ),
        None => (
            "Ingrese el DNI y presione Enter para verificarlo".to_string(),
            Color::DarkGray,
        ),
        Some(ClientResolution::CreateAllowed { .. }) => {
            ("Cliente nuevo: complete sus datos".to_string(), Color::Green)
        }
        Some(ClientResolution::ReuseAllowed { .. }) => {
            ("Cliente existente: datos de identidad bloqueados".to_string(), Color::Green)
        }
        Some(ClientResolution::Blocked { message, .. }) => (message.clone(), Color::Red),
    };
    Line::from(Span::styled(text, Style::default().fg(color)))
}
