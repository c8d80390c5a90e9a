use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::centered_rect;
use crate::ui::form_field::FormField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    Editing,
    Submitted,
    Cancelled,
}

/// Modal form: a column of fields, Tab/arrows move focus, Enter submits
#[derive(Debug, Clone)]
pub struct FormDialog {
    pub title: String,
    pub fields: Vec<FormField>,
    focus: usize,
}

impl FormDialog {
    pub fn new(title: impl Into<String>, fields: Vec<FormField>) -> Self {
        Self {
            title: title.into(),
            fields,
            focus: 0,
        }
    }

    pub fn value(&self, index: usize) -> String {
        self.fields.get(index).map(FormField::value).unwrap_or_default()
    }

    pub fn field(&self, index: usize) -> Option<&FormField> {
        self.fields.get(index)
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormOutcome {
        match key.code {
            KeyCode::Esc => return FormOutcome::Cancelled,
            KeyCode::Enter => return FormOutcome::Submitted,
            KeyCode::Tab | KeyCode::Down => {
                if !self.fields.is_empty() {
                    self.focus = (self.focus + 1) % self.fields.len();
                }
            }
            KeyCode::BackTab | KeyCode::Up => {
                if !self.fields.is_empty() {
                    self.focus = self.focus.checked_sub(1).unwrap_or(self.fields.len() - 1);
                }
            }
            code => {
                if let Some(field) = self.fields.get_mut(self.focus) {
                    field.handle_key(code);
                }
            }
        }
        FormOutcome::Editing
    }

    pub fn render(&self, frame: &mut Frame) {
        let height = (self.fields.len() as u16 + 6).max(8);
        let outer = centered_rect(60, 80, frame.area());
        let area = ratatui::layout::Rect {
            height: height.min(outer.height),
            ..outer
        };
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut constraints: Vec<Constraint> =
            self.fields.iter().map(|_| Constraint::Length(1)).collect();
        constraints.push(Constraint::Min(0));
        constraints.push(Constraint::Length(1));
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .margin(1)
            .split(inner);

        for (i, field) in self.fields.iter().enumerate() {
            field.render(frame, rows[i], i == self.focus);
        }

        let hint = Line::from(vec![
            Span::styled("[Tab]", Style::default().fg(Color::Yellow)),
            Span::styled(" campo  ", Style::default().fg(Color::DarkGray)),
            Span::styled("[Enter]", Style::default().fg(Color::Yellow)),
            Span::styled(" guardar  ", Style::default().fg(Color::DarkGray)),
            Span::styled("[Esc]", Style::default().fg(Color::Yellow)),
            Span::styled(" cancelar", Style::default().fg(Color::DarkGray)),
        ]);
        frame.render_widget(Paragraph::new(hint), rows[rows.len() - 1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_keys_go_to_focused_field() {
        let mut form = FormDialog::new(
            "Nuevo Plan",
            vec![FormField::text("Nombre", ""), FormField::text("Descripción", "")],
        );
        form.handle_key(key(KeyCode::Char('A')));
        form.handle_key(key(KeyCode::Tab));
        form.handle_key(key(KeyCode::Char('B')));

        assert_eq!(form.value(0), "A");
        assert_eq!(form.value(1), "B");
        assert_eq!(form.handle_key(key(KeyCode::Enter)), FormOutcome::Submitted);
    }

    #[test]
    fn test_focus_wraps_backwards() {
        let mut form = FormDialog::new("x", vec![FormField::text("a", ""), FormField::text("b", "")]);
        form.handle_key(key(KeyCode::BackTab));
        assert_eq!(form.focus(), 1);
        assert_eq!(form.handle_key(key(KeyCode::Esc)), FormOutcome::Cancelled);
    }
}
