//! Form field widgets shared by the login screen, the wizard and the edit dialogs

use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// What a field holds and how keys edit it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-line text input; `cursor` counts characters, not bytes
    Text {
        value: String,
        cursor: usize,
        max_length: Option<usize>,
        masked: bool,
        digits_only: bool,
    },
    /// One of a fixed set of options, cycled with Left/Right
    Select { options: Vec<String>, selected: usize },
    Toggle { value: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: String,
    pub kind: FieldKind,
}

impl FormField {
    pub fn text(label: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: label.into(),
            kind: FieldKind::Text {
                cursor: value.chars().count(),
                value,
                max_length: None,
                masked: false,
                digits_only: false,
            },
        }
    }

    pub fn password(label: impl Into<String>) -> Self {
        let mut field = Self::text(label, "");
        if let FieldKind::Text { masked, .. } = &mut field.kind {
            *masked = true;
        }
        field
    }

    pub fn digits(label: impl Into<String>, value: impl Into<String>, max: usize) -> Self {
        let mut field = Self::text(label, value);
        if let FieldKind::Text {
            digits_only,
            max_length,
            ..
        } = &mut field.kind
        {
            *digits_only = true;
            *max_length = Some(max);
        }
        field
    }

    pub fn select(label: impl Into<String>, options: Vec<String>, selected: usize) -> Self {
        let selected = selected.min(options.len().saturating_sub(1));
        Self {
            label: label.into(),
            kind: FieldKind::Select { options, selected },
        }
    }

    pub fn toggle(label: impl Into<String>, value: bool) -> Self {
        Self {
            label: label.into(),
            kind: FieldKind::Toggle { value },
        }
    }

    /// Current value as text; toggles read "true"/"false"
    pub fn value(&self) -> String {
        match &self.kind {
            FieldKind::Text { value, .. } => value.clone(),
            FieldKind::Select { options, selected } => {
                options.get(*selected).cloned().unwrap_or_default()
            }
            FieldKind::Toggle { value } => value.to_string(),
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        match &self.kind {
            FieldKind::Select { selected, .. } => Some(*selected),
            _ => None,
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self.kind, FieldKind::Toggle { value: true })
    }

    /// Handle a key event, returns true if the key was consumed
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        match &mut self.kind {
            FieldKind::Text {
                value,
                cursor,
                max_length,
                digits_only,
                ..
            } => match key {
                KeyCode::Char(c) => {
                    let len = value.chars().count();
                    if (*digits_only && !c.is_ascii_digit())
                        || max_length.is_some_and(|max| len >= max)
                    {
                        return true;
                    }
                    let at = byte_offset(value, *cursor);
                    value.insert(at, c);
                    *cursor += 1;
                    true
                }
                KeyCode::Backspace => {
                    if *cursor > 0 {
                        *cursor -= 1;
                        let at = byte_offset(value, *cursor);
                        value.remove(at);
                    }
                    true
                }
                KeyCode::Delete => {
                    if *cursor < value.chars().count() {
                        let at = byte_offset(value, *cursor);
                        value.remove(at);
                    }
                    true
                }
                KeyCode::Left => {
                    *cursor = cursor.saturating_sub(1);
                    true
                }
                KeyCode::Right => {
                    *cursor = (*cursor + 1).min(value.chars().count());
                    true
                }
                KeyCode::Home => {
                    *cursor = 0;
                    true
                }
                KeyCode::End => {
                    *cursor = value.chars().count();
                    true
                }
                _ => false,
            },
            FieldKind::Select { options, selected } => {
                if options.is_empty() {
                    return false;
                }
                match key {
                    KeyCode::Right | KeyCode::Char(' ') => {
                        *selected = (*selected + 1) % options.len();
                        true
                    }
                    KeyCode::Left => {
                        *selected = selected.checked_sub(1).unwrap_or(options.len() - 1);
                        true
                    }
                    _ => false,
                }
            }
            FieldKind::Toggle { value } => match key {
                KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right => {
                    *value = !*value;
                    true
                }
                _ => false,
            },
        }
    }

    /// Render as a single `label: value` row
    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let label_style = if focused {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let mut spans = vec![Span::styled(format!("{}: ", self.label), label_style)];
        spans.extend(self.value_spans(focused));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn value_spans(&self, focused: bool) -> Vec<Span<'static>> {
        match &self.kind {
            FieldKind::Text {
                value,
                cursor,
                masked,
                ..
            } => {
                let shown: String = if *masked {
                    "•".repeat(value.chars().count())
                } else {
                    value.clone()
                };
                if !focused {
                    return vec![Span::styled(shown, Style::default().fg(Color::White))];
                }
                let before: String = shown.chars().take(*cursor).collect();
                let at: String = shown.chars().nth(*cursor).map_or(" ".to_string(), String::from);
                let after: String = shown.chars().skip(*cursor + 1).collect();
                vec![
                    Span::raw(before),
                    Span::styled(at, Style::default().add_modifier(Modifier::REVERSED)),
                    Span::raw(after),
                ]
            }
            FieldKind::Select { options, selected } => {
                let current = options.get(*selected).cloned().unwrap_or_default();
                if focused {
                    vec![
                        Span::styled("◀ ", Style::default().fg(Color::Yellow)),
                        Span::styled(current, Style::default().add_modifier(Modifier::BOLD)),
                        Span::styled(" ▶", Style::default().fg(Color::Yellow)),
                    ]
                } else {
                    vec![Span::raw(current)]
                }
            }
            FieldKind::Toggle { value } => {
                let mark = if *value { "[x]" } else { "[ ]" };
                vec![Span::styled(
                    mark,
                    Style::default().fg(if focused { Color::Yellow } else { Color::White }),
                )]
            }
        }
    }
}

fn byte_offset(value: &str, chars: usize) -> usize {
    value
        .char_indices()
        .nth(chars)
        .map_or(value.len(), |(i, _)| i)
}

/// Append-or-erase edit used where the value lives in a controller that
/// decides whether to accept it. `None` when the key is not an edit.
pub fn edit_text(current: &str, key: KeyCode) -> Option<String> {
    match key {
        KeyCode::Char(c) => {
            let mut next = current.to_string();
            next.push(c);
            Some(next)
        }
        KeyCode::Backspace => {
            let mut next = current.to_string();
            next.pop();
            Some(next)
        }
        _ => None,
    }
}
