//! Dashboard: the role's main menu

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::screen::{Command, Screen};
use crate::nav::{menu_for, Route};
use crate::session::Session;

pub struct MenuScreen {
    session: Session,
    routes: Vec<Route>,
    selected: usize,
}

impl MenuScreen {
    pub fn new(session: Session) -> Self {
        let routes = session.role().map(menu_for).unwrap_or_default();
        Self {
            session,
            routes,
            selected: 0,
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

#[async_trait]
impl Screen for MenuScreen {
    fn title(&self) -> String {
        Route::Dashboard.title().to_string()
    }

    fn keys(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("↑↓ / j k", "Elegir opción"),
            ("Enter", "Abrir"),
            ("1-9", "Abrir opción por número"),
            ("l", "Cerrar sesión"),
            ("q / Esc", "Salir"),
        ]
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        let greeting = match self.session.identity() {
            Some(identity) => Line::from(vec![
                Span::raw("Bienvenido, "),
                Span::styled(
                    identity.display_name(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  (legajo {}, {})", identity.legajo, identity.rol),
                    Style::default().fg(Color::DarkGray),
                ),
            ]),
            None => Line::from("Sesión no iniciada"),
        };
        frame.render_widget(
            Paragraph::new(greeting).block(Block::default().borders(Borders::BOTTOM)),
            chunks[0],
        );

        let items: Vec<ListItem> = self
            .routes
            .iter()
            .enumerate()
            .map(|(i, route)| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("[{}] ", i + 1), Style::default().fg(Color::Yellow)),
                    Span::raw(route.title()),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .title(" Menú ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        if !self.routes.is_empty() {
            state.select(Some(self.selected));
        }
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Command {
        let count = self.routes.len();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') if count > 0 => {
                self.selected = (self.selected + 1) % count;
            }
            KeyCode::Up | KeyCode::Char('k') if count > 0 => {
                self.selected = self.selected.checked_sub(1).unwrap_or(count - 1);
            }
            KeyCode::Enter => {
                if let Some(route) = self.routes.get(self.selected) {
                    return Command::Navigate(*route);
                }
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                if let Some(route) = self.routes.get(index) {
                    return Command::Navigate(*route);
                }
            }
            KeyCode::Char('l') => return Command::Logout,
            KeyCode::Char('q') | KeyCode::Esc => return Command::Quit,
            _ => {}
        }
        Command::None
    }

    async fn work(&mut self) -> Command {
        Command::None
    }
}
