//! Sign-in screen

use async_trait::async_trait;
use crossterm::event::KeyEvent;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::dialogs::{centered_rect, FormDialog, FormOutcome, NoticeDialog};
use super::form_field::FormField;
use super::screen::{Command, Screen};
use crate::nav::Route;
use crate::pages::LoginPage;

const LEGAJO: usize = 0;
const PASSWORD: usize = 1;
const REMEMBER: usize = 2;

pub struct LoginScreen {
    page: LoginPage,
    form: FormDialog,
    notice_dialog: NoticeDialog,
}

impl LoginScreen {
    pub fn new(page: LoginPage) -> Self {
        let form = FormDialog::new(
            "Iniciar Sesión",
            vec![
                FormField::digits("Legajo", page.legajo.clone(), 10),
                FormField::password("Contraseña"),
                FormField::toggle("Recordarme", page.remember),
            ],
        );
        Self {
            page,
            form,
            notice_dialog: NoticeDialog::new(),
        }
    }
}

#[async_trait]
impl Screen for LoginScreen {
    fn title(&self) -> String {
        Route::Login.title().to_string()
    }

    fn keys(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("Tab / ↑↓", "Cambiar de campo"),
            ("Espacio", "Marcar Recordarme"),
            ("Enter", "Ingresar"),
            ("Esc", "Salir"),
        ]
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let banner_area = centered_rect(60, 30, area);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(banner_area);
        let banner = Paragraph::new(vec![
            Line::from(Span::styled(
                "SIGEC",
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Sistema de Gestión de Cotizaciones",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::NONE));
        frame.render_widget(banner, chunks[0]);

        self.form.render(frame);
        if let Some(notice) = self.page.notice() {
            self.notice_dialog.render(frame, notice);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Command {
        if let Some(notice) = self.page.notice().cloned() {
            if self.notice_dialog.handle_key(&notice, key.code).is_some() {
                self.page.acknowledge_notice();
            }
            return Command::None;
        }
        match self.form.handle_key(key) {
            FormOutcome::Editing => Command::None,
            FormOutcome::Cancelled => Command::Quit,
            FormOutcome::Submitted => Command::Busy("Ingresando..."),
        }
    }

    async fn work(&mut self) -> Command {
        self.page.set_legajo(&self.form.value(LEGAJO));
        self.page.password = self.form.value(PASSWORD);
        self.page.remember = self.form.field(REMEMBER).is_some_and(FormField::is_on);
        if self.page.submit().await {
            Command::Navigate(Route::Dashboard)
        } else {
            Command::None
        }
    }

    fn is_typing(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::testing::FakeAuthApi;
    use crate::types::Role;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::sync::Arc;

    fn press(screen: &mut LoginScreen, code: KeyCode) -> Command {
        screen.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(screen: &mut LoginScreen, text: &str) {
        for c in text.chars() {
            press(screen, KeyCode::Char(c));
        }
    }

    #[tokio::test]
    async fn test_enter_submits_and_navigates_home() {
        let api = Arc::new(FakeAuthApi::accepting(1500, "secreto", Role::Supervisor));
        let session = Session::new(None);
        let mut screen = LoginScreen::new(LoginPage::new(api, session.clone()));

        type_text(&mut screen, "1500");
        press(&mut screen, KeyCode::Tab);
        type_text(&mut screen, "secreto");
        assert_eq!(press(&mut screen, KeyCode::Enter), Command::Busy("Ingresando..."));

        assert_eq!(screen.work().await, Command::Navigate(Route::Dashboard));
        assert_eq!(session.role(), Some(Role::Supervisor));
    }

    #[tokio::test]
    async fn test_failure_shows_notice_until_acknowledged() {
        let api = Arc::new(FakeAuthApi::accepting(1500, "secreto", Role::Advisor));
        let mut screen = LoginScreen::new(LoginPage::new(api, Session::new(None)));

        type_text(&mut screen, "1500");
        press(&mut screen, KeyCode::Enter);
        assert_eq!(screen.work().await, Command::None);
        assert!(screen.page.notice().is_some());

        // Enter dismisses the notice instead of submitting again
        assert_eq!(press(&mut screen, KeyCode::Enter), Command::None);
        assert!(screen.page.notice().is_none());
    }
}
