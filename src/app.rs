//! The terminal application: one mounted screen, a header and footer, and
//! the loop that turns screen commands into navigation and remote work.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::api::{AdminApi, AuthApi, HttpClient, QuoteApi, RestAdminApi, RestAuthApi, RestQuoteApi};
use crate::config::Config;
use crate::nav::{self, Route};
use crate::pages::{
    EmployeesPage, LoginPage, PlansPage, PriceViewPage, PricesPage, QuoteHistoryPage,
};
use crate::quoter::QuoteWorkflow;
use crate::session::{LogoutReason, Session};
use crate::ui::dialogs::{render_loading, HelpDialog};
use crate::ui::login::LoginScreen;
use crate::ui::menu::MenuScreen;
use crate::ui::pages::{EmployeesScreen, PlansScreen, PriceViewScreen, PricesScreen, QuotesScreen};
use crate::ui::quoter::QuoterScreen;
use crate::ui::screen::{Command, Screen};
use crate::ui::terminal_guard::{install_panic_hook, TerminalGuard};

pub struct App {
    config: Config,
    session: Session,
    quote_api: Arc<dyn QuoteApi>,
    admin_api: Arc<dyn AdminApi>,
    auth_api: Arc<dyn AuthApi>,
    route: Route,
    screen: Box<dyn Screen>,
    help_dialog: HelpDialog,
    /// Start-up command of the first screen, run once the terminal is ours
    pending: Command,
    should_quit: bool,
}

impl App {
    /// Restore any remembered session and wire the REST clients
    pub fn new(config: Config) -> Result<Self> {
        let session = Session::restore(&config.session_file_path())?;
        let http = HttpClient::new(&config, session.clone())?;
        Ok(Self::with_apis(
            config,
            session,
            Arc::new(RestQuoteApi::new(http.clone())),
            Arc::new(RestAdminApi::new(http.clone())),
            Arc::new(RestAuthApi::new(http)),
        ))
    }

    pub fn with_apis(
        config: Config,
        session: Session,
        quote_api: Arc<dyn QuoteApi>,
        admin_api: Arc<dyn AdminApi>,
        auth_api: Arc<dyn AuthApi>,
    ) -> Self {
        let mut app = Self {
            config,
            session,
            quote_api,
            admin_api,
            auth_api,
            route: Route::Login,
            screen: Box::new(MenuScreen::new(Session::new(None))),
            help_dialog: HelpDialog::new(),
            pending: Command::None,
            should_quit: false,
        };
        app.pending = app.mount(Route::Dashboard);
        app
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub async fn run(&mut self) -> Result<()> {
        install_panic_hook();
        let (_guard, mut terminal) = TerminalGuard::enter()?;

        let tick_rate = Duration::from_millis(self.config.ui.refresh_rate_ms);
        let first = std::mem::replace(&mut self.pending, Command::None);
        self.dispatch(first, &mut terminal).await?;

        while !self.should_quit {
            terminal.draw(|f| self.render(f))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        let command = self.handle_key(key);
                        self.dispatch(command, &mut terminal).await?;
                    }
                }
            }

            self.screen.tick();
        }

        info!("Leaving the terminal UI");
        Ok(())
    }

    // ─── Input ──────────────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent) -> Command {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Command::Quit;
        }
        if self.help_dialog.visible {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.help_dialog.toggle();
            }
            return Command::None;
        }
        if key.code == KeyCode::Char('?') && !self.screen.is_typing() {
            self.help_dialog.toggle();
            return Command::None;
        }
        self.screen.handle_key(key)
    }

    /// Follow `command` until the screen has nothing more to do. `Busy`
    /// draws the loading frame first, so no key is read while the request
    /// is outstanding.
    pub async fn dispatch<B: Backend>(
        &mut self,
        mut command: Command,
        terminal: &mut Terminal<B>,
    ) -> Result<()> {
        loop {
            command = match command {
                Command::None => return Ok(()),
                Command::Busy(label) => {
                    terminal.draw(|f| {
                        self.render(f);
                        render_loading(f, label);
                    })?;
                    self.screen.work().await
                }
                Command::Work => self.screen.work().await,
                Command::Navigate(route) => self.mount(route),
                Command::Logout => {
                    self.session.logout(LogoutReason::UserRequested);
                    self.mount(Route::Login)
                }
                Command::Quit => {
                    self.should_quit = true;
                    return Ok(());
                }
            };
        }
    }

    // ─── Navigation ─────────────────────────────────────────────────────

    /// Replace the mounted screen with the one `route` resolves to, and
    /// return its start-up command
    fn mount(&mut self, route: Route) -> Command {
        let route = nav::guard(route, &self.session);
        if route != self.route {
            debug!(from = ?self.route, to = ?route, "Navigating");
        }
        self.route = route;
        self.help_dialog.visible = false;
        self.screen = self.build_screen(route);
        self.screen.start()
    }

    fn build_screen(&self, route: Route) -> Box<dyn Screen> {
        let session = self.session.clone();
        match route {
            Route::Login => Box::new(LoginScreen::new(LoginPage::new(
                Arc::clone(&self.auth_api),
                session,
            ))),
            Route::Dashboard => Box::new(MenuScreen::new(session)),
            Route::Quoter(entry) => Box::new(QuoterScreen::new(QuoteWorkflow::new(
                Arc::clone(&self.quote_api),
                session,
                &self.config,
                entry,
            ))),
            Route::QuoteHistory => Box::new(QuotesScreen::new(QuoteHistoryPage::new(
                Arc::clone(&self.quote_api),
                session,
                &self.config,
            ))),
            Route::Employees => Box::new(EmployeesScreen::new(EmployeesPage::new(
                Arc::clone(&self.admin_api),
                session,
                &self.config,
            ))),
            Route::Plans => Box::new(PlansScreen::new(PlansPage::new(
                Arc::clone(&self.admin_api),
                session,
                &self.config,
            ))),
            Route::Prices => Box::new(PricesScreen::new(PricesPage::new(
                Arc::clone(&self.admin_api),
                session,
                &self.config,
            ))),
            Route::PriceView => Box::new(PriceViewScreen::new(PriceViewPage::new(
                Arc::clone(&self.quote_api),
                Arc::clone(&self.admin_api),
                session,
            ))),
        }
    }

    // ─── Rendering ──────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(frame.area());

        let title = self.screen.title();
        let operator = self
            .session
            .identity()
            .map(|id| format!("{} ({}) ", id.display_name(), id.rol))
            .unwrap_or_default();
        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                " SIGEC ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(title.clone(), Style::default().add_modifier(Modifier::BOLD)),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title_bottom(Line::from(operator).right_aligned()),
        );
        frame.render_widget(header, chunks[0]);

        self.screen.render(frame, chunks[1]);

        let footer = Paragraph::new(Line::from(vec![
            Span::styled("[?]", Style::default().fg(Color::Yellow)),
            Span::styled(" Ayuda  ", Style::default().fg(Color::DarkGray)),
            Span::styled("[Ctrl+C]", Style::default().fg(Color::Yellow)),
            Span::styled(" Salir", Style::default().fg(Color::DarkGray)),
        ]));
        frame.render_widget(footer, chunks[2]);

        self.help_dialog.render(frame, &title, self.screen.keys());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{plan, signed_in_session, FakeAdminApi, FakeAuthApi, FakeQuoteApi};
    use crate::types::Role;
    use ratatui::backend::TestBackend;

    fn app(session: Session) -> App {
        App::with_apis(
            Config::default(),
            session,
            Arc::new(FakeQuoteApi::with_plans(vec![plan(1, "Plan 200")])),
            Arc::new(FakeAdminApi::default()),
            Arc::new(FakeAuthApi::accepting(1001, "secreta", Role::Advisor)),
        )
    }

    fn terminal() -> Terminal<TestBackend> {
        Terminal::new(TestBackend::new(100, 30)).unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_signed_out_starts_on_login() {
        let app = app(Session::new(None));
        assert_eq!(app.route(), Route::Login);
    }

    #[tokio::test]
    async fn test_signed_in_starts_on_dashboard() {
        let app = app(signed_in_session(Role::Supervisor));
        assert_eq!(app.route(), Route::Dashboard);
    }

    #[tokio::test]
    async fn test_navigation_goes_through_role_guard() {
        let mut app = app(signed_in_session(Role::Advisor));
        let mut terminal = terminal();

        app.dispatch(Command::Navigate(Route::Employees), &mut terminal)
            .await
            .unwrap();
        assert_eq!(app.route(), Route::Dashboard);

        app.dispatch(Command::Navigate(Route::QuoteHistory), &mut terminal)
            .await
            .unwrap();
        assert_eq!(app.route(), Route::QuoteHistory);
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_shows_login() {
        let session = signed_in_session(Role::Administrator);
        let mut app = app(session.clone());
        let mut terminal = terminal();

        app.dispatch(Command::Logout, &mut terminal).await.unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(app.route(), Route::Login);
    }

    #[tokio::test]
    async fn test_help_toggle_swallows_keys() {
        let mut app = app(signed_in_session(Role::Advisor));

        assert_eq!(app.handle_key(key(KeyCode::Char('?'))), Command::None);
        assert!(app.help_dialog.visible);
        // Esc closes the overlay instead of reaching the menu
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Command::None);
        assert!(!app.help_dialog.visible);
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Command::Quit);
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_anywhere() {
        let mut app = app(Session::new(None));
        let mut terminal = terminal();
        let command = app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        app.dispatch(command, &mut terminal).await.unwrap();
        assert!(app.should_quit());
    }

    #[tokio::test]
    async fn test_menu_entry_opens_and_renders() {
        let mut app = app(signed_in_session(Role::Advisor));
        let mut terminal = terminal();

        let command = app.handle_key(key(KeyCode::Char('2')));
        app.dispatch(command, &mut terminal).await.unwrap();
        assert_eq!(app.route(), Route::QuoteHistory);
        terminal.draw(|f| app.render(f)).unwrap();
    }
}
