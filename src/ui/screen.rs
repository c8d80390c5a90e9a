//! The contract between the app loop and each screen

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{layout::Rect, Frame};

use crate::nav::Route;
use crate::pages::{ListController, ListRow};

/// What the app loop should do after a screen handled input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    None,
    /// Draw the loading frame with this label, then run [`Screen::work`]
    Busy(&'static str),
    /// Run [`Screen::work`] straight away; nothing remote is involved
    Work,
    Navigate(Route),
    Logout,
    Quit,
}

#[async_trait]
pub trait Screen: Send {
    fn title(&self) -> String;

    /// Key reference shown by the help overlay
    fn keys(&self) -> &'static [(&'static str, &'static str)];

    fn render(&self, frame: &mut Frame, area: Rect);

    fn handle_key(&mut self, key: KeyEvent) -> Command;

    /// Run the request the last `Busy` announced
    async fn work(&mut self) -> Command;

    /// Called once after the screen is mounted
    fn start(&mut self) -> Command {
        Command::None
    }

    /// Called every loop iteration to pick up background results
    fn tick(&mut self) {}

    /// True while the screen is capturing text, so global shortcuts stay off
    fn is_typing(&self) -> bool {
        false
    }
}

/// `/` starts typing a filter; Enter keeps it, Esc clears it
#[derive(Debug, Default)]
pub struct FilterInput {
    pub editing: bool,
}

impl FilterInput {
    /// Returns true when the key was consumed by the filter
    pub fn handle_key<T: ListRow>(&mut self, list: &mut ListController<T>, key: KeyCode) -> bool {
        if !self.editing {
            if key == KeyCode::Char('/') {
                self.editing = true;
                return true;
            }
            return false;
        }
        match key {
            KeyCode::Enter => self.editing = false,
            KeyCode::Esc => {
                self.editing = false;
                list.set_filter("");
            }
            KeyCode::Backspace => {
                let mut filter = list.filter().to_string();
                filter.pop();
                list.set_filter(filter);
            }
            KeyCode::Char(c) => {
                let mut filter = list.filter().to_string();
                filter.push(c);
                list.set_filter(filter);
            }
            _ => {}
        }
        true
    }
}

/// Row selection and paging keys shared by every table
pub fn navigate_list<T: ListRow>(list: &mut ListController<T>, key: KeyCode) -> bool {
    match key {
        KeyCode::Down | KeyCode::Char('j') => list.select_next(),
        KeyCode::Up | KeyCode::Char('k') => list.select_prev(),
        KeyCode::Char('n') | KeyCode::PageDown => list.next_page(),
        KeyCode::Char('p') | KeyCode::PageUp => list.prev_page(),
        _ => return false,
    }
    true
}
