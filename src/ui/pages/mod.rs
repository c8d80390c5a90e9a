//! Screens over the page controllers: employees, plans, price lists, quote
//! history and the read-only price view

mod employees;
mod plans;
mod price_view;
mod prices;
mod quotes;

pub use employees::EmployeesScreen;
pub use plans::PlansScreen;
pub use price_view::PriceViewScreen;
pub use prices::PricesScreen;
pub use quotes::QuotesScreen;

use crossterm::event::KeyCode;
use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

use super::dialogs::NoticeDialog;
use super::screen::Command;
use crate::nav::Route;
use crate::pages::{ListPage, ListRow};

pub(crate) const LOADING_LIST: &str = "Cargando...";

/// Route a key to the page's notice while one is showing. `None` means no
/// notice was up and the key is still unhandled.
pub(crate) fn notice_key<T: ListRow>(
    page: &mut ListPage<T>,
    dialog: &mut NoticeDialog,
    key: KeyCode,
) -> Option<Command> {
    let notice = page.notice()?.clone();
    if dialog.handle_key(&notice, key).is_some() && page.acknowledge_notice() {
        return Some(Command::Navigate(Route::Login));
    }
    Some(Command::None)
}

/// Key hints under a table
pub(crate) fn hint_line(hints: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::new();
    for (key, text) in hints {
        spans.push(Span::styled(
            format!("[{}]", key),
            Style::default().fg(Color::Yellow),
        ));
        spans.push(Span::styled(
            format!(" {}  ", text),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

/// Option index after `current`, wrapping
pub(crate) fn cycle_index(current: usize, len: usize, forward: bool) -> usize {
    if len == 0 {
        return 0;
    }
    if forward {
        (current + 1) % len
    } else {
        current.checked_sub(1).unwrap_or(len - 1)
    }
}
