pub mod dialogs;
pub mod form_field;
pub mod login;
pub mod menu;
pub mod pages;
pub mod quoter;
pub mod screen;
pub mod table;
pub mod terminal_guard;

pub use dialogs::{ConfirmDialog, HelpDialog, NoticeDialog};
pub use screen::{Command, Screen};
