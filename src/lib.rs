//! SIGEC - terminal client for the health-plan quoting backend
//!
//! The library holds the controllers (quote wizard, management pages,
//! session) and the REST adapters; `main.rs` adds the CLI and the TUI entry.

pub mod api;
pub mod app;
pub mod config;
pub mod logging;
pub mod nav;
pub mod pages;
pub mod quoter;
pub mod session;
pub mod types;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;
