//! Quote wizard: identify the client, configure plan and family group,
//! review the server's figures and persist.

pub mod family;
pub mod notice;
pub mod resolution;
pub mod validation;
pub mod workflow;

pub use family::FamilyGroup;
pub use notice::{Notice, NoticeAction, Severity};
pub use resolution::{ClientResolution, RequoteSnapshot};
pub use validation::ValidationError;
pub use workflow::{
    ClientField, DiscountKind, QuoteWorkflow, SavedAction, SavedQuote, WizardStep,
};


/// How the wizard was opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoterEntry {
    /// Stored quote to preload for editing
    pub edit_id: Option<u64>,
    /// Opened from the quote history; finishing returns there
    pub from_list: bool,
}

impl QuoterEntry {
    pub fn edit(id: u64) -> Self {
        Self {
            edit_id: Some(id),
            from_list: true,
        }
    }
}

/// Where the wizard hands control back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Login,
    QuoteHistory,
}

/// File name used when saving a quote document
pub fn document_file_name(id: u64) -> String {
    format!("Cotizacion_{}.pdf", id)
}
