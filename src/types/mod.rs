//! Domain and wire types shared by the API clients, controllers and UI.
//!
//! Rust names are English; the backend's Spanish keys are kept at the serde
//! boundary.

pub mod client;
pub mod employee;
pub mod plan;
pub mod price;
pub mod quote;
pub mod verification;

pub use client::{ClientDraft, ClientPayload, ClientRecord};
pub use employee::{DisplayStatus, Employee, EmployeeState, Role};
pub use plan::{Plan, PlanDraft};
pub use price::{
    AgeBand, AgeBandGroup, BulkIncrease, IncreaseScope, NewPriceEntry, PriceEntry, AGE_BANDS,
};
pub use quote::{
    CalculatedQuote, FamilyMember, IncomeChannel, MemberPayload, PricedMember, QuoteConfig,
    QuoteFigures, QuoteListItem, QuotePayload, QuoteRecord, QuoteStatus, QuoteTerms, Relationship,
    StoredMember,
};
pub use verification::VerificationResponse;

use chrono::{DateTime, Utc};

/// Lenient deserializers for fields the backend sends in more than one shape.
pub(crate) mod wire {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlagRepr {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    /// MySQL tinyint flags arrive as `0`/`1`, newer endpoints send booleans.
    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match FlagRepr::deserialize(deserializer)? {
            FlagRepr::Bool(b) => b,
            FlagRepr::Int(i) => i != 0,
            FlagRepr::Text(s) => matches!(s.as_str(), "1" | "true"),
        })
    }

    pub fn default_true() -> bool {
        true
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextRepr {
        Text(String),
        Int(i64),
    }

    /// Identifiers such as the DNI are strings in some responses and numbers in others.
    pub fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match TextRepr::deserialize(deserializer)? {
            TextRepr::Text(s) => s,
            TextRepr::Int(i) => i.to_string(),
        })
    }

    pub fn opt_text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<TextRepr>::deserialize(deserializer)?
            .map(|repr| match repr {
                TextRepr::Text(s) => s,
                TextRepr::Int(i) => i.to_string(),
            })
            .unwrap_or_default())
    }

    /// Timestamps arrive as RFC 3339, as MySQL `DATETIME` text or as a bare
    /// date. Anything else is treated as absent.
    pub fn opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(text) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let text = text.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
            return Ok(Some(ts.with_timezone(&Utc)));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
            return Ok(Some(naive.and_utc()));
        }
        Ok(NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc()))
    }

}

/// Dates are shown day first, the way operators read them
pub fn format_date(date: Option<&DateTime<Utc>>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}
