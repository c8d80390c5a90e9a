//! Quote types: wizard configuration, wire payloads and server-computed figures.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::client::{ClientPayload, ClientRecord};
use super::wire;

/// How contributions are computed for the quote (`tipo_ingreso`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncomeChannel {
    /// Employer-withheld contribution
    #[serde(rename = "Obligatorio")]
    Obligatory,
    #[serde(rename = "Voluntario")]
    Voluntary,
    /// Monotributo (self-employed regime)
    #[serde(rename = "Monotributo")]
    SelfEmployed,
}

impl IncomeChannel {
    pub const ALL: [IncomeChannel; 3] = [
        IncomeChannel::Voluntary,
        IncomeChannel::Obligatory,
        IncomeChannel::SelfEmployed,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            IncomeChannel::Obligatory => "Obligatorio",
            IncomeChannel::Voluntary => "Voluntario",
            IncomeChannel::SelfEmployed => "Monotributo",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.wire_name().eq_ignore_ascii_case(value.trim()))
    }

    /// Price lists only exist for the two contribution regimes;
    /// self-employed quotes are priced on the obligatory list.
    pub fn price_list_channel(self) -> Self {
        match self {
            IncomeChannel::SelfEmployed => IncomeChannel::Obligatory,
            other => other,
        }
    }
}

impl fmt::Display for IncomeChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Role of a family group member (`parentesco`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    #[serde(rename = "Titular")]
    Holder,
    #[serde(rename = "Conyuge", alias = "Cónyuge")]
    Spouse,
    #[serde(rename = "Hijo")]
    Child,
}

impl Relationship {
    pub fn label(self) -> &'static str {
        match self {
            Relationship::Holder => "Titular",
            Relationship::Spouse => "Cónyuge",
            Relationship::Child => "Hijo",
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the family group as edited in the wizard.
/// Empty fields are `None` until the operator fills them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FamilyMember {
    pub role: Option<Relationship>,
    pub age: Option<u8>,
}

impl FamilyMember {
    pub fn holder(age: Option<u8>) -> Self {
        Self {
            role: Some(Relationship::Holder),
            age,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.role.is_some() && self.age.is_some()
    }

    pub fn to_payload(&self) -> Option<MemberPayload> {
        Some(MemberPayload {
            parentesco: self.role?,
            edad: self.age?,
        })
    }
}

/// Member as sent to calculate and as returned inside stored quotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPayload {
    pub parentesco: Relationship,
    pub edad: u8,
}

/// Member of a stored quote, with the value the server priced it at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StoredMember {
    pub parentesco: Relationship,
    pub edad: u8,
    #[serde(default)]
    pub valor_individual: Option<Decimal>,
}

impl StoredMember {
    pub fn payload(&self) -> MemberPayload {
        MemberPayload {
            parentesco: self.parentesco,
            edad: self.edad,
        }
    }
}

/// Plan, channel and discount selection for the quote being built
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteConfig {
    pub plan_id: Option<u64>,
    pub channel: Option<IncomeChannel>,
    /// `aporte_obra_social`, only meaningful for [`IncomeChannel::Obligatory`]
    pub employer_contribution: Option<Decimal>,
    /// Only meaningful for [`IncomeChannel::SelfEmployed`]; validated server-side
    pub monotributo_category: Option<String>,
    pub monotributo_dependents: u32,
    pub commercial_discount: Decimal,
    pub affinity_discount: Decimal,
    pub card_discount: Decimal,
}

impl QuoteConfig {
    pub fn from_record(record: &QuoteRecord) -> Self {
        Self {
            plan_id: record.plan_id,
            channel: record.tipo_ingreso,
            employer_contribution: record.aporte_obra_social,
            monotributo_category: record
                .monotributo_categoria
                .clone()
                .filter(|c| !c.trim().is_empty()),
            monotributo_dependents: record.monotributo_adherentes.unwrap_or(0),
            commercial_discount: whole_percent(record.descuento_comercial_pct),
            affinity_discount: whole_percent(record.descuento_afinidad_pct),
            card_discount: whole_percent(record.descuento_tarjeta_pct),
        }
    }

    /// Wire terms with every field of an inactive channel zeroed.
    /// `None` while plan or channel is still unselected.
    pub fn terms(&self, married: bool) -> Option<QuoteTerms> {
        let plan_id = self.plan_id?;
        let channel = self.channel?;
        let self_employed = channel == IncomeChannel::SelfEmployed;

        Some(QuoteTerms {
            plan_id,
            tipo_ingreso: channel,
            es_casado: married,
            aporte_obra_social: if channel == IncomeChannel::Obligatory {
                self.employer_contribution.unwrap_or(Decimal::ZERO)
            } else {
                Decimal::ZERO
            },
            monotributo_categoria: if self_employed {
                self.monotributo_category.clone()
            } else {
                None
            },
            monotributo_adherentes: if self_employed {
                self.monotributo_dependents
            } else {
                0
            },
            descuento_comercial_pct: self.commercial_discount,
            descuento_afinidad_pct: self.affinity_discount,
            descuento_tarjeta_pct: self.card_discount,
        })
    }
}

/// Stored percentages come back as `"10.00"`; the option tables hold whole numbers.
fn whole_percent(value: Option<Decimal>) -> Decimal {
    value.map(|v| v.trunc()).unwrap_or(Decimal::ZERO)
}

/// `cotizacionData` section of a calculate request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteTerms {
    pub plan_id: u64,
    pub tipo_ingreso: IncomeChannel,
    pub es_casado: bool,
    pub aporte_obra_social: Decimal,
    pub monotributo_categoria: Option<String>,
    pub monotributo_adherentes: u32,
    pub descuento_comercial_pct: Decimal,
    pub descuento_afinidad_pct: Decimal,
    pub descuento_tarjeta_pct: Decimal,
}

/// Body shared by calculate, create and update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotePayload {
    #[serde(rename = "clienteData")]
    pub client: ClientPayload,
    #[serde(rename = "cotizacionData")]
    pub terms: Map<String, Value>,
    #[serde(rename = "miembrosData")]
    pub members: Vec<Value>,
}

impl QuotePayload {
    /// Request for the pricing endpoint
    pub fn for_calculation(
        client: ClientPayload,
        terms: &QuoteTerms,
        members: &[MemberPayload],
    ) -> serde_json::Result<Self> {
        Ok(Self {
            client,
            terms: to_object(terms)?,
            members: members
                .iter()
                .map(serde_json::to_value)
                .collect::<serde_json::Result<_>>()?,
        })
    }

    /// Request for create/update: server figures override the operator's
    /// terms key by key, and members carry their computed prices.
    pub fn for_persistence(
        client: ClientPayload,
        terms: &QuoteTerms,
        calculated: &CalculatedQuote,
    ) -> serde_json::Result<Self> {
        let mut merged = to_object(terms)?;
        merged.extend(to_object(&calculated.figures)?);

        Ok(Self {
            client,
            terms: merged,
            members: calculated
                .members
                .iter()
                .map(serde_json::to_value)
                .collect::<serde_json::Result<_>>()?,
        })
    }
}

fn to_object<T: Serialize>(value: &T) -> serde_json::Result<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            Ok(map)
        }
    }
}

/// `cotizacionCalculada`: the backend's price breakdown. Never recomputed
/// locally; unknown keys are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteFigures {
    #[serde(rename = "valor_base_plan", default, skip_serializing_if = "Option::is_none")]
    pub base_plan_value: Option<Decimal>,
    #[serde(rename = "valor_descuento_comercial", default, skip_serializing_if = "Option::is_none")]
    pub commercial_discount_value: Option<Decimal>,
    #[serde(rename = "valor_descuento_afinidad", default, skip_serializing_if = "Option::is_none")]
    pub affinity_discount_value: Option<Decimal>,
    #[serde(rename = "valor_descuento_tarjeta", default, skip_serializing_if = "Option::is_none")]
    pub card_discount_value: Option<Decimal>,
    #[serde(rename = "valor_descuento_joven", default, skip_serializing_if = "Option::is_none")]
    pub youth_discount_value: Option<Decimal>,
    #[serde(rename = "descuento_joven_pct", default, skip_serializing_if = "Option::is_none")]
    pub youth_discount_pct: Option<Decimal>,
    #[serde(rename = "valor_aportes_estimados", default, skip_serializing_if = "Option::is_none")]
    pub estimated_contributions: Option<Decimal>,
    #[serde(rename = "valor_aporte_monotributo", default, skip_serializing_if = "Option::is_none")]
    pub monotributo_contribution: Option<Decimal>,
    #[serde(rename = "valor_iva", default, skip_serializing_if = "Option::is_none")]
    pub vat: Option<Decimal>,
    #[serde(rename = "valor_total")]
    pub total: Decimal,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Member line of `miembrosConPrecios`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedMember {
    #[serde(rename = "parentesco")]
    pub role: Relationship,
    #[serde(rename = "edad")]
    pub age: u8,
    #[serde(rename = "valor_individual", default, skip_serializing_if = "Option::is_none")]
    pub individual_value: Option<Decimal>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `POST /cotizaciones/calculate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedQuote {
    #[serde(rename = "cotizacionCalculada")]
    pub figures: QuoteFigures,
    #[serde(rename = "miembrosConPrecios", default)]
    pub members: Vec<PricedMember>,
}

/// Lifecycle of a persisted quote. `Voided` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteStatus {
    #[serde(rename = "cotizado")]
    Quoted,
    #[serde(rename = "aceptado")]
    Accepted,
    #[serde(rename = "cancelado", alias = "anulado")]
    Voided,
}

impl QuoteStatus {
    pub fn label(self) -> &'static str {
        match self {
            QuoteStatus::Quoted => "cotizado",
            QuoteStatus::Accepted => "aceptado",
            QuoteStatus::Voided => "cancelado",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == QuoteStatus::Voided
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A stored quote (`GET /cotizaciones/{id}`), also the shape of the
/// re-quote snapshot returned by the client lookup.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QuoteRecord {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub cliente: ClientRecord,
    #[serde(default)]
    pub miembros: Vec<StoredMember>,
    #[serde(default)]
    pub plan_id: Option<u64>,
    #[serde(default)]
    pub plan_nombre: Option<String>,
    #[serde(default)]
    pub tipo_ingreso: Option<IncomeChannel>,
    #[serde(default)]
    pub aporte_obra_social: Option<Decimal>,
    #[serde(default)]
    pub monotributo_categoria: Option<String>,
    #[serde(default)]
    pub monotributo_adherentes: Option<u32>,
    #[serde(default)]
    pub descuento_comercial_pct: Option<Decimal>,
    #[serde(default)]
    pub descuento_afinidad_pct: Option<Decimal>,
    #[serde(default)]
    pub descuento_tarjeta_pct: Option<Decimal>,
    #[serde(default)]
    pub estado: Option<QuoteStatus>,
    #[serde(default, deserialize_with = "wire::opt_timestamp")]
    pub fecha_creacion: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "wire::opt_timestamp")]
    pub fecha_vencimiento: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valor_base_plan: Option<Decimal>,
    #[serde(default)]
    pub valor_descuento_comercial: Option<Decimal>,
    #[serde(default)]
    pub valor_descuento_afinidad: Option<Decimal>,
    #[serde(default)]
    pub valor_descuento_tarjeta: Option<Decimal>,
    #[serde(default)]
    pub valor_aportes_estimados: Option<Decimal>,
    #[serde(default)]
    pub valor_aporte_monotributo: Option<Decimal>,
    #[serde(default)]
    pub valor_iva: Option<Decimal>,
    #[serde(default)]
    pub valor_total: Option<Decimal>,
}

impl QuoteRecord {
    pub fn holder_age(&self) -> Option<u8> {
        self.miembros
            .iter()
            .find(|m| m.parentesco == Relationship::Holder)
            .map(|m| m.edad)
    }

    pub fn member_payloads(&self) -> Vec<MemberPayload> {
        self.miembros.iter().map(StoredMember::payload).collect()
    }
}

/// Row of `GET /cotizaciones/asesor`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuoteListItem {
    pub id: u64,
    #[serde(default, deserialize_with = "wire::opt_timestamp")]
    pub fecha_creacion: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub cliente_nombre: String,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub cliente_apellido: String,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub cliente_dni: String,
    #[serde(default)]
    pub plan_nombre: Option<String>,
    #[serde(default)]
    pub valor_total: Option<Decimal>,
    pub estado: QuoteStatus,
}

impl QuoteListItem {
    pub fn created_on(&self) -> String {
        super::format_date(self.fecha_creacion.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn config(channel: IncomeChannel) -> QuoteConfig {
        QuoteConfig {
            plan_id: Some(3),
            channel: Some(channel),
            employer_contribution: Some(dec("15000")),
            monotributo_category: Some("C".to_string()),
            monotributo_dependents: 2,
            commercial_discount: dec("10"),
            affinity_discount: Decimal::ZERO,
            card_discount: dec("5"),
        }
    }

    #[test]
    fn test_terms_zero_fields_of_inactive_channels() {
        let voluntary = config(IncomeChannel::Voluntary).terms(false).unwrap();
        assert_eq!(voluntary.aporte_obra_social, Decimal::ZERO);
        assert_eq!(voluntary.monotributo_categoria, None);
        assert_eq!(voluntary.monotributo_adherentes, 0);

        let obligatory = config(IncomeChannel::Obligatory).terms(false).unwrap();
        assert_eq!(obligatory.aporte_obra_social, dec("15000"));
        assert_eq!(obligatory.monotributo_categoria, None);

        let self_employed = config(IncomeChannel::SelfEmployed).terms(true).unwrap();
        assert_eq!(self_employed.aporte_obra_social, Decimal::ZERO);
        assert_eq!(self_employed.monotributo_categoria.as_deref(), Some("C"));
        assert_eq!(self_employed.monotributo_adherentes, 2);
        assert!(self_employed.es_casado);
    }

    #[test]
    fn test_terms_require_plan_and_channel() {
        let mut cfg = config(IncomeChannel::Voluntary);
        cfg.plan_id = None;
        assert!(cfg.terms(false).is_none());

        let mut cfg = config(IncomeChannel::Voluntary);
        cfg.channel = None;
        assert!(cfg.terms(false).is_none());
    }

    #[test]
    fn test_income_channel_wire_names() {
        assert_eq!(
            serde_json::to_string(&IncomeChannel::SelfEmployed).unwrap(),
            "\"Monotributo\""
        );
        assert_eq!(
            IncomeChannel::from_wire("obligatorio"),
            Some(IncomeChannel::Obligatory)
        );
        assert_eq!(
            IncomeChannel::SelfEmployed.price_list_channel(),
            IncomeChannel::Obligatory
        );
        assert_eq!(
            IncomeChannel::Voluntary.price_list_channel(),
            IncomeChannel::Voluntary
        );
    }

    #[test]
    fn test_relationship_accepts_accented_spouse() {
        let role: Relationship = serde_json::from_str("\"Cónyuge\"").unwrap();
        assert_eq!(role, Relationship::Spouse);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"Conyuge\"");
    }

    #[test]
    fn test_persistence_payload_merges_server_figures() {
        let terms = config(IncomeChannel::Voluntary).terms(false).unwrap();
        let calculated: CalculatedQuote = serde_json::from_value(serde_json::json!({
            "cotizacionCalculada": {
                "valor_base_plan": 52000,
                "valor_iva": "5460.00",
                "valor_total": "55000.50",
                "descuento_comercial_pct": "10.00",
                "plan_nombre": "Plan 300"
            },
            "miembrosConPrecios": [
                { "parentesco": "Titular", "edad": 30, "valor_individual": 52000 }
            ]
        }))
        .unwrap();

        assert_eq!(calculated.figures.total, dec("55000.50"));
        assert_eq!(calculated.figures.vat, Some(dec("5460")));

        let client = crate::types::ClientDraft::with_dni("30123456").to_payload();
        let payload = QuotePayload::for_persistence(client, &terms, &calculated).unwrap();

        assert_eq!(payload.terms["plan_id"], 3);
        assert_eq!(payload.terms["plan_nombre"], "Plan 300");
        // Server value wins over the operator's
        assert_eq!(payload.terms["descuento_comercial_pct"], "10.00");
        assert!(payload.terms.contains_key("valor_total"));
        assert_eq!(payload.members.len(), 1);
        assert_eq!(payload.members[0]["parentesco"], "Titular");
        assert!(payload.members[0].get("valor_individual").is_some());
    }

    #[test]
    fn test_calculation_payload_shape() {
        let terms = config(IncomeChannel::Obligatory).terms(false).unwrap();
        let members = [MemberPayload {
            parentesco: Relationship::Holder,
            edad: 30,
        }];
        let client = crate::types::ClientDraft::with_dni("30123456").to_payload();
        let payload = QuotePayload::for_calculation(client, &terms, &members).unwrap();

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("clienteData").is_some());
        assert_eq!(json["cotizacionData"]["tipo_ingreso"], "Obligatorio");
        assert_eq!(json["miembrosData"][0]["edad"], 30);
    }

    #[test]
    fn test_config_from_record_truncates_percentages() {
        let record: QuoteRecord = serde_json::from_value(serde_json::json!({
            "id": 77,
            "cliente": { "dni": "30123456", "nombres": "Ana" },
            "miembros": [
                { "parentesco": "Titular", "edad": 41 },
                { "parentesco": "Hijo", "edad": 9 }
            ],
            "plan_id": 2,
            "tipo_ingreso": "Voluntario",
            "descuento_comercial_pct": "15.00",
            "descuento_tarjeta_pct": 5,
            "monotributo_categoria": "",
            "estado": "cotizado"
        }))
        .unwrap();

        let cfg = QuoteConfig::from_record(&record);
        assert_eq!(cfg.plan_id, Some(2));
        assert_eq!(cfg.channel, Some(IncomeChannel::Voluntary));
        assert_eq!(cfg.commercial_discount, dec("15"));
        assert_eq!(cfg.card_discount, dec("5"));
        assert_eq!(cfg.affinity_discount, Decimal::ZERO);
        assert_eq!(cfg.monotributo_category, None);
        assert_eq!(record.holder_age(), Some(41));
    }

    #[test]
    fn test_status_alias_and_terminal() {
        let status: QuoteStatus = serde_json::from_str("\"anulado\"").unwrap();
        assert_eq!(status, QuoteStatus::Voided);
        assert!(status.is_terminal());
        assert!(!QuoteStatus::Accepted.is_terminal());
    }

    #[test]
    fn test_list_item_created_on() {
        let item: QuoteListItem = serde_json::from_value(serde_json::json!({
            "id": 5,
            "fecha_creacion": "2026-02-11T13:45:00.000Z",
            "cliente_nombre": "Ana",
            "cliente_apellido": "Pérez",
            "cliente_dni": 30123456,
            "valor_total": "1000.00",
            "estado": "aceptado"
        }))
        .unwrap();
        assert_eq!(item.created_on(), "11/02/2026");
        assert_eq!(item.cliente_dni, "30123456");
    }
}
