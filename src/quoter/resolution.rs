//! Turns an identifier lookup into exactly one of three wizard treatments.

use chrono::{DateTime, Utc};

use super::family::FamilyGroup;
use super::notice::{Notice, NoticeAction};
use crate::types::{format_date, ClientDraft, QuoteConfig, QuoteRecord, VerificationResponse};

/// Everything needed to re-quote from a stored quote in one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequoteSnapshot {
    pub source_id: Option<u64>,
    pub client: ClientDraft,
    pub config: QuoteConfig,
    pub family: FamilyGroup,
}

impl RequoteSnapshot {
    pub fn from_record(record: &QuoteRecord) -> Self {
        let family = FamilyGroup::from_payloads(&record.member_payloads());
        let mut client = ClientDraft::from_record(&record.cliente);
        client.age = family.holder_age();

        Self {
            source_id: record.id,
            client,
            config: QuoteConfig::from_record(record),
            family,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientResolution {
    /// Unknown client; a fresh draft carrying the searched identifier
    CreateAllowed { client: ClientDraft },
    /// Client previously quoted by this operator
    ReuseAllowed {
        client: ClientDraft,
        snapshot: Option<Box<RequoteSnapshot>>,
    },
    /// Client owned by another operator; no way forward with this identifier
    Blocked {
        advisor: Option<String>,
        quoted_on: Option<DateTime<Utc>>,
        message: String,
    },
}

impl ClientResolution {
    pub fn from_response(dni: &str, response: VerificationResponse) -> Self {
        let client = response
            .cliente
            .as_ref()
            .map(ClientDraft::from_record)
            .map(|mut c| {
                if c.dni.trim().is_empty() {
                    c.dni = dni.to_string();
                }
                c
            })
            .unwrap_or_else(|| ClientDraft::with_dni(dni));

        if !response.existe {
            return ClientResolution::CreateAllowed { client };
        }

        if response.cotizado_por_mi {
            let snapshot = response
                .requote_snapshot
                .as_ref()
                .map(|record| Box::new(RequoteSnapshot::from_record(record)));
            return ClientResolution::ReuseAllowed { client, snapshot };
        }

        let message = response
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| blocked_message(&response.asesor_cotizador, &response.fecha_cotizacion));

        ClientResolution::Blocked {
            advisor: response.asesor_cotizador,
            quoted_on: response.fecha_cotizacion,
            message,
        }
    }

    pub fn can_proceed(&self) -> bool {
        !matches!(self, ClientResolution::Blocked { .. })
    }

    pub fn is_existing(&self) -> bool {
        !matches!(self, ClientResolution::CreateAllowed { .. })
    }

    pub fn notice(&self) -> Notice {
        match self {
            ClientResolution::CreateAllowed { .. } => Notice::success("Cliente Nuevo", "Puede proceder.")
                .with_action(NoticeAction::Dismiss, "Continuar"),
            ClientResolution::ReuseAllowed { .. } => {
                Notice::info("Cliente Encontrado", "Se cargarán sus datos.")
                    .with_action(NoticeAction::LoadExistingClient, "Cargar")
            }
            ClientResolution::Blocked { message, .. } => {
                Notice::error("Cliente Ya Cotizado", message.clone())
            }
        }
    }
}

fn blocked_message(advisor: &Option<String>, quoted_on: &Option<DateTime<Utc>>) -> String {
    match (advisor, quoted_on) {
        (Some(a), Some(d)) => format!(
            "El cliente ya fue cotizado por {} el {}.",
            a,
            format_date(Some(d))
        ),
        (Some(a), None) => format!("El cliente ya fue cotizado por {}.", a),
        _ => "El cliente ya fue cotizado por otro asesor.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IncomeChannel, Relationship};
    use serde_json::json;

    fn response(value: serde_json::Value) -> VerificationResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_absent_client_is_create_allowed() {
        let res = ClientResolution::from_response("30123456", response(json!({ "existe": false })));
        assert_eq!(
            res,
            ClientResolution::CreateAllowed {
                client: ClientDraft::with_dni("30123456")
            }
        );
        assert!(res.can_proceed());
        assert!(!res.is_existing());
        assert_eq!(res.notice().title, "Cliente Nuevo");
    }

    #[test]
    fn test_mine_with_snapshot_rebuilds_all_steps() {
        let res = ClientResolution::from_response(
            "30123456",
            response(json!({
                "existe": true,
                "cotizado_por_mi": true,
                "cliente": { "dni": "30123456", "nombres": "Ana", "apellidos": "Pérez", "ciudad": "Rosario" },
                "datosParaRecotizar": {
                    "id": 12,
                    "cliente": {
                        "dni": "30123456", "nombres": "Ana", "apellidos": "Pérez",
                        "email": "ana@example.com", "telefono": "341", "direccion": "Rosario"
                    },
                    "miembros": [
                        { "parentesco": "Titular", "edad": 35 },
                        { "parentesco": "Cónyuge", "edad": 33 }
                    ],
                    "plan_id": 4,
                    "tipo_ingreso": "Monotributo",
                    "monotributo_categoria": "D",
                    "monotributo_adherentes": 1,
                    "descuento_afinidad_pct": "5.00"
                }
            })),
        );

        let ClientResolution::ReuseAllowed { snapshot, .. } = &res else {
            panic!("expected reuse, got {:?}", res);
        };
        let snapshot = snapshot.as_ref().unwrap();
        assert_eq!(snapshot.source_id, Some(12));
        assert_eq!(snapshot.client.email, "ana@example.com");
        assert_eq!(snapshot.client.locality, "Rosario");
        assert_eq!(snapshot.client.age, Some(35));
        assert_eq!(snapshot.config.plan_id, Some(4));
        assert_eq!(snapshot.config.channel, Some(IncomeChannel::SelfEmployed));
        assert_eq!(snapshot.config.monotributo_category.as_deref(), Some("D"));
        assert_eq!(snapshot.family.len(), 2);
        assert_eq!(snapshot.family.members()[1].role, Some(Relationship::Spouse));

        assert!(res.can_proceed());
        assert_eq!(res.notice().action, NoticeAction::LoadExistingClient);
    }

    #[test]
    fn test_other_operator_is_blocked() {
        let res = ClientResolution::from_response(
            "40999999",
            response(json!({
                "existe": true,
                "cotizado_por_mi": false,
                "asesor_cotizador": "Juan Díaz",
                "fecha_cotizacion": "2026-01-10"
            })),
        );

        assert!(!res.can_proceed());
        let notice = res.notice();
        assert_eq!(notice.title, "Cliente Ya Cotizado");
        assert_eq!(
            notice.message,
            "El cliente ya fue cotizado por Juan Díaz el 10/01/2026."
        );
    }

    #[test]
    fn test_blocked_prefers_server_message() {
        let res = ClientResolution::from_response(
            "40999999",
            response(json!({
                "existe": 1,
                "cotizado_por_mi": 0,
                "message": "Cliente asignado a otro asesor"
            })),
        );
        match res {
            ClientResolution::Blocked { message, .. } => {
                assert_eq!(message, "Cliente asignado a otro asesor")
            }
            other => panic!("expected blocked, got {:?}", other),
        }
    }
}
