use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::client::ClientRecord;
use super::quote::QuoteRecord;
use super::wire;

/// Response of `GET /cotizaciones/verify-dni/{dni}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VerificationResponse {
    #[serde(deserialize_with = "wire::flag")]
    pub existe: bool,
    /// Whether the calling operator owns the client's latest quote
    #[serde(default, deserialize_with = "wire::flag")]
    pub cotizado_por_mi: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub cliente: Option<ClientRecord>,
    /// Full snapshot of the operator's previous quote for this client
    #[serde(rename = "datosParaRecotizar", default)]
    pub requote_snapshot: Option<QuoteRecord>,
    #[serde(default)]
    pub asesor_cotizador: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_timestamp")]
    pub fecha_cotizacion: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_response() {
        let resp: VerificationResponse = serde_json::from_str(
            r#"{
                "existe": true,
                "cotizado_por_mi": false,
                "message": "El cliente ya fue cotizado por Juan Díaz el 2026-01-10",
                "asesor_cotizador": "Juan Díaz",
                "fecha_cotizacion": "2026-01-10"
            }"#,
        )
        .unwrap();

        assert!(resp.existe);
        assert!(!resp.cotizado_por_mi);
        assert_eq!(resp.asesor_cotizador.as_deref(), Some("Juan Díaz"));
        assert_eq!(
            resp.fecha_cotizacion.map(|d| d.date_naive().to_string()),
            Some("2026-01-10".to_string())
        );
        assert!(resp.requote_snapshot.is_none());
    }

    #[test]
    fn test_absent_response_with_numeric_flags() {
        let resp: VerificationResponse =
            serde_json::from_str(r#"{"existe":0,"cotizado_por_mi":0}"#).unwrap();
        assert!(!resp.existe);
        assert!(resp.cliente.is_none());
    }
}
