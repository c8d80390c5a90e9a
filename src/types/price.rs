//! Age-banded price lists

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::str::FromStr;

use super::quote::IncomeChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBandGroup {
    /// Single holder
    Holder,
    /// Holder with spouse (`MAT` bands)
    Couple,
    Child,
    /// `FAMILIAR A CARGO`
    Dependent,
}

/// One row of the price grid. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeBand {
    pub label: &'static str,
    pub min: u8,
    pub max: u8,
    pub group: AgeBandGroup,
}

const fn band(label: &'static str, min: u8, max: u8, group: AgeBandGroup) -> AgeBand {
    AgeBand {
        label,
        min,
        max,
        group,
    }
}

/// Every band the backend knows, in grid order. The open-ended top band is
/// spelled `66-00` and covers up to 99.
pub const AGE_BANDS: [AgeBand; 20] = [
    band("0-25", 0, 25, AgeBandGroup::Holder),
    band("26-35", 26, 35, AgeBandGroup::Holder),
    band("36-40", 36, 40, AgeBandGroup::Holder),
    band("41-50", 41, 50, AgeBandGroup::Holder),
    band("51-60", 51, 60, AgeBandGroup::Holder),
    band("61-65", 61, 65, AgeBandGroup::Holder),
    band("66-00", 66, 99, AgeBandGroup::Holder),
    band("MAT 0-25", 0, 25, AgeBandGroup::Couple),
    band("MAT 26-35", 26, 35, AgeBandGroup::Couple),
    band("MAT 36-40", 36, 40, AgeBandGroup::Couple),
    band("MAT 41-50", 41, 50, AgeBandGroup::Couple),
    band("MAT 51-60", 51, 60, AgeBandGroup::Couple),
    band("MAT 61-65", 61, 65, AgeBandGroup::Couple),
    band("MAT 66-00", 66, 99, AgeBandGroup::Couple),
    band("HIJO 0-1", 0, 1, AgeBandGroup::Child),
    band("HIJO 2-20", 2, 20, AgeBandGroup::Child),
    band("HIJO 21-29", 21, 29, AgeBandGroup::Child),
    band("HIJO 30-39", 30, 39, AgeBandGroup::Child),
    band("HIJO 40-49", 40, 49, AgeBandGroup::Child),
    band("FAMILIAR A CARGO", 0, 99, AgeBandGroup::Dependent),
];

impl AgeBand {
    pub fn find(label: &str) -> Option<&'static AgeBand> {
        AGE_BANDS.iter().find(|b| b.label == label.trim())
    }

    pub fn contains(&self, age: u8) -> bool {
        (self.min..=self.max).contains(&age)
    }

    /// Label as shown to users (`66-00` reads as `66+`)
    pub fn display_label(&self) -> String {
        self.label.replace("66-00", "66+")
    }
}

/// Stored price for one band of one plan/channel list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub id: u64,
    pub plan_id: u64,
    pub tipo_ingreso: IncomeChannel,
    #[serde(default)]
    pub lista_nombre: Option<String>,
    pub rango_etario: String,
    pub precio: Decimal,
}

impl PriceEntry {
    /// Position in the band grid; unknown labels sort last
    pub fn band_order(&self) -> usize {
        AGE_BANDS
            .iter()
            .position(|b| b.label == self.rango_etario)
            .unwrap_or(AGE_BANDS.len())
    }
}

/// Element of the bulk-load body (`POST /pricelists`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPriceEntry {
    pub plan_id: u64,
    pub tipo_ingreso: IncomeChannel,
    pub lista_nombre: String,
    pub rango_etario: String,
    pub precio: Decimal,
}

impl NewPriceEntry {
    /// One entry per band whose input parses as an amount; blank or
    /// malformed inputs are skipped.
    pub fn from_inputs<'a>(
        plan_id: u64,
        channel: IncomeChannel,
        inputs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Vec<NewPriceEntry> {
        inputs
            .into_iter()
            .filter_map(|(label, raw)| {
                let precio = Decimal::from_str(raw.trim()).ok()?;
                Some(NewPriceEntry {
                    plan_id,
                    tipo_ingreso: channel,
                    lista_nombre: channel.wire_name().to_string(),
                    rango_etario: label.to_string(),
                    precio,
                })
            })
            .collect()
    }
}

/// Which lists a bulk percentage increase touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncreaseScope {
    Channel(IncomeChannel),
    All,
}

impl IncreaseScope {
    pub fn wire_name(self) -> &'static str {
        match self {
            IncreaseScope::Channel(channel) => channel.wire_name(),
            IncreaseScope::All => "Ambas (Todas)",
        }
    }
}

impl Serialize for IncreaseScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

/// Body of `POST /pricelists/increase`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkIncrease {
    pub porcentaje: Decimal,
    pub tipo_ingreso: IncreaseScope,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_catalogue() {
        assert_eq!(AGE_BANDS.len(), 20);
        let top = AgeBand::find("66-00").unwrap();
        assert!(top.contains(99));
        assert!(!top.contains(65));
        assert_eq!(top.display_label(), "66+");
        assert_eq!(AgeBand::find("MAT 66-00").unwrap().display_label(), "MAT 66+");
        assert_eq!(
            AgeBand::find("FAMILIAR A CARGO").unwrap().group,
            AgeBandGroup::Dependent
        );
        assert!(AgeBand::find("HIJO 50-59").is_none());
    }

    #[test]
    fn test_bulk_inputs_skip_blank_and_malformed() {
        let entries = NewPriceEntry::from_inputs(
            7,
            IncomeChannel::Voluntary,
            [("0-25", "15000.50"), ("26-35", ""), ("36-40", "abc"), ("HIJO 0-1", " 8000 ")],
        );

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].rango_etario, "0-25");
        assert_eq!(entries[1].precio, Decimal::from(8000));
        assert_eq!(entries[1].lista_nombre, "Voluntario");
    }

    #[test]
    fn test_increase_scope_wire() {
        let body = BulkIncrease {
            porcentaje: Decimal::from(12),
            tipo_ingreso: IncreaseScope::All,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["tipo_ingreso"], "Ambas (Todas)");

        assert_eq!(
            IncreaseScope::Channel(IncomeChannel::Obligatory).wire_name(),
            "Obligatorio"
        );
    }

    #[test]
    fn test_band_order_sorts_unknown_last() {
        let entry = PriceEntry {
            id: 1,
            plan_id: 1,
            tipo_ingreso: IncomeChannel::Obligatory,
            lista_nombre: None,
            rango_etario: "HIJO 0-1".to_string(),
            precio: Decimal::ONE,
        };
        assert_eq!(entry.band_order(), 14);

        let odd = PriceEntry {
            rango_etario: "OTRO".to_string(),
            ..entry
        };
        assert_eq!(odd.band_order(), AGE_BANDS.len());
    }
}
