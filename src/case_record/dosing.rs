use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const DRUG_OPTIONS: [&str; 25] = [
    "Acepromazine",
    "Alfaxalone",
    "Atipamazole",
    "Atropine",
    "Buprenorphine",
    "Butorphanol",
    "Cefazolin",
    "Dexmedetomidine",
    "Diazepam",
    "Dobutamine",
    "Dopamine",
    "Epinephrine",
    "Fentanyl",
    "Flumazenil",
    "Glycopyrrolate",
    "Ketamine",
    "Lidocaine",
    "Maropitant",
    "Meloxicam",
    "Methadone",
    "Midazolam",
    "Morphine",
    "Naloxone",
    "Propofol",
    "Zolazepam/Tiletamine (Zoletil)",
];

pub const EPIDURAL_OPTIONS: [&str; 3] = ["Lidocaine", "Bupivacaine", "Ropivacaine"];

pub const ROUTE_OPTIONS: [&str; 3] = ["IV", "IM", "SC"];

/// IV catheter gauges.
pub const IVC_SITES: [&str; 8] = ["18G", "19G", "20G", "21G", "22G", "23G", "24G", "25G"];

/// Endotracheal tube sizes: `none`, then 2.5 to 15 in half steps.
pub fn et_tube_sizes() -> Vec<String> {
    std::iter::once("none".to_string())
        .chain((5..=30).map(|half_mm| (f64::from(half_mm) / 2.0).to_string()))
        .collect()
}

pub const AGE_YEARS: std::ops::RangeInclusive<u8> = 0..=25;
pub const AGE_MONTHS: std::ops::RangeInclusive<u8> = 0..=12;

/// The fixed dose-unit vocabulary. No conversion happens between units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoseUnit {
    #[default]
    #[serde(rename = "mg/kg")]
    MgPerKg,
    #[serde(rename = "mcg/kg")]
    McgPerKg,
    #[serde(rename = "mg/m^2")]
    MgPerM2,
    #[serde(rename = "mcg/m^2")]
    McgPerM2,
    #[serde(rename = "mg/animal")]
    MgPerAnimal,
    #[serde(rename = "mcg/animal")]
    McgPerAnimal,
}

impl DoseUnit {
    pub const ALL: [DoseUnit; 6] = [
        DoseUnit::MgPerKg,
        DoseUnit::McgPerKg,
        DoseUnit::MgPerM2,
        DoseUnit::McgPerM2,
        DoseUnit::MgPerAnimal,
        DoseUnit::McgPerAnimal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DoseUnit::MgPerKg => "mg/kg",
            DoseUnit::McgPerKg => "mcg/kg",
            DoseUnit::MgPerM2 => "mg/m^2",
            DoseUnit::McgPerM2 => "mcg/m^2",
            DoseUnit::MgPerAnimal => "mg/animal",
            DoseUnit::McgPerAnimal => "mcg/animal",
        }
    }

    /// Per-kg and per-m² doses are multiplied by the patient weight.
    pub fn scales_with_weight(self) -> bool {
        !matches!(self, DoseUnit::MgPerAnimal | DoseUnit::McgPerAnimal)
    }

    /// Unit of the total amount given.
    pub fn total_unit(self) -> &'static str {
        match self {
            DoseUnit::MgPerKg | DoseUnit::MgPerM2 | DoseUnit::MgPerAnimal => "mg",
            DoseUnit::McgPerKg | DoseUnit::McgPerM2 | DoseUnit::McgPerAnimal => "mcg",
        }
    }
}

impl fmt::Display for DoseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DoseUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DoseUnit::ALL
            .into_iter()
            .find(|unit| unit.as_str() == s)
            .ok_or_else(|| format!("unknown dose unit '{s}'"))
    }
}

impl DoseUnit {
    /// Unknown or missing units fall back to the default.
    fn lenient<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(unit) => unit.parse().unwrap_or_else(|err| {
                log::debug!("{err}, using {}", DoseUnit::default());
                DoseUnit::default()
            }),
            _ => DoseUnit::default(),
        })
    }
}

/// Reads a form value as text: numbers and flags are written out, anything
/// else is blank.
pub(crate) fn form_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    })
}

/// Total amount for a dose row. A missing or unreadable weight counts as 1 kg,
/// a missing or unreadable dose as 0.
pub fn dose_total(raw_dose: &str, unit: DoseUnit, weight_kg: Option<f64>) -> f64 {
    let dose = raw_dose.trim().parse::<f64>().unwrap_or(0.0);
    if unit.scales_with_weight() {
        dose * weight_kg.unwrap_or(1.0)
    } else {
        dose
    }
}

/// The total as shown next to a dose row: three decimals and the unit, or `--`.
pub fn format_total(total: f64, unit: DoseUnit) -> String {
    if total == 0.0 || !total.is_finite() {
        "--".to_string()
    } else {
        format!("{total:.3} {}", unit.total_unit())
    }
}

/// Rows keep the raw form text so a half-typed value survives a reload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrugRow {
    #[serde(deserialize_with = "form_text")]
    pub name: String,
    #[serde(deserialize_with = "form_text")]
    pub dose: String,
    #[serde(deserialize_with = "DoseUnit::lenient")]
    pub unit: DoseUnit,
    #[serde(deserialize_with = "form_text")]
    pub route: String,
    #[serde(deserialize_with = "form_text")]
    pub time: String,
}

impl DrugRow {
    pub fn new(time: impl Into<String>) -> Self {
        DrugRow {
            route: ROUTE_OPTIONS[0].to_string(),
            time: time.into(),
            ..DrugRow::default()
        }
    }

    pub fn total(&self, weight_kg: Option<f64>) -> String {
        format_total(dose_total(&self.dose, self.unit, weight_kg), self.unit)
    }

    pub fn is_blank(&self) -> bool {
        self.name.is_empty() && self.dose.trim().is_empty()
    }
}

/// A running infusion. Logging it adds a pulse on the fluid's chart channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidRow {
    #[serde(deserialize_with = "form_text")]
    pub name: String,
    #[serde(deserialize_with = "form_text")]
    pub rate: String,
}

impl FluidRow {
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty() && self.rate.trim().is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpiduralRow {
    #[serde(deserialize_with = "form_text")]
    pub drug: String,
    #[serde(deserialize_with = "form_text")]
    pub dose: String,
    #[serde(deserialize_with = "DoseUnit::lenient")]
    pub unit: DoseUnit,
    #[serde(deserialize_with = "form_text")]
    pub route: String,
}

impl EpiduralRow {
    pub fn total(&self, weight_kg: Option<f64>) -> String {
        format_total(dose_total(&self.dose, self.unit, weight_kg), self.unit)
    }

    pub fn is_blank(&self) -> bool {
        self.drug.is_empty() && self.dose.trim().is_empty() && self.route.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drug_options_are_sorted() {
        let mut sorted = DRUG_OPTIONS;
        sorted.sort();
        assert_eq!(sorted, DRUG_OPTIONS);
    }

    #[test]
    fn et_tube_sizes_span_half_steps() {
        let sizes = et_tube_sizes();
        assert_eq!(sizes.first().map(String::as_str), Some("none"));
        assert_eq!(sizes[1], "2.5");
        assert_eq!(sizes[2], "3");
        assert_eq!(sizes.last().map(String::as_str), Some("15"));
        assert_eq!(sizes.len(), 27);
    }

    #[test]
    fn per_kg_doses_scale_with_weight() {
        assert_eq!(dose_total("0.2", DoseUnit::MgPerKg, Some(10.0)), 2.0);
        assert_eq!(dose_total("5", DoseUnit::McgPerM2, Some(2.0)), 10.0);
        assert_eq!(dose_total("3", DoseUnit::MgPerAnimal, Some(10.0)), 3.0);
    }

    #[test]
    fn missing_inputs_use_fallbacks() {
        assert_eq!(dose_total("0.5", DoseUnit::MgPerKg, None), 0.5);
        assert_eq!(dose_total("", DoseUnit::MgPerKg, Some(10.0)), 0.0);
        assert_eq!(dose_total("abc", DoseUnit::McgPerKg, Some(10.0)), 0.0);
    }

    #[test]
    fn totals_format_with_unit() {
        assert_eq!(format_total(2.0, DoseUnit::MgPerKg), "2.000 mg");
        assert_eq!(format_total(0.25, DoseUnit::McgPerAnimal), "0.250 mcg");
        assert_eq!(format_total(0.0, DoseUnit::MgPerKg), "--");
    }

    #[test]
    fn drug_row_total() {
        let row = DrugRow {
            name: "Methadone".to_string(),
            dose: "0.3".to_string(),
            unit: DoseUnit::MgPerKg,
            route: "IV".to_string(),
            time: "09:45".to_string(),
        };
        assert_eq!(row.total(Some(20.0)), "6.000 mg");
    }

    #[test]
    fn units_use_their_symbols_on_the_wire() {
        assert_eq!(serde_json::to_string(&DoseUnit::McgPerM2).unwrap(), r#""mcg/m^2""#);
        assert_eq!("mg/animal".parse::<DoseUnit>(), Ok(DoseUnit::MgPerAnimal));
        let row: EpiduralRow = serde_json::from_str(r#"{"drug": "Lidocaine"}"#).unwrap();
        assert_eq!(row.unit, DoseUnit::MgPerKg);
    }

    #[test]
    fn rows_read_loosely_typed_values() {
        let json = r#"{"name": "Ketamine", "dose": 2, "unit": "ml/kg", "time": null}"#;
        let row: DrugRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.dose, "2");
        assert_eq!(row.unit, DoseUnit::MgPerKg);
        assert_eq!(row.time, "");
        assert_eq!(row.total(Some(5.0)), "10.000 mg");

        let fluid: FluidRow = serde_json::from_str(r#"{"name": "LRS", "rate": 7.5}"#).unwrap();
        assert_eq!(fluid.rate, "7.5");
        let json = r#"{"drug": "Bupivacaine", "unit": 3, "route": ["L7"]}"#;
        let epidural: EpiduralRow = serde_json::from_str(json).unwrap();
        assert_eq!(epidural.unit, DoseUnit::MgPerKg);
        assert_eq!(epidural.route, "");
    }

    #[test]
    fn new_drug_row_defaults() {
        let row = DrugRow::new("10:15");
        assert_eq!(row.route, "IV");
        assert_eq!(row.time, "10:15");
        assert!(row.is_blank());
    }
}
