use crate::case_record::CaseRecord;
use crate::case_record::dosing::{DrugRow, EpiduralRow, FluidRow, form_text};
use crate::case_record::patient::PatientFields;
use crate::error::PersistenceError;
use crate::timeseries::record::{TimeRecord, VitalField};
use crate::timeseries::store::TimeSeriesStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The saved state of a whole case, in the shape it is written to disk and
/// exported as JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub patient: PatientFields,
    #[serde(deserialize_with = "lenient::rows")]
    pub drugs: Vec<DrugRow>,
    #[serde(deserialize_with = "lenient::rows")]
    pub fluids: Vec<FluidRow>,
    #[serde(deserialize_with = "lenient::rows")]
    pub epidurals: Vec<EpiduralRow>,
    #[serde(deserialize_with = "lenient::vitals")]
    pub vitals: VitalsColumns,
    #[serde(deserialize_with = "form_text")]
    pub notes: String,
    /// Respiratory rates written at the top level by older versions. When
    /// present they replace `vitals.rr`.
    #[serde(skip_serializing, deserialize_with = "lenient::legacy_integers")]
    pub rr: Option<Vec<Option<i32>>>,
}

/// The vitals timeline as one array per field, all indexed by record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsColumns {
    #[serde(deserialize_with = "lenient::labels")]
    pub times: Vec<String>,
    #[serde(deserialize_with = "lenient::integers")]
    pub systolic: Vec<Option<i32>>,
    #[serde(deserialize_with = "lenient::integers")]
    pub diastolic: Vec<Option<i32>>,
    /// Written for readers of the export; recomputed on load.
    #[serde(deserialize_with = "lenient::integers")]
    pub mean: Vec<Option<i32>>,
    #[serde(deserialize_with = "lenient::integers")]
    pub pulse: Vec<Option<i32>>,
    #[serde(deserialize_with = "lenient::integers")]
    pub etco2: Vec<Option<i32>>,
    #[serde(deserialize_with = "lenient::integers")]
    pub spo2: Vec<Option<i32>>,
    #[serde(deserialize_with = "lenient::decimals")]
    pub bt: Vec<Option<f64>>,
    #[serde(deserialize_with = "lenient::decimals")]
    pub iso: Vec<Option<f64>>,
    #[serde(deserialize_with = "lenient::integers")]
    pub rr: Vec<Option<i32>>,
    /// `null` where no fluid was logged.
    #[serde(deserialize_with = "lenient::fluid_maps")]
    pub fluids: Vec<Option<BTreeMap<String, f64>>>,
}

/// Readers that turn whatever an array entry holds into a value or an absence.
mod lenient {
    use super::VitalsColumns;
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use std::collections::BTreeMap;

    fn entries<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items,
            _ => Vec::new(),
        })
    }

    fn number(value: &Value) -> Option<f64> {
        value.as_f64().filter(|value| value.is_finite())
    }

    fn integer(value: &Value) -> Option<i32> {
        number(value).map(|value| value.trunc() as i32)
    }

    /// Keeps the rows that can be read and drops the rest.
    pub fn rows<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(entries(deserializer)?
            .into_iter()
            .filter_map(|value| match T::deserialize(value) {
                Ok(row) => Some(row),
                Err(err) => {
                    log::debug!("dropping unreadable row: {err}");
                    None
                }
            })
            .collect())
    }

    /// Anything but an object is an empty timeline.
    pub fn vitals<'de, D>(deserializer: D) -> Result<VitalsColumns, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            object @ Value::Object(_) => VitalsColumns::deserialize(object).unwrap_or_default(),
            _ => VitalsColumns::default(),
        })
    }

    pub fn labels<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(entries(deserializer)?
            .into_iter()
            .map(|value| match value {
                Value::String(label) => label,
                Value::Number(number) => number.to_string(),
                _ => String::new(),
            })
            .collect())
    }

    pub fn integers<'de, D>(deserializer: D) -> Result<Vec<Option<i32>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(entries(deserializer)?.iter().map(integer).collect())
    }

    pub fn decimals<'de, D>(deserializer: D) -> Result<Vec<Option<f64>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(entries(deserializer)?.iter().map(number).collect())
    }

    pub fn legacy_integers<'de, D>(deserializer: D) -> Result<Option<Vec<Option<i32>>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => Some(items.iter().map(integer).collect()),
            _ => None,
        })
    }

    /// Accepts `{ "<name>": <rate> }` maps and the older `{ "name", "rate" }` objects.
    pub fn fluid_maps<'de, D>(
        deserializer: D,
    ) -> Result<Vec<Option<BTreeMap<String, f64>>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(entries(deserializer)?
            .into_iter()
            .map(|value| {
                let Value::Object(object) = value else {
                    return None;
                };
                let rates: BTreeMap<String, f64> = match (object.get("name"), object.get("rate")) {
                    (Some(Value::String(name)), Some(rate)) => number(rate)
                        .map(|rate| (name.clone(), rate))
                        .into_iter()
                        .collect(),
                    _ => object
                        .iter()
                        .filter_map(|(name, rate)| Some((name.clone(), number(rate)?)))
                        .collect(),
                };
                Some(rates).filter(|rates| !rates.is_empty())
            })
            .collect())
    }
}

impl VitalsColumns {
    pub fn from_store(store: &TimeSeriesStore) -> Self {
        let integers = |field: VitalField| -> Vec<Option<i32>> {
            store
                .iter()
                .map(|record| record.get(field).map(|value| value as i32))
                .collect()
        };
        let decimals = |field: VitalField| -> Vec<Option<f64>> {
            store.iter().map(|record| record.get(field)).collect()
        };
        VitalsColumns {
            times: store.iter().map(|record| record.time().to_string()).collect(),
            systolic: integers(VitalField::Systolic),
            diastolic: integers(VitalField::Diastolic),
            mean: store.iter().map(TimeRecord::mean).collect(),
            pulse: integers(VitalField::Pulse),
            etco2: integers(VitalField::Etco2),
            spo2: integers(VitalField::Spo2),
            bt: decimals(VitalField::Bt),
            iso: decimals(VitalField::Iso),
            rr: integers(VitalField::Rr),
            fluids: store
                .iter()
                .map(|record| Some(record.fluids().clone()).filter(|rates| !rates.is_empty()))
                .collect(),
        }
    }

    /// Rebuilds the store. `times` decides the record count; shorter columns
    /// leave the missing fields absent and the stored mean is ignored.
    pub fn into_store(self) -> TimeSeriesStore {
        let integer_columns = [
            (VitalField::Systolic, &self.systolic),
            (VitalField::Diastolic, &self.diastolic),
            (VitalField::Pulse, &self.pulse),
            (VitalField::Etco2, &self.etco2),
            (VitalField::Spo2, &self.spo2),
            (VitalField::Rr, &self.rr),
        ];
        let decimal_columns = [(VitalField::Bt, &self.bt), (VitalField::Iso, &self.iso)];

        let records = self
            .times
            .iter()
            .enumerate()
            .map(|(index, time)| {
                let mut record = TimeRecord::new(time.clone());
                for (field, column) in integer_columns {
                    record.set(field, column.get(index).copied().flatten().map(f64::from));
                }
                for (field, column) in decimal_columns {
                    record.set(field, column.get(index).copied().flatten());
                }
                if let Some(Some(rates)) = self.fluids.get(index) {
                    for (channel, rate) in rates {
                        record.set_fluid(channel, Some(*rate));
                    }
                }
                record
            })
            .collect();
        TimeSeriesStore::from_records(records)
    }
}

impl Snapshot {
    pub fn capture(case: &CaseRecord, store: &TimeSeriesStore) -> Self {
        Snapshot {
            patient: case.patient.clone(),
            drugs: case.drugs.clone(),
            fluids: case.fluids.clone(),
            epidurals: case.epidurals.clone(),
            vitals: VitalsColumns::from_store(store),
            notes: case.notes.clone(),
            rr: None,
        }
    }

    /// Splits the snapshot back into the case record and the vitals store.
    pub fn into_parts(self) -> (CaseRecord, TimeSeriesStore) {
        let mut vitals = self.vitals;
        if let Some(rr) = self.rr {
            vitals.rr = rr;
        }
        let case = CaseRecord {
            patient: self.patient,
            drugs: self.drugs,
            fluids: self.fluids,
            epidurals: self.epidurals,
            notes: self.notes,
        };
        (case, vitals.into_store())
    }

    /// Nothing logged and every form field blank.
    pub fn is_blank(&self) -> bool {
        self.vitals.times.is_empty()
            && self.patient.is_blank()
            && self.notes.trim().is_empty()
            && self.drugs.iter().all(DrugRow::is_blank)
            && self.fluids.iter().all(FluidRow::is_blank)
            && self.epidurals.iter().all(EpiduralRow::is_blank)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
