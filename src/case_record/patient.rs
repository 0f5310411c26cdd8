use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Ids of the patient and procedure form fields that are persisted.
pub const FIELD_IDS: [&str; 19] = [
    "pet-name",
    "animal-id",
    "breed",
    "date",
    "weight",
    "sex",
    "anesthetist",
    "surgeon",
    "procedure",
    "procedure-note",
    "et-tube-size",
    "intubation-time",
    "extubation-time",
    "ivc-site",
    "bp-cuff-size",
    "age-y",
    "age-m",
    "setup-ventilator",
    "setup-mask",
];

/// A form value: text inputs and selects hold text, set-up checkboxes hold a flag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Checked(bool),
    Text(String),
}

impl FieldValue {
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Checked(checked) => !checked,
            FieldValue::Text(text) => text.trim().is_empty(),
        }
    }
}

/// Patient metadata keyed by form field id.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PatientFields {
    values: BTreeMap<String, FieldValue>,
}

impl<'de> Deserialize<'de> for PatientFields {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(PatientFields {
            values: known_fields(deserializer)?,
        })
    }
}

/// Keeps the known ids; numbers become text, nulls and nested values are
/// dropped. Anything but an object holds no fields.
fn known_fields<'de, D>(deserializer: D) -> Result<BTreeMap<String, FieldValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let serde_json::Value::Object(raw) = serde_json::Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    Ok(raw
        .into_iter()
        .filter(|(id, _)| FIELD_IDS.contains(&id.as_str()))
        .filter_map(|(id, value)| match value {
            serde_json::Value::Bool(checked) => Some((id, FieldValue::Checked(checked))),
            serde_json::Value::String(text) => Some((id, FieldValue::Text(text))),
            serde_json::Value::Number(number) => Some((id, FieldValue::Text(number.to_string()))),
            _ => None,
        })
        .collect())
}

impl PatientFields {
    /// Sets a field. Ids outside [`FIELD_IDS`] are not part of the record and are ignored.
    pub fn set(&mut self, id: &str, value: FieldValue) -> bool {
        if !FIELD_IDS.contains(&id) {
            log::debug!("ignoring unknown patient field '{id}'");
            return false;
        }
        self.values.insert(id.to_string(), value);
        true
    }

    pub fn get(&self, id: &str) -> Option<&FieldValue> {
        self.values.get(id)
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        match self.values.get(id) {
            Some(FieldValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Body weight in kg, when the weight field holds a number.
    pub fn weight_kg(&self) -> Option<f64> {
        self.text("weight")?.trim().parse().ok()
    }

    pub fn is_blank(&self) -> bool {
        self.values.values().all(FieldValue::is_blank)
    }
}
