use crate::error::StoreError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A vital sign that is entered directly, either through the log form, a
/// history table cell or a chart point.
///
/// Mean arterial pressure is deliberately missing: it is always derived from
/// systolic and diastolic and can never be typed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VitalField {
    Systolic,
    Diastolic,
    Pulse,
    Spo2,
    Etco2,
    Bt,
    Rr,
    Iso,
}

impl VitalField {
    /// Every field, in history table column order.
    pub const ALL: [VitalField; 8] = [
        VitalField::Systolic,
        VitalField::Diastolic,
        VitalField::Pulse,
        VitalField::Spo2,
        VitalField::Etco2,
        VitalField::Bt,
        VitalField::Rr,
        VitalField::Iso,
    ];

    /// The key used in snapshots and table cells.
    pub fn key(self) -> &'static str {
        match self {
            VitalField::Systolic => "systolic",
            VitalField::Diastolic => "diastolic",
            VitalField::Pulse => "pulse",
            VitalField::Spo2 => "spo2",
            VitalField::Etco2 => "etco2",
            VitalField::Bt => "bt",
            VitalField::Rr => "rr",
            VitalField::Iso => "iso",
        }
    }

    /// Short label shown on the chart legend and edit prompts.
    pub fn label(self) -> &'static str {
        match self {
            VitalField::Systolic => "SYS",
            VitalField::Diastolic => "DIA",
            VitalField::Pulse => "PULSE",
            VitalField::Spo2 => "SpO2",
            VitalField::Etco2 => "ETCO2",
            VitalField::Bt => "BT",
            VitalField::Rr => "RR",
            VitalField::Iso => "ISO",
        }
    }

    /// Temperature and anesthetic gas are decimal, everything else is a whole number.
    pub fn is_integer(self) -> bool {
        !matches!(self, VitalField::Bt | VitalField::Iso)
    }

    pub fn affects_mean(self) -> bool {
        matches!(self, VitalField::Systolic | VitalField::Diastolic)
    }
}

impl fmt::Display for VitalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for VitalField {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VitalField::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or_else(|| StoreError::UnknownField(s.to_string()))
    }
}

/// What a piece of user text turned out to be.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RawNumber {
    Empty,
    Value(f64),
    Invalid,
}

impl RawNumber {
    /// Surrounding whitespace is ignored; `NaN` and infinities are not numbers here.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return RawNumber::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => RawNumber::Value(value),
            _ => RawNumber::Invalid,
        }
    }

    /// `Ok(None)` for empty text, the number otherwise.
    pub fn into_reading(self, field: &str, raw: &str) -> Result<Option<f64>, StoreError> {
        match self {
            RawNumber::Empty => Ok(None),
            RawNumber::Value(value) => Ok(Some(value)),
            RawNumber::Invalid => Err(StoreError::InvalidNumber {
                field: field.to_string(),
                raw: raw.to_string(),
            }),
        }
    }
}

/// Mean arterial pressure: diastolic plus a third of the pulse pressure.
pub fn mean_arterial_pressure(systolic: i32, diastolic: i32) -> i32 {
    let diastolic = f64::from(diastolic);
    (diastolic + (f64::from(systolic) - diastolic) / 3.0).round() as i32
}

/// One logged instant of the anesthetic timeline.
///
/// `time` is the formatted `HH:MM` label the record was logged under. The
/// mean is private and only ever recomputed from systolic and diastolic, so a
/// record can't hold a stale mean.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeRecord {
    time: String,
    systolic: Option<i32>,
    diastolic: Option<i32>,
    mean: Option<i32>,
    pulse: Option<i32>,
    spo2: Option<i32>,
    etco2: Option<i32>,
    bt: Option<f64>,
    rr: Option<i32>,
    iso: Option<f64>,
    fluids: BTreeMap<String, f64>,
}

impl TimeRecord {
    pub fn new(time: impl Into<String>) -> Self {
        TimeRecord {
            time: time.into(),
            ..TimeRecord::default()
        }
    }

    pub fn with(mut self, field: VitalField, value: f64) -> Self {
        self.set(field, Some(value));
        self
    }

    pub fn with_fluid(mut self, channel: impl Into<String>, rate: f64) -> Self {
        self.fluids.insert(channel.into(), rate);
        self
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn mean(&self) -> Option<i32> {
        self.mean
    }

    pub fn get(&self, field: VitalField) -> Option<f64> {
        match field {
            VitalField::Systolic => self.systolic.map(f64::from),
            VitalField::Diastolic => self.diastolic.map(f64::from),
            VitalField::Pulse => self.pulse.map(f64::from),
            VitalField::Spo2 => self.spo2.map(f64::from),
            VitalField::Etco2 => self.etco2.map(f64::from),
            VitalField::Bt => self.bt,
            VitalField::Rr => self.rr.map(f64::from),
            VitalField::Iso => self.iso,
        }
    }

    /// Whole-number fields drop the fractional part of `value`.
    pub(crate) fn set(&mut self, field: VitalField, value: Option<f64>) {
        let whole = value.map(|v| v.trunc() as i32);
        match field {
            VitalField::Systolic => self.systolic = whole,
            VitalField::Diastolic => self.diastolic = whole,
            VitalField::Pulse => self.pulse = whole,
            VitalField::Spo2 => self.spo2 = whole,
            VitalField::Etco2 => self.etco2 = whole,
            VitalField::Bt => self.bt = value,
            VitalField::Rr => self.rr = whole,
            VitalField::Iso => self.iso = value,
        }
        if field.affects_mean() {
            self.recompute_mean();
        }
    }

    fn recompute_mean(&mut self) {
        self.mean = match (self.systolic, self.diastolic) {
            (Some(systolic), Some(diastolic)) => {
                Some(mean_arterial_pressure(systolic, diastolic))
            }
            _ => None,
        };
    }

    /// Fluid rates active at this instant, keyed by channel name. Empty when
    /// no fluid was logged here.
    pub fn fluids(&self) -> &BTreeMap<String, f64> {
        &self.fluids
    }

    pub fn fluid(&self, channel: &str) -> Option<f64> {
        self.fluids.get(channel).copied()
    }

    pub(crate) fn set_fluid(&mut self, channel: &str, rate: Option<f64>) {
        match rate {
            Some(rate) => {
                self.fluids.insert(channel.to_string(), rate);
            }
            None => {
                self.fluids.remove(channel);
            }
        }
    }
}

/// A partial set of vitals taken from the log form. Fields that were left
/// blank are simply not present.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VitalsReading {
    values: BTreeMap<VitalField, f64>,
}

impl VitalsReading {
    pub fn new() -> Self {
        VitalsReading::default()
    }

    pub fn with(mut self, field: VitalField, value: f64) -> Self {
        self.values.insert(field, value);
        self
    }

    /// Reads one form input. Blank and non-numeric text leave the field unsupplied.
    pub fn with_raw(mut self, field: VitalField, raw: &str) -> Self {
        match RawNumber::parse(raw) {
            RawNumber::Value(value) => {
                self.values.insert(field, value);
            }
            RawNumber::Invalid => {
                log::debug!("ignoring non-numeric {field} input '{raw}'");
            }
            RawNumber::Empty => {}
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VitalField, f64)> + '_ {
        self.values.iter().map(|(field, value)| (*field, *value))
    }
}
