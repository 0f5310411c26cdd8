use crate::config::ChartConfig;
use crate::timeseries::record::VitalField;
use crate::timeseries::store::TimeSeriesStore;

/// Vitals that can stretch the primary axis. Mean and respiration rate are
/// drawn against it but never move its bound.
const VITALS_AXIS_FIELDS: [VitalField; 6] = [
    VitalField::Systolic,
    VitalField::Diastolic,
    VitalField::Pulse,
    VitalField::Spo2,
    VitalField::Etco2,
    VitalField::Bt,
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
}

/// How wide the chart viewport has to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewportWidth {
    /// Fill the container.
    Natural,
    /// Scrollable, this many pixels wide.
    Pixels(u32),
}

/// Axis from 0 to `default_max`, or up to the next multiple of `step` above
/// `observed_max` when the data doesn't fit. Never shrinks below the default.
pub fn scaled_axis(observed_max: Option<f64>, default_max: f64, step: f64) -> AxisBounds {
    let max = match observed_max {
        Some(observed) if observed > default_max => (observed / step).ceil() * step,
        _ => default_max,
    };
    AxisBounds { min: 0.0, max }
}

pub fn vitals_axis(store: &TimeSeriesStore, config: &ChartConfig) -> AxisBounds {
    let observed = store
        .iter()
        .flat_map(|record| VITALS_AXIS_FIELDS.iter().filter_map(|field| record.get(*field)))
        .reduce(f64::max);
    scaled_axis(observed, config.vitals_axis_max, config.vitals_axis_step)
}

pub fn fluid_axis(store: &TimeSeriesStore, config: &ChartConfig) -> AxisBounds {
    let observed = store
        .iter()
        .flat_map(|record| record.fluids().values().copied())
        .reduce(f64::max);
    scaled_axis(observed, config.fluid_axis_max, config.fluid_axis_step)
}

/// The anesthetic gas axis is fixed; vaporiser settings never leave it.
pub fn gas_axis(config: &ChartConfig) -> AxisBounds {
    AxisBounds {
        min: 0.0,
        max: config.gas_axis_max,
    }
}

pub fn viewport_width(slot_count: usize, config: &ChartConfig) -> ViewportWidth {
    if slot_count > config.min_slots {
        let slots = u32::try_from(slot_count).unwrap_or(u32::MAX);
        ViewportWidth::Pixels(slots.saturating_mul(config.slot_width_px))
    } else {
        ViewportWidth::Natural
    }
}
