use crate::config::ChartConfig;
use crate::projection::EditTarget;
use crate::projection::axis::{
    AxisBounds, ViewportWidth, fluid_axis, gas_axis, viewport_width, vitals_axis,
};
use crate::timeseries::channels::ChannelRegistry;
use crate::timeseries::record::VitalField;
use crate::timeseries::store::TimeSeriesStore;
use std::fmt;

/// Fluid channels take their colour from this palette in sorted-name order.
const FLUID_COLORS: [&str; 6] = ["#e74c3c", "#3498db", "#1abc9c", "#f39c12", "#9b59b6", "#34495e"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisId {
    Vitals,
    FluidRate,
    Gas,
}

impl AxisId {
    /// Identifier the renderer knows the axis by.
    pub fn id(self) -> &'static str {
        match self {
            AxisId::Vitals => "y",
            AxisId::FluidRate => "yFluid",
            AxisId::Gas => "yIso",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AxisId::Vitals => "Vitals",
            AxisId::FluidRate => "Fluid Rate (ml/hr)",
            AxisId::Gas => "ISO %",
        }
    }
}

/// Marker drawn at each data point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointStyle {
    Triangle,
    TriangleDown,
    RectRot,
    Circle,
    Star,
    CrossRot,
    Rect,
    Cross,
}

/// What a series is drawn from, and so where an edit of one of its points goes.
#[derive(Clone, Debug, PartialEq)]
pub enum SeriesSource {
    Vital(VitalField),
    Mean,
    Fluid(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub label: String,
    pub color: &'static str,
    pub point_style: PointStyle,
    pub border_width: u8,
    pub dash: Option<[u8; 2]>,
    pub axis: AxisId,
    /// Missing points are bridged rather than breaking the line.
    pub span_gaps: bool,
    pub source: SeriesSource,
    /// One value per label slot, `None` where nothing was recorded.
    pub data: Vec<Option<f64>>,
}

struct FixedSeries {
    source: SeriesSource,
    color: &'static str,
    point_style: PointStyle,
    border_width: u8,
    dash: Option<[u8; 2]>,
    axis: AxisId,
}

fn fixed_series() -> [FixedSeries; 9] {
    let vital = |field, color, point_style| FixedSeries {
        source: SeriesSource::Vital(field),
        color,
        point_style,
        border_width: 2,
        dash: None,
        axis: AxisId::Vitals,
    };
    [
        vital(VitalField::Systolic, "#ff6384", PointStyle::TriangleDown),
        vital(VitalField::Diastolic, "#36a2eb", PointStyle::Triangle),
        FixedSeries {
            source: SeriesSource::Mean,
            color: "#ffffff",
            point_style: PointStyle::RectRot,
            border_width: 1,
            dash: Some([5, 5]),
            axis: AxisId::Vitals,
        },
        vital(VitalField::Pulse, "#f1c40f", PointStyle::Circle),
        vital(VitalField::Spo2, "#2ecc71", PointStyle::Star),
        vital(VitalField::Etco2, "#9b59b6", PointStyle::CrossRot),
        vital(VitalField::Bt, "#34495e", PointStyle::Rect),
        vital(VitalField::Rr, "#00bcd4", PointStyle::Cross),
        FixedSeries {
            source: SeriesSource::Vital(VitalField::Iso),
            color: "#e67e22",
            point_style: PointStyle::Circle,
            border_width: 2,
            dash: Some([2, 2]),
            axis: AxisId::Gas,
        },
    ]
}

/// A rendered point, addressed by series and label slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChartPoint {
    pub series: usize,
    pub slot: usize,
}

impl fmt::Display for ChartPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChartPoint {{ series: {}, slot: {} }}", self.series, self.slot)
    }
}

/// The prompt opened when a point is selected.
#[derive(Clone, Debug, PartialEq)]
pub struct PointEdit {
    pub title: String,
    /// Seed value for the prompt.
    pub current: Option<f64>,
    pub target: EditTarget,
}

/// Everything the chart renderer needs for one redraw.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartModel {
    /// Record times, padded with empty labels up to the configured minimum.
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    pub vitals_axis: AxisBounds,
    pub fluid_axis: AxisBounds,
    pub gas_axis: AxisBounds,
    pub width: ViewportWidth,
    record_count: usize,
}

impl ChartModel {
    pub fn project(
        store: &TimeSeriesStore,
        channels: &ChannelRegistry,
        config: &ChartConfig,
    ) -> Self {
        let mut labels: Vec<String> = store
            .iter()
            .map(|record| record.time().to_string())
            .collect();
        if labels.len() < config.min_slots {
            labels.resize(config.min_slots, String::new());
        }
        let slots = labels.len();
        let pad = |mut data: Vec<Option<f64>>| {
            data.resize(slots, None);
            data
        };

        let mut series: Vec<Series> = fixed_series()
            .into_iter()
            .map(|fixed| {
                let (label, data) = match &fixed.source {
                    SeriesSource::Vital(field) => (
                        field.label().to_string(),
                        store.iter().map(|record| record.get(*field)).collect(),
                    ),
                    SeriesSource::Mean => (
                        "MEAN".to_string(),
                        store.iter().map(|record| record.mean().map(f64::from)).collect(),
                    ),
                    SeriesSource::Fluid(name) => (name.clone(), Vec::new()),
                };
                Series {
                    label,
                    color: fixed.color,
                    point_style: fixed.point_style,
                    border_width: fixed.border_width,
                    dash: fixed.dash,
                    axis: fixed.axis,
                    span_gaps: true,
                    source: fixed.source,
                    data: pad(data),
                }
            })
            .collect();

        series.extend(
            channels
                .project_all(store)
                .enumerate()
                .map(|(position, (name, data))| Series {
                    label: name.to_string(),
                    color: FLUID_COLORS[position % FLUID_COLORS.len()],
                    point_style: PointStyle::Rect,
                    border_width: 2,
                    dash: None,
                    axis: AxisId::FluidRate,
                    span_gaps: true,
                    source: SeriesSource::Fluid(name.to_string()),
                    data: pad(data),
                }),
        );

        ChartModel {
            width: viewport_width(slots, config),
            labels,
            series,
            vitals_axis: vitals_axis(store, config),
            fluid_axis: fluid_axis(store, config),
            gas_axis: gas_axis(config),
            record_count: store.len(),
        }
    }

    /// Number of slots backed by a record; the rest of the label axis is padding.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// The edit prompt for a selected point, or `None` when the point is a
    /// padding slot, the derived mean, or doesn't exist.
    pub fn point_edit(&self, point: ChartPoint) -> Option<PointEdit> {
        if point.slot >= self.record_count {
            return None;
        }
        let series = self.series.get(point.series)?;
        let target = match &series.source {
            SeriesSource::Vital(field) => EditTarget::Vital {
                index: point.slot,
                field: *field,
            },
            SeriesSource::Fluid(channel) => EditTarget::Fluid {
                index: point.slot,
                channel: channel.clone(),
            },
            SeriesSource::Mean => return None,
        };
        Some(PointEdit {
            title: format!("Edit {} at {}", series.label, self.labels[point.slot]),
            current: series.data[point.slot],
            target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeseries::record::{TimeRecord, VitalsReading};

    fn project(store: &TimeSeriesStore) -> ChartModel {
        ChartModel::project(store, &ChannelRegistry::derive(store), &ChartConfig::default())
    }

    fn three_records() -> TimeSeriesStore {
        TimeSeriesStore::from_records(vec![
            TimeRecord::new("10:00")
                .with(VitalField::Systolic, 120.0)
                .with(VitalField::Diastolic, 80.0),
            TimeRecord::new("10:05").with_fluid("NaCl", 10.0).with_fluid("LRS", 50.0),
            TimeRecord::new("10:10").with(VitalField::Iso, 1.5),
        ])
    }

    #[test]
    fn short_sessions_are_padded_to_twenty_slots() {
        let chart = project(&three_records());
        assert_eq!(chart.labels.len(), 20);
        assert_eq!(&chart.labels[..3], ["10:00", "10:05", "10:10"]);
        assert!(chart.labels[3..].iter().all(String::is_empty));
        assert_eq!(chart.width, ViewportWidth::Natural);
        assert!(chart.series.iter().all(|series| series.data.len() == 20));
    }

    #[test]
    fn long_sessions_are_not_padded() {
        let mut store = TimeSeriesStore::new();
        for minute in 0..25 {
            store
                .log_vitals(
                    &format!("10:{minute:02}"),
                    &VitalsReading::new().with(VitalField::Pulse, 80.0),
                )
                .unwrap();
        }
        let chart = project(&store);
        assert_eq!(chart.labels.len(), 25);
        assert!(chart.labels.iter().all(|label| !label.is_empty()));
        assert_eq!(chart.width, ViewportWidth::Pixels(25 * 40));
    }

    #[test]
    fn fixed_series_come_first_then_sorted_fluids() {
        let chart = project(&three_records());
        let labels: Vec<&str> = chart.series.iter().map(|series| series.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["SYS", "DIA", "MEAN", "PULSE", "SpO2", "ETCO2", "BT", "RR", "ISO", "LRS", "NaCl"]
        );
        assert_eq!(chart.series[8].axis, AxisId::Gas);
        assert_eq!(chart.series[9].axis, AxisId::FluidRate);
        assert_eq!(chart.series[9].color, FLUID_COLORS[0]);
        assert_eq!(chart.series[10].color, FLUID_COLORS[1]);
        assert!(chart.series.iter().all(|series| series.span_gaps));
    }

    #[test]
    fn mean_series_is_derived() {
        let chart = project(&three_records());
        assert_eq!(&chart.series[2].data[..3], [Some(93.0), None, None]);
    }

    #[test]
    fn fluid_series_have_gaps() {
        let chart = project(&three_records());
        assert_eq!(&chart.series[9].data[..3], [None, Some(50.0), None]);
    }

    #[test]
    fn selecting_a_vital_point_seeds_the_prompt() {
        let chart = project(&three_records());
        let edit = chart.point_edit(ChartPoint { series: 0, slot: 0 }).unwrap();
        assert_eq!(edit.title, "Edit SYS at 10:00");
        assert_eq!(edit.current, Some(120.0));
        assert_eq!(
            edit.target,
            EditTarget::Vital {
                index: 0,
                field: VitalField::Systolic
            }
        );
    }

    #[test]
    fn fluid_points_route_by_channel_name() {
        let chart = project(&three_records());
        let edit = chart.point_edit(ChartPoint { series: 10, slot: 1 }).unwrap();
        assert_eq!(
            edit.target,
            EditTarget::Fluid {
                index: 1,
                channel: "NaCl".to_string()
            }
        );
        assert_eq!(edit.current, Some(10.0));
    }

    #[test]
    fn padding_and_mean_points_are_inert() {
        let chart = project(&three_records());
        assert_eq!(chart.point_edit(ChartPoint { series: 0, slot: 3 }), None);
        assert_eq!(chart.point_edit(ChartPoint { series: 2, slot: 0 }), None);
        assert_eq!(chart.point_edit(ChartPoint { series: 42, slot: 0 }), None);
    }

    #[test]
    fn rr_series_is_its_own_channel() {
        let store = TimeSeriesStore::from_records(vec![
            TimeRecord::new("10:00").with(VitalField::Rr, 12.0),
        ]);
        let chart = project(&store);
        let edit = chart.point_edit(ChartPoint { series: 7, slot: 0 }).unwrap();
        assert_eq!(
            edit.target,
            EditTarget::Vital {
                index: 0,
                field: VitalField::Rr
            }
        );
        assert_eq!(edit.current, Some(12.0));
    }
}
