use crate::projection::EditTarget;
use crate::timeseries::channels::ChannelRegistry;
use crate::timeseries::record::VitalField;
use crate::timeseries::store::TimeSeriesStore;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Time,
    Vital(VitalField),
    Mean,
    Fluid(String),
    Action,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub header: String,
    pub kind: ColumnKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Text(String),
    /// A number input; an empty value means nothing recorded.
    Input { value: String, target: EditTarget },
    Delete { index: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistoryRow {
    /// Index of the record in the store.
    pub index: usize,
    pub cells: Vec<Cell>,
}

/// The vitals history, most recent record first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoryTable {
    pub columns: Vec<Column>,
    pub rows: Vec<HistoryRow>,
}

fn header(field: VitalField) -> &'static str {
    match field {
        VitalField::Iso => "ISO %",
        other => other.label(),
    }
}

fn format_value(value: Option<f64>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

impl HistoryTable {
    pub fn project(store: &TimeSeriesStore, channels: &ChannelRegistry) -> Self {
        let mut columns = vec![Column {
            header: "Time".to_string(),
            kind: ColumnKind::Time,
        }];
        for field in VitalField::ALL {
            columns.push(Column {
                header: header(field).to_string(),
                kind: ColumnKind::Vital(field),
            });
            if field == VitalField::Diastolic {
                columns.push(Column {
                    header: "MEAN".to_string(),
                    kind: ColumnKind::Mean,
                });
            }
        }
        columns.extend(channels.names().iter().map(|name| Column {
            header: format!("{name} (ml/hr)"),
            kind: ColumnKind::Fluid(name.clone()),
        }));
        columns.push(Column {
            header: "Action".to_string(),
            kind: ColumnKind::Action,
        });

        let rows = store
            .iter()
            .enumerate()
            .rev()
            .map(|(index, record)| {
                let cells = columns
                    .iter()
                    .map(|column| match &column.kind {
                        ColumnKind::Time => Cell::Text(record.time().to_string()),
                        ColumnKind::Vital(field) => Cell::Input {
                            value: format_value(record.get(*field)),
                            target: EditTarget::Vital {
                                index,
                                field: *field,
                            },
                        },
                        ColumnKind::Mean => Cell::Text(
                            record
                                .mean()
                                .map(|mean| mean.to_string())
                                .unwrap_or_else(|| "--".to_string()),
                        ),
                        ColumnKind::Fluid(channel) => Cell::Input {
                            value: format_value(record.fluid(channel)),
                            target: EditTarget::Fluid {
                                index,
                                channel: channel.clone(),
                            },
                        },
                        ColumnKind::Action => Cell::Delete { index },
                    })
                    .collect();
                HistoryRow { index, cells }
            })
            .collect();

        HistoryTable { columns, rows }
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.header.as_str()).collect()
    }
}
