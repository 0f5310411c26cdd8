//! Read-only views derived from the vitals store.
//!
//! Neither the chart nor the history table ever writes to the store. User
//! edits made through them come back as an [`EditTarget`] which the session
//! forwards to the store.

pub mod axis;
pub mod chart;
pub mod history_table;

use crate::timeseries::record::VitalField;

/// A single editable value of the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditTarget {
    Vital { index: usize, field: VitalField },
    Fluid { index: usize, channel: String },
}

impl EditTarget {
    pub fn index(&self) -> usize {
        match self {
            EditTarget::Vital { index, .. } | EditTarget::Fluid { index, .. } => *index,
        }
    }
}
