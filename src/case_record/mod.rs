//! Everything on the anesthesia record besides the vitals timeline.

pub mod dosing;
pub mod patient;

use dosing::{DrugRow, EpiduralRow, FluidRow};
use patient::PatientFields;

/// Patient metadata, administration rows and notes of one case.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CaseRecord {
    pub patient: PatientFields,
    pub drugs: Vec<DrugRow>,
    pub fluids: Vec<FluidRow>,
    pub epidurals: Vec<EpiduralRow>,
    pub notes: String,
}

impl CaseRecord {
    /// A fresh record: one blank row in each administration table.
    pub fn with_default_rows(time: &str) -> Self {
        CaseRecord {
            drugs: vec![DrugRow::new(time)],
            fluids: vec![FluidRow::default()],
            epidurals: vec![EpiduralRow::default()],
            ..CaseRecord::default()
        }
    }

    /// Dose totals of the drug rows, in row order.
    pub fn drug_totals(&self) -> Vec<String> {
        let weight = self.patient.weight_kg();
        self.drugs.iter().map(|row| row.total(weight)).collect()
    }

    pub fn epidural_totals(&self) -> Vec<String> {
        let weight = self.patient.weight_kg();
        self.epidurals.iter().map(|row| row.total(weight)).collect()
    }

    pub fn is_blank(&self) -> bool {
        self.patient.is_blank()
            && self.notes.trim().is_empty()
            && self.drugs.iter().all(DrugRow::is_blank)
            && self.fluids.iter().all(FluidRow::is_blank)
            && self.epidurals.iter().all(EpiduralRow::is_blank)
    }
}
