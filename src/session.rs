//! The controller of one open case.
//!
//! A `Session` owns the vitals store and the rest of the case record. Every
//! accepted change to the timeline runs the same pipeline before returning:
//! channels, chart and history table are derived again, the renderer redraws,
//! and the snapshot is saved. Refused changes touch nothing.

use crate::case_record::CaseRecord;
use crate::case_record::dosing::{DrugRow, EpiduralRow, FluidRow};
use crate::case_record::patient::FieldValue;
use crate::config::{ChartConfig, MonitorConfig, is_valid_time_format};
use crate::error::{SessionError, StoreError};
use crate::export::files::write_json_export;
use crate::persistence::snapshot::Snapshot;
use crate::persistence::storage::SnapshotStorage;
use crate::projection::EditTarget;
use crate::projection::chart::{ChartModel, ChartPoint, PointEdit};
use crate::projection::history_table::HistoryTable;
use crate::timer::CaseTimer;
use crate::timeseries::channels::ChannelRegistry;
use crate::timeseries::record::{RawNumber, TimeRecord, VitalField, VitalsReading};
use crate::timeseries::store::{Logged, TimeSeriesStore};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Source of the current time.
pub trait Clock {
    /// Wall-clock time, used for record labels and export names.
    fn local_now(&self) -> NaiveDateTime;
    /// Used by the case timer.
    fn utc_now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Draws the derived views. `animate` is only set for the first paint of a case.
pub trait ChartRenderer {
    fn render(&mut self, views: &DerivedViews, animate: bool);
}

/// Everything computed from the store for display.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedViews {
    pub channels: ChannelRegistry,
    pub chart: ChartModel,
    pub history: HistoryTable,
}

impl DerivedViews {
    pub fn derive(store: &TimeSeriesStore, config: &ChartConfig) -> Self {
        let channels = ChannelRegistry::derive(store);
        let chart = ChartModel::project(store, &channels, config);
        let history = HistoryTable::project(store, &channels);
        DerivedViews {
            channels,
            chart,
            history,
        }
    }
}

pub struct Session<R: ChartRenderer, S: SnapshotStorage> {
    config: MonitorConfig,
    store: TimeSeriesStore,
    case: CaseRecord,
    timer: CaseTimer,
    views: DerivedViews,
    renderer: R,
    storage: S,
    clock: Box<dyn Clock>,
}

fn refused(err: StoreError) -> SessionError {
    if err.is_silent() {
        debug!("change refused: {err}");
    } else {
        warn!("change refused: {err}");
    }
    SessionError::Store(err)
}

/// Formats `now` with `format`, or `HH:MM` when chrono can't render the format.
fn time_label(now: NaiveDateTime, format: &str) -> String {
    if is_valid_time_format(format) {
        now.format(format).to_string()
    } else {
        warn!("time format '{format}' is unusable, labelling with HH:MM");
        now.format("%H:%M").to_string()
    }
}

fn row_out_of_range(table: &'static str, index: usize) -> SessionError {
    warn!("{table} row {index} does not exist");
    SessionError::RowOutOfRange { table, index }
}

impl<R: ChartRenderer, S: SnapshotStorage> Session<R, S> {
    /// Restores the saved case, or starts a fresh one when nothing usable was
    /// saved, and paints it.
    pub fn open(config: MonitorConfig, renderer: R, storage: S, clock: Box<dyn Clock>) -> Self {
        let label = time_label(clock.local_now(), &config.time_format);
        let (case, store) = match storage.load_snapshot() {
            Ok(Some(snapshot)) => {
                let (case, store) = snapshot.into_parts();
                info!("restored case with {} vitals records", store.len());
                (case, store)
            }
            Ok(None) => (CaseRecord::with_default_rows(&label), TimeSeriesStore::new()),
            Err(err) => {
                warn!("saved case is unreadable, starting empty: {err}");
                (CaseRecord::with_default_rows(&label), TimeSeriesStore::new())
            }
        };
        let timer = match storage.load_timer() {
            Ok(state) => state.map(CaseTimer::from_state).unwrap_or_default(),
            Err(err) => {
                warn!("saved timer is unreadable, resetting it: {err}");
                CaseTimer::default()
            }
        };

        let views = DerivedViews::derive(&store, &config.chart);
        let mut session = Session {
            config,
            store,
            case,
            timer,
            views,
            renderer,
            storage,
            clock,
        };
        session.renderer.render(&session.views, true);
        session
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn store(&self) -> &TimeSeriesStore {
        &self.store
    }

    pub fn case(&self) -> &CaseRecord {
        &self.case
    }

    pub fn timer(&self) -> &CaseTimer {
        &self.timer
    }

    pub fn views(&self) -> &DerivedViews {
        &self.views
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.case, &self.store)
    }

    /// The label a record logged now would carry.
    pub fn time_label(&self) -> String {
        time_label(self.clock.local_now(), &self.config.time_format)
    }

    pub fn log_vitals(&mut self, reading: &VitalsReading) -> Result<Logged, SessionError> {
        let time = self.time_label();
        let logged = self.store.log_vitals(&time, reading).map_err(refused)?;
        self.refresh();
        Ok(logged)
    }

    pub fn log_fluid_pulse(
        &mut self,
        channel: &str,
        raw_rate: &str,
    ) -> Result<Logged, SessionError> {
        let time = self.time_label();
        let logged = self
            .store
            .log_fluid_pulse(&time, channel, raw_rate)
            .map_err(refused)?;
        self.refresh();
        Ok(logged)
    }

    /// Logs the infusion row as a fluid pulse, then clears its rate.
    pub fn log_fluid_row(&mut self, row: usize) -> Result<Logged, SessionError> {
        let FluidRow { name, rate } = self
            .case
            .fluids
            .get(row)
            .cloned()
            .ok_or_else(|| row_out_of_range("fluids", row))?;
        let time = self.time_label();
        let logged = self
            .store
            .log_fluid_pulse(&time, &name, &rate)
            .map_err(refused)?;
        self.case.fluids[row].rate.clear();
        self.refresh();
        Ok(logged)
    }

    pub fn edit_field(
        &mut self,
        index: usize,
        field: VitalField,
        raw: &str,
    ) -> Result<(), SessionError> {
        self.store.edit_field(index, field, raw).map_err(refused)?;
        self.refresh();
        Ok(())
    }

    pub fn edit_fluid(
        &mut self,
        index: usize,
        channel: &str,
        raw: &str,
    ) -> Result<(), SessionError> {
        self.store.edit_fluid(index, channel, raw).map_err(refused)?;
        self.refresh();
        Ok(())
    }

    /// Applies a value typed into a history table cell or a point prompt.
    pub fn apply_edit(&mut self, target: &EditTarget, raw: &str) -> Result<(), SessionError> {
        match target {
            EditTarget::Vital { index, field } => self.edit_field(*index, *field, raw),
            EditTarget::Fluid { index, channel } => self.edit_fluid(*index, channel, raw),
        }
    }

    pub fn delete_record(&mut self, index: usize) -> Result<TimeRecord, SessionError> {
        let removed = self.store.delete_record(index).map_err(refused)?;
        self.refresh();
        Ok(removed)
    }

    /// The edit prompt for a clicked chart point, if the point is editable.
    pub fn select_point(&self, point: ChartPoint) -> Option<PointEdit> {
        let edit = self.views.chart.point_edit(point);
        if edit.is_none() {
            debug!("{point} is not editable");
        }
        edit
    }

    /// An empty prompt leaves the point as it is. Clearing goes through the
    /// history table.
    pub fn commit_point_edit(&mut self, edit: &PointEdit, raw: &str) -> Result<(), SessionError> {
        if RawNumber::parse(raw) == RawNumber::Empty {
            return Err(refused(StoreError::EmptySubmission));
        }
        self.apply_edit(&edit.target, raw)
    }

    /// Returns `false` for ids that aren't part of the patient record.
    pub fn set_patient_field(&mut self, id: &str, value: FieldValue) -> bool {
        let known = self.case.patient.set(id, value);
        if known {
            self.persist();
        }
        known
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.case.notes = notes.into();
        self.persist();
    }

    /// Adds a blank drug row stamped with the current time.
    pub fn add_drug_row(&mut self) -> usize {
        let row = DrugRow::new(self.time_label());
        self.case.drugs.push(row);
        self.persist();
        self.case.drugs.len() - 1
    }

    pub fn set_drug_row(&mut self, index: usize, row: DrugRow) -> Result<(), SessionError> {
        let slot = self
            .case
            .drugs
            .get_mut(index)
            .ok_or_else(|| row_out_of_range("drugs", index))?;
        *slot = row;
        self.persist();
        Ok(())
    }

    pub fn remove_drug_row(&mut self, index: usize) -> Result<DrugRow, SessionError> {
        if index >= self.case.drugs.len() {
            return Err(row_out_of_range("drugs", index));
        }
        let removed = self.case.drugs.remove(index);
        self.persist();
        Ok(removed)
    }

    pub fn add_fluid_row(&mut self) -> usize {
        self.case.fluids.push(FluidRow::default());
        self.persist();
        self.case.fluids.len() - 1
    }

    pub fn set_fluid_row(&mut self, index: usize, row: FluidRow) -> Result<(), SessionError> {
        let slot = self
            .case
            .fluids
            .get_mut(index)
            .ok_or_else(|| row_out_of_range("fluids", index))?;
        *slot = row;
        self.persist();
        Ok(())
    }

    pub fn remove_fluid_row(&mut self, index: usize) -> Result<FluidRow, SessionError> {
        if index >= self.case.fluids.len() {
            return Err(row_out_of_range("fluids", index));
        }
        let removed = self.case.fluids.remove(index);
        self.persist();
        Ok(removed)
    }

    pub fn add_epidural_row(&mut self) -> usize {
        self.case.epidurals.push(EpiduralRow::default());
        self.persist();
        self.case.epidurals.len() - 1
    }

    pub fn set_epidural_row(&mut self, index: usize, row: EpiduralRow) -> Result<(), SessionError> {
        let slot = self
            .case
            .epidurals
            .get_mut(index)
            .ok_or_else(|| row_out_of_range("epidurals", index))?;
        *slot = row;
        self.persist();
        Ok(())
    }

    pub fn remove_epidural_row(&mut self, index: usize) -> Result<EpiduralRow, SessionError> {
        if index >= self.case.epidurals.len() {
            return Err(row_out_of_range("epidurals", index));
        }
        let removed = self.case.epidurals.remove(index);
        self.persist();
        Ok(removed)
    }

    /// Returns `false` if the timer was already running.
    pub fn start_timer(&mut self) -> bool {
        let started = self.timer.start(self.clock.utc_now());
        if started {
            self.persist_timer();
        }
        started
    }

    /// Returns `false` if the timer wasn't running.
    pub fn stop_timer(&mut self) -> bool {
        let stopped = self.timer.stop(self.clock.utc_now());
        if stopped {
            self.persist_timer();
        }
        stopped
    }

    /// Elapsed case time as `HH:MM:SS`.
    pub fn timer_display(&self) -> String {
        self.timer.display(self.clock.utc_now())
    }

    /// Saves the case, then writes a JSON copy into the export directory.
    /// `Ok(None)` when there is nothing to export.
    pub fn export_json(&mut self) -> Result<Option<PathBuf>, SessionError> {
        self.persist();
        let path = write_json_export(
            &self.config.storage.export_dir,
            &self.snapshot(),
            self.clock.local_now(),
        )?;
        Ok(path)
    }

    /// Forgets the whole case, saved documents included, and starts afresh.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        self.storage.clear()?;
        self.store = TimeSeriesStore::new();
        self.case = CaseRecord::with_default_rows(&self.time_label());
        self.timer = CaseTimer::default();
        self.views = DerivedViews::derive(&self.store, &self.config.chart);
        self.renderer.render(&self.views, true);
        info!("case cleared");
        Ok(())
    }

    fn refresh(&mut self) {
        self.views = DerivedViews::derive(&self.store, &self.config.chart);
        self.renderer.render(&self.views, false);
        self.persist();
    }

    fn persist(&mut self) {
        let snapshot = self.snapshot();
        if let Err(err) = self.storage.save_snapshot(&snapshot) {
            warn!("failed to save case: {err}");
        }
    }

    fn persist_timer(&mut self) {
        if let Err(err) = self.storage.save_timer(&self.timer.state()) {
            warn!("failed to save case timer: {err}");
        }
    }
}
