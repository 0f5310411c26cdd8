use crate::error::StoreError;
use crate::timeseries::record::{RawNumber, TimeRecord, VitalField, VitalsReading};
use log::{debug, info};

/// Where a log action landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Logged {
    /// A new record was appended at this index.
    Appended(usize),
    /// The action merged into the existing record at this index because it
    /// carried the same time label.
    Merged(usize),
}

impl Logged {
    pub fn index(self) -> usize {
        match self {
            Logged::Appended(index) | Logged::Merged(index) => index,
        }
    }
}

/// The vitals timeline of one case.
///
/// Records are kept in the order they were logged and are never re-sorted.
/// Every reading of an instant lives in one `TimeRecord`, so inserting or
/// deleting an instant can never misalign the channels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeSeriesStore {
    records: Vec<TimeRecord>,
}

impl TimeSeriesStore {
    pub fn new() -> Self {
        TimeSeriesStore::default()
    }

    pub fn from_records(records: Vec<TimeRecord>) -> Self {
        TimeSeriesStore { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TimeRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&TimeRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimeRecord> {
        self.records.iter()
    }

    /// Logs the supplied vitals under `time`.
    ///
    /// When the most recent record carries the same label the reading merges
    /// into it: supplied fields overwrite, untouched ones keep their values.
    /// Otherwise a new record is appended with every unsupplied field absent.
    pub fn log_vitals(
        &mut self,
        time: &str,
        reading: &VitalsReading,
    ) -> Result<Logged, StoreError> {
        if reading.is_empty() {
            debug!("log vitals at {time} ignored, no field supplied");
            return Err(StoreError::EmptySubmission);
        }
        let logged = self.slot_for(time);
        let record = &mut self.records[logged.index()];
        for (field, value) in reading.iter() {
            record.set(field, Some(value));
        }
        Ok(logged)
    }

    /// Logs one fluid rate under `time`, merging into the most recent record
    /// when the label matches.
    pub fn log_fluid_pulse(
        &mut self,
        time: &str,
        channel: &str,
        raw_rate: &str,
    ) -> Result<Logged, StoreError> {
        let channel = channel.trim();
        let rate = RawNumber::parse(raw_rate).into_reading(channel, raw_rate)?;
        let rate = match rate {
            Some(rate) if !channel.is_empty() => rate,
            _ => {
                debug!("fluid pulse at {time} ignored, name or rate missing");
                return Err(StoreError::EmptySubmission);
            }
        };
        let logged = self.slot_for(time);
        self.records[logged.index()].set_fluid(channel, Some(rate));
        Ok(logged)
    }

    /// Overwrites one vital of an existing record. Empty text clears the
    /// field; non-numeric text is rejected and the field is left as it was.
    pub fn edit_field(
        &mut self,
        index: usize,
        field: VitalField,
        raw: &str,
    ) -> Result<(), StoreError> {
        self.check_index(index)?;
        let value = RawNumber::parse(raw).into_reading(field.key(), raw)?;
        self.records[index].set(field, value);
        Ok(())
    }

    /// Overwrites one fluid rate of an existing record. Empty text removes the
    /// channel from that record.
    pub fn edit_fluid(
        &mut self,
        index: usize,
        channel: &str,
        raw: &str,
    ) -> Result<(), StoreError> {
        self.check_index(index)?;
        let channel = channel.trim();
        if channel.is_empty() {
            debug!("fluid edit of record {index} ignored, no channel name");
            return Err(StoreError::EmptySubmission);
        }
        let rate = RawNumber::parse(raw).into_reading(channel, raw)?;
        self.records[index].set_fluid(channel, rate);
        Ok(())
    }

    /// Removes the record at `index`; later records shift down by one.
    pub fn delete_record(&mut self, index: usize) -> Result<TimeRecord, StoreError> {
        self.check_index(index)?;
        let removed = self.records.remove(index);
        info!("deleted vitals record {index} logged at {}", removed.time());
        Ok(removed)
    }

    fn check_index(&self, index: usize) -> Result<(), StoreError> {
        if index < self.records.len() {
            Ok(())
        } else {
            Err(StoreError::RecordOutOfRange {
                index,
                len: self.records.len(),
            })
        }
    }

    fn slot_for(&mut self, time: &str) -> Logged {
        match self.records.last() {
            Some(last) if last.time() == time => Logged::Merged(self.records.len() - 1),
            _ => {
                self.records.push(TimeRecord::new(time));
                info!("new vitals record at {time}");
                Logged::Appended(self.records.len() - 1)
            }
        }
    }
}
