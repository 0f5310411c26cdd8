//! Anesthesia monitoring record: the vitals timeline of a case, the chart and
//! history table derived from it, and the rest of the paper record around it.

pub mod case_record;
pub mod config;
pub mod error;
pub mod export;
pub mod persistence;
pub mod projection;
pub mod session;
pub mod timer;
pub mod timeseries;

pub use config::MonitorConfig;
pub use error::{ConfigError, ExportError, PersistenceError, SessionError, StoreError};
pub use session::{ChartRenderer, Clock, DerivedViews, Session, SystemClock};
pub use timeseries::record::{TimeRecord, VitalField, VitalsReading};
pub use timeseries::store::{Logged, TimeSeriesStore};
