//! Saving and restoring a case.
//!
//! A case is written as two JSON documents: the snapshot of the record and
//! the vitals timeline, and the case timer. Loading never trusts the
//! documents: missing or damaged content degrades to absent values.

pub mod snapshot;
pub mod storage;

pub use snapshot::{Snapshot, VitalsColumns};
pub use storage::{FileStorage, MemoryStorage, SnapshotStorage, StorageKey};
