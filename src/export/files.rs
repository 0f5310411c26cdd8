use crate::error::PersistenceError;
use crate::persistence::snapshot::Snapshot;
use chrono::NaiveDateTime;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const FILE_PREFIX: &str = "anesthesia_record_";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    Json,
    Pdf,
}

impl ExportKind {
    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Json => "json",
            ExportKind::Pdf => "pdf",
        }
    }
}

/// `anesthesia_record_YYYY-MM-DD_HH-MM.<ext>`, stamped with local time.
pub fn export_file_name(kind: ExportKind, now: NaiveDateTime) -> String {
    format!(
        "{FILE_PREFIX}{}.{}",
        now.format("%Y-%m-%d_%H-%M"),
        kind.extension()
    )
}

/// Writes the snapshot as pretty JSON into `dir`. A blank case has nothing to
/// export and returns `Ok(None)`.
pub fn write_json_export(
    dir: &Path,
    snapshot: &Snapshot,
    now: NaiveDateTime,
) -> Result<Option<PathBuf>, PersistenceError> {
    if snapshot.is_blank() {
        debug!("json export skipped, no data");
        return Ok(None);
    }
    let json = snapshot.to_json_pretty()?;
    fs::create_dir_all(dir).map_err(|source| PersistenceError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(export_file_name(ExportKind::Json, now));
    fs::write(&path, json).map_err(|source| PersistenceError::Io {
        path: path.clone(),
        source,
    })?;
    info!("exported case to {}", path.display());
    Ok(Some(path))
}

fn is_export(path: &Path) -> bool {
    let named = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(FILE_PREFIX));
    let kind = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == "json" || ext == "pdf");
    named && kind
}

/// Exported record files under `dir`, sorted by path. A missing directory
/// has no exports.
pub fn list_exports(dir: &Path) -> Vec<PathBuf> {
    let mut exports: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_export(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    exports.sort();
    exports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case_record::CaseRecord;
    use crate::timeseries::record::{TimeRecord, VitalField};
    use crate::timeseries::store::TimeSeriesStore;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 7)
            .unwrap()
            .and_hms_opt(hour, minute, 41)
            .unwrap()
    }

    fn snapshot() -> Snapshot {
        let store = TimeSeriesStore::from_records(vec![
            TimeRecord::new("09:05").with(VitalField::Spo2, 97.0),
        ]);
        Snapshot::capture(&CaseRecord::default(), &store)
    }

    #[test]
    fn file_names_are_zero_padded() {
        assert_eq!(
            export_file_name(ExportKind::Json, at(9, 5)),
            "anesthesia_record_2025-03-07_09-05.json"
        );
        assert_eq!(
            export_file_name(ExportKind::Pdf, at(14, 30)),
            "anesthesia_record_2025-03-07_14-30.pdf"
        );
    }

    #[test]
    fn blank_case_is_not_exported() {
        let dir = TempDir::new().unwrap();
        let written = write_json_export(dir.path(), &Snapshot::default(), at(9, 5)).unwrap();
        assert_eq!(written, None);
        assert!(list_exports(dir.path()).is_empty());
    }

    #[test]
    fn export_is_loadable() {
        let dir = TempDir::new().unwrap();
        let path = write_json_export(&dir.path().join("out"), &snapshot(), at(9, 5))
            .unwrap()
            .unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(Snapshot::from_json(&contents).unwrap(), snapshot());
    }

    #[test]
    fn lists_only_record_files() {
        let dir = TempDir::new().unwrap();
        write_json_export(dir.path(), &snapshot(), at(10, 0)).unwrap();
        write_json_export(dir.path(), &snapshot(), at(9, 0)).unwrap();
        fs::write(dir.path().join("anesthesia_record_2025-03-07_08-00.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("notes.json"), "{}").unwrap();
        fs::write(dir.path().join("anesthesia_record_draft.txt"), "").unwrap();

        let names: Vec<String> = list_exports(dir.path())
            .iter()
            .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
            .collect();
        assert_eq!(
            names,
            vec![
                "anesthesia_record_2025-03-07_08-00.pdf",
                "anesthesia_record_2025-03-07_09-00.json",
                "anesthesia_record_2025-03-07_10-00.json",
            ]
        );
        assert!(list_exports(&dir.path().join("missing")).is_empty());
    }
}
