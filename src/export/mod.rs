//! Exporting a case: JSON copies of the snapshot and the page plan of the
//! printable document.

pub mod files;
pub mod page_layout;

pub use files::{ExportKind, export_file_name, list_exports, write_json_export};
pub use page_layout::{DOCUMENT_TITLE, PageLayout, Placement, read_capture};
