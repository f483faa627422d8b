//! Flat-file export of targeted-panel datasets.

pub mod csv_export;
pub mod error;

pub use csv_export::{ExportOptions, export_dataset, export_unified_csv};
pub use error::{ExportError, Result};
