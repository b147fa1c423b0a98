// File I/O: snapshot documents in, prior ledgers in, rendered ledgers out

pub mod csv;
pub mod json;
pub mod prior;
pub mod snapshot;
pub mod table;
pub mod xlsx;

use std::path::Path;

use taskledger_recon::LedgerReport;

/// Output formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" => Some(Self::Xlsx),
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Render the report to `path` in the format its extension names.
pub fn export(report: &LedgerReport, path: &Path) -> Result<(), String> {
    match ExportFormat::from_path(path) {
        Some(ExportFormat::Xlsx) => xlsx::export(report, path),
        Some(ExportFormat::Csv) => csv::export(report, path),
        Some(ExportFormat::Json) => json::export(report, path),
        None => Err(format!(
            "unsupported output format: {} (expected .xlsx, .csv or .json)",
            path.display()
        )),
    }
}
