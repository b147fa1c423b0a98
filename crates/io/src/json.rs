// JSON report export

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use taskledger_recon::LedgerReport;

/// Export the whole report (meta, summary, rows, similar pairs, skipped documents).
pub fn export(report: &LedgerReport, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, report).map_err(|e| e.to_string())?;
    Ok(())
}

pub fn to_string(report: &LedgerReport) -> Result<String, String> {
    serde_json::to_string_pretty(report).map_err(|e| e.to_string())
}
