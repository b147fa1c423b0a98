// CSV ledger export and raw record reading

use std::io::Read;
use std::path::Path;

use taskledger_recon::LedgerReport;

use crate::table::{ledger_rows, Cell, LEDGER_HEADERS};

/// Write the ledger table (header line plus one line per row).
pub fn export(report: &LedgerReport, path: &Path) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .map_err(|e| e.to_string())?;

    writer.write_record(LEDGER_HEADERS).map_err(|e| e.to_string())?;
    for row in ledger_rows(report) {
        let record: Vec<String> = row.iter().map(Cell::to_text).collect();
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}

/// Every record of a CSV file as trimmed strings, no header handling.
pub fn read_records(path: &Path) -> Result<Vec<Vec<String>>, String> {
    let content = read_file_as_utf8(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(&content))
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        records.push(record.iter().map(|f| f.trim().to_string()).collect());
    }
    Ok(records)
}

/// Spreadsheets saved in comma-decimal locales write `;`-separated files.
fn sniff_delimiter(content: &str) -> u8 {
    let first = content.lines().next().unwrap_or("");
    [b',', b';', b'\t']
        .into_iter()
        .max_by_key(|&d| first.bytes().filter(|&b| b == d).count())
        .filter(|&d| first.as_bytes().contains(&d))
        .unwrap_or(b',')
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            Ok(decoded.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::testutil::sample_report;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn export_writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        export(&sample_report(), &path).unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0][0], "GROUP");
        assert_eq!(records[0][11], "SIMILAR TO");
        assert_eq!(records[1][1], "1");
        assert_eq!(records[3][7], "Replanejado em 10/06/2025");
    }

    #[test]
    fn semicolon_files_are_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prior.csv");
        fs::write(&path, "GROUP;SEQ;STATUS\nPlanned;4;OPEN\n").unwrap();
        let records = read_records(&path).unwrap();
        assert_eq!(records[1], vec!["Planned", "4", "OPEN"]);
    }

    #[test]
    fn windows_1252_is_decoded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        // "Inspeção" in Windows-1252
        fs::write(&path, b"SEQ,DESCRIPTION\n1,Inspe\xe7\xe3o\n").unwrap();
        let records = read_records(&path).unwrap();
        assert_eq!(records[1][1], "Inspeção");
    }
}
