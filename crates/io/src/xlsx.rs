// Plain XLSX ledger export (values only, no styling)

use std::path::Path;

use rust_xlsxwriter::{Workbook as XlsxWorkbook, Worksheet};
use taskledger_recon::LedgerReport;

use crate::table::{ledger_rows, summary_lines, Cell, LEDGER_HEADERS};

pub const DASHBOARD_SHEET: &str = "Dashboard";

/// Write the summary block followed by the ledger table to one sheet.
pub fn export(report: &LedgerReport, path: &Path) -> Result<(), String> {
    let mut xlsx_workbook = XlsxWorkbook::new();

    let worksheet = xlsx_workbook
        .add_worksheet()
        .set_name(DASHBOARD_SHEET)
        .map_err(|e| format!("Failed to create sheet '{}': {}", DASHBOARD_SHEET, e))?;
    write_dashboard(worksheet, report)?;

    xlsx_workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;
    Ok(())
}

fn write_dashboard(worksheet: &mut Worksheet, report: &LedgerReport) -> Result<(), String> {
    worksheet
        .write_string(0, 0, &report.meta.config_name)
        .map_err(|e| format!("Failed to write title: {}", e))?;
    if let Some(last) = report.meta.last_report_at {
        let label = format!("Last report {}", last.format("%d/%m/%Y"));
        worksheet
            .write_string(0, 2, &label)
            .map_err(|e| format!("Failed to write title: {}", e))?;
    }

    let mut row: u32 = 2;
    for (label, value) in summary_lines(report) {
        worksheet
            .write_string(row, 0, label)
            .map_err(|e| format!("Failed to write summary: {}", e))?;
        write_cell(worksheet, row, 1, &value)?;
        row += 1;
    }

    row += 1;
    for (col, header) in LEDGER_HEADERS.iter().enumerate() {
        worksheet
            .write_string(row, col as u16, *header)
            .map_err(|e| format!("Failed to write header: {}", e))?;
    }

    for cells in ledger_rows(report) {
        row += 1;
        for (col, cell) in cells.iter().enumerate() {
            write_cell(worksheet, row, col as u16, cell)?;
        }
    }
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<(), String> {
    let written = match cell {
        Cell::Text(s) if s.is_empty() => return Ok(()),
        Cell::Text(s) => worksheet.write_string(row, col, s),
        Cell::Int(n) => worksheet.write_number(row, col, *n as f64),
        Cell::Float(f) => worksheet.write_number(row, col, *f),
    };
    written
        .map(|_| ())
        .map_err(|e| format!("Failed to write cell ({row}, {col}): {e}"))
}
