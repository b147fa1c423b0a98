// Prior ledger reading: only the identity keys are needed (for the NEW flag)

use std::collections::BTreeSet;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use taskledger_recon::{IdentityKey, UniqueId};

use crate::table::{GROUP_HEADER, SEQ_HEADER};

/// UniqueIDs of every task in a previously written ledger (.xlsx or .csv).
pub fn read_prior_ids(path: &Path, identity: IdentityKey) -> Result<BTreeSet<UniqueId>, String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let grid = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_workbook(path)?,
        "csv" => crate::csv::read_records(path)?,
        _ => return Err(format!("unsupported prior ledger format: {}", path.display())),
    };
    ids_from_grid(&grid, identity)
}

/// Same as [`read_prior_ids`], degrading any failure to "no prior state".
pub fn read_prior_ids_or_empty(path: &Path, identity: IdentityKey) -> BTreeSet<UniqueId> {
    match read_prior_ids(path, identity) {
        Ok(ids) => {
            log::info!("prior ledger {}: {} tasks", path.display(), ids.len());
            ids
        }
        Err(e) => {
            log::warn!("prior ledger unreadable, every task counts as new: {e}");
            BTreeSet::new()
        }
    }
}

/// First sheet that carries a SEQ header row, as text.
fn read_workbook(path: &Path) -> Result<Vec<Vec<String>>, String> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| format!("Failed to open Excel file: {}", e))?;
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;
        let grid: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        if header_position(&grid).is_some() {
            return Ok(grid);
        }
    }
    Err(format!("{}: no sheet has a {SEQ_HEADER} column", path.display()))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn header_position(grid: &[Vec<String>]) -> Option<usize> {
    grid.iter()
        .position(|row| row.iter().any(|c| c.trim().eq_ignore_ascii_case(SEQ_HEADER)))
}

fn column(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|c| c.trim().eq_ignore_ascii_case(name))
}

fn ids_from_grid(grid: &[Vec<String>], identity: IdentityKey) -> Result<BTreeSet<UniqueId>, String> {
    let header_idx =
        header_position(grid).ok_or_else(|| format!("no {SEQ_HEADER} header row found"))?;
    let header = &grid[header_idx];
    let seq_col = column(header, SEQ_HEADER)
        .ok_or_else(|| format!("no {SEQ_HEADER} header row found"))?;
    let group_col = column(header, GROUP_HEADER);
    if identity == IdentityKey::GroupSeq && group_col.is_none() {
        return Err(format!("{GROUP_HEADER} column required for group_seq identity"));
    }

    let mut ids = BTreeSet::new();
    for row in &grid[header_idx + 1..] {
        let seq = match row.get(seq_col).and_then(|s| s.trim().parse::<u32>().ok()) {
            Some(n) if n > 0 => n,
            _ => continue,
        };
        let group = group_col
            .and_then(|c| row.get(c))
            .map(|g| g.trim())
            .unwrap_or("");
        if identity == IdentityKey::GroupSeq && group.is_empty() {
            continue;
        }
        ids.insert(identity.unique_id(group, seq));
    }
    Ok(ids)
}
