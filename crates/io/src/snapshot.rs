// Snapshot document loading (JSON written by the table-extraction step)

use std::path::Path;

use taskledger_recon::{DocumentInput, SnapshotDocument, SnapshotError};

use crate::csv::read_file_as_utf8;

/// Load one snapshot document. An empty `source` is filled with the file name.
pub fn load(path: &Path) -> Result<SnapshotDocument, String> {
    let content = read_file_as_utf8(path)?;
    let mut doc = SnapshotDocument::from_json(&content)
        .map_err(|e| format!("{}: {e}", path.display()))?;
    if doc.source.trim().is_empty() {
        doc.source = display_name(path);
    }
    Ok(doc)
}

/// Load for a run: a failure becomes a skipped document, not an error.
pub fn load_input(path: &Path) -> DocumentInput {
    match load(path) {
        Ok(doc) => DocumentInput::Loaded(doc),
        Err(e) => {
            log::warn!("cannot load snapshot {}: {e}", path.display());
            DocumentInput::Failed {
                source: display_name(path),
                error: SnapshotError::Extraction(e),
            }
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
