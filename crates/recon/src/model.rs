use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Where a raw row came from inside its snapshot document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowProvenance {
    pub source: String,
    pub page: u32,
    pub table: usize,
    pub row: usize,
}

/// One row of text cells as handed over by the table-extraction collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub cells: Vec<Option<String>>,
    pub provenance: RowProvenance,
}

impl RawRow {
    pub fn new(cells: Vec<Option<String>>) -> Self {
        Self {
            cells,
            provenance: RowProvenance::default(),
        }
    }

    pub fn with_provenance(mut self, provenance: RowProvenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// Trimmed cell text; missing and null cells read as "".
    pub fn cell(&self, idx: usize) -> &str {
        self.cells
            .get(idx)
            .and_then(|c| c.as_deref())
            .map(str::trim)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A table grid from one page.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTable {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub rows: Vec<Vec<Option<String>>>,
}

/// One snapshot document as produced by the extraction collaborator.
///
/// `header_text` is the page-one text (report date lives there); `tables` are the
/// grids found on every page. Page one is reserved for header metadata, so its
/// tables are never read as task rows.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SnapshotDocument {
    pub source: String,
    #[serde(default)]
    pub header_text: Option<String>,
    #[serde(default)]
    pub tables: Vec<RawTable>,
}

impl SnapshotDocument {
    /// Parse the JSON interchange form written by the extraction step.
    pub fn from_json(input: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(input).map_err(|e| SnapshotError::Extraction(e.to_string()))
    }

    /// Task-table rows in document order, tagged with provenance.
    pub fn task_rows(&self) -> Vec<RawRow> {
        let mut rows = Vec::new();
        for (table_idx, table) in self.tables.iter().enumerate() {
            if table.page <= 1 {
                continue;
            }
            for (row_idx, cells) in table.rows.iter().enumerate() {
                rows.push(RawRow::new(cells.clone()).with_provenance(RowProvenance {
                    source: self.source.clone(),
                    page: table.page,
                    table: table_idx,
                    row: row_idx,
                }));
            }
        }
        rows
    }

    pub fn has_task_tables(&self) -> bool {
        self.tables.iter().any(|t| t.page > 1)
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OPEN")]
    Open,
    #[serde(rename = "CLOSED")]
    Closed,
    #[serde(rename = "WAIT APPROVAL", alias = "WAIT_APPROVAL")]
    WaitApproval,
    #[serde(rename = "POSTPONED")]
    Postponed,
    #[serde(rename = "REPLANEJADO")]
    Replanejado,
    #[serde(rename = "RETIRADA")]
    Retirada,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Open,
        Status::Closed,
        Status::WaitApproval,
        Status::Postponed,
        Status::Replanejado,
        Status::Retirada,
    ];

    /// Order in which embedded status tokens are searched for in a text blob.
    /// Multi-word tokens come first so "WAIT APPROVAL" is never cut short.
    pub const SCAN_ORDER: [Status; 6] = [
        Status::WaitApproval,
        Status::Replanejado,
        Status::Postponed,
        Status::Closed,
        Status::Open,
        Status::Retirada,
    ];

    /// Spelling used in the source documents and in rendered output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::WaitApproval => "WAIT APPROVAL",
            Self::Postponed => "POSTPONED",
            Self::Replanejado => "REPLANEJADO",
            Self::Retirada => "RETIRADA",
        }
    }

    /// Parse a status token exactly as it appears in a cell.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "OPEN" => Some(Self::Open),
            "CLOSED" => Some(Self::Closed),
            "WAIT APPROVAL" | "WAIT_APPROVAL" => Some(Self::WaitApproval),
            "POSTPONED" => Some(Self::Postponed),
            "REPLANEJADO" => Some(Self::Replanejado),
            "RETIRADA" => Some(Self::Retirada),
            _ => None,
        }
    }

    /// Paused states: the task is off the active list but not done.
    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Postponed | Self::Replanejado)
    }

    /// Statuses the withdrawal pass leaves alone.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Closed | Self::Retirada)
    }

    /// Statuses for which an entry must carry a ClosedAt date.
    pub fn carries_closed_at(&self) -> bool {
        matches!(
            self,
            Self::Closed | Self::Postponed | Self::Replanejado | Self::Retirada
        )
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Which fields correlate a task across snapshots.
///
/// `Seq` survives GROUP drift between snapshots (a task re-filed from "Finding"
/// to "Customer Report" stays the same entry); `GroupSeq` keeps two tasks apart
/// when different groups reuse a SEQ number. The two produce different UniqueIDs
/// and must not be mixed within one ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKey {
    #[default]
    Seq,
    GroupSeq,
}

impl IdentityKey {
    pub fn unique_id(&self, group: &str, seq: u32) -> UniqueId {
        match self {
            Self::Seq => UniqueId(seq.to_string()),
            Self::GroupSeq => UniqueId(format!("{group}_{seq}")),
        }
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Seq => write!(f, "seq"),
            Self::GroupSeq => write!(f, "group_seq"),
        }
    }
}

/// Serialized identity key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueId(pub String);

impl UniqueId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UniqueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A reconstructed task fragment, SEQ already coerced, STATUS not yet defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateRecord {
    pub phase: Option<String>,
    pub seq: u32,
    pub group: String,
    pub description: String,
    pub status: Option<Status>,
    pub external_task: Option<String>,
    pub orig: Option<String>,
}

/// One consolidated task per identity key per snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRecord {
    pub phase: Option<String>,
    pub seq: u32,
    pub group: String,
    pub description: String,
    pub status: Status,
    pub external_task: Option<String>,
    pub orig: Option<String>,
}

impl TaskRecord {
    pub fn unique_id(&self, identity: IdentityKey) -> UniqueId {
        identity.unique_id(&self.group, self.seq)
    }
}

/// A document's consolidated records stamped with its report timestamp.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub source: String,
    pub taken_at: NaiveDateTime,
    pub records: Vec<TaskRecord>,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub unique_id: UniqueId,
    pub phase: Option<String>,
    pub seq: u32,
    pub group: String,
    pub description: String,
    pub status: Status,
    pub external_task: Option<String>,
    pub orig: Option<String>,
    pub opened_at: NaiveDateTime,
    pub last_updated_at: NaiveDateTime,
    /// Closed, paused or withdrawn as of this instant.
    pub closed_at: Option<NaiveDateTime>,
}

impl LedgerEntry {
    /// Whole days open: up to ClosedAt when set, otherwise up to `now`.
    pub fn age_days(&self, now: NaiveDateTime) -> i64 {
        let end = self.closed_at.unwrap_or(now);
        (end - self.opened_at).num_days().max(0)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One rendered ledger line, in the order the presentation layer lays out columns.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerRow {
    pub unique_id: UniqueId,
    pub group: String,
    pub seq: u32,
    pub description: String,
    pub status: Status,
    pub external_task: Option<String>,
    pub orig: Option<String>,
    pub opened_at: NaiveDateTime,
    pub closed_at: Option<NaiveDateTime>,
    pub closed_at_display: String,
    pub last_updated_at: NaiveDateTime,
    pub age_days: i64,
    pub is_new: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimilarPair {
    pub left: usize,
    pub right: usize,
    pub score: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    pub wait_approval: usize,
    pub postponed: usize,
    pub replanejado: usize,
    pub retirada: usize,
    pub new_entries: usize,
    pub similar_entries: usize,
    /// (CLOSED + RETIRADA) / total, 0 for an empty ledger.
    pub completion_ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedDocument {
    pub source: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub identity: IdentityKey,
    pub engine_version: String,
    pub run_at: String,
    pub snapshots_applied: usize,
    pub last_report_at: Option<NaiveDateTime>,
}

/// Everything the presentation renderer needs.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerReport {
    pub meta: RunMeta,
    pub summary: LedgerSummary,
    pub rows: Vec<LedgerRow>,
    pub similar_pairs: Vec<SimilarPair>,
    pub skipped: Vec<SkippedDocument>,
}

impl LedgerReport {
    pub fn new_ids(&self) -> BTreeSet<UniqueId> {
        self.rows
            .iter()
            .filter(|r| r.is_new)
            .map(|r| r.unique_id.clone())
            .collect()
    }
}
