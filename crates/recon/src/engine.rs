use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::model::{IdentityKey, LedgerEntry, Snapshot, Status, TaskRecord, UniqueId};

/// What one snapshot merge did to the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub inserted: usize,
    pub updated: usize,
    pub withdrawn: usize,
    /// Entries whose ClosedAt was cleared because they came back active.
    pub reopened: usize,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// UniqueID → entry. Entries are never removed.
#[derive(Debug, Clone, Default)]
pub struct MasterLedger {
    entries: BTreeMap<UniqueId, LedgerEntry>,
}

impl MasterLedger {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &UniqueId) -> Option<&LedgerEntry> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.values()
    }

    /// Entries ordered by SEQ, ties by UniqueID.
    pub fn sorted_by_seq(&self) -> Vec<&LedgerEntry> {
        let mut out: Vec<&LedgerEntry> = self.entries.values().collect();
        out.sort_by(|a, b| a.seq.cmp(&b.seq).then_with(|| a.unique_id.cmp(&b.unique_id)));
        out
    }

    /// Entries whose ClosedAt presence disagrees with their status.
    pub fn closed_at_violations(&self) -> Vec<&UniqueId> {
        self.entries
            .values()
            .filter(|e| e.closed_at.is_some() != e.status.carries_closed_at())
            .map(|e| &e.unique_id)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Folds snapshots, oldest first, into the master ledger.
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    identity: IdentityKey,
    ledger: MasterLedger,
    snapshots_applied: usize,
    last_report_at: Option<NaiveDateTime>,
}

impl ReconciliationEngine {
    pub fn new(identity: IdentityKey) -> Self {
        Self {
            identity,
            ledger: MasterLedger::default(),
            snapshots_applied: 0,
            last_report_at: None,
        }
    }

    pub fn ledger(&self) -> &MasterLedger {
        &self.ledger
    }

    pub fn snapshots_applied(&self) -> usize {
        self.snapshots_applied
    }

    pub fn last_report_at(&self) -> Option<NaiveDateTime> {
        self.last_report_at
    }

    /// Merge one snapshot: withdraw what it no longer lists, then update or
    /// insert every record it does list.
    pub fn apply(&mut self, snapshot: &Snapshot) -> MergeStats {
        let ts = snapshot.taken_at;
        let mut stats = MergeStats::default();

        if let Some(last) = self.last_report_at {
            if ts < last {
                log::warn!(
                    "{}: report date {ts} is older than the previous snapshot ({last})",
                    snapshot.source
                );
            }
        }

        let present: BTreeSet<UniqueId> = snapshot
            .records
            .iter()
            .map(|r| r.unique_id(self.identity))
            .collect();

        // Decided against the pre-update key set.
        let absent: Vec<UniqueId> = self
            .ledger
            .entries
            .iter()
            .filter(|(id, e)| !present.contains(*id) && !e.status.is_settled())
            .map(|(id, _)| id.clone())
            .collect();

        for id in absent {
            if let Some(entry) = self.ledger.entries.get_mut(&id) {
                log::debug!("withdrawing {id} ({} → RETIRADA)", entry.status);
                entry.status = Status::Retirada;
                entry.closed_at = Some(ts);
                stats.withdrawn += 1;
            }
        }

        for record in &snapshot.records {
            let id = record.unique_id(self.identity);
            match self.ledger.entries.get_mut(&id) {
                Some(entry) => {
                    if update_entry(entry, record, ts) {
                        stats.reopened += 1;
                    }
                    stats.updated += 1;
                }
                None => {
                    self.ledger.entries.insert(id.clone(), new_entry(id, record, ts));
                    stats.inserted += 1;
                }
            }
        }

        self.snapshots_applied += 1;
        self.last_report_at = Some(self.last_report_at.map_or(ts, |last| last.max(ts)));

        log::info!(
            "{} @ {ts}: {} inserted, {} updated, {} withdrawn, {} reopened ({} entries)",
            snapshot.source,
            stats.inserted,
            stats.updated,
            stats.withdrawn,
            stats.reopened,
            self.ledger.len()
        );
        stats
    }

    /// End the run: CLOSED entries that somehow lack a ClosedAt take their
    /// LastUpdatedAt.
    pub fn finish(mut self) -> MasterLedger {
        for entry in self.ledger.entries.values_mut() {
            if entry.status == Status::Closed && entry.closed_at.is_none() {
                log::debug!("repairing ClosedAt for {}", entry.unique_id);
                entry.closed_at = Some(entry.last_updated_at);
            }
        }
        self.ledger
    }
}

fn new_entry(unique_id: UniqueId, record: &TaskRecord, ts: NaiveDateTime) -> LedgerEntry {
    LedgerEntry {
        unique_id,
        phase: record.phase.clone(),
        seq: record.seq,
        group: record.group.clone(),
        description: record.description.clone(),
        status: record.status,
        external_task: record.external_task.clone(),
        orig: record.orig.clone(),
        opened_at: ts,
        last_updated_at: ts,
        closed_at: record.status.carries_closed_at().then_some(ts),
    }
}

/// Overwrite the mutable fields and reconcile ClosedAt. Returns true when the
/// entry was reopened (ClosedAt cleared).
fn update_entry(entry: &mut LedgerEntry, record: &TaskRecord, ts: NaiveDateTime) -> bool {
    let old = entry.status;
    let new = record.status;

    entry.description = record.description.clone();
    entry.group = record.group.clone();
    entry.external_task = record.external_task.clone();
    entry.status = new;
    entry.last_updated_at = ts;

    if new.is_paused() && !old.is_paused() && entry.closed_at.is_none() {
        entry.closed_at = Some(ts);
    } else if new == Status::Closed && entry.closed_at.is_none() {
        entry.closed_at = Some(ts);
    } else if !new.carries_closed_at() && entry.closed_at.is_some() {
        entry.closed_at = None;
        return true;
    }
    false
}
