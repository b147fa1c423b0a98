use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use crate::engine::MasterLedger;
use crate::model::{LedgerEntry, LedgerRow, LedgerSummary, SimilarPair, Status, UniqueId};
use crate::similarity::{flagged_indices, similar_pairs};

/// Date format used wherever a bare date is rendered.
pub const DISPLAY_DATE: &str = "%d/%m/%Y";

/// What the ClosedAt column shows for an entry.
pub fn closed_at_display(status: Status, closed_at: Option<NaiveDateTime>) -> String {
    let date = closed_at.map(|d| d.format(DISPLAY_DATE).to_string());
    match (status, date) {
        (Status::Postponed | Status::Replanejado, Some(d)) => format!("Replanejado em {d}"),
        // The engine dates paused entries on insert, so this arm only sees
        // entries built outside the merge protocol.
        (Status::Postponed | Status::Replanejado, None) => "Replanejado".to_string(),
        (Status::Retirada, Some(d)) => format!("Retirada em {d}"),
        (Status::Retirada, None) => "Retirada".to_string(),
        (_, Some(d)) => d,
        (_, None) => String::new(),
    }
}

/// Rendered rows in SEQ order, with IsNew against the prior ledger's IDs.
pub fn build_rows(
    ledger: &MasterLedger,
    prior_ids: &BTreeSet<UniqueId>,
    now: NaiveDateTime,
) -> Vec<LedgerRow> {
    ledger
        .sorted_by_seq()
        .into_iter()
        .map(|entry| to_row(entry, prior_ids, now))
        .collect()
}

fn to_row(entry: &LedgerEntry, prior_ids: &BTreeSet<UniqueId>, now: NaiveDateTime) -> LedgerRow {
    LedgerRow {
        unique_id: entry.unique_id.clone(),
        group: entry.group.clone(),
        seq: entry.seq,
        description: entry.description.clone(),
        status: entry.status,
        external_task: entry.external_task.clone(),
        orig: entry.orig.clone(),
        opened_at: entry.opened_at,
        closed_at: entry.closed_at,
        closed_at_display: closed_at_display(entry.status, entry.closed_at),
        last_updated_at: entry.last_updated_at,
        age_days: entry.age_days(now),
        is_new: !prior_ids.contains(&entry.unique_id),
    }
}

/// Near-duplicate pairs over the rows' descriptions, indices into `rows`.
pub fn find_similar(rows: &[LedgerRow], threshold: u8) -> Vec<SimilarPair> {
    let descriptions: Vec<&str> = rows.iter().map(|r| r.description.as_str()).collect();
    similar_pairs(&descriptions, threshold)
}

/// Per-status counts and completion ratio.
pub fn compute_summary(rows: &[LedgerRow], pairs: &[SimilarPair]) -> LedgerSummary {
    let mut summary = LedgerSummary {
        total: rows.len(),
        similar_entries: flagged_indices(pairs).len(),
        ..LedgerSummary::default()
    };

    for row in rows {
        match row.status {
            Status::Open => summary.open += 1,
            Status::Closed => summary.closed += 1,
            Status::WaitApproval => summary.wait_approval += 1,
            Status::Postponed => summary.postponed += 1,
            Status::Replanejado => summary.replanejado += 1,
            Status::Retirada => summary.retirada += 1,
        }
        if row.is_new {
            summary.new_entries += 1;
        }
    }

    if summary.total > 0 {
        summary.completion_ratio = (summary.closed + summary.retirada) as f64 / summary.total as f64;
    }
    summary
}
