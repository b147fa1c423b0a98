use std::collections::HashMap;

use crate::config::LedgerConfig;
use crate::model::{CandidateRecord, IdentityKey, Status, TaskRecord, UniqueId};

/// GROUP values that win over whatever else a task's fragments say, best first.
const GROUP_PRIORITY: [&str; 3] = ["Customer Report", "SB/ADs", "Planned"];

/// Merges same-identity fragments of one snapshot into one record per task.
#[derive(Debug, Clone)]
pub struct RecordConsolidator {
    identity: IdentityKey,
    junk_markers: Vec<String>,
}

impl RecordConsolidator {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            identity: config.identity,
            junk_markers: config.consolidation.junk_markers.clone(),
        }
    }

    /// Output order follows the first appearance of each identity key.
    pub fn consolidate(&self, records: Vec<CandidateRecord>) -> Vec<TaskRecord> {
        let mut order: Vec<UniqueId> = Vec::new();
        let mut groups: HashMap<UniqueId, Vec<CandidateRecord>> = HashMap::new();

        for record in records {
            let key = self.identity.unique_id(&record.group, record.seq);
            groups
                .entry(key.clone())
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(record);
        }

        order
            .iter()
            .filter_map(|key| groups.remove(key))
            .map(|fragments| self.aggregate(fragments))
            .collect()
    }

    fn aggregate(&self, fragments: Vec<CandidateRecord>) -> TaskRecord {
        if fragments.len() > 1 {
            log::debug!(
                "consolidating {} fragments for SEQ {}",
                fragments.len(),
                fragments[0].seq
            );
        }

        TaskRecord {
            phase: first_present(fragments.iter().map(|f| &f.phase)),
            seq: fragments[0].seq,
            group: pick_group(&fragments),
            description: self.pick_description(&fragments),
            status: fragments
                .iter()
                .find_map(|f| f.status)
                .unwrap_or(Status::WaitApproval),
            external_task: first_present(fragments.iter().map(|f| &f.external_task)),
            orig: first_present(fragments.iter().map(|f| &f.orig)),
        }
    }

    /// Shortest description free of junk markers; the longest one when every
    /// candidate is junk.
    fn pick_description(&self, fragments: &[CandidateRecord]) -> String {
        let mut candidates: Vec<&str> = Vec::new();
        for f in fragments {
            let d = f.description.trim();
            if !d.is_empty() && !candidates.contains(&d) {
                candidates.push(d);
            }
        }

        let clean = candidates
            .iter()
            .filter(|d| !self.is_junk(d))
            .fold(None::<&str>, |best, d| match best {
                Some(b) if b.chars().count() <= d.chars().count() => Some(b),
                _ => Some(*d),
            });
        if let Some(d) = clean {
            return d.to_string();
        }

        candidates
            .iter()
            .fold(None::<&str>, |best, d| match best {
                Some(b) if b.chars().count() >= d.chars().count() => Some(b),
                _ => Some(*d),
            })
            .unwrap_or("")
            .to_string()
    }

    fn is_junk(&self, description: &str) -> bool {
        self.junk_markers
            .iter()
            .any(|marker| description.contains(marker.as_str()))
    }
}

fn pick_group(fragments: &[CandidateRecord]) -> String {
    for preferred in GROUP_PRIORITY {
        if fragments.iter().any(|f| f.group == preferred) {
            return preferred.to_string();
        }
    }
    fragments[0].group.clone()
}

fn first_present<'a>(values: impl Iterator<Item = &'a Option<String>>) -> Option<String> {
    values.flatten().find(|v| !v.is_empty()).cloned()
}
