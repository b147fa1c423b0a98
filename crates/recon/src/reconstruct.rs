use serde::Serialize;

use crate::classify::{normalize_whitespace, RowClass, RowFragment, TokenClassifier};
use crate::model::{CandidateRecord, RawRow};

/// Per-document row accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconstructStats {
    pub rows: usize,
    pub header_rows: usize,
    pub new_tasks: usize,
    pub continuations: usize,
    pub discarded: usize,
    pub malformed: usize,
    pub seq_dropped: usize,
}

#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub records: Vec<CandidateRecord>,
    pub stats: ReconstructStats,
}

/// Fold state for one document: the task waiting for continuation rows and the
/// fragments already closed off.
#[derive(Default)]
struct Accumulator {
    buffer: Option<RowFragment>,
    emitted: Vec<RowFragment>,
    stats: ReconstructStats,
}

impl Accumulator {
    fn flush(mut self) -> (Vec<RowFragment>, ReconstructStats) {
        if let Some(last) = self.buffer.take() {
            self.emitted.push(last);
        }
        (self.emitted, self.stats)
    }
}

pub struct RowReconstructor<'a> {
    classifier: &'a TokenClassifier,
}

impl<'a> RowReconstructor<'a> {
    pub fn new(classifier: &'a TokenClassifier) -> Self {
        Self { classifier }
    }

    /// Rebuild task records from one document's rows, in order.
    pub fn reconstruct(&self, rows: &[RawRow]) -> Reconstruction {
        let acc = rows
            .iter()
            .fold(Accumulator::default(), |acc, row| self.step(acc, row));
        let (fragments, mut stats) = acc.flush();

        let records = fragments
            .into_iter()
            .filter_map(|f| match finalize(f) {
                Ok(record) => Some(record),
                Err(seq) => {
                    log::debug!("dropping record with unusable SEQ '{seq}'");
                    stats.seq_dropped += 1;
                    None
                }
            })
            .collect();

        Reconstruction { records, stats }
    }

    fn step(&self, mut acc: Accumulator, row: &RawRow) -> Accumulator {
        acc.stats.rows += 1;

        if self.classifier.is_header_row(row) {
            acc.stats.header_rows += 1;
            return acc;
        }

        match self.classifier.classify(row, acc.buffer.is_some()) {
            RowClass::NewTask(fragment) => {
                acc.stats.new_tasks += 1;
                if let Some(previous) = acc.buffer.replace(fragment) {
                    acc.emitted.push(previous);
                }
            }
            RowClass::Continuation(text) => {
                if let Some(buffer) = acc.buffer.as_mut() {
                    acc.stats.continuations += 1;
                    if buffer.description.is_empty() {
                        buffer.description = text;
                    } else {
                        buffer.description.push(' ');
                        buffer.description.push_str(&text);
                    }
                }
            }
            RowClass::Discarded { text, reason } => {
                acc.stats.discarded += 1;
                let preview: String = text.chars().take(100).collect();
                log::warn!(
                    "{} p{} r{}: continuation ignored ({reason}): '{preview}'",
                    row.provenance.source,
                    row.provenance.page,
                    row.provenance.row
                );
            }
            RowClass::Blank => {}
            RowClass::Malformed => {
                acc.stats.malformed += 1;
            }
        }
        acc
    }
}

/// Coerce SEQ and normalize text. `Err` carries the rejected SEQ text.
fn finalize(fragment: RowFragment) -> Result<CandidateRecord, String> {
    let seq = match normalize_whitespace(&fragment.seq).parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => return Err(fragment.seq),
    };

    Ok(CandidateRecord {
        phase: normalize_optional(fragment.phase),
        seq,
        group: normalize_whitespace(&fragment.group),
        description: normalize_whitespace(&fragment.description),
        status: fragment.status,
        external_task: normalize_optional(fragment.external_task),
        orig: normalize_optional(fragment.orig),
    })
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| normalize_whitespace(&v))
        .filter(|v| !v.is_empty())
}
