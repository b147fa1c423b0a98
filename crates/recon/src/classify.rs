use regex::Regex;

use crate::config::{compile_pattern, LedgerConfig};
use crate::error::LedgerError;
use crate::model::{RawRow, Status};

const GROUP_FINDING: &str = "Finding";
const GROUP_SB_ADS: &str = "SB/ADs";
const GROUP_CUSTOMER_REPORT: &str = "Customer Report";

/// Column layout a task row was recognized under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskLayout {
    /// Issue number and SEQ both numeric; GROUP forced to "Finding".
    CriticalIssue,
    /// PHASE, SEQ, GROUP, DESCRIPTION, STATUS, EXTERNAL TASK, ORIG.
    Normal,
    /// Same as `Normal` with the PHASE column missing.
    Shifted,
}

/// Fields read off a single task row. SEQ is still raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFragment {
    pub layout: TaskLayout,
    pub phase: Option<String>,
    pub seq: String,
    pub group: String,
    pub description: String,
    pub status: Option<Status>,
    pub external_task: Option<String>,
    pub orig: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    TaskCode,
    RepeatedHeader,
}

impl std::fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskCode => write!(f, "looks like a new task code"),
            Self::RepeatedHeader => write!(f, "looks like a repeated table header"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowClass {
    NewTask(RowFragment),
    /// Text to append to the buffered task's description.
    Continuation(String),
    /// Continuation text rejected by a guard pattern.
    Discarded { text: String, reason: DiscardReason },
    /// A buffered task exists but the row carries no text.
    Blank,
    /// No rule matched and nothing is buffered.
    Malformed,
}

/// Row classification policy compiled from [`LedgerConfig`].
#[derive(Debug, Clone)]
pub struct TokenClassifier {
    valid_groups: Vec<String>,
    spillover_min_len: usize,
    header_signature: Vec<String>,
    regulatory_reference: Regex,
    task_code: Regex,
    repeated_header: Regex,
}

impl TokenClassifier {
    pub fn new(config: &LedgerConfig) -> Result<Self, LedgerError> {
        Ok(Self {
            valid_groups: config.valid_groups.clone(),
            spillover_min_len: config.classifier.spillover_min_len,
            header_signature: config.classifier.header_signature.clone(),
            regulatory_reference: compile_pattern(
                "classifier.regulatory_reference",
                &config.classifier.regulatory_reference,
            )?,
            task_code: compile_pattern(
                "continuation.task_code_pattern",
                &config.continuation.task_code_pattern,
            )?,
            repeated_header: compile_pattern(
                "continuation.header_pattern",
                &config.continuation.header_pattern,
            )?,
        })
    }

    /// A row is a table header when at least two signature tokens appear as
    /// whole cell values.
    pub fn is_header_row(&self, row: &RawRow) -> bool {
        let hits = self
            .header_signature
            .iter()
            .filter(|sig| (0..row.len()).any(|i| row.cell(i) == sig.as_str()))
            .count();
        hits >= 2
    }

    /// Classify one row. `buffered` tells whether a task is waiting for
    /// continuation text.
    pub fn classify(&self, row: &RawRow, buffered: bool) -> RowClass {
        let first_numeric = is_all_digit(row.cell(0));
        let second_numeric = is_all_digit(row.cell(1));

        let fragment = if first_numeric && second_numeric {
            Some(self.critical_issue(row))
        } else if second_numeric {
            Some(self.task(row, TaskLayout::Normal))
        } else if first_numeric {
            Some(self.task(row, TaskLayout::Shifted))
        } else {
            None
        };

        if let Some(mut fragment) = fragment {
            if fragment.status == Some(Status::Retirada) {
                log::warn!(
                    "{}: SEQ {} parsed as RETIRADA; withdrawal is assigned by the engine, treating as OPEN",
                    row_label(row),
                    fragment.seq
                );
                fragment.status = Some(Status::Open);
            }
            return RowClass::NewTask(fragment);
        }

        if !buffered {
            return RowClass::Malformed;
        }

        let text = continuation_text(row);
        if text.is_empty() {
            return RowClass::Blank;
        }
        if self.task_code.is_match(&text) {
            return RowClass::Discarded {
                text,
                reason: DiscardReason::TaskCode,
            };
        }
        if self.repeated_header.is_match(&text) {
            return RowClass::Discarded {
                text,
                reason: DiscardReason::RepeatedHeader,
            };
        }
        RowClass::Continuation(text)
    }

    fn critical_issue(&self, row: &RawRow) -> RowFragment {
        let mut description = row.cell(2).to_string();
        let status_text = row.cell(3);

        let status = match Status::from_token(status_text) {
            Some(status) => status,
            None => {
                if status_text.chars().count() > self.spillover_min_len {
                    description = join_nonempty([description.as_str(), status_text]);
                }
                Status::Open
            }
        };

        RowFragment {
            layout: TaskLayout::CriticalIssue,
            phase: None,
            seq: row.cell(1).to_string(),
            group: GROUP_FINDING.to_string(),
            description,
            status: Some(status),
            external_task: non_empty(row.cell(0)),
            orig: None,
        }
    }

    fn task(&self, row: &RawRow, layout: TaskLayout) -> RowFragment {
        // Index of the SEQ cell; everything else is relative to it.
        let base = match layout {
            TaskLayout::Shifted => 0,
            _ => 1,
        };
        let phase = match layout {
            TaskLayout::Normal => non_empty(row.cell(0)),
            _ => None,
        };
        let seq = row.cell(base).to_string();
        let group_cell = row.cell(base + 1);

        if self.valid_groups.iter().any(|g| g == group_cell) {
            return RowFragment {
                layout,
                phase,
                seq,
                group: group_cell.to_string(),
                description: row.cell(base + 2).to_string(),
                status: status_cell(row, base + 3),
                external_task: non_empty(row.cell(base + 4)),
                orig: non_empty(row.cell(base + 5)),
            };
        }

        let blob = normalize_whitespace(
            &(base + 1..row.len())
                .map(|i| row.cell(i))
                .filter(|c| !c.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        );
        let parsed = self.parse_blob(&blob);

        RowFragment {
            layout,
            phase,
            seq,
            group: parsed.group,
            description: parsed.description,
            status: Some(parsed.status),
            external_task: parsed.external_task,
            orig: None,
        }
    }

    /// Split a free-text row (GROUP column unrecognized) into its fields.
    fn parse_blob(&self, blob: &str) -> ParsedBlob {
        let (group, mut description) = if let Some(rest) = blob.strip_prefix(GROUP_SB_ADS) {
            (GROUP_SB_ADS, rest.trim().to_string())
        } else if let Some(rest) = blob.strip_prefix(GROUP_CUSTOMER_REPORT) {
            (GROUP_CUSTOMER_REPORT, rest.trim().to_string())
        } else {
            (GROUP_FINDING, blob.to_string())
        };

        let mut status = Status::Open;
        let mut external_task = None;

        for candidate in Status::SCAN_ORDER {
            let token = candidate.as_str();
            if let Some(pos) = rfind_word(&description, token) {
                let tail = description[pos + token.len()..].trim().to_string();
                description = description[..pos].trim().to_string();
                status = candidate;
                external_task = non_empty(&tail);
                break;
            }
        }

        if external_task.is_none() && group == GROUP_SB_ADS {
            external_task = self
                .regulatory_reference
                .find(&description)
                .map(|m| m.as_str().trim().to_string());
        }

        ParsedBlob {
            group: group.to_string(),
            description,
            status,
            external_task,
        }
    }
}

struct ParsedBlob {
    group: String,
    description: String,
    status: Status,
    external_task: Option<String>,
}

fn status_cell(row: &RawRow, idx: usize) -> Option<Status> {
    let text = normalize_whitespace(row.cell(idx));
    if text.is_empty() {
        return None;
    }
    let status = Status::from_token(&text);
    if status.is_none() {
        log::warn!("{}: unrecognized status '{}', leaving it unset", row_label(row), text);
    }
    status
}

/// Byte offset of the last occurrence of `word` bounded by whitespace or the
/// ends of `haystack`.
fn rfind_word(haystack: &str, word: &str) -> Option<usize> {
    haystack.rmatch_indices(word).map(|(pos, _)| pos).find(|&pos| {
        let before_ok = haystack[..pos]
            .chars()
            .next_back()
            .map_or(true, char::is_whitespace);
        let after_ok = haystack[pos + word.len()..]
            .chars()
            .next()
            .map_or(true, char::is_whitespace);
        before_ok && after_ok
    })
}

fn continuation_text(row: &RawRow) -> String {
    row.cells
        .iter()
        .flatten()
        .map(|c| c.replace('\n', " ").trim().to_string())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn row_label(row: &RawRow) -> String {
    let p = &row.provenance;
    format!("{} p{} t{} r{}", p.source, p.page, p.table, p.row)
}

pub(crate) fn is_all_digit(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

pub(crate) fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn join_nonempty<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
