// Ledger table layout shared by the CSV and XLSX writers

use std::collections::BTreeMap;

use taskledger_recon::evidence::DISPLAY_DATE;
use taskledger_recon::LedgerReport;

/// Ledger table columns, left to right.
pub const LEDGER_HEADERS: [&str; 12] = [
    "GROUP",
    "SEQ",
    "DESCRIPTION",
    "STATUS",
    "EXTERNAL TASK",
    "ORIG",
    "OPENED",
    "CLOSED",
    "LAST UPDATED",
    "AGE (DAYS)",
    "NEW",
    "SIMILAR TO",
];

pub const SEQ_HEADER: &str = "SEQ";
pub const GROUP_HEADER: &str = "GROUP";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
}

impl Cell {
    pub fn to_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Int(n) => n.to_string(),
            Cell::Float(f) => format!("{f:.4}"),
        }
    }
}

/// One line per ledger row, cells in [`LEDGER_HEADERS`] order.
pub fn ledger_rows(report: &LedgerReport) -> Vec<Vec<Cell>> {
    // Row index → SEQs of the rows it was paired with.
    let mut partners: BTreeMap<usize, Vec<u32>> = BTreeMap::new();
    for pair in &report.similar_pairs {
        if let (Some(left), Some(right)) = (report.rows.get(pair.left), report.rows.get(pair.right)) {
            partners.entry(pair.left).or_default().push(right.seq);
            partners.entry(pair.right).or_default().push(left.seq);
        }
    }

    report
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let similar = partners
                .get(&idx)
                .map(|seqs| {
                    seqs.iter()
                        .map(|s| s.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();

            vec![
                Cell::Text(row.group.clone()),
                Cell::Int(i64::from(row.seq)),
                Cell::Text(row.description.clone()),
                Cell::Text(row.status.to_string()),
                Cell::Text(row.external_task.clone().unwrap_or_default()),
                Cell::Text(row.orig.clone().unwrap_or_default()),
                Cell::Text(row.opened_at.format(DISPLAY_DATE).to_string()),
                Cell::Text(row.closed_at_display.clone()),
                Cell::Text(row.last_updated_at.format(DISPLAY_DATE).to_string()),
                Cell::Int(row.age_days),
                Cell::Text(if row.is_new { "NEW".into() } else { String::new() }),
                Cell::Text(similar),
            ]
        })
        .collect()
}

/// Label/value pairs for the summary block above the table.
pub fn summary_lines(report: &LedgerReport) -> Vec<(&'static str, Cell)> {
    let s = &report.summary;
    let count = |n: usize| Cell::Int(n as i64);
    vec![
        ("Total tasks", count(s.total)),
        ("OPEN", count(s.open)),
        ("WAIT APPROVAL", count(s.wait_approval)),
        ("CLOSED", count(s.closed)),
        ("POSTPONED", count(s.postponed)),
        ("REPLANEJADO", count(s.replanejado)),
        ("RETIRADA", count(s.retirada)),
        ("New since last ledger", count(s.new_entries)),
        ("Possible duplicates", count(s.similar_entries)),
        ("Completion", Cell::Float(s.completion_ratio)),
    ]
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::collections::BTreeSet;

    use chrono::{NaiveDate, NaiveDateTime};
    use taskledger_recon::model::RawTable;
    use taskledger_recon::{DocumentInput, LedgerConfig, LedgerReport, Pipeline, SnapshotDocument};

    pub fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 20)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn cells(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|c| c.map(str::to_string)).collect()
    }

    /// Three tasks, two of them near-duplicates, on 10/06/2025.
    pub fn sample_report() -> LedgerReport {
        let doc = SnapshotDocument {
            source: "sample.pdf".into(),
            header_text: Some("Today 10/06/2025".into()),
            tables: vec![RawTable {
                page: 2,
                rows: vec![
                    cells(&[None, Some("1"), Some("Planned"), Some("Replace bracket assembly"), Some("OPEN"), Some("WO-1"), Some("MRO")]),
                    cells(&[None, Some("2"), Some("Finding"), Some("Replace bracket assembly."), Some("CLOSED"), None, None]),
                    cells(&[None, Some("3"), Some("SB/ADs"), Some("Inspect fuel line"), Some("POSTPONED"), None, None]),
                ],
            }],
        };
        let prior = BTreeSet::from([taskledger_recon::UniqueId("1".into())]);
        Pipeline::new(LedgerConfig::default())
            .unwrap()
            .run(vec![DocumentInput::Loaded(doc)], &prior, now())
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::sample_report;
    use super::*;

    #[test]
    fn rows_follow_header_order() {
        let rows = ledger_rows(&sample_report());
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.len() == LEDGER_HEADERS.len()));

        let first: Vec<String> = rows[0].iter().map(Cell::to_text).collect();
        assert_eq!(
            first,
            vec![
                "Planned",
                "1",
                "Replace bracket assembly",
                "OPEN",
                "WO-1",
                "MRO",
                "10/06/2025",
                "",
                "10/06/2025",
                "10",
                "",
                "2",
            ]
        );
    }

    #[test]
    fn closed_and_paused_display() {
        let rows = ledger_rows(&sample_report());
        assert_eq!(rows[1][7], Cell::Text("10/06/2025".into()));
        assert_eq!(rows[1][10], Cell::Text("NEW".into()));
        assert_eq!(rows[1][11], Cell::Text("1".into()));
        assert_eq!(rows[2][7], Cell::Text("Replanejado em 10/06/2025".into()));
        assert_eq!(rows[2][11], Cell::Text(String::new()));
    }

    #[test]
    fn summary_block() {
        let lines = summary_lines(&sample_report());
        let total = lines.iter().find(|(label, _)| *label == "Total tasks").unwrap();
        assert_eq!(total.1, Cell::Int(3));
        let completion = lines.iter().find(|(label, _)| *label == "Completion").unwrap();
        assert_eq!(completion.1.to_text(), "0.3333");
    }
}
