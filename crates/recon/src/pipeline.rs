use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::classify::TokenClassifier;
use crate::config::LedgerConfig;
use crate::consolidate::RecordConsolidator;
use crate::engine::ReconciliationEngine;
use crate::error::{LedgerError, SnapshotError};
use crate::evidence::{build_rows, compute_summary, find_similar};
use crate::header::report_timestamp;
use crate::model::{
    LedgerReport, RunMeta, SkippedDocument, Snapshot, SnapshotDocument, TaskRecord, UniqueId,
};
use crate::reconstruct::{ReconstructStats, RowReconstructor};

/// A document as it reaches the run: loaded, or already failed upstream.
#[derive(Debug, Clone)]
pub enum DocumentInput {
    Loaded(SnapshotDocument),
    Failed { source: String, error: SnapshotError },
}

impl DocumentInput {
    pub fn source(&self) -> &str {
        match self {
            Self::Loaded(doc) => &doc.source,
            Self::Failed { source, .. } => source,
        }
    }
}

/// One document's reconstruction, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInspection {
    pub source: String,
    pub taken_at: NaiveDateTime,
    pub stats: ReconstructStats,
    pub records: Vec<TaskRecord>,
}

/// Config-bound pipeline: classifier patterns are compiled once and reused
/// for every document of a run.
pub struct Pipeline {
    config: LedgerConfig,
    classifier: TokenClassifier,
    consolidator: RecordConsolidator,
}

impl Pipeline {
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        let classifier = TokenClassifier::new(&config)?;
        let consolidator = RecordConsolidator::new(&config);
        Ok(Self {
            config,
            classifier,
            consolidator,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Reconstruct and consolidate one document, even when it yields nothing.
    pub fn inspect(
        &self,
        doc: &SnapshotDocument,
        processed_at: NaiveDateTime,
    ) -> DocumentInspection {
        let rows = doc.task_rows();
        let reconstruction = RowReconstructor::new(&self.classifier).reconstruct(&rows);
        log::debug!(
            "{}: {} rows → {} candidate records ({:?})",
            doc.source,
            rows.len(),
            reconstruction.records.len(),
            reconstruction.stats
        );

        DocumentInspection {
            source: doc.source.clone(),
            taken_at: report_timestamp(doc.header_text.as_deref(), processed_at),
            stats: reconstruction.stats,
            records: self.consolidator.consolidate(reconstruction.records),
        }
    }

    /// Turn one document into a snapshot ready to merge.
    pub fn prepare(
        &self,
        doc: &SnapshotDocument,
        processed_at: NaiveDateTime,
    ) -> Result<Snapshot, SnapshotError> {
        if !doc.has_task_tables() {
            return Err(SnapshotError::NoTables);
        }
        let inspection = self.inspect(doc, processed_at);
        if inspection.records.is_empty() {
            return Err(SnapshotError::NoRecords);
        }
        Ok(Snapshot {
            source: inspection.source,
            taken_at: inspection.taken_at,
            records: inspection.records,
        })
    }

    /// Fold every usable document, oldest report first, into a fresh ledger
    /// and build the report. `now` is both the processing time for undated
    /// documents and the reference point for AgeDays.
    pub fn run(
        &self,
        documents: Vec<DocumentInput>,
        prior_ids: &BTreeSet<UniqueId>,
        now: NaiveDateTime,
    ) -> LedgerReport {
        let mut snapshots = Vec::new();
        let mut skipped = Vec::new();

        for input in documents {
            let outcome = match &input {
                DocumentInput::Loaded(doc) => self.prepare(doc, now),
                DocumentInput::Failed { error, .. } => Err(error.clone()),
            };
            match outcome {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(error) => {
                    log::warn!("skipping {}: {error}", input.source());
                    skipped.push(SkippedDocument {
                        source: input.source().to_string(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        // Stable: same-date snapshots keep their input order.
        snapshots.sort_by_key(|s| s.taken_at);

        let mut engine = ReconciliationEngine::new(self.config.identity);
        for snapshot in &snapshots {
            engine.apply(snapshot);
        }
        let snapshots_applied = engine.snapshots_applied();
        let last_report_at = engine.last_report_at();
        let ledger = engine.finish();

        let violations = ledger.closed_at_violations();
        if !violations.is_empty() {
            log::warn!("{} entries with inconsistent ClosedAt", violations.len());
        }

        let rows = build_rows(&ledger, prior_ids, now);
        let similar_pairs = find_similar(&rows, self.config.similarity.threshold);
        let summary = compute_summary(&rows, &similar_pairs);

        log::info!(
            "ledger: {} entries from {} snapshots ({} skipped), {} new, {} similar pairs",
            summary.total,
            snapshots_applied,
            skipped.len(),
            summary.new_entries,
            similar_pairs.len()
        );

        LedgerReport {
            meta: RunMeta {
                config_name: self.config.name.clone(),
                identity: self.config.identity,
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
                snapshots_applied,
                last_report_at,
            },
            summary,
            rows,
            similar_pairs,
            skipped,
        }
    }
}

/// Build a pipeline for `config` and run it once.
pub fn run(
    config: &LedgerConfig,
    documents: Vec<DocumentInput>,
    prior_ids: &BTreeSet<UniqueId>,
    now: NaiveDateTime,
) -> Result<LedgerReport, LedgerError> {
    Ok(Pipeline::new(config.clone())?.run(documents, prior_ids, now))
}
