//! `tledger run | inspect | validate`

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use taskledger_io::{prior, snapshot, ExportFormat};
use taskledger_recon::{DocumentInput, LedgerConfig, LedgerError, LedgerReport, Pipeline};

use crate::CliError;

fn processing_time() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

fn load_config(path: Option<&Path>) -> Result<LedgerConfig, CliError> {
    let Some(path) = path else {
        return Ok(LedgerConfig::default());
    };
    LedgerConfig::from_path(path).map_err(|e| match e {
        LedgerError::Io(msg) => CliError::io(msg),
        other => CliError::config(format!("{}: {other}", path.display()))
            .with_hint("run `tledger validate <CONFIG>` for details"),
    })
}

fn build_pipeline(config_path: Option<&Path>) -> Result<Pipeline, CliError> {
    let config = load_config(config_path)?;
    Pipeline::new(config).map_err(|e| CliError::config(e.to_string()))
}

pub fn cmd_run(
    snapshots: Vec<PathBuf>,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    prior_path: Option<PathBuf>,
    json_output: bool,
) -> Result<(), CliError> {
    if let Some(ref out) = output {
        if ExportFormat::from_path(out).is_none() {
            return Err(CliError::args(format!(
                "unsupported output format: {}",
                out.display()
            ))
            .with_hint("use a .xlsx, .csv or .json output file"));
        }
    }

    let pipeline = build_pipeline(config_path.as_deref())?;
    let identity = pipeline.config().identity;

    // The previous run's output doubles as the prior ledger.
    let prior_path = prior_path.or_else(|| output.clone().filter(|p| p.exists()));
    let prior_ids = match prior_path {
        Some(ref path) => prior::read_prior_ids_or_empty(path, identity),
        None => BTreeSet::new(),
    };

    let documents: Vec<DocumentInput> = snapshots.iter().map(|p| snapshot::load_input(p)).collect();
    let report = pipeline.run(documents, &prior_ids, processing_time());

    if report.meta.snapshots_applied == 0 {
        return Err(CliError::no_records(format!(
            "none of the {} snapshot documents yielded task records",
            snapshots.len()
        )));
    }

    // Stdout and the summary come first so a failed render still leaves the
    // computed ledger with the caller.
    if json_output {
        let json_str = taskledger_io::json::to_string(&report)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }
    print_summary(&report);

    if let Some(ref path) = output {
        taskledger_io::export(&report, path).map_err(|e| {
            CliError::render(format!("cannot write {}: {e}", path.display()))
                .with_hint("the ledger was computed; rerun with --json or another --output")
        })?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn print_summary(report: &LedgerReport) {
    let s = &report.summary;
    eprintln!(
        "{} tasks from {} snapshots ({} skipped): {} open, {} wait approval, {} closed, {} paused, {} withdrawn; {} new, {} possible duplicates; {:.1}% complete",
        s.total,
        report.meta.snapshots_applied,
        report.skipped.len(),
        s.open,
        s.wait_approval,
        s.closed,
        s.postponed + s.replanejado,
        s.retirada,
        s.new_entries,
        s.similar_entries,
        s.completion_ratio * 100.0,
    );
    for skipped in &report.skipped {
        eprintln!("  skipped {}: {}", skipped.source, skipped.reason);
    }
}

pub fn cmd_inspect(snapshot_path: PathBuf, config_path: Option<PathBuf>) -> Result<(), CliError> {
    let pipeline = build_pipeline(config_path.as_deref())?;
    let doc = snapshot::load(&snapshot_path).map_err(CliError::io)?;
    let inspection = pipeline.inspect(&doc, processing_time());

    let json_str = serde_json::to_string_pretty(&inspection)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
    println!("{json_str}");
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let pipeline = build_pipeline(Some(&config_path))?;
    let config = pipeline.config();
    eprintln!(
        "config OK: \"{}\" (identity {}, {} groups, similarity threshold {})",
        config.name,
        config.identity,
        config.valid_groups.len(),
        config.similarity.threshold
    );
    Ok(())
}
