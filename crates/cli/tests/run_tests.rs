// Integration tests for `tledger run | inspect | validate`.
// Run with: cargo test -p taskledger-cli --test run_tests -- --nocapture

use std::path::PathBuf;
use std::process::{Command, Output};

fn tledger() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tledger"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn all_reports() -> Vec<String> {
    ["report_0701.json", "report_0601.json", "report_0615.json"]
        .iter()
        .map(|n| fixture(n))
        .collect()
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("stdout must be valid JSON: {e}\n{stdout}"))
}

fn assert_exit(output: &Output, code: i32) {
    assert_eq!(
        output.status.code(),
        Some(code),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn run_json_to_stdout() {
    let output = tledger()
        .arg("run")
        .args(all_reports())
        .args(["--json", "-q"])
        .output()
        .expect("tledger run --json");
    assert_exit(&output, 0);

    let report = stdout_json(&output);
    assert_eq!(report["meta"]["snapshots_applied"], 3);
    assert_eq!(report["summary"]["total"], 6);
    let rows = report["rows"].as_array().unwrap();
    assert_eq!(rows[0]["seq"], 10);
    assert_eq!(rows[0]["status"], "OPEN");
    assert_eq!(rows[0]["closed_at"], serde_json::Value::Null);
}

#[test]
fn run_writes_each_output_format() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["ledger.xlsx", "ledger.csv", "ledger.json"] {
        let out = dir.path().join(name);
        let output = tledger()
            .arg("run")
            .args(all_reports())
            .arg("--output")
            .arg(&out)
            .output()
            .expect("tledger run --output");
        assert_exit(&output, 0);
        assert!(out.exists(), "{name} not written");
    }

    let csv = std::fs::read_to_string(dir.path().join("ledger.csv")).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("GROUP,SEQ,DESCRIPTION,STATUS"));
    assert_eq!(lines.count(), 6);
}

#[test]
fn second_run_reads_previous_output_as_prior() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("ledger.xlsx");

    let first = tledger()
        .arg("run")
        .arg(fixture("report_0601.json"))
        .arg("--output")
        .arg(&out)
        .output()
        .unwrap();
    assert_exit(&first, 0);

    let second = tledger()
        .arg("run")
        .args(all_reports())
        .arg("--output")
        .arg(&out)
        .arg("--json")
        .output()
        .unwrap();
    assert_exit(&second, 0);

    let report = stdout_json(&second);
    // Only SEQ 14 appeared after the first ledger was written.
    assert_eq!(report["summary"]["new_entries"], 1);
    let new: Vec<u64> = report["rows"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["is_new"] == true)
        .map(|r| r["seq"].as_u64().unwrap())
        .collect();
    assert_eq!(new, vec![14]);
}

#[test]
fn explicit_prior_that_is_missing_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let output = tledger()
        .arg("run")
        .arg(fixture("report_0601.json"))
        .arg("--prior")
        .arg(dir.path().join("nope.xlsx"))
        .arg("--json")
        .output()
        .unwrap();
    assert_exit(&output, 0);
    assert_eq!(stdout_json(&output)["summary"]["new_entries"], 5);
}

#[test]
fn unreadable_snapshot_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ nope").unwrap();

    let output = tledger()
        .arg("run")
        .arg(&broken)
        .arg(fixture("report_0601.json"))
        .arg("--json")
        .output()
        .unwrap();
    assert_exit(&output, 0);

    let report = stdout_json(&output);
    assert_eq!(report["skipped"][0]["source"], "broken.json");
    assert_eq!(report["meta"]["snapshots_applied"], 1);
}

#[test]
fn nothing_usable_exits_61() {
    let output = tledger()
        .args(["run", &fixture("no_tables.json")])
        .output()
        .unwrap();
    assert_exit(&output, 61);
}

#[test]
fn unsupported_output_extension_exits_2() {
    let output = tledger()
        .args(["run", &fixture("report_0601.json"), "--output", "ledger.pdf"])
        .output()
        .unwrap();
    assert_exit(&output, 2);
}

#[test]
fn unwritable_output_exits_62() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("no_such_dir").join("ledger.csv");
    let output = tledger()
        .arg("run")
        .arg(fixture("report_0601.json"))
        .arg("--output")
        .arg(&out)
        .arg("--json")
        .output()
        .unwrap();
    assert_exit(&output, 62);

    // The report still reaches stdout.
    let report = stdout_json(&output);
    assert_eq!(report["summary"]["total"], 5);
    assert_eq!(report["meta"]["snapshots_applied"], 1);
}

#[test]
fn no_snapshots_is_a_usage_error() {
    let output = tledger().arg("run").output().unwrap();
    assert_exit(&output, 2);
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

#[test]
fn group_seq_config_changes_ids() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("ledger.toml");
    std::fs::write(&config, "name = \"By group\"\nidentity = \"group_seq\"\n").unwrap();

    let output = tledger()
        .arg("run")
        .arg(fixture("report_0601.json"))
        .arg("--config")
        .arg(&config)
        .arg("--json")
        .output()
        .unwrap();
    assert_exit(&output, 0);

    let report = stdout_json(&output);
    assert_eq!(report["meta"]["config_name"], "By group");
    let ids: Vec<&str> = report["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["unique_id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"Finding_53"));
    assert!(ids.contains(&"Customer Report_53"));
}

#[test]
fn validate_accepts_good_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("ledger.toml");
    std::fs::write(
        &config,
        "[classifier]\nspillover_min_len = 30\n\n[similarity]\nthreshold = 95\n",
    )
    .unwrap();
    let output = tledger().arg("validate").arg(&config).output().unwrap();
    assert_exit(&output, 0);
    assert!(String::from_utf8_lossy(&output.stderr).contains("config OK"));
}

#[test]
fn validate_rejects_bad_pattern() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("ledger.toml");
    std::fs::write(&config, "[continuation]\ntask_code_pattern = \"(\"\n").unwrap();
    let output = tledger().arg("validate").arg(&config).output().unwrap();
    assert_exit(&output, 60);
    assert!(String::from_utf8_lossy(&output.stderr).contains("task_code_pattern"));
}

#[test]
fn validate_rejects_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("ledger.toml");
    std::fs::write(&config, "identity = \"seq\"\nsimilarity_threshold = 90\n").unwrap();
    let output = tledger().arg("validate").arg(&config).output().unwrap();
    assert_exit(&output, 60);
}

#[test]
fn validate_missing_file_exits_3() {
    let output = tledger()
        .args(["validate", "does/not/exist.toml"])
        .output()
        .unwrap();
    assert_exit(&output, 3);
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

#[test]
fn inspect_prints_consolidated_records() {
    let output = tledger()
        .args(["inspect", &fixture("report_0601.json")])
        .output()
        .unwrap();
    assert_exit(&output, 0);

    let inspection = stdout_json(&output);
    assert_eq!(inspection["source"], "Customer_Report_0601.pdf");
    assert_eq!(inspection["taken_at"], "2025-06-01T00:00:00");
    assert_eq!(inspection["records"].as_array().unwrap().len(), 5);
    assert_eq!(inspection["stats"]["header_rows"], 2);
    assert_eq!(inspection["stats"]["discarded"], 1);
    assert_eq!(inspection["stats"]["continuations"], 1);
}
