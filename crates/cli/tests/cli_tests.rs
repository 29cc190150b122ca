// End-to-end tests for the divrecon binary: exit codes, stdout contract, files.
//
// Run with: cargo test -p divrecon-cli --test cli_tests -- --nocapture

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::tempdir;

fn divrecon() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_divrecon"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("DIVRECON_CONFIG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../recon/tests/fixtures").join(name)
}

fn run_q1(extra: &[&str]) -> Output {
    let custody = fixture("custody_q1.csv");
    let nbim = fixture("nbim_q1.csv");
    let mut args = vec!["run", custody.to_str().unwrap(), nbim.to_str().unwrap()];
    args.extend_from_slice(extra);
    divrecon().args(&args).output().expect("divrecon run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ===========================================================================
// divrecon run
// ===========================================================================

#[test]
fn run_prints_break_table_and_exits_one() {
    let output = run_q1(&[]);
    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 6, "stdout:\n{out}");
    assert_eq!(
        lines[0],
        "JOIN_KEY_EVENT,JOIN_KEY_ACCOUNT,BREAK_TYPE,COLUMN,CUSTODY_VALUE,NBIM_VALUE,REASON"
    );
    assert!(lines[1].starts_with("970345678,823456,missing_at_nbim,,"), "{}", lines[1]);
    assert!(lines[2].starts_with("980456789,823456,missing_at_custody,,"), "{}", lines[2]);
    assert!(lines[3].starts_with("960234567,712345,mismatch,GROSS_AMOUNT,100.00,100.02,"), "{}", lines[3]);
    assert!(lines[4].starts_with("991678901,712345,mismatch,PAY_DATE,2024-05-16,2024-05-15,"), "{}", lines[4]);
    assert!(lines[5].starts_with("991678901,712345,mismatch,TAX_RATE,"), "{}", lines[5]);

    assert!(stderr(&output).contains("5 breaks:"), "stderr: {}", stderr(&output));
}

#[test]
fn run_without_breaks_exits_zero() {
    let custody = fixture("custody_q1.csv");
    let output = divrecon()
        .args(["run", custody.to_str().unwrap(), custody.to_str().unwrap()])
        .output()
        .unwrap();

    // Same file on both sides: custody headers resolve through the NBIM aliases.
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).lines().count(), 1);
    assert!(stderr(&output).contains("0 breaks:"));
}

#[test]
fn run_is_byte_identical_across_invocations() {
    let a = run_q1(&["--json"]);
    let b = run_q1(&["--json"]);
    assert_eq!(a.stdout, b.stdout);

    let a = run_q1(&[]);
    let b = run_q1(&[]);
    assert_eq!(a.stdout, b.stdout);
}

#[test]
fn run_json_is_single_report() {
    let output = run_q1(&["--json"]);
    assert_eq!(output.status.code(), Some(1));

    let out = stdout(&output);
    let val: serde_json::Value = serde_json::from_str(out.trim())
        .unwrap_or_else(|e| panic!("stdout must be valid JSON: {e}\n{out}"));

    let obj = val.as_object().expect("report must be an object");
    for key in ["meta", "summary", "duplicates", "date_orders", "breaks"] {
        assert!(obj.contains_key(key), "missing '{key}'");
    }
    assert_eq!(val["summary"]["total_breaks"], 5);
    assert_eq!(val["summary"]["matched_keys"], 4);
    assert_eq!(val["breaks"][0]["break_type"], "missing_at_nbim");
    assert_eq!(val["breaks"][2]["column"], "GROSS_AMOUNT");
}

#[test]
fn run_writes_output_and_context_files() {
    let dir = tempdir().unwrap();
    let breaks = dir.path().join("breaks.csv");
    let context = dir.path().join("groups.json");

    let output = run_q1(&[
        "--output",
        breaks.to_str().unwrap(),
        "--context",
        context.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    assert!(output.stdout.is_empty(), "stdout must stay empty with --output");

    let table = fs::read_to_string(&breaks).unwrap();
    assert_eq!(table.lines().count(), 6);

    let groups: serde_json::Value = serde_json::from_str(&fs::read_to_string(&context).unwrap()).unwrap();
    let groups = groups.as_array().expect("groups must be an array");
    assert_eq!(groups.len(), 4);
    assert_eq!(groups[0]["join_key"]["event"], "970345678");
    assert_eq!(groups[0]["breaks"][0]["category"], "missing_at_nbim");
    assert!(groups[0]["nbim"].is_null());
    assert_eq!(groups[3]["breaks"].as_array().unwrap().len(), 2);
}

#[test]
fn run_with_config_applies_tolerance_and_delimiter() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("wide.toml");
    fs::write(
        &config,
        "name = \"wide\"\n\n[tolerance]\nmoney = \"0.05\"\n\n[output]\ndelimiter = \";\"\n",
    )
    .unwrap();

    let output = run_q1(&["--config", config.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));

    let out = stdout(&output);
    assert!(out.starts_with("JOIN_KEY_EVENT;JOIN_KEY_ACCOUNT;"), "stdout:\n{out}");
    assert!(!out.contains("GROSS_AMOUNT"));
    assert_eq!(out.lines().count(), 5);
}

// ===========================================================================
// Failure exit codes
// ===========================================================================

#[test]
fn missing_input_file_is_usage_error() {
    let nbim = fixture("nbim_q1.csv");
    let output = divrecon()
        .args(["run", "does-not-exist.csv", nbim.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("custody file not found"));
}

#[test]
fn missing_column_exits_four() {
    let dir = tempdir().unwrap();
    let custody = dir.path().join("custody.csv");
    fs::write(&custody, "COAC_EVENT_KEY,BANK_ACCOUNTS\n1,A\n").unwrap();
    let nbim = fixture("nbim_q1.csv");

    let output = divrecon()
        .args(["run", custody.to_str().unwrap(), nbim.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    let err = stderr(&output);
    assert!(err.contains("custody: missing column for field ISIN"), "stderr: {err}");
    assert!(err.contains("hint:"));
    assert!(output.stdout.is_empty());
}

#[test]
fn empty_input_is_ingest_error() {
    let dir = tempdir().unwrap();
    let nbim = dir.path().join("nbim.csv");
    fs::write(&nbim, "").unwrap();
    let custody = fixture("custody_q1.csv");

    let output = divrecon()
        .args(["run", custody.to_str().unwrap(), nbim.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("nbim"));
}

#[test]
fn unsplittable_header_is_ingest_error() {
    let dir = tempdir().unwrap();
    let custody = dir.path().join("custody.txt");
    fs::write(&custody, "COAC_EVENT_KEY BANK_ACCOUNTS\nE1 A1\n").unwrap();
    let nbim = fixture("nbim_q1.csv");

    let output = divrecon()
        .args(["run", custody.to_str().unwrap(), nbim.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("custody: cannot ingest file: no delimiter"), "stderr: {err}");
    assert!(output.stdout.is_empty());
}

#[test]
fn invalid_config_exits_five() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    fs::write(&config, "[tolerance]\nmoney = \"-1\"\n").unwrap();

    let output = run_q1(&["--config", config.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("tolerance.money"));
}

#[test]
fn unknown_subcommand_is_usage_error() {
    let output = divrecon().arg("reconcile").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ===========================================================================
// divrecon validate / mapping
// ===========================================================================

#[test]
fn validate_accepts_good_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("q3.toml");
    fs::write(
        &config,
        "name = \"Q3 dividends\"\n\n[dates]\ndefault_order = \"month_first\"\n\n[aliases.nbim]\nGROSS_AMOUNT = [\"GROSS_QUOTE\"]\n",
    )
    .unwrap();

    let output = divrecon().args(["validate", config.to_str().unwrap()]).output().unwrap();
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("ok: \"Q3 dividends\""), "{out}");
    assert!(out.contains("month_first"));
}

#[test]
fn validate_rejects_unknown_alias_field() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    fs::write(&config, "[aliases.custody]\nNOT_A_FIELD = [\"X\"]\n").unwrap();

    let output = divrecon().args(["validate", config.to_str().unwrap()]).output().unwrap();
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("NOT_A_FIELD"));
}

#[test]
fn validate_reports_toml_syntax_errors() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("broken.toml");
    fs::write(&config, "[tolerance\nmoney = 1\n").unwrap();

    let output = divrecon().args(["validate", config.to_str().unwrap()]).output().unwrap();
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("config parse error"));
}

#[test]
fn mapping_lists_all_fields() {
    let output = divrecon().arg("mapping").output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.starts_with("FIELD"));
    assert!(out.contains("GROSS_AMOUNT_QUOTATION"));
    assert!(out.contains("aliases (custody):"));
    assert!(out.contains("aliases (nbim):"));
}

#[test]
fn mapping_json_includes_configured_aliases() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("aliases.toml");
    fs::write(&config, "[aliases.nbim]\nGROSS_AMOUNT = [\"GROSS_QUOTE\"]\n").unwrap();

    let output = divrecon()
        .args(["mapping", "--config", config.to_str().unwrap(), "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));

    let val: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(val["mapping"]["entries"].as_array().unwrap().len(), 15);
    assert_eq!(val["mapping"]["entries"][10]["type"], "money");

    let gross = val["aliases"]["nbim"]["GROSS_AMOUNT"].as_array().unwrap();
    assert_eq!(gross[0], "GROSS_AMOUNT_QUOTATION");
    assert_eq!(gross.last().unwrap(), "GROSS_QUOTE");
}
