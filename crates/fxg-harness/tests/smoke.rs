use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use fxg_harness::run_log::RunLogEntry;
use fxg_harness::{
    HarnessConfig, generate_expected, generate_inputs, load_manifest, set_run_log_path,
    verify_manifest, write_manifest,
};
use fxg_io::MatrixFileFormat;

fn temp_root(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    std::env::temp_dir().join(format!("fxg_harness_{name}_{nanos}"))
}

fn config(root: &Path, families: &[&str]) -> HarnessConfig {
    HarnessConfig {
        input_root: root.join("inputs"),
        output_root: root.join("expected"),
        format: MatrixFileFormat::ArmaAscii,
        family_filter: families.iter().map(|f| (*f).to_string()).collect(),
        read_inputs_from_disk: false,
    }
}

#[test]
fn generated_fixtures_verify_against_manifest() {
    let root = temp_root("verify");
    let cfg = config(&root, &["Generation", "SymPdMat"]);

    let report = generate_expected(&cfg).expect("generation runs");
    assert_eq!(report.runs.len(), 3);
    assert!(report.written() > 0);
    assert_eq!(report.written(), report.artifacts.len());

    let manifest_path = write_manifest(&cfg, &report).expect("manifest written");
    assert!(manifest_path.exists());
    let manifest = load_manifest(&cfg).expect("manifest loads");
    assert_eq!(manifest.format, "arma_ascii");
    assert_eq!(manifest.artifacts.len(), report.artifacts.len());
    assert!(
        manifest
            .artifacts
            .iter()
            .any(|a| a.file == "SymPdMat.chol(Hilbert3x3).mat")
    );

    let verified = verify_manifest(&cfg).expect("verification runs");
    assert_eq!(verified.suite, "fixture_manifest");
    assert!(verified.all_passed(), "{:?}", verified.failures);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn tampered_and_missing_artifacts_fail_verification() {
    let root = temp_root("tamper");
    let cfg = config(&root, &["SymPdMat"]);

    let report = generate_expected(&cfg).expect("generation runs");
    write_manifest(&cfg, &report).expect("manifest written");
    assert!(report.artifacts.len() >= 2);

    let tampered = &report.artifacts[0];
    fs::write(&tampered.path, "ARMA_MAT_TXT_FN008\n1 1\n4.2e1\n").expect("tamper");
    let removed = &report.artifacts[1];
    fs::remove_file(&removed.path).expect("remove");

    let verified = verify_manifest(&cfg).expect("verification runs");
    assert!(!verified.all_passed());
    assert_eq!(verified.pass_count, verified.case_count - 2);
    assert!(
        verified
            .failures
            .iter()
            .any(|f| f.starts_with(&tampered.file) && f.contains("sha256 mismatch"))
    );
    assert!(
        verified
            .failures
            .iter()
            .any(|f| f.starts_with(&removed.file) && f.ends_with("missing"))
    );

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn inputs_read_from_disk_reproduce_in_memory_fixtures() {
    let root = temp_root("from_disk");
    let memory_cfg = config(&root.join("memory"), &["SymPdMat", "InvMatGenColVec"]);
    let mut disk_cfg = config(&root.join("disk"), &["SymPdMat", "InvMatGenColVec"]);
    disk_cfg.read_inputs_from_disk = true;

    let err = generate_expected(&disk_cfg).expect_err("inputs not generated yet");
    assert!(err.contains("generate_inputs"));

    let count = generate_inputs(&disk_cfg).expect("inputs written");
    assert!(count > 0);

    let from_memory = generate_expected(&memory_cfg).expect("memory run");
    let from_disk = generate_expected(&disk_cfg).expect("disk run");
    write_manifest(&memory_cfg, &from_memory).expect("memory manifest");
    write_manifest(&disk_cfg, &from_disk).expect("disk manifest");

    let memory_manifest = load_manifest(&memory_cfg).expect("memory manifest loads");
    let disk_manifest = load_manifest(&disk_cfg).expect("disk manifest loads");
    assert_eq!(memory_manifest, disk_manifest);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn unmatched_family_filter_is_an_error() {
    let root = temp_root("no_match");
    let cfg = config(&root, &["NoSuchFamily"]);
    let err = generate_expected(&cfg).expect_err("filter matches nothing");
    assert!(err.contains("NoSuchFamily"));
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn run_log_records_each_family() {
    let root = temp_root("run_log");
    let log_path = root.join("logs/run.jsonl");
    set_run_log_path(Some(log_path.clone()));

    let mut cfg = config(&root, &["Generation"]);
    cfg.format = MatrixFileFormat::RawAscii;
    generate_expected(&cfg).expect("generation runs");
    set_run_log_path(None);

    let raw = fs::read_to_string(&log_path).expect("log written");
    let entries: Vec<RunLogEntry> = raw
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid jsonl"))
        .collect();
    // Other tests in this binary may append while the path is set.
    let ours: Vec<_> = entries
        .iter()
        .filter(|e| e.family == "Generation" && e.format == "raw_ascii")
        .collect();
    assert_eq!(ours.len(), 2);
    assert!(ours.iter().any(|e| e.prefix == "NumRowsNumCols"));
    assert!(ours.iter().all(|e| e.tuple_count > 0));

    let _ = fs::remove_dir_all(&root);
}
