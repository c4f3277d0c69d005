//! Tests for the `ocr2md` binary.
//!
//! None of these reach the network: they cover argument handling, setup
//! failures and the empty-folder run.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "MISTRAL_API_KEY",
    "MISTRAL_API_BASE",
    "OCR2MD_MODEL",
    "OCR2MD_INPUT_DIR",
    "OCR2MD_DONE_DIR",
    "OCR2MD_OUTPUT_DIR",
    "OCR2MD_SIGNED_URL_EXPIRY_HOURS",
    "OCR2MD_REQUEST_TIMEOUT_SECS",
    "RUST_LOG",
];

/// The binary, run inside `dir` with a clean environment.
fn ocr2md(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ocr2md").unwrap();
    cmd.current_dir(dir.path());
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn help_lists_environment_variables() {
    let dir = TempDir::new().unwrap();
    ocr2md(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("MISTRAL_API_KEY"))
        .stdout(predicate::str::contains("OCR2MD_INPUT_DIR"));
}

#[test]
fn version_flag_prints_name() {
    let dir = TempDir::new().unwrap();
    ocr2md(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ocr2md"));
}

#[test]
fn unknown_argument_is_rejected() {
    let dir = TempDir::new().unwrap();
    ocr2md(&dir).arg("--input").arg("x").assert().failure();
}

#[test]
fn missing_api_key_exits_non_zero() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("pdfs_to_process")).unwrap();
    std::fs::write(dir.path().join("pdfs_to_process").join("a.pdf"), b"%PDF-1.4").unwrap();

    ocr2md(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("MISTRAL_API_KEY"));

    assert!(dir.path().join("pdfs_to_process").join("a.pdf").exists());
    assert!(!dir.path().join("pdfs-done").exists());
}

#[test]
fn empty_input_folder_reports_nothing_to_do() {
    let dir = TempDir::new().unwrap();

    ocr2md(&dir)
        .env("MISTRAL_API_KEY", "dummy-key-123")
        .assert()
        .success()
        .stdout(predicate::str::contains("No PDFs found in pdfs_to_process"))
        .stderr(predicate::str::contains("dumm..."))
        .stderr(predicate::str::contains("dummy-key-123").not());

    for folder in ["pdfs_to_process", "pdfs-done", "ocr_output"] {
        assert!(dir.path().join(folder).is_dir(), "{folder} was not created");
    }
}

#[test]
fn folder_overrides_come_from_the_environment() {
    let dir = TempDir::new().unwrap();

    ocr2md(&dir)
        .env("MISTRAL_API_KEY", "dummy-key-123")
        .env("OCR2MD_INPUT_DIR", "inbox")
        .env("OCR2MD_DONE_DIR", "archive")
        .env("OCR2MD_OUTPUT_DIR", "markdown")
        .assert()
        .success()
        .stdout(predicate::str::contains("No PDFs found in inbox"));

    for folder in ["inbox", "archive", "markdown"] {
        assert!(dir.path().join(folder).is_dir(), "{folder} was not created");
    }
}

#[test]
fn invalid_numeric_setting_exits_non_zero() {
    let dir = TempDir::new().unwrap();

    ocr2md(&dir)
        .env("MISTRAL_API_KEY", "dummy-key-123")
        .env("OCR2MD_REQUEST_TIMEOUT_SECS", "soon")
        .assert()
        .failure()
        .stderr(predicate::str::contains("OCR2MD_REQUEST_TIMEOUT_SECS"));
}

#[test]
fn failed_document_keeps_exit_zero_and_stays_in_input() {
    let dir = TempDir::new().unwrap();
    let inbox = dir.path().join("pdfs_to_process");
    std::fs::create_dir_all(&inbox).unwrap();
    std::fs::write(inbox.join("a.pdf"), b"%PDF-1.4 test").unwrap();

    // Nothing listens on port 1, so the upload fails without leaving the host.
    ocr2md(&dir)
        .env("MISTRAL_API_KEY", "dummy-key-123")
        .env("MISTRAL_API_BASE", "http://127.0.0.1:1/v1")
        .env("OCR2MD_REQUEST_TIMEOUT_SECS", "5")
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 0 out of 1 PDFs successfully"))
        .stderr(predicate::str::contains("a.pdf: failed while uploading"));

    assert!(inbox.join("a.pdf").exists());
    assert!(!dir.path().join("pdfs-done").join("a.pdf").exists());
    assert!(!dir.path().join("ocr_output").join("a").exists());
}
