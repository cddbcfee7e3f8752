//! End-to-end CLI contract tests: exit codes, messages, and persisted rows.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const UUID: &str = "123e4567-e89b-42d3-a456-426614174000";

const REPORT_ONE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<testsuites>
  <testsuite name="pytest" tests="3" time="4.5"
             timestamp="2022-11-01T10:00:00.000000" hostname="ci-runner-07">
    <testcase classname="tests.api.TestLogin" name="test_ok" time="1.5"/>
    <testcase classname="tests.api.TestLogin" name="test_bad_password" time="2.0">
      <failure message="assert 401 == 200">traceback body</failure>
    </testcase>
    <testcase classname="tests.db.TestPool" name="test_reuse" time="1.0">
      <skipped message="requires postgres"/>
    </testcase>
  </testsuite>
</testsuites>
"#;

const REPORT_TWO: &str = r#"<testsuite name="pytest" tests="1" time="3.0"
           timestamp="2022-11-01T09:59:50.000000" hostname="ci-runner-08">
  <testcase classname="tests.ui.TestRender" name="test_page" time="3.0"/>
</testsuite>
"#;

fn cmd() -> Command {
    Command::cargo_bin("testlog2db").unwrap()
}

fn write_reports(dir: &Path) {
    fs::write(dir.join("one.xml"), REPORT_ONE).unwrap();
    fs::write(dir.join("two.xml"), REPORT_TWO).unwrap();
}

fn count(db: &Path, sql: &str) -> i64 {
    let conn = rusqlite::Connection::open(db).unwrap();
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

#[test]
fn imports_a_directory_of_reports() {
    let dir = tempdir().unwrap();
    let reports = dir.path().join("reports");
    fs::create_dir(&reports).unwrap();
    write_reports(&reports);
    let db = dir.path().join("results.db");

    cmd()
        .arg(&reports)
        .arg(&db)
        .args(["--uuid", UUID, "--variant", "Gateway", "--versions", "22.1S05"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "All test results are written to database successfully",
        ))
        .stdout(predicate::str::contains("4 test case(s)"));

    assert_eq!(count(&db, "SELECT COUNT(*) FROM results"), 1);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM files"), 3);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM cases"), 4);

    let conn = rusqlite::Connection::open(&db).unwrap();
    let (variant, branch, state): (String, String, String) = conn
        .query_row(
            "SELECT variant, branch, state FROM results WHERE id = ?1",
            [UUID],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(variant, "Gateway");
    assert_eq!(branch, "22.1S");
    assert_eq!(state, "finished");
}

#[test]
fn reimporting_the_same_uuid_is_a_conflict() {
    let dir = tempdir().unwrap();
    let report = dir.path().join("one.xml");
    fs::write(&report, REPORT_ONE).unwrap();
    let db = dir.path().join("results.db");

    cmd()
        .arg(&report)
        .arg(&db)
        .args(["--uuid", UUID])
        .assert()
        .success();

    cmd()
        .arg(&report)
        .arg(&db)
        .args(["--uuid", UUID])
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("already exists"))
        .stderr(predicate::str::contains("--append"));

    assert_eq!(count(&db, "SELECT COUNT(*) FROM results"), 1);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM cases"), 3);
}

#[test]
fn append_extends_the_existing_result() {
    let dir = tempdir().unwrap();
    let one = dir.path().join("one.xml");
    let two = dir.path().join("two.xml");
    fs::write(&one, REPORT_ONE).unwrap();
    fs::write(&two, REPORT_TWO).unwrap();
    let db = dir.path().join("results.db");

    cmd()
        .arg(&one)
        .arg(&db)
        .args(["--uuid", UUID, "--variant", "Gateway"])
        .assert()
        .success();

    cmd()
        .arg(&two)
        .arg(&db)
        .args(["--append", "--uuid", UUID, "--variant", "Gateway"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(append mode)"));

    assert_eq!(count(&db, "SELECT COUNT(*) FROM results"), 1);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM cases"), 4);
}

#[test]
fn append_with_a_different_variant_is_rejected() {
    let dir = tempdir().unwrap();
    let one = dir.path().join("one.xml");
    fs::write(&one, REPORT_ONE).unwrap();
    let db = dir.path().join("results.db");

    cmd()
        .arg(&one)
        .arg(&db)
        .args(["--uuid", UUID, "--variant", "Gateway"])
        .assert()
        .success();

    cmd()
        .arg(&one)
        .arg(&db)
        .args(["--append", "--uuid", UUID, "--variant", "Other"])
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("cannot append"));
}

#[test]
fn append_without_uuid_is_a_usage_error() {
    let dir = tempdir().unwrap();
    let one = dir.path().join("one.xml");
    fs::write(&one, REPORT_ONE).unwrap();
    let db = dir.path().join("results.db");

    cmd()
        .arg(&one)
        .arg(&db)
        .arg("--append")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--uuid"));
}

#[test]
fn dryrun_writes_no_rows() {
    let dir = tempdir().unwrap();
    let one = dir.path().join("one.xml");
    fs::write(&one, REPORT_ONE).unwrap();
    let db = dir.path().join("results.db");

    cmd()
        .arg(&one)
        .arg(&db)
        .args(["--dryrun", "--uuid", UUID])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing was written"));

    assert_eq!(count(&db, "SELECT COUNT(*) FROM results"), 0);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM cases"), 0);
}

#[test]
fn invalid_uuid_is_rejected_before_any_work() {
    let dir = tempdir().unwrap();
    let one = dir.path().join("one.xml");
    fs::write(&one, REPORT_ONE).unwrap();
    let db = dir.path().join("results.db");

    cmd()
        .arg(&one)
        .arg(&db)
        .args(["--uuid", "not-a-uuid"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("not valid"));
    assert!(!db.exists());
}

#[test]
fn missing_input_path_fails_with_input_error() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("results.db");

    cmd()
        .arg(dir.path().join("nope.xml"))
        .arg(&db)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("input not found"));
}

#[test]
fn component_mapping_from_the_config_file_is_applied() {
    let dir = tempdir().unwrap();
    let one = dir.path().join("one.xml");
    fs::write(&one, REPORT_ONE).unwrap();
    let config = dir.path().join("config.json");
    fs::write(
        &config,
        r#"{"components": {"api": "tests.api", "storage": "tests.db"}, "variant": "Gateway"}"#,
    )
    .unwrap();
    let db = dir.path().join("results.db");

    cmd()
        .arg(&one)
        .arg(&db)
        .args(["--uuid", UUID])
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("component api: 1/2 passed"));

    let conn = rusqlite::Connection::open(&db).unwrap();
    let api_cases: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM cases WHERE component = 'api'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(api_cases, 2);
}

#[test]
fn unknown_config_keys_are_fatal() {
    let dir = tempdir().unwrap();
    let one = dir.path().join("one.xml");
    fs::write(&one, REPORT_ONE).unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{"varant": "typo"}"#).unwrap();
    let db = dir.path().join("results.db");

    cmd()
        .arg(&one)
        .arg(&db)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid key 'varant'"));
}

#[test]
fn malformed_report_aborts_the_run() {
    let dir = tempdir().unwrap();
    let one = dir.path().join("one.xml");
    fs::write(&one, "<testsuites><testsuite").unwrap();
    let db = dir.path().join("results.db");

    cmd()
        .arg(&one)
        .arg(&db)
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("cannot parse report"));
}
