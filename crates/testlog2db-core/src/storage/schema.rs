//! SQLite schema for the execution-result hierarchy.
//!
//! Tables:
//! - `results`: one row per execution result, keyed by the import UUID
//! - `files`: test files, owned by exactly one result
//! - `file_headers`: tool/environment header record, one per file
//! - `cases`: test cases, owned by exactly one file
//! - `result_stats`: denormalized per-result aggregates (refresh target)

/// DDL for the result store.
pub const RESULT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS results (
    id                     TEXT PRIMARY KEY,
    project                TEXT NOT NULL,
    variant                TEXT NOT NULL,
    branch                 TEXT NOT NULL,
    version_sw_target      TEXT NOT NULL,
    version_sw_test        TEXT NOT NULL,
    version_hardware       TEXT NOT NULL,
    time_start             TEXT NOT NULL,
    time_end               TEXT NOT NULL,
    interpretation         TEXT NOT NULL DEFAULT '',
    jenkinsurl             TEXT NOT NULL DEFAULT '',
    reporting_qualitygate  TEXT NOT NULL DEFAULT '',
    state                  TEXT NOT NULL DEFAULT 'in progress'
);

CREATE TABLE IF NOT EXISTS files (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    result_id       TEXT NOT NULL REFERENCES results(id),
    name            TEXT NOT NULL,
    tester_account  TEXT NOT NULL,
    tester_machine  TEXT NOT NULL,
    time_start      TEXT NOT NULL,
    time_end        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS file_headers (
    file_id                  INTEGER PRIMARY KEY REFERENCES files(id),
    testtool_name            TEXT NOT NULL DEFAULT '',
    testtool_version         TEXT NOT NULL DEFAULT '',
    project_name             TEXT NOT NULL DEFAULT '',
    logfile_encoding         TEXT NOT NULL DEFAULT '',
    python_version           TEXT NOT NULL DEFAULT '',
    testfile                 TEXT NOT NULL DEFAULT '',
    logfile_path             TEXT NOT NULL DEFAULT '',
    logfile_mode             TEXT NOT NULL DEFAULT '',
    ctrlfile_path            TEXT NOT NULL DEFAULT '',
    config_file              TEXT NOT NULL DEFAULT '',
    conf_name                TEXT NOT NULL DEFAULT '',
    author                   TEXT NOT NULL DEFAULT '',
    project                  TEXT NOT NULL DEFAULT '',
    testfile_date            TEXT NOT NULL DEFAULT '',
    version_major            TEXT NOT NULL DEFAULT '',
    version_minor            TEXT NOT NULL DEFAULT '',
    version_patch            TEXT NOT NULL DEFAULT '',
    keyword                  TEXT NOT NULL DEFAULT '',
    short_description        TEXT NOT NULL DEFAULT '',
    user_account             TEXT NOT NULL DEFAULT '',
    computer_name            TEXT NOT NULL DEFAULT '',
    document_management      TEXT NOT NULL DEFAULT '',
    test_environment         TEXT NOT NULL DEFAULT '',
    testbench_name           TEXT NOT NULL DEFAULT '',
    testbench_data           TEXT NOT NULL DEFAULT '',
    preprocessor_filter      TEXT NOT NULL DEFAULT '',
    preprocessor_parameters  TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS cases (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    result_id       TEXT NOT NULL REFERENCES results(id),
    file_id         INTEGER NOT NULL REFERENCES files(id),
    name            TEXT NOT NULL,
    issue           TEXT NOT NULL DEFAULT '',
    tcid            TEXT NOT NULL DEFAULT '',
    fid             TEXT NOT NULL DEFAULT '',
    test_number     INTEGER NOT NULL,
    repeat_count    INTEGER NOT NULL DEFAULT 1,
    component       TEXT NOT NULL,
    time_start      TEXT NOT NULL,
    result_main     TEXT NOT NULL,
    result_state    TEXT NOT NULL,
    result_return   INTEGER NOT NULL,
    counter_resets  INTEGER NOT NULL DEFAULT 0,
    lastlog         TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS result_stats (
    result_id  TEXT PRIMARY KEY REFERENCES results(id),
    total      INTEGER NOT NULL,
    passed     INTEGER NOT NULL,
    failed     INTEGER NOT NULL,
    unknown    INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_files_result_id ON files(result_id);
CREATE INDEX IF NOT EXISTS idx_cases_result_id ON cases(result_id);
CREATE INDEX IF NOT EXISTS idx_cases_file_id ON cases(file_id);
"#;
