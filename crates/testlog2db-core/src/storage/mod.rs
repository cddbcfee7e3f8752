//! Storage collaborator: the write surface the import pipeline drives, plus
//! the SQLite-backed production implementation and a dry-run wrapper.
//!
//! The store is the only component that may defend identifier uniqueness
//! atomically; the pipeline maps its distinguished duplicate-key condition
//! into the create-vs-append conflict handling.

mod dryrun;
mod schema;
mod sqlite;

pub use dryrun::DryRunStore;
pub use sqlite::SqliteStore;

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique-key constraint was violated (e.g. a second execution result
    /// with the same identifier).
    #[error("duplicate key: {detail}")]
    Duplicate { detail: String },

    /// Any other backend failure.
    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    /// True when the write hit an existing unique key.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, ref message) = err {
            let unique = failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE;
            if unique {
                return StoreError::Duplicate {
                    detail: message.clone().unwrap_or_else(|| err.to_string()),
                };
            }
        }
        StoreError::Database(err.to_string())
    }
}

/// Identity fields of an existing execution result, as needed by the
/// append-mode metadata verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResult {
    pub project: String,
    pub variant: String,
    pub version_sw_target: String,
}

/// Field set for a new execution result row.
#[derive(Debug, Clone)]
pub struct NewResult<'a> {
    pub id: &'a str,
    pub project: &'a str,
    pub variant: &'a str,
    pub branch: &'a str,
    pub version_sw_target: &'a str,
    pub version_sw_test: &'a str,
    pub version_hardware: &'a str,
    pub time_start: &'a str,
    pub time_end: &'a str,
    pub interpretation: &'a str,
    pub jenkinsurl: &'a str,
    pub reporting_qualitygate: &'a str,
}

/// Field set for a new test file row.
#[derive(Debug, Clone)]
pub struct NewFile<'a> {
    pub result_id: &'a str,
    pub name: &'a str,
    pub tester_account: &'a str,
    pub tester_machine: &'a str,
    pub time_start: &'a str,
    pub time_end: &'a str,
}

/// Tool/environment header record attached to each test file. Fields the
/// report format cannot supply stay empty, as placeholders for richer
/// formats.
#[derive(Debug, Clone, Default)]
pub struct NewFileHeader<'a> {
    pub testtool_name: &'a str,
    pub testtool_version: &'a str,
    pub project_name: &'a str,
    pub logfile_encoding: &'a str,
    pub python_version: &'a str,
    pub testfile: &'a str,
    pub logfile_path: &'a str,
    pub logfile_mode: &'a str,
    pub ctrlfile_path: &'a str,
    pub config_file: &'a str,
    pub conf_name: &'a str,
    pub author: &'a str,
    pub project: &'a str,
    pub testfile_date: &'a str,
    pub version_major: &'a str,
    pub version_minor: &'a str,
    pub version_patch: &'a str,
    pub keyword: &'a str,
    pub short_description: &'a str,
    pub user_account: &'a str,
    pub computer_name: &'a str,
    pub document_management: &'a str,
    pub test_environment: &'a str,
    pub testbench_name: &'a str,
    pub testbench_data: &'a str,
    pub preprocessor_filter: &'a str,
    pub preprocessor_parameters: &'a str,
}

/// Field set for a new test case row.
#[derive(Debug, Clone)]
pub struct NewCase<'a> {
    pub result_id: &'a str,
    pub file_id: i64,
    pub name: &'a str,
    pub issue: &'a str,
    pub tcid: &'a str,
    pub fid: &'a str,
    pub test_number: i64,
    pub repeat_count: i64,
    pub component: &'a str,
    pub time_start: &'a str,
    pub result_main: &'a str,
    pub result_state: &'a str,
    pub result_return: i64,
    pub counter_resets: i64,
    pub lastlog: &'a str,
}

/// The storage collaborator surface the orchestrator drives, in write order:
/// result → file (+header) → case, then finish/aggregate refresh.
pub trait ResultStore {
    /// Look up an existing execution result by identifier.
    fn lookup_result(&mut self, id: &str) -> StoreResult<Option<StoredResult>>;

    /// Create a new execution result row.
    fn create_result(&mut self, row: &NewResult<'_>) -> StoreResult<()>;

    /// Create a new test file row, returning its id.
    fn create_file(&mut self, row: &NewFile<'_>) -> StoreResult<i64>;

    /// Attach the header record to a file.
    fn create_file_header(&mut self, file_id: i64, header: &NewFileHeader<'_>) -> StoreResult<()>;

    /// Create a new test case row, returning its id.
    fn create_case(&mut self, row: &NewCase<'_>) -> StoreResult<i64>;

    /// Terminal state transition for a result. Idempotent.
    fn finish_result(&mut self, id: &str) -> StoreResult<()>;

    /// Recompute the denormalized aggregate views for all results.
    fn refresh_aggregates(&mut self) -> StoreResult<()>;

    /// Append-specific aggregate refresh for one result.
    fn refresh_result_aggregates(&mut self, id: &str) -> StoreResult<()>;
}
