//! SQLite-backed result store.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use super::schema::RESULT_SCHEMA;
use super::{
    NewCase, NewFile, NewFileHeader, NewResult, ResultStore, StoreResult, StoredResult,
};

/// SQLite-backed store. Single connection, single user; identifier
/// uniqueness is enforced by the `results` primary key.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a file-backed store, creating the schema if needed.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(super::StoreError::from)?;
        Self::init_connection(&conn)?;
        Ok(Self { conn })
    }

    /// Create an in-memory store (for testing).
    pub fn memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(super::StoreError::from)?;
        Self::init_connection(&conn)?;
        Ok(Self { conn })
    }

    fn init_connection(conn: &Connection) -> StoreResult<()> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        // WAL mode for file-backed DBs (no-op for in-memory)
        let _ = conn.execute("PRAGMA journal_mode = WAL", []);
        conn.execute_batch(RESULT_SCHEMA)?;
        Ok(())
    }

    /// Borrow the underlying connection (inspection in tests).
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl ResultStore for SqliteStore {
    fn lookup_result(&mut self, id: &str) -> StoreResult<Option<StoredResult>> {
        let stored = self
            .conn
            .query_row(
                "SELECT project, variant, version_sw_target FROM results WHERE id = ?1",
                [id],
                |row| {
                    Ok(StoredResult {
                        project: row.get(0)?,
                        variant: row.get(1)?,
                        version_sw_target: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(stored)
    }

    fn create_result(&mut self, row: &NewResult<'_>) -> StoreResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO results (
                id, project, variant, branch,
                version_sw_target, version_sw_test, version_hardware,
                time_start, time_end,
                interpretation, jenkinsurl, reporting_qualitygate
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                row.id,
                row.project,
                row.variant,
                row.branch,
                row.version_sw_target,
                row.version_sw_test,
                row.version_hardware,
                row.time_start,
                row.time_end,
                row.interpretation,
                row.jenkinsurl,
                row.reporting_qualitygate,
            ],
        )?;
        Ok(())
    }

    fn create_file(&mut self, row: &NewFile<'_>) -> StoreResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO files (result_id, name, tester_account, tester_machine, time_start, time_end)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                row.result_id,
                row.name,
                row.tester_account,
                row.tester_machine,
                row.time_start,
                row.time_end,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn create_file_header(&mut self, file_id: i64, header: &NewFileHeader<'_>) -> StoreResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO file_headers (
                file_id,
                testtool_name, testtool_version, project_name, logfile_encoding,
                python_version, testfile, logfile_path, logfile_mode,
                ctrlfile_path, config_file, conf_name,
                author, project, testfile_date,
                version_major, version_minor, version_patch,
                keyword, short_description,
                user_account, computer_name,
                document_management, test_environment,
                testbench_name, testbench_data,
                preprocessor_filter, preprocessor_parameters
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28
            )
            "#,
            params![
                file_id,
                header.testtool_name,
                header.testtool_version,
                header.project_name,
                header.logfile_encoding,
                header.python_version,
                header.testfile,
                header.logfile_path,
                header.logfile_mode,
                header.ctrlfile_path,
                header.config_file,
                header.conf_name,
                header.author,
                header.project,
                header.testfile_date,
                header.version_major,
                header.version_minor,
                header.version_patch,
                header.keyword,
                header.short_description,
                header.user_account,
                header.computer_name,
                header.document_management,
                header.test_environment,
                header.testbench_name,
                header.testbench_data,
                header.preprocessor_filter,
                header.preprocessor_parameters,
            ],
        )?;
        Ok(())
    }

    fn create_case(&mut self, row: &NewCase<'_>) -> StoreResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO cases (
                result_id, file_id, name, issue, tcid, fid,
                test_number, repeat_count, component, time_start,
                result_main, result_state, result_return, counter_resets, lastlog
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                row.result_id,
                row.file_id,
                row.name,
                row.issue,
                row.tcid,
                row.fid,
                row.test_number,
                row.repeat_count,
                row.component,
                row.time_start,
                row.result_main,
                row.result_state,
                row.result_return,
                row.counter_resets,
                row.lastlog,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_result(&mut self, id: &str) -> StoreResult<()> {
        self.conn.execute(
            "UPDATE results SET state = 'finished' WHERE id = ?1",
            [id],
        )?;
        Ok(())
    }

    fn refresh_aggregates(&mut self) -> StoreResult<()> {
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO result_stats (result_id, total, passed, failed, unknown)
            SELECT result_id,
                   COUNT(*),
                   COALESCE(SUM(result_main = 'Passed'), 0),
                   COALESCE(SUM(result_main = 'Failed'), 0),
                   COALESCE(SUM(result_main = 'unknown'), 0)
            FROM cases
            GROUP BY result_id
            "#,
            [],
        )?;
        Ok(())
    }

    fn refresh_result_aggregates(&mut self, id: &str) -> StoreResult<()> {
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO result_stats (result_id, total, passed, failed, unknown)
            SELECT result_id,
                   COUNT(*),
                   COALESCE(SUM(result_main = 'Passed'), 0),
                   COALESCE(SUM(result_main = 'Failed'), 0),
                   COALESCE(SUM(result_main = 'unknown'), 0)
            FROM cases
            WHERE result_id = ?1
            GROUP BY result_id
            "#,
            [id],
        )?;
        Ok(())
    }
}
