//! Dry-run store: verifies everything a real import would (connection,
//! lookups, conflict detection) but writes nothing.

use tracing::info;

use super::{
    NewCase, NewFile, NewFileHeader, NewResult, ResultStore, StoreResult, StoredResult,
};

/// Wraps a real store, delegating lookups and swallowing writes. Returned
/// row ids are placeholders.
pub struct DryRunStore<S> {
    inner: S,
    next_id: i64,
}

impl<S> DryRunStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, next_id: 0 }
    }

    /// Unwrap the inner store.
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn placeholder_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl<S: ResultStore> ResultStore for DryRunStore<S> {
    fn lookup_result(&mut self, id: &str) -> StoreResult<Option<StoredResult>> {
        self.inner.lookup_result(id)
    }

    fn create_result(&mut self, row: &NewResult<'_>) -> StoreResult<()> {
        info!(id = row.id, "dryrun: would create execution result");
        Ok(())
    }

    fn create_file(&mut self, row: &NewFile<'_>) -> StoreResult<i64> {
        info!(name = row.name, "dryrun: would create test file");
        Ok(self.placeholder_id())
    }

    fn create_file_header(&mut self, file_id: i64, _header: &NewFileHeader<'_>) -> StoreResult<()> {
        info!(file_id, "dryrun: would create file header");
        Ok(())
    }

    fn create_case(&mut self, row: &NewCase<'_>) -> StoreResult<i64> {
        info!(name = row.name, "dryrun: would create test case");
        Ok(self.placeholder_id())
    }

    fn finish_result(&mut self, id: &str) -> StoreResult<()> {
        info!(id, "dryrun: would finish execution result");
        Ok(())
    }

    fn refresh_aggregates(&mut self) -> StoreResult<()> {
        Ok(())
    }

    fn refresh_result_aggregates(&mut self, _id: &str) -> StoreResult<()> {
        Ok(())
    }
}
