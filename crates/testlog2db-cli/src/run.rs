//! End-to-end import run: discover, parse, merge, import, report.

use uuid::Uuid;

use testlog2db_core::config::ImportConfig;
use testlog2db_core::errors::{ImportError, ImportResult};
use testlog2db_core::import::{resolve_metadata, MetadataOverrides};
use testlog2db_core::probe::SystemProbe;
use testlog2db_core::report::{merge_reports, parse_report};
use testlog2db_core::storage::DryRunStore;
use testlog2db_core::{ImportOptions, ImportSummary, Importer, SqliteStore};

use crate::args::Cli;
use crate::discover::discover_reports;

pub fn run(cli: &Cli) -> ImportResult<()> {
    if let Some(raw) = &cli.uuid {
        validate_uuid(raw)?;
    }

    let files = discover_reports(&cli.results, cli.recursive)?;

    let config = match &cli.config {
        Some(path) => ImportConfig::load(path)?,
        None => ImportConfig::default(),
    };

    let mut overrides = MetadataOverrides {
        variant: cli.variant.clone(),
        tester: cli.tester.clone(),
        ..MetadataOverrides::default()
    };
    if let Some(versions) = &cli.versions {
        overrides.apply_versions(versions);
    }
    let meta = resolve_metadata(&overrides, &config, &SystemProbe);

    let documents = files
        .iter()
        .map(|path| parse_report(path))
        .collect::<ImportResult<Vec<_>>>()?;
    let merged = merge_reports(documents)?;

    let options = ImportOptions {
        uuid: cli.uuid.clone(),
        append: cli.append,
    };

    let store = SqliteStore::open(&cli.database)?;
    let summary = if cli.dryrun {
        let mut store = DryRunStore::new(store);
        Importer::new(&mut store, &meta, &config.components, &options).run(&merged)?
    } else {
        let mut store = store;
        Importer::new(&mut store, &meta, &config.components, &options).run(&merged)?
    };

    print_summary(&summary, cli.dryrun);
    Ok(())
}

/// The identifier must be a canonically formatted UUID, exactly as it will
/// be stored.
fn validate_uuid(raw: &str) -> ImportResult<()> {
    let valid = Uuid::parse_str(raw)
        .map(|parsed| parsed.to_string() == raw)
        .unwrap_or(false);
    if !valid {
        return Err(ImportError::ConfigInvalid {
            reason: format!("the provided UUID is not valid: '{raw}'"),
        });
    }
    Ok(())
}

fn print_summary(summary: &ImportSummary, dryrun: bool) {
    println!(
        "imported {} test case(s) into {} file(s): {} passed, {} failed, {} unknown",
        summary.total, summary.files, summary.passed, summary.failed, summary.unknown
    );
    for (component, tally) in &summary.per_component {
        println!("  component {component}: {}/{} passed", tally.passed, tally.total);
    }
    println!("execution result UUID: {}", summary.result_id);
    let append_msg = if summary.appended { " (append mode)" } else { "" };
    if dryrun {
        println!("dryrun finished, nothing was written to database{append_msg}.");
    } else {
        println!("All test results are written to database successfully{append_msg}.");
    }
}

#[cfg(test)]
mod tests {
    use super::validate_uuid;

    #[test]
    fn canonical_uuids_pass() {
        assert!(validate_uuid("123e4567-e89b-42d3-a456-426614174000").is_ok());
    }

    #[test]
    fn non_canonical_forms_are_rejected() {
        // Valid UUID content, wrong textual form: stored identifiers are
        // compared as text, so only the canonical form is accepted.
        assert!(validate_uuid("123E4567-E89B-42D3-A456-426614174000").is_err());
        assert!(validate_uuid("urn:uuid:123e4567-e89b-42d3-a456-426614174000").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
