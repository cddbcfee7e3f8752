//! Import orchestrator: resolves run metadata, opens or resumes the
//! execution result, walks the merged report driving file- and case-level
//! writes in order, and finalizes the result.
//!
//! The walk is strictly sequential and write order is traversal order; the
//! per-case start times are synthesized from the per-suite clock and rely on
//! that ordering.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{Duration, NaiveDateTime};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::branch::branch_from_sw_version;
use crate::component::ComponentSpec;
use crate::config::ImportConfig;
use crate::errors::{ImportError, ImportResult};
use crate::fields;
use crate::probe::EnvironmentProbe;
use crate::report::{CaseStatus, MergedReport, ReportSuite};
use crate::storage::{NewCase, NewFile, NewFileHeader, NewResult, ResultStore};
use crate::timefmt;

/// Default project/variant name when neither CLI nor config supplies one.
pub const DEFAULT_VARIANT: &str = "PyTest";

/// Result state written for every imported case.
const RESULT_STATE_COMPLETE: &str = "complete";

/// Delimiter of the combined `--versions` override string.
const VERSIONS_DELIMITER: char = ';';

/// Explicit command-line metadata overrides (highest precedence).
#[derive(Debug, Clone, Default)]
pub struct MetadataOverrides {
    pub variant: Option<String>,
    pub version_sw: Option<String>,
    pub version_hw: Option<String>,
    pub version_test: Option<String>,
    pub tester: Option<String>,
}

impl MetadataOverrides {
    /// Apply a combined `sw[;hw[;test]]` versions string. Only fields
    /// present (and non-empty) override.
    pub fn apply_versions(&mut self, versions: &str) {
        let mut parts = versions.splitn(3, VERSIONS_DELIMITER);
        for slot in [
            &mut self.version_sw,
            &mut self.version_hw,
            &mut self.version_test,
        ] {
            match parts.next() {
                Some(part) if !part.trim().is_empty() => *slot = Some(part.trim().to_string()),
                _ => {}
            }
        }
    }
}

/// Fully resolved run metadata. `*_explicit` marks values the operator
/// supplied (CLI or config) rather than defaults; only explicit values are
/// verified against a stored result when appending.
#[derive(Debug, Clone)]
pub struct ResolvedMeta {
    pub variant: String,
    pub variant_explicit: bool,
    pub version_sw: String,
    pub version_sw_explicit: bool,
    pub version_hw: String,
    pub version_test: String,
    pub testtool: String,
    pub tester: String,
}

/// Resolve metadata by precedence: CLI overrides > configuration file >
/// environment-derived defaults.
pub fn resolve_metadata(
    overrides: &MetadataOverrides,
    config: &ImportConfig,
    probe: &dyn EnvironmentProbe,
) -> ResolvedMeta {
    fn pick(
        cli: &Option<String>,
        config: &Option<String>,
        default: String,
    ) -> (String, bool) {
        match (cli, config) {
            (Some(value), _) => (value.clone(), true),
            (None, Some(value)) => (value.clone(), true),
            (None, None) => (default, false),
        }
    }

    let (variant, variant_explicit) =
        pick(&overrides.variant, &config.variant, DEFAULT_VARIANT.to_string());
    let (version_sw, version_sw_explicit) =
        pick(&overrides.version_sw, &config.version_sw, String::new());
    let (version_hw, _) = pick(&overrides.version_hw, &config.version_hw, String::new());
    let (version_test, _) = pick(&overrides.version_test, &config.version_test, String::new());
    let (testtool, _) = pick(&None, &config.testtool, probe.default_testtool());
    let (tester, _) = pick(&overrides.tester, &config.tester, probe.current_user());

    ResolvedMeta {
        variant,
        variant_explicit,
        version_sw,
        version_sw_explicit,
        version_hw,
        version_test,
        testtool,
        tester,
    }
}

/// Create-vs-append options for one run.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Externally supplied execution identifier; generated when absent.
    pub uuid: Option<String>,
    /// Add to an existing execution result instead of creating one.
    pub append: bool,
}

/// Per-component tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ComponentTally {
    pub total: usize,
    pub passed: usize,
}

/// Counters accumulated over one run, returned on success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub result_id: String,
    pub appended: bool,
    pub files: usize,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub unknown: usize,
    pub per_component: BTreeMap<String, ComponentTally>,
}

impl ImportSummary {
    fn record(&mut self, component: &str, result_main: &str) {
        self.total += 1;
        match result_main {
            "Passed" => self.passed += 1,
            "Failed" => self.failed += 1,
            _ => self.unknown += 1,
        }
        let tally = self.per_component.entry(component.to_string()).or_default();
        tally.total += 1;
        if result_main == "Passed" {
            tally.passed += 1;
        }
    }
}

/// The import state machine. Drives a [`ResultStore`] through the ordered
/// result → file → case write sequence for one merged report batch.
pub struct Importer<'a, S: ResultStore> {
    store: &'a mut S,
    meta: &'a ResolvedMeta,
    components: &'a ComponentSpec,
    options: &'a ImportOptions,
}

impl<'a, S: ResultStore> Importer<'a, S> {
    pub fn new(
        store: &'a mut S,
        meta: &'a ResolvedMeta,
        components: &'a ComponentSpec,
        options: &'a ImportOptions,
    ) -> Self {
        Self {
            store,
            meta,
            components,
            options,
        }
    }

    /// Run the whole import for a merged batch.
    pub fn run(mut self, merged: &MergedReport) -> ImportResult<ImportSummary> {
        // Identifying fields are strict: overflow here would corrupt joins
        // downstream, so it aborts the run.
        let project = fields::check("project", &self.meta.variant)?.to_string();
        let variant = fields::check("variant", &self.meta.variant)?.to_string();
        let version_sw = {
            let checked = fields::check("version_sw_target", &self.meta.version_sw)?;
            if checked.is_empty() {
                // A version-like label must always exist; fall back to the
                // batch start time.
                timefmt::format_compact(merged.start)
            } else {
                checked.to_string()
            }
        };
        let version_hw = fields::truncate_field("version_hardware", &self.meta.version_hw);
        let version_test = fields::truncate_field("version_sw_test", &self.meta.version_test);
        let branch = branch_from_sw_version(&version_sw);

        let result_id = match &self.options.uuid {
            Some(id) => id.clone(),
            None => {
                if self.options.append {
                    return Err(ImportError::ConfigInvalid {
                        reason: "'--append' must be used in combination with '--uuid <UUID>'"
                            .to_string(),
                    });
                }
                Uuid::new_v4().to_string()
            }
        };

        self.open_result(
            &result_id,
            &project,
            &variant,
            &branch,
            &version_sw,
            &version_test,
            &version_hw,
            merged,
        )?;

        let mut summary = ImportSummary {
            result_id: result_id.clone(),
            appended: self.options.append,
            ..ImportSummary::default()
        };
        for suite in &merged.suites {
            self.write_suite(suite, &result_id, &mut summary)?;
        }

        // Finalize: derived views first, then the terminal state transition.
        self.store.refresh_aggregates()?;
        self.store.finish_result(&result_id)?;
        if self.options.append {
            self.store.refresh_result_aggregates(&result_id)?;
        }

        Ok(summary)
    }

    #[allow(clippy::too_many_arguments)]
    fn open_result(
        &mut self,
        result_id: &str,
        project: &str,
        variant: &str,
        branch: &str,
        version_sw: &str,
        version_test: &str,
        version_hw: &str,
        merged: &MergedReport,
    ) -> ImportResult<()> {
        match self.store.lookup_result(result_id)? {
            Some(stored) => {
                if !self.options.append {
                    return Err(ImportError::DuplicateIdentifier {
                        id: result_id.to_string(),
                    });
                }
                // Appending must not silently redefine the execution's
                // identity; only operator-supplied values are checked.
                if self.meta.variant_explicit && stored.variant != variant {
                    return Err(ImportError::MetadataConflict {
                        id: result_id.to_string(),
                        field: "variant",
                        stored: stored.variant,
                        supplied: variant.to_string(),
                    });
                }
                if self.meta.version_sw_explicit && stored.version_sw_target != version_sw {
                    return Err(ImportError::MetadataConflict {
                        id: result_id.to_string(),
                        field: "software version",
                        stored: stored.version_sw_target,
                        supplied: version_sw.to_string(),
                    });
                }
                info!(id = result_id, "appending to existing execution result");
            }
            None => {
                if self.options.append {
                    return Err(ImportError::NothingToAppendTo {
                        id: result_id.to_string(),
                    });
                }
                let time_start = merged.start_db();
                let time_end = merged.end_db();
                let row = NewResult {
                    id: result_id,
                    project,
                    variant,
                    branch,
                    version_sw_target: version_sw,
                    version_sw_test: version_test,
                    version_hardware: version_hw,
                    time_start: &time_start,
                    time_end: &time_end,
                    interpretation: "",
                    jenkinsurl: "",
                    reporting_qualitygate: "",
                };
                self.store.create_result(&row).map_err(|err| {
                    // A concurrent importer can win the race between lookup
                    // and create; treat that exactly like the lookup hit.
                    if err.is_duplicate() {
                        ImportError::DuplicateIdentifier {
                            id: result_id.to_string(),
                        }
                    } else {
                        ImportError::Storage(err)
                    }
                })?;
                info!(
                    id = result_id,
                    version = %version_sw,
                    "created new execution result"
                );
            }
        }
        Ok(())
    }

    fn write_suite(
        &mut self,
        suite: &ReportSuite,
        result_id: &str,
        summary: &mut ImportSummary,
    ) -> ImportResult<()> {
        let tester_account = fields::truncate_field("tester_account", &self.meta.tester);
        let tester_machine = fields::truncate_field("tester_machine", &suite.hostname);

        // The suite clock: every case start is synthesized by advancing the
        // previous start by that case's reported duration.
        let mut clock = suite.timestamp;
        let mut group_start = clock;
        let mut group_cases: Vec<PreparedCase> = Vec::new();
        let mut group_classname: Option<&str> = None;

        for case in &suite.cases {
            if group_classname != Some(case.classname.as_str()) {
                if let Some(classname) = group_classname.take() {
                    self.flush_file(
                        classname,
                        group_start,
                        clock,
                        &group_cases,
                        result_id,
                        &tester_account,
                        &tester_machine,
                        summary,
                    )?;
                    group_cases.clear();
                }
                group_classname = Some(case.classname.as_str());
                group_start = clock;
            }

            let (result_main, result_return, log_plain) = case_outcome(&case.status);
            group_cases.push(PreparedCase {
                name: fields::truncate_field("name", &case.name),
                component: self.components.resolve(&case.classname).to_string(),
                start: clock,
                result_main,
                result_return,
                lastlog: BASE64.encode(log_plain),
            });
            clock = clock + duration_of(case.duration_secs)?;
        }
        if let Some(classname) = group_classname {
            self.flush_file(
                classname,
                group_start,
                clock,
                &group_cases,
                result_id,
                &tester_account,
                &tester_machine,
                summary,
            )?;
        }
        Ok(())
    }

    /// Write one test file (a maximal contiguous run of identical class
    /// names), its header, and its cases.
    #[allow(clippy::too_many_arguments)]
    fn flush_file(
        &mut self,
        classname: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        cases: &[PreparedCase],
        result_id: &str,
        tester_account: &str,
        tester_machine: &str,
        summary: &mut ImportSummary,
    ) -> ImportResult<()> {
        let file_name = fields::truncate_field("name", classname);
        let file_id = self.store.create_file(&NewFile {
            result_id,
            name: &file_name,
            tester_account,
            tester_machine,
            time_start: &timefmt::format_db(start),
            time_end: &timefmt::format_db(end),
        })?;

        let (testtool_name, testtool_version, python_version) =
            parse_testtool(&self.meta.testtool);
        let author = fields::truncate_field("tester_account", &self.meta.tester);
        self.store.create_file_header(
            file_id,
            &NewFileHeader {
                testtool_name: &testtool_name,
                testtool_version: &testtool_version,
                project_name: &self.meta.variant,
                logfile_encoding: "UTF-8",
                python_version: &python_version,
                testfile: &fields::truncate_field("testtoolconfiguration_testfile", classname),
                author: &author,
                project: &self.meta.variant,
                user_account: &author,
                computer_name: tester_machine,
                ..NewFileHeader::default()
            },
        )?;
        info!(classname, file_id, "created test file result");
        summary.files += 1;

        for (index, case) in cases.iter().enumerate() {
            let case_id = self.store.create_case(&NewCase {
                result_id,
                file_id,
                name: &case.name,
                issue: "",
                tcid: "",
                fid: "",
                test_number: index as i64 + 1,
                repeat_count: 1,
                component: &fields::truncate_field("component", &case.component),
                time_start: &timefmt::format_db(case.start),
                result_main: case.result_main,
                result_state: RESULT_STATE_COMPLETE,
                result_return: case.result_return,
                counter_resets: 0,
                lastlog: &case.lastlog,
            })?;
            debug!(name = case.name.as_str(), case_id, "created test case result");
            summary.record(&case.component, case.result_main);
        }
        Ok(())
    }
}

struct PreparedCase {
    name: String,
    component: String,
    start: NaiveDateTime,
    result_main: &'static str,
    result_return: i64,
    lastlog: String,
}

fn duration_of(secs: f64) -> ImportResult<Duration> {
    timefmt::seconds_to_delta(secs).ok_or_else(|| ImportError::Merge {
        reason: format!("unusable test case duration {secs}"),
    })
}

/// Map a reported case status to (result, return code, plain diagnostic log).
fn case_outcome(status: &CaseStatus) -> (&'static str, i64, String) {
    match status {
        CaseStatus::Passed => ("Passed", 11, String::new()),
        CaseStatus::Failure { message, text } => ("Failed", 12, format!("{message}\n{text}")),
        CaseStatus::Error { message, text } => ("unknown", 5, format!("{message}\n{text}")),
        CaseStatus::Skipped => ("unknown", 20, "This test is skipped.".to_string()),
    }
}

/// Extract (tool name, tool version, interpreter version) from a testtool
/// string of the form `<name> <version> (Python <interpreter>)`. A
/// non-matching string leaves all three empty.
fn parse_testtool(testtool: &str) -> (String, String, String) {
    if testtool.is_empty() {
        return Default::default();
    }
    let pattern = Regex::new(r"([a-zA-Z\s_]+\S)\s+([\d.rcab]+)\s+\(Python\s+(.*)\)")
        .expect("static testtool pattern");
    match pattern.captures(testtool) {
        Some(caps) => (
            fields::truncate_field("testtoolconfiguration_testtoolname", &caps[1]),
            fields::truncate_field("testtoolconfiguration_testtoolversionstring", &caps[2]),
            fields::truncate_field("testtoolconfiguration_pythonversion", &caps[3]),
        ),
        None => Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::StaticProbe;

    fn probe() -> StaticProbe {
        StaticProbe {
            user: "jenkins".into(),
            testtool: String::new(),
        }
    }

    #[test]
    fn cli_overrides_beat_config_values_and_defaults() {
        let overrides = MetadataOverrides {
            variant: Some("FromCli".into()),
            ..MetadataOverrides::default()
        };
        let config = ImportConfig {
            variant: Some("FromConfig".into()),
            tester: Some("cfg-user".into()),
            ..ImportConfig::default()
        };
        let meta = resolve_metadata(&overrides, &config, &probe());
        assert_eq!(meta.variant, "FromCli");
        assert!(meta.variant_explicit);
        assert_eq!(meta.tester, "cfg-user");
    }

    #[test]
    fn defaults_apply_when_nothing_is_supplied() {
        let meta = resolve_metadata(
            &MetadataOverrides::default(),
            &ImportConfig::default(),
            &probe(),
        );
        assert_eq!(meta.variant, DEFAULT_VARIANT);
        assert!(!meta.variant_explicit);
        assert_eq!(meta.version_sw, "");
        assert!(!meta.version_sw_explicit);
        assert_eq!(meta.tester, "jenkins");
    }

    #[test]
    fn combined_versions_string_overrides_present_fields_only() {
        let mut overrides = MetadataOverrides {
            version_test: Some("keep-me".into()),
            ..MetadataOverrides::default()
        };
        overrides.apply_versions("22.1S05;revB");
        assert_eq!(overrides.version_sw.as_deref(), Some("22.1S05"));
        assert_eq!(overrides.version_hw.as_deref(), Some("revB"));
        assert_eq!(overrides.version_test.as_deref(), Some("keep-me"));

        let mut sparse = MetadataOverrides::default();
        sparse.apply_versions(";;t9");
        assert_eq!(sparse.version_sw, None);
        assert_eq!(sparse.version_hw, None);
        assert_eq!(sparse.version_test.as_deref(), Some("t9"));
    }

    #[test]
    fn case_outcomes_map_to_fixed_return_codes() {
        assert_eq!(case_outcome(&CaseStatus::Passed).1, 11);
        assert_eq!(
            case_outcome(&CaseStatus::Failure {
                message: "m".into(),
                text: "t".into()
            })
            .1,
            12
        );
        assert_eq!(
            case_outcome(&CaseStatus::Error {
                message: "m".into(),
                text: "t".into()
            })
            .1,
            5
        );
        assert_eq!(case_outcome(&CaseStatus::Skipped).1, 20);
        // Passed cases carry no diagnostic log.
        assert_eq!(case_outcome(&CaseStatus::Passed).2, "");
    }

    #[test]
    fn testtool_string_yields_header_fields() {
        let (name, version, python) = parse_testtool("PyTest 6.2.5 (Python 3.9.0)");
        assert_eq!(name, "PyTest");
        assert_eq!(version, "6.2.5");
        assert_eq!(python, "3.9.0");
    }

    #[test]
    fn unmatched_testtool_string_leaves_header_fields_empty() {
        assert_eq!(parse_testtool("not a tool banner"), Default::default());
        assert_eq!(parse_testtool(""), Default::default());
    }

    #[test]
    fn release_candidate_versions_are_accepted() {
        let (name, version, python) = parse_testtool("py test 7.0.0rc1 (Python 3.11.0b4)");
        assert_eq!(name, "py test");
        assert_eq!(version, "7.0.0rc1");
        assert_eq!(python, "3.11.0b4");
    }
}
