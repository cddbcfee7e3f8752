//! Multi-document merge with time-window reconciliation.
//!
//! The first document becomes the base; every later document contributes its
//! suites, in order, as additional children. No suite is ever dropped or
//! merged at the suite level. The batch window is computed over all suites:
//! start = min timestamp, end = max (timestamp + duration).

use chrono::NaiveDateTime;

use super::{ReportDocument, ReportSuite};
use crate::errors::{ImportError, ImportResult};
use crate::timefmt;

/// The merged batch: all suites in document order plus the reconciled
/// execution window.
#[derive(Debug, Clone)]
pub struct MergedReport {
    pub suites: Vec<ReportSuite>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl MergedReport {
    /// Window start in the storage encoding.
    pub fn start_db(&self) -> String {
        timefmt::format_db(self.start)
    }

    /// Window end in the storage encoding.
    pub fn end_db(&self) -> String {
        timefmt::format_db(self.end)
    }
}

/// Merge parsed documents into one suite list and compute the batch window.
///
/// No partial merge: any unusable suite aborts the whole import.
pub fn merge_reports(documents: Vec<ReportDocument>) -> ImportResult<MergedReport> {
    let mut suites: Vec<ReportSuite> = Vec::new();
    for document in documents {
        suites.extend(document.suites);
    }
    if suites.is_empty() {
        return Err(ImportError::Merge {
            reason: "no test suites in any input document".to_string(),
        });
    }

    let mut window: Option<(NaiveDateTime, NaiveDateTime)> = None;
    for suite in &suites {
        let delta = timefmt::seconds_to_delta(suite.duration_secs).ok_or_else(|| {
            ImportError::Merge {
                reason: format!("unusable duration on suite '{}'", suite.name),
            }
        })?;
        let suite_end = suite.timestamp + delta;
        window = Some(match window {
            None => (suite.timestamp, suite_end),
            Some((start, end)) => (start.min(suite.timestamp), end.max(suite_end)),
        });
    }
    let (start, end) = window.expect("non-empty suite list");

    Ok(MergedReport { suites, start, end })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::parse_report_str;

    fn doc(xml: &str) -> ReportDocument {
        parse_report_str(xml, "test.xml").unwrap()
    }

    fn suite(timestamp: &str, time: &str) -> String {
        format!(
            r#"<testsuite name="s" time="{time}" timestamp="{timestamp}">
                 <testcase classname="c" name="n" time="{time}"/>
               </testsuite>"#
        )
    }

    #[test]
    fn window_spans_min_timestamp_to_max_timestamp_plus_duration() {
        let first = doc(&format!(
            "<testsuites>{}{}</testsuites>",
            suite("2022-11-01T10:00:10", "5.0"),
            suite("2022-11-01T10:00:00", "2.0"),
        ));
        let second = doc(&suite("2022-11-01T09:59:50", "3.0"));

        let merged = merge_reports(vec![first, second]).unwrap();
        assert_eq!(merged.suites.len(), 3);
        assert_eq!(merged.start_db(), "2022-11-01 09:59:50");
        // 10:00:10 + 5s ends latest.
        assert_eq!(merged.end_db(), "2022-11-01 10:00:15");
    }

    #[test]
    fn suite_order_is_document_order() {
        let first = doc(&suite("2022-11-01T10:00:00", "1.0"));
        let mut second = doc(&suite("2022-11-01T11:00:00", "1.0"));
        second.suites[0].name = "later".to_string();

        let merged = merge_reports(vec![first, second]).unwrap();
        assert_eq!(merged.suites[0].name, "s");
        assert_eq!(merged.suites[1].name, "later");
    }

    #[test]
    fn single_suite_seeds_both_bounds() {
        let merged = merge_reports(vec![doc(&suite("2022-11-01T10:00:00", "6.5"))]).unwrap();
        assert_eq!(merged.start_db(), "2022-11-01 10:00:00");
        assert_eq!(merged.end_db(), "2022-11-01 10:00:06");
    }

    #[test]
    fn empty_input_is_a_merge_error() {
        assert!(matches!(
            merge_reports(vec![]),
            Err(ImportError::Merge { .. })
        ));
        assert!(matches!(
            merge_reports(vec![ReportDocument::default()]),
            Err(ImportError::Merge { .. })
        ));
    }
}
