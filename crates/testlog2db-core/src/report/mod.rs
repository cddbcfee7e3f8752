//! Report documents: the in-memory model of pytest JUnit-XML results, the
//! parser that produces it, and the multi-document merge engine.

mod merge;
mod parse;

pub use merge::{merge_reports, MergedReport};
pub use parse::{parse_report, parse_report_str};

use chrono::NaiveDateTime;

/// One parsed report document: a suite collection.
#[derive(Debug, Clone, Default)]
pub struct ReportDocument {
    pub suites: Vec<ReportSuite>,
}

/// One `<testsuite>` element.
#[derive(Debug, Clone)]
pub struct ReportSuite {
    pub name: String,
    pub hostname: String,
    pub timestamp: NaiveDateTime,
    pub duration_secs: f64,
    pub cases: Vec<ReportCase>,
}

/// One `<testcase>` element.
#[derive(Debug, Clone)]
pub struct ReportCase {
    pub classname: String,
    pub name: String,
    pub duration_secs: f64,
    pub status: CaseStatus,
}

/// Reported outcome of a test case. Only the first failure/error/skipped
/// child of a testcase is significant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaseStatus {
    #[default]
    Passed,
    Failure {
        message: String,
        text: String,
    },
    Error {
        message: String,
        text: String,
    },
    Skipped,
}
