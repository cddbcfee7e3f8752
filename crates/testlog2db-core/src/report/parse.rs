//! JUnit-XML report parser.
//!
//! Accepts the pytest layout: a `<testsuites>` collection root, or a single
//! bare `<testsuite>` root. Malformed XML is a parse error; a well-formed
//! document with missing or non-numeric required attributes is a schema
//! error. Both abort the import.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{CaseStatus, ReportCase, ReportDocument, ReportSuite};
use crate::errors::{ImportError, ImportResult};
use crate::timefmt;

/// Parse a report document from a file.
pub fn parse_report(path: &Path) -> ImportResult<ReportDocument> {
    let label = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            ImportError::InputNotFound { path: label.clone() }
        } else {
            ImportError::Parse {
                path: label.clone(),
                reason: err.to_string(),
            }
        }
    })?;
    parse_report_str(&text, &label)
}

/// Parse a report document from its textual content. `label` names the
/// source in error messages.
pub fn parse_report_str(text: &str, label: &str) -> ImportResult<ReportDocument> {
    Parser::new(label).run(text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Failure,
    Error,
    Skipped,
}

impl StatusKind {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"failure" => Some(Self::Failure),
            b"error" => Some(Self::Error),
            b"skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

struct PendingSuite {
    name: String,
    hostname: String,
    timestamp_raw: String,
    time_raw: String,
    cases: Vec<ReportCase>,
}

struct PendingCase {
    classname: String,
    name: String,
    duration_secs: f64,
    status: Option<CaseStatus>,
}

struct StatusCapture {
    kind: StatusKind,
    message: String,
    text: String,
    /// False when the owning case already has a recorded status; later
    /// status elements are walked but discarded.
    record: bool,
}

struct Parser<'a> {
    label: &'a str,
    suites: Vec<ReportSuite>,
    suite: Option<PendingSuite>,
    case: Option<PendingCase>,
    status: Option<StatusCapture>,
}

impl<'a> Parser<'a> {
    fn new(label: &'a str) -> Self {
        Self {
            label,
            suites: Vec::new(),
            suite: None,
            case: None,
            status: None,
        }
    }

    fn parse_err(&self, reason: impl ToString) -> ImportError {
        ImportError::Parse {
            path: self.label.to_string(),
            reason: reason.to_string(),
        }
    }

    fn schema_err(&self, reason: impl Into<String>) -> ImportError {
        ImportError::Schema {
            path: self.label.to_string(),
            reason: reason.into(),
        }
    }

    fn run(mut self, text: &str) -> ImportResult<ReportDocument> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => self.on_start(&e, false)?,
                Ok(Event::Empty(e)) => self.on_start(&e, true)?,
                Ok(Event::End(e)) => self.on_end(e.name().as_ref())?,
                Ok(Event::Text(t)) => {
                    if let Some(status) = self.status.as_mut() {
                        let unescaped = t.unescape().map_err(|e| {
                            ImportError::Parse {
                                path: self.label.to_string(),
                                reason: e.to_string(),
                            }
                        })?;
                        push_text(&mut status.text, &unescaped);
                    }
                }
                Ok(Event::CData(t)) => {
                    if let Some(status) = self.status.as_mut() {
                        push_text(&mut status.text, &String::from_utf8_lossy(&t.into_inner()));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(self.parse_err(e)),
            }
        }

        if self.suite.is_some() || self.case.is_some() {
            return Err(self.parse_err("unexpected end of document"));
        }
        Ok(ReportDocument {
            suites: self.suites,
        })
    }

    fn on_start(&mut self, e: &BytesStart<'_>, empty: bool) -> ImportResult<()> {
        match e.name().as_ref() {
            b"testsuite" => {
                if self.suite.is_some() {
                    return Err(self.schema_err("nested <testsuite> elements are not supported"));
                }
                let suite = PendingSuite {
                    name: self.attr(e, "name")?.unwrap_or_default(),
                    hostname: self.attr(e, "hostname")?.unwrap_or_default(),
                    timestamp_raw: self
                        .attr(e, "timestamp")?
                        .ok_or_else(|| self.schema_err("<testsuite> is missing 'timestamp'"))?,
                    time_raw: self
                        .attr(e, "time")?
                        .ok_or_else(|| self.schema_err("<testsuite> is missing 'time'"))?,
                    cases: Vec::new(),
                };
                if empty {
                    self.finish_suite(suite)?;
                } else {
                    self.suite = Some(suite);
                }
            }
            b"testcase" => {
                if self.suite.is_none() {
                    return Err(self.schema_err("<testcase> outside of a <testsuite>"));
                }
                if self.case.is_some() {
                    return Err(self.schema_err("nested <testcase> elements are not supported"));
                }
                let classname = self
                    .attr(e, "classname")?
                    .ok_or_else(|| self.schema_err("<testcase> is missing 'classname'"))?;
                let name = self
                    .attr(e, "name")?
                    .ok_or_else(|| self.schema_err("<testcase> is missing 'name'"))?;
                let time_raw = self
                    .attr(e, "time")?
                    .ok_or_else(|| self.schema_err("<testcase> is missing 'time'"))?;
                let duration_secs = self.parse_secs(&time_raw, "testcase")?;
                let case = PendingCase {
                    classname,
                    name,
                    duration_secs,
                    status: None,
                };
                if empty {
                    self.push_case(case);
                } else {
                    self.case = Some(case);
                }
            }
            tag => {
                if let (Some(kind), Some(_)) = (StatusKind::from_tag(tag), self.case.as_ref()) {
                    let record = self
                        .case
                        .as_ref()
                        .is_some_and(|case| case.status.is_none());
                    let capture = StatusCapture {
                        kind,
                        message: self.attr(e, "message")?.unwrap_or_default(),
                        text: String::new(),
                        record,
                    };
                    if empty {
                        self.finish_status(capture);
                    } else {
                        self.status = Some(capture);
                    }
                }
            }
        }
        Ok(())
    }

    fn on_end(&mut self, tag: &[u8]) -> ImportResult<()> {
        match tag {
            b"testsuite" => {
                let suite = self
                    .suite
                    .take()
                    .ok_or_else(|| self.parse_err("unmatched </testsuite>"))?;
                self.finish_suite(suite)?;
            }
            b"testcase" => {
                let case = self
                    .case
                    .take()
                    .ok_or_else(|| self.parse_err("unmatched </testcase>"))?;
                self.push_case(case);
            }
            tag => {
                if StatusKind::from_tag(tag).is_some() {
                    if let Some(capture) = self.status.take() {
                        self.finish_status(capture);
                    }
                }
            }
        }
        Ok(())
    }

    fn push_case(&mut self, case: PendingCase) {
        let status = case.status.unwrap_or_default();
        if let Some(suite) = self.suite.as_mut() {
            suite.cases.push(ReportCase {
                classname: case.classname,
                name: case.name,
                duration_secs: case.duration_secs,
                status,
            });
        }
    }

    fn finish_status(&mut self, capture: StatusCapture) {
        let Some(case) = self.case.as_mut() else {
            return;
        };
        if !capture.record || case.status.is_some() {
            return;
        }
        case.status = Some(match capture.kind {
            StatusKind::Failure => CaseStatus::Failure {
                message: capture.message,
                text: capture.text,
            },
            StatusKind::Error => CaseStatus::Error {
                message: capture.message,
                text: capture.text,
            },
            StatusKind::Skipped => CaseStatus::Skipped,
        });
    }

    fn finish_suite(&mut self, suite: PendingSuite) -> ImportResult<()> {
        let timestamp = timefmt::parse_report_timestamp(&suite.timestamp_raw).map_err(|e| {
            self.schema_err(format!(
                "bad <testsuite> timestamp '{}': {e}",
                suite.timestamp_raw
            ))
        })?;
        let duration_secs = self.parse_secs(&suite.time_raw, "testsuite")?;
        self.suites.push(ReportSuite {
            name: suite.name,
            hostname: suite.hostname,
            timestamp,
            duration_secs,
            cases: suite.cases,
        });
        Ok(())
    }

    fn parse_secs(&self, raw: &str, element: &str) -> ImportResult<f64> {
        let secs: f64 = raw
            .parse()
            .map_err(|_| self.schema_err(format!("non-numeric <{element}> time '{raw}'")))?;
        if timefmt::seconds_to_delta(secs).is_none() {
            return Err(self.schema_err(format!("unusable <{element}> time '{raw}'")));
        }
        Ok(secs)
    }

    fn attr(&self, e: &BytesStart<'_>, name: &str) -> ImportResult<Option<String>> {
        for attr in e.attributes() {
            let attr = attr.map_err(|err| self.parse_err(err))?;
            if attr.key.as_ref() == name.as_bytes() {
                let value = attr.unescape_value().map_err(|err| self.parse_err(err))?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }
}

fn push_text(buf: &mut String, chunk: &str) {
    if !buf.is_empty() {
        buf.push('\n');
    }
    buf.push_str(chunk);
}
