//! Relational field length constraints.
//!
//! Identifying fields (project/variant, target software version) are strict:
//! overflow is fatal. Descriptive fields are truncated with an ellipsis
//! suffix instead. Lengths are counted in characters, matching the storage
//! schema's character columns.

use crate::errors::{ImportError, ImportResult};

/// Suffix appended to truncated values.
pub const TRUNCATION_SUFFIX: &str = "...";

/// Maximum length for a registered field name, `None` when unregistered.
pub fn max_length(field: &str) -> Option<usize> {
    let max = match field {
        "project" => 20,
        "variant" => 20,
        "branch" => 20,
        "version_sw_target" => 100,
        "version_sw_test" => 100,
        "version_hardware" => 100,
        "jenkinsurl" => 255,
        "reporting_qualitygate" => 45,
        "name" => 255,
        "tester_account" => 100,
        "tester_machine" => 45,
        "origin" => 45,
        "testtoolconfiguration_testtoolname" => 45,
        "testtoolconfiguration_testtoolversionstring" => 255,
        "testtoolconfiguration_projectname" => 255,
        "testtoolconfiguration_logfileencoding" => 45,
        "testtoolconfiguration_pythonversion" => 255,
        "testtoolconfiguration_testfile" => 255,
        "testtoolconfiguration_logfilepath" => 255,
        "testtoolconfiguration_logfilemode" => 45,
        "testtoolconfiguration_ctrlfilepath" => 255,
        "testtoolconfiguration_configfile" => 255,
        "testtoolconfiguration_confname" => 255,
        "testfileheader_author" => 255,
        "testfileheader_project" => 255,
        "testfileheader_testfiledate" => 255,
        "testfileheader_version_major" => 45,
        "testfileheader_version_minor" => 45,
        "testfileheader_version_patch" => 45,
        "testfileheader_keyword" => 255,
        "testfileheader_shortdescription" => 255,
        "testexecution_useraccount" => 255,
        "testexecution_computername" => 255,
        "testrequirements_documentmanagement" => 255,
        "testrequirements_testenvironment" => 255,
        "testbenchconfig_name" => 255,
        "preprocessor_filter" => 45,
        "issue" => 50,
        "tcid" => 50,
        "fid" => 255,
        "component" => 45,
        _ => return None,
    };
    Some(max)
}

/// Strict check: the value unchanged when within bound, fatal otherwise.
pub fn check<'a>(field: &str, value: &'a str) -> ImportResult<&'a str> {
    let Some(max) = max_length(field) else {
        return Err(ImportError::UnknownField {
            field: field.to_string(),
        });
    };
    if value.chars().count() > max {
        return Err(ImportError::FieldTooLong {
            field: field.to_string(),
            value: value.to_string(),
            max,
        });
    }
    Ok(value)
}

/// Truncate `value` to at most `max` characters, marking the cut with
/// `suffix`. When `max` does not even fit the suffix, the suffix itself is
/// truncated to `max` characters.
pub fn truncate_with(value: &str, max: usize, suffix: &str) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let suffix_len = suffix.chars().count();
    if max <= suffix_len {
        return suffix.chars().take(max).collect();
    }
    let mut out: String = value.chars().take(max - suffix_len).collect();
    out.push_str(suffix);
    out
}

/// Truncate with the default ellipsis suffix.
pub fn truncate(value: &str, max: usize) -> String {
    truncate_with(value, max, TRUNCATION_SUFFIX)
}

/// Truncate against a registered field's bound.
///
/// Panics in debug builds on unregistered fields; the field set is fixed at
/// compile time so this is a programming error, not an input error.
pub fn truncate_field(field: &str, value: &str) -> String {
    let max = max_length(field).unwrap_or_else(|| {
        debug_assert!(false, "unregistered field {field}");
        usize::MAX
    });
    truncate(value, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_check_passes_values_within_bound() {
        assert_eq!(check("variant", "PyTest").unwrap(), "PyTest");
    }

    #[test]
    fn strict_check_rejects_overlong_values() {
        let long = "x".repeat(21);
        match check("variant", &long) {
            Err(ImportError::FieldTooLong { field, max, .. }) => {
                assert_eq!(field, "variant");
                assert_eq!(max, 20);
            }
            other => panic!("expected FieldTooLong, got {other:?}"),
        }
    }

    #[test]
    fn strict_check_rejects_unregistered_fields() {
        assert!(matches!(
            check("no_such_field", "v"),
            Err(ImportError::UnknownField { .. })
        ));
    }

    #[test]
    fn truncation_keeps_total_length_at_bound() {
        assert_eq!(truncate("abcdefgh", 5), "ab...");
        assert_eq!(truncate("abc", 5), "abc");
    }

    #[test]
    fn truncation_handles_bounds_smaller_than_the_suffix() {
        assert_eq!(truncate("abcdefgh", 2), "..");
        assert_eq!(truncate("abcdefgh", 3), "...");
        assert_eq!(truncate("abcdefgh", 0), "");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        assert_eq!(truncate("ääääääää", 5), "ää...");
    }
}
