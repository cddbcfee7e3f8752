//! Configuration file handling.
//!
//! The config file is a single JSON object. Keys are fixed; an unknown key
//! or a wrong value type is fatal. Parsing goes through an explicit
//! validation step that produces either a typed [`ImportConfig`] or an
//! enumerated `ConfigInvalid` reason.

use std::path::Path;

use serde_json::Value;

use crate::component::{ComponentRule, ComponentSpec};
use crate::errors::{ImportError, ImportResult};

/// Typed view of the configuration file.
#[derive(Debug, Clone, Default)]
pub struct ImportConfig {
    pub components: ComponentSpec,
    pub variant: Option<String>,
    pub version_sw: Option<String>,
    pub version_hw: Option<String>,
    pub version_test: Option<String>,
    pub testtool: Option<String>,
    pub tester: Option<String>,
}

impl ImportConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> ImportResult<Self> {
        let label = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                ImportError::InputNotFound { path: label.clone() }
            } else {
                ImportError::ConfigInvalid {
                    reason: format!("cannot read '{label}': {err}"),
                }
            }
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|err| {
            ImportError::ConfigInvalid {
                reason: format!("cannot parse '{label}': {err}"),
            }
        })?;
        Self::from_value(&value)
    }

    /// Validate a parsed JSON value into a typed configuration.
    pub fn from_value(value: &Value) -> ImportResult<Self> {
        let Some(object) = value.as_object() else {
            return Err(ImportError::ConfigInvalid {
                reason: "configuration root must be a JSON object".to_string(),
            });
        };

        let mut config = Self::default();
        for (key, entry) in object {
            match key.as_str() {
                "components" => config.components = parse_components(entry)?,
                "variant" => config.variant = Some(string_value(key, entry)?),
                "version_sw" => config.version_sw = Some(string_value(key, entry)?),
                "version_hw" => config.version_hw = Some(string_value(key, entry)?),
                "version_test" => config.version_test = Some(string_value(key, entry)?),
                "testtool" => config.testtool = Some(string_value(key, entry)?),
                "tester" => config.tester = Some(string_value(key, entry)?),
                other => {
                    return Err(ImportError::ConfigInvalid {
                        reason: format!("invalid key '{other}' in configuration file"),
                    });
                }
            }
        }
        Ok(config)
    }
}

fn string_value(key: &str, value: &Value) -> ImportResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ImportError::ConfigInvalid {
            reason: format!("value of '{key}' must be a string"),
        })
}

fn parse_components(value: &Value) -> ImportResult<ComponentSpec> {
    match value {
        // A blank label means "no mapping", not a component named "".
        Value::String(label) if label.trim().is_empty() => Ok(ComponentSpec::Unset),
        Value::String(label) => Ok(ComponentSpec::Fixed(label.clone())),
        Value::Object(mapping) => {
            let mut rules = Vec::with_capacity(mapping.len());
            for (label, patterns) in mapping {
                let patterns = match patterns {
                    Value::String(pattern) => vec![pattern.clone()],
                    Value::Array(entries) => entries
                        .iter()
                        .map(|entry| {
                            entry.as_str().map(str::to_string).ok_or_else(|| {
                                ImportError::ConfigInvalid {
                                    reason: format!(
                                        "patterns for component '{label}' must be strings"
                                    ),
                                }
                            })
                        })
                        .collect::<ImportResult<Vec<_>>>()?,
                    _ => {
                        return Err(ImportError::ConfigInvalid {
                            reason: format!(
                                "value of component '{label}' must be a string or string array"
                            ),
                        });
                    }
                };
                rules.push(ComponentRule {
                    label: label.clone(),
                    patterns,
                });
            }
            Ok(ComponentSpec::Rules(rules))
        }
        _ => Err(ImportError::ConfigInvalid {
            reason: "value of 'components' must be a string or an object".to_string(),
        }),
    }
}
