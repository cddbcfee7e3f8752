//! Component mapping: resolve a test's fully-qualified class name to an
//! organizational component label.

/// Label reported when no mapping applies.
pub const UNKNOWN_COMPONENT: &str = "unknown";

/// One declared mapping rule: a component label and the class-name
/// substrings that select it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRule {
    pub label: String,
    pub patterns: Vec<String>,
}

/// The `components` configuration value.
///
/// Keeps the config file's string-or-mapping flexibility as an explicit
/// tagged variant; rules preserve the declaration order of the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ComponentSpec {
    /// No mapping configured; every test is `unknown`.
    #[default]
    Unset,
    /// A single label for every test, unconditionally.
    Fixed(String),
    /// Ordered rules; the first label with a matching substring wins.
    Rules(Vec<ComponentRule>),
}

impl ComponentSpec {
    /// Resolve the component label for a class name.
    ///
    /// Never fails; absence of a mapping is a valid default.
    pub fn resolve<'a>(&'a self, classname: &str) -> &'a str {
        match self {
            ComponentSpec::Unset => UNKNOWN_COMPONENT,
            ComponentSpec::Fixed(label) => label,
            ComponentSpec::Rules(rules) => rules
                .iter()
                .find(|rule| rule.patterns.iter().any(|p| classname.contains(p.as_str())))
                .map(|rule| rule.label.as_str())
                .unwrap_or(UNKNOWN_COMPONENT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(spec: &[(&str, &[&str])]) -> ComponentSpec {
        ComponentSpec::Rules(
            spec.iter()
                .map(|(label, patterns)| ComponentRule {
                    label: (*label).to_string(),
                    patterns: patterns.iter().map(|p| (*p).to_string()).collect(),
                })
                .collect(),
        )
    }

    #[test]
    fn unset_mapping_yields_unknown() {
        assert_eq!(ComponentSpec::Unset.resolve("tests.api.TestLogin"), "unknown");
    }

    #[test]
    fn fixed_label_applies_unconditionally() {
        let spec = ComponentSpec::Fixed("gateway".to_string());
        assert_eq!(spec.resolve("anything.at.all"), "gateway");
    }

    #[test]
    fn first_declared_match_wins_over_later_rules() {
        // "xyz" contains both "x" (A) and "xy" (B); declaration order decides.
        let spec = rules(&[("A", &["x"]), ("B", &["xy"])]);
        assert_eq!(spec.resolve("xyz"), "A");
    }

    #[test]
    fn any_pattern_in_a_list_selects_the_label() {
        let spec = rules(&[("storage", &["tests.db", "tests.cache"])]);
        assert_eq!(spec.resolve("tests.cache.TestEviction"), "storage");
    }

    #[test]
    fn unmatched_class_names_fall_back_to_unknown() {
        let spec = rules(&[("storage", &["tests.db"])]);
        assert_eq!(spec.resolve("tests.ui.TestRender"), "unknown");
    }
}
