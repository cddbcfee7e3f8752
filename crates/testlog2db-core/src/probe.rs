//! Environment probe: the injectable source of environment-derived metadata
//! defaults, so tests can substitute deterministic fakes.

/// Supplies built-in defaults for metadata the operator did not provide.
pub trait EnvironmentProbe {
    /// Account name of the user running the import; used as the default
    /// tester. Empty when the environment does not expose one.
    fn current_user(&self) -> String;

    /// Default testtool description string. The importer cannot observe the
    /// toolchain that produced the reports, so this is empty unless the
    /// configuration supplies one.
    fn default_testtool(&self) -> String {
        String::new()
    }
}

/// Production probe reading the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl EnvironmentProbe for SystemProbe {
    fn current_user(&self) -> String {
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_default()
    }
}

/// Fixed-value probe for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    pub user: String,
    pub testtool: String,
}

impl EnvironmentProbe for StaticProbe {
    fn current_user(&self) -> String {
        self.user.clone()
    }

    fn default_testtool(&self) -> String {
        self.testtool.clone()
    }
}
