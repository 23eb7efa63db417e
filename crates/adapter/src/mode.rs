//! Build mode and handler failure policy.

/// The mode an application build runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Production,
    Development,
    Test,
}

impl Mode {
    /// `"development"` and `"test"` select their modes, anything else, including
    /// no value at all, is production.
    pub fn resolve(value: Option<&str>) -> Self {
        match value {
            Some("development") => Mode::Development,
            Some("test") => Mode::Test,
            _ => Mode::Production,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Production => "production",
            Mode::Development => "development",
            Mode::Test => "test",
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::resolve(None)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to the raw response when a request cannot be served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the error and drop the response, the connection closes unanswered.
    #[default]
    Drop,
    /// Answer `500 Internal Server Error` with an empty body.
    InternalServerError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_mode() {
        assert_eq!(Mode::resolve(Some("development")), Mode::Development);
        assert_eq!(Mode::resolve(Some("test")), Mode::Test);
        assert_eq!(Mode::resolve(Some("production")), Mode::Production);
        assert_eq!(Mode::resolve(Some("staging")), Mode::Production);
        assert_eq!(Mode::resolve(Some("Development")), Mode::Production);
        assert_eq!(Mode::resolve(None), Mode::Production);
        assert_eq!(Mode::default(), Mode::Production);
    }

    #[test]
    fn display_mode() {
        assert_eq!(Mode::Development.to_string(), "development");
    }
}
