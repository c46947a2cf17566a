//! Configuration errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Numeric option outside its accepted range
    #[error("{field} = {value} is outside {min}..={max} ({hint})")]
    OutOfRange {
        field: &'static str,
        value: usize,
        min: usize,
        max: usize,
        hint: &'static str,
    },

    /// Budgets are `None` (unbounded) or at least 1
    #[error("{0} must be at least 1; use no value for an unbounded run")]
    ZeroBudget(&'static str),

    /// Two options that cannot be combined
    #[error("{issue}; {fix}")]
    Conflict { issue: String, fix: &'static str },

    #[error("configuration file has no 'version' key (expected 'version: 1')")]
    MissingVersion,

    #[error("configuration version {found} is not supported (supported: {supported:?})")]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    #[error("unknown preset '{0}' (expected fast, balanced, thorough or custom)")]
    UnknownPreset(String),

    #[error("cannot read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed configuration YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    pub fn out_of_range(
        field: &'static str,
        value: usize,
        min: usize,
        max: usize,
        hint: &'static str,
    ) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
            hint,
        }
    }

    pub fn conflict(issue: impl Into<String>, fix: &'static str) -> Self {
        Self::Conflict {
            issue: issue.into(),
            fix,
        }
    }
}
