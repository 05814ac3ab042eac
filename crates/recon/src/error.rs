use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    /// Structurally invalid tabular input (no header + data row, bad quoting).
    Parse { input: String, reason: String },
    /// Missing source or candidate data.
    Validation(String),
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (thresholds, weights, aliases, feeds).
    ConfigValidation(String),
    /// CSV export failure.
    Export(String),
}

impl ReconError {
    pub fn parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse { input: input.into(), reason: reason.into() }
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { input, reason } => write!(f, "cannot parse '{input}': {reason}"),
            Self::Validation(msg) => write!(f, "invalid input: {msg}"),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Export(msg) => write!(f, "export error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
