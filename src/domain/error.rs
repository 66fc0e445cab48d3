//! Domain error types.

use chrono::{DateTime, Utc};

/// Top-level error type for fxbracket.
#[derive(Debug, thiserror::Error)]
pub enum FxError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("invalid bar at {timestamp}: {reason}")]
    InvalidBar {
        timestamp: DateTime<Utc>,
        reason: String,
    },

    #[error("insufficient data: have {bars} bars, need at least {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FxError {
    pub(crate) fn missing(section: &str, key: &str) -> Self {
        FxError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        FxError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&FxError> for std::process::ExitCode {
    fn from(err: &FxError) -> Self {
        let code: u8 = match err {
            FxError::Io(_) => 1,
            FxError::ConfigParse { .. }
            | FxError::ConfigMissing { .. }
            | FxError::ConfigInvalid { .. } => 2,
            FxError::DataSource { .. } => 3,
            FxError::InvalidBar { .. } | FxError::InsufficientData { .. } => 5,
            FxError::Report { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
