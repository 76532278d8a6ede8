//! Domain error types.

/// Top-level error type for tradesim.
#[derive(Debug, thiserror::Error)]
pub enum TradesimError {
    #[error("invalid risk: {reason}")]
    InvalidRisk { reason: String },

    #[error("shape mismatch: expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("invalid call: {reason}")]
    InvalidCall { reason: String },

    #[error("data error: {reason}")]
    DataError { reason: String },

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

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradesimError {
    pub fn data(reason: impl Into<String>) -> Self {
        TradesimError::DataError {
            reason: reason.into(),
        }
    }

    pub fn invalid_call(reason: impl Into<String>) -> Self {
        TradesimError::InvalidCall {
            reason: reason.into(),
        }
    }

    pub fn invalid_risk(reason: impl Into<String>) -> Self {
        TradesimError::InvalidRisk {
            reason: reason.into(),
        }
    }
}

impl From<&TradesimError> for std::process::ExitCode {
    fn from(err: &TradesimError) -> Self {
        let code: u8 = match err {
            TradesimError::Io(_) => 1,
            TradesimError::ConfigParse { .. }
            | TradesimError::ConfigMissing { .. }
            | TradesimError::ConfigInvalid { .. } => 2,
            TradesimError::DataError { .. } => 3,
            TradesimError::InvalidRisk { .. } => 4,
            TradesimError::ShapeMismatch { .. } | TradesimError::InvalidCall { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
