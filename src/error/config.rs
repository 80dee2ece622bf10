use std::any::Any;

use nshub_error::{ErrorExt, StatusCode};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Load(_) => StatusCode::ConfigLoadFailed,
            Self::Invalid { .. } => StatusCode::ConfigInvalid,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_display_and_code() {
        let err = ConfigError::invalid("default_hub", "must not be empty");
        assert_eq!(
            err.to_string(),
            "invalid value for 'default_hub': must not be empty"
        );
        assert_eq!(err.status_code(), StatusCode::ConfigInvalid);
    }

    #[test]
    fn test_load_error_code() {
        let err = ConfigError::from(config::ConfigError::Message("broken".into()));
        assert_eq!(err.status_code(), StatusCode::ConfigLoadFailed);
        assert!(err.to_string().contains("broken"));
    }
}
