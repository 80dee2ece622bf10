use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Errors raised while building or walking a namespace tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamespaceError {
    /// Constructor input violates the node invariants.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// A parent-chain walk from `path` did not reach a root within `steps`.
    #[error("cycle detected in parent chain of '{path}' after {steps} steps")]
    CycleDetected { path: String, steps: usize },

    /// Creating `path` would exceed the configured depth limit.
    #[error("namespace '{path}' exceeds the depth limit of {limit}")]
    DepthLimitExceeded { path: String, limit: usize },
}

impl NamespaceError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

impl ErrorExt for NamespaceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidArgument { .. } => StatusCode::InvalidArgs,
            Self::CycleDetected { .. } => StatusCode::CycleDetected,
            Self::DepthLimitExceeded { .. } => StatusCode::DepthLimit,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "namespace".to_string()),
            ("status_code", self.status_code().to_string()),
        ];

        match self {
            Self::CycleDetected { path, .. } | Self::DepthLimitExceeded { path, .. } => {
                tags.push(("namespace", path.clone()));
            }
            Self::InvalidArgument { .. } => {}
        }

        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            NamespaceError::invalid("empty").status_code(),
            StatusCode::InvalidArgs
        );
        assert_eq!(
            NamespaceError::CycleDetected {
                path: "a".into(),
                steps: 3
            }
            .status_code(),
            StatusCode::CycleDetected
        );
        assert_eq!(
            NamespaceError::DepthLimitExceeded {
                path: "a:b".into(),
                limit: 1
            }
            .status_code(),
            StatusCode::DepthLimit
        );
    }

    #[test]
    fn test_display() {
        let err = NamespaceError::invalid("segment must not be empty");
        assert_eq!(
            err.to_string(),
            "invalid argument: segment must not be empty"
        );
    }

    #[test]
    fn test_metrics_tags_carry_namespace() {
        let err = NamespaceError::DepthLimitExceeded {
            path: "a:b:c".into(),
            limit: 2,
        };
        let tags = err.metrics_tags();
        assert!(tags.iter().any(|(k, v)| *k == "namespace" && v == "a:b:c"));
    }
}
