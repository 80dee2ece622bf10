use std::{any::Any, error::Error};

use crate::StatusCode;

/// Extension implemented by every hub error (object-safe).
///
/// Gives a status code, downcasting through [`Any`], and the tags attached
/// to `tracing` events when the error is reported.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Status code of the error.
    ///
    /// Defaults to [`StatusCode::Internal`].
    fn status_code(&self) -> StatusCode {
        StatusCode::Internal
    }

    fn as_any(&self) -> &dyn Any;

    /// Key-value tags attached to `tracing` events.
    ///
    /// `error_type` is the short type name of the error.
    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let type_name = std::any::type_name::<Self>();
        let short = type_name.rsplit("::").next().unwrap_or(type_name);
        vec![
            ("error_type", short.to_string()),
            ("status_code", self.status_code().to_string()),
        ]
    }
}
