#[cfg(test)]
pub(crate) mod capture;
pub mod config;
mod filters;
mod formatter;

pub use config::{LogFormat, LoggingConfig};
pub use filters::build_filter_from_config;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level '{0}'")]
    InvalidLevel(String),
    #[error("invalid log format '{0}', expected pretty, compact or json")]
    InvalidFormat(String),
    #[error("global subscriber already installed: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs the global `tracing` subscriber described by `config`.
///
/// Environment overrides are applied first. Fails if a global subscriber is
/// already set.
pub fn init_logging(mut config: LoggingConfig) -> Result<(), LoggingError> {
    config.apply_env_overrides();
    config.validate()?;

    tracing_subscriber::registry()
        .with(filters::build_filter_from_config(&config))
        .with(formatter::build_formatter_from_config(&config))
        .try_init()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.level,
        format = %config.format,
        "Logging system initialized"
    );
    Ok(())
}
