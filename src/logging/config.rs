use std::{env, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::LoggingError;

/// Output format of the console layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(LoggingError::InvalidFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        })
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for this crate: trace, debug, info, warn or error.
    pub level: String,
    pub format: LogFormat,
    pub ansi: bool,
    pub with_target: bool,
    /// Extra `target=level` directives appended to the filter.
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            ansi: true,
            with_target: true,
            directives: Vec::new(),
        }
    }
}

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl LoggingConfig {
    pub const ENV_LEVEL: &'static str = "NSHUB_LOG_LEVEL";
    pub const ENV_FORMAT: &'static str = "NSHUB_LOG_FORMAT";

    /// Applies `NSHUB_LOG_LEVEL` and `NSHUB_LOG_FORMAT`.
    ///
    /// An unparsable format in the environment is reported and ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var(Self::ENV_LEVEL) {
            self.level = level.trim().to_ascii_lowercase();
        }
        if let Ok(format) = env::var(Self::ENV_FORMAT) {
            match format.parse() {
                Ok(f) => self.format = f,
                Err(e) => eprintln!("Ignoring {}: {e}", Self::ENV_FORMAT),
            }
        }
    }

    pub fn validate(&self) -> Result<(), LoggingError> {
        if !LEVELS.contains(&self.level.as_str()) {
            return Err(LoggingError::InvalidLevel(self.level.clone()));
        }
        Ok(())
    }

    /// Filter directive for `EnvFilter`, e.g. `"nshub=debug,other=warn"`.
    pub fn build_filter_directive(&self) -> String {
        let mut parts = vec![format!("nshub={}", self.level)];
        parts.extend(self.directives.iter().cloned());
        parts.join(",")
    }
}
