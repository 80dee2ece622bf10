use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Hub settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Name used by the factory when no hub name is given.
    pub default_hub: String,
    /// Soft listener limit per channel before a leak warning; 0 disables it.
    pub max_listeners: usize,
    /// Deepest namespace that can be created below a root; 0 means unlimited.
    pub max_depth: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            default_hub: "default".to_string(),
            max_listeners: 10,
            max_depth: 0,
        }
    }
}

impl HubConfig {
    pub const ENV_PREFIX: &'static str = "NSHUB";

    /// Loads defaults overridden by `NSHUB_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(None)
    }

    /// Like [`HubConfig::load`], with an optional config file in between.
    ///
    /// A missing file is not an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_sources(Some(path.as_ref()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_hub.is_empty() {
            return Err(ConfigError::invalid("default_hub", "must not be empty"));
        }
        Ok(())
    }

    fn from_sources(file: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            // Default values
            .set_default("default_hub", defaults.default_hub)?
            .set_default("max_listeners", defaults.max_listeners as i64)?
            .set_default("max_depth", defaults.max_depth as i64)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }

        // Environment variables with the NSHUB_ prefix
        let cfg = builder
            .add_source(Environment::with_prefix(Self::ENV_PREFIX).try_parsing(true))
            .build()?;

        let settings: Self = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use std::{env, io::Write};

    use serial_test::serial;

    use super::*;

    fn clear_env() {
        for key in ["NSHUB_DEFAULT_HUB", "NSHUB_MAX_LISTENERS", "NSHUB_MAX_DEPTH"] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_load_defaults() {
        clear_env();
        let cfg = HubConfig::load().unwrap();
        assert_eq!(cfg, HubConfig::default());
    }

    /// Test verifies that `NSHUB_*` variables override the defaults.
    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        env::set_var("NSHUB_MAX_LISTENERS", "3");
        env::set_var("NSHUB_DEFAULT_HUB", "main");

        let cfg = HubConfig::load().unwrap();
        clear_env();

        assert_eq!(cfg.max_listeners, 3);
        assert_eq!(cfg.default_hub, "main");
        assert_eq!(cfg.max_depth, 0);
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_depth = 4\ndefault_hub = \"files\"").unwrap();

        let cfg = HubConfig::load_from(file.path()).unwrap();
        assert_eq!(cfg.max_depth, 4);
        assert_eq!(cfg.default_hub, "files");
        assert_eq!(cfg.max_listeners, 10);
    }

    #[test]
    #[serial]
    fn test_missing_file_falls_back_to_defaults() {
        clear_env();
        let cfg = HubConfig::load_from("/nonexistent/nshub.toml").unwrap();
        assert_eq!(cfg, HubConfig::default());
    }

    #[test]
    fn test_validate_rejects_empty_default_hub() {
        let cfg = HubConfig {
            default_hub: String::new(),
            ..HubConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid {
                field: "default_hub",
                ..
            })
        ));
    }
}
