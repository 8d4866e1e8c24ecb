//! List model tunables.
//!
//! [`ListModelConfig`] can be built in code, parsed from TOML, read from a
//! TOML file, or pulled out of a [`Settings`] group. Missing keys take their
//! defaults; zero attempts or a zero batch size are rejected.
//!
//! ```
//! use cashpoint_model::config::ListModelConfig;
//!
//! let config = ListModelConfig::from_toml_str("attempts_count = 5").unwrap();
//! assert_eq!(config.attempts_count, 5);
//! assert_eq!(config.request_batch_size, 256);
//! assert!(config.escape_filter);
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::settings::{FromSettingsValue, Settings};

/// Default number of server request attempts.
pub const DEFAULT_ATTEMPTS_COUNT: u32 = 3;
/// Default number of rows requested per server round trip.
pub const DEFAULT_REQUEST_BATCH_SIZE: usize = 256;

/// Tunables applied to a [`ListSqlModel`](crate::ListSqlModel) at construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListModelConfig {
    /// How many times a server update is attempted before giving up.
    pub attempts_count: u32,
    /// Rows requested per server round trip.
    pub request_batch_size: usize,
    /// Whether filters are rewritten into LIKE patterns before dispatch.
    pub escape_filter: bool,
}

impl Default for ListModelConfig {
    fn default() -> Self {
        Self {
            attempts_count: DEFAULT_ATTEMPTS_COUNT,
            request_batch_size: DEFAULT_REQUEST_BATCH_SIZE,
            escape_filter: true,
        }
    }
}

impl ListModelConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Reads the keys of the settings group at `group`.
    ///
    /// Missing keys take their defaults. A key that is present but holds a
    /// value of the wrong type or sign is an [`ConfigError::InvalidValue`].
    pub fn from_settings(settings: &Settings, group: &str) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            attempts_count: setting(settings, group, "attempts_count", defaults.attempts_count)?,
            request_batch_size: setting(
                settings,
                group,
                "request_batch_size",
                defaults.request_batch_size,
            )?,
            escape_filter: setting(settings, group, "escape_filter", defaults.escape_filter)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the model cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attempts_count == 0 {
            return Err(ConfigError::invalid_value(
                "attempts_count",
                "must be at least 1",
            ));
        }
        if self.request_batch_size == 0 {
            return Err(ConfigError::invalid_value(
                "request_batch_size",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

fn setting<T: FromSettingsValue>(
    settings: &Settings,
    group: &str,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    let path = format!("{group}.{name}");
    if !settings.contains(&path) {
        return Ok(default);
    }
    settings.get(&path).ok_or_else(|| {
        ConfigError::invalid_value(
            name,
            format!("'{path}' does not hold a {}", std::any::type_name::<T>()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ListModelConfig::default();
        assert_eq!(config.attempts_count, 3);
        assert_eq!(config.request_batch_size, 256);
        assert!(config.escape_filter);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_str() {
        let config = ListModelConfig::from_toml_str(
            "attempts_count = 5\nrequest_batch_size = 50\nescape_filter = false\n",
        )
        .unwrap();
        assert_eq!(
            config,
            ListModelConfig {
                attempts_count: 5,
                request_batch_size: 50,
                escape_filter: false,
            }
        );

        assert_eq!(
            ListModelConfig::from_toml_str("").unwrap(),
            ListModelConfig::default()
        );
    }

    #[test]
    fn test_toml_errors() {
        assert!(matches!(
            ListModelConfig::from_toml_str("attempts_count = \"many\""),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            ListModelConfig::from_toml_str("retries = 2"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_zero_values_rejected() {
        let err = ListModelConfig::from_toml_str("attempts_count = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "attempts_count"
        ));

        let err = ListModelConfig::from_toml_str("request_batch_size = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "request_batch_size"
        ));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "request_batch_size = 128").unwrap();

        let config = ListModelConfig::load(file.path()).unwrap();
        assert_eq!(config.request_batch_size, 128);
        assert_eq!(config.attempts_count, DEFAULT_ATTEMPTS_COUNT);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        match ListModelConfig::load(&path) {
            Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings::new();
        settings.set("atm_list.attempts_count", 6);
        settings.set("atm_list.escape_filter", false);

        let config = ListModelConfig::from_settings(&settings, "atm_list").unwrap();
        assert_eq!(config.attempts_count, 6);
        assert_eq!(config.request_batch_size, DEFAULT_REQUEST_BATCH_SIZE);
        assert!(!config.escape_filter);

        settings.set("atm_list.request_batch_size", 0);
        assert!(ListModelConfig::from_settings(&settings, "atm_list").is_err());
    }

    #[test]
    fn test_from_settings_rejects_mistyped_values() {
        let settings = Settings::new();
        settings.set("bank_list.attempts_count", "5");

        let err = ListModelConfig::from_settings(&settings, "bank_list").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "attempts_count"
        ));

        settings.set("bank_list.attempts_count", 5);
        settings.set("bank_list.escape_filter", 1);
        let err = ListModelConfig::from_settings(&settings, "bank_list").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "escape_filter"
        ));
    }

    #[test]
    fn test_from_settings_rejects_negative_values() {
        let settings = Settings::new();
        settings.set("town_list.request_batch_size", -1);

        let err = ListModelConfig::from_settings(&settings, "town_list").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "request_batch_size"
        ));
    }
}
