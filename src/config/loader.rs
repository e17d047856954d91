//! Configuration loading.
//!
//! Pipeline: size check, read, strip BOM, parse YAML, deserialize, validate,
//! then apply command-line overrides.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::ConfigError;

use super::schema::MatchConfig;
use super::validation::validate;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "ATTACKLINE_CONFIG";

/// Largest accepted config file (1 MB).
pub const MAX_CONFIG_SIZE: usize = 1024 * 1024;

/// Builds a [`MatchConfig`] from an optional file plus overrides.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    match_duration: Option<Duration>,
}

impl ConfigLoader {
    /// Loader with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides `match_duration_secs`, rounding down to whole seconds.
    #[must_use]
    pub const fn with_match_duration(mut self, duration: Option<Duration>) -> Self {
        self.match_duration = duration;
        self
    }

    /// Loads `path` if given, otherwise starts from defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingFile` if the file cannot be read,
    /// `ConfigError::ParseError` for malformed YAML, and
    /// `ConfigError::InvalidValue` when validation fails.
    pub fn load(&self, path: Option<&Path>) -> Result<MatchConfig, ConfigError> {
        let mut config = match path {
            Some(p) => Self::read_file(p)?,
            None => MatchConfig::default(),
        };

        if let Some(duration) = self.match_duration {
            config.match_duration_secs =
                u32::try_from(duration.as_secs()).map_err(|_| ConfigError::InvalidValue {
                    field: "match_duration".to_owned(),
                    value: humantime::format_duration(duration).to_string(),
                    expected: "a duration that fits in 32-bit seconds".to_owned(),
                })?;
        }

        validate(&config)?;
        debug!(
            duration_secs = config.match_duration_secs,
            per_action = config.challenges_per_action,
            "configuration loaded"
        );
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<MatchConfig, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if file_size > MAX_CONFIG_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_owned(),
                value: format!("{file_size} bytes"),
                expected: format!("at most {MAX_CONFIG_SIZE} bytes"),
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

        if raw.trim().is_empty() {
            return Err(ConfigError::ParseError {
                path: path.to_path_buf(),
                message: "configuration file is empty".to_owned(),
            });
        }

        serde_yaml::from_str(raw).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_file_gives_defaults() {
        let config = ConfigLoader::new().load(None).unwrap();
        assert_eq!(config, MatchConfig::default());
    }

    #[test]
    fn duration_override_wins() {
        let config = ConfigLoader::new()
            .with_match_duration(Some(Duration::from_secs(90)))
            .load(None)
            .unwrap();
        assert_eq!(config.match_duration_secs, 90);
    }

    #[test]
    fn sub_second_override_is_invalid() {
        let err = ConfigLoader::new()
            .with_match_duration(Some(Duration::from_millis(500)))
            .load(None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn missing_file_reported() {
        let err = ConfigLoader::new()
            .load(Some(Path::new("/nonexistent/attackline.yaml")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }
}
