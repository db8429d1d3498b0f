use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_timeout_seconds() -> f64 {
    10.0
}

fn default_max_memory_mb() -> f64 {
    512.0
}

fn default_max_cpu_percent() -> f64 {
    25.0
}

fn default_check_interval() -> f64 {
    0.1
}

/// Limits and I/O wiring for a single supervised run. Immutable once the run
/// starts.
///
/// `max_cpu_percent` uses the per-core convention: 100 means one full logical
/// core, so values above 100 are meaningful on multi-core hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisorConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,
    #[serde(default = "default_max_memory_mb")]
    pub max_memory_mb: f64,
    #[serde(default = "default_max_cpu_percent")]
    pub max_cpu_percent: f64,
    #[serde(default)]
    pub input_file: Option<PathBuf>,
    #[serde(default)]
    pub output_file: Option<PathBuf>,
    #[serde(default = "default_check_interval")]
    pub check_interval: f64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            max_memory_mb: default_max_memory_mb(),
            max_cpu_percent: default_max_cpu_percent(),
            input_file: None,
            output_file: None,
            check_interval: default_check_interval(),
        }
    }
}

impl SupervisorConfig {
    /// Reads an override document. Fields absent from the document keep their
    /// defaults; unknown keys are ignored.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds the effective configuration: defaults, then the optional JSON
    /// document, then explicit overrides, which always win. Validates the
    /// result.
    pub fn resolve(
        file: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let base = match file {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        let config = overrides.apply(base);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("timeout_seconds", self.timeout_seconds),
            ("max_memory_mb", self.max_memory_mb),
            ("max_cpu_percent", self.max_cpu_percent),
            ("check_interval", self.check_interval),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        Ok(())
    }

    /// Consecutive out-of-band CPU samples needed before the limit counts as
    /// violated. Covers roughly one second of wall time at the configured
    /// interval, never less than one sample.
    pub fn cpu_strike_limit(&self) -> u32 {
        (1.0 / self.check_interval).ceil().max(1.0) as u32
    }
}

/// Explicit per-field overrides, applied after any config file. `None` leaves
/// the underlying value untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub timeout_seconds: Option<f64>,
    pub max_memory_mb: Option<f64>,
    pub max_cpu_percent: Option<f64>,
    pub input_file: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub check_interval: Option<f64>,
}

impl ConfigOverrides {
    pub fn apply(self, mut config: SupervisorConfig) -> SupervisorConfig {
        if let Some(value) = self.timeout_seconds {
            config.timeout_seconds = value;
        }
        if let Some(value) = self.max_memory_mb {
            config.max_memory_mb = value;
        }
        if let Some(value) = self.max_cpu_percent {
            config.max_cpu_percent = value;
        }
        if let Some(path) = self.input_file {
            config.input_file = Some(path);
        }
        if let Some(path) = self.output_file {
            config.output_file = Some(path);
        }
        if let Some(value) = self.check_interval {
            config.check_interval = value;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn write_temp_config(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "proclimit_config_{}.json",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = SupervisorConfig::default();
        assert_eq!(config.timeout_seconds, 10.0);
        assert_eq!(config.max_memory_mb, 512.0);
        assert_eq!(config.max_cpu_percent, 25.0);
        assert_eq!(config.input_file, None);
        assert_eq!(config.output_file, None);
        assert_eq!(config.check_interval, 0.1);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let path = write_temp_config(r#"{"timeout_seconds": 3.5}"#);
        let config = SupervisorConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.timeout_seconds, 3.5);
        assert_eq!(config.max_memory_mb, 512.0);
        assert_eq!(config.check_interval, 0.1);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let path = write_temp_config(r#"{"max_memory_mb": 64.0, "score_weight": 2}"#);
        let config = SupervisorConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.max_memory_mb, 64.0);
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let path = write_temp_config("{not json");
        let err = SupervisorConfig::from_json_file(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join(format!(
            "proclimit_missing_{}.json",
            uuid::Uuid::new_v4()
        ));
        let err = SupervisorConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn explicit_overrides_win_over_the_file() {
        let path = write_temp_config(r#"{"timeout_seconds": 3.5, "max_cpu_percent": 80.0}"#);
        let overrides = ConfigOverrides {
            timeout_seconds: Some(1.0),
            input_file: Some(PathBuf::from("stdin.txt")),
            ..Default::default()
        };
        let config = SupervisorConfig::resolve(Some(&path), overrides).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.timeout_seconds, 1.0);
        assert_eq!(config.max_cpu_percent, 80.0);
        assert_eq!(config.input_file, Some(PathBuf::from("stdin.txt")));
    }

    #[test]
    fn validation_rejects_non_positive_fields() {
        let mut config = SupervisorConfig::default();
        config.check_interval = 0.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "check_interval",
                ..
            }
        ));

        config.check_interval = 0.1;
        config.max_memory_mb = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn strike_limit_tracks_the_interval() {
        let mut config = SupervisorConfig::default();
        assert_eq!(config.cpu_strike_limit(), 10);

        config.check_interval = 0.25;
        assert_eq!(config.cpu_strike_limit(), 4);

        config.check_interval = 3.0;
        assert_eq!(config.cpu_strike_limit(), 1);
    }
}
