use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PS_PROGRAM: &str = "ps";
// Columns requested from ps: process id and resident set size in KiB
pub const PS_COLUMNS: &str = "pid,rss";
pub const ENV_PREFIX: &str = "WORKER_METRICS";
pub const DEFAULT_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_LOG_FILTER: &str = "info,worker_metrics=debug";

/// Registry back end selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Per-key locking, the default
    #[default]
    DashMap,
    /// One mutex around the whole map
    Mutex,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dashmap" | "sharded" => Ok(StorageBackend::DashMap),
            "mutex" | "locked" => Ok(StorageBackend::Mutex),
            _ => Err(ConfigError::UnknownStorage {
                value: value.to_string(),
            }),
        }
    }
}

/// Collector settings, from an optional file layered under `WORKER_METRICS_*`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub ps_program: String,
    pub interval_secs: u64,
    pub storage: String,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            ps_program: DEFAULT_PS_PROGRAM.to_string(),
            interval_secs: DEFAULT_INTERVAL_SECS,
            storage: "dashmap".to_string(),
            log_level: None,
            log_file: None,
        }
    }
}

impl CollectorConfig {
    /// Load defaults, then `path` (TOML/JSON/YAML by extension), then environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        let loaded: CollectorConfig = builder
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.ps_program.trim().is_empty() {
            return Err(ConfigError::EmptyProgram);
        }
        self.storage_backend()?;
        Ok(())
    }

    pub fn storage_backend(&self) -> Result<StorageBackend, ConfigError> {
        self.storage.parse()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    struct EnvGuard {
        key: String,
        original: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let original = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                original,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.original {
                Some(val) => env::set_var(&self.key, val),
                None => env::remove_var(&self.key),
            }
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_file() {
        let config = CollectorConfig::load(None).unwrap();
        assert_eq!(config, CollectorConfig::default());
        assert_eq!(config.interval(), Duration::from_secs(DEFAULT_INTERVAL_SECS));
        assert_eq!(config.storage_backend().unwrap(), StorageBackend::DashMap);
    }

    #[test]
    #[serial]
    fn test_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metrics.toml");
        fs::write(
            &path,
            "ps_program = \"/usr/bin/ps\"\ninterval_secs = 10\nstorage = \"mutex\"\n",
        )
        .unwrap();

        let config = CollectorConfig::load(Some(&path)).unwrap();

        assert_eq!(config.ps_program, "/usr/bin/ps");
        assert_eq!(config.interval_secs, 10);
        assert_eq!(config.storage_backend().unwrap(), StorageBackend::Mutex);
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metrics.toml");
        fs::write(&path, "interval_secs = 10\n").unwrap();
        let _guard = EnvGuard::set("WORKER_METRICS_INTERVAL_SECS", "2");

        let config = CollectorConfig::load(Some(&path)).unwrap();

        assert_eq!(config.interval_secs, 2);
    }

    #[test]
    #[serial]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = CollectorConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_validation() {
        let zero = CollectorConfig {
            interval_secs: 0,
            ..CollectorConfig::default()
        };
        assert!(matches!(zero.validate(), Err(ConfigError::ZeroInterval)));

        let blank = CollectorConfig {
            ps_program: "  ".to_string(),
            ..CollectorConfig::default()
        };
        assert!(matches!(blank.validate(), Err(ConfigError::EmptyProgram)));

        let unknown = CollectorConfig {
            storage: "redis".to_string(),
            ..CollectorConfig::default()
        };
        assert!(matches!(
            unknown.validate(),
            Err(ConfigError::UnknownStorage { .. })
        ));
    }
}
