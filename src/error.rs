//! Unified error handling for the worker metrics collector
//!
//! The collection pipeline itself never fails: every error below is either
//! logged and degraded inside `collect_metrics()`, or surfaced from setup
//! paths (configuration, argument parsing) and the lower-level `try_*` helpers.

use std::io;
use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Process table inspection errors
    #[error("Process tree error: {0}")]
    ProcessTree(#[from] crate::core::process_tree::ProcessTreeError),

    /// External accounting tool errors
    #[error("Sampler error: {0}")]
    Sampler(#[from] SamplerError),

    /// Registry errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        value: Option<String>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl MetricsError {
    /// Errors the caller can expect to go away on the next collection cycle
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MetricsError::ProcessTree(_) | MetricsError::Sampler(_) | MetricsError::Io(_)
        )
    }
}

/// Result type alias for convenience
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Errors raised while invoking or reading the external accounting tool
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("unexpected field count {count} in line {line:?}")]
    FieldCount { line: String, count: usize },
    #[error("invalid number {value:?} in line {line:?}")]
    InvalidNumber { line: String, value: String },
}

/// Registry-specific errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid worker spec {spec:?}: {reason}")]
    InvalidWorkerSpec { spec: String, reason: String },
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("interval_secs must be greater than zero")]
    ZeroInterval,
    #[error("ps_program cannot be empty")]
    EmptyProgram,
    #[error("unknown storage backend {value:?}. Allowed values: dashmap, mutex")]
    UnknownStorage { value: String },
}

/// Convenience functions for creating common errors
pub mod errors {
    use super::*;

    pub fn validation_error(
        message: impl Into<String>,
        field: Option<String>,
        value: Option<String>,
    ) -> MetricsError {
        MetricsError::Validation {
            message: message.into(),
            field,
            value,
        }
    }

    pub fn invalid_worker_spec(spec: impl Into<String>, reason: impl Into<String>) -> RegistryError {
        RegistryError::InvalidWorkerSpec {
            spec: spec.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let spawn = MetricsError::from(SamplerError::Spawn {
            program: "ps".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        });
        assert!(spawn.is_transient());

        let config = MetricsError::from(ConfigError::ZeroInterval);
        assert!(!config.is_transient());
    }

    #[test]
    fn test_error_messages() {
        let err = SamplerError::FieldCount {
            line: "1 2 3".to_string(),
            count: 3,
        };
        assert!(err.to_string().contains("field count 3"));

        let err = errors::invalid_worker_spec("1:x", "process id is not a number");
        assert!(err.to_string().contains("1:x"));
        assert!(err.to_string().contains("not a number"));
    }
}
