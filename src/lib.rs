//! Worker Metrics Library
//!
//! Memory accounting for pools of long-lived worker processes: each worker's
//! resident memory is reported together with that of every process it spawned.

pub mod collector;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod platform;
pub mod registry;
pub mod storage;
pub mod utils;

// Re-export commonly used types for convenience
pub use collector::{ConfiguredCollector, WorkerMetricsCollector};
pub use crate::core::models::*;
pub use crate::core::process_tree::{ProcessTreeError, ProcessTreeResolver, PsutilTreeResolver};
pub use crate::core::sampler::{MemorySampler, PsMemorySampler};
pub use error::{MetricsError, MetricsResult};
pub use platform::Platform;
pub use registry::Registry;
pub use storage::{InProcessStorage, LockedStorage, WorkerStorage};
