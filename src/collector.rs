//! Worker metrics collector
//!
//! One long-lived collector per worker pool. Workers are registered once when
//! spawned; every `collect_metrics()` call resolves their process trees, samples
//! memory with a single `ps` call and joins the result back to the registry.
//! Workers that could not be sampled are reported as unmeasurable and dropped
//! from the registry, so the collector never needs to be told a worker died.
//!
//! The collector is a cheap handle: clones share the same registry.

use crate::config::{CollectorConfig, StorageBackend};
use crate::core::aggregate::aggregate_memory;
use crate::core::models::{ProcessId, WorkerId, WorkerMetric, WorkerProperties, WorkerStat};
use crate::core::process_tree::{ProcessTreeResolver, PsutilTreeResolver};
use crate::core::sampler::{MemorySampler, PsMemorySampler};
use crate::error::ConfigError;
use crate::platform::Platform;
use crate::registry::Registry;
use crate::storage::{InProcessStorage, LockedStorage, WorkerStorage};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

pub struct WorkerMetricsCollector<S: WorkerStorage = InProcessStorage> {
    registry: Registry<S>,
    resolver: Arc<dyn ProcessTreeResolver>,
    sampler: Arc<dyn MemorySampler>,
    platform: Platform,
}

impl<S: WorkerStorage> Clone for WorkerMetricsCollector<S> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            resolver: Arc::clone(&self.resolver),
            sampler: Arc::clone(&self.sampler),
            platform: self.platform,
        }
    }
}

impl<S: WorkerStorage> std::fmt::Debug for WorkerMetricsCollector<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerMetricsCollector")
            .field("workers", &self.registry.len())
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

impl WorkerMetricsCollector<InProcessStorage> {
    /// Collector with the live resolver and sampler
    pub fn new() -> Self {
        Self::with_registry(Registry::in_process())
    }
}

impl Default for WorkerMetricsCollector<InProcessStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerMetricsCollector<LockedStorage> {
    pub fn locked() -> Self {
        Self::with_registry(Registry::locked())
    }
}

impl<S: WorkerStorage> WorkerMetricsCollector<S> {
    pub fn with_registry(registry: Registry<S>) -> Self {
        Self {
            registry,
            resolver: Arc::new(PsutilTreeResolver::new()),
            sampler: Arc::new(PsMemorySampler::new()),
            platform: Platform::current(),
        }
    }

    pub fn with_resolver(mut self, resolver: impl ProcessTreeResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn with_sampler(mut self, sampler: impl MemorySampler + 'static) -> Self {
        self.sampler = Arc::new(sampler);
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Register a worker. Returns false, and changes nothing, if the id is taken.
    pub fn register_worker(&self, properties: WorkerProperties) -> bool {
        self.registry.register(properties)
    }

    /// Copy of the current worker id -> properties mapping
    pub fn worker_properties(&self) -> HashMap<WorkerId, WorkerProperties> {
        self.registry.to_map()
    }

    pub fn worker_count(&self) -> usize {
        self.registry.len()
    }

    /// Drop every registered worker
    pub fn clear(&self) {
        self.registry.clear();
    }

    /// Memory per root process, descendants included.
    ///
    /// Roots that are gone or could not be sampled have no entry. Returns
    /// nothing at all on platforms without process accounting.
    pub fn collect_stats(
        &self,
        platform: Platform,
        process_ids: &[ProcessId],
    ) -> HashMap<ProcessId, WorkerStat> {
        if !platform.supports_process_accounting() {
            return HashMap::new();
        }

        let pid_to_root = self.resolver.resolve(process_ids);
        let collected_at = Utc::now();
        let pids: Vec<ProcessId> = pid_to_root.keys().copied().collect();
        let memory_kb = self.sampler.sample(&pids);

        debug!(
            roots = process_ids.len(),
            processes = pid_to_root.len(),
            sampled = memory_kb.len(),
            "collected process stats"
        );

        aggregate_memory(&pid_to_root, &memory_kb, collected_at)
    }

    /// Run one collection cycle
    pub fn collect_metrics(&self) -> Vec<WorkerMetric> {
        let snapshot = self.registry.snapshot();
        let process_ids: Vec<ProcessId> = snapshot
            .iter()
            .map(|properties| properties.process_id)
            .collect();

        let stats = self.collect_stats(self.platform, &process_ids);

        let mut metrics = Vec::with_capacity(snapshot.len());
        let mut unmeasurable = Vec::new();
        for properties in snapshot {
            match stats.get(&properties.process_id) {
                Some(stat) => metrics.push(WorkerMetric::measured(properties, *stat)),
                None => {
                    unmeasurable.push(properties.clone());
                    metrics.push(WorkerMetric::unmeasurable(properties));
                }
            }
        }

        let pruned = self.registry.prune(&unmeasurable);
        if pruned > 0 {
            debug!(pruned, "removed unmeasurable workers");
        }

        metrics
    }

    /// End of the collector's life: forget every worker
    pub fn shutdown(self) {
        info!(workers = self.registry.len(), "shutting down worker metrics collector");
        self.registry.clear();
    }
}

/// Storage choice made at runtime, from configuration
#[derive(Debug, Clone)]
pub enum ConfiguredCollector {
    DashMap(WorkerMetricsCollector<InProcessStorage>),
    Mutex(WorkerMetricsCollector<LockedStorage>),
}

impl ConfiguredCollector {
    pub fn from_config(config: &CollectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let sampler = PsMemorySampler::new().with_program(config.ps_program.clone());
        Ok(match config.storage_backend()? {
            StorageBackend::DashMap => {
                ConfiguredCollector::DashMap(WorkerMetricsCollector::new().with_sampler(sampler))
            }
            StorageBackend::Mutex => {
                ConfiguredCollector::Mutex(WorkerMetricsCollector::locked().with_sampler(sampler))
            }
        })
    }

    pub fn register_worker(&self, properties: WorkerProperties) -> bool {
        match self {
            ConfiguredCollector::DashMap(collector) => collector.register_worker(properties),
            ConfiguredCollector::Mutex(collector) => collector.register_worker(properties),
        }
    }

    pub fn collect_metrics(&self) -> Vec<WorkerMetric> {
        match self {
            ConfiguredCollector::DashMap(collector) => collector.collect_metrics(),
            ConfiguredCollector::Mutex(collector) => collector.collect_metrics(),
        }
    }

    pub fn worker_count(&self) -> usize {
        match self {
            ConfiguredCollector::DashMap(collector) => collector.worker_count(),
            ConfiguredCollector::Mutex(collector) => collector.worker_count(),
        }
    }

    pub fn shutdown(self) {
        match self {
            ConfiguredCollector::DashMap(collector) => collector.shutdown(),
            ConfiguredCollector::Mutex(collector) => collector.shutdown(),
        }
    }
}
