//! Per-worker memory aggregation

use crate::core::models::{ProcessId, WorkerStat};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Sum sampled memory into the root that owns each process.
///
/// Processes missing from `pid_to_root` are ignored. Roots with no sampled
/// process at all get no entry, which callers read as "unmeasurable" rather
/// than zero. Every stat carries the same `collected_at`.
pub fn aggregate_memory(
    pid_to_root: &HashMap<ProcessId, ProcessId>,
    memory_kb: &HashMap<ProcessId, u64>,
    collected_at: DateTime<Utc>,
) -> HashMap<ProcessId, WorkerStat> {
    let mut totals: HashMap<ProcessId, u64> = HashMap::new();
    for (pid, kb) in memory_kb {
        if let Some(root) = pid_to_root.get(pid) {
            let total = totals.entry(*root).or_default();
            *total = total.saturating_add(*kb);
        }
    }

    totals
        .into_iter()
        .map(|(root, kb)| (root, WorkerStat::new(kb, collected_at)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_descendants_sum_into_root() {
        let now = Utc::now();
        let pid_to_root = HashMap::from([(100, 100), (101, 100), (102, 100), (200, 200)]);
        let memory = HashMap::from([(100, 500), (101, 300), (102, 25), (200, 40)]);

        let stats = aggregate_memory(&pid_to_root, &memory, now);

        assert_eq!(stats[&100], WorkerStat::new(825, now));
        assert_eq!(stats[&200], WorkerStat::new(40, now));
    }

    #[test]
    fn test_root_without_samples_is_absent() {
        let pid_to_root = HashMap::from([(100, 100), (200, 200)]);
        let memory = HashMap::from([(100, 10)]);

        let stats = aggregate_memory(&pid_to_root, &memory, Utc::now());

        assert!(stats.contains_key(&100));
        assert!(!stats.contains_key(&200));
    }

    #[test]
    fn test_descendant_sample_alone_makes_root_measurable() {
        // root exited its sample window but a child was still sampled
        let pid_to_root = HashMap::from([(100, 100), (101, 100)]);
        let memory = HashMap::from([(101, 64)]);

        let stats = aggregate_memory(&pid_to_root, &memory, Utc::now());

        assert_eq!(stats[&100].used_memory_kb, 64);
    }

    #[test]
    fn test_unknown_pids_are_ignored() {
        let pid_to_root = HashMap::from([(100, 100)]);
        let memory = HashMap::from([(100, 1), (555, 1000)]);

        let stats = aggregate_memory(&pid_to_root, &memory, Utc::now());

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[&100].used_memory_kb, 1);
    }

    #[test]
    fn test_shared_timestamp() {
        let now = Utc::now();
        let pid_to_root = HashMap::from([(1, 1), (2, 2), (3, 3)]);
        let memory = HashMap::from([(1, 1), (2, 2), (3, 3)]);

        let stats = aggregate_memory(&pid_to_root, &memory, now);

        assert!(stats.values().all(|stat| stat.collected_at == now));
    }
}
