#![cfg(unix)]

use std::process::{Child, Command};
use std::thread::sleep;
use std::time::{Duration, Instant};
use worker_metrics::{
    Platform, ProcessId, ProcessTreeResolver, PsMemorySampler, PsutilTreeResolver,
    WorkerMetricsCollector, WorkerProperties,
};

fn ps_available() -> bool {
    Platform::current().supports_process_accounting() && which::which("ps").is_ok()
}

/// A shell that forks two sleeping children, like a worker with helpers
fn spawn_worker_tree() -> Child {
    Command::new("sh")
        .args(["-c", "sleep 5 & sleep 5 & wait"])
        .spawn()
        .expect("spawn sh")
}

fn wait_for_descendants(root: ProcessId, expected: usize) -> usize {
    let resolver = PsutilTreeResolver::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        let found = resolver.resolve(&[root]).len();
        if found >= expected || Instant::now() > deadline {
            return found;
        }
        sleep(Duration::from_millis(50));
    }
}

#[test]
fn live_worker_tree_is_resolved_and_measured() {
    if !ps_available() {
        return;
    }
    let mut child = spawn_worker_tree();
    let root = ProcessId::from(child.id());

    // root plus both sleeps
    assert!(wait_for_descendants(root, 3) >= 3);

    let collector = WorkerMetricsCollector::new();
    collector.register_worker(WorkerProperties::new(1, root, "Shell"));
    let metrics = collector.collect_metrics();

    assert_eq!(metrics.len(), 1);
    assert!(metrics[0].is_measurable);
    assert!(metrics[0].stat.unwrap().used_memory_kb > 0);

    child.kill().expect("kill worker");
    child.wait().expect("reap worker");

    let after_exit = collector.collect_metrics();
    assert_eq!(after_exit.len(), 1);
    assert!(!after_exit[0].is_measurable);
    assert!(collector.worker_properties().is_empty());
}

#[test]
fn missing_ps_binary_prunes_live_workers() {
    let collector = WorkerMetricsCollector::new()
        .with_sampler(PsMemorySampler::new().with_program("/nonexistent/ps"))
        .with_platform(Platform::Linux);
    collector.register_worker(WorkerProperties::new(
        1,
        ProcessId::from(std::process::id()),
        "",
    ));

    let metrics = collector.collect_metrics();

    assert!(!metrics[0].is_measurable);
    assert_eq!(collector.worker_count(), 0);
}

#[test]
fn dead_and_bogus_process_ids_are_unmeasurable() {
    if !ps_available() {
        return;
    }
    let collector = WorkerMetricsCollector::new();
    collector.register_worker(WorkerProperties::new(1, -1, ""));
    collector.register_worker(WorkerProperties::new(2, 0, ""));
    collector.register_worker(WorkerProperties::new(3, ProcessId::from(std::process::id()), ""));

    let metrics = collector.collect_metrics();

    assert_eq!(metrics.len(), 3);
    let measurable: Vec<_> = metrics
        .iter()
        .filter(|metric| metric.is_measurable)
        .map(|metric| metric.worker_id())
        .collect();
    assert_eq!(measurable, vec![3]);
}
