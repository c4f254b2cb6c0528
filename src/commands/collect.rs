//! `collect` 与 `watch` 命令处理

use super::output::{format_metrics_json, format_metrics_table};
use super::parser::WorkerArgs;
use crate::collector::ConfiguredCollector;
use crate::config::CollectorConfig;
use crate::core::models::WorkerMetric;
use anyhow::{Context, Result};
use colored::Colorize;
use std::time::Duration;
use tracing::{info, warn};

fn register_all(collector: &ConfiguredCollector, args: &WorkerArgs) {
    for spec in &args.workers {
        let properties = spec.clone().into_properties();
        if let Err(err) = properties.validate() {
            warn!(worker_id = properties.worker_id, "{}", err);
        }
        if !collector.register_worker(properties) {
            eprintln!(
                "{} worker {} listed twice, keeping the first process id",
                "warning:".yellow(),
                spec.worker_id
            );
        }
    }
}

fn print_metrics(metrics: &[WorkerMetric], json: bool) -> Result<()> {
    if json {
        println!("{}", format_metrics_json(metrics)?);
    } else {
        println!("{}", format_metrics_table(metrics));
    }
    for metric in metrics.iter().filter(|metric| !metric.is_measurable) {
        eprintln!(
            "{} worker {} (pid {}) could not be measured, dropped",
            "✗".red(),
            metric.worker_id(),
            metric.properties.process_id
        );
    }
    Ok(())
}

/// 采集一轮并输出
pub fn run_collect(config: &CollectorConfig, args: &WorkerArgs) -> Result<()> {
    let collector = ConfiguredCollector::from_config(config)?;
    register_all(&collector, args);
    let metrics = collector.collect_metrics();
    print_metrics(&metrics, args.json)?;
    collector.shutdown();
    Ok(())
}

/// 周期性采集
///
/// 采集本身是阻塞调用，放到阻塞线程池里执行
pub async fn run_watch(
    config: &CollectorConfig,
    args: &WorkerArgs,
    interval: Option<u64>,
    cycles: Option<u64>,
) -> Result<()> {
    let collector = ConfiguredCollector::from_config(config)?;
    register_all(&collector, args);

    let period = interval
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.interval());
    let mut ticker = tokio::time::interval(period);
    let mut completed = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping");
                break;
            }
        }

        let cycle = collector.clone();
        let metrics = tokio::task::spawn_blocking(move || cycle.collect_metrics())
            .await
            .context("collection cycle panicked")?;
        print_metrics(&metrics, args.json)?;

        completed += 1;
        if cycles.is_some_and(|limit| completed >= limit) {
            break;
        }
        if collector.worker_count() == 0 {
            info!("no measurable workers left");
            break;
        }
    }

    collector.shutdown();
    Ok(())
}
