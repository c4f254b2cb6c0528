//! ASCII table and JSON line formatting for collection results.

use crate::core::models::WorkerMetric;
use anyhow::Result;
use prettytable::{format, Cell, Row, Table};

/// Format one cycle's metrics as an ASCII table, sorted by worker id.
pub fn format_metrics_table(metrics: &[WorkerMetric]) -> String {
    if metrics.is_empty() {
        return "No workers registered.".to_string();
    }

    let mut sorted: Vec<&WorkerMetric> = metrics.iter().collect();
    sorted.sort_by_key(|metric| metric.worker_id());

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(Row::new(vec![
        Cell::new("WORKER"),
        Cell::new("PID"),
        Cell::new("MNEMONIC"),
        Cell::new("RSS_KB"),
        Cell::new("OBSERVED_AT"),
    ]));

    for metric in sorted {
        let properties = &metric.properties;
        let mnemonic = if properties.mnemonic.is_empty() {
            "-"
        } else {
            properties.mnemonic.as_str()
        };
        let (rss, observed) = match metric.stat {
            Some(stat) => (
                stat.used_memory_kb.to_string(),
                stat.collected_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ),
            None => ("gone".to_string(), "-".to_string()),
        };

        table.add_row(Row::new(vec![
            Cell::new(&properties.worker_id.to_string()),
            Cell::new(&properties.process_id.to_string()),
            Cell::new(mnemonic),
            Cell::new(&rss),
            Cell::new(&observed),
        ]));
    }

    table.to_string()
}

/// One JSON object per worker, newline separated.
pub fn format_metrics_json(metrics: &[WorkerMetric]) -> Result<String> {
    let lines = metrics
        .iter()
        .map(|metric| serde_json::to_string(&metric.to_report()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{WorkerProperties, WorkerStat};
    use chrono::Utc;

    fn sample_metrics() -> Vec<WorkerMetric> {
        vec![
            WorkerMetric::unmeasurable(WorkerProperties::new(2, 200, "")),
            WorkerMetric::measured(
                WorkerProperties::new(1, 100, "Javac"),
                WorkerStat::new(800, Utc::now()),
            ),
        ]
    }

    #[test]
    fn test_table_lists_workers_in_id_order() {
        let table = format_metrics_table(&sample_metrics());
        let first = table.find("Javac").unwrap();
        let second = table.find("gone").unwrap();
        assert!(first < second);
        assert!(table.contains("800"));
        assert!(table.contains("WORKER"));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(format_metrics_table(&[]), "No workers registered.");
    }

    #[test]
    fn test_json_lines() {
        let json = format_metrics_json(&sample_metrics()).unwrap();
        let lines: Vec<serde_json::Value> = json
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["measurable"], false);
        assert_eq!(lines[1]["resident_memory_kb"], 800);
    }
}
