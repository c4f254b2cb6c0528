use clap::Parser;
use worker_metrics::collector::ConfiguredCollector;
use worker_metrics::commands::{Cli, Commands};
use worker_metrics::config::CollectorConfig;

#[test]
fn collect_command_registers_parsed_workers() {
    let cli = Cli::try_parse_from([
        "worker-metrics",
        "collect",
        "--worker",
        "1:100:Javac",
        "--worker",
        "1:200:Javac",
        "--json",
    ])
    .unwrap();

    let Commands::Collect(args) = cli.command else {
        panic!("expected collect");
    };
    assert!(args.json);

    let collector = ConfiguredCollector::from_config(&CollectorConfig::default()).unwrap();
    let inserted: Vec<bool> = args
        .workers
        .into_iter()
        .map(|spec| collector.register_worker(spec.into_properties()))
        .collect();

    assert_eq!(inserted, vec![true, false]);
    assert_eq!(collector.worker_count(), 1);
}

#[test]
fn malformed_worker_spec_is_rejected_by_parser() {
    let result = Cli::try_parse_from(["worker-metrics", "collect", "--worker", "one:100"]);
    assert!(result.is_err());
}
