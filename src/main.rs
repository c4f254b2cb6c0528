use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use worker_metrics::commands::collect::{run_collect, run_watch};
use worker_metrics::commands::{Cli, Commands};
use worker_metrics::config::CollectorConfig;
use worker_metrics::utils::logger::init_logger;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match main_impl(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red(), err);
            ExitCode::from(1)
        }
    }
}

async fn main_impl(cli: Cli) -> anyhow::Result<()> {
    let config = CollectorConfig::load(cli.config.as_deref())?;

    let log_level = cli.log_level.as_deref().or(config.log_level.as_deref());
    init_logger(log_level, config.log_file.clone())?;

    if which::which(&config.ps_program).is_err() {
        tracing::warn!(
            program = %config.ps_program,
            "accounting tool not found, every worker will be reported unmeasurable"
        );
    }

    match cli.command {
        Commands::Collect(args) => run_collect(&config, &args),
        Commands::Watch {
            workers,
            interval,
            cycles,
        } => run_watch(&config, &workers, interval, cycles).await,
    }
}
