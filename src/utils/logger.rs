//! 日志系统
//!
//! 提供统一的日志记录功能

use crate::config::DEFAULT_LOG_FILTER;
use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 构建日志过滤器，优先使用参数指定的级别，其次使用 RUST_LOG 环境变量
pub fn build_filter(log_level: Option<&str>) -> Result<EnvFilter> {
    let env_filter = if let Some(level) = log_level {
        EnvFilter::try_new(level)?
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };
    Ok(env_filter)
}

/// 初始化日志系统
///
/// # Arguments
/// * `log_level` - 日志级别 (trace, debug, info, warn, error)，如果为 None 则使用环境变量 RUST_LOG
/// * `log_file` - 日志文件路径，如果为 None 则只输出到标准错误
///
/// # Examples
/// ```no_run
/// use worker_metrics::utils::logger::init_logger;
///
/// init_logger(Some("debug"), None).unwrap();
/// ```
pub fn init_logger(log_level: Option<&str>, log_file: Option<PathBuf>) -> Result<()> {
    let env_filter = build_filter(log_level)?;

    // 标准输出留给采集结果，日志写到标准错误
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(true)
        .compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if let Some(log_path) = log_file {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(std::sync::Arc::new(file))
            .with_target(true)
            .with_ansi(false) // 文件中不使用 ANSI 颜色
            .with_level(true);

        registry.with(file_layer).try_init()?;
    } else {
        registry.try_init()?;
    }

    tracing::debug!("Logger initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_level_filter() {
        assert!(build_filter(Some("warn")).is_ok());
        assert!(build_filter(Some("worker_metrics=trace,info")).is_ok());
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        assert!(build_filter(Some("worker_metrics=notalevel")).is_err());
    }
}
