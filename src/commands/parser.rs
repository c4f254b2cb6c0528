//! CLI 命令行参数解析
//!
//! 使用 clap 定义命令行接口

use crate::core::models::{ProcessId, WorkerId, WorkerProperties};
use crate::error::{errors::invalid_worker_spec, RegistryError};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "worker-metrics",
    version,
    about = "Measure the memory of persistent worker processes and their descendants"
)]
pub struct Cli {
    /// 配置文件 (TOML/JSON/YAML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// 日志级别或过滤表达式，覆盖 RUST_LOG
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 注册工作进程并采集一轮
    Collect(WorkerArgs),

    /// 周期性采集，直到 Ctrl-C、达到轮数或所有工作进程退出
    Watch {
        #[command(flatten)]
        workers: WorkerArgs,
        /// 采集间隔（秒），默认取配置
        #[arg(long)]
        interval: Option<u64>,
        /// 最多采集轮数
        #[arg(long)]
        cycles: Option<u64>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct WorkerArgs {
    /// 工作进程，格式 ID:PID[:MNEMONIC]，可多次使用
    #[arg(long = "worker", short = 'w', required = true)]
    pub workers: Vec<WorkerSpec>,

    /// 以 JSON 行输出
    #[arg(long)]
    pub json: bool,
}

/// 命令行上的工作进程描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSpec {
    pub worker_id: WorkerId,
    pub process_id: ProcessId,
    pub mnemonic: String,
}

impl WorkerSpec {
    pub fn into_properties(self) -> WorkerProperties {
        WorkerProperties::new(self.worker_id, self.process_id, self.mnemonic)
    }
}

impl FromStr for WorkerSpec {
    type Err = RegistryError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut parts = spec.splitn(3, ':');
        let worker_id = parts
            .next()
            .filter(|part| !part.is_empty())
            .ok_or_else(|| invalid_worker_spec(spec, "missing worker id"))?
            .parse::<WorkerId>()
            .map_err(|_| invalid_worker_spec(spec, "worker id is not a number"))?;
        let process_id = parts
            .next()
            .ok_or_else(|| invalid_worker_spec(spec, "missing process id"))?
            .parse::<ProcessId>()
            .map_err(|_| invalid_worker_spec(spec, "process id is not a number"))?;
        let mnemonic = parts.next().unwrap_or_default().to_string();

        Ok(Self {
            worker_id,
            process_id,
            mnemonic,
        })
    }
}
