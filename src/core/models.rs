//! 统一数据模型定义
//!
//! 工作进程身份、内存采样与每轮采集结果

use crate::error::{errors::validation_error, MetricsResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable worker identifier, distinct from the OS process id
pub type WorkerId = u32;

/// OS process id as handed to us by the spawning side.
///
/// Signed on purpose: callers may pass placeholder or negative ids, which are
/// filtered out before anything reaches the accounting tool.
pub type ProcessId = i64;

/// 工作进程身份（注册后不可变）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerProperties {
    pub worker_id: WorkerId,
    pub process_id: ProcessId,
    /// 动作助记符，例如 `Javac`
    #[serde(default)]
    pub mnemonic: String,
    #[serde(default)]
    pub worker_key_hash: i64,
    #[serde(default)]
    pub is_multiplex: bool,
    #[serde(default)]
    pub is_sandboxed: bool,
}

impl WorkerProperties {
    pub fn new(worker_id: WorkerId, process_id: ProcessId, mnemonic: impl Into<String>) -> Self {
        Self {
            worker_id,
            process_id,
            mnemonic: mnemonic.into(),
            worker_key_hash: 0,
            is_multiplex: false,
            is_sandboxed: false,
        }
    }

    pub fn with_worker_key_hash(mut self, hash: i64) -> Self {
        self.worker_key_hash = hash;
        self
    }

    pub fn with_is_multiplex(mut self, is_multiplex: bool) -> Self {
        self.is_multiplex = is_multiplex;
        self
    }

    pub fn with_is_sandboxed(mut self, is_sandboxed: bool) -> Self {
        self.is_sandboxed = is_sandboxed;
        self
    }

    /// 校验身份信息
    pub fn validate(&self) -> MetricsResult<()> {
        if self.process_id <= 0 {
            return Err(validation_error(
                "process id must be positive",
                Some("worker.process_id".to_string()),
                Some(self.process_id.to_string()),
            ));
        }
        Ok(())
    }
}

/// 单轮采集得到的内存样本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStat {
    /// Resident set size in KiB, as `ps` reports it
    pub used_memory_kb: u64,
    pub collected_at: DateTime<Utc>,
}

impl WorkerStat {
    pub fn new(used_memory_kb: u64, collected_at: DateTime<Utc>) -> Self {
        Self {
            used_memory_kb,
            collected_at,
        }
    }

    pub fn used_memory_bytes(&self) -> u64 {
        self.used_memory_kb.saturating_mul(1024)
    }
}

/// 工作进程与本轮样本的连接结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerMetric {
    pub properties: WorkerProperties,
    pub stat: Option<WorkerStat>,
    pub is_measurable: bool,
}

impl WorkerMetric {
    pub fn measured(properties: WorkerProperties, stat: WorkerStat) -> Self {
        Self {
            properties,
            stat: Some(stat),
            is_measurable: true,
        }
    }

    pub fn unmeasurable(properties: WorkerProperties) -> Self {
        Self {
            properties,
            stat: None,
            is_measurable: false,
        }
    }

    pub fn worker_id(&self) -> WorkerId {
        self.properties.worker_id
    }

    /// Flatten into the outbound report handed to monitoring
    pub fn to_report(&self) -> WorkerReport {
        WorkerReport {
            properties: self.properties.clone(),
            measurable: self.is_measurable,
            resident_memory_kb: self.stat.map(|stat| stat.used_memory_kb),
            resident_memory_bytes: self.stat.map(|stat| stat.used_memory_bytes()),
            observed_at: self.stat.map(|stat| stat.collected_at),
        }
    }
}

/// 对外输出的采集报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerReport {
    #[serde(flatten)]
    pub properties: WorkerProperties,
    pub measurable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resident_memory_kb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resident_memory_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
}
