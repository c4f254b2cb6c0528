//! 通用工作进程注册表 - 基于存储层的泛型实现
//!
//! 注册表是采集器唯一的持久状态。调用方只能拿到拷贝，拿不到内部引用。

use crate::{
    core::models::{WorkerId, WorkerProperties},
    storage::{InProcessStorage, LockedStorage, WorkerStorage},
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 通用工作进程注册表
///
/// 泛型设计，可以使用任何实现了 WorkerStorage trait 的存储后端
///
/// # 示例
///
/// ```rust
/// use worker_metrics::registry::Registry;
/// use worker_metrics::WorkerProperties;
///
/// let registry = Registry::in_process();
/// assert!(registry.register(WorkerProperties::new(1, 4242, "Javac")));
/// // 重复注册不会覆盖
/// assert!(!registry.register(WorkerProperties::new(1, 9999, "Javac")));
/// assert_eq!(registry.get(1).unwrap().process_id, 4242);
/// ```
#[derive(Debug)]
pub struct Registry<S: WorkerStorage> {
    storage: Arc<S>,
}

impl<S: WorkerStorage> Clone for Registry<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S: WorkerStorage> Registry<S> {
    /// 创建新的注册表实例
    pub fn new(storage: S) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }

    /// 从Arc创建（用于共享现有存储）
    pub fn from_arc(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// 获取存储的引用
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// 注册工作进程，已存在时不覆盖
    pub fn register(&self, properties: WorkerProperties) -> bool {
        let worker_id = properties.worker_id;
        let inserted = self.storage.insert_if_absent(properties);
        if !inserted {
            debug!(worker_id, "worker already registered, keeping first registration");
        }
        inserted
    }

    /// 本轮采集使用的快照
    pub fn snapshot(&self) -> Vec<WorkerProperties> {
        self.storage.snapshot()
    }

    pub fn get(&self, worker_id: WorkerId) -> Option<WorkerProperties> {
        self.storage.get(worker_id)
    }

    /// 删除快照中无法测量的工作进程
    pub fn prune(&self, stale: &[WorkerProperties]) -> usize {
        if stale.is_empty() {
            return 0;
        }
        self.storage.remove_stale(stale)
    }

    pub fn clear(&self) {
        self.storage.clear();
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn to_map(&self) -> HashMap<WorkerId, WorkerProperties> {
        self.storage.to_map()
    }
}

/// 按键分片的注册表类型别名
pub type InProcessRegistry = Registry<InProcessStorage>;

/// 单锁注册表类型别名
pub type LockedRegistry = Registry<LockedStorage>;

/// 便捷构造函数
impl Registry<InProcessStorage> {
    pub fn in_process() -> Self {
        Self::new(InProcessStorage::new())
    }
}

impl Registry<LockedStorage> {
    pub fn locked() -> Self {
        Self::new(LockedStorage::new())
    }
}

impl Default for Registry<InProcessStorage> {
    fn default() -> Self {
        Self::in_process()
    }
}
