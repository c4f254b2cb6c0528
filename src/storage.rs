//! 工作进程注册表的存储层
//!
//! 锁与更新约定（两种实现都遵守）：
//! - 注册：按 worker_id 原子地“不存在才插入”，已存在则什么都不做
//! - 采集：先读出快照，之后只按快照中的确切条目删除
//! - 删除：仅当当前条目仍与快照中的身份完全一致时才删除，
//!   因此快照之后注册进来的条目永远不会被误删

use crate::core::models::{WorkerId, WorkerProperties};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// 工作进程存储的统一接口
pub trait WorkerStorage: Send + Sync {
    /// 不存在才插入，返回是否插入
    fn insert_if_absent(&self, properties: WorkerProperties) -> bool;

    /// 当前所有条目的拷贝
    fn snapshot(&self) -> Vec<WorkerProperties>;

    fn get(&self, worker_id: WorkerId) -> Option<WorkerProperties>;

    /// 删除仍与给定身份一致的条目，返回删除数量
    fn remove_stale(&self, stale: &[WorkerProperties]) -> usize;

    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// worker_id -> 身份 的映射拷贝
    fn to_map(&self) -> HashMap<WorkerId, WorkerProperties> {
        self.snapshot()
            .into_iter()
            .map(|properties| (properties.worker_id, properties))
            .collect()
    }
}

/// 进程内存储（按键分片加锁）
/// 使用DashMap，注册与采集之间没有全局锁
#[derive(Debug, Clone, Default)]
pub struct InProcessStorage {
    workers: Arc<DashMap<WorkerId, WorkerProperties>>,
}

impl InProcessStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkerStorage for InProcessStorage {
    fn insert_if_absent(&self, properties: WorkerProperties) -> bool {
        match self.workers.entry(properties.worker_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(properties);
                true
            }
        }
    }

    fn snapshot(&self) -> Vec<WorkerProperties> {
        self.workers
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn get(&self, worker_id: WorkerId) -> Option<WorkerProperties> {
        self.workers.get(&worker_id).map(|entry| entry.value().clone())
    }

    fn remove_stale(&self, stale: &[WorkerProperties]) -> usize {
        stale
            .iter()
            .filter(|properties| {
                self.workers
                    .remove_if(&properties.worker_id, |_, current| current == *properties)
                    .is_some()
            })
            .count()
    }

    fn clear(&self) {
        self.workers.clear();
    }

    fn len(&self) -> usize {
        self.workers.len()
    }
}

/// 单锁存储
/// 整个映射由一把互斥锁保护，采集频率低时竞争可以忽略
#[derive(Debug, Clone, Default)]
pub struct LockedStorage {
    workers: Arc<Mutex<HashMap<WorkerId, WorkerProperties>>>,
}

impl LockedStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkerStorage for LockedStorage {
    fn insert_if_absent(&self, properties: WorkerProperties) -> bool {
        let mut workers = self.workers.lock();
        if workers.contains_key(&properties.worker_id) {
            return false;
        }
        workers.insert(properties.worker_id, properties);
        true
    }

    fn snapshot(&self) -> Vec<WorkerProperties> {
        self.workers.lock().values().cloned().collect()
    }

    fn get(&self, worker_id: WorkerId) -> Option<WorkerProperties> {
        self.workers.lock().get(&worker_id).cloned()
    }

    fn remove_stale(&self, stale: &[WorkerProperties]) -> usize {
        let mut workers = self.workers.lock();
        let mut removed = 0;
        for properties in stale {
            if workers.get(&properties.worker_id) == Some(properties) {
                workers.remove(&properties.worker_id);
                removed += 1;
            }
        }
        removed
    }

    fn clear(&self) {
        self.workers.lock().clear();
    }

    fn len(&self) -> usize {
        self.workers.lock().len()
    }
}
