//! Process tree resolution
//!
//! Maps every live descendant of a set of worker root processes back to its
//! root, so that memory can be summed per worker.
//!
//! Platform strategy:
//! - Unix: one psutil snapshot of the process table per cycle, then a
//!   breadth-first walk over parent links
//! - Elsewhere: no process table, roots resolve to nothing
//!
//! Known race: if a pid is reused while a cycle runs, the same process can be
//! reported under two roots. The last root processed wins. Roots are assumed to
//! own disjoint trees and this is not corrected.

use crate::core::models::ProcessId;
use crate::platform;
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;
use tracing::{debug, warn};

#[cfg(unix)]
use psutil::process::processes;

#[derive(Error, Debug)]
pub enum ProcessTreeError {
    #[cfg(unix)]
    #[error("Failed to read process table: {0}")]
    ProcessInfo(#[from] psutil::Error),
    #[allow(dead_code)]
    #[error("Unsupported platform")]
    UnsupportedPlatform,
}

/// Resolves worker roots to the full set of processes they own
pub trait ProcessTreeResolver: Send + Sync {
    /// Returns pid -> root pid for every live root and live descendant.
    /// Roots that are not running are left out.
    fn resolve(&self, roots: &[ProcessId]) -> HashMap<ProcessId, ProcessId>;
}

/// Point-in-time view of the parent links of all processes
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    parents: HashMap<ProcessId, Option<ProcessId>>,
    children: HashMap<ProcessId, Vec<ProcessId>>,
}

impl ProcessTable {
    /// Build from `(pid, parent pid)` pairs
    pub fn from_links<I>(links: I) -> Self
    where
        I: IntoIterator<Item = (ProcessId, Option<ProcessId>)>,
    {
        let mut table = Self::default();
        for (pid, parent) in links {
            table.parents.insert(pid, parent);
            if let Some(parent) = parent.filter(|parent| *parent != pid) {
                table.children.entry(parent).or_default().push(pid);
            }
        }
        table
    }

    pub fn contains(&self, pid: ProcessId) -> bool {
        self.parents.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// All transitive children of `root`, root excluded
    pub fn descendants(&self, root: ProcessId) -> Vec<ProcessId> {
        let mut found = Vec::new();
        let mut visited = HashSet::from([root]);
        let mut queue = VecDeque::from([root]);

        while let Some(pid) = queue.pop_front() {
            let Some(children) = self.children.get(&pid) else {
                continue;
            };
            for &child in children {
                // parent links can form a cycle when pids are recycled mid-snapshot
                if visited.insert(child) {
                    found.push(child);
                    queue.push_back(child);
                }
            }
        }

        found
    }
}

/// Map each live root and its descendants to the root.
///
/// A root counts as live when it is present in `table`.
pub fn map_to_roots(roots: &[ProcessId], table: &ProcessTable) -> HashMap<ProcessId, ProcessId> {
    let mut pid_to_root = HashMap::new();
    for &root in roots {
        if !table.contains(root) {
            continue;
        }
        for pid in table.descendants(root) {
            pid_to_root.insert(pid, root);
        }
        pid_to_root.insert(root, root);
    }
    pid_to_root
}

/// Read the live process table
pub fn snapshot_process_table() -> Result<ProcessTable, ProcessTreeError> {
    #[cfg(unix)]
    {
        snapshot_process_table_unix()
    }

    #[cfg(not(unix))]
    {
        Err(ProcessTreeError::UnsupportedPlatform)
    }
}

/// Unix-specific implementation using psutil
#[cfg(unix)]
fn snapshot_process_table_unix() -> Result<ProcessTable, ProcessTreeError> {
    let mut links = Vec::new();
    for process in processes()? {
        // processes exit between listing and inspection, skip those
        let Ok(process) = process else {
            continue;
        };
        match process.ppid() {
            Ok(parent) => links.push((
                ProcessId::from(process.pid()),
                parent.map(ProcessId::from),
            )),
            Err(err) => debug!(pid = process.pid(), "skipping process without ppid: {:?}", err),
        }
    }
    Ok(ProcessTable::from_links(links))
}

/// Live resolver backed by the OS process table
#[derive(Debug, Clone, Copy, Default)]
pub struct PsutilTreeResolver;

impl PsutilTreeResolver {
    pub fn new() -> Self {
        Self
    }

    /// Like [`ProcessTreeResolver::resolve`] but reports a failed table read
    pub fn try_resolve(
        &self,
        roots: &[ProcessId],
    ) -> Result<HashMap<ProcessId, ProcessId>, ProcessTreeError> {
        if roots.is_empty() {
            return Ok(HashMap::new());
        }
        let table = snapshot_process_table()?;
        Ok(map_to_roots(roots, &table))
    }
}

impl ProcessTreeResolver for PsutilTreeResolver {
    fn resolve(&self, roots: &[ProcessId]) -> HashMap<ProcessId, ProcessId> {
        match self.try_resolve(roots) {
            Ok(pid_to_root) => pid_to_root,
            Err(err) => {
                // Without a table we can still account for the roots themselves
                warn!("Falling back to root processes only: {}", err);
                roots
                    .iter()
                    .copied()
                    .filter(|&pid| platform::process_alive(pid))
                    .map(|pid| (pid, pid))
                    .collect()
            }
        }
    }
}
