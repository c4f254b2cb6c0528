//! Resident memory sampling through `ps`
//!
//! One `ps -o pid,rss -p <ids>` call per collection cycle covers every process
//! of every worker. Output looks like
//!
//! ```text
//!     PID   RSS
//!  211706 222972
//! 2612333   6180
//! ```
//!
//! The header is skipped and each remaining line is parsed on its own, so a
//! garbled line only costs that one process.

use crate::config::{DEFAULT_PS_PROGRAM, PS_COLUMNS};
use crate::core::models::ProcessId;
use crate::error::SamplerError;
use crate::platform::Platform;
use std::collections::{BTreeSet, HashMap};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Samples resident memory (KiB) for a batch of processes
pub trait MemorySampler: Send + Sync {
    fn sample(&self, pids: &[ProcessId]) -> HashMap<ProcessId, u64>;
}

/// Keep only ids that can name a real process, deduplicated and sorted
pub fn filter_process_ids(pids: &[ProcessId]) -> Vec<ProcessId> {
    pids.iter()
        .copied()
        .filter(|pid| *pid > 0)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Arguments for `ps`, or `None` when no valid id is left to ask about
pub fn ps_arguments(pids: &[ProcessId]) -> Option<Vec<String>> {
    let pids = filter_process_ids(pids);
    if pids.is_empty() {
        return None;
    }
    let joined = pids
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    Some(vec![
        "-o".to_string(),
        PS_COLUMNS.to_string(),
        "-p".to_string(),
        joined,
    ])
}

/// Parse one `pid rss` data line
pub fn parse_ps_line(line: &str) -> Result<(ProcessId, u64), SamplerError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 2 {
        return Err(SamplerError::FieldCount {
            line: line.to_string(),
            count: fields.len(),
        });
    }

    let number_error = |value: &str| SamplerError::InvalidNumber {
        line: line.to_string(),
        value: value.to_string(),
    };
    let pid = fields[0]
        .parse::<ProcessId>()
        .map_err(|_| number_error(fields[0]))?;
    let rss_kb = fields[1].parse::<u64>().map_err(|_| number_error(fields[1]))?;
    Ok((pid, rss_kb))
}

/// Parse full `ps` output, skipping the header line and any malformed line
pub fn parse_ps_output(output: &str) -> HashMap<ProcessId, u64> {
    let mut memory = HashMap::new();
    for line in output.lines().skip(1) {
        match parse_ps_line(line) {
            Ok((pid, rss_kb)) => {
                memory.insert(pid, rss_kb);
            }
            Err(err) => warn!("Skipping ps output line: {}", err),
        }
    }
    memory
}

/// Live sampler that shells out to `ps`
#[derive(Debug, Clone)]
pub struct PsMemorySampler {
    program: String,
    platform: Platform,
}

impl PsMemorySampler {
    pub fn new() -> Self {
        Self {
            program: DEFAULT_PS_PROGRAM.to_string(),
            platform: Platform::current(),
        }
    }

    /// Use a different `ps` binary (path or name looked up on PATH)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// The command one cycle would run, `None` if nothing would be run
    pub fn build_command(&self, pids: &[ProcessId]) -> Option<Command> {
        if !self.platform.supports_process_accounting() {
            return None;
        }
        let args = ps_arguments(pids)?;
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        Some(command)
    }

    /// Like [`MemorySampler::sample`] but reports a failed spawn
    pub fn try_sample(&self, pids: &[ProcessId]) -> Result<HashMap<ProcessId, u64>, SamplerError> {
        let Some(mut command) = self.build_command(pids) else {
            return Ok(HashMap::new());
        };

        let output = command.output().map_err(|source| SamplerError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        // ps exits non-zero when any requested pid is already gone
        if !output.status.success() {
            debug!(status = ?output.status, "ps reported missing processes");
        }

        Ok(parse_ps_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl Default for PsMemorySampler {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySampler for PsMemorySampler {
    fn sample(&self, pids: &[ProcessId]) -> HashMap<ProcessId, u64> {
        match self.try_sample(pids) {
            Ok(memory) => memory,
            Err(err) => {
                warn!(pids = ?pids, "Error while executing command: {}", err);
                HashMap::new()
            }
        }
    }
}
