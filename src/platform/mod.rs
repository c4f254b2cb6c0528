//! Platform detection for process accounting
//!
//! Memory sampling shells out to `ps`, which is only wired up for Linux and
//! macOS. Everything else degrades to "no metrics".

#[cfg(unix)]
pub mod unix;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Platform {
    /// Platform this binary was compiled for
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Other
        }
    }

    /// Whether `ps -o pid,rss` can be used to sample resident memory
    pub fn supports_process_accounting(&self) -> bool {
        matches!(self, Platform::Linux | Platform::MacOs)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
            Platform::Other => "other",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check if process is alive; always false where no liveness probe exists
pub fn process_alive(pid: i64) -> bool {
    #[cfg(unix)]
    {
        unix::process_alive(pid)
    }
    #[cfg(not(unix))]
    {
        let _ = pid;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accounting_support() {
        assert!(Platform::Linux.supports_process_accounting());
        assert!(Platform::MacOs.supports_process_accounting());
        assert!(!Platform::Windows.supports_process_accounting());
        assert!(!Platform::Other.supports_process_accounting());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_current_platform_linux() {
        assert_eq!(Platform::current(), Platform::Linux);
        assert_eq!(Platform::current().to_string(), "linux");
    }
}
