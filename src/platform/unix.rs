/// Check if process is alive
///
/// Sends signal 0; `EPERM` still means the process exists. Ids that do not fit
/// a `pid_t`, and non-positive ids (process groups for `kill`), are never alive.
pub fn process_alive(pid: i64) -> bool {
    if pid <= 0 {
        return false;
    }
    let Ok(c_pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    match unsafe_send_signal(c_pid, 0) {
        Ok(()) => true,
        Err(errno) => errno == libc::EPERM,
    }
}

/// Safely send signal
///
/// Encapsulates unsafe kill call and returns Result instead of raw error code
fn unsafe_send_signal(pid: libc::pid_t, signal: libc::c_int) -> Result<(), libc::c_int> {
    let result = unsafe { libc::kill(pid, signal) };
    if result == 0 {
        Ok(())
    } else {
        Err(get_last_errno())
    }
}

fn get_last_errno() -> libc::c_int {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_process_is_alive() {
        assert!(process_alive(std::process::id() as i64));
    }

    #[test]
    fn test_non_positive_pids_are_never_alive() {
        assert!(!process_alive(0));
        assert!(!process_alive(-1));
    }

    #[test]
    fn test_out_of_range_pid_is_not_alive() {
        assert!(!process_alive(i64::MAX));
    }
}
