use crate::error::{FocusError, Result};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Resolve the executable name of a running process.
///
/// Prefers the `/proc/<pid>/exe` link, which carries the full file name, and
/// falls back to `/proc/<pid>/comm` (truncated to 15 bytes by the kernel) when
/// the link is not readable, e.g. for processes owned by another user.
pub fn process_name(pid: u32) -> Result<String> {
    let proc_dir = PathBuf::from(format!("/proc/{}", pid));

    if let Ok(exe) = fs::read_link(proc_dir.join("exe")) {
        if let Some(name) = exe.file_name().and_then(|n| n.to_str()) {
            // replaced binaries show up as "name (deleted)"
            let name = name.trim_end_matches(" (deleted)");
            if !name.is_empty() {
                return Ok(name.to_string());
            }
        }
    }

    debug!("exe link unavailable for pid {}, reading comm", pid);
    let comm = fs::read_to_string(proc_dir.join("comm"))?;
    let name = comm.trim();
    if name.is_empty() {
        return Err(FocusError::ServiceUnavailable(format!(
            "process {} has no name",
            pid
        )));
    }

    Ok(name.to_string())
}

/// Parse the PID printed by a window tool on stdout.
pub fn parse_pid(output: &[u8]) -> Result<u32> {
    let text = String::from_utf8_lossy(output);
    text.trim()
        .parse::<u32>()
        .map_err(|e| FocusError::Internal(format!("invalid pid '{}': {}", text.trim(), e)))
}
