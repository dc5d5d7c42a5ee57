use crate::error::{FocusError, Result};
use std::process::Command;

pub struct SwayBackend;

impl SwayBackend {
    pub fn new() -> Self {
        Self
    }

    pub fn test(&self) -> Result<()> {
        let output = Command::new("swaymsg").args(["-t", "get_version"]).output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(FocusError::ServiceUnavailable("swaymsg failed".to_string()))
        }
    }

    /// PID of the focused window, `None` when the focus is on a container
    /// without one (an empty workspace).
    pub fn active_pid(&self) -> Result<Option<u32>> {
        let output = Command::new("swaymsg")
            .args(["-r", "-t", "get_tree"])
            .output()
            .map_err(|e| FocusError::ServiceUnavailable(format!("swaymsg not found: {}", e)))?;

        if !output.status.success() {
            return Err(FocusError::ServiceUnavailable(
                "swaymsg returned an error".to_string(),
            ));
        }

        Ok(focused_pid(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// PID of the focused node in a `swaymsg -t get_tree` dump.
///
/// Every container opens with its `"id"` and lists `"focused"` before `"pid"`.
/// The pid after the focused marker only belongs to the focused node when no
/// other container starts in between.
fn focused_pid(tree: &str) -> Option<u32> {
    const FOCUSED: &str = "\"focused\":true";
    const PID: &str = "\"pid\":";
    const ID: &str = "\"id\":";

    let compact: String = tree.chars().filter(|c| !c.is_whitespace()).collect();
    let start = compact.find(FOCUSED)? + FOCUSED.len();
    let rest = &compact[start..];

    let pid_at = rest.find(PID)?;
    if rest[..pid_at].contains(ID) {
        return None;
    }

    let digits: String = rest[pid_at + PID.len()..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
