use crate::error::{FocusError, Result};
use crate::utils::process::parse_pid;
use std::process::Command;
use tracing::debug;

pub struct XdotoolBackend;

impl XdotoolBackend {
    pub fn new() -> Self {
        Self
    }

    pub fn test(&self) -> Result<()> {
        let output = Command::new("xdotool").arg("getdisplaygeometry").output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(FocusError::ServiceUnavailable("xdotool failed".to_string()))
        }
    }

    /// PID of the active X window, `None` when no window is active.
    pub fn active_pid(&self) -> Result<Option<u32>> {
        let output = Command::new("xdotool")
            .args(["getactivewindow", "getwindowpid"])
            .output()
            .map_err(|e| {
                debug!("xdotool not found or not working: {}", e);
                FocusError::ServiceUnavailable(format!("xdotool not found: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_display_error(&stderr) {
                return Err(FocusError::ServiceUnavailable(format!(
                    "xdotool cannot reach the display: {}",
                    stderr.trim()
                )));
            }
            debug!("xdotool found no active window: {}", stderr.trim());
            return Ok(None);
        }

        parse_pid(&output.stdout).map(Some)
    }
}

/// xdotool exits non-zero both when nothing has focus and when the X server is
/// gone; only the latter names the display or the xdo instance.
fn is_display_error(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    stderr.contains("display") || stderr.contains("xdo instance")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_errors_are_told_apart_from_no_window() {
        assert!(is_display_error("Error: Can't open display: (null)"));
        assert!(is_display_error("Failed creating new xdo instance"));

        assert!(!is_display_error(
            "XGetWindowProperty[_NET_ACTIVE_WINDOW] failed (code=1)"
        ));
        assert!(!is_display_error("window 0 has no pid associated with it."));
    }
}
