use crate::error::{FocusError, Result};
use crate::utils::process::parse_pid;
use std::process::Command;
use tracing::debug;

pub struct KdotoolBackend;

impl KdotoolBackend {
    pub fn new() -> Self {
        Self
    }

    pub fn test(&self) -> Result<()> {
        self.active_pid().map(|_| ())
    }

    /// PID of the active KWin window, `None` when no window is active.
    pub fn active_pid(&self) -> Result<Option<u32>> {
        let id_output = Command::new("kdotool").arg("getactivewindow").output()?;
        if !id_output.status.success() {
            debug!(
                "kdotool getactivewindow failed: {}",
                String::from_utf8_lossy(&id_output.stderr)
            );
            return Err(FocusError::ServiceUnavailable(
                "kdotool getactivewindow failed".to_string(),
            ));
        }

        let window_id = String::from_utf8_lossy(&id_output.stdout).trim().to_string();
        if window_id.is_empty() {
            return Ok(None);
        }

        let pid_output = Command::new("kdotool")
            .args(["getwindowpid", &window_id])
            .output()?;
        if !pid_output.status.success() {
            return Err(FocusError::ServiceUnavailable(
                "kdotool getwindowpid failed".to_string(),
            ));
        }

        parse_pid(&pid_output.stdout).map(Some)
    }
}
