use crate::config::Config;
use crate::error::Result;

/// Source of the currently focused application
pub trait FocusQuery: Send + Sync {
    /// Process name owning the foreground window, or `None` when there is no
    /// focused window or it cannot be determined. Must not block for long.
    fn active_app(&self) -> Option<String>;
}

/// Factory function to create an appropriate focus query based on the dry_run flag
pub fn create_focus_query(config: &Config, dry_run: bool) -> Result<Box<dyn FocusQuery>> {
    if dry_run {
        Ok(Box::new(super::dry_run::DryRunFocusQuery::new(
            config.detector.dry_run_cycle,
        )))
    } else {
        Ok(Box::new(super::platform::PlatformFocusQuery::new(
            &config.detector.backend,
        )?))
    }
}
