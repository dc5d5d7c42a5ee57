//! FocusQuery service: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for answering "which
//! process owns the focused window right now". They MUST NOT know about
//! extensions, mappings or the last observed application; transition detection
//! and dispatch belong to the FocusMonitor.

mod dry_run;
mod kdotool;
mod platform;
mod sway;
mod r#trait;
mod xdotool;

pub use self::dry_run::DryRunFocusQuery;
pub use self::platform::PlatformFocusQuery;
pub use self::r#trait::{create_focus_query, FocusQuery};
