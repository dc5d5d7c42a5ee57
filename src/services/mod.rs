pub mod focus_monitor;
pub mod focus_query;
pub mod plugins;

pub use focus_monitor::{FocusMonitor, MonitorSettings};
pub use focus_query::create_focus_query;
pub use plugins::{ExtensionFactory, PluginRegistry};
