//! Plugin registry: responsibility and boundaries
//!
//! Extension modules are TOML manifests placed directly in the plugin directory.
//! Each manifest exports one or more `[[extension]]` entries which are turned into
//! live extensions by the ExtensionFactory and indexed by the application
//! identifier the configured mapping assigns to the module file.
//! Nothing here polls focus or invokes extensions; that is the FocusMonitor's job.

mod builtin;
mod extension;
mod factory;
mod manifest;
mod mapping;
mod registry;

pub use self::builtin::{CommandExtension, LogExtension};
pub use self::extension::Extension;
pub use self::factory::ExtensionFactory;
pub use self::manifest::{ExtensionSpec, ModuleManifest};
pub use self::mapping::{normalize_app_id, ExtensionMapping};
pub use self::registry::{LoadIssue, LoadReport, PluginRegistry, MODULE_EXTENSION};
