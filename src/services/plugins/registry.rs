use crate::error::Result;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::extension::Extension;
use super::factory::ExtensionFactory;
use super::manifest::ModuleManifest;
use super::mapping::{normalize_app_id, ExtensionMapping};

/// File extension of module manifests picked up by the directory scan
pub const MODULE_EXTENSION: &str = "toml";

/// Recoverable condition met while loading extension modules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadIssue {
    DirectoryMissing(PathBuf),
    DirectoryUnreadable {
        path: PathBuf,
        reason: String,
    },
    ModuleFailed {
        module: String,
        reason: String,
    },
    InstantiationFailed {
        module: String,
        kind: String,
        reason: String,
    },
    Unmapped {
        module: String,
        extension: String,
    },
}

impl LoadIssue {
    /// Module or extension that could not be loaded at all
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            LoadIssue::ModuleFailed { .. } | LoadIssue::InstantiationFailed { .. }
        )
    }
}

impl fmt::Display for LoadIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadIssue::DirectoryMissing(path) => {
                write!(f, "plugin directory does not exist: {}", path.display())
            }
            LoadIssue::DirectoryUnreadable { path, reason } => {
                write!(f, "plugin directory {} is unreadable: {}", path.display(), reason)
            }
            LoadIssue::ModuleFailed { module, reason } => {
                write!(f, "failed to load module {}: {}", module, reason)
            }
            LoadIssue::InstantiationFailed {
                module,
                kind,
                reason,
            } => write!(
                f,
                "failed to instantiate '{}' from {}: {}",
                kind, module, reason
            ),
            LoadIssue::Unmapped { module, extension } => write!(
                f,
                "no mapping references module {} (extension {})",
                module, extension
            ),
        }
    }
}

/// What `PluginRegistry::load_all` did
#[derive(Debug, Default, Clone)]
pub struct LoadReport {
    pub loaded: usize,
    pub issues: Vec<LoadIssue>,
}

impl LoadReport {
    pub fn failures(&self) -> usize {
        self.issues.iter().filter(|issue| issue.is_failure()).count()
    }

    pub fn unmapped(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| matches!(issue, LoadIssue::Unmapped { .. }))
            .count()
    }
}

/// Loaded extensions indexed by normalized application identifier.
///
/// Built once before the monitor starts and only read afterwards.
#[derive(Default)]
pub struct PluginRegistry {
    extensions: HashMap<String, Arc<dyn Extension>>,
}

impl PluginRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Scan `directory` for module manifests and register every extension the
    /// mapping assigns to an application. Never fails: every problem becomes a
    /// logged `LoadIssue` and loading carries on with the next entry.
    pub fn load_all(
        directory: &Path,
        mapping: &ExtensionMapping,
        factory: &ExtensionFactory,
    ) -> (Self, LoadReport) {
        let mut registry = Self::empty();
        let mut report = LoadReport::default();

        info!("Loading extension modules from {}", directory.display());

        if !directory.is_dir() {
            warn!("Plugin directory does not exist: {}", directory.display());
            report
                .issues
                .push(LoadIssue::DirectoryMissing(directory.to_path_buf()));
            return (registry, report);
        }

        let modules = match Self::discover_modules(directory) {
            Ok(modules) => modules,
            Err(e) => {
                warn!("Cannot read plugin directory {}: {}", directory.display(), e);
                report.issues.push(LoadIssue::DirectoryUnreadable {
                    path: directory.to_path_buf(),
                    reason: e.to_string(),
                });
                return (registry, report);
            }
        };

        debug!("Found {} module file(s)", modules.len());

        for path in modules {
            registry.load_module(&path, mapping, factory, &mut report);
        }

        info!(
            "Extension discovery finished: {} loaded, {} failed, {} unmapped",
            report.loaded,
            report.failures(),
            report.unmapped()
        );

        (registry, report)
    }

    /// Module files directly inside `directory`, sorted by file name.
    fn discover_modules(directory: &Path) -> Result<Vec<PathBuf>> {
        let mut modules = Vec::new();

        for entry in fs::read_dir(directory)? {
            let path = entry?.path();
            let is_module = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(MODULE_EXTENSION));

            if path.is_file() && is_module {
                modules.push(path);
            }
        }

        modules.sort();
        Ok(modules)
    }

    fn load_module(
        &mut self,
        path: &Path,
        mapping: &ExtensionMapping,
        factory: &ExtensionFactory,
        report: &mut LoadReport,
    ) {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        debug!("Loading module {}", path.display());

        let manifest = match ModuleManifest::from_path(path) {
            Ok(manifest) if manifest.is_empty() => {
                error!("Failed to load module {}: no [[extension]] entries", file_name);
                report.issues.push(LoadIssue::ModuleFailed {
                    module: file_name,
                    reason: "module declares no extensions".to_string(),
                });
                return;
            }
            Ok(manifest) => manifest,
            Err(e) => {
                error!("Failed to load module {}: {}", file_name, e);
                report.issues.push(LoadIssue::ModuleFailed {
                    module: file_name,
                    reason: e.to_string(),
                });
                return;
            }
        };

        for spec in manifest.extensions() {
            let kind = spec.kind().unwrap_or("<none>").to_string();

            let extension = match factory.create(spec) {
                Ok(extension) => extension,
                Err(e) => {
                    error!(
                        "Failed to instantiate '{}' from module {}: {}",
                        kind, file_name, e
                    );
                    report.issues.push(LoadIssue::InstantiationFailed {
                        module: file_name.clone(),
                        kind,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let Some(app) = mapping.app_for_module(&file_name) else {
                warn!(
                    "No mapping found for extension {} in {}, skipping registration",
                    extension.name(),
                    file_name
                );
                report.issues.push(LoadIssue::Unmapped {
                    module: file_name.clone(),
                    extension: extension.name().to_string(),
                });
                continue;
            };

            info!("Extension loaded: {} ({}) for {}", extension.name(), kind, app);
            self.register(app, extension);
            report.loaded += 1;
        }
    }

    /// Index an extension under `app_id`. The last registration for an
    /// identifier wins; the replaced extension is returned.
    pub fn register(
        &mut self,
        app_id: &str,
        extension: Box<dyn Extension>,
    ) -> Option<Arc<dyn Extension>> {
        let key = normalize_app_id(app_id);
        let replaced = self.extensions.insert(key.clone(), Arc::from(extension));

        if let Some(previous) = &replaced {
            warn!(
                "Extension {} for {} replaced by a later registration",
                previous.name(),
                key
            );
        }

        replaced
    }

    /// Extension registered for `app_id`, compared in normalized form.
    pub fn lookup(&self, app_id: &str) -> Option<Arc<dyn Extension>> {
        self.extensions.get(&normalize_app_id(app_id)).cloned()
    }

    /// Registered (application, extension name) pairs, sorted by application
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .extensions
            .iter()
            .map(|(app, extension)| (app.as_str(), extension.name()))
            .collect();
        entries.sort_unstable();
        entries
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::plugins::LogExtension;
    use tempfile::TempDir;

    fn write_module(dir: &TempDir, file_name: &str, content: &str) {
        fs::write(dir.path().join(file_name), content).unwrap();
    }

    fn log_module(name: &str) -> String {
        format!("[[extension]]\nkind = \"log\"\nname = \"{}\"\n", name)
    }

    #[test]
    fn test_missing_directory_yields_empty_registry() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let (registry, report) = PluginRegistry::load_all(
            &missing,
            &ExtensionMapping::default(),
            &ExtensionFactory::with_builtins(),
        );

        assert!(registry.is_empty());
        assert_eq!(report.issues, vec![LoadIssue::DirectoryMissing(missing)]);
    }

    #[test]
    fn test_corrupt_module_does_not_stop_discovery() {
        let dir = TempDir::new().unwrap();
        write_module(&dir, "Broken.toml", "[[extension]\nkind = ");
        write_module(&dir, "PluginA.toml", &log_module("PluginA"));

        let mapping = ExtensionMapping::new([
            ("broken.exe", "Broken.toml"),
            ("notepad.exe", "PluginA.toml"),
        ]);
        let (registry, report) =
            PluginRegistry::load_all(dir.path(), &mapping, &ExtensionFactory::with_builtins());

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("notepad.exe").unwrap().name(), "PluginA");
        assert!(registry.lookup("broken.exe").is_none());
        assert_eq!(report.loaded, 1);
        assert_eq!(report.failures(), 1);
        assert!(matches!(
            &report.issues[0],
            LoadIssue::ModuleFailed { module, .. } if module == "Broken.toml"
        ));
    }

    #[test]
    fn test_lookup_ignores_case() {
        let dir = TempDir::new().unwrap();
        write_module(&dir, "ModuleX.toml", &log_module("ModuleX"));

        let mapping = ExtensionMapping::new([("app.exe", "ModuleX")]);
        let (registry, _) =
            PluginRegistry::load_all(dir.path(), &mapping, &ExtensionFactory::with_builtins());

        let extension = registry.lookup("APP.EXE").unwrap();
        assert_eq!(extension.name(), "ModuleX");
        assert!(registry.lookup("other.exe").is_none());
    }

    #[test]
    fn test_unmapped_module_is_skipped() {
        let dir = TempDir::new().unwrap();
        write_module(&dir, "Orphan.toml", &log_module("Orphan"));
        write_module(&dir, "PluginA.toml", &log_module("PluginA"));

        let mapping = ExtensionMapping::new([("notepad.exe", "PluginA.toml")]);
        let (registry, report) =
            PluginRegistry::load_all(dir.path(), &mapping, &ExtensionFactory::with_builtins());

        assert_eq!(registry.entries(), vec![("notepad.exe", "PluginA")]);
        assert_eq!(report.unmapped(), 1);
        assert_eq!(report.failures(), 0);
    }

    #[test]
    fn test_bad_entry_skips_only_itself() {
        let dir = TempDir::new().unwrap();
        write_module(
            &dir,
            "Mixed.toml",
            r#"
[[extension]]
kind = "teleport"

[[extension]]
kind = "log"
name = "survivor"
"#,
        );

        let mapping = ExtensionMapping::new([("code.exe", "Mixed.toml")]);
        let (registry, report) =
            PluginRegistry::load_all(dir.path(), &mapping, &ExtensionFactory::with_builtins());

        assert_eq!(registry.lookup("code.exe").unwrap().name(), "survivor");
        assert!(matches!(
            &report.issues[..],
            [LoadIssue::InstantiationFailed { kind, .. }] if kind == "teleport"
        ));
    }

    #[test]
    fn test_scan_is_not_recursive_and_filters_extension() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested.toml")).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("Deep.toml"), log_module("Deep")).unwrap();
        write_module(&dir, "readme.txt", "not a module");
        write_module(&dir, "Empty.toml", "");

        let mapping = ExtensionMapping::new([("deep.exe", "Deep.toml"), ("empty.exe", "Empty")]);
        let (registry, report) =
            PluginRegistry::load_all(dir.path(), &mapping, &ExtensionFactory::with_builtins());

        assert!(registry.is_empty());
        // only Empty.toml was considered
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.failures(), 1);
    }

    #[test]
    fn test_last_registration_wins() {
        let dir = TempDir::new().unwrap();
        write_module(&dir, "A.toml", &log_module("first"));
        write_module(&dir, "B.toml", &log_module("second"));

        // keys differ only by case and normalize to the same identifier
        let mapping = ExtensionMapping::new([("Notepad.exe", "A.toml"), ("notepad.exe", "B.toml")]);
        let (registry, report) =
            PluginRegistry::load_all(dir.path(), &mapping, &ExtensionFactory::with_builtins());

        assert_eq!(report.loaded, 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("NOTEPAD.EXE").unwrap().name(), "second");
    }

    #[test]
    fn test_register_returns_replaced() {
        let mut registry = PluginRegistry::empty();
        assert!(registry
            .register("calc.exe", Box::new(LogExtension::new("one", "1")))
            .is_none());

        let replaced = registry
            .register("CALC.EXE", Box::new(LogExtension::new("two", "2")))
            .unwrap();
        assert_eq!(replaced.name(), "one");
        assert_eq!(registry.lookup("calc.exe").unwrap().name(), "two");
    }
}
