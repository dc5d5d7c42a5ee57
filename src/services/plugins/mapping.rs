use std::collections::BTreeMap;
use std::env::consts::EXE_SUFFIX;
use std::path::Path;

/// Canonical form of an application identifier: trimmed, lower-cased and
/// carrying the platform executable suffix (`.exe` on Windows, none elsewhere).
pub fn normalize_app_id(raw: &str) -> String {
    let mut id = raw.trim().to_lowercase();
    if !EXE_SUFFIX.is_empty() && !id.is_empty() && !id.ends_with(EXE_SUFFIX) {
        id.push_str(EXE_SUFFIX);
    }
    id
}

/// Application identifier -> module file name, as configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionMapping {
    entries: BTreeMap<String, String>,
}

impl ExtensionMapping {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(app, module)| (app.into(), module.into()))
                .collect(),
        }
    }

    /// Reverse lookup: the first application whose module reference names this
    /// file. A reference matches the full file name or its stem, ignoring case.
    pub fn app_for_module(&self, file_name: &str) -> Option<&str> {
        let file_name = file_name.to_lowercase();
        let stem = Path::new(&file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name.as_str());

        self.entries
            .iter()
            .find(|(_, module)| {
                let module = module.trim().to_lowercase();
                module == file_name || module == stem
            })
            .map(|(app, _)| app.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_app_id() {
        assert_eq!(normalize_app_id("  Notepad.EXE "), "notepad.exe");
        assert_eq!(normalize_app_id(""), "");

        let firefox = normalize_app_id("Firefox");
        assert_eq!(firefox, format!("firefox{}", EXE_SUFFIX));
        // idempotent
        assert_eq!(normalize_app_id(&firefox), firefox);
    }

    #[test]
    fn test_reverse_lookup_ignores_case() {
        let mapping = ExtensionMapping::new([
            ("notepad.exe", "PluginA.toml"),
            ("firefox.exe", "PluginB"),
        ]);

        assert_eq!(mapping.app_for_module("plugina.TOML"), Some("notepad.exe"));
        // stem reference matches the manifest file
        assert_eq!(mapping.app_for_module("PluginB.toml"), Some("firefox.exe"));
        assert_eq!(mapping.app_for_module("PluginC.toml"), None);
    }

    #[test]
    fn test_reverse_lookup_takes_first_key() {
        let mapping = ExtensionMapping::new([("b.exe", "Shared.toml"), ("a.exe", "Shared.toml")]);

        assert_eq!(mapping.len(), 2);
        assert!(!mapping.is_empty());
        assert_eq!(mapping.app_for_module("Shared.toml"), Some("a.exe"));
    }

    #[test]
    fn test_empty_mapping_matches_nothing() {
        let mapping = ExtensionMapping::default();

        assert!(mapping.is_empty());
        assert_eq!(mapping.app_for_module("PluginA.toml"), None);
    }
}
