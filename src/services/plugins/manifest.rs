use crate::error::{FocusError, Result};
use figment::{
    providers::{Format, Serialized, Toml},
    value::Dict,
    Figment,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    #[serde(default)]
    extension: Vec<Dict>,
}

/// Parsed module file.
///
/// ```toml
/// [[extension]]
/// kind = "command"
/// name = "notepad-hook"
/// program = "notify-send"
/// args = ["Notepad focused"]
/// ```
#[derive(Debug)]
pub struct ModuleManifest {
    module: String,
    extensions: Vec<ExtensionSpec>,
}

impl ModuleManifest {
    pub fn from_path(path: &Path) -> Result<Self> {
        let module = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let content = fs::read_to_string(path)?;

        Self::parse(&module, &content).map_err(|e| FocusError::manifest(path, e))
    }

    pub fn parse(module: &str, content: &str) -> std::result::Result<Self, figment::Error> {
        let raw: RawManifest = Figment::from(Toml::string(content)).extract()?;

        let extensions = raw
            .extension
            .into_iter()
            .map(|entry| ExtensionSpec::new(module, entry))
            .collect();

        Ok(Self {
            module: module.to_string(),
            extensions,
        })
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn extensions(&self) -> &[ExtensionSpec] {
        &self.extensions
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

/// One `[[extension]]` entry: the constructor kind plus its settings.
#[derive(Debug, Clone)]
pub struct ExtensionSpec {
    module: String,
    kind: Option<String>,
    settings: Figment,
}

impl ExtensionSpec {
    pub fn new(module: &str, entry: Dict) -> Self {
        let kind = entry
            .get("kind")
            .and_then(|value| value.as_str())
            .map(|kind| kind.trim().to_lowercase());

        Self {
            module: module.to_string(),
            kind,
            settings: Figment::from(Serialized::defaults(entry)),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Deserialize the entry into a constructor's settings type.
    pub fn settings<T: DeserializeOwned>(&self) -> Result<T> {
        self.settings.extract().map_err(|e| {
            FocusError::Instantiation(format!(
                "invalid settings for '{}' in {}: {}",
                self.kind().unwrap_or("?"),
                self.module,
                e
            ))
        })
    }

    /// `name` from the entry, or the module stem.
    pub fn display_name(&self) -> String {
        self.settings
            .extract_inner::<String>("name")
            .unwrap_or_else(|_| self.module.clone())
    }
}
