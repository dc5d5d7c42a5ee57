use crate::error::{FocusError, Result};
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use super::builtin::{CommandExtension, LogExtension};
use super::extension::Extension;
use super::manifest::ExtensionSpec;

type Constructor = Box<dyn Fn(&ExtensionSpec) -> Result<Box<dyn Extension>> + Send + Sync>;

/// Constructors for extension kinds, registered by name.
///
/// Module manifests only reference a `kind`; what a kind builds is decided here
/// at compile time.
#[derive(Default)]
pub struct ExtensionFactory {
    constructors: HashMap<String, Constructor>,
}

impl ExtensionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with the `log` and `command` kinds registered.
    pub fn with_builtins() -> Self {
        Self::new()
            .register("log", LogExtension::from_spec)
            .register("command", CommandExtension::from_spec)
    }

    /// Register a constructor; an existing kind with the same name is replaced.
    pub fn register<F>(mut self, kind: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&ExtensionSpec) -> Result<Box<dyn Extension>> + Send + Sync + 'static,
    {
        let kind = kind.into().trim().to_lowercase();
        self.constructors.insert(kind, Box::new(constructor));
        self
    }

    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Build the extension an entry describes. A panicking constructor is
    /// reported as an instantiation error.
    pub fn create(&self, spec: &ExtensionSpec) -> Result<Box<dyn Extension>> {
        let kind = spec.kind().ok_or_else(|| {
            crate::focus_error!(instantiation, "extension in {} declares no kind", spec.module())
        })?;

        let constructor = self
            .constructors
            .get(kind)
            .ok_or_else(|| FocusError::UnknownKind(kind.to_string()))?;

        panic::catch_unwind(AssertUnwindSafe(|| constructor(spec))).unwrap_or_else(|_| {
            Err(crate::focus_error!(
                instantiation,
                "constructor for '{}' panicked",
                kind
            ))
        })
    }
}

impl fmt::Debug for ExtensionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionFactory")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::plugins::ModuleManifest;

    fn spec(content: &str) -> ExtensionSpec {
        ModuleManifest::parse("Test", content).unwrap().extensions()[0].clone()
    }

    #[test]
    fn test_builtin_kinds() {
        let factory = ExtensionFactory::with_builtins();
        assert_eq!(factory.kinds(), vec!["command", "log"]);

        let extension = factory
            .create(&spec("[[extension]]\nkind = \"log\"\nname = \"hello\"\n"))
            .unwrap();
        assert_eq!(extension.name(), "hello");
    }

    #[test]
    fn test_unknown_and_missing_kind() {
        let factory = ExtensionFactory::with_builtins();

        let err = factory
            .create(&spec("[[extension]]\nkind = \"wasm\"\n"))
            .err()
            .unwrap();
        assert!(matches!(err, FocusError::UnknownKind(kind) if kind == "wasm"));

        let err = factory.create(&spec("[[extension]]\nname = \"x\"\n")).err().unwrap();
        assert!(matches!(err, FocusError::Instantiation(_)));
    }

    #[test]
    fn test_panicking_constructor_is_contained() {
        let factory = ExtensionFactory::new().register("explode", |_: &ExtensionSpec| -> Result<Box<dyn Extension>> {
            panic!("constructor blew up")
        });

        let err = factory
            .create(&spec("[[extension]]\nkind = \"explode\"\n"))
            .err()
            .unwrap();
        assert!(matches!(err, FocusError::Instantiation(_)));
    }
}
