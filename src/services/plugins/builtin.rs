use crate::error::Result;
use serde::Deserialize;
use std::process::Command;
use tracing::{debug, info};

use super::extension::Extension;
use super::manifest::ExtensionSpec;

#[derive(Debug, Deserialize)]
struct LogSettings {
    #[serde(default)]
    message: Option<String>,
}

/// Writes a message to the log when its application gains focus.
#[derive(Debug, Clone)]
pub struct LogExtension {
    name: String,
    message: String,
}

impl LogExtension {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn from_spec(spec: &ExtensionSpec) -> Result<Box<dyn Extension>> {
        let settings: LogSettings = spec.settings()?;
        let name = spec.display_name();
        let message = settings
            .message
            .unwrap_or_else(|| format!("extension {} executed", name));

        Ok(Box::new(Self::new(name, message)))
    }
}

impl Extension for LogExtension {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self) -> anyhow::Result<()> {
        info!("[{}] {}", self.name, self.message);
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct CommandSettings {
    program: String,
    #[serde(default)]
    args: Vec<String>,
}

/// Runs an external program and waits for it to exit.
#[derive(Debug, Clone)]
pub struct CommandExtension {
    name: String,
    program: String,
    args: Vec<String>,
}

impl CommandExtension {
    pub fn new(name: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
        }
    }

    pub fn from_spec(spec: &ExtensionSpec) -> Result<Box<dyn Extension>> {
        let settings: CommandSettings = spec.settings()?;
        if settings.program.trim().is_empty() {
            return Err(crate::focus_error!(
                instantiation,
                "command extension in {} has an empty program",
                spec.module()
            ));
        }

        Ok(Box::new(Self::new(
            spec.display_name(),
            settings.program,
            settings.args,
        )))
    }
}

impl Extension for CommandExtension {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self) -> anyhow::Result<()> {
        debug!("[{}] running {} {:?}", self.name, self.program, self.args);

        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .map_err(|e| anyhow::anyhow!("failed to start {}: {}", self.program, e))?;

        if !status.success() {
            anyhow::bail!("{} exited with {}", self.program, status);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::plugins::ModuleManifest;

    fn spec(content: &str) -> ExtensionSpec {
        ModuleManifest::parse("PluginA", content).unwrap().extensions()[0].clone()
    }

    #[test]
    fn test_log_extension_defaults() {
        let extension = LogExtension::from_spec(&spec("[[extension]]\nkind = \"log\"\n")).unwrap();

        assert_eq!(extension.name(), "PluginA");
        assert!(extension.execute().is_ok());
    }

    #[test]
    fn test_command_requires_program() {
        assert!(CommandExtension::from_spec(&spec("[[extension]]\nkind = \"command\"\n")).is_err());
        assert!(
            CommandExtension::from_spec(&spec("[[extension]]\nkind = \"command\"\nprogram = \" \"\n"))
                .is_err()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_command_exit_status() {
        let ok = CommandExtension::new("ok", "true", vec![]);
        assert!(ok.execute().is_ok());

        let failing = CommandExtension::new("failing", "false", vec![]);
        assert!(failing.execute().is_err());

        let missing = CommandExtension::new("missing", "/nonexistent/focus-dispatch-tool", vec![]);
        assert!(missing.execute().is_err());
    }
}
