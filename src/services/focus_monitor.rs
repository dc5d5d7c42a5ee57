use crate::config::Config;
use crate::events::{DispatchOutcome, FocusTransition};
use crate::services::focus_query::FocusQuery;
use crate::services::plugins::{normalize_app_id, Extension, PluginRegistry};
use crate::trace_if_enabled;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub polling_interval: Duration,
    /// Upper bound on waiting for `Extension::execute`; `None` waits forever
    pub execution_timeout: Option<Duration>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            polling_interval: Duration::from_secs(1),
            execution_timeout: None,
        }
    }
}

impl MonitorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            polling_interval: config.polling_interval(),
            execution_timeout: config.execution_timeout(),
        }
    }
}

/// Edge-triggered sampler over the focused application.
///
/// Every tick asks the focus query for the foreground process and dispatches the
/// registered extension only when it differs from the last observed one. The
/// last observed application is updated on every transition, matched or not, so
/// a sustained focus is looked up once.
pub struct FocusMonitor {
    registry: Arc<PluginRegistry>,
    focus_query: Box<dyn FocusQuery>,
    settings: MonitorSettings,
    last_focused: Option<String>,
}

impl FocusMonitor {
    pub fn new(
        registry: Arc<PluginRegistry>,
        focus_query: Box<dyn FocusQuery>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            registry,
            focus_query,
            settings,
            last_focused: None,
        }
    }

    pub fn last_focused(&self) -> Option<&str> {
        self.last_focused.as_deref()
    }

    /// Run until `stop` turns true or its sender is dropped.
    ///
    /// The stop flag is checked before every tick and interrupts the polling
    /// sleep; a tick that already started (including a running extension) is
    /// finished first.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        info!(
            "Focus monitor started: polling every {:?}, {} extension(s) registered",
            self.settings.polling_interval,
            self.registry.len()
        );

        loop {
            if *stop.borrow_and_update() {
                break;
            }

            let outcome = self.tick().await;
            trace_if_enabled!("Tick finished: {}", outcome);

            tokio::select! {
                _ = sleep(self.settings.polling_interval) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        debug!("Stop signal sender dropped");
                        break;
                    }
                }
            }
        }

        info!("Focus monitor stopped");
    }

    /// One poll: detect a transition and dispatch for it.
    pub async fn tick(&mut self) -> DispatchOutcome {
        let current = match self.focus_query.active_app() {
            Some(app) if !app.trim().is_empty() => normalize_app_id(&app),
            _ => return DispatchOutcome::NoSignal,
        };

        if self.last_focused.as_deref() == Some(current.as_str()) {
            return DispatchOutcome::Unchanged;
        }

        let transition = FocusTransition::new(self.last_focused.clone(), current.clone());
        info!("Active application: {}", transition);

        let outcome = match self.registry.lookup(&current) {
            Some(extension) => self.dispatch(&current, extension).await,
            None => {
                warn!("No extension found for {}", current);
                DispatchOutcome::NoExtension {
                    app: current.clone(),
                }
            }
        };

        self.last_focused = Some(current);
        outcome
    }

    async fn dispatch(&self, app: &str, extension: Arc<dyn Extension>) -> DispatchOutcome {
        let name = extension.name().to_string();
        info!("Executing extension {} for {}", name, app);

        let task = tokio::task::spawn_blocking(move || extension.execute());

        let joined = match self.settings.execution_timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    error!(
                        "Extension {} for {} did not finish within {:?}, continuing without it",
                        name, app, limit
                    );
                    return DispatchOutcome::ExtensionTimedOut {
                        app: app.to_string(),
                        extension: name,
                    };
                }
            },
            None => task.await,
        };

        let reason = match joined {
            Ok(Ok(())) => {
                debug!("Extension {} finished", name);
                return DispatchOutcome::Dispatched {
                    app: app.to_string(),
                    extension: name,
                };
            }
            Ok(Err(e)) => format!("{:#}", e),
            Err(e) if e.is_panic() => "extension panicked".to_string(),
            Err(e) => e.to_string(),
        };

        error!("Extension {} failed for {}: {}", name, app, reason);
        DispatchOutcome::ExtensionFailed {
            app: app.to_string(),
            extension: name,
            reason,
        }
    }
}
