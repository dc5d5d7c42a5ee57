use std::fmt;

/// Change of the focused application between two consecutive polls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTransition {
    pub from: Option<String>,
    pub to: String,
}

impl FocusTransition {
    pub fn new(from: Option<String>, to: String) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for FocusTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.from {
            Some(from) => write!(f, "{} -> {}", from, self.to),
            None => write!(f, "<none> -> {}", self.to),
        }
    }
}

/// Result of a single monitor tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The focus query returned nothing this tick
    NoSignal,
    /// Focus is still on the previously observed application
    Unchanged,
    Dispatched {
        app: String,
        extension: String,
    },
    NoExtension {
        app: String,
    },
    ExtensionFailed {
        app: String,
        extension: String,
        reason: String,
    },
    ExtensionTimedOut {
        app: String,
        extension: String,
    },
}

impl DispatchOutcome {
    /// True when the tick observed a new focused application
    pub fn is_transition(&self) -> bool {
        !matches!(self, DispatchOutcome::NoSignal | DispatchOutcome::Unchanged)
    }

    /// True when an extension was invoked, whatever its result
    pub fn invoked_extension(&self) -> bool {
        matches!(
            self,
            DispatchOutcome::Dispatched { .. }
                | DispatchOutcome::ExtensionFailed { .. }
                | DispatchOutcome::ExtensionTimedOut { .. }
        )
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchOutcome::NoSignal => write!(f, "no focus signal"),
            DispatchOutcome::Unchanged => write!(f, "focus unchanged"),
            DispatchOutcome::Dispatched { app, extension } => {
                write!(f, "dispatched {} for {}", extension, app)
            }
            DispatchOutcome::NoExtension { app } => write!(f, "no extension for {}", app),
            DispatchOutcome::ExtensionFailed {
                app,
                extension,
                reason,
            } => write!(f, "{} failed for {}: {}", extension, app, reason),
            DispatchOutcome::ExtensionTimedOut { app, extension } => {
                write!(f, "{} timed out for {}", extension, app)
            }
        }
    }
}
