use crate::error::{FocusError, Result};
use crate::utils::process::process_name;
use parking_lot::Mutex;
use std::process::Command;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::kdotool::KdotoolBackend;
use super::r#trait::FocusQuery;
use super::sway::SwayBackend;
use super::xdotool::XdotoolBackend;

/// Pause between probes while no backend works
const REPROBE_INTERVAL: Duration = Duration::from_secs(10);

/// Consecutive query failures after which the cached backend is dropped
const MAX_FAILURES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DesktopEnvironment {
    KDE,
    GNOME,
    Sway,
    X11Generic,
    WaylandGeneric,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Kdotool,
    Xdotool,
    Sway,
}

impl Backend {
    fn from_name(name: &str) -> Result<Option<Self>> {
        match name {
            "auto" => Ok(None),
            "kdotool" => Ok(Some(Backend::Kdotool)),
            "xdotool" => Ok(Some(Backend::Xdotool)),
            "sway" => Ok(Some(Backend::Sway)),
            other => Err(FocusError::Internal(format!(
                "Unknown detector backend: {}",
                other
            ))),
        }
    }

    /// Probe order for a desktop, most specific tool first
    fn candidates(desktop_env: DesktopEnvironment) -> &'static [Backend] {
        match desktop_env {
            DesktopEnvironment::KDE => &[Backend::Kdotool, Backend::Xdotool],
            DesktopEnvironment::Sway => &[Backend::Sway, Backend::Xdotool],
            DesktopEnvironment::GNOME | DesktopEnvironment::X11Generic => &[Backend::Xdotool],
            DesktopEnvironment::WaylandGeneric | DesktopEnvironment::Unknown => {
                &[Backend::Kdotool, Backend::Sway, Backend::Xdotool]
            }
        }
    }
}

#[derive(Debug, Default)]
struct ProbeState {
    working: Option<Backend>,
    last_probe: Option<Instant>,
    failures: u32,
}

/// Focus query backed by the desktop's window tools (kdotool, xdotool, swaymsg).
///
/// The working tool is probed lazily and cached; when it stops answering it is
/// dropped after `MAX_FAILURES` consecutive errors and probed again, at most
/// once per `REPROBE_INTERVAL`.
pub struct PlatformFocusQuery {
    desktop_env: DesktopEnvironment,
    forced: Option<Backend>,
    state: Mutex<ProbeState>,

    kdotool: KdotoolBackend,
    xdotool: XdotoolBackend,
    sway: SwayBackend,
}

impl PlatformFocusQuery {
    pub fn new(backend: &str) -> Result<Self> {
        let forced = Backend::from_name(backend)?;
        let desktop_env = Self::detect_desktop_environment();
        info!(
            "Platform focus query for {:?} (backend: {})",
            desktop_env, backend
        );

        Ok(Self {
            desktop_env,
            forced,
            state: Mutex::new(ProbeState::default()),
            kdotool: KdotoolBackend::new(),
            xdotool: XdotoolBackend::new(),
            sway: SwayBackend::new(),
        })
    }

    fn detect_desktop_environment() -> DesktopEnvironment {
        if std::env::var_os("SWAYSOCK").is_some() {
            return DesktopEnvironment::Sway;
        }

        if let Ok(desktop) = std::env::var("XDG_CURRENT_DESKTOP") {
            match desktop.to_lowercase().as_str() {
                d if d.contains("kde") => return DesktopEnvironment::KDE,
                d if d.contains("gnome") => return DesktopEnvironment::GNOME,
                d if d.contains("sway") => return DesktopEnvironment::Sway,
                _ => {}
            }
        }

        if let Ok(session) = std::env::var("XDG_SESSION_TYPE") {
            match session.as_str() {
                "wayland" => return DesktopEnvironment::WaylandGeneric,
                "x11" => return DesktopEnvironment::X11Generic,
                _ => {}
            }
        }

        if let Ok(output) = Command::new("pgrep").arg("-f").arg("kwin").output() {
            if !output.stdout.is_empty() {
                return DesktopEnvironment::KDE;
            }
        }

        DesktopEnvironment::Unknown
    }

    fn candidates(&self) -> &[Backend] {
        match &self.forced {
            Some(backend) => std::slice::from_ref(backend),
            None => Backend::candidates(self.desktop_env),
        }
    }

    fn probe(&self, backend: Backend) -> Result<()> {
        match backend {
            Backend::Kdotool => self.kdotool.test(),
            Backend::Xdotool => self.xdotool.test(),
            Backend::Sway => self.sway.test(),
        }
    }

    fn active_pid(&self, backend: Backend) -> Result<Option<u32>> {
        match backend {
            Backend::Kdotool => self.kdotool.active_pid(),
            Backend::Xdotool => self.xdotool.active_pid(),
            Backend::Sway => self.sway.active_pid(),
        }
    }

    /// Cached working backend, probing the candidates when none is cached.
    fn working_backend(&self) -> Option<Backend> {
        let mut state = self.state.lock();
        if let Some(backend) = state.working {
            return Some(backend);
        }

        if let Some(last_probe) = state.last_probe {
            if last_probe.elapsed() < REPROBE_INTERVAL {
                return None;
            }
        }
        state.last_probe = Some(Instant::now());

        for backend in self.candidates() {
            match self.probe(*backend) {
                Ok(()) => {
                    info!("Using {:?} to query the focused window", backend);
                    state.working = Some(*backend);
                    return Some(*backend);
                }
                Err(e) => debug!("{:?} is not usable: {}", backend, e),
            }
        }

        warn!(
            "No focus backend works, retrying in {}s",
            REPROBE_INTERVAL.as_secs()
        );
        None
    }

    /// Failure bookkeeping for one query. An answer of "no active window"
    /// resets the count like a pid does; only tool errors count.
    fn record_query(&self, backend: Backend, result: Result<Option<u32>>) -> Option<u32> {
        let mut state = self.state.lock();
        match result {
            Ok(pid) => {
                state.failures = 0;
                pid
            }
            Err(e) => {
                debug!("{:?} could not report the focused window: {}", backend, e);
                state.failures += 1;
                if state.failures >= MAX_FAILURES {
                    warn!("{:?} keeps failing, probing backends again", backend);
                    *state = ProbeState::default();
                }
                None
            }
        }
    }
}

impl FocusQuery for PlatformFocusQuery {
    fn active_app(&self) -> Option<String> {
        let backend = self.working_backend()?;
        let pid = self.record_query(backend, self.active_pid(backend))?;

        match process_name(pid) {
            Ok(name) => Some(name),
            Err(e) => {
                debug!("Cannot resolve process name for pid {}: {}", pid, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names() {
        assert_eq!(Backend::from_name("auto").unwrap(), None);
        assert_eq!(Backend::from_name("sway").unwrap(), Some(Backend::Sway));
        assert!(Backend::from_name("wmctrl").is_err());
    }

    #[test]
    fn test_forced_backend_is_the_only_candidate() {
        let query = PlatformFocusQuery::new("xdotool").unwrap();
        assert_eq!(query.candidates(), &[Backend::Xdotool]);
    }

    #[test]
    fn test_kde_prefers_kdotool() {
        assert_eq!(
            Backend::candidates(DesktopEnvironment::KDE)[0],
            Backend::Kdotool
        );
        assert_eq!(
            Backend::candidates(DesktopEnvironment::GNOME),
            &[Backend::Xdotool]
        );
    }

    #[test]
    fn test_unfocused_desktop_keeps_the_backend() {
        let query = PlatformFocusQuery::new("xdotool").unwrap();
        query.state.lock().working = Some(Backend::Xdotool);

        for _ in 0..(MAX_FAILURES * 2) {
            assert_eq!(query.record_query(Backend::Xdotool, Ok(None)), None);
        }

        let state = query.state.lock();
        assert_eq!(state.working, Some(Backend::Xdotool));
        assert_eq!(state.failures, 0);
    }

    #[test]
    fn test_tool_errors_drop_the_backend() {
        let query = PlatformFocusQuery::new("xdotool").unwrap();
        query.state.lock().working = Some(Backend::Xdotool);

        let error = || Err(FocusError::ServiceUnavailable("xdotool failed".to_string()));
        for _ in 0..(MAX_FAILURES - 1) {
            assert_eq!(query.record_query(Backend::Xdotool, error()), None);
        }
        assert_eq!(query.state.lock().working, Some(Backend::Xdotool));

        // a pid in between resets the count
        assert_eq!(query.record_query(Backend::Xdotool, Ok(Some(42))), Some(42));
        assert_eq!(query.state.lock().failures, 0);

        for _ in 0..MAX_FAILURES {
            query.record_query(Backend::Xdotool, error());
        }
        assert_eq!(query.state.lock().working, None);
    }
}
