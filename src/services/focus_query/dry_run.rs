use std::sync::atomic::{AtomicU32, Ordering};
use tracing::info;

use super::r#trait::FocusQuery;

const FAKE_APPS: [Option<&str>; 5] = [
    Some("firefox"),
    Some("code"),
    None,
    Some("alacritty"),
    Some("code"),
];

/// Emulates focus changes without touching the desktop: every `cycle` polls the
/// focus moves to the next entry of a fixed list.
pub struct DryRunFocusQuery {
    cycle: u32,
    polls: AtomicU32,
}

impl DryRunFocusQuery {
    pub fn new(cycle: u32) -> Self {
        info!("Dry-run mode: focus changes are emulated every {} poll(s)", cycle);
        Self {
            cycle: cycle.max(1),
            polls: AtomicU32::new(0),
        }
    }
}

impl FocusQuery for DryRunFocusQuery {
    fn active_app(&self) -> Option<String> {
        let poll = self.polls.fetch_add(1, Ordering::Relaxed);
        let index = (poll / self.cycle) as usize % FAKE_APPS.len();
        FAKE_APPS[index].map(str::to_string)
    }
}
