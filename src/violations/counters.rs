use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CounterKind {
    TabSwitches,
    CopyPasteBlocked,
    ScreenshotAttempts,
    IdleEvents,
    MouseJumps,
}

/// Per-session violation tallies. Only ever incremented; reset when a session activates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationCounters {
    pub tab_switches: u32,
    pub copy_paste_blocked: u32,
    pub screenshot_attempts: u32,
    pub idle_events: u32,
    pub mouse_jumps: u32,
}

impl ViolationCounters {
    pub fn increment(&mut self, kind: CounterKind) {
        let slot = match kind {
            CounterKind::TabSwitches => &mut self.tab_switches,
            CounterKind::CopyPasteBlocked => &mut self.copy_paste_blocked,
            CounterKind::ScreenshotAttempts => &mut self.screenshot_attempts,
            CounterKind::IdleEvents => &mut self.idle_events,
            CounterKind::MouseJumps => &mut self.mouse_jumps,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn total(&self) -> u32 {
        self.tab_switches
            .saturating_add(self.copy_paste_blocked)
            .saturating_add(self.screenshot_attempts)
            .saturating_add(self.idle_events)
            .saturating_add(self.mouse_jumps)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::{CounterKind, ViolationCounters};

    #[test]
    fn total_is_sum_of_every_counter() {
        let mut counters = ViolationCounters::default();
        counters.increment(CounterKind::TabSwitches);
        counters.increment(CounterKind::CopyPasteBlocked);
        counters.increment(CounterKind::CopyPasteBlocked);
        counters.increment(CounterKind::ScreenshotAttempts);
        counters.increment(CounterKind::IdleEvents);
        counters.increment(CounterKind::MouseJumps);

        assert_eq!(counters.copy_paste_blocked, 2);
        assert_eq!(counters.total(), 6);

        counters.reset();
        assert_eq!(counters.total(), 0);
    }
}
