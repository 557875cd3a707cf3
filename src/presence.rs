use crate::clock::{elapsed, Instant, Millis};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayMode {
    Active,
    Standby,
}

/// Mode change produced by a proximity reading
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    EnteredActive,
    EnteredStandby,
}

/// Two-state display mode driven by a proximity sensor.
///
/// Someone within `threshold_mm` keeps (or makes) the display active; once
/// nobody has been that close for `timeout`, the display drops to standby.
/// Entering the active state raises `first_entry`, which asks the next
/// sample render for a full redraw instead of a delta.
pub struct PresenceMonitor {
    mode: DisplayMode,
    first_entry: bool,
    last_presence: Instant,
    threshold_mm: u16,
    timeout: Millis,
}

impl PresenceMonitor {
    /// Starts in the active state as if someone was just seen
    pub fn new(threshold_mm: u16, timeout: Millis, now: Instant) -> PresenceMonitor {
        Self {
            mode: DisplayMode::Active,
            first_entry: true,
            last_presence: now,
            threshold_mm,
            timeout,
        }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn first_entry(&self) -> bool {
        self.first_entry
    }

    pub fn last_presence(&self) -> Instant {
        self.last_presence
    }

    /// Returns and clears the full-redraw request
    pub fn take_first_entry(&mut self) -> bool {
        core::mem::replace(&mut self.first_entry, false)
    }

    /// Whether a reading counts as someone in front of the display
    pub fn is_present(&self, distance_mm: Option<u16>) -> bool {
        matches!(distance_mm, Some(mm) if mm <= self.threshold_mm)
    }

    /// Feeds one proximity reading into the state machine
    /// param distance_mm: latest reading, None if the sensor saw nothing
    /// param now: current monotonic time
    /// returns the transition taken, if any
    pub fn observe(&mut self, distance_mm: Option<u16>, now: Instant) -> Option<Transition> {
        if self.is_present(distance_mm) {
            self.last_presence = now;
            if self.mode == DisplayMode::Standby {
                self.mode = DisplayMode::Active;
                self.first_entry = true;
                return Some(Transition::EnteredActive);
            }
            return None;
        }

        if self.mode == DisplayMode::Active && elapsed(now, self.last_presence) >= self.timeout {
            self.mode = DisplayMode::Standby;
            self.first_entry = false;
            return Some(Transition::EnteredStandby);
        }

        None
    }
}
