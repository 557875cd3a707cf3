use heapless::Vec;

use crate::clock::{elapsed, Instant, Millis};
use crate::config::Settings;

/// Periodic jobs of the control loop, in the order they run when due together
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Task {
    /// Redraw the wall-clock time
    ClockRefresh,
    /// Read sensors, drive the relay and refresh the active screen
    Sample,
    /// Append the latest valid sample to the data log
    Persist,
    /// Redraw the idle animation while in standby
    StandbyRender,
}

pub const TASK_COUNT: usize = 4;

/// Interval timer that fires once `interval` has passed since it last fired.
/// Firing restarts it from the current time rather than from the missed
/// deadline, so an overrun delays later firings instead of bunching them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodicTimer {
    interval: Millis,
    last_fire: Instant,
}

impl PeriodicTimer {
    pub fn new(interval: Millis) -> PeriodicTimer {
        Self {
            interval,
            last_fire: Instant::from_ticks(0),
        }
    }

    /// Checks the timer and restarts it if it is due
    /// param now: current monotonic time
    /// returns if the timer fired
    pub fn poll(&mut self, now: Instant) -> bool {
        if elapsed(now, self.last_fire) >= self.interval {
            self.last_fire = now;
            true
        } else {
            false
        }
    }

    pub fn interval(&self) -> Millis {
        self.interval
    }

    pub fn last_fire(&self) -> Instant {
        self.last_fire
    }
}

/// Fixed task table evaluated once per loop pass
pub struct Schedule {
    entries: [(Task, PeriodicTimer); TASK_COUNT],
}

impl Schedule {
    pub fn new(settings: &Settings) -> Schedule {
        Self {
            entries: [
                (Task::ClockRefresh, PeriodicTimer::new(settings.clock_interval)),
                (Task::Sample, PeriodicTimer::new(settings.sample_interval)),
                (Task::Persist, PeriodicTimer::new(settings.persist_interval)),
                (Task::StandbyRender, PeriodicTimer::new(settings.standby_interval)),
            ],
        }
    }

    /// Collects every due task, each at most once, in registration order
    /// param now: current monotonic time
    pub fn poll(&mut self, now: Instant) -> Vec<Task, TASK_COUNT> {
        let mut due = Vec::new();
        for (task, timer) in self.entries.iter_mut() {
            if timer.poll(now) {
                // Capacity equals the table size
                let _ = due.push(*task);
            }
        }
        due
    }

    pub fn timer(&self, task: Task) -> Option<&PeriodicTimer> {
        self.entries
            .iter()
            .find(|(t, _)| *t == task)
            .map(|(_, timer)| timer)
    }
}
