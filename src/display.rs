use chrono::NaiveDateTime;

use crate::irrigation::IrrigationState;
use crate::sensors::SampleReading;

/// Face shown on the standby screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mood {
    Happy,
    Neutral,
    Sad,
}

impl From<IrrigationState> for Mood {
    fn from(state: IrrigationState) -> Self {
        match state {
            IrrigationState::Ok => Mood::Happy,
            IrrigationState::SoonWater => Mood::Neutral,
            IrrigationState::NeedsWater => Mood::Sad,
        }
    }
}

/// Everything the active screen shows besides the clock
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveView {
    pub moisture: u16,
    pub temperature: f32,
    pub humidity: f32,
    pub irrigation: IrrigationState,
}

impl ActiveView {
    pub fn new(reading: &SampleReading, irrigation: IrrigationState) -> ActiveView {
        Self {
            moisture: reading.moisture,
            temperature: reading.temperature,
            humidity: reading.humidity,
            irrigation,
        }
    }
}

/// Fields that differ from what the screen currently shows.
/// The status line is always redrawn, so it is not optional.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldChanges {
    pub moisture: Option<u16>,
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
    pub irrigation: IrrigationState,
}

impl FieldChanges {
    /// Compares the new view with the last rendered one
    /// param rendered: what is on screen, None if nothing is
    /// param current: what should be on screen
    pub fn between(rendered: Option<&ActiveView>, current: &ActiveView) -> FieldChanges {
        FieldChanges {
            moisture: rendered
                .map_or(true, |r| r.moisture != current.moisture)
                .then_some(current.moisture),
            temperature: rendered
                .map_or(true, |r| r.temperature != current.temperature)
                .then_some(current.temperature),
            humidity: rendered
                .map_or(true, |r| r.humidity != current.humidity)
                .then_some(current.humidity),
            irrigation: current.irrigation,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.moisture.is_none() && self.temperature.is_none() && self.humidity.is_none()
    }
}

/// Status display
pub trait Display {
    type Error: core::fmt::Debug;

    /// Full-screen message used during startup and for fatal errors
    fn render_notice(&mut self, message: &str) -> Result<(), Self::Error>;

    /// Blanks the whole screen
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Redraws the wall-clock time on the active screen
    fn render_clock(&mut self, time: &NaiveDateTime) -> Result<(), Self::Error>;

    /// Clears the screen and draws every active field
    fn render_active_full(&mut self, view: &ActiveView) -> Result<(), Self::Error>;

    /// Redraws only the listed fields plus the status line
    fn render_active_delta(&mut self, changes: &FieldChanges) -> Result<(), Self::Error>;

    /// Draws the idle animation
    fn render_standby(&mut self, mood: Mood) -> Result<(), Self::Error>;

    fn set_backlight(&mut self, level: u8) -> Result<(), Self::Error>;
}
