use embedded_hal::digital::{OutputPin, PinState};

/// Moisture levels (raw ADC units) separating the irrigation states.
/// needs_water: readings at or below this want water now
/// soon_water: readings at or below this (and above needs_water) want water soon
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoistureThresholds {
    pub needs_water: u16,
    pub soon_water: u16,
}

impl Default for MoistureThresholds {
    fn default() -> Self {
        MoistureThresholds {
            needs_water: 10,
            soon_water: 300,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrrigationState {
    NeedsWater,
    SoonWater,
    Ok,
}

impl IrrigationState {
    /// Status line shown on the active screen
    pub fn status_text(self) -> &'static str {
        match self {
            IrrigationState::NeedsWater => "Water now",
            IrrigationState::SoonWater => "Water soon",
            IrrigationState::Ok => "All good",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RelayLevel {
    Energized,
    DeEnergized,
}

impl RelayLevel {
    pub fn is_energized(self) -> bool {
        self == RelayLevel::Energized
    }
}

/// Classifies a moisture reading.
/// There is no hysteresis band: a reading hovering on a threshold flips
/// the state (and the relay) on every evaluation.
/// param moisture: raw ADC reading
/// param thresholds: classification limits
pub fn classify(moisture: u16, thresholds: &MoistureThresholds) -> IrrigationState {
    if moisture <= thresholds.needs_water {
        IrrigationState::NeedsWater
    } else if moisture <= thresholds.soon_water {
        IrrigationState::SoonWater
    } else {
        IrrigationState::Ok
    }
}

/// Pump relay level for an irrigation state; only NeedsWater runs the pump
pub fn drive(state: IrrigationState) -> RelayLevel {
    match state {
        IrrigationState::NeedsWater => RelayLevel::Energized,
        IrrigationState::SoonWater | IrrigationState::Ok => RelayLevel::DeEnergized,
    }
}

/// Binary pump actuator
pub trait Actuator {
    type Error: core::fmt::Debug;

    fn set_relay(&mut self, energized: bool) -> Result<(), Self::Error>;
}

/// Relay driven straight from a GPIO.
/// Relay boards behind a transistor or ULN driver are often active-low,
/// so the polarity is configurable.
pub struct RelayPin<P> {
    pin: P,
    active_low: bool,
    level: Option<RelayLevel>,
}

impl<P: OutputPin> RelayPin<P> {
    /// Wraps the pin and switches the relay off
    /// param pin: relay control pin
    /// param active_low: if the relay energizes on a low pin
    pub fn new(pin: P, active_low: bool) -> Result<RelayPin<P>, P::Error> {
        let mut relay = Self {
            pin,
            active_low,
            level: None,
        };
        relay.set_relay(false)?;
        Ok(relay)
    }

    /// Last level written to the pin
    pub fn level(&self) -> Option<RelayLevel> {
        self.level
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> Actuator for RelayPin<P> {
    type Error = P::Error;

    fn set_relay(&mut self, energized: bool) -> Result<(), Self::Error> {
        let high = energized != self.active_low;
        self.pin.set_state(PinState::from(high))?;
        self.level = Some(if energized {
            RelayLevel::Energized
        } else {
            RelayLevel::DeEnergized
        });
        Ok(())
    }
}
