//! Raspberry Pi Pico bindings for the controller's collaborators.
//!
//! Wiring:
//!
//! | Part | Pins |
//! |------|------|
//! | LCD1602 (4-bit) | EN gpio1, RS gpio0, D4..D7 gpio2..gpio5, backlight gpio15 |
//! | HC-SR04 | TRIG gpio6, ECHO gpio7 |
//! | BME680 (PIO I2C) | SDA gpio8, SCL gpio9 |
//! | W5500 (SPI1) | SCK gpio10, MOSI gpio11, MISO gpio12, CS gpio13 |
//! | Pump relay | gpio14 |
//! | SD card (SPI0) | MISO gpio16, CS gpio17, SCK gpio18, MOSI gpio19 |
//! | DS3231 (I2C0) | SDA gpio20, SCL gpio21 |
//! | Moisture probe | ADC0 / gpio26 |

pub mod lcd;
pub mod rtc;
pub mod sensors;
pub mod storage;

use rp_pico::hal::Timer;

use crate::clock::{Instant, Monotonic};

pub use lcd::LcdDisplay;
pub use rtc::Rtc;
pub use sensors::BoardSensors;
pub use storage::SdLog;

/// Millisecond view of the RP2040's 1 MHz timer
#[derive(Clone, Copy)]
pub struct BoardClock {
    timer: Timer,
}

impl BoardClock {
    pub fn new(timer: Timer) -> BoardClock {
        Self { timer }
    }
}

impl Monotonic for BoardClock {
    fn now(&mut self) -> Instant {
        Instant::from_ticks(self.timer.get_counter().ticks() / 1000)
    }
}
