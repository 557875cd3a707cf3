use bme680::{Bme680, FieldData, PowerMode};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_0_2::adc::OneShot;
use i2c_pio::I2C;
use rp_pico::hal::adc::{Adc, AdcPin};
use rp_pico::hal::gpio::bank0::{Gpio26, Gpio6, Gpio7, Gpio8, Gpio9};
use rp_pico::hal::gpio::{FunctionNull, FunctionSio, Pin, PullDown, PullNone, SioInput, SioOutput};
use rp_pico::hal::pio::SM0;
use rp_pico::hal::Timer;
use rp_pico::pac::PIO0;

use crate::sensors::Sensors;

pub type Bme<'a> = Bme680<
    I2C<'a, PIO0, SM0, Pin<Gpio8, FunctionNull, PullDown>, Pin<Gpio9, FunctionNull, PullDown>>,
    Timer,
>;
pub type MoisturePin = AdcPin<Pin<Gpio26, FunctionSio<SioInput>, PullNone>>;
pub type TriggerPin = Pin<Gpio6, FunctionSio<SioOutput>, PullDown>;
pub type EchoPin = Pin<Gpio7, FunctionSio<SioInput>, PullDown>;

/// Longest echo wait, about 5 m of range
const ECHO_TIMEOUT_US: u64 = 30_000;

/// Soil probe, BME680 and HC-SR04 ranger
pub struct BoardSensors<'a> {
    adc: Adc,
    moisture: MoisturePin,
    bme: Bme<'a>,
    trigger: TriggerPin,
    echo: EchoPin,
    timer: Timer,
    /// Last BME680 measurement, shared by temperature and humidity
    climate: Option<FieldData>,
    ranger_seen: bool,
}

impl<'a> BoardSensors<'a> {
    pub fn new(
        adc: Adc,
        moisture: MoisturePin,
        bme: Bme<'a>,
        trigger: TriggerPin,
        echo: EchoPin,
        timer: Timer,
    ) -> BoardSensors<'a> {
        Self {
            adc,
            moisture,
            bme,
            trigger,
            echo,
            timer,
            climate: None,
            ranger_seen: false,
        }
    }

    /// Runs one forced-mode measurement
    fn measure(&mut self) -> Option<FieldData> {
        self.bme
            .set_sensor_mode(&mut self.timer, PowerMode::ForcedMode)
            .ok()?;
        self.bme
            .get_sensor_data(&mut self.timer)
            .ok()
            .map(|(data, _condition)| data)
    }

    fn micros(&self) -> u64 {
        self.timer.get_counter().ticks()
    }

    /// Waits until the echo line reaches `high`
    /// returns false on timeout
    fn wait_for_echo(&mut self, high: bool) -> bool {
        let started = self.micros();
        while self.echo.is_high().unwrap_or(false) != high {
            if self.micros() - started > ECHO_TIMEOUT_US {
                return false;
            }
        }
        true
    }
}

impl Sensors for BoardSensors<'_> {
    /// 12-bit conversion scaled down to the 10-bit range the thresholds use
    fn read_moisture(&mut self) -> Option<u16> {
        let raw: u16 = nb::block!(self.adc.read(&mut self.moisture)).ok()?;
        Some(raw >> 2)
    }

    /// Takes a fresh measurement; `read_humidity` reuses it
    fn read_temperature(&mut self) -> f32 {
        self.climate = self.measure();
        self.climate
            .as_ref()
            .map_or(f32::NAN, |data| data.temperature_celsius())
    }

    fn read_humidity(&mut self) -> f32 {
        self.climate
            .as_ref()
            .map_or(f32::NAN, |data| data.humidity_percent())
    }

    fn read_distance(&mut self) -> Option<u16> {
        self.trigger.set_high().ok()?;
        self.timer.delay_us(10);
        self.trigger.set_low().ok()?;

        if !self.wait_for_echo(true) {
            return None;
        }
        self.ranger_seen = true;
        let rise = self.micros();
        if !self.wait_for_echo(false) {
            return None;
        }

        // Round trip at 343 m/s
        let mm = (self.micros() - rise) * 343 / 2000;
        Some(mm.min(u64::from(u16::MAX)) as u16)
    }

    fn proximity_available(&mut self) -> bool {
        if !self.ranger_seen {
            let _ = self.read_distance();
        }
        self.ranger_seen
    }
}
