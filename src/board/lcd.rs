use core::fmt::Write;

use chrono::NaiveDateTime;
use embedded_hal::digital::{OutputPin, PinState};
use heapless::String;
use lcd1602_rs::LCD1602;
use rp_pico::hal::gpio::bank0::{Gpio0, Gpio1, Gpio15, Gpio2, Gpio3, Gpio4, Gpio5};
use rp_pico::hal::gpio::{FunctionSio, Pin, PullDown, SioOutput};
use rp_pico::hal::Timer;

use crate::clock::format_time;
use crate::display::{ActiveView, Display, FieldChanges, Mood};
use crate::irrigation::IrrigationState;

type Output<P> = Pin<P, FunctionSio<SioOutput>, PullDown>;

pub type Lcd = LCD1602<
    Output<Gpio1>,
    Output<Gpio0>,
    Output<Gpio2>,
    Output<Gpio3>,
    Output<Gpio4>,
    Output<Gpio5>,
    Timer,
>;
pub type BacklightPin = Output<Gpio15>;

const COLUMNS: u8 = 16;

// Field positions (column, row):
// row 0: "HH:MM:SS 23C 41%"
// row 1: "Water soon  1023"
const CLOCK: (u8, u8) = (0, 0);
const TEMPERATURE: (u8, u8) = (8, 0);
const HUMIDITY: (u8, u8) = (12, 0);
const STATUS: (u8, u8) = (0, 1);
const MOISTURE: (u8, u8) = (11, 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LcdError;

/// 16x2 character display with a switched backlight
pub struct LcdDisplay {
    lcd: Lcd,
    backlight: BacklightPin,
    frame: u8,
}

impl LcdDisplay {
    pub fn new(lcd: Lcd, backlight: BacklightPin) -> LcdDisplay {
        Self {
            lcd,
            backlight,
            frame: 0,
        }
    }

    fn print_at(&mut self, (column, row): (u8, u8), text: &str) -> Result<(), LcdError> {
        self.lcd.set_position(column, row).map_err(|_| LcdError)?;
        self.lcd.print(text).map_err(|_| LcdError)
    }

    fn print_temperature(&mut self, celsius: f32) -> Result<(), LcdError> {
        let mut text: String<8> = String::new();
        let _ = write!(text, "{:>3.0}C", celsius);
        self.print_at(TEMPERATURE, &text)
    }

    fn print_humidity(&mut self, percent: f32) -> Result<(), LcdError> {
        let mut text: String<8> = String::new();
        let _ = write!(text, "{:>3.0}%", percent);
        self.print_at(HUMIDITY, &text)
    }

    fn print_moisture(&mut self, moisture: u16) -> Result<(), LcdError> {
        let mut text: String<8> = String::new();
        let _ = write!(text, "{:>5}", moisture);
        self.print_at(MOISTURE, &text)
    }

    fn print_status(&mut self, state: IrrigationState) -> Result<(), LcdError> {
        let mut text: String<16> = String::new();
        let _ = write!(text, "{:<11}", state.status_text());
        self.print_at(STATUS, &text)
    }
}

impl Display for LcdDisplay {
    type Error = LcdError;

    fn render_notice(&mut self, message: &str) -> Result<(), LcdError> {
        self.clear()?;
        let end = message.len().min(usize::from(COLUMNS));
        self.print_at((0, 0), message.get(..end).unwrap_or(message))
    }

    fn clear(&mut self) -> Result<(), LcdError> {
        self.lcd.clear().map_err(|_| LcdError)
    }

    fn render_clock(&mut self, time: &NaiveDateTime) -> Result<(), LcdError> {
        self.print_at(CLOCK, &format_time(time))
    }

    fn render_active_full(&mut self, view: &ActiveView) -> Result<(), LcdError> {
        self.clear()?;
        self.print_temperature(view.temperature)?;
        self.print_humidity(view.humidity)?;
        self.print_status(view.irrigation)?;
        self.print_moisture(view.moisture)
    }

    fn render_active_delta(&mut self, changes: &FieldChanges) -> Result<(), LcdError> {
        if let Some(temperature) = changes.temperature {
            self.print_temperature(temperature)?;
        }
        if let Some(humidity) = changes.humidity {
            self.print_humidity(humidity)?;
        }
        if let Some(moisture) = changes.moisture {
            self.print_moisture(moisture)?;
        }
        self.print_status(changes.irrigation)
    }

    /// Face drifting across the top row, one step per frame
    fn render_standby(&mut self, mood: Mood) -> Result<(), LcdError> {
        let face = match mood {
            Mood::Happy => ":-)",
            Mood::Neutral => ":-|",
            Mood::Sad => ":-(",
        };
        let span = COLUMNS - 3;
        let column = self.frame % (span + 1);
        self.frame = self.frame.wrapping_add(1);

        self.clear()?;
        self.print_at((column, 0), face)
    }

    fn set_backlight(&mut self, level: u8) -> Result<(), LcdError> {
        self.backlight
            .set_state(PinState::from(level > 0))
            .map_err(|_| LcdError)
    }
}
