use chrono::NaiveDateTime;
use ds323x::interface::I2cInterface;
use ds323x::ic::DS3231;
use ds323x::{DateTimeAccess, Ds323x};

use crate::clock::{datetime_from_epoch, ClockSource};

type Ds3231<I2C> = Ds323x<I2cInterface<I2C>, DS3231>;

/// DS3231 battery-backed clock
pub struct Rtc<I2C> {
    rtc: Ds3231<I2C>,
}

impl<I2C> Rtc<I2C> {
    pub fn new(rtc: Ds3231<I2C>) -> Rtc<I2C> {
        Self { rtc }
    }

    pub fn release(self) -> Ds3231<I2C> {
        self.rtc
    }
}

impl<I2C> ClockSource for Rtc<I2C>
where
    Ds3231<I2C>: DateTimeAccess,
    <Ds3231<I2C> as DateTimeAccess>::Error: core::fmt::Debug,
{
    type Error = <Ds3231<I2C> as DateTimeAccess>::Error;

    fn now(&mut self) -> Result<NaiveDateTime, Self::Error> {
        self.rtc.datetime()
    }

    fn adjust(&mut self, epoch_seconds: u32) -> Result<(), Self::Error> {
        let time = datetime_from_epoch(epoch_seconds);
        self.rtc.set_datetime(&time)
    }
}
