use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use fugit::{MillisDurationU64, TimerInstantU64};
use heapless::String;
use ufmt::uwrite;

/// Milliseconds since boot
pub type Instant = TimerInstantU64<1000>;
/// Millisecond duration used for every interval and timeout
pub type Millis = MillisDurationU64;

/// Free-running millisecond counter, the scheduler's notion of "now".
pub trait Monotonic {
    fn now(&mut self) -> Instant;
}

/// Battery-backed wall clock.
/// The only writer is the NTP synchronizer; everything else reads it.
pub trait ClockSource {
    type Error: core::fmt::Debug;

    /// Current wall-clock time
    fn now(&mut self) -> Result<NaiveDateTime, Self::Error>;

    /// Sets the clock to the given seconds since 1970-01-01 00:00:00
    fn adjust(&mut self, epoch_seconds: u32) -> Result<(), Self::Error>;
}

/// Time elapsed from `since` to `now`, zero if `since` lies in the future
pub fn elapsed(now: Instant, since: Instant) -> Millis {
    now.checked_duration_since(since)
        .unwrap_or(Millis::from_ticks(0))
}

/// Converts seconds since 1970 into a calendar date and time.
/// Every `u32` value is representable, so this never fails.
pub fn datetime_from_epoch(epoch_seconds: u32) -> NaiveDateTime {
    DateTime::from_timestamp(i64::from(epoch_seconds), 0)
        .map(|utc| utc.naive_utc())
        .unwrap_or_default()
}

/// Finds the last Sunday of a month by walking back from the 31st.
/// Days that do not exist in the month are skipped.
/// param year: calendar year
/// param month: 1-based month
pub fn last_sunday(year: i32, month: u32) -> Option<NaiveDate> {
    (1..=31)
        .rev()
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .find(|date| date.weekday() == Weekday::Sun)
}

/// Whether summer time applies on `date`.
/// The window runs from the last Sunday of March to the last Sunday of
/// October, both days included.
pub fn in_dst_window(date: NaiveDate) -> bool {
    match (last_sunday(date.year(), 3), last_sunday(date.year(), 10)) {
        (Some(start), Some(end)) => date >= start && date <= end,
        _ => false,
    }
}

/// Gets the time in the HH:MM:SS format
pub fn format_time(time: &NaiveDateTime) -> String<8> {
    let hour = pad_number(time.hour() as u8);
    let minute = pad_number(time.minute() as u8);
    let second = pad_number(time.second() as u8);

    let mut formatted: String<8> = String::new();
    // 8 characters always fit
    let _ = uwrite!(
        &mut formatted,
        "{}:{}:{}",
        hour.as_str(),
        minute.as_str(),
        second.as_str()
    );
    formatted
}

/// Pads a number with a zero before it if < 10
/// NOTE: Only supports values <100
/// param num: number to be padded
/// returns: String with formatted value
fn pad_number(num: u8) -> String<2> {
    let mut padded = String::new();
    if num < 10 {
        let _ = uwrite!(padded, "0{}", num);
    } else {
        let _ = uwrite!(padded, "{}", num);
    }
    padded
}
