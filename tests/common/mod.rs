//! Mock collaborators for controller integration tests.
//!
//! Every mock records what it was asked to do so tests can assert on the
//! exact sequence of renders, relay writes and log rows.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddrV4;

use chrono::{NaiveDate, NaiveDateTime};
use plantcare_rs::clock::{datetime_from_epoch, ClockSource, Instant, Millis};
use plantcare_rs::controller::Controller;
use plantcare_rs::datalog::{DataLog, LogRecord};
use plantcare_rs::display::{ActiveView, Display, FieldChanges, Mood};
use plantcare_rs::irrigation::Actuator;
use plantcare_rs::net::DatagramChannel;
use plantcare_rs::sensors::Sensors;
use plantcare_rs::Settings;

pub type TestController = Controller<MockClock, MockSensors, MockRelay, MockDisplay, MockLog>;

pub fn datetime(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .unwrap()
}

pub fn at(ms: u64) -> Instant {
    Instant::from_ticks(ms)
}

/// Wall clock frozen at a given time until adjusted
pub struct MockClock {
    pub time: Option<NaiveDateTime>,
    pub adjustments: Vec<u32>,
}

impl MockClock {
    pub fn at(time: NaiveDateTime) -> Self {
        Self {
            time: Some(time),
            adjustments: Vec::new(),
        }
    }

    pub fn missing() -> Self {
        Self {
            time: None,
            adjustments: Vec::new(),
        }
    }
}

impl ClockSource for MockClock {
    type Error = ();

    fn now(&mut self) -> Result<NaiveDateTime, ()> {
        self.time.ok_or(())
    }

    fn adjust(&mut self, epoch_seconds: u32) -> Result<(), ()> {
        self.adjustments.push(epoch_seconds);
        self.time = Some(datetime_from_epoch(epoch_seconds));
        Ok(())
    }
}

/// Sensors returning fixed values, with optional one-shot overrides
/// queued per quantity
pub struct MockSensors {
    pub moisture: Option<u16>,
    pub temperature: f32,
    pub humidity: f32,
    pub distance: Option<u16>,
    pub proximity: bool,
    pub moisture_queue: VecDeque<Option<u16>>,
    pub temperature_queue: VecDeque<f32>,
    pub moisture_reads: usize,
    pub distance_reads: usize,
}

impl Default for MockSensors {
    fn default() -> Self {
        Self {
            moisture: Some(500),
            temperature: 21.5,
            humidity: 40.0,
            distance: None,
            proximity: true,
            moisture_queue: VecDeque::new(),
            temperature_queue: VecDeque::new(),
            moisture_reads: 0,
            distance_reads: 0,
        }
    }
}

impl Sensors for MockSensors {
    fn read_moisture(&mut self) -> Option<u16> {
        self.moisture_reads += 1;
        self.moisture_queue.pop_front().unwrap_or(self.moisture)
    }

    fn read_temperature(&mut self) -> f32 {
        self.temperature_queue.pop_front().unwrap_or(self.temperature)
    }

    fn read_humidity(&mut self) -> f32 {
        self.humidity
    }

    fn read_distance(&mut self) -> Option<u16> {
        self.distance_reads += 1;
        self.distance
    }

    fn proximity_available(&mut self) -> bool {
        self.proximity
    }
}

#[derive(Default)]
pub struct MockRelay {
    pub writes: Vec<bool>,
}

impl MockRelay {
    pub fn energized(&self) -> Option<bool> {
        self.writes.last().copied()
    }
}

impl Actuator for MockRelay {
    type Error = ();

    fn set_relay(&mut self, energized: bool) -> Result<(), ()> {
        self.writes.push(energized);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Screen {
    Notice(String),
    Blank,
    Clock(NaiveDateTime),
    Full(ActiveView),
    Delta(FieldChanges),
    Standby(Mood),
    Backlight(u8),
}

#[derive(Default)]
pub struct MockDisplay {
    pub screens: Vec<Screen>,
}

impl MockDisplay {
    pub fn notices(&self) -> Vec<&str> {
        self.screens
            .iter()
            .filter_map(|s| match s {
                Screen::Notice(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&Screen) -> bool) -> usize {
        self.screens.iter().filter(|s| matches(s)).count()
    }
}

impl Display for MockDisplay {
    type Error = ();

    fn render_notice(&mut self, message: &str) -> Result<(), ()> {
        self.screens.push(Screen::Notice(message.to_string()));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ()> {
        self.screens.push(Screen::Blank);
        Ok(())
    }

    fn render_clock(&mut self, time: &NaiveDateTime) -> Result<(), ()> {
        self.screens.push(Screen::Clock(*time));
        Ok(())
    }

    fn render_active_full(&mut self, view: &ActiveView) -> Result<(), ()> {
        self.screens.push(Screen::Full(*view));
        Ok(())
    }

    fn render_active_delta(&mut self, changes: &FieldChanges) -> Result<(), ()> {
        self.screens.push(Screen::Delta(*changes));
        Ok(())
    }

    fn render_standby(&mut self, mood: Mood) -> Result<(), ()> {
        self.screens.push(Screen::Standby(mood));
        Ok(())
    }

    fn set_backlight(&mut self, level: u8) -> Result<(), ()> {
        self.screens.push(Screen::Backlight(level));
        Ok(())
    }
}

pub struct MockLog {
    pub available: bool,
    pub fail_appends: bool,
    pub header_checks: usize,
    pub records: Vec<LogRecord>,
}

impl Default for MockLog {
    fn default() -> Self {
        Self {
            available: true,
            fail_appends: false,
            header_checks: 0,
            records: Vec::new(),
        }
    }
}

impl DataLog for MockLog {
    type Error = ();

    fn ensure_header(&mut self) -> Result<(), ()> {
        self.header_checks += 1;
        if self.available {
            Ok(())
        } else {
            Err(())
        }
    }

    fn append_record(&mut self, record: &LogRecord) -> Result<(), ()> {
        if self.fail_appends {
            return Err(());
        }
        self.records.push(*record);
        Ok(())
    }
}

/// Datagram channel answering every request with a canned reply
pub struct MockChannel {
    pub reply: Option<Vec<u8>>,
    pub sent: Vec<(SocketAddrV4, Vec<u8>)>,
    pub timeouts: Vec<Millis>,
}

impl MockChannel {
    pub fn replying(reply: Option<Vec<u8>>) -> Self {
        Self {
            reply,
            sent: Vec::new(),
            timeouts: Vec::new(),
        }
    }
}

impl DatagramChannel for MockChannel {
    type Error = ();

    fn send(&mut self, remote: SocketAddrV4, payload: &[u8]) -> Result<(), ()> {
        self.sent.push((remote, payload.to_vec()));
        Ok(())
    }

    fn receive(&mut self, buffer: &mut [u8], timeout: Millis) -> Result<Option<usize>, ()> {
        self.timeouts.push(timeout);
        Ok(self.reply.as_ref().map(|reply| {
            let len = reply.len().min(buffer.len());
            buffer[..len].copy_from_slice(&reply[..len]);
            len
        }))
    }
}

/// Server reply carrying the given transmit seconds
pub fn ntp_reply(seconds_since_1900: u32) -> Vec<u8> {
    let mut packet = vec![0u8; 48];
    packet[0] = 0b0010_0100;
    packet[1] = 1;
    packet[40..44].copy_from_slice(&seconds_since_1900.to_be_bytes());
    packet
}

pub fn controller_with(sensors: MockSensors) -> TestController {
    controller_with_settings(Settings::default(), sensors)
}

pub fn controller_with_settings(settings: Settings, sensors: MockSensors) -> TestController {
    Controller::new(
        settings,
        MockClock::at(datetime(2024, 7, 1, 8, 0, 0)),
        sensors,
        MockRelay::default(),
        MockDisplay::default(),
        MockLog::default(),
    )
}

/// Controller that passed startup and entered the active screen at t = 0
pub fn started(sensors: MockSensors) -> TestController {
    let mut controller = controller_with(sensors);
    controller.startup().unwrap();
    controller.begin(at(0));
    controller
}

/// Ticks every `step` ms over `from..=to`
pub fn run(controller: &mut TestController, from: u64, to: u64, step: u64) {
    let mut t = from;
    while t <= to {
        controller.tick(at(t));
        t += step;
    }
}

/// Screens recorded since index `mark`
pub fn screens_since(controller: &TestController, mark: usize) -> Vec<Screen> {
    controller.display().screens[mark..].to_vec()
}
