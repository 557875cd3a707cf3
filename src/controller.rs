use chrono::NaiveDateTime;

use crate::clock::{ClockSource, Instant};
use crate::config::Settings;
use crate::datalog::{DataLog, LogRecord};
use crate::display::{ActiveView, Display, FieldChanges, Mood};
use crate::error::{NtpError, StartupError};
use crate::irrigation::{classify, drive, Actuator, IrrigationState, RelayLevel};
use crate::net::DatagramChannel;
use crate::ntp::{NtpClient, NtpExchange};
use crate::presence::{DisplayMode, PresenceMonitor, Transition};
use crate::scheduler::{Schedule, Task};
use crate::sensors::{SampleReading, Sensors};

/// Shown while the hardware is being checked
pub const BANNER: &str = "PlantCare-rs";

/// Owns every collaborator and all state of the control loop.
///
/// The firmware calls [`Controller::startup`] once, optionally
/// [`Controller::synchronize_clock`], then [`Controller::begin`], and
/// afterwards [`Controller::tick`] on every pass of its main loop.
pub struct Controller<C, S, A, D, L> {
    settings: Settings,
    clock: C,
    sensors: S,
    relay: A,
    display: D,
    log: L,
    schedule: Schedule,
    presence: PresenceMonitor,
    /// What the active screen currently shows
    rendered: Option<ActiveView>,
    /// Last valid sample, shown again when the display wakes up
    latest: Option<ActiveView>,
    /// Waiting for the next persist task
    pending: Option<LogRecord>,
    irrigation: Option<IrrigationState>,
    relay_level: Option<RelayLevel>,
}

impl<C, S, A, D, L> Controller<C, S, A, D, L>
where
    C: ClockSource,
    S: Sensors,
    A: Actuator,
    D: Display,
    L: DataLog,
{
    pub fn new(settings: Settings, clock: C, sensors: S, relay: A, display: D, log: L) -> Self {
        let schedule = Schedule::new(&settings);
        let presence = PresenceMonitor::new(
            settings.distance_threshold_mm,
            settings.display_timeout,
            Instant::from_ticks(0),
        );

        Self {
            settings,
            clock,
            sensors,
            relay,
            display,
            log,
            schedule,
            presence,
            rendered: None,
            latest: None,
            pending: None,
            irrigation: None,
            relay_level: None,
        }
    }

    /// Checks settings and hardware.
    /// On failure the reason is shown on the display and the caller is
    /// expected to stop.
    pub fn startup(&mut self) -> Result<(), StartupError> {
        let checked = self.check_hardware();
        if let Err(e) = checked {
            error!("startup failed: {}", e);
            self.notify(e.notice());
        }
        checked
    }

    fn check_hardware(&mut self) -> Result<(), StartupError> {
        self.settings.validate()?;
        self.notify(BANNER);

        self.log
            .ensure_header()
            .map_err(|_| StartupError::StorageUnavailable)?;
        debug!("startup: log ready");

        self.clock
            .now()
            .map_err(|_| StartupError::ClockUnavailable)?;
        debug!("startup: rtc ready");

        if !self.sensors.proximity_available() {
            return Err(StartupError::ProximityUnavailable);
        }
        debug!("startup: ranger ready");

        Ok(())
    }

    /// Sets the wall clock from the configured time server, once.
    /// A failure is reported and leaves the clock as it was.
    pub fn synchronize_clock<N: DatagramChannel>(&mut self, channel: &mut N) -> Result<NtpExchange, NtpError> {
        let client = NtpClient::from_settings(&self.settings);
        match client.synchronize(channel, &mut self.clock) {
            Ok(exchange) => {
                info!("ntp: clock set to epoch {}", exchange.epoch_local);
                self.notify("Clock synced");
                Ok(exchange)
            }
            Err(e) => {
                warn!("ntp: sync failed: {}", e);
                self.notify("Sync failed");
                Err(e)
            }
        }
    }

    /// Shows a one-line message
    pub fn notify(&mut self, message: &str) {
        let shown = self.display.render_notice(message);
        report("notice", shown);
    }

    /// Enters the active screen as if someone was just seen
    /// param now: current monotonic time
    pub fn begin(&mut self, now: Instant) {
        self.presence = PresenceMonitor::new(
            self.settings.distance_threshold_mm,
            self.settings.display_timeout,
            now,
        );
        let lit = self.display.set_backlight(self.settings.backlight_active);
        report("backlight", lit);
        info!("display: active");

        match self.latest {
            Some(view) => self.render_full(view),
            None => {
                let cleared = self.display.clear();
                report("clear", cleared);
                self.rendered = None;
                self.refresh_clock();
            }
        }
    }

    /// One pass of the control loop: evaluates presence, then runs every
    /// due task in registration order
    /// param now: current monotonic time
    pub fn tick(&mut self, now: Instant) {
        self.evaluate_presence(now);

        for task in self.schedule.poll(now) {
            trace!("task {} due", task);
            match task {
                Task::ClockRefresh => self.refresh_clock(),
                Task::Sample => self.sample(),
                Task::Persist => self.persist(),
                Task::StandbyRender => self.render_standby_frame(),
            }
        }
    }

    fn evaluate_presence(&mut self, now: Instant) {
        let distance = self.sensors.read_distance();
        match self.presence.observe(distance, now) {
            Some(Transition::EnteredActive) => {
                info!("display: active");
                let lit = self.display.set_backlight(self.settings.backlight_active);
                report("backlight", lit);
                if let Some(view) = self.latest {
                    self.render_full(view);
                } else {
                    self.rendered = None;
                }
            }
            Some(Transition::EnteredStandby) => {
                info!("display: standby");
                let dimmed = self.display.set_backlight(self.settings.backlight_standby);
                report("backlight", dimmed);
                self.render_standby_frame();
            }
            None => {}
        }
    }

    fn refresh_clock(&mut self) {
        if self.presence.mode() != DisplayMode::Active {
            return;
        }
        match self.clock.now() {
            Ok(time) => {
                let drawn = self.display.render_clock(&time);
                report("clock", drawn);
            }
            Err(_) => warn!("rtc: read failed"),
        }
    }

    /// Any failed read drops the row still waiting for the persist task
    fn sample(&mut self) {
        let Some(moisture) = self.sensors.read_moisture() else {
            warn!("moisture: read failed");
            self.pending = None;
            return;
        };

        let state = classify(moisture, &self.settings.moisture);
        self.irrigation = Some(state);
        self.actuate(state);

        let temperature = self.sensors.read_temperature();
        let humidity = self.sensors.read_humidity();
        let timestamp = match self.clock.now() {
            Ok(time) => time,
            Err(_) => {
                warn!("rtc: read failed");
                self.pending = None;
                return;
            }
        };

        let reading = SampleReading {
            moisture,
            temperature,
            humidity,
            timestamp,
        };
        if !reading.is_valid() {
            warn!("climate: read failed");
            self.pending = None;
            return;
        }
        debug!(
            "sample: moisture {} temperature {} humidity {}",
            moisture, temperature, humidity
        );

        let view = ActiveView::new(&reading, state);
        self.latest = Some(view);
        if self.presence.mode() == DisplayMode::Active {
            self.render_active(view);
        }
        self.pending = Some(LogRecord::from(&reading));
    }

    fn actuate(&mut self, state: IrrigationState) {
        let level = drive(state);
        match self.relay.set_relay(level.is_energized()) {
            Ok(()) => {
                if self.relay_level != Some(level) {
                    info!("relay: {} ({})", level, state);
                }
                self.relay_level = Some(level);
            }
            Err(_) => warn!("relay: switching failed"),
        }
    }

    fn render_active(&mut self, view: ActiveView) {
        if self.presence.take_first_entry() {
            self.render_full(view);
            return;
        }
        let changes = FieldChanges::between(self.rendered.as_ref(), &view);
        let drawn = self.display.render_active_delta(&changes);
        report("active screen", drawn);
        self.rendered = Some(view);
    }

    /// Clears and redraws every field, the clock included
    fn render_full(&mut self, view: ActiveView) {
        let drawn = self.display.render_active_full(&view);
        report("active screen", drawn);
        self.rendered = Some(view);
        self.refresh_clock();
    }

    fn persist(&mut self) {
        let Some(record) = self.pending.take() else {
            return;
        };
        if self.log.append_record(&record).is_err() {
            warn!("log: append failed");
        }
    }

    fn render_standby_frame(&mut self) {
        if self.presence.mode() != DisplayMode::Standby {
            return;
        }
        let mood = self.irrigation.map_or(Mood::Neutral, Mood::from);
        let drawn = self.display.render_standby(mood);
        report("standby screen", drawn);
    }

    /// Forgets what is on screen; the next sample redraws every field
    pub fn reset_render_cache(&mut self) {
        self.rendered = None;
    }

    pub fn mode(&self) -> DisplayMode {
        self.presence.mode()
    }

    pub fn irrigation(&self) -> Option<IrrigationState> {
        self.irrigation
    }

    pub fn relay_level(&self) -> Option<RelayLevel> {
        self.relay_level
    }

    pub fn latest(&self) -> Option<&ActiveView> {
        self.latest.as_ref()
    }

    pub fn pending(&self) -> Option<&LogRecord> {
        self.pending.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Reads the wall clock, for callers outside the loop
    pub fn wall_time(&mut self) -> Option<NaiveDateTime> {
        self.clock.now().ok()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    pub fn relay(&self) -> &A {
        &self.relay
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut L {
        &mut self.log
    }
}

fn report<E: core::fmt::Debug>(what: &str, result: Result<(), E>) {
    if result.is_err() {
        warn!("display: {} failed", what);
    }
}
