mod common;

use common::*;
use plantcare_rs::clock::Millis;
use plantcare_rs::display::{ActiveView, FieldChanges, Mood};
use plantcare_rs::irrigation::{IrrigationState, RelayLevel};
use plantcare_rs::presence::DisplayMode;
use plantcare_rs::{ConfigError, NtpError, Settings, StartupError};

fn ok_view() -> ActiveView {
    ActiveView {
        moisture: 500,
        temperature: 21.5,
        humidity: 40.0,
        irrigation: IrrigationState::Ok,
    }
}

fn is_full(screen: &Screen) -> bool {
    matches!(screen, Screen::Full(_))
}

fn is_delta(screen: &Screen) -> bool {
    matches!(screen, Screen::Delta(_))
}

fn is_clock(screen: &Screen) -> bool {
    matches!(screen, Screen::Clock(_))
}

#[test]
fn startup_shows_banner_and_checks_storage() {
    let mut controller = controller_with(MockSensors::default());
    assert_eq!(controller.startup(), Ok(()));
    assert_eq!(controller.display().notices(), vec!["PlantCare-rs"]);
    assert_eq!(controller.log().header_checks, 1);
    assert_eq!(controller.mode(), DisplayMode::Active);
}

#[test]
fn startup_fails_without_storage() {
    let mut controller = controller_with(MockSensors::default());
    controller.log_mut().available = false;
    assert_eq!(controller.startup(), Err(StartupError::StorageUnavailable));
    assert_eq!(
        controller.display().notices(),
        vec!["PlantCare-rs", "SD card failed!"]
    );
}

#[test]
fn startup_fails_without_rtc() {
    let mut controller = plantcare_rs::Controller::new(
        Settings::default(),
        MockClock::missing(),
        MockSensors::default(),
        MockRelay::default(),
        MockDisplay::default(),
        MockLog::default(),
    );
    assert_eq!(controller.startup(), Err(StartupError::ClockUnavailable));
    assert_eq!(controller.display().notices().last(), Some(&"RTC not found!"));
}

#[test]
fn startup_fails_without_ranger() {
    let sensors = MockSensors {
        proximity: false,
        ..MockSensors::default()
    };
    let mut controller = controller_with(sensors);
    assert_eq!(controller.startup(), Err(StartupError::ProximityUnavailable));
    assert_eq!(controller.display().notices().last(), Some(&"Ranger missing!"));
}

#[test]
fn startup_rejects_bad_settings_before_touching_hardware() {
    let mut settings = Settings::default();
    settings.moisture.needs_water = 400;
    let mut controller = plantcare_rs::Controller::new(
        settings,
        MockClock::at(datetime(2024, 7, 1, 8, 0, 0)),
        MockSensors::default(),
        MockRelay::default(),
        MockDisplay::default(),
        MockLog::default(),
    );
    assert_eq!(
        controller.startup(),
        Err(StartupError::Config(ConfigError::ThresholdOrder))
    );
    assert_eq!(controller.display().notices(), vec!["Bad settings!"]);
    assert_eq!(controller.log().header_checks, 0);
}

#[test]
fn nothing_runs_before_the_first_deadline() {
    let mut controller = started(MockSensors::default());
    let mark = controller.display().screens.len();

    for t in [0, 1, 500, 999] {
        controller.tick(at(t));
    }

    assert!(screens_since(&controller, mark).is_empty());
    assert!(controller.relay().writes.is_empty());
    assert!(controller.log().records.is_empty());
    assert_eq!(controller.sensors_mut().moisture_reads, 0);
    // Presence is still evaluated on every pass
    assert_eq!(controller.sensors_mut().distance_reads, 4);
}

#[test]
fn begin_clears_startup_notice_before_the_clock() {
    let mut controller = controller_with(MockSensors::default());
    controller.startup().unwrap();
    controller.notify("Clock synced");
    let mark = controller.display().screens.len();

    controller.begin(at(2000));
    run(&mut controller, 2000, 5000, 1000);

    let screens = screens_since(&controller, mark);
    let blank = screens.iter().position(|s| *s == Screen::Blank).unwrap();
    let first_clock = screens.iter().position(is_clock).unwrap();
    assert!(blank < first_clock);
    assert_eq!(screens[blank + 1], Screen::Clock(datetime(2024, 7, 1, 8, 0, 0)));
    assert!(!screens[..blank].iter().any(|s| is_clock(s) || is_delta(s)));
}

#[test]
fn first_sample_draws_full_screen_and_logs() {
    let mut controller = started(MockSensors::default());
    let mark = controller.display().screens.len();

    run(&mut controller, 0, 4000, 1000);

    let screens = screens_since(&controller, mark);
    // One per second plus the redraw after the full screen
    assert_eq!(screens.iter().filter(|s| is_clock(s)).count(), 5);
    let full = screens
        .iter()
        .position(|s| *s == Screen::Full(ok_view()))
        .unwrap();
    assert!(is_clock(&screens[full + 1]));
    assert_eq!(controller.latest(), Some(&ok_view()));

    let records = &controller.log().records;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].moisture, 500);
    assert_eq!(records[0].timestamp, datetime(2024, 7, 1, 8, 0, 0));
    assert_eq!(controller.relay().writes, vec![false]);
}

#[test]
fn nan_reading_suppresses_one_log_entry() {
    let mut sensors = MockSensors::default();
    sensors.temperature_queue.extend([21.5, f32::NAN]);
    let mut controller = started(sensors);
    let mark = controller.display().screens.len();

    run(&mut controller, 0, 12_000, 1000);

    assert_eq!(controller.log().records.len(), 2);
    let screens = screens_since(&controller, mark);
    assert_eq!(screens.iter().filter(|s| is_full(s)).count(), 1);
    assert_eq!(screens.iter().filter(|s| is_delta(s)).count(), 1);
    // Moisture and relay are unaffected by the climate failure
    assert_eq!(controller.relay().writes.len(), 3);
}

#[test]
fn failed_moisture_read_skips_the_tick_only() {
    let mut sensors = MockSensors::default();
    sensors.moisture_queue.push_back(None);
    let mut controller = started(sensors);
    let mark = controller.display().screens.len();

    run(&mut controller, 0, 8000, 1000);

    assert_eq!(controller.sensors_mut().moisture_reads, 2);
    assert_eq!(controller.relay().writes.len(), 1);
    assert_eq!(controller.log().records.len(), 1);
    // The full redraw is still owed to the first good sample
    let screens = screens_since(&controller, mark);
    assert_eq!(screens.iter().filter(|s| is_full(s)).count(), 1);
    assert_eq!(screens.iter().filter(|s| is_delta(s)).count(), 0);
}

#[test]
fn failed_read_drops_the_buffered_row() {
    let mut settings = Settings::default();
    settings.persist_interval = Millis::from_ticks(8000);
    let mut sensors = MockSensors::default();
    sensors.moisture_queue.extend([Some(500), None]);
    let mut controller = controller_with_settings(settings, sensors);
    controller.startup().unwrap();
    controller.begin(at(0));
    assert_eq!(controller.settings().persist_interval, Millis::from_ticks(8000));

    run(&mut controller, 0, 4000, 1000);
    assert_eq!(controller.pending().map(|r| r.moisture), Some(500));

    run(&mut controller, 5000, 8000, 1000);
    assert_eq!(controller.pending(), None);
    assert!(controller.log().records.is_empty());

    // The climate path behaves the same way
    controller.sensors_mut().temperature_queue.extend([21.5, f32::NAN]);
    run(&mut controller, 9000, 12_000, 1000);
    assert!(controller.pending().is_some());
    run(&mut controller, 13_000, 16_000, 1000);
    assert_eq!(controller.pending(), None);
    assert!(controller.log().records.is_empty());
}

#[test]
fn failed_append_is_not_fatal() {
    let mut controller = started(MockSensors::default());
    controller.log_mut().fail_appends = true;

    run(&mut controller, 0, 8000, 1000);

    assert!(controller.log().records.is_empty());
    assert!(controller
        .display()
        .screens
        .iter()
        .any(|s| is_delta(s)));
}

#[test]
fn relay_follows_moisture_in_standby() {
    let sensors = MockSensors {
        moisture: Some(5),
        ..MockSensors::default()
    };
    let mut controller = started(sensors);

    run(&mut controller, 0, 24_000, 1000);
    assert_eq!(controller.mode(), DisplayMode::Standby);
    assert_eq!(controller.relay().writes, vec![true; 6]);
    assert_eq!(controller.relay_level(), Some(RelayLevel::Energized));
    assert_eq!(controller.irrigation(), Some(IrrigationState::NeedsWater));

    controller.sensors_mut().moisture = Some(500);
    run(&mut controller, 25_000, 28_000, 1000);
    assert_eq!(controller.mode(), DisplayMode::Standby);
    assert_eq!(controller.relay().energized(), Some(false));
    assert_eq!(controller.relay_level(), Some(RelayLevel::DeEnergized));
}

#[test]
fn soon_water_keeps_relay_off() {
    let sensors = MockSensors {
        moisture: Some(300),
        ..MockSensors::default()
    };
    let mut controller = started(sensors);
    run(&mut controller, 0, 4000, 1000);
    assert_eq!(controller.irrigation(), Some(IrrigationState::SoonWater));
    assert_eq!(controller.relay().writes, vec![false]);
}

#[test]
fn presence_drives_standby_and_wake_up() {
    let mut controller = started(MockSensors::default());
    run(&mut controller, 0, 14_000, 1000);
    assert_eq!(controller.mode(), DisplayMode::Active);

    let mark = controller.display().screens.len();
    controller.tick(at(15_000));
    assert_eq!(controller.mode(), DisplayMode::Standby);
    assert_eq!(
        screens_since(&controller, mark),
        vec![Screen::Backlight(0), Screen::Standby(Mood::Happy)]
    );

    // Standby animation keeps running, the clock does not
    let mark = controller.display().screens.len();
    controller.tick(at(16_000));
    assert_eq!(
        screens_since(&controller, mark),
        vec![Screen::Standby(Mood::Happy)]
    );

    let mark = controller.display().screens.len();
    controller.sensors_mut().distance = Some(50);
    controller.tick(at(17_000));
    assert_eq!(controller.mode(), DisplayMode::Active);
    let screens = screens_since(&controller, mark);
    assert_eq!(screens[0], Screen::Backlight(255));
    assert_eq!(screens[1], Screen::Full(ok_view()));
}

#[test]
fn standby_mood_reflects_irrigation_state() {
    let sensors = MockSensors {
        moisture: Some(100),
        ..MockSensors::default()
    };
    let mut controller = started(sensors);
    run(&mut controller, 0, 15_000, 1000);
    assert_eq!(
        controller.display().screens.last(),
        Some(&Screen::Standby(Mood::Neutral))
    );
}

#[test]
fn standby_before_any_sample_is_neutral() {
    let mut settings = Settings::default();
    settings.display_timeout = Millis::from_ticks(2000);
    let mut controller = plantcare_rs::Controller::new(
        settings,
        MockClock::at(datetime(2024, 7, 1, 8, 0, 0)),
        MockSensors::default(),
        MockRelay::default(),
        MockDisplay::default(),
        MockLog::default(),
    );
    controller.startup().unwrap();
    controller.begin(at(0));
    run(&mut controller, 0, 2000, 1000);
    assert_eq!(controller.mode(), DisplayMode::Standby);
    assert_eq!(
        controller.display().screens.last(),
        Some(&Screen::Standby(Mood::Neutral))
    );
}

#[test]
fn wake_up_redraws_fully_twice_then_deltas() {
    let mut controller = started(MockSensors::default());
    run(&mut controller, 0, 16_000, 1000);
    assert_eq!(controller.mode(), DisplayMode::Standby);

    let mark = controller.display().screens.len();
    controller.sensors_mut().distance = Some(50);
    run(&mut controller, 17_000, 24_000, 1000);

    let screens = screens_since(&controller, mark);
    let renders: Vec<&Screen> = screens
        .iter()
        .filter(|s| is_full(s) || is_delta(s))
        .collect();
    assert_eq!(
        renders,
        vec![
            &Screen::Full(ok_view()),
            &Screen::Full(ok_view()),
            &Screen::Delta(FieldChanges {
                moisture: None,
                temperature: None,
                humidity: None,
                irrigation: IrrigationState::Ok,
            }),
        ]
    );
}

#[test]
fn delta_lists_only_changed_fields() {
    let mut controller = started(MockSensors::default());
    run(&mut controller, 0, 4000, 1000);

    controller.sensors_mut().temperature = 22.0;
    let mark = controller.display().screens.len();
    run(&mut controller, 5000, 8000, 1000);

    let screens = screens_since(&controller, mark);
    assert!(screens.contains(&Screen::Delta(FieldChanges {
        moisture: None,
        temperature: Some(22.0),
        humidity: None,
        irrigation: IrrigationState::Ok,
    })));
}

#[test]
fn reset_render_cache_redraws_every_field() {
    let mut controller = started(MockSensors::default());
    run(&mut controller, 0, 4000, 1000);

    controller.reset_render_cache();
    let mark = controller.display().screens.len();
    run(&mut controller, 5000, 8000, 1000);

    let screens = screens_since(&controller, mark);
    assert!(screens.contains(&Screen::Delta(FieldChanges {
        moisture: Some(500),
        temperature: Some(21.5),
        humidity: Some(40.0),
        irrigation: IrrigationState::Ok,
    })));
}

#[test]
fn clock_renders_only_while_active() {
    let mut controller = started(MockSensors::default());
    run(&mut controller, 0, 14_000, 1000);
    // begin, 14 ticks and the full redraw of the first sample
    assert_eq!(controller.display().count(is_clock), 16);

    run(&mut controller, 15_000, 30_000, 1000);
    assert_eq!(controller.mode(), DisplayMode::Standby);
    assert_eq!(controller.display().count(is_clock), 16);
}

const JULY_FIRST_NOON_UTC: u32 = 1_719_835_200;
const SECONDS_1900_TO_1970: u32 = 2_208_988_800;

#[test]
fn ntp_sync_commits_local_summer_time() {
    let mut controller = controller_with(MockSensors::default());
    controller.startup().unwrap();

    let mut channel = MockChannel::replying(Some(ntp_reply(
        JULY_FIRST_NOON_UTC + SECONDS_1900_TO_1970,
    )));
    let exchange = controller.synchronize_clock(&mut channel).unwrap();

    assert_eq!(exchange.epoch_utc, JULY_FIRST_NOON_UTC);
    assert_eq!(exchange.epoch_local, JULY_FIRST_NOON_UTC + 7200);
    assert_eq!(controller.clock().adjustments, vec![JULY_FIRST_NOON_UTC + 7200]);
    assert_eq!(controller.wall_time(), Some(datetime(2024, 7, 1, 14, 0, 0)));
    assert_eq!(controller.display().notices().last(), Some(&"Clock synced"));

    assert_eq!(channel.sent.len(), 1);
    assert_eq!(channel.sent[0].0, Settings::default().ntp_server);
    assert_eq!(channel.sent[0].1[0], 0xE3);
    assert_eq!(channel.timeouts, vec![Millis::from_ticks(1000)]);
}

#[test]
fn ntp_sync_in_winter_adds_only_zone_offset() {
    let mut controller = plantcare_rs::Controller::new(
        Settings::default(),
        MockClock::at(datetime(2024, 1, 15, 9, 0, 0)),
        MockSensors::default(),
        MockRelay::default(),
        MockDisplay::default(),
        MockLog::default(),
    );
    let mut channel = MockChannel::replying(Some(ntp_reply(
        JULY_FIRST_NOON_UTC + SECONDS_1900_TO_1970,
    )));
    let exchange = controller.synchronize_clock(&mut channel).unwrap();
    assert_eq!(exchange.epoch_local, JULY_FIRST_NOON_UTC + 3600);
}

#[test]
fn ntp_failure_leaves_clock_unchanged() {
    let mut controller = controller_with(MockSensors::default());
    controller.startup().unwrap();
    let before = controller.wall_time();

    let mut silent = MockChannel::replying(None);
    assert_eq!(
        controller.synchronize_clock(&mut silent),
        Err(NtpError::Timeout)
    );

    let mut client_echo = MockChannel::replying(Some(vec![0xE3; 48]));
    assert_eq!(
        controller.synchronize_clock(&mut client_echo),
        Err(NtpError::UnexpectedMode(3))
    );

    assert!(controller.clock().adjustments.is_empty());
    assert_eq!(controller.wall_time(), before);
    assert_eq!(controller.display().notices().last(), Some(&"Sync failed"));
}
