use core::net::{Ipv4Addr, SocketAddrV4};

use crate::clock::Millis;
use crate::error::ConfigError;
use crate::irrigation::MoistureThresholds;
use crate::ntp::NTP_PORT;

/// Settings defines every tunable of the controller.
/// ntp_server: Time server queried once at startup
/// ntp_timeout: How long to wait for the single NTP reply
/// utc_offset_secs: Standard-time offset from UTC
/// dst_offset_secs: Extra offset while summer time applies
/// moisture: Irrigation classification thresholds (raw ADC units)
/// distance_threshold_mm: Largest distance that counts as someone present
/// *_interval: Scheduler task periods
/// display_timeout: Inactivity period before the display enters standby
/// backlight_*: Backlight level for each display mode
/// relay_active_low: Whether the relay board energizes on a low pin
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub ntp_server: SocketAddrV4,
    pub ntp_timeout: Millis,
    pub utc_offset_secs: i32,
    pub dst_offset_secs: u32,
    pub moisture: MoistureThresholds,
    pub distance_threshold_mm: u16,
    pub clock_interval: Millis,
    pub sample_interval: Millis,
    pub persist_interval: Millis,
    pub standby_interval: Millis,
    pub display_timeout: Millis,
    pub backlight_active: u8,
    pub backlight_standby: u8,
    pub relay_active_low: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            ntp_server: SocketAddrV4::new(Ipv4Addr::new(162, 159, 200, 1), NTP_PORT), // pool.ntp.org (Cloudflare)
            ntp_timeout: Millis::from_ticks(1000),
            utc_offset_secs: 3600, // CET
            dst_offset_secs: 3600,
            moisture: MoistureThresholds::default(),
            distance_threshold_mm: 100,
            clock_interval: Millis::from_ticks(1000),
            sample_interval: Millis::from_ticks(4000),
            persist_interval: Millis::from_ticks(4000),
            standby_interval: Millis::from_ticks(4000),
            display_timeout: Millis::from_ticks(15000),
            backlight_active: 255,
            backlight_standby: 0,
            relay_active_low: false,
        }
    }
}

impl Settings {
    /// Checks that the settings can drive the controller
    /// returns the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.moisture.needs_water >= self.moisture.soon_water {
            return Err(ConfigError::ThresholdOrder);
        }

        let intervals = [
            self.clock_interval,
            self.sample_interval,
            self.persist_interval,
            self.standby_interval,
        ];
        if intervals.iter().any(|interval| interval.ticks() == 0) {
            return Err(ConfigError::ZeroInterval);
        }

        if self.ntp_timeout.ticks() == 0 || self.display_timeout.ticks() == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(())
    }
}
