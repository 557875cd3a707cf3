//! Minimal one-shot SNTP client.
//!
//! Packet layout (RFC 5905, all fields big-endian):
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0      | 1    | LI (2 bits), VN (3 bits), Mode (3 bits) |
//! | 1      | 1    | Stratum |
//! | 2      | 1    | Poll interval (log2 s) |
//! | 3      | 1    | Precision (log2 s) |
//! | 4      | 4    | Root delay |
//! | 8      | 4    | Root dispersion |
//! | 12     | 4    | Reference ID |
//! | 16     | 8    | Reference timestamp |
//! | 24     | 8    | Origin timestamp |
//! | 32     | 8    | Receive timestamp |
//! | 40     | 8    | Transmit timestamp (seconds at 40..44) |

use core::net::SocketAddrV4;

use chrono::NaiveDate;

use crate::clock::{in_dst_window, ClockSource, Millis};
use crate::config::Settings;
use crate::error::NtpError;
use crate::net::DatagramChannel;

pub const NTP_PACKET_SIZE: usize = 48;
pub const NTP_PORT: u16 = 123;
/// Seconds from 1900-01-01 (NTP era 0) to 1970-01-01
pub const SECONDS_1900_TO_1970: u32 = 2_208_988_800;

const LI_VN_MODE: usize = 0;
const STRATUM: usize = 1;
const POLL: usize = 2;
const PRECISION: usize = 3;
const REFERENCE_ID: usize = 12;
const TRANSMIT_SECONDS: usize = 40;

/// LI = 3 (unsynchronized), VN = 4, Mode = 3 (client)
const CLIENT_LI_VN_MODE: u8 = 0b1110_0011;
const CLIENT_POLL: u8 = 6;
const CLIENT_PRECISION: u8 = 0xEC;
const CLIENT_REFERENCE_ID: [u8; 4] = *b"1N14";

const MODE_SERVER: u8 = 4;
const MODE_BROADCAST: u8 = 5;

/// Builds the 48-byte client request
pub fn encode_request() -> [u8; NTP_PACKET_SIZE] {
    let mut packet = [0u8; NTP_PACKET_SIZE];
    packet[LI_VN_MODE] = CLIENT_LI_VN_MODE;
    packet[STRATUM] = 0;
    packet[POLL] = CLIENT_POLL;
    packet[PRECISION] = CLIENT_PRECISION;
    packet[REFERENCE_ID..REFERENCE_ID + 4].copy_from_slice(&CLIENT_REFERENCE_ID);
    packet
}

/// Fields of a server reply that the client cares about
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NtpResponse {
    pub leap: u8,
    pub version: u8,
    pub mode: u8,
    pub stratum: u8,
    pub transmit_seconds: u32,
}

impl NtpResponse {
    /// Parses a reply
    /// param bytes: datagram payload as received
    pub fn decode(bytes: &[u8]) -> Result<NtpResponse, NtpError> {
        if bytes.len() < NTP_PACKET_SIZE {
            return Err(NtpError::Truncated(bytes.len()));
        }

        let header = bytes[LI_VN_MODE];
        let mode = header & 0b111;
        if mode != MODE_SERVER && mode != MODE_BROADCAST {
            return Err(NtpError::UnexpectedMode(mode));
        }

        let high = u16::from_be_bytes([bytes[TRANSMIT_SECONDS], bytes[TRANSMIT_SECONDS + 1]]);
        let low = u16::from_be_bytes([bytes[TRANSMIT_SECONDS + 2], bytes[TRANSMIT_SECONDS + 3]]);

        Ok(NtpResponse {
            leap: header >> 6,
            version: (header >> 3) & 0b111,
            mode,
            stratum: bytes[STRATUM],
            transmit_seconds: (u32::from(high) << 16) | u32::from(low),
        })
    }

    /// Transmit time as seconds since 1970
    pub fn unix_seconds(&self) -> Result<u32, NtpError> {
        unix_from_ntp(self.transmit_seconds)
    }
}

/// Converts NTP seconds to Unix seconds.
/// Values below the 1970 offset belong to era 1 (from 2036-02-07) and wrap
/// into the upper half of `u32`, which holds until 2106.
/// Zero means the server has no time to give.
pub fn unix_from_ntp(seconds_since_1900: u32) -> Result<u32, NtpError> {
    if seconds_since_1900 == 0 {
        return Err(NtpError::Unsynchronized);
    }
    Ok(seconds_since_1900.wrapping_sub(SECONDS_1900_TO_1970))
}

/// Summer-time offset for the given local date
/// param today: date used for the decision
/// param dst_offset_secs: offset applied inside the window
pub fn dst_offset(today: NaiveDate, dst_offset_secs: u32) -> u32 {
    if in_dst_window(today) {
        dst_offset_secs
    } else {
        0
    }
}

/// Applies the zone and summer-time offsets to a UTC epoch
pub fn local_epoch(epoch_utc: u32, utc_offset_secs: i32, dst_offset_secs: u32) -> Result<u32, NtpError> {
    epoch_utc
        .checked_add_signed(utc_offset_secs)
        .and_then(|standard| standard.checked_add(dst_offset_secs))
        .ok_or(NtpError::OutOfRange)
}

/// Record of one synchronization attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NtpExchange {
    pub request: [u8; NTP_PACKET_SIZE],
    pub response: Option<[u8; NTP_PACKET_SIZE]>,
    pub seconds_since_1900: u32,
    pub epoch_utc: u32,
    pub epoch_local: u32,
}

/// Queries one time server once and sets the clock from the reply.
///
/// The summer-time decision is taken from the clock's date *before* it is
/// adjusted. A clock that has drifted into the wrong season therefore gets
/// the wrong offset; this is a known limitation.
pub struct NtpClient {
    server: SocketAddrV4,
    timeout: Millis,
    utc_offset_secs: i32,
    dst_offset_secs: u32,
}

impl NtpClient {
    pub fn new(server: SocketAddrV4, timeout: Millis, utc_offset_secs: i32, dst_offset_secs: u32) -> NtpClient {
        Self {
            server,
            timeout,
            utc_offset_secs,
            dst_offset_secs,
        }
    }

    pub fn from_settings(settings: &Settings) -> NtpClient {
        Self::new(
            settings.ntp_server,
            settings.ntp_timeout,
            settings.utc_offset_secs,
            settings.dst_offset_secs,
        )
    }

    /// Runs one request/reply exchange and commits the local time.
    /// The clock is left untouched on every error path.
    /// param channel: datagram link to the server
    /// param clock: clock to read the current date from and adjust
    pub fn synchronize<N, C>(&self, channel: &mut N, clock: &mut C) -> Result<NtpExchange, NtpError>
    where
        N: DatagramChannel,
        C: ClockSource,
    {
        let request = encode_request();
        channel
            .send(self.server, &request)
            .map_err(|_| NtpError::Send)?;

        let mut response = [0u8; NTP_PACKET_SIZE];
        let len = channel
            .receive(&mut response, self.timeout)
            .map_err(|_| NtpError::Receive)?
            .ok_or(NtpError::Timeout)?;

        let reply = NtpResponse::decode(&response[..len])?;
        let epoch_utc = reply.unix_seconds()?;

        let today = clock.now().map_err(|_| NtpError::Clock)?.date();
        let dst = dst_offset(today, self.dst_offset_secs);
        let epoch_local = local_epoch(epoch_utc, self.utc_offset_secs, dst)?;

        clock.adjust(epoch_local).map_err(|_| NtpError::Clock)?;
        debug!("ntp: stratum {}, dst offset {}", reply.stratum, dst);

        Ok(NtpExchange {
            request,
            response: Some(response),
            seconds_since_1900: reply.transmit_seconds,
            epoch_utc,
            epoch_local,
        })
    }
}
