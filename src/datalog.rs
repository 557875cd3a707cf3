use core::fmt::Write;

use chrono::NaiveDateTime;
use heapless::String;

use crate::sensors::SampleReading;

/// Name of the log file on the card (8.3)
pub const LOG_FILE: &str = "SENSORS.CSV";
/// First line of a fresh log file
pub const LOG_HEADER: &str = "time,moisture,temperature,humidity\r\n";

/// One row of the data log
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogRecord {
    pub timestamp: NaiveDateTime,
    pub moisture: u16,
    pub temperature: f32,
    pub humidity: f32,
}

impl From<&SampleReading> for LogRecord {
    fn from(reading: &SampleReading) -> Self {
        LogRecord {
            timestamp: reading.timestamp,
            moisture: reading.moisture,
            temperature: reading.temperature,
            humidity: reading.humidity,
        }
    }
}

impl LogRecord {
    /// Formats the record as `YYYY-MM-DD HH:MM:SS,moisture,temperature,humidity`
    pub fn to_csv_line(&self) -> String<64> {
        let mut line = String::new();
        // Overlong rows are cut off
        let _ = write!(
            line,
            "{},{},{:.2},{:.2}\r\n",
            self.timestamp, self.moisture, self.temperature, self.humidity
        );
        line
    }
}

/// Append-only persistent log
pub trait DataLog {
    type Error: core::fmt::Debug;

    /// Creates the log with its header row if it does not exist yet
    fn ensure_header(&mut self) -> Result<(), Self::Error>;

    fn append_record(&mut self, record: &LogRecord) -> Result<(), Self::Error>;
}
