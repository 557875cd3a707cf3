use chrono::NaiveDateTime;

/// One sampling tick's worth of sensor data.
/// temperature/humidity are NaN when the sensor read failed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleReading {
    pub moisture: u16,
    pub temperature: f32,
    pub humidity: f32,
    pub timestamp: NaiveDateTime,
}

impl SampleReading {
    /// Whether the climate values can be shown and logged
    pub fn is_valid(&self) -> bool {
        !self.temperature.is_nan() && !self.humidity.is_nan()
    }
}

/// Synchronous sensor reads; each may fail and is simply retried next tick.
pub trait Sensors {
    /// Soil moisture in raw ADC units, None if the conversion failed
    fn read_moisture(&mut self) -> Option<u16>;

    /// Air temperature in Celsius, NaN on failure
    fn read_temperature(&mut self) -> f32;

    /// Relative humidity in percent, NaN on failure
    fn read_humidity(&mut self) -> f32;

    /// Distance to the nearest object in millimetres, None if nothing answered
    fn read_distance(&mut self) -> Option<u16>;

    /// Whether the proximity sensor is connected at all
    fn proximity_available(&mut self) -> bool {
        true
    }
}
