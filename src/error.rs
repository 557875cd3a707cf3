/// Fatal hardware problems found during startup.
/// Any of these halts the control loop until the board is power-cycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartupError {
    /// The real-time clock did not answer a read.
    #[error("real-time clock not found")]
    ClockUnavailable,

    /// The proximity sensor did not answer the probe.
    #[error("proximity sensor not found")]
    ProximityUnavailable,

    /// The log storage could not be opened or its header written.
    #[error("log storage unavailable")]
    StorageUnavailable,

    /// The settings are inconsistent.
    #[error("invalid settings: {0}")]
    Config(#[from] ConfigError),
}

impl StartupError {
    /// Short text for the status display (16 characters max)
    pub fn notice(&self) -> &'static str {
        match self {
            StartupError::ClockUnavailable => "RTC not found!",
            StartupError::ProximityUnavailable => "Ranger missing!",
            StartupError::StorageUnavailable => "SD card failed!",
            StartupError::Config(_) => "Bad settings!",
        }
    }
}

/// Why a clock synchronization attempt was abandoned.
/// None of these is fatal; the clock keeps its previous value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NtpError {
    #[error("request could not be sent")]
    Send,

    #[error("receive failed")]
    Receive,

    #[error("no reply within the timeout")]
    Timeout,

    #[error("reply too short: {0} bytes")]
    Truncated(usize),

    #[error("reply has unexpected mode {0}")]
    UnexpectedMode(u8),

    #[error("server is not synchronized")]
    Unsynchronized,

    #[error("local clock access failed")]
    Clock,

    #[error("local time out of range")]
    OutOfRange,
}

/// Rejected [`Settings`](crate::config::Settings) values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[error("needs-water threshold must be below soon-water threshold")]
    ThresholdOrder,

    #[error("task intervals must be non-zero")]
    ZeroInterval,

    #[error("timeouts must be non-zero")]
    ZeroTimeout,
}
