#![cfg_attr(not(test), no_std)]

//! # PlantCare-rs
//! ## A single-plant monitoring and irrigation controller in Rust
//!
//! Features:
//! - Soil moisture classification and pump relay control
//! - Temperature and humidity sampling
//! - Presence-driven display (active screen / standby mood)
//! - NTP clock synchronization with daylight-saving handling
//! - CSV data logging
//! - Cooperative multi-rate scheduler, no RTOS required

#[macro_use]
mod fmt;

pub mod clock;
pub mod config;
pub mod controller;
pub mod datalog;
pub mod display;
pub mod error;
pub mod irrigation;
pub mod net;
pub mod ntp;
pub mod presence;
pub mod scheduler;
pub mod sensors;

#[cfg(feature = "board")]
pub mod board;

pub use config::Settings;
pub use controller::Controller;
pub use error::{ConfigError, NtpError, StartupError};
