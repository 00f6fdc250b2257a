//! Jig configuration
//!
//! The configuration is a TOML file compiled into the binary:
//!
//! ```toml
//! [firmware]
//! file = "fw.hex"
//! storage = "/media/sdcard"
//! remove_on_success = true
//! idle_delay_ms = 500
//!
//! [isp]
//! enter_attempts = 10
//! bit_delay_us = 6
//!
//! [gpio]
//! device = "/dev/gpiochip0"
//! reset = 25
//! sck = 11
//! mosi = 10
//! miso = 9
//!
//! [leds]            # optional
//! device = "/dev/gpiochip0"
//! error = 17
//! working = 27
//! ready = 22
//! ```
//!
//! Every `[isp]` key falls back to its default when omitted.

use std::path::PathBuf;
use std::time::Duration;

use avrflasher_core::config::IspTiming;
use avrflasher_core::flash::FlashOptions;
#[cfg(feature = "linux-gpio")]
use avrflasher_linux_gpio::{LedConfig, LinuxGpioIspConfig};
use serde::Deserialize;
use thiserror::Error;

/// The configuration compiled into this binary
const BAKED: &str = include_str!("../jig.toml");

/// Errors in the jig configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML text does not describe a configuration
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The firmware file name is unusable
    #[error("invalid firmware file name '{0}', expected a plain file name")]
    InvalidFileName(String),

    /// A timing value is out of range
    #[error("invalid ISP timing: {0}")]
    InvalidTiming(&'static str),
}

fn default_file() -> String {
    "fw.hex".to_string()
}

fn default_storage() -> PathBuf {
    PathBuf::from("/media/sdcard")
}

fn default_idle_delay_ms() -> u64 {
    500
}

/// Where the firmware comes from and what to do with it afterwards
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FirmwareConfig {
    /// File name inside the storage root
    #[serde(default = "default_file")]
    pub file: String,
    /// Mount point of the removable storage
    #[serde(default = "default_storage")]
    pub storage: PathBuf,
    /// Programming policy
    #[serde(flatten)]
    pub options: FlashOptions,
    /// Pause between two attempts
    #[serde(default = "default_idle_delay_ms")]
    pub idle_delay_ms: u64,
}

impl Default for FirmwareConfig {
    fn default() -> Self {
        Self {
            file: default_file(),
            storage: default_storage(),
            options: FlashOptions::default(),
            idle_delay_ms: default_idle_delay_ms(),
        }
    }
}

impl FirmwareConfig {
    /// Pause between two attempts
    pub fn idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_delay_ms)
    }
}

/// Complete jig configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JigConfig {
    /// Firmware source and policy
    #[serde(default)]
    pub firmware: FirmwareConfig,
    /// ISP timing
    #[serde(default)]
    pub isp: IspTiming,
    /// ISP lines
    #[cfg(feature = "linux-gpio")]
    pub gpio: LinuxGpioIspConfig,
    /// Status LEDs, if fitted
    #[cfg(feature = "linux-gpio")]
    #[serde(default)]
    pub leds: Option<LedConfig>,
}

impl JigConfig {
    /// Load the configuration compiled into the binary
    pub fn baked() -> Result<Self, ConfigError> {
        Self::from_toml(BAKED)
    }

    /// Parse and validate a configuration
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let file = &self.firmware.file;
        if file.is_empty() || file.contains('/') || file == "." || file == ".." {
            return Err(ConfigError::InvalidFileName(file.clone()));
        }
        if self.isp.enter_attempts == 0 {
            return Err(ConfigError::InvalidTiming("enter_attempts must be at least 1"));
        }
        if self.isp.poll_limit == 0 {
            return Err(ConfigError::InvalidTiming("poll_limit must be at least 1"));
        }
        Ok(())
    }
}
