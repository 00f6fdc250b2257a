//! Linux GPIO bitbang ISP implementation
//!
//! This module provides the `LinuxGpioIsp` struct that implements the
//! `IspPins` trait using Linux's GPIO character device interface (gpiocdev).
//!
//! All four lines are requested once at open time and then switched between
//! output and input by reconfiguring the request, so the target is never
//! driven while the bus is released.

use std::time::Duration;

use crate::error::{check_distinct, LinuxGpioError, Result};

use gpiocdev::line::{Offset, Value};
use gpiocdev::request::{Config, Request};
use serde::Deserialize;

use avrflasher_core::programmer::IspPins;

/// GPIO line indices
#[derive(Debug, Clone, Copy)]
enum Line {
    Reset = 0,
    Sck = 1,
    Mosi = 2,
    Miso = 3,
}

impl Line {
    const fn name(self) -> &'static str {
        match self {
            Line::Reset => "RESET",
            Line::Sck => "SCK",
            Line::Mosi => "MOSI",
            Line::Miso => "MISO",
        }
    }
}

const NUM_LINES: usize = 4;

/// Configuration for opening the ISP lines
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinuxGpioIspConfig {
    /// Device path (e.g., "/dev/gpiochip0")
    pub device: String,
    /// Target RESET line offset
    pub reset: Offset,
    /// SCK (clock) line offset
    pub sck: Offset,
    /// MOSI (data to the target) line offset
    pub mosi: Offset,
    /// MISO (data from the target) line offset
    pub miso: Offset,
}

impl LinuxGpioIspConfig {
    /// Create a new configuration with the given device path and pins
    pub fn new(
        device: impl Into<String>,
        reset: Offset,
        sck: Offset,
        mosi: Offset,
        miso: Offset,
    ) -> Self {
        Self {
            device: device.into(),
            reset,
            sck,
            mosi,
            miso,
        }
    }

    fn offsets(&self) -> [Offset; NUM_LINES] {
        let mut offsets = [0; NUM_LINES];
        offsets[Line::Reset as usize] = self.reset;
        offsets[Line::Sck as usize] = self.sck;
        offsets[Line::Mosi as usize] = self.mosi;
        offsets[Line::Miso as usize] = self.miso;
        offsets
    }

    /// Check the configuration without touching hardware
    pub fn validate(&self) -> Result<()> {
        if self.device.is_empty() {
            return Err(LinuxGpioError::NoDevice);
        }
        check_distinct(&[
            (Line::Reset.name(), self.reset),
            (Line::Sck.name(), self.sck),
            (Line::Mosi.name(), self.mosi),
            (Line::Miso.name(), self.miso),
        ])
    }
}

/// ISP lines on a Linux GPIO chip
pub struct LinuxGpioIsp {
    /// GPIO line request handle
    request: Request,
    /// GPIO line offsets indexed by Line enum
    offsets: [Offset; NUM_LINES],
    /// RESET, SCK and MOSI are currently outputs
    bus_owned: bool,
}

impl LinuxGpioIsp {
    /// Open the ISP lines, initially released (all inputs)
    pub fn open(config: &LinuxGpioIspConfig) -> Result<Self> {
        config.validate()?;

        log::debug!("linux_gpio_isp: Opening device {}", config.device);

        let offsets = config.offsets();
        let request = Request::from_config(Self::released_config(&offsets))
            .on_chip(&config.device)
            .with_consumer("avrflasher")
            .request()
            .map_err(|source| LinuxGpioError::LineRequestFailed {
                path: config.device.clone(),
                source,
            })?;

        log::info!(
            "linux_gpio_isp: Opened {} (reset={}, sck={}, mosi={}, miso={})",
            config.device,
            config.reset,
            config.sck,
            config.mosi,
            config.miso
        );

        Ok(Self {
            request,
            offsets,
            bus_owned: false,
        })
    }

    fn released_config(offsets: &[Offset; NUM_LINES]) -> Config {
        let mut cfg = Config::default();
        cfg.with_lines(offsets).as_input();
        cfg
    }

    fn owned_config(offsets: &[Offset; NUM_LINES]) -> Config {
        let mut cfg = Config::default();
        cfg.with_line(offsets[Line::Reset as usize])
            .as_output(Value::Inactive);
        cfg.with_line(offsets[Line::Sck as usize])
            .as_output(Value::Inactive);
        cfg.with_line(offsets[Line::Mosi as usize])
            .as_output(Value::Inactive);
        cfg.with_line(offsets[Line::Miso as usize]).as_input();
        cfg
    }

    fn set_line(&mut self, line: Line, high: bool) {
        if !self.bus_owned {
            log::trace!("linux_gpio_isp: {} not driven, bus released", line.name());
            return;
        }
        let value = if high { Value::Active } else { Value::Inactive };
        if let Err(e) = self.request.set_value(self.offsets[line as usize], value) {
            log::error!("Failed to set {}: {}", line.name(), e);
        }
    }
}

impl IspPins for LinuxGpioIsp {
    fn set_reset(&mut self, high: bool) {
        self.set_line(Line::Reset, high);
    }

    fn set_sck(&mut self, high: bool) {
        self.set_line(Line::Sck, high);
    }

    fn set_mosi(&mut self, high: bool) {
        self.set_line(Line::Mosi, high);
    }

    fn get_miso(&mut self) -> bool {
        match self.request.value(self.offsets[Line::Miso as usize]) {
            Ok(Value::Active) => true,
            Ok(Value::Inactive) => false,
            Err(e) => {
                log::error!("Failed to get MISO: {}", e);
                false
            }
        }
    }

    fn delay_us(&mut self, us: u32) {
        if us > 0 {
            std::thread::sleep(Duration::from_micros(u64::from(us)));
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        if ms > 0 {
            std::thread::sleep(Duration::from_millis(u64::from(ms)));
        }
    }

    fn request_bus(&mut self) {
        if self.bus_owned {
            return;
        }
        match self.request.reconfigure(&Self::owned_config(&self.offsets)) {
            Ok(()) => self.bus_owned = true,
            Err(e) => log::error!("{}", LinuxGpioError::ReconfigureFailed(e)),
        }
    }

    fn release_bus(&mut self) {
        if let Err(e) = self
            .request
            .reconfigure(&Self::released_config(&self.offsets))
        {
            log::error!("{}", LinuxGpioError::ReconfigureFailed(e));
        }
        self.bus_owned = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let config = LinuxGpioIspConfig::new("/dev/gpiochip0", 25, 11, 10, 9);
        assert!(config.validate().is_ok());

        let config = LinuxGpioIspConfig::new("", 25, 11, 10, 9);
        assert!(matches!(config.validate(), Err(LinuxGpioError::NoDevice)));

        let config = LinuxGpioIspConfig::new("/dev/gpiochip0", 25, 11, 10, 11);
        assert!(matches!(
            config.validate(),
            Err(LinuxGpioError::DuplicateLine {
                offset: 11,
                first: "SCK",
                second: "MISO"
            })
        ));
    }

    #[test]
    fn test_deserialize() {
        let config: LinuxGpioIspConfig = toml::from_str(
            r#"
            device = "/dev/gpiochip0"
            reset = 25
            sck = 11
            mosi = 10
            miso = 9
            "#,
        )
        .unwrap();
        assert_eq!(config, LinuxGpioIspConfig::new("/dev/gpiochip0", 25, 11, 10, 9));
    }
}
