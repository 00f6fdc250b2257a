//! Status LEDs on Linux GPIO
//!
//! [`GpioLeds`] renders each [`Status`] as the blink pattern the jig uses:
//! bursts of the error LED (alone or together with the working LED) for
//! failures, a long green sequence for success. The working LED is lit while
//! the file is checked and written and toggles on progress ticks; the ready
//! LED is lit during verification.

use std::time::Duration;

use gpiocdev::line::{Offset, Value};
use gpiocdev::request::{Config, Request};
use serde::Deserialize;

use avrflasher_core::flash::Pass;
use avrflasher_core::status::{BlinkPattern, Led, Status, StatusSink};

use crate::error::{check_distinct, LinuxGpioError, Result};

fn default_blink_ms() -> u64 {
    200
}

fn default_pause_ms() -> u64 {
    1000
}

/// LED wiring and blink timing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedConfig {
    /// Device path (e.g., "/dev/gpiochip0")
    pub device: String,
    /// Red LED line offset
    pub error: Offset,
    /// Blue LED line offset
    pub working: Offset,
    /// Green LED line offset
    pub ready: Offset,
    /// On and off time of one blink
    #[serde(default = "default_blink_ms")]
    pub blink_ms: u64,
    /// Pause between bursts
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
}

impl LedConfig {
    /// Check the configuration without touching hardware
    pub fn validate(&self) -> Result<()> {
        if self.device.is_empty() {
            return Err(LinuxGpioError::NoDevice);
        }
        check_distinct(&[
            ("error LED", self.error),
            ("working LED", self.working),
            ("ready LED", self.ready),
        ])
    }

    fn offset(&self, led: Led) -> Offset {
        match led {
            Led::Error => self.error,
            Led::Working => self.working,
            Led::Ready => self.ready,
        }
    }
}

/// One step of a rendered blink pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Switch the pattern's LEDs on or off, then wait
    Lit(bool, Duration),
    /// Wait with all LEDs off
    Pause(Duration),
}

/// Expand a blink pattern into on/off steps
pub(crate) fn schedule(pattern: BlinkPattern, blink: Duration, pause: Duration) -> Vec<Step> {
    let mut steps = Vec::new();
    for burst in 0..pattern.repeat {
        if burst > 0 {
            steps.push(Step::Pause(pause));
        }
        for _ in 0..pattern.times {
            steps.push(Step::Lit(true, blink));
            steps.push(Step::Lit(false, blink));
        }
    }
    steps
}

/// LED lit for the duration of a pass
pub(crate) fn phase_led(pass: Pass) -> Led {
    match pass {
        Pass::Check | Pass::Write => Led::Working,
        Pass::Verify => Led::Ready,
    }
}

/// Status sink driving three LEDs
pub struct GpioLeds {
    request: Request,
    config: LedConfig,
    working_on: bool,
}

impl GpioLeds {
    /// Request the LED lines, all off
    pub fn open(config: &LedConfig) -> Result<Self> {
        config.validate()?;

        let mut cfg = Config::default();
        cfg.with_lines(&[config.error, config.working, config.ready])
            .as_output(Value::Inactive);

        let request = Request::from_config(cfg)
            .on_chip(&config.device)
            .with_consumer("avrflasher-leds")
            .request()
            .map_err(|source| LinuxGpioError::LineRequestFailed {
                path: config.device.clone(),
                source,
            })?;

        log::info!(
            "leds: Opened {} (error={}, working={}, ready={})",
            config.device,
            config.error,
            config.working,
            config.ready
        );

        Ok(Self {
            request,
            config: config.clone(),
            working_on: false,
        })
    }

    /// Switch one LED
    pub fn set(&mut self, led: Led, on: bool) {
        let value = if on { Value::Active } else { Value::Inactive };
        if let Err(e) = self.request.set_value(self.config.offset(led), value) {
            log::error!("Failed to set {:?} LED: {}", led, e);
        }
    }

    /// Switch every LED off
    pub fn all_off(&mut self) {
        for led in [Led::Error, Led::Working, Led::Ready] {
            self.set(led, false);
        }
        self.working_on = false;
    }

    fn show(&mut self, pattern: BlinkPattern) {
        let blink = Duration::from_millis(self.config.blink_ms);
        let pause = Duration::from_millis(self.config.pause_ms);

        for step in schedule(pattern, blink, pause) {
            let wait = match step {
                Step::Lit(on, wait) => {
                    self.set(pattern.primary, on);
                    if let Some(second) = pattern.secondary {
                        self.set(second, on);
                    }
                    wait
                }
                Step::Pause(wait) => wait,
            };
            std::thread::sleep(wait);
        }
    }
}

impl StatusSink for GpioLeds {
    fn report(&mut self, status: Status) {
        self.all_off();
        self.show(status.blink_pattern());
    }

    fn progress(&mut self) {
        self.working_on = !self.working_on;
        self.set(Led::Working, self.working_on);
    }

    fn phase(&mut self, pass: Pass) {
        let led = phase_led(pass);
        if led == Led::Working {
            self.working_on = true;
        }
        self.set(led, true);
    }
}

impl Drop for GpioLeds {
    fn drop(&mut self) {
        self.all_off();
    }
}
