//! avrflasher - Autonomous AVR ISP programming jig
//!
//! The jig programs AVR microcontrollers without an operator at a keyboard:
//! it reads an Intel-HEX file from removable storage, brings the target into
//! serial programming mode over bit-banged GPIO lines, erases, writes and
//! verifies its flash, then sets the boot fuse to match the image.
//!
//! # Architecture
//!
//! - `avrflasher-core` holds the whole programming engine and is hardware
//!   agnostic; it only sees the `IspPins`, `FirmwareSource` and
//!   `StatusSink` traits.
//! - `avrflasher-linux-gpio` provides the pins and the status LEDs on Linux.
//! - This binary wires both together using the configuration compiled in
//!   from `jig.toml` and loops over programming attempts forever.

#![cfg_attr(not(feature = "linux-gpio"), allow(dead_code))]

mod config;
mod jig;
mod status;
mod storage;

use config::{ConfigError, JigConfig};
use thiserror::Error;

/// Reasons the jig cannot start
#[derive(Debug, Error)]
enum JigError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[cfg(feature = "linux-gpio")]
    #[error(transparent)]
    Gpio(#[from] avrflasher_linux_gpio::LinuxGpioError),

    #[cfg(not(feature = "linux-gpio"))]
    #[error("built without a hardware backend, enable the linux-gpio feature")]
    NoBackend,
}

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "linux-gpio")]
fn run() -> Result<(), JigError> {
    use avrflasher_core::isp::IspSession;
    use avrflasher_linux_gpio::{GpioLeds, LinuxGpioIsp};

    let config = JigConfig::baked()?;
    log::info!(
        "avrflasher {}: programming {} from {}",
        env!("CARGO_PKG_VERSION"),
        config.firmware.file,
        config.firmware.storage.display()
    );

    let pins = LinuxGpioIsp::open(&config.gpio)?;
    let leds = config.leds.as_ref().map(GpioLeds::open).transpose()?;
    if leds.is_none() {
        log::warn!("no status LEDs configured, reporting on the console only");
    }

    let mut session = IspSession::new(pins, config.isp);
    let mut source = storage::DirSource::new(&config.firmware.storage);
    let mut sink = status::Both(status::ConsoleStatus::new(), leds);

    let summary = jig::run(&mut session, &mut source, &mut sink, &config.firmware, None);
    log::info!(
        "stopped after {} attempts, {} flashed, last status: {:?}",
        summary.attempts,
        summary.flashed,
        summary.last
    );
    Ok(())
}

#[cfg(not(feature = "linux-gpio"))]
fn run() -> Result<(), JigError> {
    let config = JigConfig::baked()?;
    log::debug!("configuration: {:?}", config);
    Err(JigError::NoBackend)
}
