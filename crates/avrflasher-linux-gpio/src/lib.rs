//! avrflasher-linux-gpio - Linux GPIO support for the ISP jig
//!
//! This crate drives the jig's hardware through the Linux character device
//! GPIO interface (gpiocdev): the four ISP lines to the target and the
//! three status LEDs.
//!
//! # Example
//!
//! ```no_run
//! use avrflasher_core::config::IspTiming;
//! use avrflasher_core::isp::IspSession;
//! use avrflasher_linux_gpio::{LinuxGpioIsp, LinuxGpioIspConfig};
//!
//! let config = LinuxGpioIspConfig::new("/dev/gpiochip0", 25, 11, 10, 9);
//! //                                    device          RST SCK MOSI MISO
//!
//! let pins = LinuxGpioIsp::open(&config)?;
//! let mut session = IspSession::new(pins, IspTiming::default());
//! session.enter()?;
//! let chip = session.read_signature()?;
//! println!("found {}", chip);
//! session.exit();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Wiring
//!
//! | Target pin | GPIO function  | Description |
//! |------------|----------------|-------------|
//! | RESET      | RESET (output) | Held low during programming |
//! | SCK        | SCK (output)   | Serial clock |
//! | MOSI       | MOSI (output)  | Data to the target |
//! | MISO       | MISO (input)   | Data from the target |
//! | GND        | GND            | Ground |
//!
//! The lines are inputs whenever no attempt is running, so the target can
//! be swapped without being back-powered through the jig.
//!
//! # System Requirements
//!
//! - Linux kernel 4.8+ with GPIO character device support (kernel 5.5+ for v2 API)
//! - Access to `/dev/gpiochipN` devices (may require root or udev rules)

pub mod device;
pub mod error;
pub mod leds;

// Re-exports
pub use device::{LinuxGpioIsp, LinuxGpioIspConfig};
pub use error::{LinuxGpioError, Result};
pub use leds::{GpioLeds, LedConfig};
