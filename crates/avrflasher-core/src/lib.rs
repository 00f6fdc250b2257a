//! avrflasher-core - Core library for AVR in-system programming
//!
//! This crate provides the programming engine of the avrflasher jig: a
//! bit-banged ISP transport, the AVR serial programming protocol, a catalog
//! of supported target chips, an Intel-HEX line parser and the three-pass
//! check/write/verify pipeline that ties them together. It is designed to be
//! `no_std` compatible so the same engine can run on a microcontroller or on
//! a Linux single-board computer.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc` and serde
//!   derives for the timing configuration)
//! - `alloc` - Enable heap allocation
//!
//! # Example
//!
//! ```ignore
//! use avrflasher_core::flash::{self, FlashOptions};
//! use avrflasher_core::isp::IspSession;
//!
//! fn program<P: IspPins, S: FirmwareSource, R: StatusSink>(pins: P, sd: &mut S, leds: &mut R) {
//!     let mut session = IspSession::new(pins, IspTiming::default());
//!     let status = flash::attempt(&mut session, sd, leds, "fw.hex", &FlashOptions::default());
//!     log::info!("attempt finished: {}", status);
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod chip;
pub mod config;
pub mod error;
pub mod flash;
pub mod hex;
pub mod isp;
pub mod programmer;
pub mod status;

pub use error::{Error, Result};
