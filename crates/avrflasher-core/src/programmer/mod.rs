//! Programmer abstractions
//!
//! This module defines the trait a pin driver must implement so the ISP
//! session can talk to the target.

pub mod bitbang;

pub use bitbang::{transfer_byte, transfer_frame, IspPins};
