//! AVR serial programming protocol
//!
//! This module implements the in-system programming instruction sequences
//! described in the "Serial Downloading" chapter of the AVR datasheets.

pub mod opcodes;
mod session;

pub use session::{IspSession, SessionState};
