//! ISP timing configuration
//!
//! All delays and retry bounds used by the session live here so a jig build
//! can tune them without touching the protocol code.

/// Timing and retry parameters for an ISP session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct IspTiming {
    /// Handshake attempts before giving up on programming mode
    pub enter_attempts: u32,
    /// Pause before each handshake attempt, in milliseconds
    pub handshake_pause_ms: u32,
    /// Width of the reset pulse, in microseconds
    pub reset_pulse_us: u32,
    /// Wait after releasing reset before programming enable, in milliseconds
    pub settle_ms: u32,
    /// Clock hold time per half bit, in microseconds
    pub bit_delay_us: u32,
    /// Fixed wait for chips whose busy flag cannot be polled, in milliseconds
    pub timed_write_delay_ms: u32,
    /// Wait after chip erase before polling, in milliseconds
    pub erase_delay_ms: u32,
    /// Maximum number of ready polls before the target is declared dead
    pub poll_limit: u32,
}

impl IspTiming {
    /// Timing with every delay set to zero, for simulated targets
    pub const fn no_delay() -> Self {
        Self {
            enter_attempts: 10,
            handshake_pause_ms: 0,
            reset_pulse_us: 0,
            settle_ms: 0,
            bit_delay_us: 0,
            timed_write_delay_ms: 0,
            erase_delay_ms: 0,
            poll_limit: 10_000,
        }
    }
}

impl Default for IspTiming {
    fn default() -> Self {
        Self {
            enter_attempts: 10,
            handshake_pause_ms: 100,
            // at least two target clock cycles
            reset_pulse_us: 10,
            // datasheet asks for at least 20 ms
            settle_ms: 25,
            bit_delay_us: 6,
            // at least 2 x t_WD_FLASH (4.5 ms)
            timed_write_delay_ms: 10,
            erase_delay_ms: 20,
            poll_limit: 10_000,
        }
    }
}
