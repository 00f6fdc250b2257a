//! Bitbang ISP transport
//!
//! The AVR serial programming interface is a plain SPI-like bus clocked in
//! software: SCK, MOSI (data to the target), MISO (data from the target) and
//! the target's RESET line. This module provides the GPIO boundary trait and
//! the byte exchange built on top of it.
//!
//! ## Timing
//!
//! For each bit, MSB first:
//!
//! 1. drive MOSI with the bit value
//! 2. raise SCK and hold for the bit delay
//! 3. sample MISO
//! 4. lower SCK and hold for the bit delay
//!
//! The bit delay must be longer than two target clock cycles for both clock
//! phases; 6 µs is safe for targets running from a 1 MHz internal oscillator.

/// Trait for low-level ISP line control
///
/// This trait provides the minimal set of operations needed to bitbang the
/// ISP bus. It is the only hardware surface the engine touches.
pub trait IspPins {
    /// Set RESET line level
    fn set_reset(&mut self, high: bool);

    /// Set clock line level
    fn set_sck(&mut self, high: bool);

    /// Set MOSI line level
    fn set_mosi(&mut self, high: bool);

    /// Get MISO line level
    fn get_miso(&mut self) -> bool;

    /// Busy-wait for the specified number of microseconds
    fn delay_us(&mut self, us: u32);

    /// Busy-wait for the specified number of milliseconds
    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1000);
        }
    }

    /// Take the bus: RESET, SCK and MOSI become outputs, SCK low
    fn request_bus(&mut self);

    /// Release the bus: all four lines become inputs
    fn release_bus(&mut self);
}

/// Exchange one byte with the target (MSB first)
///
/// Shifts `byte` out on MOSI while shifting the target's answer in from
/// MISO.
pub fn transfer_byte<P: IspPins + ?Sized>(pins: &mut P, byte: u8, bit_delay_us: u32) -> u8 {
    let mut out = byte;
    let mut received = 0u8;
    for _ in 0..8 {
        pins.set_mosi(out & 0x80 != 0);
        out <<= 1;

        pins.set_sck(true);
        pins.delay_us(bit_delay_us);

        received <<= 1;
        if pins.get_miso() {
            received |= 1;
        }

        pins.set_sck(false);
        pins.delay_us(bit_delay_us);
    }
    received
}

/// Exchange a complete 4-byte instruction frame
///
/// Returns every byte clocked back by the target; for most instructions only
/// the last one carries data.
pub fn transfer_frame<P: IspPins + ?Sized>(
    pins: &mut P,
    frame: [u8; 4],
    bit_delay_us: u32,
) -> [u8; 4] {
    let mut response = [0u8; 4];
    for (out, byte) in response.iter_mut().zip(frame) {
        *out = transfer_byte(pins, byte, bit_delay_us);
    }
    response
}
