//! ISP programming session
//!
//! An [`IspSession`] owns the ISP lines of one target and tracks everything
//! the target latches on its side: whether it is in programming mode, the
//! extended address byte last loaded and the fuse bytes read at start-up.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle --enter()--> Handshaking (bounded retries) --> Active --exit()--> Idle
//!                         |
//!                         +--> Idle (no acknowledge)
//! ```
//!
//! Every operation other than [`IspSession::enter`] requires the Active
//! state. Flash operations additionally require a chip resolved through
//! [`IspSession::read_signature`].

use crate::chip::{self, ChipSignature, FuseByte};
use crate::config::IspTiming;
use crate::error::{Error, Result};
use crate::programmer::{transfer_byte, transfer_frame, IspPins};

use super::opcodes;

/// Whether the target is currently in programming mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Lines released, target running or held in reset by someone else
    Idle,
    /// Reset pulses and programming enable in progress
    Handshaking,
    /// Target acknowledged programming enable
    Active,
}

/// Programming session with one target chip
pub struct IspSession<P: IspPins> {
    pins: P,
    timing: IspTiming,
    state: SessionState,
    chip: Option<&'static ChipSignature>,
    /// Mirror of the target's extended address register
    last_extended: u8,
    fuses: [u8; FuseByte::COUNT],
}

impl<P: IspPins> IspSession<P> {
    /// Create an idle session on the given pins
    pub fn new(pins: P, timing: IspTiming) -> Self {
        Self {
            pins,
            timing,
            state: SessionState::Idle,
            chip: None,
            last_extended: 0,
            fuses: [0xFF; FuseByte::COUNT],
        }
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if the target is in programming mode
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// The chip resolved by [`read_signature`](Self::read_signature), if any
    pub fn chip(&self) -> Option<&'static ChipSignature> {
        self.chip
    }

    /// Timing parameters in use
    pub fn timing(&self) -> &IspTiming {
        &self.timing
    }

    /// Cached fuse, lock and calibration bytes
    pub fn fuses(&self) -> &[u8; FuseByte::COUNT] {
        &self.fuses
    }

    /// Cached value of one fuse byte
    pub fn fuse(&self, which: FuseByte) -> u8 {
        self.fuses[which.index()]
    }

    /// Get a reference to the pin driver
    pub fn pins(&self) -> &P {
        &self.pins
    }

    /// Get a mutable reference to the pin driver
    pub fn pins_mut(&mut self) -> &mut P {
        &mut self.pins
    }

    /// Consume the session and return the pin driver
    pub fn into_inner(self) -> P {
        self.pins
    }

    /// Reset the target and bring it into programming mode
    ///
    /// The target's power-on reset is not synchronised with us, so the
    /// handshake is retried up to `enter_attempts` times. Each attempt pulses
    /// RESET, waits for the target to settle and sends programming enable;
    /// the target is in sync when it echoes [`opcodes::PROGRAM_ACK`] on the
    /// third byte.
    pub fn enter(&mut self) -> Result<()> {
        let bit_delay = self.timing.bit_delay_us;

        self.pins.request_bus();
        self.state = SessionState::Handshaking;

        for attempt in 1..=self.timing.enter_attempts {
            self.pins.delay_ms(self.timing.handshake_pause_ms);
            self.pins.set_sck(false);

            // reset pulse, then hold RESET low for the whole session
            self.pins.set_reset(true);
            self.pins.delay_us(self.timing.reset_pulse_us);
            self.pins.set_reset(false);
            self.pins.delay_ms(self.timing.settle_ms);

            transfer_byte(&mut self.pins, opcodes::PROGRAM_ENABLE, bit_delay);
            transfer_byte(&mut self.pins, opcodes::PROGRAM_ACK, bit_delay);
            let confirm = transfer_byte(&mut self.pins, 0, bit_delay);
            transfer_byte(&mut self.pins, 0, bit_delay);

            if confirm == opcodes::PROGRAM_ACK {
                log::debug!("isp: in programming mode after {} attempt(s)", attempt);
                self.state = SessionState::Active;
                // reset cleared the target's extended address register
                self.last_extended = 0;
                return Ok(());
            }

            log::trace!(
                "isp: handshake attempt {} got 0x{:02X}, expected 0x{:02X}",
                attempt,
                confirm,
                opcodes::PROGRAM_ACK
            );
        }

        log::warn!(
            "isp: no programming acknowledge after {} attempts",
            self.timing.enter_attempts
        );
        self.release();
        Err(Error::CannotEnterProgrammingMode)
    }

    /// Leave programming mode and release the ISP lines
    ///
    /// Lines are driven low first so no pull-up stays enabled, then turned
    /// into inputs. Safe to call in any state.
    pub fn exit(&mut self) {
        if self.state == SessionState::Active {
            log::debug!("isp: leaving programming mode");
        }
        self.release();
    }

    fn release(&mut self) {
        self.pins.set_reset(false);
        self.pins.set_sck(false);
        self.pins.set_mosi(false);
        self.pins.release_bus();
        self.state = SessionState::Idle;
    }

    fn require_active(&self) -> Result<()> {
        if self.state == SessionState::Active {
            Ok(())
        } else {
            Err(Error::NotInProgrammingMode)
        }
    }

    fn require_chip(&self) -> Result<&'static ChipSignature> {
        self.require_active()?;
        self.chip.ok_or(Error::NoSignature)
    }

    /// Execute one instruction and return the byte clocked back last
    fn command(&mut self, b1: u8, b2: u8, b3: u8, b4: u8) -> u8 {
        let response = transfer_frame(&mut self.pins, [b1, b2, b3, b4], self.timing.bit_delay_us);
        log::trace!(
            "isp: {:02X} {:02X} {:02X} {:02X} -> {:02X}",
            b1,
            b2,
            b3,
            b4,
            response[3]
        );
        response[3]
    }

    /// Read the three raw signature bytes
    pub fn read_signature_bytes(&mut self) -> Result<[u8; 3]> {
        self.require_active()?;
        let mut sig = [0u8; 3];
        for (i, byte) in sig.iter_mut().enumerate() {
            *byte = self.command(opcodes::READ_SIGNATURE, 0, i as u8, 0);
        }
        Ok(sig)
    }

    /// Identify the target through the chip catalog
    ///
    /// On success the chip is cached for the rest of the session and the
    /// target's extended address register is zeroed to match our mirror of
    /// it. An unknown signature leaves the session without a chip.
    pub fn read_signature(&mut self) -> Result<&'static ChipSignature> {
        let sig = self.read_signature_bytes()?;
        self.chip = None;

        let Some(found) = chip::find(&sig) else {
            log::warn!(
                "isp: unrecognized signature {:02X} {:02X} {:02X}",
                sig[0],
                sig[1],
                sig[2]
            );
            return Err(Error::UnrecognizedSignature(sig));
        };

        log::info!("isp: found {}", found);
        self.command(opcodes::LOAD_EXTENDED_ADDRESS, 0, 0, 0);
        self.last_extended = 0;
        self.chip = Some(found);
        Ok(found)
    }

    /// Read and cache the fuse, lock and calibration bytes
    pub fn read_fuses(&mut self) -> Result<[u8; FuseByte::COUNT]> {
        self.require_active()?;

        self.fuses[FuseByte::Low.index()] = self.command(opcodes::READ_LOW_FUSE, 0x00, 0, 0);
        self.fuses[FuseByte::High.index()] = self.command(opcodes::READ_HIGH_FUSE, 0x08, 0, 0);
        self.fuses[FuseByte::Extended.index()] =
            self.command(opcodes::READ_EXTENDED_FUSE, 0x08, 0, 0);
        self.fuses[FuseByte::Lock.index()] = self.command(opcodes::READ_LOCK_BYTE, 0x00, 0, 0);
        self.fuses[FuseByte::Calibration.index()] =
            self.command(opcodes::READ_CALIBRATION, 0x00, 0, 0);

        log::debug!(
            "isp: fuses low={:02X} high={:02X} ext={:02X} lock={:02X} cal={:02X}",
            self.fuses[0],
            self.fuses[1],
            self.fuses[2],
            self.fuses[3],
            self.fuses[4]
        );
        Ok(self.fuses)
    }

    /// Program one fuse or the lock byte
    ///
    /// A value of [`opcodes::NO_FUSE_CHANGE`] is treated as "nothing to
    /// write" and skipped, even though 0xFF is a valid fuse pattern. The
    /// calibration byte is read-only and never written.
    pub fn write_fuse(&mut self, which: FuseByte, value: u8) -> Result<()> {
        self.require_active()?;

        if value == opcodes::NO_FUSE_CHANGE {
            log::debug!("isp: {} left unchanged", which);
            return Ok(());
        }

        let instruction = match which {
            FuseByte::Low => opcodes::WRITE_LOW_FUSE,
            FuseByte::High => opcodes::WRITE_HIGH_FUSE,
            FuseByte::Extended => opcodes::WRITE_EXTENDED_FUSE,
            FuseByte::Lock => opcodes::WRITE_LOCK_BYTE,
            FuseByte::Calibration => {
                log::warn!("isp: refusing to write the calibration byte");
                return Ok(());
            }
        };

        log::info!("isp: writing {} = 0x{:02X}", which, value);
        self.command(opcodes::PROGRAM_ENABLE, instruction, 0, value);
        self.poll_until_ready()?;
        self.fuses[which.index()] = value;
        Ok(())
    }

    /// Wait until the target has finished its last write
    ///
    /// Chips with timed writes get a fixed delay; all others are polled
    /// until RDY/BSY clears, at most `poll_limit` times.
    pub fn poll_until_ready(&mut self) -> Result<()> {
        self.require_active()?;

        if self.chip.is_some_and(|c| c.timed_writes) {
            self.pins.delay_ms(self.timing.timed_write_delay_ms);
            return Ok(());
        }

        for _ in 0..self.timing.poll_limit {
            if self.command(opcodes::POLL_READY, 0, 0, 0) & opcodes::RDY_BSY == 0 {
                return Ok(());
            }
        }

        log::error!(
            "isp: target still busy after {} polls",
            self.timing.poll_limit
        );
        Err(Error::DeviceUnresponsive)
    }

    /// Load the extended address byte if it differs from the target's
    fn sync_extended_address(&mut self, word_addr: u32) {
        let msb = (word_addr >> 16) as u8;
        if msb != self.last_extended {
            self.command(opcodes::LOAD_EXTENDED_ADDRESS, 0, msb, 0);
            self.last_extended = msb;
        }
    }

    /// Read one byte of program memory at byte address `addr`
    pub fn read_flash_byte(&mut self, addr: u32) -> Result<u8> {
        self.require_chip()?;

        let high = if addr & 1 != 0 { opcodes::HIGH_BYTE } else { 0 };
        let word = addr >> 1;
        self.sync_extended_address(word);

        Ok(self.command(
            opcodes::READ_PROGRAM_MEMORY | high,
            (word >> 8) as u8,
            word as u8,
            0,
        ))
    }

    /// Load one byte into the target's page buffer
    ///
    /// Nothing reaches flash until the page is committed with
    /// [`commit_page`](Self::commit_page).
    pub fn write_flash_byte(&mut self, addr: u32, data: u8) -> Result<()> {
        self.require_chip()?;

        let word = addr >> 1;
        self.sync_extended_address(word);
        self.load_page_buffer(addr, data);
        Ok(())
    }

    fn load_page_buffer(&mut self, addr: u32, data: u8) {
        let high = if addr & 1 != 0 { opcodes::HIGH_BYTE } else { 0 };
        let word = addr >> 1;
        self.command(opcodes::LOAD_PROGRAM_MEMORY | high, 0, word as u8, data);
    }

    /// Fill the target's page buffer with 0xFF
    ///
    /// Only the in-page offset of a load address matters, so no extended
    /// address is loaded here.
    pub fn clear_page(&mut self) -> Result<()> {
        let chip = self.require_chip()?;
        for offset in 0..chip.page_size {
            self.load_page_buffer(offset, 0xFF);
        }
        Ok(())
    }

    /// Write the page buffer to the flash page starting at byte `page_addr`
    ///
    /// Waits for the write to finish and leaves an erased page buffer behind.
    pub fn commit_page(&mut self, page_addr: u32) -> Result<()> {
        self.require_chip()?;

        let word = page_addr >> 1;
        self.sync_extended_address(word);

        log::trace!("isp: committing page 0x{:06X}", page_addr);
        self.command(
            opcodes::WRITE_PROGRAM_MEMORY,
            (word >> 8) as u8,
            word as u8,
            0,
        );
        self.poll_until_ready()?;
        self.clear_page()
    }

    /// Erase flash (and EEPROM unless EESAVE is programmed)
    pub fn chip_erase(&mut self) -> Result<()> {
        self.require_chip()?;

        log::info!("isp: erasing chip");
        self.command(opcodes::PROGRAM_ENABLE, opcodes::CHIP_ERASE, 0, 0);
        self.pins.delay_ms(self.timing.erase_delay_ms);
        self.poll_until_ready()?;
        self.clear_page()
    }
}
