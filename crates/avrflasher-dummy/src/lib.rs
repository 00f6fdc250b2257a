//! avrflasher-dummy - Simulated AVR target for testing
//!
//! This crate provides [`DummyAvr`], a bit-level emulation of an AVR's
//! serial programming interface. It implements [`IspPins`] directly, so the
//! real transport, session and orchestrator run against it unchanged. It's
//! useful for testing and development without a jig.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use avrflasher_core::chip::{ChipSignature, FuseByte};
use avrflasher_core::isp::opcodes;
use avrflasher_core::programmer::IspPins;

/// Configuration for the simulated target
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Signature bytes reported by the target
    pub signature: [u8; 3],
    /// Flash size in bytes
    pub flash_size: usize,
    /// Page size in bytes
    pub page_size: usize,
    /// Initial low, high, extended fuse, lock and calibration bytes
    pub fuses: [u8; FuseByte::COUNT],
    /// Reset pulses ignored before the target answers the handshake
    pub failed_handshakes: u32,
    /// Ready polls answered "busy" after each write
    pub busy_polls: u32,
}

impl DummyConfig {
    /// Configuration matching a catalog entry
    pub fn for_chip(chip: &ChipSignature) -> Self {
        Self {
            signature: chip.signature,
            flash_size: chip.flash_size as usize,
            page_size: chip.page_size as usize,
            ..Self::default()
        }
    }
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            signature: [0x1E, 0x95, 0x0F], // ATmega328P
            flash_size: 32 * 1024,
            page_size: 128,
            fuses: [0x62, 0xD9, 0xFF, 0xFF, 0xA5],
            failed_handshakes: 0,
            busy_polls: 1,
        }
    }
}

/// Simulated AVR target
///
/// Bits are latched on the rising SCK edge and MISO changes after the
/// falling one, MSB first. While in programming mode the target echoes the
/// previous byte on bytes 2 and 3 of every frame and answers reads on
/// byte 4. A rising edge on RESET drops it out of programming mode.
#[cfg(feature = "alloc")]
pub struct DummyAvr {
    config: DummyConfig,
    flash: Vec<u8>,
    page_buffer: Vec<u8>,
    fuses: [u8; FuseByte::COUNT],
    extended_address: u8,

    reset: bool,
    sck: bool,
    mosi: bool,
    bus_owned: bool,

    resets: u32,
    programming: bool,
    shift_in: u8,
    bit: u8,
    frame: [u8; 4],
    index: usize,
    outgoing: u8,
    busy_remaining: u32,

    frames: Vec<[u8; 4]>,
    commits: Vec<u32>,
    fuse_writes: Vec<(FuseByte, u8)>,
    extended_loads: Vec<u8>,
    erases: u32,
    polls: u32,
    read_faults: Vec<u32>,
}

#[cfg(feature = "alloc")]
impl DummyAvr {
    /// Create a new target with erased flash
    pub fn new(config: DummyConfig) -> Self {
        let flash = vec![0xFF; config.flash_size];
        let page_buffer = vec![0xFF; config.page_size];
        let fuses = config.fuses;
        Self {
            config,
            flash,
            page_buffer,
            fuses,
            extended_address: 0,
            reset: false,
            sck: false,
            mosi: false,
            bus_owned: false,
            resets: 0,
            programming: false,
            shift_in: 0,
            bit: 0,
            frame: [0; 4],
            index: 0,
            outgoing: 0,
            busy_remaining: 0,
            frames: Vec::new(),
            commits: Vec::new(),
            fuse_writes: Vec::new(),
            extended_loads: Vec::new(),
            erases: 0,
            polls: 0,
            read_faults: Vec::new(),
        }
    }

    /// Create a target emulating a catalog entry
    pub fn for_chip(chip: &ChipSignature) -> Self {
        Self::new(DummyConfig::for_chip(chip))
    }

    /// Make reads of `addr` return the stored byte inverted
    pub fn add_read_fault(&mut self, addr: u32) {
        self.read_faults.push(addr);
    }

    /// Flash contents
    pub fn flash(&self) -> &[u8] {
        &self.flash
    }

    /// Mutable flash contents, for preloading
    pub fn flash_mut(&mut self) -> &mut [u8] {
        &mut self.flash
    }

    /// Current fuse, lock and calibration bytes
    pub fn fuses(&self) -> &[u8; FuseByte::COUNT] {
        &self.fuses
    }

    /// Every complete frame clocked in, handshakes included
    pub fn frames(&self) -> &[[u8; 4]] {
        &self.frames
    }

    /// Byte addresses of committed pages, in order
    pub fn commits(&self) -> &[u32] {
        &self.commits
    }

    /// Fuse writes, in order
    pub fn fuse_writes(&self) -> &[(FuseByte, u8)] {
        &self.fuse_writes
    }

    /// Extended address bytes loaded, in order
    pub fn extended_loads(&self) -> &[u8] {
        &self.extended_loads
    }

    /// Number of chip erases
    pub fn erases(&self) -> u32 {
        self.erases
    }

    /// Number of ready polls answered
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Number of reset pulses seen
    pub fn resets(&self) -> u32 {
        self.resets
    }

    /// Check if the target is in programming mode
    pub fn is_programming(&self) -> bool {
        self.programming
    }

    /// Check if the programmer currently drives the bus
    pub fn is_bus_owned(&self) -> bool {
        self.bus_owned
    }

    fn synced(&self) -> bool {
        self.resets > self.config.failed_handshakes
    }

    fn byte_received(&mut self, byte: u8) {
        self.frame[self.index] = byte;
        self.index += 1;

        match self.index {
            2 => {
                if self.synced()
                    && self.frame[0] == opcodes::PROGRAM_ENABLE
                    && self.frame[1] == opcodes::PROGRAM_ACK
                {
                    self.programming = true;
                }
                self.outgoing = if self.programming { byte } else { 0 };
            }
            3 => {
                self.outgoing = if self.programming { self.read() } else { 0 };
            }
            4 => {
                let frame = self.frame;
                self.frames.push(frame);
                if self.programming {
                    self.execute(frame);
                }
                self.index = 0;
                self.outgoing = 0;
            }
            _ => {
                self.outgoing = if self.programming { byte } else { 0 };
            }
        }
    }

    fn word_address(&self, hi: u8, lo: u8) -> usize {
        (usize::from(self.extended_address) << 16) | (usize::from(hi) << 8) | usize::from(lo)
    }

    /// Answer for the fourth byte, given the first three
    fn read(&mut self) -> u8 {
        let [b1, b2, b3, _] = self.frame;
        match (b1, b2) {
            (opcodes::READ_SIGNATURE, _) => {
                self.config.signature.get(usize::from(b3)).copied().unwrap_or(0)
            }
            (opcodes::READ_LOW_FUSE, 0x00) => self.fuses[FuseByte::Low.index()],
            (opcodes::READ_HIGH_FUSE, 0x08) => self.fuses[FuseByte::High.index()],
            (opcodes::READ_EXTENDED_FUSE, 0x08) => self.fuses[FuseByte::Extended.index()],
            (opcodes::READ_LOCK_BYTE, 0x00) => self.fuses[FuseByte::Lock.index()],
            (opcodes::READ_CALIBRATION, _) => self.fuses[FuseByte::Calibration.index()],
            (opcodes::POLL_READY, _) => {
                self.polls += 1;
                if self.busy_remaining > 0 {
                    self.busy_remaining -= 1;
                    opcodes::RDY_BSY
                } else {
                    0
                }
            }
            (op, _) if op & !opcodes::HIGH_BYTE == opcodes::READ_PROGRAM_MEMORY => {
                let high = usize::from(op & opcodes::HIGH_BYTE != 0);
                let addr = self.word_address(b2, b3) * 2 + high;
                let value = self.flash.get(addr).copied().unwrap_or(0xFF);
                if self.read_faults.contains(&(addr as u32)) {
                    !value
                } else {
                    value
                }
            }
            _ => b3,
        }
    }

    fn execute(&mut self, frame: [u8; 4]) {
        let [b1, b2, b3, b4] = frame;
        match b1 {
            opcodes::PROGRAM_ENABLE => match b2 {
                opcodes::CHIP_ERASE => {
                    self.flash.fill(0xFF);
                    self.erases += 1;
                    self.busy_remaining = self.config.busy_polls;
                }
                opcodes::WRITE_LOW_FUSE => self.write_fuse(FuseByte::Low, b4),
                opcodes::WRITE_HIGH_FUSE => self.write_fuse(FuseByte::High, b4),
                opcodes::WRITE_EXTENDED_FUSE => self.write_fuse(FuseByte::Extended, b4),
                opcodes::WRITE_LOCK_BYTE => self.write_fuse(FuseByte::Lock, b4),
                _ => {}
            },
            opcodes::LOAD_EXTENDED_ADDRESS => {
                self.extended_address = b3;
                self.extended_loads.push(b3);
            }
            opcodes::WRITE_PROGRAM_MEMORY => {
                let page = (self.word_address(b2, b3) * 2) & !(self.config.page_size - 1);
                if let Some(target) = self.flash.get_mut(page..page + self.config.page_size) {
                    // programming can only clear bits
                    for (cell, &byte) in target.iter_mut().zip(&self.page_buffer) {
                        *cell &= byte;
                    }
                }
                self.commits.push(page as u32);
                self.busy_remaining = self.config.busy_polls;
            }
            op if op & !opcodes::HIGH_BYTE == opcodes::LOAD_PROGRAM_MEMORY => {
                let words = self.config.page_size / 2;
                let high = usize::from(op & opcodes::HIGH_BYTE != 0);
                let offset = (usize::from(b3) % words) * 2 + high;
                self.page_buffer[offset] = b4;
            }
            _ => {}
        }
    }

    fn write_fuse(&mut self, fuse: FuseByte, value: u8) {
        self.fuses[fuse.index()] = value;
        self.fuse_writes.push((fuse, value));
        self.busy_remaining = self.config.busy_polls;
    }
}

#[cfg(feature = "alloc")]
impl IspPins for DummyAvr {
    fn set_reset(&mut self, high: bool) {
        if high && !self.reset {
            log::trace!("dummy: reset pulse");
            self.resets += 1;
            self.programming = false;
            self.extended_address = 0;
            self.index = 0;
            self.bit = 0;
            self.outgoing = 0;
        }
        self.reset = high;
    }

    fn set_sck(&mut self, high: bool) {
        // the serial interface only listens while RESET is held low
        if !self.reset {
            if high && !self.sck {
                self.shift_in = (self.shift_in << 1) | u8::from(self.mosi);
            }
            if !high && self.sck {
                self.bit += 1;
                if self.bit == 8 {
                    self.bit = 0;
                    self.byte_received(self.shift_in);
                }
            }
        }
        self.sck = high;
    }

    fn set_mosi(&mut self, high: bool) {
        self.mosi = high;
    }

    fn get_miso(&mut self) -> bool {
        self.outgoing & (0x80 >> self.bit) != 0
    }

    fn delay_us(&mut self, _us: u32) {}

    fn delay_ms(&mut self, _ms: u32) {}

    fn request_bus(&mut self) {
        self.bus_owned = true;
    }

    fn release_bus(&mut self) {
        self.bus_owned = false;
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use avrflasher_core::chip;
    use avrflasher_core::config::IspTiming;
    use avrflasher_core::flash::{self, FirmwareSource, FlashOptions, MemorySource, Pass};
    use avrflasher_core::isp::IspSession;
    use avrflasher_core::status::{Status, StatusSink};
    use avrflasher_core::{Error, Result};

    #[derive(Default)]
    struct Recorder {
        statuses: Vec<Status>,
        ticks: u32,
        phases: Vec<Pass>,
    }

    impl StatusSink for Recorder {
        fn report(&mut self, status: Status) {
            self.statuses.push(status);
        }

        fn progress(&mut self) {
            self.ticks += 1;
        }

        fn phase(&mut self, pass: Pass) {
            self.phases.push(pass);
        }
    }

    /// Storage that goes away after a number of opens, or refuses removal
    struct FlakyCard<'a> {
        inner: MemorySource<'a>,
        opens_left: u32,
        removable: bool,
    }

    impl<'a> FlakyCard<'a> {
        fn new(text: &'a str) -> Self {
            Self {
                inner: MemorySource::new("fw.hex", text),
                opens_left: u32::MAX,
                removable: true,
            }
        }
    }

    impl FirmwareSource for FlakyCard<'_> {
        fn open(&mut self, name: &str) -> Result<()> {
            if self.opens_left == 0 {
                return Err(Error::NoStorage);
            }
            self.opens_left -= 1;
            self.inner.open(name)
        }

        fn read_line(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
            self.inner.read_line(buf)
        }

        fn remove(&mut self, name: &str) -> Result<()> {
            if !self.removable {
                return Err(Error::IoError);
            }
            self.inner.remove(name)
        }
    }

    fn hex_line(kind: u8, offset: u16, data: &[u8]) -> String {
        let mut bytes = vec![data.len() as u8, (offset >> 8) as u8, offset as u8, kind];
        bytes.extend_from_slice(data);
        let sum = bytes.iter().fold(0u8, |a, &b| a.wrapping_add(b));
        bytes.push(sum.wrapping_neg());
        let mut line = String::from(":");
        for b in bytes {
            line.push_str(&format!("{:02X}", b));
        }
        line.push_str("\r\n");
        line
    }

    fn image(records: &[(u16, &[u8])]) -> String {
        let mut text = String::new();
        for (offset, data) in records {
            text.push_str(&hex_line(0, *offset, data));
        }
        text.push_str(&hex_line(1, 0, &[]));
        text
    }

    fn session_for(name: &str) -> IspSession<DummyAvr> {
        let chip = chip::find_by_name(name).unwrap();
        IspSession::new(DummyAvr::for_chip(chip), IspTiming::no_delay())
    }

    struct Outcome {
        status: Status,
        removed: bool,
        opens: u32,
        sink: Recorder,
    }

    fn run(session: &mut IspSession<DummyAvr>, text: &str) -> Outcome {
        let mut source = MemorySource::new("fw.hex", text);
        let mut sink = Recorder::default();
        let status = flash::attempt(
            session,
            &mut source,
            &mut sink,
            "fw.hex",
            &FlashOptions::default(),
        );
        Outcome {
            status,
            removed: source.is_removed(),
            opens: source.opens(),
            sink,
        }
    }

    #[test]
    fn test_handshake_and_signature() {
        let mut session = session_for("ATmega328P");
        session.enter().unwrap();
        assert!(session.pins().is_programming());
        assert!(session.pins().is_bus_owned());
        assert_eq!(session.pins().frames()[0], [0xAC, 0x53, 0x00, 0x00]);

        let found = session.read_signature().unwrap();
        assert_eq!(found.name, "ATmega328P");
        assert_eq!(session.pins().extended_loads(), &[0]);

        let fuses = session.read_fuses().unwrap();
        assert_eq!(fuses, [0x62, 0xD9, 0xFF, 0xFF, 0xA5]);

        session.exit();
        assert!(!session.pins().is_bus_owned());
    }

    #[test]
    fn test_handshake_retry_bound() {
        let chip = chip::find_by_name("ATmega328P").unwrap();

        let config = DummyConfig {
            failed_handshakes: 9,
            ..DummyConfig::for_chip(chip)
        };
        let mut session = IspSession::new(DummyAvr::new(config), IspTiming::no_delay());
        assert_eq!(session.enter(), Ok(()));
        assert_eq!(session.pins().resets(), 10);

        let config = DummyConfig {
            failed_handshakes: 10,
            ..DummyConfig::for_chip(chip)
        };
        let mut session = IspSession::new(DummyAvr::new(config), IspTiming::no_delay());
        assert_eq!(session.enter(), Err(Error::CannotEnterProgrammingMode));
        assert_eq!(session.pins().resets(), 10);
    }

    #[test]
    fn test_flash_small_image() {
        // ATmega8A: 8 KiB flash, 64 byte pages, timed writes
        let chip = chip::find_by_name("ATmega8A").unwrap();
        let config = DummyConfig {
            fuses: [0xE1, 0xD8, 0xFF, 0xFF, 0xA5],
            ..DummyConfig::for_chip(chip)
        };
        let mut session = IspSession::new(DummyAvr::new(config), IspTiming::no_delay());

        let data: Vec<u8> = (0u8..16).collect();
        let outcome = run(&mut session, &image(&[(0, &data[..])]));
        assert_eq!(outcome.status, Status::FlashedOk);
        assert_eq!(outcome.sink.statuses, [Status::FlashedOk]);
        assert!(outcome.removed);
        assert_eq!(outcome.opens, 3);

        let target = session.pins();
        assert_eq!(&target.flash()[..16], &data[..]);
        assert!(target.flash()[16..].iter().all(|&b| b == 0xFF));
        assert_eq!(target.commits(), &[0]);
        assert_eq!(target.erases(), 1);
        // only BOOTRST changed
        assert_eq!(target.fuse_writes(), &[(FuseByte::High, 0xD9)]);
        // timed-write chips are never polled
        assert_eq!(target.polls(), 0);
        assert!(!target.is_bus_owned());
    }

    #[test]
    fn test_small_image_report() {
        let mut session = session_for("ATmega8A");
        session.enter().unwrap();
        session.read_signature().unwrap();
        session.read_fuses().unwrap();

        let data: Vec<u8> = (0u8..16).collect();
        let text = image(&[(0, &data[..])]);
        let mut source = MemorySource::new("fw.hex", &text);
        let mut sink = Recorder::default();
        let report = flash::flash_firmware(
            &mut session,
            &mut source,
            &mut sink,
            "fw.hex",
            &FlashOptions::default(),
        )
        .unwrap();

        assert_eq!(report.lowest, Some(0));
        assert_eq!(report.highest, Some(15));
        assert_eq!(report.bytes, 16);
        assert_eq!(report.pages, 1);
        assert_eq!(sink.phases, [Pass::Check, Pass::Write, Pass::Verify]);
        assert!(sink.statuses.is_empty());
    }

    #[test]
    fn test_card_pulled_before_write_keeps_target() {
        let mut session = session_for("ATtiny85");
        session.pins_mut().flash_mut()[0x100] = 0x42;

        let text = image(&[(0, &[1, 2, 3, 4][..])]);
        let mut card = FlakyCard::new(&text);
        card.opens_left = 1;
        let mut sink = Recorder::default();
        let status = flash::attempt(
            &mut session,
            &mut card,
            &mut sink,
            "fw.hex",
            &FlashOptions::default(),
        );

        assert_eq!(status, Status::NoStorage);
        assert_eq!(session.pins().erases(), 0);
        assert_eq!(session.pins().flash()[0x100], 0x42);
        assert_eq!(sink.phases, [Pass::Check]);
    }

    #[test]
    fn test_read_only_card_still_flashes() {
        let mut session = session_for("ATtiny85");
        let text = image(&[(0, &[1, 2, 3, 4][..])]);
        let mut card = FlakyCard::new(&text);
        card.removable = false;
        let status = flash::attempt(
            &mut session,
            &mut card,
            &mut Recorder::default(),
            "fw.hex",
            &FlashOptions::default(),
        );

        assert_eq!(status, Status::FlashedOk);
        assert!(!card.inner.is_removed());
        assert_eq!(&session.pins().flash()[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_flash_multi_page_with_polling() {
        let mut session = session_for("ATmega328P");
        let data: Vec<u8> = (0..50).map(|i| i as u8 ^ 0x5A).collect();
        let outcome = run(&mut session, &image(&[(100, &data[..16]), (116, &data[16..])]));
        assert_eq!(outcome.status, Status::FlashedOk);

        let target = session.pins();
        assert_eq!(&target.flash()[100..150], &data[..]);
        assert_eq!(target.commits(), &[0, 128]);
        assert!(target.polls() > 0);
        // one tick per page committed, one per page change while verifying
        assert_eq!(outcome.sink.ticks, 3);
    }

    #[test]
    fn test_boot_loader_image() {
        let mut session = session_for("ATmega328P");
        let data = [0xAA; 16];
        let outcome = run(&mut session, &image(&[(0x7E00, &data[..])]));
        assert_eq!(outcome.status, Status::FlashedOk);
        // BOOTSZ = 3, BOOTRST programmed
        assert_eq!(session.pins().fuse_writes(), &[(FuseByte::High, 0xDE)]);
    }

    #[test]
    fn test_bad_start_address_before_erase() {
        let mut session = session_for("ATmega328P");
        session.pins_mut().flash_mut()[0] = 0x12;
        let outcome = run(&mut session, &image(&[(0x1234, &[1, 2, 3][..])]));
        assert_eq!(outcome.status, Status::BadStartAddress);
        assert_eq!(session.pins().erases(), 0);
        assert_eq!(session.pins().flash()[0], 0x12);
        assert!(!outcome.removed);
    }

    #[test]
    fn test_missing_end_of_file() {
        let mut session = session_for("ATmega328P");
        let text = hex_line(0, 0, &[1, 2, 3, 4]);
        let outcome = run(&mut session, &text);
        assert_eq!(outcome.status, Status::NoEndOfFileRecord);
        assert_eq!(outcome.sink.statuses, [Status::NoEndOfFileRecord]);
        assert_eq!(session.pins().erases(), 0);
    }

    #[test]
    fn test_syntax_error_aborts_before_erase() {
        let mut session = session_for("ATmega328P");
        let text = format!("{}:0200000000FF\r\n{}", hex_line(0, 0, &[1]), hex_line(1, 0, &[]));
        assert_eq!(run(&mut session, &text).status, Status::BadChecksum);
        assert_eq!(session.pins().erases(), 0);
        assert!(session.pins().commits().is_empty());
    }

    #[test]
    fn test_file_too_large() {
        let mut session = session_for("ATtiny13A");
        // ESA 0x1000 puts the data at 64 KiB on a 1 KiB part
        let text = format!(
            "{}{}{}",
            hex_line(2, 0, &[0x10, 0x00]),
            hex_line(0, 0, &[1, 2]),
            hex_line(1, 0, &[])
        );
        assert_eq!(run(&mut session, &text).status, Status::FileTooLargeForFlash);
        assert_eq!(session.pins().erases(), 0);
    }

    #[test]
    fn test_image_ending_at_flash_end() {
        let mut session = session_for("ATtiny13A");
        let outcome = run(&mut session, &image(&[(1024 - 4, &[1, 2, 3, 4][..])]));
        assert_eq!(outcome.status, Status::FlashedOk);
        assert_eq!(&session.pins().flash()[1020..], &[1, 2, 3, 4]);
        // no boot fuse on this part
        assert!(session.pins().fuse_writes().is_empty());
    }

    #[test]
    fn test_extended_address() {
        let mut session = session_for("ATmega2560");
        // ESA payload 0x20 -> base 0x20000, word address 0x10000
        let text = format!(
            "{}{}{}",
            hex_line(0, 0, &[0x0C, 0x94]),
            hex_line(2, 0, &[0x20, 0x00]),
            hex_line(0, 0x0010, &[1, 2, 3, 4]),
        ) + &hex_line(1, 0, &[]);
        assert_eq!(run(&mut session, &text).status, Status::FlashedOk);

        let target = session.pins();
        assert_eq!(&target.flash()[0x20010..0x20014], &[1, 2, 3, 4]);
        assert_eq!(&target.flash()[..2], &[0x0C, 0x94]);
        assert_eq!(target.commits(), &[0, 0x20000]);
        // every switch is loaded once: signature, write pass, verify pass
        assert_eq!(target.extended_loads(), &[0, 1, 0, 1]);
    }

    #[test]
    fn test_verify_counts_every_mismatch() {
        let mut session = session_for("ATmega328P");
        session.pins_mut().add_read_fault(3);
        session.pins_mut().add_read_fault(9);
        let text = image(&[(0, &[0u8; 16][..])]);
        let mut source = MemorySource::new("fw.hex", &text);
        let mut sink = Recorder::default();

        session.enter().unwrap();
        session.read_signature().unwrap();
        session.read_fuses().unwrap();
        let result = flash::flash_firmware(
            &mut session,
            &mut source,
            &mut sink,
            "fw.hex",
            &FlashOptions::default(),
        );
        assert_eq!(result, Err(Error::VerificationError { errors: 2 }));
        assert!(session.pins().fuse_writes().is_empty());
        assert!(!source.is_removed());
    }

    #[test]
    fn test_keep_file_when_asked() {
        let mut session = session_for("ATmega328P");
        let text = image(&[(0, &[1, 2, 3, 4][..])]);
        let mut source = MemorySource::new("fw.hex", &text);
        let status = flash::attempt(
            &mut session,
            &mut source,
            &mut avrflasher_core::status::NoStatus,
            "fw.hex",
            &FlashOptions {
                remove_on_success: false,
            },
        );
        assert_eq!(status, Status::FlashedOk);
        assert!(!source.is_removed());
    }

    #[test]
    fn test_unrecognized_signature() {
        let config = DummyConfig {
            signature: [0x1E, 0x00, 0x00],
            ..DummyConfig::default()
        };
        let mut session = IspSession::new(DummyAvr::new(config), IspTiming::no_delay());
        let outcome = run(&mut session, &image(&[(0, &[1][..])]));
        assert_eq!(outcome.status, Status::UnrecognizedSignature);
        assert_eq!(outcome.opens, 0);
        assert!(!session.pins().is_bus_owned());
    }

    #[test]
    fn test_missing_file() {
        let mut session = session_for("ATmega328P");
        let mut source = MemorySource::new("other.hex", "");
        let mut sink = Recorder::default();
        let status = flash::attempt(
            &mut session,
            &mut source,
            &mut sink,
            "fw.hex",
            &FlashOptions::default(),
        );
        assert_eq!(status, Status::CannotOpenFile);
    }

    #[test]
    fn test_empty_image() {
        let mut session = session_for("ATmega328P");
        let outcome = run(&mut session, &hex_line(1, 0, &[]));
        assert_eq!(outcome.status, Status::BadStartAddress);
    }

    #[test]
    fn test_unresponsive_target() {
        let chip = chip::find_by_name("ATmega328P").unwrap();
        let config = DummyConfig {
            busy_polls: u32::MAX,
            ..DummyConfig::for_chip(chip)
        };
        let timing = IspTiming {
            poll_limit: 50,
            ..IspTiming::no_delay()
        };
        let mut session = IspSession::new(DummyAvr::new(config), timing);
        let outcome = run(&mut session, &image(&[(0, &[1][..])]));
        assert_eq!(outcome.status, Status::DeviceUnresponsive);
        assert_eq!(session.pins().polls(), 50);
    }
}
