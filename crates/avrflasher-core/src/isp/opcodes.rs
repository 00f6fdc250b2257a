//! AVR serial programming instruction set
//!
//! Every instruction is a 4-byte frame. Writes that change non-volatile
//! state (erase, fuses, lock bits) are prefixed with [`PROGRAM_ENABLE`].

/// Programming enable, first byte of the handshake and of write instructions
pub const PROGRAM_ENABLE: u8 = 0xAC;
/// Second handshake byte, echoed back on the third transfer when in sync
pub const PROGRAM_ACK: u8 = 0x53;

/// Chip erase (after PROGRAM_ENABLE)
pub const CHIP_ERASE: u8 = 0x80;
/// Write lock bits (after PROGRAM_ENABLE)
pub const WRITE_LOCK_BYTE: u8 = 0xE0;
/// Write low fuse (after PROGRAM_ENABLE)
pub const WRITE_LOW_FUSE: u8 = 0xA0;
/// Write high fuse (after PROGRAM_ENABLE)
pub const WRITE_HIGH_FUSE: u8 = 0xA8;
/// Write extended fuse (after PROGRAM_ENABLE)
pub const WRITE_EXTENDED_FUSE: u8 = 0xA4;

/// Poll RDY/BSY, bit 0 of the answer is set while busy
pub const POLL_READY: u8 = 0xF0;

/// Read signature byte, index in the third byte
pub const READ_SIGNATURE: u8 = 0x30;
/// Read oscillator calibration byte
pub const READ_CALIBRATION: u8 = 0x38;
/// Read low fuse / extended fuse (second byte 0x00 / 0x08)
pub const READ_LOW_FUSE: u8 = 0x50;
/// Read high fuse / lock bits (second byte 0x08 / 0x00)
pub const READ_HIGH_FUSE: u8 = 0x58;
/// Read extended fuse, shares the opcode with the low fuse
pub const READ_EXTENDED_FUSE: u8 = 0x50;
/// Read lock bits, shares the opcode with the high fuse
pub const READ_LOCK_BYTE: u8 = 0x58;

/// Read program memory, OR with [`HIGH_BYTE`] for the odd byte of a word
pub const READ_PROGRAM_MEMORY: u8 = 0x20;
/// Load program memory page buffer, OR with [`HIGH_BYTE`] for the odd byte
pub const LOAD_PROGRAM_MEMORY: u8 = 0x40;
/// Write program memory page
pub const WRITE_PROGRAM_MEMORY: u8 = 0x4C;
/// Load extended address byte (bits 16-23 of the word address)
pub const LOAD_EXTENDED_ADDRESS: u8 = 0x4D;

/// Opcode bit selecting the high byte of a flash word
pub const HIGH_BYTE: u8 = 0x08;

/// Busy flag in the POLL_READY answer
pub const RDY_BSY: u8 = 0x01;

/// Fuse value meaning "leave this fuse alone"
///
/// 0xFF is also a legal fuse pattern (every bit unprogrammed); a request to
/// program all ones is indistinguishable from no request and is skipped.
pub const NO_FUSE_CHANGE: u8 = 0xFF;
