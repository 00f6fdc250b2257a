//! Error types for avrflasher-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate. Every variant maps onto exactly one
//! [`Status`](crate::status::Status) code reported to the operator.

use core::fmt;

/// Reasons a single Intel-HEX line is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexError {
    /// Line does not start with ':'
    NotColonPrefixed,
    /// A character pair after the colon is not two hex digits
    InvalidHexDigits,
    /// Line decodes to more bytes than a record may hold
    TooLong,
    /// Line decodes to fewer bytes than length/address/type/checksum
    TooShort,
    /// Two's complement checksum does not match the last byte
    BadChecksum,
    /// Declared data length disagrees with the decoded byte count
    UnexpectedLength,
    /// Record type is not one of 00-05
    UnknownRecordType(u8),
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Storage errors
    /// Removable storage is not present or cannot be mounted
    NoStorage,
    /// The firmware file cannot be opened
    CannotOpenFile,
    /// A line in the firmware file exceeds the line buffer
    LineTooLong,

    // Syntax errors
    /// A HEX line failed to parse
    Hex(HexError),
    /// The file ended without an End-Of-File record
    NoEndOfFileRecord,

    // Capacity errors
    /// The image extends beyond the target's flash memory
    FileTooLargeForFlash {
        /// Highest byte address touched by the image
        highest: u32,
        /// Flash size of the resolved chip in bytes
        flash_size: u32,
    },

    // Protocol errors
    /// The handshake never returned the programming acknowledge
    CannotEnterProgrammingMode,
    /// No chip has been resolved for this session
    NoSignature,
    /// The target reported a signature that is not in the catalog
    UnrecognizedSignature([u8; 3]),
    /// The target never cleared its busy bit
    DeviceUnresponsive,
    /// An operation was issued while the session is idle
    NotInProgrammingMode,

    // Programming errors
    /// The image start address selects no valid boot partition
    BadStartAddress(u32),
    /// Read-back after programming found mismatching bytes
    VerificationError {
        /// Number of bytes that did not match
        errors: u32,
    },

    /// Storage backend reported an I/O failure while reading
    IoError,
}

impl fmt::Display for HexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotColonPrefixed => write!(f, "line does not start with a colon"),
            Self::InvalidHexDigits => write!(f, "invalid hex digits"),
            Self::TooLong => write!(f, "record too long"),
            Self::TooShort => write!(f, "line too short to be a record"),
            Self::BadChecksum => write!(f, "bad checksum"),
            Self::UnexpectedLength => write!(f, "record length does not match its data"),
            Self::UnknownRecordType(t) => write!(f, "unknown record type 0x{:02X}", t),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoStorage => write!(f, "storage not available"),
            Self::CannotOpenFile => write!(f, "cannot open firmware file"),
            Self::LineTooLong => write!(f, "line too long"),
            Self::Hex(e) => write!(f, "HEX parse error: {}", e),
            Self::NoEndOfFileRecord => write!(f, "no end-of-file record"),
            Self::FileTooLargeForFlash {
                highest,
                flash_size,
            } => write!(
                f,
                "image ends at 0x{:06X} but flash is only {} bytes",
                highest, flash_size
            ),
            Self::CannotEnterProgrammingMode => write!(f, "cannot enter programming mode"),
            Self::NoSignature => write!(f, "target chip signature not resolved"),
            Self::UnrecognizedSignature(sig) => write!(
                f,
                "unrecognized signature {:02X} {:02X} {:02X}",
                sig[0], sig[1], sig[2]
            ),
            Self::DeviceUnresponsive => write!(f, "target did not become ready"),
            Self::NotInProgrammingMode => write!(f, "target is not in programming mode"),
            Self::BadStartAddress(addr) => write!(f, "bad start address 0x{:06X}", addr),
            Self::VerificationError { errors } => {
                write!(f, "verification failed: {} byte(s) differ", errors)
            }
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<HexError> for Error {
    fn from(e: HexError) -> Self {
        Error::Hex(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HexError {}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
