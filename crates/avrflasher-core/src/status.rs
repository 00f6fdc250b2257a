//! Operator status codes
//!
//! The jig has no display, only three LEDs. Every outcome of a programming
//! attempt is reduced to one [`Status`] and handed to a [`StatusSink`],
//! which decides how to render it (LED blinks, log lines, a buzzer...).

use core::fmt;

use crate::error::{Error, HexError};
use crate::flash::Pass;

/// Closed set of conditions the jig can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Storage card missing or unreadable
    NoStorage,
    /// Firmware file could not be opened
    CannotOpenFile,
    /// Line longer than the line buffer or record longer than 40 bytes
    LineTooLong,
    /// Line too short to hold a record
    LineTooShort,
    /// Line does not start with ':'
    LineNotColonPrefixed,
    /// Non-hex character where hex was expected
    InvalidHexDigits,
    /// Record checksum mismatch
    BadChecksum,
    /// Record length field disagrees with its data
    UnexpectedLength,
    /// Record type not known
    UnknownRecordType,
    /// File has no End-Of-File record
    NoEndOfFileRecord,
    /// Image does not fit into the target flash
    FileTooLargeForFlash,
    /// Target did not acknowledge programming enable
    CannotEnterProgrammingMode,
    /// No target chip was identified
    CannotFindSignature,
    /// Target signature is not in the catalog
    UnrecognizedSignature,
    /// Target stayed busy past the polling bound
    DeviceUnresponsive,
    /// Image start address selects no boot partition
    BadStartAddress,
    /// Read-back found mismatching bytes
    VerificationError,
    /// Programming and verification succeeded
    FlashedOk,
}

/// Status LEDs available on the jig
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Led {
    /// Red
    Error,
    /// Blue, toggled as progress indicator
    Working,
    /// Green
    Ready,
}

/// How a status is rendered on the LEDs
///
/// `times` blinks of `primary` (together with `secondary`, if any), the
/// burst repeated `repeat` times with a pause in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkPattern {
    /// LED that always blinks
    pub primary: Led,
    /// LED that blinks together with the primary one
    pub secondary: Option<Led>,
    /// Blinks per burst
    pub times: u8,
    /// Number of bursts
    pub repeat: u8,
}

impl BlinkPattern {
    const fn error(times: u8) -> Self {
        Self {
            primary: Led::Error,
            secondary: None,
            times,
            repeat: 5,
        }
    }

    const fn file(times: u8) -> Self {
        Self {
            primary: Led::Error,
            secondary: Some(Led::Working),
            times,
            repeat: 5,
        }
    }
}

impl Status {
    /// LED pattern for this status
    ///
    /// Storage and target problems blink the error LED alone, problems with
    /// the file contents blink error and working together.
    pub const fn blink_pattern(self) -> BlinkPattern {
        match self {
            Self::NoStorage => BlinkPattern::error(1),
            Self::CannotOpenFile => BlinkPattern::error(2),

            Self::LineTooLong => BlinkPattern::file(1),
            Self::LineTooShort => BlinkPattern::file(2),
            Self::LineNotColonPrefixed => BlinkPattern::file(3),
            Self::InvalidHexDigits => BlinkPattern::file(4),
            Self::BadChecksum => BlinkPattern::file(5),
            Self::UnexpectedLength => BlinkPattern::file(6),
            Self::UnknownRecordType => BlinkPattern::file(7),
            Self::NoEndOfFileRecord => BlinkPattern::file(8),
            Self::FileTooLargeForFlash => BlinkPattern::file(9),

            Self::CannotEnterProgrammingMode => BlinkPattern::error(3),
            Self::CannotFindSignature => BlinkPattern::error(5),
            Self::UnrecognizedSignature => BlinkPattern::error(6),
            Self::BadStartAddress => BlinkPattern::error(7),
            Self::VerificationError => BlinkPattern::error(8),
            Self::DeviceUnresponsive => BlinkPattern::error(9),

            Self::FlashedOk => BlinkPattern {
                primary: Led::Ready,
                secondary: None,
                times: 3,
                repeat: 10,
            },
        }
    }

    /// Whether this status reports a failure
    pub fn is_error(self) -> bool {
        self != Self::FlashedOk
    }
}

impl From<HexError> for Status {
    fn from(e: HexError) -> Self {
        match e {
            HexError::NotColonPrefixed => Self::LineNotColonPrefixed,
            HexError::InvalidHexDigits => Self::InvalidHexDigits,
            HexError::TooLong => Self::LineTooLong,
            HexError::TooShort => Self::LineTooShort,
            HexError::BadChecksum => Self::BadChecksum,
            HexError::UnexpectedLength => Self::UnexpectedLength,
            HexError::UnknownRecordType(_) => Self::UnknownRecordType,
        }
    }
}

impl From<Error> for Status {
    fn from(e: Error) -> Self {
        match e {
            Error::NoStorage => Self::NoStorage,
            Error::CannotOpenFile | Error::IoError => Self::CannotOpenFile,
            Error::LineTooLong => Self::LineTooLong,
            Error::Hex(h) => h.into(),
            Error::NoEndOfFileRecord => Self::NoEndOfFileRecord,
            Error::FileTooLargeForFlash { .. } => Self::FileTooLargeForFlash,
            Error::CannotEnterProgrammingMode | Error::NotInProgrammingMode => {
                Self::CannotEnterProgrammingMode
            }
            Error::NoSignature => Self::CannotFindSignature,
            Error::UnrecognizedSignature(_) => Self::UnrecognizedSignature,
            Error::DeviceUnresponsive => Self::DeviceUnresponsive,
            Error::BadStartAddress(_) => Self::BadStartAddress,
            Error::VerificationError { .. } => Self::VerificationError,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NoStorage => "no storage card",
            Self::CannotOpenFile => "cannot open file",
            Self::LineTooLong => "line too long",
            Self::LineTooShort => "line too short",
            Self::LineNotColonPrefixed => "line does not start with a colon",
            Self::InvalidHexDigits => "invalid hex digits",
            Self::BadChecksum => "bad checksum",
            Self::UnexpectedLength => "line not expected length",
            Self::UnknownRecordType => "unknown record type",
            Self::NoEndOfFileRecord => "no end-of-file record",
            Self::FileTooLargeForFlash => "file too large for flash",
            Self::CannotEnterProgrammingMode => "cannot enter programming mode",
            Self::CannotFindSignature => "cannot find signature",
            Self::UnrecognizedSignature => "unrecognized signature",
            Self::DeviceUnresponsive => "device unresponsive",
            Self::BadStartAddress => "bad start address",
            Self::VerificationError => "verification error",
            Self::FlashedOk => "flashed OK",
        };
        f.write_str(s)
    }
}

/// Receiver for operator feedback
///
/// Reports are fire-and-forget; implementations must not fail.
pub trait StatusSink {
    /// Render the final outcome of an attempt
    fn report(&mut self, status: Status);

    /// Called periodically while a long pass is running
    fn progress(&mut self) {}

    /// Called when a pass over the firmware file starts
    fn phase(&mut self, _pass: Pass) {}
}

impl<T: StatusSink + ?Sized> StatusSink for &mut T {
    fn report(&mut self, status: Status) {
        (**self).report(status)
    }

    fn progress(&mut self) {
        (**self).progress()
    }

    fn phase(&mut self, pass: Pass) {
        (**self).phase(pass)
    }
}

/// An absent sink discards everything
impl<T: StatusSink> StatusSink for Option<T> {
    fn report(&mut self, status: Status) {
        if let Some(sink) = self {
            sink.report(status);
        }
    }

    fn progress(&mut self) {
        if let Some(sink) = self {
            sink.progress();
        }
    }

    fn phase(&mut self, pass: Pass) {
        if let Some(sink) = self {
            sink.phase(pass);
        }
    }
}

/// A sink that discards everything
pub struct NoStatus;

impl StatusSink for NoStatus {
    fn report(&mut self, _status: Status) {}
}
