//! Target chip type definitions

use core::fmt;

/// Fuse, lock and calibration bytes of an AVR, in cache order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuseByte {
    /// Low fuse byte
    Low = 0,
    /// High fuse byte
    High = 1,
    /// Extended fuse byte
    Extended = 2,
    /// Lock bits
    Lock = 3,
    /// Oscillator calibration byte (read only)
    Calibration = 4,
}

impl FuseByte {
    /// Number of entries in a fuse cache
    pub const COUNT: usize = 5;

    /// All bytes, in the order they are read
    pub const ALL: [FuseByte; Self::COUNT] = [
        FuseByte::Low,
        FuseByte::High,
        FuseByte::Extended,
        FuseByte::Lock,
        FuseByte::Calibration,
    ];

    /// Index into the fuse cache
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FuseByte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low fuse",
            Self::High => "high fuse",
            Self::Extended => "extended fuse",
            Self::Lock => "lock byte",
            Self::Calibration => "calibration byte",
        };
        f.write_str(s)
    }
}

/// Target chip definition
///
/// Describes everything the programmer needs to know about one AVR part:
/// how to recognise it and how its flash and boot partition are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipSignature {
    /// Signature bytes as returned by the read-signature instruction
    pub signature: [u8; 3],
    /// Part name (e.g., "ATmega328P")
    pub name: &'static str,
    /// Total flash size in bytes
    pub flash_size: u32,
    /// Smallest boot partition in bytes, 0 when there is no boot section
    pub boot_size: u32,
    /// Flash page size in bytes
    pub page_size: u32,
    /// Fuse byte carrying BOOTRST/BOOTSZ, if the chip has a boot section
    pub boot_fuse: Option<FuseByte>,
    /// Busy flag cannot be polled; wait a fixed delay after writes instead
    pub timed_writes: bool,
}

impl ChipSignature {
    /// Create a chip definition without a boot section
    pub const fn new(signature: [u8; 3], name: &'static str, flash_size: u32, page_size: u32) -> Self {
        Self {
            signature,
            name,
            flash_size,
            boot_size: 0,
            page_size,
            boot_fuse: None,
            timed_writes: false,
        }
    }

    /// Add a boot section of `boot_size` bytes selected through `fuse`
    pub const fn with_boot(mut self, boot_size: u32, fuse: FuseByte) -> Self {
        self.boot_size = boot_size;
        self.boot_fuse = Some(fuse);
        self
    }

    /// Mark the chip as needing timed writes
    pub const fn with_timed_writes(mut self) -> Self {
        self.timed_writes = true;
        self
    }

    /// Mask that clears the in-page offset of a byte address
    pub const fn page_mask(&self) -> u32 {
        !(self.page_size - 1)
    }

    /// Base address of the page containing `addr`
    pub const fn page_of(&self, addr: u32) -> u32 {
        addr & self.page_mask()
    }

    /// Check if this chip matches the given signature bytes
    pub fn matches(&self, signature: &[u8; 3]) -> bool {
        self.signature == *signature
    }
}

impl fmt::Display for ChipSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:02X} {:02X} {:02X}, {} bytes flash, {} byte pages)",
            self.name,
            self.signature[0],
            self.signature[1],
            self.signature[2],
            self.flash_size,
            self.page_size
        )
    }
}
