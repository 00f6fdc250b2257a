//! Boot fuse selection
//!
//! On parts with a boot loader section the fuse byte named by
//! [`ChipSignature::boot_fuse`] holds BOOTRST (bit 0) and BOOTSZ1:0
//! (bits 2:1). A programmed bit reads as 0.

use bitflags::bitflags;

use crate::chip::{ChipSignature, FuseByte};
use crate::error::{Error, Result};

bitflags! {
    /// Boot loader bits of the boot fuse byte
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BootFuseBits: u8 {
        /// Unprogrammed: reset vector at 0; programmed: jump to boot section
        const BOOTRST = 1 << 0;
        /// Boot size select, low bit
        const BOOTSZ0 = 1 << 1;
        /// Boot size select, high bit
        const BOOTSZ1 = 1 << 2;
    }
}

/// Boot size codes for boot sections of 1, 2, 4 and 8 times the base size
const BOOT_SIZES: [(u32, u8); 4] = [(1, 3), (2, 2), (4, 1), (8, 0)];

/// Compute the boot fuse for an image whose first byte is at `lowest`
///
/// `current` is the fuse value read from the target. Returns the fuse byte
/// and the value to program, or `None` when the chip has no boot fuse.
///
/// - An image starting at 0 is an application: BOOTRST is left unprogrammed
///   so the chip starts at the reset vector.
/// - Any other start must be the base of one of the four boot section sizes;
///   BOOTSZ selects that size and BOOTRST is programmed.
/// - An image without data has no start address and is rejected on parts
///   with a boot fuse.
pub fn select_boot_fuse(
    chip: &ChipSignature,
    current: u8,
    lowest: Option<u32>,
) -> Result<Option<(FuseByte, u8)>> {
    let Some(fuse) = chip.boot_fuse else {
        return Ok(None);
    };

    let Some(lowest) = lowest else {
        return Err(Error::BadStartAddress(u32::MAX));
    };

    let bits = BootFuseBits::from_bits_retain(current);
    if lowest == 0 {
        return Ok(Some((fuse, (bits | BootFuseBits::BOOTRST).bits())));
    }

    let code = BOOT_SIZES
        .iter()
        .find(|&&(factor, _)| {
            chip.boot_size
                .checked_mul(factor)
                .and_then(|size| chip.flash_size.checked_sub(size))
                == Some(lowest)
        })
        .map(|&(_, code)| code)
        .ok_or(Error::BadStartAddress(lowest))?;

    let value = (bits - BootFuseBits::all()).bits() | (code << 1);
    log::debug!(
        "boot section at 0x{:06X}, BOOTSZ={}, {} = 0x{:02X}",
        lowest,
        code,
        fuse,
        value
    );
    Ok(Some((fuse, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHIP: ChipSignature = ChipSignature::new([0x1E, 0x95, 0x0F], "test", 32768, 128)
        .with_boot(512, FuseByte::High);

    #[test]
    fn test_application_image() {
        assert_eq!(
            select_boot_fuse(&CHIP, 0xD8, Some(0)),
            Ok(Some((FuseByte::High, 0xD9)))
        );
        // already unprogrammed
        assert_eq!(
            select_boot_fuse(&CHIP, 0xD9, Some(0)),
            Ok(Some((FuseByte::High, 0xD9)))
        );
    }

    #[test]
    fn test_boot_sizes() {
        assert_eq!(
            select_boot_fuse(&CHIP, 0xD9, Some(32256)),
            Ok(Some((FuseByte::High, 0xD8 | (3 << 1))))
        );
        assert_eq!(
            select_boot_fuse(&CHIP, 0xD9, Some(31744)),
            Ok(Some((FuseByte::High, 0xD8 | (2 << 1))))
        );
        assert_eq!(
            select_boot_fuse(&CHIP, 0xFF, Some(30720)),
            Ok(Some((FuseByte::High, 0xF8 | (1 << 1))))
        );
        assert_eq!(
            select_boot_fuse(&CHIP, 0xFF, Some(28672)),
            Ok(Some((FuseByte::High, 0xF8)))
        );
    }

    #[test]
    fn test_bad_start_address() {
        assert_eq!(
            select_boot_fuse(&CHIP, 0xD9, Some(12345)),
            Err(Error::BadStartAddress(12345))
        );
        assert_eq!(
            select_boot_fuse(&CHIP, 0xD9, None),
            Err(Error::BadStartAddress(u32::MAX))
        );
    }

    #[test]
    fn test_chip_without_boot_fuse() {
        let chip = ChipSignature::new([0x1E, 0x93, 0x0C], "tiny", 8192, 64);
        assert_eq!(select_boot_fuse(&chip, 0x62, Some(1234)), Ok(None));
        assert_eq!(select_boot_fuse(&chip, 0x62, None), Ok(None));
    }
}
