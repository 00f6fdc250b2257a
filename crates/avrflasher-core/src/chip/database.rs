//! Static catalog of supported target chips
//!
//! Data taken from the Atmel/Microchip datasheets. Adding a part only needs
//! a new entry here.

use super::types::{ChipSignature, FuseByte};

const KIB: u32 = 1024;

/// All chips the jig can program
pub static CHIPS: &[ChipSignature] = &[
    // ATtiny84 family
    ChipSignature::new([0x1E, 0x91, 0x0B], "ATtiny24", 2 * KIB, 32),
    ChipSignature::new([0x1E, 0x92, 0x07], "ATtiny44", 4 * KIB, 64),
    ChipSignature::new([0x1E, 0x93, 0x0C], "ATtiny84", 8 * KIB, 64),
    // ATtiny85 family
    ChipSignature::new([0x1E, 0x91, 0x08], "ATtiny25", 2 * KIB, 32),
    ChipSignature::new([0x1E, 0x92, 0x06], "ATtiny45", 4 * KIB, 64),
    ChipSignature::new([0x1E, 0x93, 0x0B], "ATtiny85", 8 * KIB, 64),
    // ATmega328 family
    ChipSignature::new([0x1E, 0x92, 0x0A], "ATmega48PA", 4 * KIB, 64),
    ChipSignature::new([0x1E, 0x93, 0x0F], "ATmega88PA", 8 * KIB, 128)
        .with_boot(256, FuseByte::Extended),
    ChipSignature::new([0x1E, 0x94, 0x0B], "ATmega168PA", 16 * KIB, 128)
        .with_boot(256, FuseByte::Extended),
    ChipSignature::new([0x1E, 0x95, 0x0F], "ATmega328P", 32 * KIB, 128)
        .with_boot(512, FuseByte::High),
    // ATmega644 family
    ChipSignature::new([0x1E, 0x94, 0x0A], "ATmega164P", 16 * KIB, 128)
        .with_boot(256, FuseByte::High),
    ChipSignature::new([0x1E, 0x95, 0x08], "ATmega324P", 32 * KIB, 128)
        .with_boot(512, FuseByte::High),
    ChipSignature::new([0x1E, 0x96, 0x0A], "ATmega644P", 64 * KIB, 256)
        .with_boot(KIB, FuseByte::High),
    // ATmega2560 family
    ChipSignature::new([0x1E, 0x96, 0x08], "ATmega640", 64 * KIB, 256)
        .with_boot(KIB, FuseByte::High),
    ChipSignature::new([0x1E, 0x97, 0x03], "ATmega1280", 128 * KIB, 256)
        .with_boot(KIB, FuseByte::High),
    ChipSignature::new([0x1E, 0x97, 0x04], "ATmega1281", 128 * KIB, 256)
        .with_boot(KIB, FuseByte::High),
    ChipSignature::new([0x1E, 0x98, 0x01], "ATmega2560", 256 * KIB, 256)
        .with_boot(KIB, FuseByte::High),
    ChipSignature::new([0x1E, 0x98, 0x02], "ATmega2561", 256 * KIB, 256)
        .with_boot(KIB, FuseByte::High),
    // AT90USB family
    ChipSignature::new([0x1E, 0x93, 0x82], "AT90USB82", 8 * KIB, 128)
        .with_boot(512, FuseByte::High),
    ChipSignature::new([0x1E, 0x94, 0x82], "AT90USB162", 16 * KIB, 128)
        .with_boot(512, FuseByte::High),
    // ATmega32U2 family
    ChipSignature::new([0x1E, 0x93, 0x89], "ATmega8U2", 8 * KIB, 128)
        .with_boot(512, FuseByte::High),
    ChipSignature::new([0x1E, 0x94, 0x89], "ATmega16U2", 16 * KIB, 128)
        .with_boot(512, FuseByte::High),
    ChipSignature::new([0x1E, 0x95, 0x8A], "ATmega32U2", 32 * KIB, 128)
        .with_boot(512, FuseByte::High),
    // ATmega32U4 family, the datasheet's 128 word page size is wrong
    ChipSignature::new([0x1E, 0x94, 0x88], "ATmega16U4", 16 * KIB, 128)
        .with_boot(512, FuseByte::High),
    ChipSignature::new([0x1E, 0x95, 0x87], "ATmega32U4", 32 * KIB, 128)
        .with_boot(512, FuseByte::High),
    // ATmega1284P family
    ChipSignature::new([0x1E, 0x97, 0x05], "ATmega1284P", 128 * KIB, 256)
        .with_boot(KIB, FuseByte::High),
    // ATtiny4313 family
    ChipSignature::new([0x1E, 0x91, 0x0A], "ATtiny2313A", 2 * KIB, 32),
    ChipSignature::new([0x1E, 0x92, 0x0D], "ATtiny4313", 4 * KIB, 64),
    // ATtiny13 family
    ChipSignature::new([0x1E, 0x90, 0x07], "ATtiny13A", KIB, 32),
    // ATmega8A family
    ChipSignature::new([0x1E, 0x93, 0x07], "ATmega8A", 8 * KIB, 64)
        .with_boot(256, FuseByte::High)
        .with_timed_writes(),
    // ATmega64RFR2 family
    ChipSignature::new([0x1E, 0xA6, 0x02], "ATmega64RFR2", 64 * KIB, 256)
        .with_boot(KIB, FuseByte::High),
    ChipSignature::new([0x1E, 0xA7, 0x02], "ATmega128RFR2", 128 * KIB, 256)
        .with_boot(KIB, FuseByte::High),
    ChipSignature::new([0x1E, 0xA8, 0x02], "ATmega256RFR2", 256 * KIB, 256)
        .with_boot(KIB, FuseByte::High),
];

/// Find a chip by its signature bytes
pub fn find(signature: &[u8; 3]) -> Option<&'static ChipSignature> {
    CHIPS.iter().find(|chip| chip.matches(signature))
}

/// Find a chip by name (case-insensitive)
pub fn find_by_name(name: &str) -> Option<&'static ChipSignature> {
    CHIPS.iter().find(|chip| chip.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_signature() {
        let chip = find(&[0x1E, 0x95, 0x0F]).unwrap();
        assert_eq!(chip.name, "ATmega328P");
        assert_eq!(chip.flash_size, 32768);
        assert_eq!(chip.boot_size, 512);
        assert_eq!(chip.page_size, 128);
        assert_eq!(chip.boot_fuse, Some(FuseByte::High));
        assert!(!chip.timed_writes);

        assert!(find(&[0x1E, 0x00, 0x00]).is_none());
        assert!(find(&[0xFF, 0xFF, 0xFF]).is_none());
    }

    #[test]
    fn test_find_by_name() {
        let chip = find_by_name("atmega8a").unwrap();
        assert!(chip.timed_writes);
        assert_eq!(chip.signature, [0x1E, 0x93, 0x07]);
        assert!(find_by_name("ATmega9000").is_none());
    }

    #[test]
    fn test_geometry_invariants() {
        for chip in CHIPS {
            assert!(chip.flash_size.is_power_of_two(), "{}", chip.name);
            assert!(chip.page_size.is_power_of_two(), "{}", chip.name);
            assert_eq!(chip.flash_size % chip.page_size, 0, "{}", chip.name);
            // 8x the base boot size must still fit into flash
            assert!(chip.boot_size * 8 <= chip.flash_size, "{}", chip.name);
            assert_eq!(chip.boot_fuse.is_some(), chip.boot_size != 0, "{}", chip.name);
        }
    }

    #[test]
    fn test_signatures_unique() {
        for (i, a) in CHIPS.iter().enumerate() {
            for b in &CHIPS[i + 1..] {
                assert_ne!(a.signature, b.signature, "{} vs {}", a.name, b.name);
            }
        }
    }

    #[test]
    fn test_page_of() {
        let chip = find_by_name("ATmega328P").unwrap();
        assert_eq!(chip.page_of(0), 0);
        assert_eq!(chip.page_of(127), 0);
        assert_eq!(chip.page_of(128), 128);
        assert_eq!(chip.page_of(0x7FFF), 0x7F80);
    }
}
