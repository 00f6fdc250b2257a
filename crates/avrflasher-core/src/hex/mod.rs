//! Intel-HEX line parser
//!
//! Each line of an Intel-HEX file is one record:
//!
//! ```text
//! :LLAAAATT<data...>CC
//! ```
//!
//! `LL` is the data length, `AAAA` the big-endian 16-bit offset, `TT` the
//! record type and `CC` the two's complement of the sum of all preceding
//! bytes. [`parse_line`] validates one line and returns it as a
//! [`HexRecord`]. It keeps no state; the caller owns the extended segment
//! address accumulator (see [`HexRecord::segment_base`]).

use heapless::Vec;

use crate::error::HexError;

/// Maximum number of bytes a line may decode to
pub const MAX_RECORD_BYTES: usize = 40;

/// Maximum number of data bytes in one record
pub const MAX_DATA_BYTES: usize = MAX_RECORD_BYTES - 5;

/// Intel-HEX record types understood by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// 00: data bytes at `offset`
    Data,
    /// 01: end of file
    EndOfFile,
    /// 02: new segment base for the following data records
    ExtendedSegmentAddress,
    /// 03: start segment address (ignored)
    StartSegmentAddress,
    /// 04: extended linear address (ignored)
    ExtendedLinearAddress,
    /// 05: start linear address (ignored)
    StartLinearAddress,
}

impl RecordKind {
    /// Decode a record type byte
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Data),
            0x01 => Some(Self::EndOfFile),
            0x02 => Some(Self::ExtendedSegmentAddress),
            0x03 => Some(Self::StartSegmentAddress),
            0x04 => Some(Self::ExtendedLinearAddress),
            0x05 => Some(Self::StartLinearAddress),
            _ => None,
        }
    }

    /// Check if records of this kind are accepted but carry nothing we use
    pub fn is_ignored(self) -> bool {
        matches!(
            self,
            Self::StartSegmentAddress | Self::ExtendedLinearAddress | Self::StartLinearAddress
        )
    }
}

/// One validated Intel-HEX record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexRecord {
    /// Record type
    pub kind: RecordKind,
    /// 16-bit load offset
    pub offset: u16,
    /// Record payload
    pub data: Vec<u8, MAX_DATA_BYTES>,
}

impl HexRecord {
    /// Segment base carried by an extended segment address record
    ///
    /// Only the first payload byte is used: the base is `data[0] << 12`.
    /// Returns `None` for other record kinds.
    pub fn segment_base(&self) -> Option<u32> {
        if self.kind != RecordKind::ExtendedSegmentAddress {
            return None;
        }
        self.data.first().map(|&b| u32::from(b) << 12)
    }
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Parse one line of an Intel-HEX file
///
/// Trailing CR/LF and whitespace are ignored. A blank line yields
/// `Ok(None)`.
pub fn parse_line(line: &[u8]) -> Result<Option<HexRecord>, HexError> {
    let line = line.trim_ascii_end();
    if line.is_empty() {
        return Ok(None);
    }

    let Some(digits) = line.strip_prefix(b":") else {
        return Err(HexError::NotColonPrefixed);
    };

    let mut buf = [0u8; MAX_RECORD_BYTES];
    let mut count = 0;
    for pair in digits.chunks(2) {
        if count >= MAX_RECORD_BYTES {
            return Err(HexError::TooLong);
        }
        let (hi, lo) = match pair {
            [hi, lo] => (hex_digit(*hi), hex_digit(*lo)),
            _ => (None, None),
        };
        let (Some(hi), Some(lo)) = (hi, lo) else {
            return Err(HexError::InvalidHexDigits);
        };
        buf[count] = (hi << 4) | lo;
        count += 1;
    }

    if count < 5 {
        return Err(HexError::TooShort);
    }

    let bytes = &buf[..count];
    let (body, checksum) = bytes.split_at(count - 1);
    let sum = body.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    if sum.wrapping_neg() != checksum[0] {
        return Err(HexError::BadChecksum);
    }

    let len = usize::from(bytes[0]);
    if len != count - 5 {
        return Err(HexError::UnexpectedLength);
    }

    let offset = u16::from_be_bytes([bytes[1], bytes[2]]);
    let kind = RecordKind::from_u8(bytes[3]).ok_or(HexError::UnknownRecordType(bytes[3]))?;
    let data = Vec::from_slice(&bytes[4..4 + len]).map_err(|_| HexError::TooLong)?;

    if kind == RecordKind::ExtendedSegmentAddress && data.is_empty() {
        return Err(HexError::UnexpectedLength);
    }

    Ok(Some(HexRecord { kind, offset, data }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Option<HexRecord>, HexError> {
        parse_line(line.as_bytes())
    }

    fn record(line: &str) -> HexRecord {
        parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_data_record() {
        let rec = record(":10010000214601360121470136007EFE09D2190140\r\n");
        assert_eq!(rec.kind, RecordKind::Data);
        assert_eq!(rec.offset, 0x0100);
        assert_eq!(rec.data.len(), 16);
        assert_eq!(rec.data[0], 0x21);
        assert_eq!(rec.data[15], 0x01);
    }

    #[test]
    fn test_lowercase_digits() {
        let rec = record(":0300300002337a1e");
        assert_eq!(rec.offset, 0x0030);
        assert_eq!(&rec.data[..], &[0x02, 0x33, 0x7A]);
    }

    #[test]
    fn test_end_of_file() {
        let rec = record(":00000001FF");
        assert_eq!(rec.kind, RecordKind::EndOfFile);
        assert!(rec.data.is_empty());
    }

    #[test]
    fn test_blank_lines() {
        assert_eq!(parse(""), Ok(None));
        assert_eq!(parse("\r\n"), Ok(None));
        assert_eq!(parse("   \t"), Ok(None));
    }

    #[test]
    fn test_not_colon_prefixed() {
        assert_eq!(parse("00000001FF"), Err(HexError::NotColonPrefixed));
        assert_eq!(parse(" :00000001FF"), Err(HexError::NotColonPrefixed));
    }

    #[test]
    fn test_invalid_digits() {
        assert_eq!(parse(":0000000GFF"), Err(HexError::InvalidHexDigits));
        // odd digit count
        assert_eq!(parse(":00000001F"), Err(HexError::InvalidHexDigits));
    }

    #[test]
    fn test_too_short() {
        assert_eq!(parse(":00000001"), Err(HexError::TooShort));
        assert_eq!(parse(":"), Err(HexError::TooShort));
    }

    #[test]
    fn test_too_long() {
        let mut line = std::string::String::from(":");
        for _ in 0..41 {
            line.push_str("00");
        }
        assert_eq!(parse(&line), Err(HexError::TooLong));
    }

    #[test]
    fn test_longest_record_accepted() {
        // 35 data bytes is the most a 40-byte line can hold
        let mut bytes = std::vec![35u8, 0x00, 0x00, 0x00];
        bytes.extend(core::iter::repeat(0xAA).take(35));
        let sum = bytes.iter().fold(0u8, |a, &b| a.wrapping_add(b));
        bytes.push(sum.wrapping_neg());
        let mut line = std::string::String::from(":");
        for b in bytes {
            line.push_str(&std::format!("{:02X}", b));
        }
        let rec = record(&line);
        assert_eq!(rec.data.len(), MAX_DATA_BYTES);
    }

    #[test]
    fn test_bad_checksum() {
        assert_eq!(
            parse(":10010000214601360121470136007EFE09D2190141"),
            Err(HexError::BadChecksum)
        );
    }

    #[test]
    fn test_checksum_before_length() {
        // declares 2 data bytes, carries 1, checksum is wrong as well
        assert_eq!(parse(":0200000000FF"), Err(HexError::BadChecksum));
    }

    #[test]
    fn test_unexpected_length() {
        // declares 2 data bytes but carries 1, checksum valid
        assert_eq!(parse(":0200000000FE"), Err(HexError::UnexpectedLength));
    }

    #[test]
    fn test_unknown_record_type() {
        assert_eq!(parse(":00000006FA"), Err(HexError::UnknownRecordType(0x06)));
    }

    #[test]
    fn test_ignored_record_types() {
        let rec = record(":020000040800F2");
        assert_eq!(rec.kind, RecordKind::ExtendedLinearAddress);
        assert!(rec.kind.is_ignored());
        assert_eq!(rec.segment_base(), None);

        assert!(record(":0400000300003800C1").kind.is_ignored());
        assert!(record(":04000005000000CD2A").kind.is_ignored());
    }

    #[test]
    fn test_extended_segment_address() {
        let rec = record(":020000021000EC");
        assert_eq!(rec.kind, RecordKind::ExtendedSegmentAddress);
        assert_eq!(rec.segment_base(), Some(0x10000));
    }

    #[test]
    fn test_empty_extended_segment_address() {
        assert_eq!(parse(":00000002FE"), Err(HexError::UnexpectedLength));
    }

    #[test]
    fn test_valid_lines_sum_to_zero() {
        for line in [
            ":10010000214601360121470136007EFE09D2190140",
            ":020000021000EC",
            ":00000001FF",
        ] {
            let digits = &line.as_bytes()[1..];
            let sum = digits
                .chunks(2)
                .map(|p| (hex_digit(p[0]).unwrap() << 4) | hex_digit(p[1]).unwrap())
                .fold(0u8, |a, b| a.wrapping_add(b));
            assert_eq!(sum, 0);
            assert!(parse(line).is_ok());
        }
    }

    #[test]
    fn test_parse_is_pure() {
        let line = ":0300300002337A1E";
        assert_eq!(parse(line), parse(line));
    }
}
