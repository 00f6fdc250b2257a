//! Firmware line sources
//!
//! The orchestrator reads the image one line at a time through
//! [`FirmwareSource`]. On the jig this is a file on removable storage; tests
//! use [`MemorySource`].

use crate::error::{Error, Result};

/// Trait for reading a firmware file line by line
pub trait FirmwareSource {
    /// Open (or reopen from the start) the named file
    ///
    /// Returns [`Error::NoStorage`] when the medium is missing and
    /// [`Error::CannotOpenFile`] when the file is.
    fn open(&mut self, name: &str) -> Result<()>;

    /// Read the next line into `buf`, without its terminator
    ///
    /// Returns the number of bytes stored, or `None` at end of file. A line
    /// that does not fit into `buf` fails with [`Error::LineTooLong`].
    fn read_line(&mut self, buf: &mut [u8]) -> Result<Option<usize>>;

    /// Delete the named file
    fn remove(&mut self, name: &str) -> Result<()>;
}

impl<T: FirmwareSource + ?Sized> FirmwareSource for &mut T {
    fn open(&mut self, name: &str) -> Result<()> {
        (**self).open(name)
    }

    fn read_line(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        (**self).read_line(buf)
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        (**self).remove(name)
    }
}

/// A single firmware file held in memory
#[derive(Debug, Clone)]
pub struct MemorySource<'a> {
    name: &'a str,
    content: &'a [u8],
    pos: usize,
    is_open: bool,
    removed: bool,
    opens: u32,
}

impl<'a> MemorySource<'a> {
    /// Create a source holding one file
    pub fn new(name: &'a str, content: &'a str) -> Self {
        Self {
            name,
            content: content.as_bytes(),
            pos: 0,
            is_open: false,
            removed: false,
            opens: 0,
        }
    }

    /// Check if the file was removed
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Number of successful opens
    pub fn opens(&self) -> u32 {
        self.opens
    }
}

impl FirmwareSource for MemorySource<'_> {
    fn open(&mut self, name: &str) -> Result<()> {
        if self.removed || name != self.name {
            return Err(Error::CannotOpenFile);
        }
        self.pos = 0;
        self.is_open = true;
        self.opens += 1;
        Ok(())
    }

    fn read_line(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        if !self.is_open {
            return Err(Error::IoError);
        }
        if self.pos >= self.content.len() {
            return Ok(None);
        }

        let rest = &self.content[self.pos..];
        let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        self.pos += (end + 1).min(rest.len());

        let line = &rest[..end];
        if line.len() > buf.len() {
            return Err(Error::LineTooLong);
        }
        buf[..line.len()].copy_from_slice(line);
        Ok(Some(line.len()))
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        if self.removed || name != self.name {
            return Err(Error::CannotOpenFile);
        }
        self.removed = true;
        self.is_open = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_lines() {
        let mut src = MemorySource::new("fw.hex", "abc\r\n\nxy");
        src.open("fw.hex").unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(src.read_line(&mut buf), Ok(Some(4)));
        assert_eq!(&buf[..4], b"abc\r");
        assert_eq!(src.read_line(&mut buf), Ok(Some(0)));
        assert_eq!(src.read_line(&mut buf), Ok(Some(2)));
        assert_eq!(src.read_line(&mut buf), Ok(None));
    }

    #[test]
    fn test_reopen_rewinds() {
        let mut src = MemorySource::new("fw.hex", "one\ntwo\n");
        let mut buf = [0u8; 8];
        src.open("fw.hex").unwrap();
        src.read_line(&mut buf).unwrap();
        src.open("fw.hex").unwrap();
        assert_eq!(src.read_line(&mut buf), Ok(Some(3)));
        assert_eq!(&buf[..3], b"one");
        assert_eq!(src.opens(), 2);
    }

    #[test]
    fn test_line_too_long() {
        let mut src = MemorySource::new("fw.hex", "0123456789\n");
        src.open("fw.hex").unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(src.read_line(&mut buf), Err(Error::LineTooLong));
    }

    #[test]
    fn test_open_and_remove() {
        let mut src = MemorySource::new("fw.hex", "");
        assert_eq!(src.open("other.hex"), Err(Error::CannotOpenFile));
        src.remove("fw.hex").unwrap();
        assert!(src.is_removed());
        assert_eq!(src.open("fw.hex"), Err(Error::CannotOpenFile));
    }
}
