//! Firmware files on removable storage
//!
//! [`DirSource`] reads the firmware from a directory, normally the mount
//! point of the jig's SD card. A missing directory means the card is not
//! inserted.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;

use avrflasher_core::flash::FirmwareSource;
use avrflasher_core::{Error, Result};

/// Line source over files in one directory
pub struct DirSource {
    root: PathBuf,
    reader: Option<BufReader<File>>,
    line: Vec<u8>,
}

impl DirSource {
    /// Create a source rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            reader: None,
            line: Vec::new(),
        }
    }

    fn path_of(&self, name: &str) -> Result<PathBuf> {
        if !self.root.is_dir() {
            log::debug!("storage: {} is not mounted", self.root.display());
            return Err(Error::NoStorage);
        }
        Ok(self.root.join(name))
    }
}

impl FirmwareSource for DirSource {
    fn open(&mut self, name: &str) -> Result<()> {
        self.reader = None;
        let path = self.path_of(name)?;
        let file = File::open(&path).map_err(|e| {
            log::debug!("storage: cannot open {}: {}", path.display(), e);
            Error::CannotOpenFile
        })?;
        self.reader = Some(BufReader::new(file));
        Ok(())
    }

    fn read_line(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        let reader = self.reader.as_mut().ok_or(Error::IoError)?;

        // one extra byte for the terminator
        let limit = buf.len() as u64 + 1;
        self.line.clear();
        let n = reader
            .by_ref()
            .take(limit)
            .read_until(b'\n', &mut self.line)
            .map_err(|e| {
                log::error!("storage: read failed: {}", e);
                Error::IoError
            })?;

        if n == 0 {
            return Ok(None);
        }
        if self.line.last() == Some(&b'\n') {
            self.line.pop();
        } else if n as u64 == limit {
            return Err(Error::LineTooLong);
        }

        buf[..self.line.len()].copy_from_slice(&self.line);
        Ok(Some(self.line.len()))
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        self.reader = None;
        let path = self.path_of(name)?;
        fs::remove_file(&path).map_err(|e| {
            log::error!("storage: cannot remove {}: {}", path.display(), e);
            Error::IoError
        })
    }
}
