//! One streaming pass over the firmware file

use core::fmt;

use crate::chip::ChipSignature;
use crate::error::{Error, Result};
use crate::hex::{self, RecordKind};
use crate::isp::IspSession;
use crate::programmer::IspPins;
use crate::status::StatusSink;

use super::source::FirmwareSource;

/// Line buffer size, enough for the longest record plus CR/LF
pub const MAX_LINE: usize = 2 * hex::MAX_RECORD_BYTES + 3;

/// Lines between progress ticks during the check pass
const PROGRESS_LINES: u32 = 40;

/// What a pass does with the data records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Validate the file and measure the image, no target I/O
    Check,
    /// Load the image into flash page by page
    Write,
    /// Read flash back and compare
    Verify,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Check => write!(f, "check"),
            Self::Write => write!(f, "write"),
            Self::Verify => write!(f, "verify"),
        }
    }
}

/// Bookkeeping for one pass, reset at the start of each pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassState {
    /// Which pass this is
    pub pass: Pass,
    /// Lowest byte address carrying data
    pub lowest: Option<u32>,
    /// Highest byte address carrying data
    pub highest: Option<u32>,
    /// Data bytes seen
    pub bytes: u32,
    /// Bytes that did not read back as written
    pub errors: u32,
    /// Pages written to flash
    pub pages: u32,
    /// An End-Of-File record was reached
    pub eof_seen: bool,
    /// Page currently being filled or compared
    pub open_page: Option<u32>,
    /// Lines read so far
    pub lines: u32,
    /// Extended segment address accumulator
    pub segment_base: u32,
}

impl PassState {
    /// Fresh state for `pass`
    pub fn new(pass: Pass) -> Self {
        Self {
            pass,
            lowest: None,
            highest: None,
            bytes: 0,
            errors: 0,
            pages: 0,
            eof_seen: false,
            open_page: None,
            lines: 0,
            segment_base: 0,
        }
    }

    /// Account for `len` data bytes starting at `addr`
    pub fn record_range(&mut self, addr: u32, len: u32) {
        if len == 0 {
            return;
        }
        let last = addr + (len - 1);
        self.lowest = Some(self.lowest.map_or(addr, |low| low.min(addr)));
        self.highest = Some(self.highest.map_or(last, |high| high.max(last)));
        self.bytes += len;
    }

    /// Make `page` the open page
    ///
    /// Returns the page that was open before if it differs, i.e. the page
    /// that has to be committed first.
    pub fn switch_page(&mut self, page: u32) -> Option<u32> {
        match self.open_page.replace(page) {
            Some(previous) if previous != page => Some(previous),
            _ => None,
        }
    }
}

/// Stream the named file once, handling data records according to `pass`
pub(crate) fn run_pass<P, S, R>(
    pass: Pass,
    session: &mut IspSession<P>,
    source: &mut S,
    sink: &mut R,
    name: &str,
    chip: &ChipSignature,
) -> Result<PassState>
where
    P: IspPins,
    S: FirmwareSource + ?Sized,
    R: StatusSink + ?Sized,
{
    log::debug!("{} pass over {}", pass, name);

    source.open(name)?;
    if pass == Pass::Write {
        // erase only after the file reopened
        session.chip_erase()?;
    }
    sink.phase(pass);

    let mut state = PassState::new(pass);
    let mut buf = [0u8; MAX_LINE];

    while let Some(len) = source.read_line(&mut buf)? {
        state.lines += 1;
        if pass == Pass::Check && state.lines % PROGRESS_LINES == 0 {
            sink.progress();
        }

        let record = match hex::parse_line(&buf[..len]) {
            Ok(Some(record)) => record,
            Ok(None) => continue,
            Err(e) => {
                log::error!("{}: line {}: {}", name, state.lines, e);
                return Err(Error::Hex(e));
            }
        };

        match record.kind {
            RecordKind::Data => {
                let addr = state.segment_base + u32::from(record.offset);
                process_data(&mut state, session, sink, chip, addr, &record.data)?;
            }
            RecordKind::EndOfFile => {
                state.eof_seen = true;
                break;
            }
            RecordKind::ExtendedSegmentAddress => {
                if let Some(base) = record.segment_base() {
                    state.segment_base = base;
                }
            }
            kind => log::trace!("line {}: ignoring {:?} record", state.lines, kind),
        }
    }

    if !state.eof_seen {
        log::error!("{}: no end-of-file record", name);
        return Err(Error::NoEndOfFileRecord);
    }

    if pass == Pass::Write {
        if let Some(page) = state.open_page.take() {
            session.commit_page(page)?;
            state.pages += 1;
            sink.progress();
        }
    }

    log::debug!(
        "{} pass done: {} lines, {} bytes, {} pages, {} errors",
        pass,
        state.lines,
        state.bytes,
        state.pages,
        state.errors
    );
    Ok(state)
}

fn process_data<P, R>(
    state: &mut PassState,
    session: &mut IspSession<P>,
    sink: &mut R,
    chip: &ChipSignature,
    addr: u32,
    data: &[u8],
) -> Result<()>
where
    P: IspPins,
    R: StatusSink + ?Sized,
{
    if data.is_empty() {
        return Ok(());
    }
    state.record_range(addr, data.len() as u32);

    match state.pass {
        Pass::Check => {}
        Pass::Write => {
            for (addr, &byte) in (addr..).zip(data) {
                if let Some(previous) = state.switch_page(chip.page_of(addr)) {
                    session.commit_page(previous)?;
                    state.pages += 1;
                    sink.progress();
                }
                session.write_flash_byte(addr, byte)?;
            }
        }
        Pass::Verify => {
            for (addr, &byte) in (addr..).zip(data) {
                if state.switch_page(chip.page_of(addr)).is_some() {
                    sink.progress();
                }
                let found = session.read_flash_byte(addr)?;
                if found != byte {
                    log::debug!(
                        "verify: 0x{:06X} is 0x{:02X}, expected 0x{:02X}",
                        addr,
                        found,
                        byte
                    );
                    state.errors += 1;
                }
            }
        }
    }
    Ok(())
}
