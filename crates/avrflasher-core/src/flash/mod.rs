//! Check / write / verify pipeline
//!
//! [`flash_firmware`] programs a firmware file into a target that is already
//! identified:
//!
//! 1. **Check**: parse the whole file and measure the image without touching
//!    the target.
//! 2. Gate: the image must fit into flash and its start address must select
//!    a valid boot configuration. Nothing has been erased yet.
//! 3. **Write**: re-enter programming mode, reopen the file, erase the chip
//!    and stream the image into flash one page at a time.
//! 4. **Verify**: read every byte back; mismatches are counted.
//! 5. Program the boot fuse and optionally remove the file.
//!
//! [`attempt`] wraps one full attempt, from the handshake to the final
//! status report.

mod fuse;
mod pass;
mod source;

pub use fuse::{select_boot_fuse, BootFuseBits};
pub use pass::{Pass, PassState, MAX_LINE};
pub use source::{FirmwareSource, MemorySource};

use crate::chip::FuseByte;
use crate::error::{Error, Result};
use crate::isp::IspSession;
use crate::programmer::IspPins;
use crate::status::{Status, StatusSink};

use pass::run_pass;

/// Options for a programming run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct FlashOptions {
    /// Delete the firmware file after a verified write
    pub remove_on_success: bool,
}

impl Default for FlashOptions {
    fn default() -> Self {
        Self {
            remove_on_success: true,
        }
    }
}

/// Summary of a successful programming run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashReport {
    /// Lowest byte address in the image
    pub lowest: Option<u32>,
    /// Highest byte address in the image
    pub highest: Option<u32>,
    /// Data bytes in the image
    pub bytes: u32,
    /// Flash pages written
    pub pages: u32,
    /// Boot fuse value written, if the chip has one
    pub boot_fuse: Option<(FuseByte, u8)>,
}

/// Program, verify and configure the identified target
///
/// The session must be in programming mode with its chip resolved and its
/// fuses read. The file is opened three times, once per pass.
pub fn flash_firmware<P, S, R>(
    session: &mut IspSession<P>,
    source: &mut S,
    sink: &mut R,
    name: &str,
    options: &FlashOptions,
) -> Result<FlashReport>
where
    P: IspPins,
    S: FirmwareSource + ?Sized,
    R: StatusSink + ?Sized,
{
    let chip = session.chip().ok_or(Error::NoSignature)?;

    let check = run_pass(Pass::Check, session, source, sink, name, chip)?;
    log::info!(
        "{}: {} bytes, 0x{:06X}..=0x{:06X}",
        name,
        check.bytes,
        check.lowest.unwrap_or(0),
        check.highest.unwrap_or(0)
    );

    if let Some(highest) = check.highest {
        if highest >= chip.flash_size {
            log::error!(
                "{}: image ends at 0x{:06X}, {} has {} bytes of flash",
                name,
                highest,
                chip.name,
                chip.flash_size
            );
            return Err(Error::FileTooLargeForFlash {
                highest,
                flash_size: chip.flash_size,
            });
        }
    }

    let boot_fuse = match chip.boot_fuse {
        Some(fuse) => fuse::select_boot_fuse(chip, session.fuse(fuse), check.lowest)?,
        None => None,
    };

    session.enter()?;
    let write = run_pass(Pass::Write, session, source, sink, name, chip)?;
    log::info!("{}: wrote {} pages", name, write.pages);

    let verify = run_pass(Pass::Verify, session, source, sink, name, chip)?;
    if verify.errors > 0 {
        log::error!("{}: {} byte(s) failed verification", name, verify.errors);
        return Err(Error::VerificationError {
            errors: verify.errors,
        });
    }

    if let Some((fuse, value)) = boot_fuse {
        session.write_fuse(fuse, value)?;
    }

    if options.remove_on_success {
        log::info!("removing {}", name);
        if let Err(e) = source.remove(name) {
            log::warn!("{}: target programmed but file not removed: {}", name, e);
        }
    }

    Ok(FlashReport {
        lowest: check.lowest,
        highest: check.highest,
        bytes: check.bytes,
        pages: write.pages,
        boot_fuse,
    })
}

/// Run one complete programming attempt and report its outcome
///
/// Enters programming mode, identifies the target, reads its fuses and
/// calls [`flash_firmware`]. The ISP lines are released afterwards whatever
/// the outcome, and the final status goes to `sink`.
pub fn attempt<P, S, R>(
    session: &mut IspSession<P>,
    source: &mut S,
    sink: &mut R,
    name: &str,
    options: &FlashOptions,
) -> Status
where
    P: IspPins,
    S: FirmwareSource + ?Sized,
    R: StatusSink + ?Sized,
{
    let result = program_target(session, source, sink, name, options);
    session.exit();

    let status = match result {
        Ok(report) => {
            log::info!(
                "{}: flashed {} bytes in {} pages",
                name,
                report.bytes,
                report.pages
            );
            Status::FlashedOk
        }
        Err(e) => {
            log::warn!("attempt failed: {}", e);
            Status::from(e)
        }
    };
    sink.report(status);
    status
}

fn program_target<P, S, R>(
    session: &mut IspSession<P>,
    source: &mut S,
    sink: &mut R,
    name: &str,
    options: &FlashOptions,
) -> Result<FlashReport>
where
    P: IspPins,
    S: FirmwareSource + ?Sized,
    R: StatusSink + ?Sized,
{
    session.enter()?;
    session.read_signature()?;
    session.read_fuses()?;
    flash_firmware(session, source, sink, name, options)
}
