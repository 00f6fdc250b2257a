//! The jig's outer loop
//!
//! The jig runs unattended: it keeps trying to program whatever target is
//! plugged in, pausing between attempts. A successful attempt removes the
//! firmware file (unless configured otherwise), so the next target needs a
//! fresh card.

use avrflasher_core::flash::{self, FirmwareSource};
use avrflasher_core::isp::IspSession;
use avrflasher_core::programmer::IspPins;
use avrflasher_core::status::{Status, StatusSink};

use crate::config::FirmwareConfig;

/// Counters over a run of attempts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Attempts made
    pub attempts: u32,
    /// Attempts that ended with [`Status::FlashedOk`]
    pub flashed: u32,
    /// Status of the last attempt
    pub last: Option<Status>,
}

/// Run programming attempts back to back
///
/// Runs forever when `limit` is `None`.
pub fn run<P, S, R>(
    session: &mut IspSession<P>,
    source: &mut S,
    sink: &mut R,
    config: &FirmwareConfig,
    limit: Option<u32>,
) -> RunSummary
where
    P: IspPins,
    S: FirmwareSource,
    R: StatusSink,
{
    let mut summary = RunSummary::default();

    loop {
        summary.attempts += 1;
        log::debug!("attempt {}", summary.attempts);

        let status = flash::attempt(session, source, sink, &config.file, &config.options);
        if status == Status::FlashedOk {
            summary.flashed += 1;
        }
        summary.last = Some(status);

        if limit.is_some_and(|limit| summary.attempts >= limit) {
            return summary;
        }
        std::thread::sleep(config.idle_delay());
    }
}
