//! Status reporting on the console

use std::time::Duration;

use avrflasher_core::flash::Pass;
use avrflasher_core::status::{Status, StatusSink};
use indicatif::{ProgressBar, ProgressStyle};

/// Status sink for a terminal or the system journal
///
/// Progress ticks drive a spinner; the final status is logged together with
/// the LED pattern the jig shows for it.
#[derive(Default)]
pub struct ConsoleStatus {
    spinner: Option<ProgressBar>,
    ticks: u64,
}

impl ConsoleStatus {
    /// Create a sink with no spinner running
    pub fn new() -> Self {
        Self::default()
    }

    fn create_spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Programming...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

impl StatusSink for ConsoleStatus {
    fn report(&mut self, status: Status) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_with_message(status.to_string());
        }
        self.ticks = 0;

        let pattern = status.blink_pattern();
        if status.is_error() {
            log::error!(
                "{} (LED {:?}{} x{})",
                status,
                pattern.primary,
                pattern
                    .secondary
                    .map(|led| format!("+{:?}", led))
                    .unwrap_or_default(),
                pattern.times
            );
        } else {
            log::info!("{}", status);
        }
    }

    fn progress(&mut self) {
        self.ticks += 1;
        let pb = self.spinner.get_or_insert_with(Self::create_spinner);
        pb.set_message(format!("Programming... ({} steps)", self.ticks));
    }

    fn phase(&mut self, pass: Pass) {
        log::info!("starting {} pass", pass);
        if let Some(pb) = &self.spinner {
            pb.set_message(format!("Programming... ({} pass)", pass));
        }
    }
}

/// Forward every report to two sinks
pub struct Both<A, B>(pub A, pub B);

impl<A: StatusSink, B: StatusSink> StatusSink for Both<A, B> {
    fn report(&mut self, status: Status) {
        self.0.report(status);
        self.1.report(status);
    }

    fn progress(&mut self) {
        self.0.progress();
        self.1.progress();
    }

    fn phase(&mut self, pass: Pass) {
        self.0.phase(pass);
        self.1.phase(pass);
    }
}
