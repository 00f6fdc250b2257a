//! Error types for Linux GPIO operations

use thiserror::Error;

/// Linux GPIO specific errors
#[derive(Debug, Error)]
pub enum LinuxGpioError {
    /// Failed to request GPIO lines
    #[error("Failed to request GPIO lines on '{path}': {source}")]
    LineRequestFailed {
        path: String,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to reconfigure GPIO lines
    #[error("Failed to reconfigure GPIO lines: {0}")]
    ReconfigureFailed(#[source] gpiocdev::Error),

    /// GPIO chip or device not specified
    #[error("No GPIO chip specified, expected a path like /dev/gpiochip0")]
    NoDevice,

    /// The same line offset is used for two functions
    #[error("GPIO line {offset} is assigned to both {first} and {second}")]
    DuplicateLine {
        offset: u32,
        first: &'static str,
        second: &'static str,
    },
}

/// Result type for Linux GPIO operations
pub type Result<T> = std::result::Result<T, LinuxGpioError>;

/// Check that every named line offset is distinct
pub(crate) fn check_distinct(lines: &[(&'static str, u32)]) -> Result<()> {
    for (i, &(first, offset)) in lines.iter().enumerate() {
        if let Some(&(second, _)) = lines[i + 1..].iter().find(|(_, o)| *o == offset) {
            return Err(LinuxGpioError::DuplicateLine {
                offset,
                first,
                second,
            });
        }
    }
    Ok(())
}
