//! Error types for the firmware.

use crate::os_warn;
use core::fmt::Display;
use thiserror::Error;

/// Everything that can go wrong while bringing up and arming the monitor.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum OsError {
    /// Board peripherals have already been claimed.
    #[error("peripherals already taken")]
    PeripheralsTaken,

    /// The indicator LED does not name a usable port pin.
    #[error("invalid indicator pin P{port}.{pin}")]
    InvalidIndicatorPin { port: u8, pin: u8 },

    /// Board bring-up reported a failure.
    #[error("board init: {0}")]
    BoardInit(&'static str),

    /// Threshold or interval code does not fit the monitor registers.
    #[error("invalid monitor configuration (threshold {threshold}, interval {interval})")]
    InvalidMonitorConfig { threshold: u8, interval: u8 },

    /// A brownout response is already registered for the vector.
    #[error("brownout handler already installed")]
    HandlerInstalled,

    /// A logger has already been registered with the `log` facade.
    #[error("logger already set")]
    LoggerInit,
}

/// Trait for non-fatal error types that can be "reported" to the console.
///
/// This trait is meant to be implemented for [`Result`](Result)s.
pub trait ReportableError {
    /// Log a warning to the console if the [`Result`] variant is an [`Err`], or do nothing if it's [`Ok`].
    fn report(self, desc: &str);
}

impl<T, E: Display> ReportableError for Result<T, E> {
    fn report(self, desc: &str) {
        if let Err(why) = self {
            os_warn!("{desc}: {why}");
        }
    }
}

impl OsError {
    /// Returns whether the error is non-fatal.
    ///
    /// Only a missing logger is tolerated. Anything that prevents the monitor
    /// from being armed is fatal.
    pub const fn recoverable(&self) -> bool {
        matches!(self, Self::LoggerInit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_logger_errors_are_recoverable() {
        assert!(OsError::LoggerInit.recoverable());
        assert!(!OsError::PeripheralsTaken.recoverable());
        assert!(!OsError::HandlerInstalled.recoverable());
        assert!(!OsError::BoardInit("clock").recoverable());
    }

    #[test]
    fn pin_error_names_the_pin() {
        let why = OsError::InvalidIndicatorPin { port: 5, pin: 16 };
        assert_eq!(why.to_string(), "invalid indicator pin P5.16");
    }
}
