//! The hardware boundary the monitor is written against.
//!
//! Each backend ([`xmc`](super::xmc) on the device, [`sim`](super::sim) on a
//! host) implements these for its own peripheral handles.

use super::OsResult;
use crate::config::EventDelivery;

/// Board and peripheral bring-up.
pub trait BoardSupport {
    /// Prepare the board for use.
    ///
    /// # Errors
    /// Returns an error if the board could not be brought up. Callers treat
    /// this as fatal.
    fn init(&mut self) -> OsResult<()>;
}

/// A digital output used to signal state, usually an LED.
pub trait Indicator {
    /// Invert the current output level.
    fn toggle(&mut self);
}

/// Routes the monitor's event to a vector.
pub trait EventController {
    /// Enable the interrupt or trap source described by `delivery`.
    fn enable(&mut self, delivery: EventDelivery);
}

/// The supply-voltage comparator.
pub trait SupplyMonitor {
    /// Program the threshold and interval codes and start monitoring.
    fn enable(&mut self, threshold: u8, interval: u8);
}

/// What the trigger handler does after signalling the brownout.
pub trait Halt {
    /// Stop for inspection. May return if a debugger resumes execution.
    fn halt(&mut self);
}

/// Peripherals taken over by the monitor.
pub struct SystemPeripherals<B, L, E, M> {
    pub board: B,
    pub led: L,
    pub events: E,
    pub monitor: M,
}
