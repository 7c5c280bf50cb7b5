//! Registration of the brownout response for the hardware vector.
//!
//! The vector entry itself is a plain function the interrupt controller jumps
//! to. It forwards to a [`ResponseSlot`], which owns whatever the response
//! needs (the LED, the halt strategy) once the main path hands it over.

use super::{
    hal::{Halt, Indicator},
    OsError, OsResult,
};
use core::{
    cell::RefCell,
    sync::atomic::{AtomicBool, AtomicU32, Ordering},
};
use critical_section::Mutex;

/// Something the vector runs when the monitor fires.
pub trait Response {
    fn respond(&mut self);
}

/// Toggle the indicator, then halt.
pub struct TriggerResponse<L, H> {
    led: L,
    halt: H,
}

impl<L: Indicator, H: Halt> TriggerResponse<L, H> {
    pub const fn new(led: L, halt: H) -> Self {
        Self { led, halt }
    }

    pub const fn led(&self) -> &L {
        &self.led
    }
}

impl<L: Indicator, H: Halt> Response for TriggerResponse<L, H> {
    fn respond(&mut self) {
        self.led.toggle();
        self.halt.halt();
    }
}

/// Lifecycle of the monitor as seen from the vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// No response registered yet.
    Uninitialized,
    /// Response registered, event path enabled and monitor programmed.
    Armed,
    /// Main path has handed over and is spinning.
    Idle,
    /// The monitor has fired at least once.
    Triggered,
}

/// Holds the brownout response between arming and the vector firing.
///
/// Meant to live in a `static`. State is kept in atomics with a single writer
/// each, so reading it never contends with an NMI that preempts the reader.
pub struct ResponseSlot<R> {
    response: Mutex<RefCell<Option<R>>>,
    armed: AtomicBool,
    idling: AtomicBool,
    triggers: AtomicU32,
}

impl<R> ResponseSlot<R> {
    pub const fn new() -> Self {
        Self {
            response: Mutex::new(RefCell::new(None)),
            armed: AtomicBool::new(false),
            idling: AtomicBool::new(false),
            triggers: AtomicU32::new(0),
        }
    }

    /// Register the response. Only one response can ever be installed.
    ///
    /// The slot reports [`MonitorState::Armed`] only once
    /// [`mark_armed`](Self::mark_armed) is called.
    ///
    /// # Errors
    /// Returns [`OsError::HandlerInstalled`] if the slot is already occupied.
    pub fn install(&self, response: R) -> OsResult<()> {
        critical_section::with(|cs| {
            let mut slot = self.response.borrow_ref_mut(cs);

            if slot.is_some() {
                return Err(OsError::HandlerInstalled);
            }

            *slot = Some(response);
            Ok(())
        })
    }

    /// Record that the event path and the monitor are both enabled.
    pub fn mark_armed(&self) {
        self.armed.store(true, Ordering::Release);
    }

    /// Record that the main path has entered its idle loop.
    pub fn mark_idle(&self) {
        self.idling.store(true, Ordering::Release);
    }

    pub fn state(&self) -> MonitorState {
        if self.triggers.load(Ordering::Acquire) > 0 {
            MonitorState::Triggered
        } else if self.idling.load(Ordering::Acquire) {
            MonitorState::Idle
        } else if self.armed.load(Ordering::Acquire) {
            MonitorState::Armed
        } else {
            MonitorState::Uninitialized
        }
    }

    /// How many times the response has run.
    pub fn triggers(&self) -> u32 {
        self.triggers.load(Ordering::Acquire)
    }

    /// Inspect the installed response.
    pub fn with_response<T>(&self, f: impl FnOnce(&R) -> T) -> Option<T> {
        critical_section::with(|cs| self.response.borrow_ref(cs).as_ref().map(f))
    }
}

impl<R: Response> ResponseSlot<R> {
    /// Run the installed response. Called from the vector entry.
    ///
    /// Returns `false` if nothing is installed, in which case the event is
    /// dropped.
    pub fn fire(&self) -> bool {
        critical_section::with(|cs| {
            let Ok(mut slot) = self.response.borrow(cs).try_borrow_mut() else {
                return false;
            };
            let Some(response) = slot.as_mut() else {
                return false;
            };

            // Only the vector writes this counter.
            let count = self.triggers.load(Ordering::Relaxed);
            self.triggers
                .store(count.wrapping_add(1).max(1), Ordering::Release);

            response.respond();
            true
        })
    }
}

impl<R> Default for ResponseSlot<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[derive(Default)]
    struct Counting(u32);

    impl Response for Counting {
        fn respond(&mut self) {
            self.0 += 1;
        }
    }

    #[test]
    fn empty_slot_drops_event() {
        let slot = ResponseSlot::<Counting>::new();
        assert!(!slot.fire());
        assert_eq!(slot.state(), MonitorState::Uninitialized);
        assert_eq!(slot.triggers(), 0);
    }

    #[test]
    fn state_follows_lifecycle() {
        let slot = ResponseSlot::new();
        slot.install(Counting::default()).unwrap();
        assert_eq!(slot.state(), MonitorState::Uninitialized);

        slot.mark_armed();
        assert_eq!(slot.state(), MonitorState::Armed);

        slot.mark_idle();
        assert_eq!(slot.state(), MonitorState::Idle);

        assert!(slot.fire());
        assert_eq!(slot.state(), MonitorState::Triggered);
        assert_eq!(slot.with_response(|r| r.0), Some(1));
    }

    #[test]
    fn second_install_is_rejected() {
        let slot = ResponseSlot::new();
        slot.install(Counting::default()).unwrap();
        assert_matches!(
            slot.install(Counting::default()),
            Err(OsError::HandlerInstalled)
        );
    }

    #[test]
    fn trigger_is_terminal() {
        let slot = ResponseSlot::new();
        slot.install(Counting::default()).unwrap();
        slot.fire();
        slot.mark_idle();
        assert_eq!(slot.state(), MonitorState::Triggered);
    }
}
