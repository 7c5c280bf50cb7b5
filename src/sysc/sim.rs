//! Simulated board for hosted builds.
//!
//! [`SimBus`] stands in for the device: it remembers what was programmed,
//! models the supply comparator and keeps a journal of every call made across
//! the hardware boundary, in order.

use super::{
    hal::{BoardSupport, EventController, Halt, Indicator, SupplyMonitor, SystemPeripherals},
    vector::{Response, ResponseSlot},
    OsError, OsResult,
};
use crate::config::{EventDelivery, Family};
use core::cell::{Cell, RefCell};

/// Supply level of a healthy board.
pub const NOMINAL_SUPPLY_MV: u32 = 3300;

/// Journal entries kept. Later calls are not recorded.
pub const JOURNAL_LEN: usize = 32;

/// A call across the hardware boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    BoardInit,
    /// LED toggled. `level` is the level after the toggle.
    Toggle { level: bool },
    EventEnabled(EventDelivery),
    MonitorEnabled { threshold: u8, interval: u8 },
    Halted,
}

pub type SimPeripherals<'b> = SystemPeripherals<SimBoard<'b>, SimLed<'b>, SimEvents<'b>, SimMonitor<'b>>;

pub struct SimBus {
    family: Family,
    init_error: Option<OsError>,
    led_level: Cell<bool>,
    event: Cell<Option<EventDelivery>>,
    monitor: Cell<Option<(u8, u8)>>,
    supply_mv: Cell<u32>,
    ticks: Cell<u64>,
    toggles: Cell<u32>,
    halts: Cell<u32>,
    journal: RefCell<heapless::Vec<BusOp, JOURNAL_LEN>>,
}

impl SimBus {
    pub const fn new(family: Family) -> Self {
        Self {
            family,
            init_error: None,
            led_level: Cell::new(false),
            event: Cell::new(None),
            monitor: Cell::new(None),
            supply_mv: Cell::new(NOMINAL_SUPPLY_MV),
            ticks: Cell::new(0),
            toggles: Cell::new(0),
            halts: Cell::new(0),
            journal: RefCell::new(heapless::Vec::new()),
        }
    }

    /// A board whose bring-up fails with `error`.
    pub fn failing(family: Family, error: OsError) -> Self {
        let mut bus = Self::new(family);
        bus.init_error = Some(error);
        bus
    }

    pub const fn peripherals(&self) -> SimPeripherals<'_> {
        SystemPeripherals {
            board: SimBoard(self),
            led: SimLed(self),
            events: SimEvents(self),
            monitor: SimMonitor(self),
        }
    }

    pub const fn halt(&self) -> SimHalt<'_> {
        SimHalt(self)
    }

    pub fn set_supply_millivolts(&self, mv: u32) {
        self.supply_mv.set(mv);
    }

    pub fn led_level(&self) -> bool {
        self.led_level.get()
    }

    pub fn event_path(&self) -> Option<EventDelivery> {
        self.event.get()
    }

    /// `(threshold, interval)` as last programmed.
    pub fn monitor_settings(&self) -> Option<(u8, u8)> {
        self.monitor.get()
    }

    pub fn halts(&self) -> u32 {
        self.halts.get()
    }

    pub fn journal(&self) -> heapless::Vec<BusOp, JOURNAL_LEN> {
        self.journal.borrow().clone()
    }

    /// Number of LED toggles since power-up, journaled or not.
    pub fn toggles(&self) -> u32 {
        self.toggles.get()
    }

    /// Advance the comparator by one clock.
    ///
    /// Once both the event path and the monitor are enabled, the supply is
    /// sampled every `interval + 1` ticks. A sample below the threshold fires
    /// `slot`, as the vector would. Returns whether the slot ran.
    pub fn tick<R: Response>(&self, slot: &ResponseSlot<R>) -> bool {
        let tick = self.ticks.get().wrapping_add(1);
        self.ticks.set(tick);

        let (Some(_), Some((threshold, interval))) = (self.event.get(), self.monitor.get()) else {
            return false;
        };

        if tick % (u64::from(interval) + 1) != 0 {
            return false;
        }

        match self.family.threshold_millivolts(threshold) {
            Some(trip_mv) if self.supply_mv.get() < trip_mv => slot.fire(),
            _ => false,
        }
    }

    fn record(&self, op: BusOp) {
        // A full journal stops recording.
        let _ = self.journal.borrow_mut().push(op);
    }
}

pub struct SimBoard<'b>(&'b SimBus);
pub struct SimLed<'b>(&'b SimBus);
pub struct SimEvents<'b>(&'b SimBus);
pub struct SimMonitor<'b>(&'b SimBus);

/// Records the halt and returns, like a debugger resuming from the breakpoint.
pub struct SimHalt<'b>(&'b SimBus);

impl BoardSupport for SimBoard<'_> {
    fn init(&mut self) -> OsResult<()> {
        self.0.record(BusOp::BoardInit);
        self.0.init_error.map_or(Ok(()), Err)
    }
}

impl Indicator for SimLed<'_> {
    fn toggle(&mut self) {
        let level = !self.0.led_level.get();
        self.0.led_level.set(level);
        self.0.toggles.set(self.0.toggles.get() + 1);
        self.0.record(BusOp::Toggle { level });
    }
}

impl EventController for SimEvents<'_> {
    fn enable(&mut self, delivery: EventDelivery) {
        self.0.event.set(Some(delivery));
        self.0.record(BusOp::EventEnabled(delivery));
    }
}

impl SupplyMonitor for SimMonitor<'_> {
    fn enable(&mut self, threshold: u8, interval: u8) {
        self.0.monitor.set(Some((threshold, interval)));
        self.0.record(BusOp::MonitorEnabled {
            threshold,
            interval,
        });
    }
}

impl Halt for SimHalt<'_> {
    fn halt(&mut self) {
        self.0.halts.set(self.0.halts.get() + 1);
        self.0.record(BusOp::Halted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sysc::vector::TriggerResponse;

    fn armed_bus(family: Family, threshold: u8, interval: u8) -> SimBus {
        let bus = SimBus::new(family);
        bus.peripherals().events.enable(EventDelivery::Trap);
        bus.peripherals().monitor.enable(threshold, interval);
        bus
    }

    #[test]
    fn nothing_fires_until_both_paths_are_enabled() {
        let bus = SimBus::new(Family::Xmc4);
        let slot = ResponseSlot::new();
        slot.install(TriggerResponse::new(SimLed(&bus), SimHalt(&bus)))
            .unwrap();
        bus.set_supply_millivolts(1000);

        bus.peripherals().monitor.enable(135, 0);
        assert!(!bus.tick(&slot));

        bus.peripherals().events.enable(EventDelivery::Trap);
        assert!(bus.tick(&slot));
        assert_eq!(bus.halts(), 1);
    }

    #[test]
    fn interval_spaces_out_samples() {
        let bus = armed_bus(Family::Xmc4, 135, 3);
        let slot = ResponseSlot::new();
        slot.install(TriggerResponse::new(SimLed(&bus), SimHalt(&bus)))
            .unwrap();
        bus.set_supply_millivolts(2900);

        let fired: Vec<bool> = (0..8).map(|_| bus.tick(&slot)).collect();
        assert_eq!(
            fired,
            [false, false, false, true, false, false, false, true]
        );
    }

    #[test]
    fn supply_at_threshold_does_not_fire() {
        let bus = armed_bus(Family::Xmc1, 1, 0);
        let slot = ResponseSlot::new();
        slot.install(TriggerResponse::new(SimLed(&bus), SimHalt(&bus)))
            .unwrap();

        bus.set_supply_millivolts(3000);
        assert!(!bus.tick(&slot));

        bus.set_supply_millivolts(2999);
        assert!(bus.tick(&slot));
    }

    #[test]
    fn counters_outlive_a_full_journal() {
        let bus = armed_bus(Family::Xmc1, 1, 0);
        let slot = ResponseSlot::new();
        slot.install(TriggerResponse::new(SimLed(&bus), SimHalt(&bus)))
            .unwrap();
        bus.set_supply_millivolts(2000);

        let events = JOURNAL_LEN as u32;
        for _ in 0..events {
            assert!(bus.tick(&slot));
        }

        assert_eq!(bus.journal().len(), JOURNAL_LEN);
        assert_eq!(bus.toggles(), events);
        assert_eq!(bus.halts(), events);
    }

    #[test]
    fn failing_board_reports_its_error() {
        let bus = SimBus::failing(Family::Xmc1, OsError::BoardInit("clock"));
        assert_eq!(
            bus.peripherals().board.init(),
            Err(OsError::BoardInit("clock"))
        );
        assert_eq!(bus.journal().as_slice(), [BusOp::BoardInit]);
    }
}
