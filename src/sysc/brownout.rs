//! Brownout monitor driver.
//!
//! Bring-up is split into type states so the required order cannot be broken:
//! the board is initialized and the LED set to its starting level before the
//! LED is handed to the vector, and the event path is enabled before the
//! monitor starts comparing.

use super::{
    hal::{BoardSupport, EventController, Halt, Indicator, SupplyMonitor, SystemPeripherals},
    ledctl::BoardLed,
    power,
    vector::{MonitorState, ResponseSlot, TriggerResponse},
    OsResult,
};
use crate::{
    config::{MonitorConfig, Variant},
    os_debug, os_info,
};

/// The response type installed by [`Initialized::arm`].
pub type BrownoutResponse<L, H> = TriggerResponse<BoardLed<L>, H>;

/// Monitor that has not touched the hardware yet.
pub struct BrownoutMonitor<B, L, E, M> {
    peripherals: SystemPeripherals<B, L, E, M>,
    variant: Variant,
}

/// Board is up and the LED shows its starting level.
pub struct Initialized<L, E, M> {
    led: BoardLed<L>,
    events: E,
    monitor: M,
    variant: Variant,
}

/// Monitor is comparing the supply. The LED belongs to the vector now.
pub struct Armed<'s, R, E, M> {
    slot: &'s ResponseSlot<R>,
    config: MonitorConfig,
    _events: E,
    _monitor: M,
}

impl<B, L, E, M> BrownoutMonitor<B, L, E, M>
where
    B: BoardSupport,
    L: Indicator,
    E: EventController,
    M: SupplyMonitor,
{
    pub const fn new(peripherals: SystemPeripherals<B, L, E, M>, variant: Variant) -> Self {
        Self {
            peripherals,
            variant,
        }
    }

    /// Bring up the board and toggle the LED once.
    ///
    /// # Errors
    /// Returns the board's error if bring-up fails. Nothing else is touched in
    /// that case.
    pub fn initialize(self) -> OsResult<Initialized<L, E, M>> {
        let SystemPeripherals {
            mut board,
            led,
            events,
            monitor,
        } = self.peripherals;

        os_debug!("Initializing {} board", self.variant);
        board.init()?;

        let mut led = BoardLed::new(led);
        led.toggle();

        Ok(Initialized {
            led,
            events,
            monitor,
            variant: self.variant,
        })
    }
}

impl<L, E, M> Initialized<L, E, M>
where
    L: Indicator,
    E: EventController,
    M: SupplyMonitor,
{
    /// Hand the LED to `slot`, enable the event path and start the monitor.
    ///
    /// # Errors
    /// Fails if the variant's configuration does not fit its registers or if
    /// `slot` already holds a response. Neither the event path nor the monitor
    /// is enabled in that case.
    pub fn arm<H: Halt>(
        mut self,
        halt: H,
        slot: &ResponseSlot<BrownoutResponse<L, H>>,
    ) -> OsResult<Armed<'_, BrownoutResponse<L, H>, E, M>> {
        let config = self.variant.monitor_config();
        config.validate(self.variant.family())?;

        slot.install(TriggerResponse::new(self.led, halt))?;

        os_debug!("Enabling {:?} for {}", config.delivery, config.vector);
        self.events.enable(config.delivery);

        os_debug!(
            "Programming monitor (threshold {}, interval {})",
            config.threshold,
            config.interval
        );
        self.monitor.enable(config.threshold, config.interval);
        slot.mark_armed();

        match config.threshold_millivolts(self.variant.family()) {
            Some(mv) => os_info!("Brownout monitor armed at {mv} mV"),
            None => os_info!("Brownout monitor armed (code {})", config.threshold),
        }

        Ok(Armed {
            slot,
            config,
            _events: self.events,
            _monitor: self.monitor,
        })
    }

    pub const fn led(&self) -> &BoardLed<L> {
        &self.led
    }
}

impl<R, E, M> Armed<'_, R, E, M> {
    /// Spin forever. Only the vector does anything from here on.
    pub fn idle(self) -> ! {
        self.slot.mark_idle();
        power::idle()
    }

    /// Spin for a bounded number of iterations.
    ///
    /// Lets a host-side simulation interleave idling with the hardware model.
    pub fn spin(&self, iterations: usize) {
        self.slot.mark_idle();
        for _ in 0..iterations {
            power::idle_step();
        }
    }

    pub const fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn state(&self) -> MonitorState {
        self.slot.state()
    }
}
