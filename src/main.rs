#![cfg_attr(target_os = "none", no_std, no_main)]
#![warn(clippy::unwrap_used)]

#[cfg(target_os = "none")]
mod device {
    use cortex_m_rt::{entry, exception};
    use xmcbod::{
        config::{EventDelivery, VARIANT},
        firmware, os_error,
        sysc::{
            brownout::BrownoutResponse,
            logging::LOGGER,
            vector::ResponseSlot,
            xmc::{self, Breakpoint, XmcPin},
        },
    };

    /// Response run by the brownout vector. Filled in by `fw_main`.
    static BROWNOUT: ResponseSlot<BrownoutResponse<XmcPin, Breakpoint>> = ResponseSlot::new();

    #[entry]
    fn main() -> ! {
        firmware::tolerate(LOGGER.init(), "Logger unavailable");

        firmware::start(xmc::take(VARIANT), Breakpoint, VARIANT, &BROWNOUT).idle()
    }

    /// `SCU_1_IRQHandler` / `IRQ1_Handler` on XMC1. Every other line is unexpected.
    #[exception]
    unsafe fn DefaultHandler(irqn: i16) {
        if VARIANT.monitor_config().owns_irq(irqn) {
            BROWNOUT.fire();
        } else {
            os_error!("Unexpected interrupt {irqn}");
            xmc::park()
        }
    }

    /// `NMI_Handler` on XMC4. The SCU brownout trap arrives here.
    #[exception]
    unsafe fn NonMaskableInt() {
        if VARIANT.monitor_config().delivery == EventDelivery::Trap {
            BROWNOUT.fire();
        }
    }
}

#[cfg(not(target_os = "none"))]
mod host {
    use xmcbod::{
        config::VARIANT,
        firmware, os_info, os_warn,
        sysc::{
            logging::LOGGER,
            sim::{SimBus, NOMINAL_SUPPLY_MV},
            vector::{MonitorState, ResponseSlot},
        },
    };

    const COLOR_INFO: &str = "\x1b[1;94m";
    const COLOR_WARN: &str = "\x1b[1;33m";
    const COLOR_ERROR: &str = "\x1b[1;91m";
    const COLOR_DEBUG: &str = "\x1b[1;95m";
    const RESET_COLOR: &str = "\x1b[0m";

    /// Supply drop per simulation step.
    const SAG_STEP_MV: u32 = 25;
    /// Idle iterations between two comparator clocks.
    const IDLE_SPIN: usize = 1_000;

    /// Boot on the simulated board, then sag the supply until the monitor trips.
    pub fn run() {
        firmware::tolerate(LOGGER.init(), "Logger unavailable");

        let bus = SimBus::new(VARIANT.family());
        let slot = ResponseSlot::new();

        let armed = firmware::start(bus.peripherals(), bus.halt(), VARIANT, &slot);
        flush_log();

        let interval = armed.config().interval;
        let mut supply_mv = NOMINAL_SUPPLY_MV;

        while armed.state() != MonitorState::Triggered && supply_mv > 0 {
            supply_mv = supply_mv.saturating_sub(SAG_STEP_MV);
            bus.set_supply_millivolts(supply_mv);

            for _ in 0..=interval {
                armed.spin(IDLE_SPIN);
                bus.tick(&slot);
            }
        }

        if armed.state() == MonitorState::Triggered {
            os_info!(
                "Brownout detected at {supply_mv} mV, LED toggled {} times, halted {} time(s)",
                bus.toggles(),
                bus.halts()
            );
        } else {
            os_warn!("Supply reached 0 mV without a brownout event");
        }

        flush_log();
    }

    fn flush_log() {
        LOGGER.drain(|line| {
            let color = match line.split_whitespace().next() {
                Some("INFO") => COLOR_INFO,
                Some("WARN") => COLOR_WARN,
                Some("ERROR") => COLOR_ERROR,
                Some("DEBUG") => COLOR_DEBUG,
                _ => RESET_COLOR,
            };

            println!("{color}{line}{RESET_COLOR}");
        });
    }
}

#[cfg(not(target_os = "none"))]
fn main() {
    host::run();
}
