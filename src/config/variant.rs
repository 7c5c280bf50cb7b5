//! Supported device series and their brownout monitor settings.

use crate::sysc::{OsError, OsResult};
use core::fmt::{self, Display};

/// XMC1 supply thresholds, indexed by the `VDEL_SELECT` code.
const XMC1_THRESHOLDS_MV: [u32; 3] = [2250, 3000, 4400];

/// Highest `VDEL_TIM_ADJ` code on XMC1 devices.
const XMC1_MAX_INTERVAL: u8 = 3;

/// Device family. Decides the register layout of the monitor and how the event is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Cortex-M0 devices. The monitor raises an SCU service request.
    Xmc1,
    /// Cortex-M4 devices. The monitor raises an SCU trap, delivered as NMI.
    Xmc4,
}

/// Device series the firmware can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Xmc11,
    Xmc12,
    Xmc13,
    Xmc14,
    Xmc42,
    Xmc43,
    Xmc44,
    Xmc45,
    Xmc47,
    Xmc48,
}

/// How the brownout event reaches software.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDelivery {
    /// SCU event routed to an NVIC interrupt line.
    Interrupt { irqn: u16 },
    /// SCU trap, delivered as a non-maskable interrupt.
    Trap,
}

/// Everything the monitor needs to be armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Supply level code below which the monitor fires.
    pub threshold: u8,
    /// How often the supply is compared against the threshold.
    pub interval: u8,
    pub delivery: EventDelivery,
    /// Vendor vector symbol that receives the event.
    pub vector: &'static str,
}

/// The evaluation kit's user LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserLed {
    pub port: u8,
    pub pin: u8,
}

impl Family {
    /// Decode a threshold code to millivolts, rounded down.
    ///
    /// Returns [`None`] for codes the family reserves.
    pub fn threshold_millivolts(self, code: u8) -> Option<u32> {
        match self {
            Self::Xmc1 => XMC1_THRESHOLDS_MV.get(code as usize).copied(),
            Self::Xmc4 => Some(u32::from(code) * 45 / 2),
        }
    }
}

impl Variant {
    pub const ALL: [Self; 10] = [
        Self::Xmc11,
        Self::Xmc12,
        Self::Xmc13,
        Self::Xmc14,
        Self::Xmc42,
        Self::Xmc43,
        Self::Xmc44,
        Self::Xmc45,
        Self::Xmc47,
        Self::Xmc48,
    ];

    /// The series chosen through Cargo features.
    ///
    /// Falls back to [`Variant::Xmc47`] when no series feature is enabled.
    /// If several are enabled, the first one in [`Variant::ALL`] order wins.
    pub const fn selected() -> Self {
        if cfg!(feature = "xmc1100") {
            Self::Xmc11
        } else if cfg!(feature = "xmc1200") {
            Self::Xmc12
        } else if cfg!(feature = "xmc1300") {
            Self::Xmc13
        } else if cfg!(feature = "xmc1400") {
            Self::Xmc14
        } else if cfg!(feature = "xmc4200") {
            Self::Xmc42
        } else if cfg!(feature = "xmc4300") {
            Self::Xmc43
        } else if cfg!(feature = "xmc4400") {
            Self::Xmc44
        } else if cfg!(feature = "xmc4500") {
            Self::Xmc45
        } else if cfg!(feature = "xmc4700") {
            Self::Xmc47
        } else if cfg!(feature = "xmc4800") {
            Self::Xmc48
        } else {
            Self::Xmc47
        }
    }

    pub const fn family(self) -> Family {
        match self {
            Self::Xmc11 | Self::Xmc12 | Self::Xmc13 | Self::Xmc14 => Family::Xmc1,
            Self::Xmc42 | Self::Xmc43 | Self::Xmc44 | Self::Xmc45 | Self::Xmc47 | Self::Xmc48 => {
                Family::Xmc4
            }
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Xmc11 => "XMC1100",
            Self::Xmc12 => "XMC1200",
            Self::Xmc13 => "XMC1300",
            Self::Xmc14 => "XMC1400",
            Self::Xmc42 => "XMC4200",
            Self::Xmc43 => "XMC4300",
            Self::Xmc44 => "XMC4400",
            Self::Xmc45 => "XMC4500",
            Self::Xmc47 => "XMC4700",
            Self::Xmc48 => "XMC4800",
        }
    }

    /// Threshold, interval and event routing for this series.
    ///
    /// XMC1 devices trip at 3.0 V with the shortest delay. XMC4 devices use
    /// code 135 (135 × 22.5 mV ≈ 3.04 V) and interval 1.
    pub const fn monitor_config(self) -> MonitorConfig {
        match self {
            Self::Xmc11 | Self::Xmc12 | Self::Xmc13 => MonitorConfig {
                threshold: 1,
                interval: 0,
                delivery: EventDelivery::Interrupt { irqn: 1 },
                vector: "SCU_1_IRQHandler",
            },
            Self::Xmc14 => MonitorConfig {
                threshold: 1,
                interval: 0,
                delivery: EventDelivery::Interrupt { irqn: 1 },
                vector: "IRQ1_Handler",
            },
            Self::Xmc42 | Self::Xmc43 | Self::Xmc44 | Self::Xmc45 | Self::Xmc47 | Self::Xmc48 => {
                MonitorConfig {
                    threshold: 135,
                    interval: 1,
                    delivery: EventDelivery::Trap,
                    vector: "NMI_Handler",
                }
            }
        }
    }

    /// User LED of the matching boot/relax kit.
    pub const fn user_led(self) -> UserLed {
        match self {
            Self::Xmc11 => UserLed { port: 1, pin: 0 },
            Self::Xmc12 | Self::Xmc13 => UserLed { port: 0, pin: 5 },
            Self::Xmc14 => UserLed { port: 4, pin: 0 },
            Self::Xmc42 | Self::Xmc43 | Self::Xmc44 | Self::Xmc45 => UserLed { port: 1, pin: 1 },
            Self::Xmc47 | Self::Xmc48 => UserLed { port: 5, pin: 9 },
        }
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Display for UserLed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}.{}", self.port, self.pin)
    }
}

impl MonitorConfig {
    pub fn threshold_millivolts(&self, family: Family) -> Option<u32> {
        family.threshold_millivolts(self.threshold)
    }

    /// Whether interrupt line `irqn` carries the monitor's event.
    pub fn owns_irq(&self, irqn: i16) -> bool {
        matches!(
            self.delivery,
            EventDelivery::Interrupt { irqn: line } if i32::from(irqn) == i32::from(line)
        )
    }

    /// Check that both codes fit the family's register fields.
    ///
    /// # Errors
    /// Returns [`OsError::InvalidMonitorConfig`] for a reserved XMC1 code, an
    /// out-of-range XMC1 interval or a zero XMC4 threshold.
    pub fn validate(&self, family: Family) -> OsResult<()> {
        let valid = match family {
            Family::Xmc1 => {
                self.threshold_millivolts(family).is_some() && self.interval <= XMC1_MAX_INTERVAL
            }
            Family::Xmc4 => self.threshold != 0,
        };

        if valid {
            Ok(())
        } else {
            Err(OsError::InvalidMonitorConfig {
                threshold: self.threshold,
                interval: self.interval,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xmc1_series_trip_at_three_volts() {
        for variant in Variant::ALL
            .into_iter()
            .filter(|v| v.family() == Family::Xmc1)
        {
            let cfg = variant.monitor_config();
            assert_eq!(cfg.threshold, 1, "{variant}");
            assert_eq!(cfg.interval, 0, "{variant}");
            assert_eq!(cfg.threshold_millivolts(Family::Xmc1), Some(3000));
            assert_eq!(cfg.delivery, EventDelivery::Interrupt { irqn: 1 });
        }
    }

    #[test]
    fn xmc4_series_use_scaled_threshold_and_trap() {
        for variant in Variant::ALL
            .into_iter()
            .filter(|v| v.family() == Family::Xmc4)
        {
            let cfg = variant.monitor_config();
            assert_eq!(cfg.threshold, 135, "{variant}");
            assert_eq!(cfg.interval, 1, "{variant}");
            assert_eq!(cfg.threshold_millivolts(Family::Xmc4), Some(3037));
            assert_eq!(cfg.delivery, EventDelivery::Trap);
            assert_eq!(cfg.vector, "NMI_Handler");
        }
    }

    #[test]
    fn xmc14_uses_multiplexed_irq_vector() {
        assert_eq!(Variant::Xmc14.monitor_config().vector, "IRQ1_Handler");
        assert_eq!(Variant::Xmc11.monitor_config().vector, "SCU_1_IRQHandler");
    }

    #[test]
    fn only_the_scu_line_belongs_to_the_monitor() {
        let cfg = Variant::Xmc11.monitor_config();
        assert!(cfg.owns_irq(1));
        assert!(!cfg.owns_irq(0));
        assert!(!cfg.owns_irq(-1));

        let cfg = Variant::Xmc47.monitor_config();
        assert!((-16..48).all(|irqn| !cfg.owns_irq(irqn)));
    }

    #[test]
    fn every_builtin_config_is_valid() {
        for variant in Variant::ALL {
            assert!(variant.monitor_config().validate(variant.family()).is_ok());
        }
    }

    #[test]
    fn reserved_xmc1_codes_are_rejected() {
        let cfg = MonitorConfig {
            threshold: 3,
            ..Variant::Xmc11.monitor_config()
        };
        assert_eq!(cfg.threshold_millivolts(Family::Xmc1), None);
        assert!(cfg.validate(Family::Xmc1).is_err());

        let cfg = MonitorConfig {
            interval: 4,
            ..Variant::Xmc11.monitor_config()
        };
        assert!(cfg.validate(Family::Xmc1).is_err());
    }

    #[test]
    fn zero_xmc4_threshold_is_rejected() {
        let cfg = MonitorConfig {
            threshold: 0,
            ..Variant::Xmc47.monitor_config()
        };
        assert!(cfg.validate(Family::Xmc4).is_err());
    }

    #[test]
    fn default_selection_without_features() {
        if cfg!(not(any(
            feature = "xmc1100",
            feature = "xmc1200",
            feature = "xmc1300",
            feature = "xmc1400",
            feature = "xmc4200",
            feature = "xmc4300",
            feature = "xmc4400",
            feature = "xmc4500",
            feature = "xmc4700",
            feature = "xmc4800"
        ))) {
            assert_eq!(Variant::selected(), Variant::Xmc47);
        }
    }

    #[test]
    fn user_led_formats_as_port_pin() {
        let led = Variant::Xmc47.user_led();
        let mut text = heapless::String::<8>::new();
        core::fmt::write(&mut text, format_args!("{led}")).unwrap();
        assert_eq!(text, "P5.9");
    }
}
