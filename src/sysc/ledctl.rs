use super::hal::Indicator;

/// The board's user LED, tracking how often it has been toggled.
pub struct BoardLed<P> {
    pin: P,
    toggles: u32,
}

impl<P: Indicator> BoardLed<P> {
    pub const fn new(pin: P) -> Self {
        Self { pin, toggles: 0 }
    }

    /// Number of toggles since construction.
    pub const fn toggles(&self) -> u32 {
        self.toggles
    }

    /// Whether the LED is back at its power-on level.
    pub const fn at_initial_level(&self) -> bool {
        self.toggles % 2 == 0
    }
}

impl<P: Indicator> Indicator for BoardLed<P> {
    fn toggle(&mut self) {
        self.pin.toggle();
        self.toggles = self.toggles.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pin(bool);

    impl Indicator for Pin {
        fn toggle(&mut self) {
            self.0 = !self.0;
        }
    }

    #[test]
    fn two_toggles_restore_level() {
        let mut led = BoardLed::new(Pin(false));
        led.toggle();
        assert!(!led.at_initial_level());
        assert!(led.pin.0);

        led.toggle();
        assert!(led.at_initial_level());
        assert!(!led.pin.0);
        assert_eq!(led.toggles(), 2);
    }
}
