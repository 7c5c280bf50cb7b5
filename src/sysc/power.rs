use core::hint;

/// Busy-wait forever. Everything else happens in interrupt context.
pub fn idle() -> ! {
    loop {
        idle_step();
    }
}

/// One iteration of the idle loop. Has no observable effect.
#[inline(always)]
pub fn idle_step() {
    hint::spin_loop();
}
