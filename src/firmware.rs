use crate::{
    config::{Variant, FIRMWARE_COMMIT, FIRMWARE_VERSION},
    os_debug, os_info,
    sysc::{
        brownout::{Armed, BrownoutMonitor, BrownoutResponse},
        hal::{BoardSupport, EventController, Halt, Indicator, SupplyMonitor, SystemPeripherals},
        vector::ResponseSlot,
        OsResult, ReportableError,
    },
};

/// Panic message when the monitor cannot be armed.
pub const START_FAILURE: &str = "Failed to start the brownout monitor";

/// Bring up the board and arm the brownout monitor for `variant`.
///
/// On success the caller is expected to [`idle`](Armed::idle); the monitor's
/// response now lives in `slot` and runs from the vector.
///
/// # Errors
/// Fails if the board cannot be brought up, if the configuration is invalid
/// or if `slot` is already in use. The firmware entry treats all of these as
/// fatal.
pub fn fw_main<'s, B, L, E, M, H>(
    peripherals: SystemPeripherals<B, L, E, M>,
    halt: H,
    variant: Variant,
    slot: &'s ResponseSlot<BrownoutResponse<L, H>>,
) -> OsResult<Armed<'s, BrownoutResponse<L, H>, E, M>>
where
    B: BoardSupport,
    L: Indicator,
    E: EventController,
    M: SupplyMonitor,
    H: Halt,
{
    os_info!(
        "XMC Brownout Monitor v{}-{}",
        FIRMWARE_VERSION,
        FIRMWARE_COMMIT
    );
    os_info!("Target: {}, user LED {}", variant, variant.user_led());

    let initialized = BrownoutMonitor::new(peripherals, variant).initialize()?;
    os_debug!("Indicator set, {} toggle(s)", initialized.led().toggles());

    let armed = initialized.arm(halt, slot)?;
    os_info!("Waiting for brownout on {}", armed.config().vector);

    Ok(armed)
}

/// Bring up and arm the monitor, or stop the firmware.
///
/// # Panics
/// If [`fw_main`] fails. None of its errors are recoverable.
pub fn start<'s, B, L, E, M, H>(
    peripherals: SystemPeripherals<B, L, E, M>,
    halt: H,
    variant: Variant,
    slot: &'s ResponseSlot<BrownoutResponse<L, H>>,
) -> Armed<'s, BrownoutResponse<L, H>, E, M>
where
    B: BoardSupport,
    L: Indicator,
    E: EventController,
    M: SupplyMonitor,
    H: Halt,
{
    match fw_main(peripherals, halt, variant, slot) {
        Ok(armed) => armed,
        Err(why) => panic!("{START_FAILURE}: {why}"),
    }
}

/// Report a recoverable error and carry on.
///
/// # Panics
/// If the error is not [`recoverable`](crate::sysc::OsError::recoverable).
pub fn tolerate(result: OsResult<()>, desc: &str) {
    if let Err(why) = result {
        assert!(why.recoverable(), "{desc}: {why}");
    }

    result.report(desc);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sysc::OsError;

    #[test]
    fn missing_logger_is_tolerated() {
        tolerate(Ok(()), "Logger unavailable");
        tolerate(Err(OsError::LoggerInit), "Logger unavailable");
    }

    #[test]
    #[should_panic(expected = "Board unavailable: peripherals already taken")]
    fn fatal_errors_are_not_tolerated() {
        tolerate(Err(OsError::PeripheralsTaken), "Board unavailable");
    }
}
