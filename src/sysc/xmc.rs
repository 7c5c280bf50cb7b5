//! Register-level backend for XMC1 and XMC4 devices.
//!
//! Only the handful of SCU and PORT registers the monitor needs are touched,
//! through volatile accesses at their fixed addresses.

use super::{
    hal::{BoardSupport, EventController, Halt, Indicator, SupplyMonitor, SystemPeripherals},
    veneer, OsError, OsResult,
};
use crate::config::{EventDelivery, Family, UserLed, Variant};
use core::{
    ptr,
    sync::atomic::{AtomicBool, Ordering},
};
use cortex_m::{interrupt::InterruptNumber, peripheral::NVIC};

/// SCU_INTERRUPT.SRMSK (XMC1).
const SCU_SRMSK: usize = 0x4001_0040;
/// VDDP pre-warning event.
const SRMSK_VDDPI: u32 = 1 << 3;

/// SCU_ANALOG.ANAVDEL (XMC1).
const SCU_ANAVDEL: usize = 0x4001_1050;
const ANAVDEL_VDEL_SELECT_MSK: u32 = 0b11;
const ANAVDEL_VDEL_TIM_ADJ_POS: u32 = 2;
const ANAVDEL_VDEL_TIM_ADJ_MSK: u32 = 0b11 << ANAVDEL_VDEL_TIM_ADJ_POS;
const ANAVDEL_VDEL_EN: u32 = 1 << 4;

/// SCU_TRAP.TRAPDIS (XMC4).
const SCU_TRAPDIS: usize = 0x5000_4168;
/// Brown-out trap.
const TRAP_BRWNT: u32 = 1 << 5;

/// SCU_POWER.PWRMON (XMC4).
const SCU_PWRMON: usize = 0x5000_422C;
const PWRMON_INTV_POS: u32 = 8;
const PWRMON_ENB: u32 = 1 << 16;

/// cortex-m-rt vector table on XMC1, behind the boot header written by `build.rs`.
const XMC1_VECTOR_TABLE: usize = 0x1000_1040;

const XMC1_PORT0: usize = 0x4004_0000;
const XMC4_PORT0: usize = 0x4802_8000;
const PORT_STRIDE: usize = 0x100;
const PORT_OMR: usize = 0x04;
const PORT_IOCR0: usize = 0x10;
/// IOCR pin control code for a general-purpose push-pull output.
const IOCR_PUSH_PULL: u32 = 0b1_0000 << 3;
const IOCR_PC_MSK: u32 = 0b1_1111 << 3;

static TAKEN: AtomicBool = AtomicBool::new(false);

pub type XmcPeripherals = SystemPeripherals<XmcBoard, XmcPin, XmcEvents, XmcMonitor>;

/// Hand out the monitor's peripherals for `variant`.
///
/// Nothing is touched until [`XmcBoard::init`] runs.
pub const fn take(variant: Variant) -> XmcPeripherals {
    let family = variant.family();
    let led = variant.user_led();

    SystemPeripherals {
        board: XmcBoard { family, led },
        led: XmcPin { family, led },
        events: XmcEvents(family),
        monitor: XmcMonitor(family),
    }
}

pub struct XmcBoard {
    family: Family,
    led: UserLed,
}

pub struct XmcPin {
    family: Family,
    led: UserLed,
}

pub struct XmcEvents(Family);

pub struct XmcMonitor(Family);

/// Stop at a `BKPT #0`. Without a debugger attached this escalates to HardFault.
pub struct Breakpoint;

#[derive(Clone, Copy)]
struct Irq(u16);

// SAFETY: `Irq` only carries numbers taken from the monitor configuration.
unsafe impl InterruptNumber for Irq {
    fn number(self) -> u16 {
        self.0
    }
}

impl BoardSupport for XmcBoard {
    fn init(&mut self) -> OsResult<()> {
        let already_taken = critical_section::with(|_| {
            let taken = TAKEN.load(Ordering::Relaxed);
            TAKEN.store(true, Ordering::Relaxed);
            taken
        });

        if already_taken {
            return Err(OsError::PeripheralsTaken);
        }

        if self.family == Family::Xmc1 {
            install_veneers();
        }

        let UserLed { port, pin } = self.led;
        if pin > 15 || port > 15 {
            return Err(OsError::InvalidIndicatorPin { port, pin });
        }

        let iocr = port_base(self.family, port) + PORT_IOCR0 + (usize::from(pin) / 4) * 4;
        let shift = u32::from(pin % 4) * 8;
        modify(iocr, |v| (v & !(IOCR_PC_MSK << shift)) | (IOCR_PUSH_PULL << shift));

        Ok(())
    }
}

impl Indicator for XmcPin {
    fn toggle(&mut self) {
        let UserLed { port, pin } = self.led;
        let omr = port_base(self.family, port) + PORT_OMR;

        // Setting both PS and PR inverts the output.
        write(omr, (1 << (u32::from(pin) + 16)) | (1 << pin));
    }
}

impl EventController for XmcEvents {
    fn enable(&mut self, delivery: EventDelivery) {
        match delivery {
            EventDelivery::Interrupt { irqn } => {
                modify(SCU_SRMSK, |v| v | SRMSK_VDDPI);
                // SAFETY: the vector for this line is installed before the event is enabled.
                unsafe { NVIC::unmask(Irq(irqn)) };
            }
            EventDelivery::Trap => modify(SCU_TRAPDIS, |v| v & !TRAP_BRWNT),
        }
    }
}

impl SupplyMonitor for XmcMonitor {
    fn enable(&mut self, threshold: u8, interval: u8) {
        match self.0 {
            Family::Xmc1 => write(
                SCU_ANAVDEL,
                (u32::from(threshold) & ANAVDEL_VDEL_SELECT_MSK)
                    | ((u32::from(interval) << ANAVDEL_VDEL_TIM_ADJ_POS) & ANAVDEL_VDEL_TIM_ADJ_MSK)
                    | ANAVDEL_VDEL_EN,
            ),
            Family::Xmc4 => write(
                SCU_PWRMON,
                u32::from(threshold) | (u32::from(interval) << PWRMON_INTV_POS) | PWRMON_ENB,
            ),
        }
    }
}

impl Halt for Breakpoint {
    fn halt(&mut self) {
        cortex_m::asm::bkpt();
    }
}

/// Stop at a breakpoint for good, leaving the log ring to the debugger.
pub fn park() -> ! {
    loop {
        cortex_m::asm::bkpt();
    }
}

/// Point every ROM-redirected XMC1 exception at the handler in our vector table.
fn install_veneers() {
    for exception in veneer::redirected() {
        let handler = read(XMC1_VECTOR_TABLE + 4 * usize::from(exception));
        write(veneer::literal_address(exception) as usize, handler);
        write(veneer::slot_address(exception) as usize, veneer::VENEER);
    }

    cortex_m::asm::dsb();
    cortex_m::asm::isb();
}

const fn port_base(family: Family, port: u8) -> usize {
    let port0 = match family {
        Family::Xmc1 => XMC1_PORT0,
        Family::Xmc4 => XMC4_PORT0,
    };

    port0 + (port as usize) * PORT_STRIDE
}

fn read(addr: usize) -> u32 {
    unsafe { ptr::read_volatile(addr as *const u32) }
}

fn write(addr: usize, value: u32) {
    unsafe { ptr::write_volatile(addr as *mut u32, value) };
}

fn modify(addr: usize, f: impl FnOnce(u32) -> u32) {
    unsafe {
        let reg = addr as *mut u32;
        ptr::write_volatile(reg, f(ptr::read_volatile(reg)));
    }
}
