//! Exception veneers for XMC1 devices.
//!
//! The XMC1 core takes its vectors from boot ROM. The ROM entry for exception
//! `n` jumps to SRAM at `0x2000_0000 + 4 * n`, so the application has to leave
//! a jump to its own handler in that word. Each veneer is
//! `ldr r0, [pc, #imm]` followed by `mov pc, r0`, loading the handler from a
//! literal placed [`LITERAL_OFFSET`] bytes above it. Application RAM starts at
//! [`WINDOW_END`].

/// Start of the ROM-redirected SRAM window.
pub const WINDOW_START: u32 = 0x2000_0000;

/// First word past the window. Must match the XMC1 RAM origin in `build.rs`.
pub const WINDOW_END: u32 = 0x2000_0200;

/// Distance from a veneer to the literal holding its handler address.
pub const LITERAL_OFFSET: u32 = 0x100;

pub const HARD_FAULT: u8 = 3;
pub const SV_CALL: u8 = 11;
pub const PEND_SV: u8 = 14;
pub const SYS_TICK: u8 = 15;
/// Exception number of IRQ 0.
pub const IRQ0: u8 = 16;
/// Interrupt lines of the XMC1 NVIC.
pub const IRQ_LINES: u8 = 32;

/// Thumb `ldr r0, [pc, #LITERAL_OFFSET - 4]`, then `mov pc, r0`, as one word.
pub const VENEER: u32 = {
    const LDR_R0_LITERAL: u32 = 0x4800;
    const MOV_PC_R0: u32 = 0x4687;

    (MOV_PC_R0 << 16) | LDR_R0_LITERAL | ((LITERAL_OFFSET - 4) / 4)
};

/// Exceptions that get a veneer. NMI has no source on XMC1 and keeps the ROM's entry.
pub fn redirected() -> impl Iterator<Item = u8> {
    [HARD_FAULT, SV_CALL, PEND_SV, SYS_TICK]
        .into_iter()
        .chain(IRQ0..IRQ0 + IRQ_LINES)
}

/// Where the ROM jumps for `exception`.
pub const fn slot_address(exception: u8) -> u32 {
    WINDOW_START + 4 * exception as u32
}

/// Where the veneer for `exception` loads its handler from.
pub const fn literal_address(exception: u8) -> u32 {
    slot_address(exception) + LITERAL_OFFSET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rom_slots_follow_the_exception_number() {
        assert_eq!(slot_address(HARD_FAULT), 0x2000_000C);
        assert_eq!(slot_address(IRQ0 + 1), 0x2000_0044);
        assert_eq!(literal_address(IRQ0 + 1), 0x2000_0144);
    }

    #[test]
    fn veneer_encodes_ldr_then_mov_pc() {
        let ldr = VENEER & 0xFFFF;
        let mov = VENEER >> 16;

        // LDR (literal) T1 into r0, word offset 63.
        assert_eq!(ldr >> 11, 0b01001);
        assert_eq!((ldr >> 8) & 0b111, 0);
        assert_eq!((ldr & 0xFF) * 4 + 4, LITERAL_OFFSET);
        // MOV (register) T1 with Rd = pc, Rm = r0.
        assert_eq!(mov, 0x4687);
    }

    #[test]
    fn veneers_and_literals_fit_the_window() {
        let slots: Vec<u32> = redirected().map(slot_address).collect();
        let literals: Vec<u32> = redirected().map(literal_address).collect();

        let last_slot = slots.iter().max().unwrap();
        let first_literal = literals.iter().min().unwrap();
        let last_literal = literals.iter().max().unwrap();

        assert!(slots.iter().all(|&a| a >= 0x2000_000C && a % 4 == 0));
        assert!(last_slot < first_literal);
        assert!(last_literal + 4 <= WINDOW_END);
    }

    #[test]
    fn every_interrupt_line_is_redirected() {
        let exceptions: Vec<u8> = redirected().collect();
        assert!(exceptions.contains(&HARD_FAULT));
        assert!((IRQ0..IRQ0 + IRQ_LINES).all(|e| exceptions.contains(&e)));
        assert!(!exceptions.contains(&2));
    }
}
