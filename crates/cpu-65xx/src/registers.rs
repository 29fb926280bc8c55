//! 65xx register file.

use crate::Status;
use crate::flags::{I, M, U, X};

/// 65xx register set.
///
/// Every 8-bit register carries a shadow high byte used only by the 65C816
/// in native mode:
/// - A/AH: accumulator (the 16-bit pair is called C)
/// - X/XH, Y/YH: index registers (high bytes forced to 0 with 8-bit index)
/// - S/SH: stack pointer (SH forced to 1 in 8-bit modes)
/// - PC: program counter, with K as program bank
/// - DBR: data bank, D: direct page base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    pub a: u8,
    pub ah: u8,
    pub x: u8,
    pub xh: u8,
    pub y: u8,
    pub yh: u8,
    pub s: u8,
    pub sh: u8,
    /// Program counter.
    pub pc: u16,
    /// Processor status flags.
    pub p: Status,
    /// Emulation flag. Always true for the 8-bit families.
    pub e: bool,
    /// Data bank register.
    pub dbr: u8,
    /// Program bank register (K).
    pub pbr: u8,
    /// Direct page register.
    pub d: u16,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// Registers in power-on state.
    ///
    /// A, X and Y are undefined on real hardware; we use 0. S is $FD as it
    /// would be after a reset from an all-zero stack pointer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            a: 0,
            ah: 0,
            x: 0,
            xh: 0,
            y: 0,
            yh: 0,
            s: 0xFD,
            sh: 0x01,
            pc: 0,
            p: Status(U | I | M | X),
            e: true,
            dbr: 0,
            pbr: 0,
            d: 0,
        }
    }

    /// 16-bit accumulator (C = AH:A).
    #[must_use]
    pub const fn c(&self) -> u16 {
        u16::from_le_bytes([self.a, self.ah])
    }

    pub fn set_c(&mut self, value: u16) {
        [self.a, self.ah] = value.to_le_bytes();
    }

    #[must_use]
    pub const fn x16(&self) -> u16 {
        u16::from_le_bytes([self.x, self.xh])
    }

    pub fn set_x16(&mut self, value: u16) {
        [self.x, self.xh] = value.to_le_bytes();
    }

    #[must_use]
    pub const fn y16(&self) -> u16 {
        u16::from_le_bytes([self.y, self.yh])
    }

    pub fn set_y16(&mut self, value: u16) {
        [self.y, self.yh] = value.to_le_bytes();
    }

    #[must_use]
    pub const fn s16(&self) -> u16 {
        u16::from_le_bytes([self.s, self.sh])
    }

    /// Set the full stack pointer; SH stays 1 in emulation mode.
    pub fn set_s16(&mut self, value: u16) {
        [self.s, self.sh] = value.to_le_bytes();
        if self.e {
            self.sh = 0x01;
        }
    }

    /// Program counter with program bank, as a 24-bit bus address.
    #[must_use]
    pub const fn pc24(&self) -> u32 {
        ((self.pbr as u32) << 16) | self.pc as u32
    }

    /// Push a value onto the stack, return the address to write.
    pub fn push(&mut self) -> u32 {
        let addr = u32::from(self.s16());
        if self.e {
            self.s = self.s.wrapping_sub(1);
        } else {
            self.set_s16(self.s16().wrapping_sub(1));
        }
        addr
    }

    /// Pop a value from the stack, return the address to read.
    pub fn pop(&mut self) -> u32 {
        if self.e {
            self.s = self.s.wrapping_add(1);
        } else {
            self.set_s16(self.s16().wrapping_add(1));
        }
        u32::from(self.s16())
    }

    /// Current stack address without modifying S.
    #[must_use]
    pub const fn stack_addr(&self) -> u32 {
        self.s16() as u32
    }

    /// Apply the width invariants implied by E and P.X.
    ///
    /// 8-bit index zeroes XH/YH; emulation mode forces M, X and SH.
    pub fn enforce_widths(&mut self) {
        if self.e {
            self.p.set(M | X);
            self.sh = 0x01;
        }
        if self.p.is_set(X) {
            self.xh = 0;
            self.yh = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emulation_stack_wraps_in_page_one() {
        let mut regs = Registers::new();
        regs.s = 0x00;
        assert_eq!(regs.push(), 0x0100);
        assert_eq!(regs.s, 0xFF);
        assert_eq!(regs.sh, 0x01);
        assert_eq!(regs.pop(), 0x0100);
    }

    #[test]
    fn native_stack_is_sixteen_bits() {
        let mut regs = Registers::new();
        regs.e = false;
        regs.set_s16(0x0200);
        assert_eq!(regs.push(), 0x0200);
        assert_eq!(regs.s16(), 0x01FF);
        assert_eq!(regs.pop(), 0x0200);
    }

    #[test]
    fn narrowing_index_zeroes_high_bytes() {
        let mut regs = Registers::new();
        regs.e = false;
        regs.p.clear(X);
        regs.set_x16(0x1234);
        regs.set_c(0xBEEF);
        regs.p.set(X);
        regs.enforce_widths();
        assert_eq!(regs.x16(), 0x0034);
        assert_eq!(regs.c(), 0xBEEF);
    }
}
