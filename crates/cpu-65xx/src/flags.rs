//! Processor status register (P).
//!
//! Bits 4 and 5 change meaning on the 65C816 in native mode: they become
//! the index-width (X) and accumulator-width (M) flags instead of the
//! break/unused pair.

/// Carry flag - set if operation resulted in carry/borrow.
pub const C: u8 = 0x01;

/// Zero flag - set if result is zero.
pub const Z: u8 = 0x02;

/// Interrupt disable - when set, IRQ interrupts are ignored.
pub const I: u8 = 0x04;

/// Decimal mode - enables BCD arithmetic for ADC/SBC.
pub const D: u8 = 0x08;

/// Break flag - only meaningful in a pushed copy of P (8-bit modes).
pub const B: u8 = 0x10;

/// Index width - set for 8-bit X/Y (65C816 native mode only).
pub const X: u8 = 0x10;

/// Unused bit - always reads as 1 outside 65C816 native mode.
pub const U: u8 = 0x20;

/// Accumulator width - set for 8-bit A (65C816 native mode only).
pub const M: u8 = 0x20;

/// Overflow flag - set if signed arithmetic overflowed.
pub const V: u8 = 0x40;

/// Negative flag - set if result has bit 7 (or 15) set.
pub const N: u8 = 0x80;

/// Processor status register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status(pub u8);

impl Status {
    /// Create a new status register with the unused bit set.
    #[must_use]
    pub const fn new() -> Self {
        Self(U)
    }

    /// Create status from raw value, ensuring unused bit is set.
    #[must_use]
    pub const fn from_byte(value: u8) -> Self {
        Self(value | U)
    }

    /// Value pushed by BRK/PHP in 8-bit modes (break and unused both set).
    #[must_use]
    pub const fn to_byte_brk(self) -> u8 {
        self.0 | U | B
    }

    /// Value pushed by IRQ/NMI in 8-bit modes (unused set, break clear).
    #[must_use]
    pub const fn to_byte_irq(self) -> u8 {
        (self.0 | U) & !B
    }

    /// Check if a flag is set.
    #[must_use]
    pub const fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    /// Set a flag.
    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }

    /// Clear a flag.
    pub fn clear(&mut self, flag: u8) {
        self.0 &= !flag;
    }

    /// Set or clear a flag based on condition.
    pub fn set_if(&mut self, flag: u8, condition: bool) {
        if condition {
            self.set(flag);
        } else {
            self.clear(flag);
        }
    }

    /// Update N and Z flags from an 8-bit value.
    pub fn update_nz(&mut self, value: u8) {
        self.set_if(N, value & 0x80 != 0);
        self.set_if(Z, value == 0);
    }

    /// Update N and Z flags from a 16-bit value.
    pub fn update_nz16(&mut self, value: u16) {
        self.set_if(N, value & 0x8000 != 0);
        self.set_if(Z, value == 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushed_forms_differ_only_in_break() {
        let p = Status(C | N);
        assert_eq!(p.to_byte_brk(), C | N | U | B);
        assert_eq!(p.to_byte_irq(), C | N | U);
    }

    #[test]
    fn nz16_uses_bit_15() {
        let mut p = Status::new();
        p.update_nz16(0x8000);
        assert!(p.is_set(N));
        assert!(!p.is_set(Z));
        p.update_nz16(0);
        assert!(p.is_set(Z));
        assert!(!p.is_set(N));
    }
}
