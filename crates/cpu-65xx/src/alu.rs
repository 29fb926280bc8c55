//! Arithmetic helpers shared by the 8- and 16-bit data paths.
//!
//! Decimal mode differs per family: the NMOS part derives N/V/Z from
//! intermediate binary values, the 65C02 and 65C816 produce valid flags
//! from the corrected result.

use crate::flags::{C, N, V, Z};
use crate::{CpuMode, Status};

pub(crate) fn adc8(p: &mut Status, a: u8, m: u8, family: CpuMode) -> u8 {
    if !p.is_set(crate::flags::D) {
        return adc8_binary(p, a, m);
    }
    match family {
        CpuMode::Nmos6502 => adc8_nmos_decimal(p, a, m),
        CpuMode::Cmos65C02 => adc8_cmos_decimal(p, a, m),
        CpuMode::W65C816 => {
            let r = add_decimal(p, u16::from(a), u16::from(m), 2);
            r as u8
        }
    }
}

pub(crate) fn sbc8(p: &mut Status, a: u8, m: u8, family: CpuMode) -> u8 {
    if !p.is_set(crate::flags::D) {
        return adc8_binary(p, a, !m);
    }
    match family {
        CpuMode::Nmos6502 => sbc8_nmos_decimal(p, a, m),
        CpuMode::Cmos65C02 => sbc8_cmos_decimal(p, a, m),
        CpuMode::W65C816 => {
            let r = sub_decimal(p, u16::from(a), u16::from(m), 2);
            r as u8
        }
    }
}

pub(crate) fn adc16(p: &mut Status, a: u16, m: u16) -> u16 {
    if p.is_set(crate::flags::D) {
        add_decimal(p, a, m, 4)
    } else {
        adc16_binary(p, a, m)
    }
}

pub(crate) fn sbc16(p: &mut Status, a: u16, m: u16) -> u16 {
    if p.is_set(crate::flags::D) {
        sub_decimal(p, a, m, 4)
    } else {
        adc16_binary(p, a, !m)
    }
}

fn adc8_binary(p: &mut Status, a: u8, m: u8) -> u8 {
    let sum = u16::from(a) + u16::from(m) + u16::from(p.is_set(C));
    let result = sum as u8;
    p.set_if(C, sum > 0xFF);
    p.set_if(V, (!(a ^ m) & (a ^ result) & 0x80) != 0);
    p.update_nz(result);
    result
}

fn adc16_binary(p: &mut Status, a: u16, m: u16) -> u16 {
    let sum = u32::from(a) + u32::from(m) + u32::from(p.is_set(C));
    let result = sum as u16;
    p.set_if(C, sum > 0xFFFF);
    p.set_if(V, (!(a ^ m) & (a ^ result) & 0x8000) != 0);
    p.update_nz16(result);
    result
}

fn adc8_nmos_decimal(p: &mut Status, a: u8, m: u8) -> u8 {
    let carry = u16::from(p.is_set(C));
    let (a16, m16) = (u16::from(a), u16::from(m));

    // Z comes from the binary sum on NMOS.
    p.set_if(Z, (a16 + m16 + carry) & 0xFF == 0);

    let mut lo = (a16 & 0x0F) + (m16 & 0x0F) + carry;
    if lo > 9 {
        lo += 6;
    }
    let mut hi = (a16 >> 4) + (m16 >> 4) + u16::from(lo > 0x0F);

    p.set_if(N, (hi << 4) & 0x80 != 0);
    p.set_if(V, ((a16 ^ (hi << 4)) & !(a16 ^ m16) & 0x80) != 0);

    if hi > 9 {
        hi += 6;
    }
    p.set_if(C, hi > 0x0F);

    (((hi << 4) | (lo & 0x0F)) & 0xFF) as u8
}

fn sbc8_nmos_decimal(p: &mut Status, a: u8, m: u8) -> u8 {
    // Flags are exactly those of the binary subtraction.
    let borrow = i16::from(!p.is_set(C));
    let mut flags = *p;
    adc8_binary(&mut flags, a, !m);

    let mut lo = i16::from(a & 0x0F) - i16::from(m & 0x0F) - borrow;
    let mut hi = i16::from(a >> 4) - i16::from(m >> 4);
    if lo < 0 {
        lo -= 6;
        hi -= 1;
    }
    if hi < 0 {
        hi -= 6;
    }

    *p = flags;
    (((hi << 4) | (lo & 0x0F)) & 0xFF) as u8
}

fn adc8_cmos_decimal(p: &mut Status, a: u8, m: u8) -> u8 {
    let (a16, m16) = (u16::from(a), u16::from(m));
    let mut lo = (a16 & 0x0F) + (m16 & 0x0F) + u16::from(p.is_set(C));
    if lo >= 10 {
        lo += 6;
    }
    if lo >= 0x20 {
        lo -= 0x10;
    }

    let mut hi = (a16 & 0xF0) + (m16 & 0xF0) + lo;
    p.set_if(V, ((hi ^ a16) & !(m16 ^ a16) & 0x80) != 0);
    if hi >= 0xA0 {
        hi += 0x60;
    }
    p.set_if(C, hi >= 0x100);

    let result = hi as u8;
    p.update_nz(result);
    result
}

fn sbc8_cmos_decimal(p: &mut Status, a: u8, m: u8) -> u8 {
    let borrow = i16::from(!p.is_set(C));
    let mut flags = *p;
    adc8_binary(&mut flags, a, !m);

    let lo = i16::from(a & 0x0F) - i16::from(m & 0x0F) - borrow;
    let mut result = i16::from(a) - i16::from(m) - borrow;
    if result < 0 {
        result -= 0x60;
    }
    if lo < 0 {
        result -= 0x06;
    }

    *p = flags;
    let result = (result & 0xFF) as u8;
    p.update_nz(result);
    result
}

/// Digit-serial BCD add over `digits` nibbles (65C816).
fn add_decimal(p: &mut Status, a: u16, m: u16, digits: u32) -> u16 {
    let mut carry = u16::from(p.is_set(C));
    let mut result = 0u16;
    for digit in 0..digits {
        let shift = digit * 4;
        let mut d = ((a >> shift) & 0x0F) + ((m >> shift) & 0x0F) + carry;
        carry = u16::from(d > 9);
        if carry != 0 {
            d += 6;
        }
        result |= (d & 0x0F) << shift;
    }

    let sign = 1u16 << (digits * 4 - 1);
    p.set_if(V, (!(a ^ m) & (a ^ result) & sign) != 0);
    p.set_if(C, carry != 0);
    p.set_if(N, result & sign != 0);
    p.set_if(Z, result == 0);
    result
}

/// Digit-serial BCD subtract over `digits` nibbles (65C816).
fn sub_decimal(p: &mut Status, a: u16, m: u16, digits: u32) -> u16 {
    let mut borrow = i32::from(!p.is_set(C));
    let mut result = 0u16;
    for digit in 0..digits {
        let shift = digit * 4;
        let mut d = i32::from((a >> shift) & 0x0F) - i32::from((m >> shift) & 0x0F) - borrow;
        borrow = i32::from(d < 0);
        if borrow != 0 {
            d -= 6;
        }
        result |= ((d & 0x0F) as u16) << shift;
    }

    let sign = 1u16 << (digits * 4 - 1);
    p.set_if(V, ((a ^ m) & (a ^ result) & sign) != 0);
    p.set_if(C, borrow == 0);
    p.set_if(N, result & sign != 0);
    p.set_if(Z, result == 0);
    result
}

pub(crate) fn compare8(p: &mut Status, reg: u8, m: u8) {
    let diff = reg.wrapping_sub(m);
    p.set_if(C, reg >= m);
    p.update_nz(diff);
}

pub(crate) fn compare16(p: &mut Status, reg: u16, m: u16) {
    let diff = reg.wrapping_sub(m);
    p.set_if(C, reg >= m);
    p.update_nz16(diff);
}

/// ARR: AND then rotate right, with the NMOS decimal fixups.
pub(crate) fn arr(p: &mut Status, a: u8, m: u8) -> u8 {
    let t = a & m;
    let carry_in = u8::from(p.is_set(C));
    let mut result = (t >> 1) | (carry_in << 7);

    if p.is_set(crate::flags::D) {
        p.set_if(N, carry_in != 0);
        p.set_if(Z, result == 0);
        p.set_if(V, ((t ^ result) & 0x40) != 0);
        if (t & 0x0F) + (t & 0x01) > 5 {
            result = (result & 0xF0) | (result.wrapping_add(6) & 0x0F);
        }
        let fix_high = u16::from(t & 0xF0) + u16::from(t & 0x10) > 0x50;
        if fix_high {
            result = result.wrapping_add(0x60);
        }
        p.set_if(C, fix_high);
    } else {
        p.update_nz(result);
        p.set_if(C, result & 0x40 != 0);
        p.set_if(V, ((result >> 6) ^ (result >> 5)) & 1 != 0);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::D;

    fn status(flags: u8) -> Status {
        Status::from_byte(flags)
    }

    #[test]
    fn binary_adc_sets_overflow() {
        let mut p = status(0);
        assert_eq!(adc8(&mut p, 0x50, 0x50, CpuMode::Nmos6502), 0xA0);
        assert!(p.is_set(V));
        assert!(p.is_set(N));
        assert!(!p.is_set(C));
    }

    #[test]
    fn binary_sbc_borrows() {
        let mut p = status(C);
        assert_eq!(sbc8(&mut p, 0x10, 0x20, CpuMode::Nmos6502), 0xF0);
        assert!(!p.is_set(C));
        assert!(p.is_set(N));
    }

    #[test]
    fn decimal_adc_all_families_agree_on_valid_bcd() {
        for family in [CpuMode::Nmos6502, CpuMode::Cmos65C02, CpuMode::W65C816] {
            let mut p = status(D);
            assert_eq!(adc8(&mut p, 0x58, 0x46, family), 0x04, "{family}");
            assert!(p.is_set(C), "{family}");
        }
    }

    #[test]
    fn decimal_sbc_all_families_agree_on_valid_bcd() {
        for family in [CpuMode::Nmos6502, CpuMode::Cmos65C02, CpuMode::W65C816] {
            let mut p = status(D | C);
            assert_eq!(sbc8(&mut p, 0x12, 0x21, family), 0x91, "{family}");
            assert!(!p.is_set(C), "{family}");
        }
    }

    #[test]
    fn nmos_decimal_zero_flag_follows_binary_sum() {
        // 0x99 + 0x01 = 0x00 in BCD, but the binary sum is 0x9A.
        let mut p = status(D);
        assert_eq!(adc8(&mut p, 0x99, 0x01, CpuMode::Nmos6502), 0x00);
        assert!(!p.is_set(Z));

        let mut p = status(D);
        assert_eq!(adc8(&mut p, 0x99, 0x01, CpuMode::Cmos65C02), 0x00);
        assert!(p.is_set(Z));
    }

    #[test]
    fn sixteen_bit_decimal() {
        let mut p = status(D);
        assert_eq!(adc16(&mut p, 0x1999, 0x0001), 0x2000);
        assert!(!p.is_set(C));

        let mut p = status(D | C);
        assert_eq!(sbc16(&mut p, 0x0000, 0x0001), 0x9999);
        assert!(!p.is_set(C));
        assert!(p.is_set(N));
    }

    #[test]
    fn compare_sets_carry_when_greater_or_equal() {
        let mut p = status(0);
        compare8(&mut p, 0x40, 0x40);
        assert!(p.is_set(C));
        assert!(p.is_set(Z));
        compare16(&mut p, 0x1000, 0x2000);
        assert!(!p.is_set(C));
        assert!(p.is_set(N));
    }

    #[test]
    fn arr_binary_flags() {
        let mut p = status(C);
        let r = arr(&mut p, 0xFF, 0xC0);
        assert_eq!(r, 0xE0);
        assert!(p.is_set(C));
        assert!(!p.is_set(V));
    }
}
