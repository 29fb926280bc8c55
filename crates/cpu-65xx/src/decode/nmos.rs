//! Documented 6502 instruction set (all families) and NMOS undocumented
//! opcodes.

use super::{Access, Emitter, Mode};
use crate::CpuMode;
use crate::flags::{C, D, I, V};
use crate::microcode::{Alu, BankSel, Cond, HighAnd, MicroOp, Reg, Width, Wrap};

/// Addressing mode selected by bits 2-4 of a group-one opcode.
fn group_one_mode(opcode: u8) -> Mode {
    match (opcode >> 2) & 7 {
        0 => Mode::IndX,
        1 => Mode::Zp,
        2 => Mode::Imm,
        3 => Mode::Abs,
        4 => Mode::IndY,
        5 => Mode::ZpX,
        6 => Mode::AbsY,
        _ => Mode::AbsX,
    }
}

/// Decode the 151 documented NMOS opcodes.
///
/// Widths, bank handling and dummy cycles follow the emitter's submode,
/// so the same table serves the 65C02 and the 65C816.
pub(super) fn documented(e: &mut Emitter, opcode: u8) -> bool {
    let acc = e.acc();
    let idx = e.idx();

    match opcode {
        // ORA AND EOR ADC STA LDA CMP SBC
        op if op & 0x03 == 0x01 => {
            let mode = group_one_mode(op);
            match op >> 5 {
                0 => e.alu_read(mode, Alu::Ora),
                1 => e.alu_read(mode, Alu::And),
                2 => e.alu_read(mode, Alu::Eor),
                3 => e.alu_read(mode, Alu::Adc),
                4 if mode == Mode::Imm => return false,
                4 => e.store(mode, Reg::A, acc),
                5 => e.load(mode, Reg::A, acc),
                6 => e.alu_read(mode, Alu::Cmp),
                _ => e.alu_read(mode, Alu::Sbc),
            }
        }

        // ASL ROL LSR ROR
        0x06 | 0x26 | 0x46 | 0x66 => e.modify(Mode::Zp, acc, &[shift_op(opcode, acc)]),
        0x0E | 0x2E | 0x4E | 0x6E => e.modify(Mode::Abs, acc, &[shift_op(opcode, acc)]),
        0x16 | 0x36 | 0x56 | 0x76 => e.modify(Mode::ZpX, acc, &[shift_op(opcode, acc)]),
        0x1E | 0x3E | 0x5E | 0x7E => {
            e.modify_with(Mode::AbsX, Access::ModifyCarry, acc, &[shift_op(opcode, acc)]);
        }
        0x0A => e.accumulator(Alu::Asl),
        0x2A => e.accumulator(Alu::Rol),
        0x4A => e.accumulator(Alu::Lsr),
        0x6A => e.accumulator(Alu::Ror),

        // DEC INC
        0xC6 => e.modify(Mode::Zp, acc, &[MicroOp::Alu(Alu::Dec, acc)]),
        0xCE => e.modify(Mode::Abs, acc, &[MicroOp::Alu(Alu::Dec, acc)]),
        0xD6 => e.modify(Mode::ZpX, acc, &[MicroOp::Alu(Alu::Dec, acc)]),
        0xDE => e.modify(Mode::AbsX, acc, &[MicroOp::Alu(Alu::Dec, acc)]),
        0xE6 => e.modify(Mode::Zp, acc, &[MicroOp::Alu(Alu::Inc, acc)]),
        0xEE => e.modify(Mode::Abs, acc, &[MicroOp::Alu(Alu::Inc, acc)]),
        0xF6 => e.modify(Mode::ZpX, acc, &[MicroOp::Alu(Alu::Inc, acc)]),
        0xFE => e.modify(Mode::AbsX, acc, &[MicroOp::Alu(Alu::Inc, acc)]),

        // BIT
        0x24 => e.alu_read(Mode::Zp, Alu::Bit),
        0x2C => e.alu_read(Mode::Abs, Alu::Bit),

        // LDX LDY
        0xA2 => e.load(Mode::Imm, Reg::X, idx),
        0xA6 => e.load(Mode::Zp, Reg::X, idx),
        0xAE => e.load(Mode::Abs, Reg::X, idx),
        0xB6 => e.load(Mode::ZpY, Reg::X, idx),
        0xBE => e.load(Mode::AbsY, Reg::X, idx),
        0xA0 => e.load(Mode::Imm, Reg::Y, idx),
        0xA4 => e.load(Mode::Zp, Reg::Y, idx),
        0xAC => e.load(Mode::Abs, Reg::Y, idx),
        0xB4 => e.load(Mode::ZpX, Reg::Y, idx),
        0xBC => e.load(Mode::AbsX, Reg::Y, idx),

        // STX STY
        0x86 => e.store(Mode::Zp, Reg::X, idx),
        0x8E => e.store(Mode::Abs, Reg::X, idx),
        0x96 => e.store(Mode::ZpY, Reg::X, idx),
        0x84 => e.store(Mode::Zp, Reg::Y, idx),
        0x8C => e.store(Mode::Abs, Reg::Y, idx),
        0x94 => e.store(Mode::ZpX, Reg::Y, idx),

        // CPX CPY
        0xE0 => e.read(Mode::Imm, idx, &[MicroOp::Alu(Alu::Cpx, idx)]),
        0xE4 => e.read(Mode::Zp, idx, &[MicroOp::Alu(Alu::Cpx, idx)]),
        0xEC => e.read(Mode::Abs, idx, &[MicroOp::Alu(Alu::Cpx, idx)]),
        0xC0 => e.read(Mode::Imm, idx, &[MicroOp::Alu(Alu::Cpy, idx)]),
        0xC4 => e.read(Mode::Zp, idx, &[MicroOp::Alu(Alu::Cpy, idx)]),
        0xCC => e.read(Mode::Abs, idx, &[MicroOp::Alu(Alu::Cpy, idx)]),

        // Register increments
        0xE8 => e.step_index(Reg::X, Alu::Inc),
        0xCA => e.step_index(Reg::X, Alu::Dec),
        0xC8 => e.step_index(Reg::Y, Alu::Inc),
        0x88 => e.step_index(Reg::Y, Alu::Dec),

        // Transfers
        0xAA => e.transfer(Reg::A, Reg::X, idx, true),
        0xA8 => e.transfer(Reg::A, Reg::Y, idx, true),
        0x8A => e.transfer(Reg::X, Reg::A, acc, true),
        0x98 => e.transfer(Reg::Y, Reg::A, acc, true),
        0xBA => e.transfer(Reg::S, Reg::X, idx, true),
        0x9A => {
            let w = if e.native() { Width::Word } else { Width::Byte };
            e.transfer(Reg::X, Reg::S, w, false);
        }

        // Stack
        0x48 => e.push_reg(Reg::A, acc),
        0x68 => e.pull_reg(Reg::A, acc),
        0x08 => e.php(),
        0x28 => e.plp(),

        // Flags
        0x18 => e.flag(C, false),
        0x38 => e.flag(C, true),
        0x58 => e.implied(&[MicroOp::Cli]),
        0x78 => e.flag(I, true),
        0xB8 => e.flag(V, false),
        0xD8 => e.flag(D, false),
        0xF8 => e.flag(D, true),

        // Branches
        0x10 => e.branch(Cond::Plus),
        0x30 => e.branch(Cond::Minus),
        0x50 => e.branch(Cond::OverflowClear),
        0x70 => e.branch(Cond::OverflowSet),
        0x90 => e.branch(Cond::CarryClear),
        0xB0 => e.branch(Cond::CarrySet),
        0xD0 => e.branch(Cond::NotEqual),
        0xF0 => e.branch(Cond::Equal),

        // Control flow
        0x00 => {
            let vector = if e.native() { 0xFFE6 } else { 0xFFFE };
            e.software_interrupt(vector);
        }
        0x20 => e.call(),
        0x40 => e.rti(),
        0x4C => e.jump(),
        0x60 => e.rts(),
        0x6C => jump_indirect(e),

        0xEA => e.implied(&[]),

        _ => return false,
    }
    true
}

fn shift_op(opcode: u8, width: Width) -> MicroOp {
    let alu = match opcode >> 5 {
        0 => Alu::Asl,
        1 => Alu::Rol,
        2 => Alu::Lsr,
        _ => Alu::Ror,
    };
    MicroOp::Alu(alu, width)
}

/// JMP (abs). The NMOS part wraps the pointer inside its page; the 65C02
/// fixes that at the cost of a cycle.
fn jump_indirect(e: &mut Emitter) {
    e.push(MicroOp::ReadAddrLo);
    e.push(MicroOp::ReadAddrHi);
    e.push(MicroOp::SetBank(BankSel::Zero));
    let wrap = match e.family() {
        CpuMode::Nmos6502 => Wrap::Page,
        CpuMode::Cmos65C02 => {
            e.push(MicroOp::DummyReadPc);
            Wrap::Linear
        }
        CpuMode::W65C816 => Wrap::Linear,
    };
    e.push(MicroOp::ReadPtrLo);
    e.push(MicroOp::ReadPtrHi(wrap));
    e.push(MicroOp::JumpAddr);
    e.path_start();
}

/// Decode the NMOS undocumented opcodes.
pub(super) fn undocumented(e: &mut Emitter, opcode: u8) -> bool {
    const B: Width = Width::Byte;

    match opcode {
        // Immediate oddities in the x3 column's immediate slot
        0x0B | 0x2B => e.read(Mode::Imm, B, &[MicroOp::Alu(Alu::Anc, B)]),
        0x4B => e.read(
            Mode::Imm,
            B,
            &[
                MicroOp::Alu(Alu::And, B),
                MicroOp::Load(Reg::A, B),
                MicroOp::Alu(Alu::Lsr, B),
                MicroOp::Store(Reg::A, B),
            ],
        ),
        0x6B => e.read(Mode::Imm, B, &[MicroOp::Alu(Alu::Arr, B)]),
        0x8B => e.read(Mode::Imm, B, &[MicroOp::Alu(Alu::Xaa, B)]),
        0xAB => e.read(Mode::Imm, B, &[MicroOp::Alu(Alu::Lxa, B)]),
        0xCB => e.read(Mode::Imm, B, &[MicroOp::Alu(Alu::Sbx, B)]),
        0xEB => e.read(Mode::Imm, B, &[MicroOp::Alu(Alu::Sbc, B)]),

        // SAX
        0x83 => e.store_with(Mode::IndX, &[MicroOp::Alu(Alu::Sax, B)]),
        0x87 => e.store_with(Mode::Zp, &[MicroOp::Alu(Alu::Sax, B)]),
        0x8F => e.store_with(Mode::Abs, &[MicroOp::Alu(Alu::Sax, B)]),
        0x97 => e.store_with(Mode::ZpY, &[MicroOp::Alu(Alu::Sax, B)]),

        // SHA SHX SHY TAS
        0x93 => e.store_with(Mode::IndY, &[MicroOp::StoreHighAnd(HighAnd::Ax)]),
        0x9F => e.store_with(Mode::AbsY, &[MicroOp::StoreHighAnd(HighAnd::Ax)]),
        0x9E => e.store_with(Mode::AbsY, &[MicroOp::StoreHighAnd(HighAnd::X)]),
        0x9C => e.store_with(Mode::AbsX, &[MicroOp::StoreHighAnd(HighAnd::Y)]),
        0x9B => e.store_with(Mode::AbsY, &[MicroOp::StoreHighAnd(HighAnd::Tas)]),

        // LAX LAS
        0xA3 | 0xA7 | 0xAF | 0xB3 => lax(e, group_one_mode(opcode)),
        0xB7 => lax(e, Mode::ZpY),
        0xBF => lax(e, Mode::AbsY),
        0xBB => e.read(Mode::AbsY, B, &[MicroOp::Alu(Alu::Las, B)]),

        // SLO RLA SRE RRA DCP ISB
        op if op & 0x03 == 0x03 => {
            let (first, second) = match op >> 5 {
                0 => (Alu::Asl, Alu::Ora),
                1 => (Alu::Rol, Alu::And),
                2 => (Alu::Lsr, Alu::Eor),
                3 => (Alu::Ror, Alu::Adc),
                6 => (Alu::Dec, Alu::Cmp),
                7 => (Alu::Inc, Alu::Sbc),
                _ => return false,
            };
            e.modify(
                group_one_mode(op),
                B,
                &[MicroOp::Alu(first, B), MicroOp::Alu(second, B)],
            );
        }

        // NOPs
        0x1A | 0x3A | 0x5A | 0x7A | 0xDA | 0xFA => e.implied(&[]),
        0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 => e.read(Mode::Imm, B, &[]),
        0x04 | 0x44 | 0x64 => e.read(Mode::Zp, B, &[]),
        0x14 | 0x34 | 0x54 | 0x74 | 0xD4 | 0xF4 => e.read(Mode::ZpX, B, &[]),
        0x0C => e.read(Mode::Abs, B, &[]),
        0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => e.read(Mode::AbsX, B, &[]),

        // JAM
        0x02 | 0x12 | 0x22 | 0x32 | 0x42 | 0x52 | 0x62 | 0x72 | 0x92 | 0xB2 | 0xD2 | 0xF2 => {
            e.push(MicroOp::Jam);
        }

        _ => return false,
    }
    true
}

fn lax(e: &mut Emitter, mode: Mode) {
    e.read(
        mode,
        Width::Byte,
        &[
            MicroOp::Store(Reg::A, Width::Byte),
            MicroOp::Store(Reg::X, Width::Byte),
            MicroOp::SetNz(Width::Byte),
        ],
    );
}
