//! 65C02 additions (shared with the 65C816) and 65C02 reserved opcodes.

use super::{Emitter, Mode};
use crate::microcode::{Alu, BankSel, Cond, Index, MicroOp, Reg, Width, Wrap};

/// Decode instructions added by the 65C02.
pub(super) fn extensions(e: &mut Emitter, opcode: u8) -> bool {
    let acc = e.acc();
    let idx = e.idx();

    match opcode {
        // (zp) group-one
        0x12 => e.alu_read(Mode::Ind, Alu::Ora),
        0x32 => e.alu_read(Mode::Ind, Alu::And),
        0x52 => e.alu_read(Mode::Ind, Alu::Eor),
        0x72 => e.alu_read(Mode::Ind, Alu::Adc),
        0x92 => e.store(Mode::Ind, Reg::A, acc),
        0xB2 => e.load(Mode::Ind, Reg::A, acc),
        0xD2 => e.alu_read(Mode::Ind, Alu::Cmp),
        0xF2 => e.alu_read(Mode::Ind, Alu::Sbc),

        // TSB TRB
        0x04 => e.modify(Mode::Zp, acc, &[MicroOp::Alu(Alu::Tsb, acc)]),
        0x0C => e.modify(Mode::Abs, acc, &[MicroOp::Alu(Alu::Tsb, acc)]),
        0x14 => e.modify(Mode::Zp, acc, &[MicroOp::Alu(Alu::Trb, acc)]),
        0x1C => e.modify(Mode::Abs, acc, &[MicroOp::Alu(Alu::Trb, acc)]),

        0x1A => e.accumulator(Alu::Inc),
        0x3A => e.accumulator(Alu::Dec),

        // BIT
        0x34 => e.alu_read(Mode::ZpX, Alu::Bit),
        0x3C => e.alu_read(Mode::AbsX, Alu::Bit),
        0x89 => e.alu_read(Mode::Imm, Alu::BitImm),

        // PHX PHY PLX PLY
        0x5A => e.push_reg(Reg::Y, idx),
        0x7A => e.pull_reg(Reg::Y, idx),
        0xDA => e.push_reg(Reg::X, idx),
        0xFA => e.pull_reg(Reg::X, idx),

        // STZ
        0x64 => e.store(Mode::Zp, Reg::Zero, acc),
        0x74 => e.store(Mode::ZpX, Reg::Zero, acc),
        0x9C => e.store(Mode::Abs, Reg::Zero, acc),
        0x9E => e.store(Mode::AbsX, Reg::Zero, acc),

        0x7C => jump_indexed_indirect(e),
        0x80 => e.branch(Cond::Always),

        // RMB SMB
        op if op & 0x0F == 0x07 => {
            let bit = (op >> 4) & 7;
            let op = if op & 0x80 == 0 {
                MicroOp::ResetBit(bit)
            } else {
                MicroOp::SetBit(bit)
            };
            e.modify(Mode::Zp, Width::Byte, &[op]);
        }

        // BBR BBS
        op if op & 0x0F == 0x0F => {
            let bit = (op >> 4) & 7;
            e.push(MicroOp::ReadDp);
            e.push(MicroOp::Read);
            e.push(MicroOp::DummyRead);
            e.push(MicroOp::TestBit(bit, op & 0x80 != 0));
            e.branch(Cond::Latched);
        }

        // WAI STP
        0xCB => {
            e.internal();
            e.internal();
            e.push(MicroOp::WaitForInterrupt);
        }
        0xDB => {
            e.internal();
            e.internal();
            e.push(MicroOp::Stop);
        }

        _ => return false,
    }
    true
}

/// JMP (abs,X): pointer indexed inside the program bank.
fn jump_indexed_indirect(e: &mut Emitter) {
    e.push(MicroOp::ReadAddrLo);
    e.push(MicroOp::ReadAddrHi);
    e.internal();
    e.push(MicroOp::AddIndexInBank(Index::X));
    e.push(MicroOp::SetBank(BankSel::Program));
    e.push(MicroOp::ReadPtrLo);
    e.push(MicroOp::ReadPtrHi(Wrap::Linear));
    e.push(MicroOp::JumpAddr);
    e.path_start();
}

/// Reserved 65C02 opcodes: NOPs of assorted lengths and timings.
pub(super) fn reserved(e: &mut Emitter, opcode: u8) -> bool {
    match opcode {
        0x02 | 0x22 | 0x42 | 0x62 | 0x82 | 0xC2 | 0xE2 => e.read(Mode::Imm, Width::Byte, &[]),
        0x44 => e.read(Mode::Zp, Width::Byte, &[]),
        0x54 | 0xD4 | 0xF4 => e.read(Mode::ZpX, Width::Byte, &[]),
        0xDC | 0xFC => e.read(Mode::Abs, Width::Byte, &[]),
        0x5C => {
            e.push(MicroOp::ReadAddrLo);
            e.push(MicroOp::ReadAddrHi);
            for _ in 0..5 {
                e.push(MicroOp::DummyRead);
            }
        }
        // Single-cycle, single-byte.
        op if op & 0x07 == 0x03 => {}
        _ => return false,
    }
    true
}
