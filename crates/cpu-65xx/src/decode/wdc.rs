//! Opcodes that only exist on the 65C816.

use super::{Emitter, Mode};
use crate::microcode::{Alu, BankSel, Direction, Index, MicroOp, Reg, Width, Wrap};

/// Modes of the 65C816's x3/x7/xF group-one columns.
fn long_group_mode(opcode: u8) -> Mode {
    match opcode & 0x1F {
        0x03 => Mode::Sr,
        0x07 => Mode::IndLong,
        0x0F => Mode::Long,
        0x13 => Mode::SrIndY,
        0x17 => Mode::IndLongY,
        _ => Mode::LongX,
    }
}

pub(super) fn native_only(e: &mut Emitter, opcode: u8) -> bool {
    const W: Width = Width::Word;
    const B: Width = Width::Byte;
    let acc = e.acc();

    match opcode {
        // ORA AND EOR ADC STA LDA CMP SBC with stack-relative and long modes
        op if matches!(op & 0x0F, 0x03 | 0x07 | 0x0F) => {
            let mode = long_group_mode(op);
            match op >> 5 {
                0 => e.alu_read(mode, Alu::Ora),
                1 => e.alu_read(mode, Alu::And),
                2 => e.alu_read(mode, Alu::Eor),
                3 => e.alu_read(mode, Alu::Adc),
                4 => e.store(mode, Reg::A, acc),
                5 => e.load(mode, Reg::A, acc),
                6 => e.alu_read(mode, Alu::Cmp),
                _ => e.alu_read(mode, Alu::Sbc),
            }
        }

        // COP
        0x02 => {
            let vector = if e.native() { 0xFFE4 } else { 0xFFF4 };
            e.software_interrupt(vector);
        }

        // Register pushes and pulls
        0x0B => e.push_reg(Reg::Dp, W),
        0x2B => e.pull_reg(Reg::Dp, W),
        0x4B => e.push_reg(Reg::Pbr, B),
        0x8B => e.push_reg(Reg::Dbr, B),
        0xAB => e.pull_reg(Reg::Dbr, B),

        // 16-bit transfers
        0x1B => e.transfer(Reg::A, Reg::S, W, false),
        0x3B => e.transfer(Reg::S, Reg::A, W, true),
        0x5B => e.transfer(Reg::A, Reg::Dp, W, true),
        0x7B => e.transfer(Reg::Dp, Reg::A, W, true),
        0x9B => {
            let w = e.idx();
            e.transfer(Reg::X, Reg::Y, w, true);
        }
        0xBB => {
            let w = e.idx();
            e.transfer(Reg::Y, Reg::X, w, true);
        }

        0xEB => {
            e.push(MicroOp::Idle);
            e.push(MicroOp::Idle);
            e.push(MicroOp::Xba);
        }
        0xFB => e.implied(&[MicroOp::Xce]),

        0xC2 => {
            e.push(MicroOp::ReadImm);
            e.push(MicroOp::Idle);
            e.push(MicroOp::Rep);
        }
        0xE2 => {
            e.push(MicroOp::ReadImm);
            e.push(MicroOp::Idle);
            e.push(MicroOp::Sep);
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

        // WDM: two-byte NOP
        0x42 => e.push(MicroOp::ReadImm),

        // JSL
        0x22 => {
            e.push(MicroOp::ReadAddrLo);
            e.push(MicroOp::ReadAddrHi);
            e.push(MicroOp::PushK);
            e.push(MicroOp::Idle);
            e.push(MicroOp::ReadAddrBank);
            e.push(MicroOp::DecPc);
            e.push(MicroOp::PushPch);
            e.push(MicroOp::PushPcl);
            e.push(MicroOp::JumpLong);
            e.path_start();
        }

        // RTL
        0x6B => {
            e.push(MicroOp::Idle);
            e.push(MicroOp::Idle);
            e.push(MicroOp::PopPcl);
            e.push(MicroOp::PopPch);
            e.push(MicroOp::PopK);
            e.push(MicroOp::IncPc);
            e.path_start();
        }

        // JML al
        0x5C => {
            e.push(MicroOp::ReadAddrLo);
            e.push(MicroOp::ReadAddrHi);
            e.push(MicroOp::ReadAddrBank);
            e.push(MicroOp::JumpLong);
            e.path_start();
        }

        // JML [a]
        0xDC => {
            e.push(MicroOp::ReadAddrLo);
            e.push(MicroOp::ReadAddrHi);
            e.push(MicroOp::SetBank(BankSel::Zero));
            e.push(MicroOp::ReadPtrLo);
            e.push(MicroOp::ReadPtrHi(Wrap::Linear));
            e.push(MicroOp::ReadPtrBank(Wrap::Linear));
            e.push(MicroOp::JumpLong);
            e.path_start();
        }

        // JSR (a,X)
        0xFC => {
            e.push(MicroOp::ReadAddrLo);
            e.push(MicroOp::PushPch);
            e.push(MicroOp::PushPcl);
            e.push(MicroOp::ReadAddrHi);
            e.push(MicroOp::Idle);
            e.push(MicroOp::AddIndexInBank(Index::X));
            e.push(MicroOp::SetBank(BankSel::Program));
            e.push(MicroOp::ReadPtrLo);
            e.push(MicroOp::ReadPtrHi(Wrap::Linear));
            e.push(MicroOp::JumpAddr);
            e.path_start();
        }

        // BRL
        0x82 => {
            e.push(MicroOp::ReadImm);
            e.push(MicroOp::ReadImmHigh);
            e.push(MicroOp::Idle);
            e.push(MicroOp::BranchLong);
            e.path_start();
        }

        // PEA
        0xF4 => {
            e.push(MicroOp::ReadImm);
            e.push(MicroOp::ReadImmHigh);
            e.push_data(W);
        }

        // PEI
        0xD4 => {
            e.push(MicroOp::ReadDp);
            e.push(MicroOp::DpPenalty);
            e.push(MicroOp::ReadPtrLo);
            e.push(MicroOp::ReadPtrHi(Wrap::Direct));
            e.push_data(W);
        }

        // PER
        0x62 => {
            e.push(MicroOp::ReadImm);
            e.push(MicroOp::ReadImmHigh);
            e.push(MicroOp::Idle);
            e.push(MicroOp::PcRelative);
            e.push_data(W);
        }

        // MVP MVN
        0x44 => block_move(e, Direction::Decrement),
        0x54 => block_move(e, Direction::Increment),

        _ => return false,
    }
    true
}

/// One byte of a block move; the instruction re-executes until C wraps.
fn block_move(e: &mut Emitter, direction: Direction) {
    e.push(MicroOp::ReadImm);
    e.push(MicroOp::Store(Reg::Dbr, Width::Byte));
    e.push(MicroOp::ReadAddrBank);
    e.push(MicroOp::MoveRead);
    e.push(MicroOp::MoveWrite(direction));
    e.push(MicroOp::Idle);
    e.push(MicroOp::Idle);
    e.push(MicroOp::MoveRepeat);
}

#[cfg(test)]
mod tests {
    use crate::SubMode;
    use crate::decode::{DecodeOptions, compile};
    use crate::microcode::{MicroOp, Timing};

    fn cycles(opcode: u8, sub: SubMode) -> usize {
        compile(opcode, sub, &DecodeOptions::default())
            .iter()
            .filter(|op| op.timing() == Timing::Bus)
            .count()
    }

    #[test]
    fn long_and_stack_relative_timings() {
        for (opcode, m8, m16) in [
            (0xAF, 5, 6), // LDA al
            (0xBF, 5, 6), // LDA al,X
            (0xA3, 4, 5), // LDA d,S
            (0xB3, 7, 8), // LDA (d,S),Y
            (0xA7, 6, 7), // LDA [d]
            (0xB7, 6, 7), // LDA [d],Y
        ] {
            assert_eq!(cycles(opcode, SubMode::NativeM8X8), m8, "${opcode:02X} m8");
            assert_eq!(cycles(opcode, SubMode::NativeM16X8), m16, "${opcode:02X} m16");
        }
    }

    #[test]
    fn control_flow_timings() {
        for (opcode, expected) in [
            (0x20, 6), // JSR a
            (0x22, 8), // JSL
            (0x6B, 6), // RTL
            (0x5C, 4), // JML al
            (0xDC, 6), // JML [a]
            (0xFC, 8), // JSR (a,X)
            (0x82, 4), // BRL
            (0xF4, 5), // PEA
            (0x62, 6), // PER
            (0x54, 7), // MVN per byte
            (0xC2, 3), // REP
            (0xEB, 3), // XBA
        ] {
            assert_eq!(cycles(opcode, SubMode::NativeM8X8), expected, "${opcode:02X}");
        }
    }

    #[test]
    fn calls_read_the_whole_target_before_pushing() {
        for (opcode, last_operand) in [(0x20, MicroOp::ReadAddrHi), (0x22, MicroOp::ReadAddrBank)] {
            for sub in [SubMode::Emulation, SubMode::NativeM16X16] {
                let program = compile(opcode, sub, &DecodeOptions::default());
                let at = |op: MicroOp| program.iter().position(|&o| o == op).unwrap();
                assert!(at(last_operand) < at(MicroOp::PushPch), "${opcode:02X} {sub}");
                assert!(at(MicroOp::DecPc) < at(MicroOp::PushPch), "${opcode:02X} {sub}");
            }
        }
    }

    #[test]
    fn native_brk_pushes_bank_and_uses_native_vector() {
        let program = compile(0x00, SubMode::NativeM8X8, &DecodeOptions::default());
        assert!(program.contains(&MicroOp::PushK));
        assert!(program.contains(&MicroOp::ReadVectorLo(0xFFE6)));
        assert_eq!(cycles(0x00, SubMode::NativeM8X8), 8);
        assert_eq!(cycles(0x00, SubMode::Emulation), 7);
    }
}
