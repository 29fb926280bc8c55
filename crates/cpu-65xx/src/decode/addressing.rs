//! Addressing-mode token sequences.

use super::Emitter;
use crate::CpuMode;
use crate::microcode::{Index, MicroOp, Wrap};

/// Operand addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// `#imm`
    Imm,
    /// `zp` / `d`
    Zp,
    /// `zp,X`
    ZpX,
    /// `zp,Y`
    ZpY,
    /// `abs`
    Abs,
    /// `abs,X`
    AbsX,
    /// `abs,Y`
    AbsY,
    /// `(zp,X)`
    IndX,
    /// `(zp),Y`
    IndY,
    /// `(zp)`
    Ind,
    /// `al` (65C816)
    Long,
    /// `al,X` (65C816)
    LongX,
    /// `[d]` (65C816)
    IndLong,
    /// `[d],Y` (65C816)
    IndLongY,
    /// `d,S` (65C816)
    Sr,
    /// `(d,S),Y` (65C816)
    SrIndY,
}

/// What the instruction does with the effective address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Read,
    Write,
    Modify,
    /// 65C02 shifts on `abs,X`: only pay for a page crossing.
    ModifyCarry,
}

impl Emitter<'_> {
    /// Emit the tokens that form the effective address for `mode`.
    ///
    /// Immediate mode emits nothing; the caller reads the operand.
    pub(crate) fn address(&mut self, mode: Mode, access: Access) {
        match mode {
            Mode::Imm => return,
            Mode::Zp => self.direct(),
            Mode::ZpX => self.direct_indexed(Index::X),
            Mode::ZpY => self.direct_indexed(Index::Y),
            Mode::Abs => {
                self.push(MicroOp::ReadAddrLo);
                self.push(MicroOp::ReadAddrHi);
            }
            Mode::AbsX | Mode::AbsY => {
                self.push(MicroOp::ReadAddrLo);
                self.push(MicroOp::ReadAddrHi);
                self.indexed(if mode == Mode::AbsX { Index::X } else { Index::Y }, access);
            }
            Mode::IndX => {
                self.direct_indexed(Index::X);
                self.push(MicroOp::ReadPtrLo);
                self.push(MicroOp::ReadPtrHi(Wrap::Direct));
            }
            Mode::IndY => {
                self.indirect();
                self.indexed(Index::Y, access);
            }
            Mode::Ind => self.indirect(),
            Mode::Long | Mode::LongX => {
                self.push(MicroOp::ReadAddrLo);
                self.push(MicroOp::ReadAddrHi);
                self.push(MicroOp::ReadAddrBank);
                if mode == Mode::LongX {
                    self.push(MicroOp::AddIndex(Index::X));
                }
            }
            Mode::IndLong | Mode::IndLongY => {
                self.indirect();
                self.push(MicroOp::ReadPtrBank(Wrap::Direct));
                if mode == Mode::IndLongY {
                    self.push(MicroOp::AddIndex(Index::Y));
                }
            }
            Mode::Sr | Mode::SrIndY => {
                self.push(MicroOp::ReadAddrLo);
                self.push(MicroOp::Idle);
                self.push(MicroOp::StackRelative);
                if mode == Mode::SrIndY {
                    self.push(MicroOp::ReadPtrLo);
                    self.push(MicroOp::ReadPtrHi(Wrap::Linear));
                    self.push(MicroOp::Idle);
                    self.push(MicroOp::AddIndex(Index::Y));
                }
            }
        }
        self.record_ea();
    }

    fn direct(&mut self) {
        self.push(MicroOp::ReadDp);
        if self.is_816() {
            self.push(MicroOp::DpPenalty);
        }
    }

    fn direct_indexed(&mut self, index: Index) {
        self.direct();
        self.push(if self.native() {
            MicroOp::Idle
        } else {
            MicroOp::DummyRead
        });
        self.push(MicroOp::DpIndex(index));
    }

    fn indirect(&mut self) {
        self.direct();
        self.push(MicroOp::ReadPtrLo);
        self.push(MicroOp::ReadPtrHi(Wrap::Direct));
    }

    /// Index a 16-bit base and charge the page-crossing cycle.
    fn indexed(&mut self, index: Index, access: Access) {
        self.push(MicroOp::AddIndex(index));
        let native = self.native();
        let penalty = match access {
            Access::Read if native && self.sub.wide_index() => MicroOp::Idle,
            Access::Read if native => MicroOp::IdleCarry,
            Access::Read => MicroOp::ReadCarry,
            Access::ModifyCarry if self.family() == CpuMode::Cmos65C02 => MicroOp::ReadCarry,
            Access::Write | Access::Modify | Access::ModifyCarry if native => MicroOp::Idle,
            Access::Write | Access::Modify | Access::ModifyCarry => MicroOp::ReadCarryForced,
        };
        self.push(penalty);
    }
}
