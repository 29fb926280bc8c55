//! Decode compiler: opcode + submode -> micro-program.
//!
//! Compilation is a pure function of the opcode, the submode and a few
//! global options. It runs only while dispatch tables are (re)built.
//!
//! The documented 6502 set is decoded once for every family; the helper
//! methods on [`Emitter`] pick widths, bank handling and dummy-cycle
//! flavour from the submode. Family modules layer their additions on top:
//!
//! - `nmos`: documented set plus undocumented opcodes
//! - `cmos`: 65C02 additions and reserved NOPs
//! - `wdc`: 65C816-only opcodes

mod addressing;
mod cmos;
mod nmos;
mod wdc;

pub(crate) use addressing::{Access, Mode};

use crate::flags::{D, I};
use crate::microcode::{Alu, Cond, MicroOp, PushedStatus, Reg, Width};
use crate::store::ExtendedOp;
use crate::{CpuMode, SubMode};

/// Global options that change compiled programs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodeOptions {
    /// Decode NMOS undocumented opcodes instead of reporting them.
    pub illegal_opcodes: bool,
    /// Prefix programs with history recording.
    pub history: bool,
    /// Prefix programs with path marking.
    pub pathfinding: bool,
}

/// Compile one opcode for one submode.
///
/// The returned program always ends with [`MicroOp::Fetch`].
#[must_use]
pub fn compile(opcode: u8, sub: SubMode, opts: &DecodeOptions) -> Vec<MicroOp> {
    let mut e = Emitter::new(sub, opts);
    if opts.history {
        e.push(MicroOp::RecordHistory);
    }
    if opts.pathfinding {
        e.push(MicroOp::MarkPath);
    }

    let decoded = match sub.family() {
        CpuMode::Nmos6502 => {
            nmos::documented(&mut e, opcode)
                || (opts.illegal_opcodes && nmos::undocumented(&mut e, opcode))
        }
        CpuMode::Cmos65C02 => {
            cmos::extensions(&mut e, opcode)
                || nmos::documented(&mut e, opcode)
                || cmos::reserved(&mut e, opcode)
        }
        CpuMode::W65C816 => {
            wdc::native_only(&mut e, opcode)
                || cmos::extensions(&mut e, opcode)
                || nmos::documented(&mut e, opcode)
        }
    };

    if !decoded {
        e.push(MicroOp::Unsupported);
    }
    e.finish()
}

/// Compile a reset/IRQ/NMI/ABORT sequence for one submode.
#[must_use]
pub fn compile_extended(op: ExtendedOp, sub: SubMode, opts: &DecodeOptions) -> Vec<MicroOp> {
    let mut e = Emitter::new(sub, opts);
    match op {
        ExtendedOp::Reset => {
            e.push(MicroOp::DummyReadPc);
            e.push(MicroOp::DummyReadPc);
            for _ in 0..3 {
                e.push(MicroOp::DummyStackDec);
            }
            e.push(MicroOp::ResetState);
            e.vector(0xFFFC);
        }
        ExtendedOp::Irq => e.interrupt(if sub.is_native() { 0xFFEE } else { 0xFFFE }),
        ExtendedOp::Nmi => e.interrupt(if sub.is_native() { 0xFFEA } else { 0xFFFA }),
        ExtendedOp::Abort => {
            // Only the 65C816 has an ABORT input.
            if sub.family() == CpuMode::W65C816 {
                e.interrupt(if sub.is_native() { 0xFFE8 } else { 0xFFF8 });
            }
        }
    }
    e.finish()
}

/// Token sink with submode-aware instruction helpers.
pub(crate) struct Emitter<'a> {
    ops: Vec<MicroOp>,
    sub: SubMode,
    opts: &'a DecodeOptions,
}

impl<'a> Emitter<'a> {
    fn new(sub: SubMode, opts: &'a DecodeOptions) -> Self {
        Self {
            ops: Vec::with_capacity(16),
            sub,
            opts,
        }
    }

    fn finish(mut self) -> Vec<MicroOp> {
        self.ops.push(MicroOp::Fetch);
        self.ops
    }

    pub(crate) fn push(&mut self, op: MicroOp) {
        self.ops.push(op);
    }

    pub(crate) fn extend(&mut self, ops: &[MicroOp]) {
        self.ops.extend_from_slice(ops);
    }

    pub(crate) fn family(&self) -> CpuMode {
        self.sub.family()
    }

    pub(crate) fn is_816(&self) -> bool {
        self.sub.family() == CpuMode::W65C816
    }

    pub(crate) fn native(&self) -> bool {
        self.sub.is_native()
    }

    /// Accumulator/memory operand width.
    pub(crate) fn acc(&self) -> Width {
        if self.sub.wide_accumulator() {
            Width::Word
        } else {
            Width::Byte
        }
    }

    /// Index register width.
    pub(crate) fn idx(&self) -> Width {
        if self.sub.wide_index() {
            Width::Word
        } else {
            Width::Byte
        }
    }

    /// Internal cycle: a dummy PC read on the 8-bit parts, a free bus
    /// cycle on the 65C816.
    pub(crate) fn internal(&mut self) {
        self.push(if self.is_816() {
            MicroOp::Idle
        } else {
            MicroOp::DummyReadPc
        });
    }

    /// Second internal cycle of pulls and returns.
    pub(crate) fn internal_stack(&mut self) {
        self.push(if self.is_816() {
            MicroOp::Idle
        } else {
            MicroOp::DummyStack
        });
    }

    pub(crate) fn path_start(&mut self) {
        if self.opts.pathfinding {
            self.push(MicroOp::MarkPathStart);
        }
    }

    fn record_ea(&mut self) {
        if self.opts.history {
            self.push(MicroOp::RecordEa);
        }
    }

    // ---------------------------------------------------------------------
    // Operation shapes
    // ---------------------------------------------------------------------

    /// Two-cycle implied/accumulator instruction.
    pub(crate) fn implied(&mut self, ops: &[MicroOp]) {
        self.internal();
        self.extend(ops);
    }

    /// Read an operand of `width`, then run `ops`.
    pub(crate) fn read(&mut self, mode: Mode, width: Width, ops: &[MicroOp]) {
        if mode == Mode::Imm {
            self.push(MicroOp::ReadImm);
            if width == Width::Word {
                self.push(MicroOp::ReadImmHigh);
            }
        } else {
            self.address(mode, Access::Read);
            self.push(MicroOp::Read);
            if width == Width::Word {
                self.push(MicroOp::ReadHigh);
            }
        }
        self.extend(ops);
    }

    /// Read-type instruction that updates A (or compares) with `alu`.
    pub(crate) fn alu_read(&mut self, mode: Mode, alu: Alu) {
        let w = self.acc();
        self.read(mode, w, &[MicroOp::Alu(alu, w)]);
        if self.family() == CpuMode::Cmos65C02 && matches!(alu, Alu::Adc | Alu::Sbc) {
            self.push(MicroOp::DecimalPenalty);
        }
    }

    /// Load register `reg` of `width` from memory.
    pub(crate) fn load(&mut self, mode: Mode, reg: Reg, width: Width) {
        self.read(
            mode,
            width,
            &[MicroOp::Store(reg, width), MicroOp::SetNz(width)],
        );
    }

    /// Store register `reg` of `width` to memory.
    pub(crate) fn store(&mut self, mode: Mode, reg: Reg, width: Width) {
        self.address(mode, Access::Write);
        self.push(MicroOp::Load(reg, width));
        self.write_data(width);
    }

    /// Store whatever `ops` leave in the data latch.
    pub(crate) fn store_with(&mut self, mode: Mode, ops: &[MicroOp]) {
        self.address(mode, Access::Write);
        self.extend(ops);
        self.write_data(Width::Byte);
    }

    fn write_data(&mut self, width: Width) {
        self.push(MicroOp::Write);
        if width == Width::Word {
            self.push(MicroOp::WriteHigh);
        }
    }

    /// Read-modify-write on memory.
    pub(crate) fn modify(&mut self, mode: Mode, width: Width, ops: &[MicroOp]) {
        self.modify_with(mode, Access::Modify, width, ops);
    }

    pub(crate) fn modify_with(&mut self, mode: Mode, access: Access, width: Width, ops: &[MicroOp]) {
        self.address(mode, access);
        self.push(MicroOp::Read);
        if width == Width::Word {
            self.push(MicroOp::ReadHigh);
        }
        self.push(match self.sub {
            SubMode::Nmos | SubMode::Emulation => MicroOp::DummyWrite,
            SubMode::Cmos => MicroOp::DummyRead,
            _ => MicroOp::Idle,
        });
        self.extend(ops);
        if width == Width::Word {
            self.push(MicroOp::WriteHigh);
        }
        self.push(MicroOp::Write);
    }

    /// Accumulator shift/rotate/inc/dec.
    pub(crate) fn accumulator(&mut self, alu: Alu) {
        let w = self.acc();
        self.implied(&[
            MicroOp::Load(Reg::A, w),
            MicroOp::Alu(alu, w),
            MicroOp::Store(Reg::A, w),
        ]);
    }

    /// Register increment/decrement (INX, DEY, ...).
    pub(crate) fn step_index(&mut self, reg: Reg, alu: Alu) {
        let w = self.idx();
        self.implied(&[
            MicroOp::Load(reg, w),
            MicroOp::Alu(alu, w),
            MicroOp::Store(reg, w),
        ]);
    }

    /// Register transfer; the destination decides the width.
    pub(crate) fn transfer(&mut self, from: Reg, to: Reg, width: Width, flags: bool) {
        self.internal();
        self.push(MicroOp::Load(from, width));
        self.push(MicroOp::Store(to, width));
        if flags {
            self.push(MicroOp::SetNz(width));
        }
    }

    pub(crate) fn push_reg(&mut self, reg: Reg, width: Width) {
        self.internal();
        self.push(MicroOp::Load(reg, width));
        self.push_data(width);
    }

    pub(crate) fn push_data(&mut self, width: Width) {
        if width == Width::Word {
            self.push(MicroOp::PushHigh);
        }
        self.push(MicroOp::Push);
    }

    pub(crate) fn pull_reg(&mut self, reg: Reg, width: Width) {
        self.internal();
        self.internal_stack();
        self.push(MicroOp::Pop);
        if width == Width::Word {
            self.push(MicroOp::PopHigh);
        }
        self.push(MicroOp::Store(reg, width));
        self.push(MicroOp::SetNz(width));
    }

    pub(crate) fn php(&mut self) {
        self.internal();
        self.push(MicroOp::LoadStatus(if self.native() {
            PushedStatus::Native
        } else {
            PushedStatus::Break
        }));
        self.push(MicroOp::Push);
    }

    pub(crate) fn plp(&mut self) {
        self.internal();
        self.internal_stack();
        self.push(MicroOp::Pop);
        self.push(MicroOp::StoreStatus);
    }

    pub(crate) fn branch(&mut self, cond: Cond) {
        self.push(MicroOp::ReadImm);
        self.push(MicroOp::Branch(cond));
        self.push(MicroOp::BranchFixup);
    }

    pub(crate) fn flag(&mut self, flag: u8, set: bool) {
        self.implied(&[if set {
            MicroOp::SetFlag(flag)
        } else {
            MicroOp::ClearFlag(flag)
        }]);
    }

    /// JMP abs.
    pub(crate) fn jump(&mut self) {
        self.push(MicroOp::ReadAddrLo);
        self.push(MicroOp::ReadAddrHi);
        self.push(MicroOp::JumpAddr);
        self.path_start();
    }

    /// JSR abs. The 6502s push before reading the target's high byte; the
    /// 65C816 reads both bytes first.
    pub(crate) fn call(&mut self) {
        self.push(MicroOp::ReadAddrLo);
        if self.is_816() {
            self.push(MicroOp::ReadAddrHi);
            self.push(MicroOp::DecPc);
            self.push(MicroOp::Idle);
            self.push(MicroOp::PushPch);
            self.push(MicroOp::PushPcl);
        } else {
            self.internal_stack();
            self.push(MicroOp::PushPch);
            self.push(MicroOp::PushPcl);
            self.push(MicroOp::ReadAddrHi);
        }
        self.push(MicroOp::JumpAddr);
        self.path_start();
    }

    pub(crate) fn rts(&mut self) {
        self.internal();
        self.internal_stack();
        self.push(MicroOp::PopPcl);
        self.push(MicroOp::PopPch);
        if self.is_816() {
            self.push(MicroOp::Idle);
            self.push(MicroOp::IncPc);
        } else {
            self.push(MicroOp::ReadIncPc);
        }
        self.path_start();
    }

    pub(crate) fn rti(&mut self) {
        self.internal();
        self.internal_stack();
        self.push(MicroOp::Pop);
        self.push(MicroOp::StoreStatus);
        self.push(MicroOp::PopPcl);
        self.push(MicroOp::PopPch);
        if self.native() {
            self.push(MicroOp::PopK);
        }
        self.path_start();
    }

    /// BRK/COP: software interrupt through `vector`.
    pub(crate) fn software_interrupt(&mut self, vector: u16) {
        self.push(MicroOp::ReadImm);
        self.interrupt_body(
            vector,
            if self.native() {
                PushedStatus::Native
            } else {
                PushedStatus::Break
            },
        );
    }

    /// Hardware interrupt sequence (two dummy fetches, then pushes).
    fn interrupt(&mut self, vector: u16) {
        self.push(MicroOp::DummyReadPc);
        self.push(MicroOp::DummyReadPc);
        self.interrupt_body(
            vector,
            if self.native() {
                PushedStatus::Native
            } else {
                PushedStatus::Interrupt
            },
        );
    }

    fn interrupt_body(&mut self, vector: u16, status: PushedStatus) {
        if self.native() {
            self.push(MicroOp::PushK);
        }
        self.push(MicroOp::PushPch);
        self.push(MicroOp::PushPcl);
        self.push(MicroOp::LoadStatus(status));
        self.push(MicroOp::Push);
        self.push(MicroOp::SetFlag(I));
        if self.family() != CpuMode::Nmos6502 {
            self.push(MicroOp::ClearFlag(D));
        }
        self.vector(vector);
    }

    fn vector(&mut self, vector: u16) {
        self.push(MicroOp::ReadVectorLo(vector));
        self.push(MicroOp::ReadVectorHi(vector));
        self.path_start();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> DecodeOptions {
        DecodeOptions {
            illegal_opcodes: true,
            ..DecodeOptions::default()
        }
    }

    #[test]
    fn every_program_ends_with_fetch() {
        for sub in SubMode::ALL {
            for opcode in 0..=255u8 {
                let program = compile(opcode, sub, &opts());
                assert_eq!(program.last(), Some(&MicroOp::Fetch), "{sub} ${opcode:02X}");
            }
        }
    }

    #[test]
    fn compile_is_deterministic() {
        for sub in SubMode::ALL {
            for opcode in 0..=255u8 {
                assert_eq!(compile(opcode, sub, &opts()), compile(opcode, sub, &opts()));
            }
        }
    }

    #[test]
    fn cmos_and_816_decode_every_opcode() {
        for sub in SubMode::ALL.into_iter().filter(|s| *s != SubMode::Nmos) {
            for opcode in 0..=255u8 {
                let program = compile(opcode, sub, &DecodeOptions::default());
                assert!(
                    !program.contains(&MicroOp::Unsupported),
                    "{sub} ${opcode:02X} unsupported"
                );
            }
        }
    }

    #[test]
    fn nmos_reports_undocumented_when_disabled() {
        let program = compile(0xA7, SubMode::Nmos, &DecodeOptions::default());
        assert_eq!(program, vec![MicroOp::Unsupported, MicroOp::Fetch]);

        let program = compile(0xA7, SubMode::Nmos, &opts());
        assert!(!program.contains(&MicroOp::Unsupported));
    }

    #[test]
    fn nmos_with_illegals_decodes_everything() {
        for opcode in 0..=255u8 {
            let program = compile(opcode, SubMode::Nmos, &opts());
            assert!(!program.contains(&MicroOp::Unsupported), "${opcode:02X}");
        }
    }

    #[test]
    fn history_and_path_prefixes() {
        let o = DecodeOptions {
            history: true,
            pathfinding: true,
            ..DecodeOptions::default()
        };
        let program = compile(0xAD, SubMode::Nmos, &o);
        assert_eq!(program[0], MicroOp::RecordHistory);
        assert_eq!(program[1], MicroOp::MarkPath);
        assert!(program.contains(&MicroOp::RecordEa));
    }

    #[test]
    fn wide_accumulator_reads_two_bytes() {
        let narrow = compile(0xAD, SubMode::NativeM8X8, &DecodeOptions::default());
        let wide = compile(0xAD, SubMode::NativeM16X8, &DecodeOptions::default());
        assert!(!narrow.contains(&MicroOp::ReadHigh));
        assert!(wide.contains(&MicroOp::ReadHigh));
    }

    #[test]
    fn native_interrupts_push_program_bank() {
        let native = compile_extended(ExtendedOp::Irq, SubMode::NativeM8X8, &opts());
        let emu = compile_extended(ExtendedOp::Irq, SubMode::Emulation, &opts());
        assert!(native.contains(&MicroOp::PushK));
        assert!(!emu.contains(&MicroOp::PushK));
        assert!(native.contains(&MicroOp::ReadVectorLo(0xFFEE)));
        assert!(emu.contains(&MicroOp::ReadVectorLo(0xFFFE)));
    }
}
