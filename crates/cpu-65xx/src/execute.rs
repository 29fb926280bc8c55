//! Token interpreter.
//!
//! [`Cpu65xx::execute`] performs one micro-operation against the host. Bus
//! tokens perform exactly one read, write or idle cycle; everything else
//! only touches registers and latches.

use crate::alu;
use crate::cpu::{Cpu65xx, Flow, StepResult};
use crate::flags::{C, D, I, M, N, V, X, Z};
use crate::microcode::{
    Alu, BankSel, Cond, Direction, HighAnd, Index, MicroOp, PushedStatus, Reg, Timing, Width, Wrap,
};
use crate::{CpuMode, Host};

impl Cpu65xx {
    pub(crate) fn execute<H: Host>(&mut self, op: MicroOp, host: &mut H) -> Flow {
        match op {
            // ---------------------------------------------------------------
            // Sequencing
            // ---------------------------------------------------------------
            MicroOp::Fetch => self.fetch(host),
            MicroOp::Jam | MicroOp::Stop => {
                self.halted = true;
                Flow::Hold(StepResult::Idle)
            }
            MicroOp::WaitForInterrupt => {
                if self.signals.wakes() {
                    Flow::Next
                } else {
                    Flow::Hold(StepResult::Idle)
                }
            }
            MicroOp::Unsupported => Flow::Event(self.report_unsupported()),

            // ---------------------------------------------------------------
            // Instrumentation
            // ---------------------------------------------------------------
            MicroOp::RecordHistory => {
                self.record_history(host);
                Flow::Next
            }
            MicroOp::RecordEa => {
                let ea = self.latch.ea();
                if let Some(entry) = self.debug.history_mut().and_then(|h| h.newest_mut()) {
                    entry.ea = Some(ea);
                }
                Flow::Next
            }
            MicroOp::MarkPath => {
                self.debug.mark_path(self.latch.insn_pc);
                Flow::Next
            }
            MicroOp::MarkPathStart => {
                self.debug.mark_path_start(self.regs.pc24());
                Flow::Next
            }

            // ---------------------------------------------------------------
            // Bus cycles
            // ---------------------------------------------------------------
            MicroOp::DummyReadPc => {
                host.read(self.regs.pc24());
                Flow::Cycle
            }
            MicroOp::DummyRead => {
                host.read(self.latch.ea());
                Flow::Cycle
            }
            MicroOp::DummyStack => {
                host.read(self.regs.stack_addr());
                Flow::Cycle
            }
            MicroOp::DummyStackDec => {
                let addr = self.regs.push();
                host.read(addr);
                Flow::Cycle
            }
            MicroOp::DummyWrite => {
                host.write(self.latch.ea(), self.latch.data as u8);
                Flow::Cycle
            }
            MicroOp::Idle => Flow::Cycle,
            MicroOp::ReadImm => {
                self.latch.data = u16::from(self.read_pc(host));
                Flow::Cycle
            }
            MicroOp::ReadImmHigh => {
                let high = self.read_pc(host);
                self.set_data_high(high);
                Flow::Cycle
            }
            MicroOp::ReadDp => {
                let offset = self.read_pc(host);
                self.latch.addr = self.regs.d.wrapping_add(u16::from(offset));
                self.latch.bank = 0;
                Flow::Cycle
            }
            MicroOp::ReadAddrLo => {
                self.latch.addr = u16::from(self.read_pc(host));
                self.latch.bank = self.regs.dbr;
                Flow::Cycle
            }
            MicroOp::ReadAddrHi => {
                let high = self.read_pc(host);
                self.latch.addr = (self.latch.addr & 0x00FF) | (u16::from(high) << 8);
                self.latch.bank = self.regs.dbr;
                Flow::Cycle
            }
            MicroOp::ReadAddrBank => {
                self.latch.bank = self.read_pc(host);
                Flow::Cycle
            }
            MicroOp::ReadPtrLo => {
                self.latch.ptr = self.latch.ea();
                self.latch.data = u16::from(host.read(self.latch.ptr));
                Flow::Cycle
            }
            MicroOp::ReadPtrHi(wrap) => {
                let next = self.pointer_next(wrap);
                let high = host.read(next);
                self.set_data_high(high);
                self.latch.ptr = next;
                self.latch.addr = self.latch.data;
                self.latch.bank = self.regs.dbr;
                Flow::Cycle
            }
            MicroOp::ReadPtrBank(wrap) => {
                let next = match wrap {
                    // Long pointers never wrap inside the direct page.
                    Wrap::Direct => u32::from((self.latch.ptr as u16).wrapping_add(1)),
                    _ => self.pointer_next(wrap),
                };
                self.latch.bank = host.read(next);
                Flow::Cycle
            }
            MicroOp::Read => {
                self.latch.data = u16::from(host.read(self.latch.ea()));
                Flow::Cycle
            }
            MicroOp::ReadHigh => {
                let high = host.read(self.ea_next());
                self.set_data_high(high);
                Flow::Cycle
            }
            MicroOp::Write => {
                host.write(self.latch.ea(), self.latch.data as u8);
                Flow::Cycle
            }
            MicroOp::WriteHigh => {
                host.write(self.ea_next(), (self.latch.data >> 8) as u8);
                Flow::Cycle
            }
            MicroOp::ReadVectorLo(vector) => {
                self.latch.data = u16::from(host.read(u32::from(vector)));
                Flow::Cycle
            }
            MicroOp::ReadVectorHi(vector) => {
                let high = host.read(u32::from(vector.wrapping_add(1)));
                self.regs.pc = (self.latch.data & 0x00FF) | (u16::from(high) << 8);
                self.regs.pbr = 0;
                Flow::Cycle
            }
            MicroOp::ReadIncPc => {
                host.read(self.regs.pc24());
                self.regs.pc = self.regs.pc.wrapping_add(1);
                Flow::Cycle
            }
            MicroOp::Push => {
                let addr = self.regs.push();
                host.write(addr, self.latch.data as u8);
                Flow::Cycle
            }
            MicroOp::PushHigh => {
                let addr = self.regs.push();
                host.write(addr, (self.latch.data >> 8) as u8);
                Flow::Cycle
            }
            MicroOp::PushPch => {
                let addr = self.regs.push();
                host.write(addr, (self.regs.pc >> 8) as u8);
                Flow::Cycle
            }
            MicroOp::PushPcl => {
                let addr = self.regs.push();
                host.write(addr, self.regs.pc as u8);
                Flow::Cycle
            }
            MicroOp::PushK => {
                let addr = self.regs.push();
                host.write(addr, self.regs.pbr);
                Flow::Cycle
            }
            MicroOp::Pop => {
                let addr = self.regs.pop();
                self.latch.data = u16::from(host.read(addr));
                Flow::Cycle
            }
            MicroOp::PopHigh => {
                let addr = self.regs.pop();
                let high = host.read(addr);
                self.set_data_high(high);
                Flow::Cycle
            }
            MicroOp::PopPcl => {
                let addr = self.regs.pop();
                let low = host.read(addr);
                self.regs.pc = (self.regs.pc & 0xFF00) | u16::from(low);
                Flow::Cycle
            }
            MicroOp::PopPch => {
                let addr = self.regs.pop();
                let high = host.read(addr);
                self.regs.pc = (self.regs.pc & 0x00FF) | (u16::from(high) << 8);
                Flow::Cycle
            }
            MicroOp::PopK => {
                let addr = self.regs.pop();
                self.regs.pbr = host.read(addr);
                Flow::Cycle
            }
            MicroOp::MoveRead => {
                let source = (u32::from(self.latch.bank) << 16) | u32::from(self.regs.x16());
                self.latch.data = u16::from(host.read(source));
                Flow::Cycle
            }
            MicroOp::MoveWrite(direction) => {
                let dest = (u32::from(self.regs.dbr) << 16) | u32::from(self.regs.y16());
                host.write(dest, self.latch.data as u8);
                self.step_move_indices(direction);
                Flow::Cycle
            }

            // ---------------------------------------------------------------
            // Conditional cycles
            // ---------------------------------------------------------------
            MicroOp::ReadCarry => {
                if self.latch.page_crossed {
                    host.read(self.latch.base);
                    Flow::Cycle
                } else {
                    Flow::Next
                }
            }
            MicroOp::ReadCarryForced => {
                host.read(self.latch.base);
                Flow::Cycle
            }
            MicroOp::IdleCarry => {
                if self.latch.page_crossed {
                    Flow::Cycle
                } else {
                    Flow::Next
                }
            }
            MicroOp::DpPenalty => {
                if self.regs.d & 0x00FF == 0 {
                    Flow::Next
                } else {
                    Flow::Cycle
                }
            }
            MicroOp::DecimalPenalty => {
                if self.regs.p.is_set(D) {
                    host.read(self.regs.pc24());
                    Flow::Cycle
                } else {
                    Flow::Next
                }
            }
            MicroOp::Branch(cond) => self.branch(cond, host),
            MicroOp::BranchFixup => {
                host.read(self.latch.base);
                Flow::Cycle
            }

            // ---------------------------------------------------------------
            // Address arithmetic
            // ---------------------------------------------------------------
            MicroOp::DpIndex(index) => {
                let offset = self.index(index);
                self.latch.addr = if self.regs.e && self.regs.d & 0x00FF == 0 {
                    (self.latch.addr & 0xFF00) | (self.latch.addr.wrapping_add(offset) & 0x00FF)
                } else {
                    self.latch.addr.wrapping_add(offset)
                };
                Flow::Next
            }
            MicroOp::AddIndex(index) => {
                self.add_index(index);
                Flow::Next
            }
            MicroOp::AddIndexInBank(index) => {
                self.latch.addr = self.latch.addr.wrapping_add(self.index(index));
                Flow::Next
            }
            MicroOp::StackRelative => {
                self.latch.addr = self.regs.s16().wrapping_add(self.latch.addr);
                self.latch.bank = 0;
                Flow::Next
            }
            MicroOp::SetBank(sel) => {
                self.latch.bank = match sel {
                    BankSel::Zero => 0,
                    BankSel::Data => self.regs.dbr,
                    BankSel::Program => self.regs.pbr,
                };
                Flow::Next
            }

            // ---------------------------------------------------------------
            // Data movement and ALU
            // ---------------------------------------------------------------
            MicroOp::Load(reg, width) => {
                self.latch.data = self.load(reg, width);
                Flow::Next
            }
            MicroOp::Store(reg, width) => {
                self.store_reg(reg, width);
                Flow::Next
            }
            MicroOp::SetNz(width) => {
                self.set_nz(self.latch.data, width);
                Flow::Next
            }
            MicroOp::LoadStatus(format) => {
                let p = self.regs.p;
                self.latch.data = u16::from(match format {
                    PushedStatus::Break => p.to_byte_brk(),
                    PushedStatus::Interrupt => p.to_byte_irq(),
                    PushedStatus::Native => p.0,
                });
                Flow::Next
            }
            MicroOp::StoreStatus => {
                let was_masked = self.regs.p.is_set(I);
                self.regs.p.0 = self.latch.data as u8;
                self.sync_submode();
                // PLP unmasking waits one instruction; RTI does not.
                if was_masked && !self.regs.p.is_set(I) && self.latch.opcode == 0x28 {
                    self.signals.release_irq();
                }
                Flow::Next
            }
            MicroOp::Alu(op, width) => {
                self.alu(op, width);
                Flow::Next
            }
            MicroOp::StoreHighAnd(which) => {
                self.store_high_and(which);
                Flow::Next
            }
            MicroOp::SetFlag(flag) => {
                self.regs.p.set(flag);
                Flow::Next
            }
            MicroOp::ClearFlag(flag) => {
                self.regs.p.clear(flag);
                Flow::Next
            }
            MicroOp::Cli => {
                if self.regs.p.is_set(I) {
                    self.regs.p.clear(I);
                    self.signals.release_irq();
                }
                Flow::Next
            }
            MicroOp::Rep => {
                self.regs.p.clear(self.latch.data as u8);
                self.sync_submode();
                Flow::Next
            }
            MicroOp::Sep => {
                self.regs.p.set(self.latch.data as u8);
                self.sync_submode();
                Flow::Next
            }
            MicroOp::Xce => {
                let carry = self.regs.p.is_set(C);
                self.regs.p.set_if(C, self.regs.e);
                self.regs.e = carry;
                self.sync_submode();
                Flow::Next
            }
            MicroOp::Xba => {
                std::mem::swap(&mut self.regs.a, &mut self.regs.ah);
                self.regs.p.update_nz(self.regs.a);
                Flow::Next
            }
            MicroOp::ResetState => {
                self.reset_state();
                Flow::Next
            }
            MicroOp::TestBit(bit, state) => {
                self.latch.test = ((self.latch.data >> bit) & 1 != 0) == state;
                Flow::Next
            }
            MicroOp::ResetBit(bit) => {
                self.latch.data &= !(1 << bit);
                Flow::Next
            }
            MicroOp::SetBit(bit) => {
                self.latch.data |= 1 << bit;
                Flow::Next
            }

            // ---------------------------------------------------------------
            // Control flow
            // ---------------------------------------------------------------
            MicroOp::JumpAddr => {
                self.regs.pc = self.latch.addr;
                Flow::Next
            }
            MicroOp::JumpLong => {
                self.regs.pc = self.latch.addr;
                self.regs.pbr = self.latch.bank;
                Flow::Next
            }
            MicroOp::BranchLong => {
                self.regs.pc = self.regs.pc.wrapping_add(self.latch.data);
                Flow::Next
            }
            MicroOp::IncPc => {
                self.regs.pc = self.regs.pc.wrapping_add(1);
                Flow::Next
            }
            MicroOp::DecPc => {
                self.regs.pc = self.regs.pc.wrapping_sub(1);
                Flow::Next
            }
            MicroOp::PcRelative => {
                self.latch.data = self.regs.pc.wrapping_add(self.latch.data);
                Flow::Next
            }
            MicroOp::MoveRepeat => {
                let count = self.regs.c().wrapping_sub(1);
                self.regs.set_c(count);
                if count != 0xFFFF {
                    self.regs.pc = self.regs.pc.wrapping_sub(3);
                }
                Flow::Next
            }
        }
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    fn read_pc<H: Host>(&mut self, host: &mut H) -> u8 {
        let value = host.read(self.regs.pc24());
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    fn set_data_high(&mut self, high: u8) {
        self.latch.data = (self.latch.data & 0x00FF) | (u16::from(high) << 8);
    }

    /// Address of the second byte of a 16-bit operand. Bank 0 wraps at
    /// 64K; other banks carry into the next.
    fn ea_next(&self) -> u32 {
        if self.latch.bank == 0 {
            u32::from(self.latch.addr.wrapping_add(1))
        } else {
            (self.latch.ea() + 1) & 0xFF_FFFF
        }
    }

    /// Address of the byte after the pointer.
    fn pointer_next(&self, wrap: Wrap) -> u32 {
        let ptr = self.latch.ptr;
        match wrap {
            Wrap::Page => (ptr & 0xFF_FF00) | (ptr.wrapping_add(1) & 0xFF),
            Wrap::Direct if self.regs.e && self.regs.d & 0x00FF == 0 => {
                (ptr & 0xFF_FF00) | (ptr.wrapping_add(1) & 0xFF)
            }
            Wrap::Direct => u32::from((ptr as u16).wrapping_add(1)),
            Wrap::Linear => Self::bank_offset(ptr, 1),
        }
    }

    fn index(&self, index: Index) -> u16 {
        match index {
            Index::X => self.regs.x16(),
            Index::Y => self.regs.y16(),
        }
    }

    /// EA += index. The 8-bit families wrap at 64K; the 65C816 carries
    /// into the next bank.
    fn add_index(&mut self, index: Index) {
        let old = self.latch.ea();
        let sum = old + u32::from(self.index(index));
        let new = if self.store.mode() == CpuMode::W65C816 {
            sum & 0xFF_FFFF
        } else {
            sum & 0xFFFF
        };
        self.latch.base = (old & 0xFF_FF00) | (new & 0xFF);
        self.latch.page_crossed = (old ^ new) & 0xFF_FF00 != 0;
        self.latch.addr = new as u16;
        self.latch.bank = (new >> 16) as u8;
    }

    fn condition(&self, cond: Cond) -> bool {
        let p = self.regs.p;
        match cond {
            Cond::Plus => !p.is_set(N),
            Cond::Minus => p.is_set(N),
            Cond::OverflowClear => !p.is_set(V),
            Cond::OverflowSet => p.is_set(V),
            Cond::CarryClear => !p.is_set(C),
            Cond::CarrySet => p.is_set(C),
            Cond::NotEqual => !p.is_set(Z),
            Cond::Equal => p.is_set(Z),
            Cond::Always => true,
            Cond::Latched => self.latch.test,
        }
    }

    /// True if `op` would take no time in the current state.
    pub(crate) fn is_free(&self, op: MicroOp) -> bool {
        match op.timing() {
            Timing::Instant => true,
            Timing::Conditional => match op {
                MicroOp::ReadCarry | MicroOp::IdleCarry => !self.latch.page_crossed,
                MicroOp::DpPenalty => self.regs.d & 0x00FF == 0,
                MicroOp::DecimalPenalty => !self.regs.p.is_set(D),
                MicroOp::Branch(cond) => !self.condition(cond),
                _ => false,
            },
            Timing::Bus | Timing::Event => false,
        }
    }

    fn branch<H: Host>(&mut self, cond: Cond, host: &mut H) -> Flow {
        let taken = self.condition(cond);
        if !taken {
            // Skip the fixup.
            self.cursor += 1;
            return Flow::Next;
        }

        host.read(self.regs.pc24());
        let old = self.regs.pc;
        let new = old.wrapping_add(self.latch.data as u8 as i8 as u16);
        self.regs.pc = new;
        self.latch.base = (u32::from(self.regs.pbr) << 16) | u32::from((old & 0xFF00) | (new & 0x00FF));
        let crossed = (old ^ new) & 0xFF00 != 0;
        if !crossed || self.submode.is_native() {
            self.cursor += 1;
        }
        Flow::Cycle
    }

    fn step_move_indices(&mut self, direction: Direction) {
        let step = |v: u16| match direction {
            Direction::Increment => v.wrapping_add(1),
            Direction::Decrement => v.wrapping_sub(1),
        };
        if self.regs.p.is_set(X) {
            self.regs.x = step(u16::from(self.regs.x)) as u8;
            self.regs.y = step(u16::from(self.regs.y)) as u8;
        } else {
            self.regs.set_x16(step(self.regs.x16()));
            self.regs.set_y16(step(self.regs.y16()));
        }
    }

    fn load(&self, reg: Reg, width: Width) -> u16 {
        let r = &self.regs;
        let wide = width == Width::Word;
        match reg {
            Reg::A if wide => r.c(),
            Reg::A => u16::from(r.a),
            Reg::X if wide => r.x16(),
            Reg::X => u16::from(r.x),
            Reg::Y if wide => r.y16(),
            Reg::Y => u16::from(r.y),
            Reg::S if wide => r.s16(),
            Reg::S => u16::from(r.s),
            Reg::Dbr => u16::from(r.dbr),
            Reg::Pbr => u16::from(r.pbr),
            Reg::Dp => r.d,
            Reg::Zero => 0,
        }
    }

    fn store_reg(&mut self, reg: Reg, width: Width) {
        let value = self.latch.data;
        let r = &mut self.regs;
        let wide = width == Width::Word;
        match reg {
            Reg::A if wide => r.set_c(value),
            Reg::A => r.a = value as u8,
            Reg::X if wide => r.set_x16(value),
            Reg::X => r.x = value as u8,
            Reg::Y if wide => r.set_y16(value),
            Reg::Y => r.y = value as u8,
            Reg::S if wide => r.set_s16(value),
            Reg::S => r.s = value as u8,
            Reg::Dbr => r.dbr = value as u8,
            Reg::Pbr => r.pbr = value as u8,
            Reg::Dp => r.d = value,
            Reg::Zero => {}
        }
    }

    fn set_nz(&mut self, value: u16, width: Width) {
        match width {
            Width::Byte => self.regs.p.update_nz(value as u8),
            Width::Word => self.regs.p.update_nz16(value),
        }
    }

    fn reset_state(&mut self) {
        let family = self.store.mode();
        self.regs.p.set(I);
        if family != CpuMode::Nmos6502 {
            self.regs.p.clear(D);
        }
        if family == CpuMode::W65C816 {
            self.regs.e = true;
            self.regs.p.set(M | X);
            self.regs.sh = 0x01;
            self.regs.xh = 0;
            self.regs.yh = 0;
            self.regs.dbr = 0;
            self.regs.pbr = 0;
            self.regs.d = 0;
        }
        self.halted = false;
        self.sync_submode();
    }

    fn store_high_and(&mut self, which: HighAnd) {
        let high = ((self.latch.base >> 8) as u8).wrapping_add(1);
        let r = &mut self.regs;
        let value = match which {
            HighAnd::Ax => r.a & r.x & high,
            HighAnd::X => r.x & high,
            HighAnd::Y => r.y & high,
            HighAnd::Tas => {
                r.s = r.a & r.x;
                r.s & high
            }
        };
        self.latch.data = u16::from(value);
        if self.latch.page_crossed {
            self.latch.addr = (u16::from(value) << 8) | (self.latch.addr & 0x00FF);
        }
    }

    fn alu(&mut self, op: Alu, width: Width) {
        match width {
            Width::Byte => self.alu8(op),
            Width::Word => self.alu16(op),
        }
    }

    fn alu8(&mut self, op: Alu) {
        let family = self.store.mode();
        let m = self.latch.data as u8;
        let r = &mut self.regs;
        let p = &mut r.p;
        match op {
            Alu::Ora => {
                r.a |= m;
                p.update_nz(r.a);
            }
            Alu::And => {
                r.a &= m;
                p.update_nz(r.a);
            }
            Alu::Eor => {
                r.a ^= m;
                p.update_nz(r.a);
            }
            Alu::Adc => r.a = alu::adc8(p, r.a, m, family),
            Alu::Sbc => r.a = alu::sbc8(p, r.a, m, family),
            Alu::Cmp => alu::compare8(p, r.a, m),
            Alu::Cpx => alu::compare8(p, r.x, m),
            Alu::Cpy => alu::compare8(p, r.y, m),
            Alu::Bit => {
                p.set_if(N, m & 0x80 != 0);
                p.set_if(V, m & 0x40 != 0);
                p.set_if(Z, r.a & m == 0);
            }
            Alu::BitImm => p.set_if(Z, r.a & m == 0),
            Alu::Asl => {
                p.set_if(C, m & 0x80 != 0);
                self.latch.data = u16::from(m << 1);
                p.update_nz(m << 1);
            }
            Alu::Lsr => {
                p.set_if(C, m & 0x01 != 0);
                self.latch.data = u16::from(m >> 1);
                p.update_nz(m >> 1);
            }
            Alu::Rol => {
                let result = (m << 1) | u8::from(p.is_set(C));
                p.set_if(C, m & 0x80 != 0);
                self.latch.data = u16::from(result);
                p.update_nz(result);
            }
            Alu::Ror => {
                let result = (m >> 1) | (u8::from(p.is_set(C)) << 7);
                p.set_if(C, m & 0x01 != 0);
                self.latch.data = u16::from(result);
                p.update_nz(result);
            }
            Alu::Inc => {
                let result = m.wrapping_add(1);
                self.latch.data = u16::from(result);
                p.update_nz(result);
            }
            Alu::Dec => {
                let result = m.wrapping_sub(1);
                self.latch.data = u16::from(result);
                p.update_nz(result);
            }
            Alu::Tsb => {
                p.set_if(Z, r.a & m == 0);
                self.latch.data = u16::from(m | r.a);
            }
            Alu::Trb => {
                p.set_if(Z, r.a & m == 0);
                self.latch.data = u16::from(m & !r.a);
            }
            Alu::Anc => {
                r.a &= m;
                p.update_nz(r.a);
                p.set_if(C, r.a & 0x80 != 0);
            }
            Alu::Arr => r.a = alu::arr(p, r.a, m),
            Alu::Xaa => {
                r.a = (r.a | XAA_MAGIC) & r.x & m;
                p.update_nz(r.a);
            }
            Alu::Lxa => {
                r.a = (r.a | XAA_MAGIC) & m;
                r.x = r.a;
                p.update_nz(r.a);
            }
            Alu::Las => {
                let value = r.s & m;
                r.a = value;
                r.x = value;
                r.s = value;
                p.update_nz(value);
            }
            Alu::Sbx => {
                let t = r.a & r.x;
                p.set_if(C, t >= m);
                r.x = t.wrapping_sub(m);
                p.update_nz(r.x);
            }
            Alu::Sax => self.latch.data = u16::from(r.a & r.x),
        }
    }

    fn alu16(&mut self, op: Alu) {
        let m = self.latch.data;
        let r = &mut self.regs;
        let c = r.c();
        match op {
            Alu::Ora | Alu::And | Alu::Eor => {
                let result = match op {
                    Alu::Ora => c | m,
                    Alu::And => c & m,
                    _ => c ^ m,
                };
                r.set_c(result);
                r.p.update_nz16(result);
            }
            Alu::Adc => {
                let result = alu::adc16(&mut r.p, c, m);
                r.set_c(result);
            }
            Alu::Sbc => {
                let result = alu::sbc16(&mut r.p, c, m);
                r.set_c(result);
            }
            Alu::Cmp => alu::compare16(&mut r.p, c, m),
            Alu::Cpx => {
                let x = r.x16();
                alu::compare16(&mut r.p, x, m);
            }
            Alu::Cpy => {
                let y = r.y16();
                alu::compare16(&mut r.p, y, m);
            }
            Alu::Bit => {
                r.p.set_if(N, m & 0x8000 != 0);
                r.p.set_if(V, m & 0x4000 != 0);
                r.p.set_if(Z, c & m == 0);
            }
            Alu::BitImm => r.p.set_if(Z, c & m == 0),
            Alu::Asl | Alu::Lsr | Alu::Rol | Alu::Ror | Alu::Inc | Alu::Dec => {
                let carry = u16::from(r.p.is_set(C));
                let (result, carry_out) = match op {
                    Alu::Asl => (m << 1, Some(m & 0x8000 != 0)),
                    Alu::Lsr => (m >> 1, Some(m & 1 != 0)),
                    Alu::Rol => ((m << 1) | carry, Some(m & 0x8000 != 0)),
                    Alu::Ror => ((m >> 1) | (carry << 15), Some(m & 1 != 0)),
                    Alu::Inc => (m.wrapping_add(1), None),
                    _ => (m.wrapping_sub(1), None),
                };
                if let Some(carry_out) = carry_out {
                    r.p.set_if(C, carry_out);
                }
                r.p.update_nz16(result);
                self.latch.data = result;
            }
            Alu::Tsb => {
                r.p.set_if(Z, c & m == 0);
                self.latch.data = m | c;
            }
            Alu::Trb => {
                r.p.set_if(Z, c & m == 0);
                self.latch.data = m & !c;
            }
            // NMOS-only operations never compile with a wide operand.
            Alu::Anc | Alu::Arr | Alu::Xaa | Alu::Lxa | Alu::Las | Alu::Sbx | Alu::Sax => {
                self.alu8(op);
            }
        }
    }
}

/// Chip-dependent constant ORed into A by XAA and LXA.
const XAA_MAGIC: u8 = 0xEE;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cpu65xx;
    use emu_core::{Bus, SimpleBus};

    /// Run whole instructions; returns cycles taken by the last one.
    fn run(cpu: &mut Cpu65xx, bus: &mut SimpleBus, instructions: usize) -> u32 {
        let mut cycles = 0;
        for _ in 0..instructions {
            cycles = 0;
            loop {
                let result = cpu.advance(bus);
                bus.tick(false);
                assert_eq!(result, StepResult::Cycle);
                cycles += 1;
                if !cpu.is_instruction_in_progress() {
                    break;
                }
            }
        }
        cycles
    }

    fn cpu_at(mode: CpuMode, pc: u16, code: &[u8]) -> (Cpu65xx, SimpleBus) {
        let mut cpu = Cpu65xx::new(mode);
        let mut bus = SimpleBus::new();
        bus.load(u32::from(pc), code);
        cpu.regs.pc = pc;
        (cpu, bus)
    }

    #[test]
    fn absolute_x_page_cross_costs_a_cycle() {
        let (mut cpu, mut bus) = cpu_at(CpuMode::Nmos6502, 0x0200, &[0xBD, 0xF0, 0x10, 0xBD, 0x00, 0x10]);
        cpu.regs.x = 0x20;
        bus.load(0x1110, &[0x77]);
        assert_eq!(run(&mut cpu, &mut bus, 1), 5);
        assert_eq!(cpu.regs.a, 0x77);
        assert_eq!(run(&mut cpu, &mut bus, 1), 4);
    }

    #[test]
    fn branch_timings() {
        // BNE not taken, BEQ taken same page, BEQ taken across a page.
        let (mut cpu, mut bus) = cpu_at(CpuMode::Nmos6502, 0x02F0, &[0xD0, 0x05, 0xF0, 0x02]);
        cpu.regs.p.set(Z);
        assert_eq!(run(&mut cpu, &mut bus, 1), 2);
        assert_eq!(run(&mut cpu, &mut bus, 1), 3);
        assert_eq!(cpu.regs.pc, 0x02F6);

        bus.load(0x02F6, &[0xF0, 0x10]);
        assert_eq!(run(&mut cpu, &mut bus, 1), 4);
        assert_eq!(cpu.regs.pc, 0x0308);
    }

    #[test]
    fn zero_page_x_wraps() {
        let (mut cpu, mut bus) = cpu_at(CpuMode::Nmos6502, 0x0200, &[0xB5, 0xF0]);
        cpu.regs.x = 0x20;
        bus.load(0x0010, &[0x5A]);
        assert_eq!(run(&mut cpu, &mut bus, 1), 4);
        assert_eq!(cpu.regs.a, 0x5A);
    }

    #[test]
    fn nmos_rmw_writes_twice() {
        let (mut cpu, mut bus) = cpu_at(CpuMode::Nmos6502, 0x0200, &[0xE6, 0x10]);
        bus.load(0x0010, &[0xFF]);
        assert_eq!(run(&mut cpu, &mut bus, 1), 5);
        assert_eq!(bus.peek(0x10), 0x00);
        assert!(cpu.regs.p.is_set(Z));
    }

    #[test]
    fn jsr_rts_round_trip() {
        let (mut cpu, mut bus) = cpu_at(CpuMode::Nmos6502, 0x0200, &[0x20, 0x00, 0x03]);
        bus.load(0x0300, &[0x60]);
        cpu.regs.s = 0xFF;
        assert_eq!(run(&mut cpu, &mut bus, 1), 6);
        assert_eq!(cpu.regs.pc, 0x0300);
        assert_eq!(bus.peek(0x01FF), 0x02);
        assert_eq!(bus.peek(0x01FE), 0x02);
        assert_eq!(run(&mut cpu, &mut bus, 1), 6);
        assert_eq!(cpu.regs.pc, 0x0203);
        assert_eq!(cpu.regs.s, 0xFF);
    }

    #[test]
    fn decimal_adc_penalty_on_cmos() {
        let (mut cpu, mut bus) = cpu_at(CpuMode::Cmos65C02, 0x0200, &[0x69, 0x01, 0x69, 0x01]);
        assert_eq!(run(&mut cpu, &mut bus, 1), 2);
        cpu.regs.p.set(D);
        cpu.regs.a = 0x09;
        assert_eq!(run(&mut cpu, &mut bus, 1), 3);
        assert_eq!(cpu.regs.a, 0x10);
    }

    #[test]
    fn tsb_sets_bits_and_tests() {
        let (mut cpu, mut bus) = cpu_at(CpuMode::Cmos65C02, 0x0200, &[0x04, 0x10]);
        bus.load(0x0010, &[0xF0]);
        cpu.regs.a = 0x0F;
        assert_eq!(run(&mut cpu, &mut bus, 1), 5);
        assert_eq!(bus.peek(0x10), 0xFF);
        assert!(cpu.regs.p.is_set(Z));
    }

    #[test]
    fn bbs_branches_on_set_bit() {
        // BBS7 taken, then BBS3 falls through on the same byte.
        let (mut cpu, mut bus) = cpu_at(CpuMode::Cmos65C02, 0x0200, &[0xFF, 0x10, 0x04]);
        bus.load(0x0010, &[0x80]);
        bus.load(0x0207, &[0xBF, 0x10, 0x04]);
        run(&mut cpu, &mut bus, 1);
        assert_eq!(cpu.regs.pc, 0x0207);
        run(&mut cpu, &mut bus, 1);
        assert_eq!(cpu.regs.pc, 0x020A);
    }

    #[test]
    fn sixteen_bit_accumulator_load() {
        let (mut cpu, mut bus) = cpu_at(CpuMode::W65C816, 0x0200, &[0x18, 0xFB, 0xC2, 0x20, 0xA9, 0x34, 0x12]);
        run(&mut cpu, &mut bus, 3);
        assert!(!cpu.regs.e);
        assert!(!cpu.regs.p.is_set(M));
        assert_eq!(run(&mut cpu, &mut bus, 1), 3);
        assert_eq!(cpu.regs.c(), 0x1234);
    }

    #[test]
    fn block_move_copies_and_repeats() {
        // MVN $00,$00 with C = 2 copies three bytes.
        let (mut cpu, mut bus) = cpu_at(CpuMode::W65C816, 0x0200, &[0x54, 0x00, 0x00]);
        cpu.regs.e = false;
        cpu.regs.p.clear(M | X);
        cpu.regs.set_c(2);
        cpu.regs.set_x16(0x1000);
        cpu.regs.set_y16(0x2000);
        bus.load(0x1000, &[1, 2, 3]);
        for _ in 0..3 {
            assert_eq!(run(&mut cpu, &mut bus, 1), 7);
        }
        assert_eq!(cpu.regs.c(), 0xFFFF);
        assert_eq!(cpu.regs.pc, 0x0203);
        assert_eq!([bus.peek(0x2000), bus.peek(0x2001), bus.peek(0x2002)], [1, 2, 3]);
    }

    #[test]
    fn shx_glitches_address_on_page_cross() {
        let (mut cpu, mut bus) = cpu_at(CpuMode::Nmos6502, 0x0200, &[0x9E, 0xF0, 0x12]);
        cpu.regs.x = 0x03;
        cpu.regs.y = 0x20;
        run(&mut cpu, &mut bus, 1);
        // H+1 = $13, value = 3 & $13 = 3, address high byte becomes 3.
        assert_eq!(bus.peek(0x0310), 0x03);
    }
}
