//! The 65xx CPU: cursor, dispatch and public API.
//!
//! Each [`Cpu65xx::advance`] call moves the cursor through the current
//! micro-program until exactly one bus cycle has been performed, then runs
//! any zero-time tokens that follow so their register effects are visible
//! on return.

use emu_core::{Cpu, Observable, Ticks, Value};
use log::{debug, trace, warn};

use crate::debug::{DebugFlags, Debugger, History, InsnFlags, StepCondition, StepContext, StepId};
use crate::decode::DecodeOptions;
use crate::flags::{C, D, I, M, N, V, X, Z};
use crate::interrupts::Signals;
use crate::microcode::MicroOp;
use crate::store::{DispatchKey, ExtendedOp, MicroStore, ProgramRef};
use crate::{CpuConfig, CpuError, CpuMode, Host, Registers, SubMode};

/// What one call to [`Cpu65xx::advance`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// One bus cycle was performed.
    Cycle,
    /// The CPU idled for a cycle (WAI, STP, JAM).
    Idle,
    /// RDY held the CPU; nothing happened. Call again next cycle.
    Held,
    /// A breakpoint at `address` stopped execution before the fetch.
    Breakpoint { address: u32 },
    /// Step condition `id` stopped execution before the fetch.
    StepStop { id: StepId, address: u32 },
    /// About to execute BRK with stop-on-BRK enabled.
    BrkStop { address: u32 },
    /// The opcode at `address` has no behaviour in this configuration. It
    /// is treated as a one-byte NOP.
    IllegalOpcode { address: u32, opcode: u8 },
}

/// Outcome of executing one token.
pub(crate) enum Flow {
    /// Zero-time; keep going.
    Next,
    /// A bus cycle happened.
    Cycle,
    /// Stay on this token and report.
    Hold(StepResult),
    /// Report without a cycle; the cursor has moved on.
    Event(StepResult),
}

/// Per-instruction working state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Latches {
    /// Opcode of the current (or last) instruction.
    pub opcode: u8,
    /// Address of the current instruction.
    pub insn_pc: u32,
    /// Effective address, low 16 bits.
    pub addr: u16,
    /// Effective address bank.
    pub bank: u8,
    /// Indirect pointer.
    pub ptr: u32,
    /// Data latch; high byte used by 16-bit operations.
    pub data: u16,
    /// Uncarried address (page-crossing dummy reads, branch fixups).
    pub base: u32,
    pub page_crossed: bool,
    /// BBR/BBS test result.
    pub test: bool,
    /// Set on the first instruction of an interrupt handler.
    pub entry: Option<ExtendedOp>,
}

impl Latches {
    pub(crate) fn ea(&self) -> u32 {
        (u32::from(self.bank) << 16) | u32::from(self.addr)
    }
}

/// A 6502, 65C02 or 65C816 driven by compiled micro-programs.
#[derive(Debug)]
pub struct Cpu65xx {
    /// CPU registers.
    pub regs: Registers,
    pub(crate) latch: Latches,
    /// Registers at the start of the current instruction (ABORT rollback).
    pub(crate) insn_regs: Registers,
    pub(crate) signals: Signals,
    pub(crate) debug: Debugger,
    pub(crate) store: MicroStore,
    pub(crate) submode: SubMode,
    pub(crate) cursor: usize,
    pub(crate) program: ProgramRef,
    pub(crate) halted: bool,
    config: CpuConfig,
    sync_window: u32,
    /// Set after a debug stop so the next fetch goes ahead.
    pub(crate) suppress_stop: bool,
    /// Table rebuild requested mid-instruction.
    pending_rebuild: bool,
    /// Interrupt sequence entered, for marking the handler's first
    /// history entry.
    pub(crate) entered: Option<ExtendedOp>,
    pub(crate) total_cycles: u64,
}

impl Default for Cpu65xx {
    fn default() -> Self {
        Self::new(CpuMode::default())
    }
}

impl Cpu65xx {
    /// Create a CPU of the given family with the default configuration.
    #[must_use]
    pub fn new(mode: CpuMode) -> Self {
        let config = CpuConfig::for_mode(mode);
        let debug = Debugger::new(config.history_capacity);
        Self::build(config, debug)
    }

    /// Create a CPU from a validated configuration.
    pub fn with_config(config: CpuConfig) -> Result<Self, CpuError> {
        config.validate()?;
        let mut debug = Debugger::new(config.history_capacity);
        debug.set_history(config.history)?;
        debug.set_stop_on_brk(config.stop_on_brk);
        Ok(Self::build(config, debug))
    }

    fn build(config: CpuConfig, debug: Debugger) -> Self {
        let options = Self::decode_options(&config);
        let store = MicroStore::build(config.mode, options);
        let regs = Registers::new();
        let submode = SubMode::select(config.mode, regs.e, regs.p.is_set(M), regs.p.is_set(X));
        Self {
            regs,
            latch: Latches::default(),
            insn_regs: regs,
            signals: Signals::default(),
            debug,
            store,
            submode,
            cursor: 0,
            program: ProgramRef::Boot,
            halted: false,
            sync_window: config.effective_sync_window(),
            config,
            suppress_stop: false,
            pending_rebuild: false,
            entered: None,
            total_cycles: 0,
        }
    }

    fn decode_options(config: &CpuConfig) -> DecodeOptions {
        DecodeOptions {
            illegal_opcodes: config.illegal_opcodes,
            history: config.history,
            pathfinding: config.pathfinding,
        }
    }

    // ---------------------------------------------------------------------
    // Execution
    // ---------------------------------------------------------------------

    /// Run until one bus cycle has been performed (or something needs the
    /// host's attention).
    pub fn advance<H: Host>(&mut self, host: &mut H) -> StepResult {
        if self.signals.rdy_holds(host.cycle()) {
            // Only the NMOS part finishes write cycles under RDY.
            let runs_on = self.config.mode == CpuMode::Nmos6502 && self.next_bus_op().is_write();
            if !runs_on {
                return StepResult::Held;
            }
        }

        loop {
            let op = self.store.op(self.cursor);
            self.cursor += 1;
            match self.execute(op, host) {
                Flow::Next => {}
                Flow::Cycle => {
                    self.settle(host);
                    self.total_cycles += 1;
                    return StepResult::Cycle;
                }
                Flow::Hold(result) => {
                    self.cursor -= 1;
                    if result == StepResult::Idle {
                        self.total_cycles += 1;
                    }
                    return result;
                }
                Flow::Event(result) => return result,
            }
        }
    }

    /// Run up to `cycles` CPU cycles within one host cycle, stopping early
    /// on anything other than [`StepResult::Cycle`].
    pub fn advance_subcycles<H: Host>(&mut self, host: &mut H, cycles: u32) -> StepResult {
        let mut result = StepResult::Cycle;
        for _ in 0..cycles {
            result = self.advance(host);
            if result != StepResult::Cycle {
                break;
            }
        }
        result
    }

    /// Execute the tokens that take no time after a bus cycle, so the
    /// cursor rests on the next bus token.
    fn settle<H: Host>(&mut self, host: &mut H) {
        loop {
            let op = self.store.op(self.cursor);
            if !self.is_free(op) {
                return;
            }
            self.cursor += 1;
            self.execute(op, host);
        }
    }

    /// The next token that will take a cycle.
    fn next_bus_op(&self) -> MicroOp {
        let mut cursor = self.cursor;
        loop {
            let op = self.store.op(cursor);
            if !self.is_free(op) {
                return op;
            }
            cursor += 1;
        }
    }

    /// True if the next bus cycle will be a write.
    #[must_use]
    pub fn is_next_cycle_write(&self) -> bool {
        self.next_bus_op().is_write()
    }

    /// True unless the cursor sits on an instruction boundary.
    #[must_use]
    pub fn is_instruction_in_progress(&self) -> bool {
        self.store.op(self.cursor) != MicroOp::Fetch
    }

    /// Instruction boundary: debug checks, interrupt poll, opcode fetch.
    pub(crate) fn fetch<H: Host>(&mut self, host: &mut H) -> Flow {
        let pc = self.regs.pc24();

        let suppressed = std::mem::take(&mut self.suppress_stop);
        let active = self.debug.active();
        if !active.is_empty() && !suppressed {
            if let Some(stop) = self.debug_stop(active, pc, host) {
                self.suppress_stop = true;
                return Flow::Hold(stop);
            }
        }

        if self.pending_rebuild {
            self.rebuild_now();
        }
        self.sync_submode();

        let masked = self.regs.p.is_set(I);
        if let Some(ext) = self.signals.poll(host.cycle(), masked, self.sync_window) {
            if ext == ExtendedOp::Abort {
                self.regs = self.insn_regs;
                self.sync_submode();
            }
            if ext == ExtendedOp::Nmi {
                self.debug.count_nmi();
            }
            trace!("{ext} at ${pc:06X}");
            self.entered = Some(ext);
            self.enter(DispatchKey::Extended(ext));
            return Flow::Next;
        }

        self.insn_regs = self.regs;
        self.latch.insn_pc = pc;
        self.latch.entry = self.entered.take();

        let hooked = if active.contains(DebugFlags::HOOKS)
            && self.debug.flags(pc).contains(InsnFlags::HOOK)
        {
            host.hook(pc)
        } else {
            None
        };
        let opcode = match hooked {
            Some(opcode) => opcode,
            None => host.read(pc),
        };
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.latch.opcode = opcode;
        self.debug.count_instruction();

        if active.contains(DebugFlags::TRACE) {
            trace!(
                "${pc:06X} {opcode:02X}  A={:04X} X={:04X} Y={:04X} S={:04X} P={:02X} {}",
                self.regs.c(),
                self.regs.x16(),
                self.regs.y16(),
                self.regs.s16(),
                self.regs.p.0,
                self.submode
            );
        }

        self.enter(DispatchKey::Opcode(opcode));
        Flow::Cycle
    }

    fn debug_stop<H: Host>(&mut self, active: DebugFlags, pc: u32, host: &H) -> Option<StepResult> {
        if active.contains(DebugFlags::BREAKPOINTS) && self.debug.hit_breakpoint(pc) {
            debug!("breakpoint at ${pc:06X}");
            return Some(StepResult::Breakpoint { address: pc });
        }
        if active.contains(DebugFlags::STEP) {
            let ctx = StepContext {
                pc,
                s: self.regs.s16(),
                previous_opcode: self.latch.opcode,
                mode: self.config.mode,
                nmi_count: self.debug.nmi_count(),
            };
            if let Some(id) = self.debug.check_steps(&ctx) {
                return Some(StepResult::StepStop { id, address: pc });
            }
        }
        if active.contains(DebugFlags::STOP_ON_BRK) && host.peek(pc) == 0x00 {
            return Some(StepResult::BrkStop { address: pc });
        }
        None
    }

    /// Point the cursor at the program for `key` in the current submode.
    pub(crate) fn enter(&mut self, key: DispatchKey) {
        let Some(offset) = self.store.offset(self.submode, key) else {
            unreachable!("no dispatch table for {} in {}", self.submode, self.config.mode);
        };
        self.program = ProgramRef::Dispatch {
            submode: self.submode,
            key,
        };
        self.cursor = offset;
    }

    /// Apply width invariants and select the dispatch table for E/M/X.
    pub(crate) fn sync_submode(&mut self) {
        if self.config.mode != CpuMode::W65C816 {
            self.regs.e = true;
        }
        self.regs.enforce_widths();
        let submode = SubMode::select(
            self.config.mode,
            self.regs.e,
            self.regs.p.is_set(M),
            self.regs.p.is_set(X),
        );
        if submode != self.submode {
            trace!("submode {} -> {submode}", self.submode);
            self.submode = submode;
        }
    }

    pub(crate) fn record_history<H: Host>(&mut self, host: &H) {
        let pc = self.latch.insn_pc;
        let regs = self.insn_regs;
        let entry = crate::debug::HistoryEntry {
            cycle: host.cycle().get(),
            unhalted_cycle: host.unhalted_cycle().get(),
            ea: None,
            pc: pc as u16,
            k: (pc >> 16) as u8,
            s: regs.s,
            sh: regs.sh,
            p: regs.p.0,
            a: regs.a,
            ah: regs.ah,
            x: regs.x,
            xh: regs.xh,
            y: regs.y,
            yh: regs.yh,
            b: regs.dbr,
            d: regs.d,
            irq: self.latch.entry == Some(ExtendedOp::Irq),
            nmi: self.latch.entry == Some(ExtendedOp::Nmi),
            emulation: regs.e,
            opcode: [
                self.latch.opcode,
                host.peek(Self::bank_offset(pc, 1)),
                host.peek(Self::bank_offset(pc, 2)),
                host.peek(Self::bank_offset(pc, 3)),
            ],
        };
        if let Some(history) = self.debug.history_mut() {
            history.push(entry);
        }
    }

    /// `address + n`, wrapping inside the bank.
    pub(crate) fn bank_offset(address: u32, n: u16) -> u32 {
        (address & 0xFF_0000) | u32::from((address as u16).wrapping_add(n))
    }

    pub(crate) fn report_unsupported(&self) -> StepResult {
        warn!(
            "unsupported opcode ${:02X} at ${:06X} ({})",
            self.latch.opcode, self.latch.insn_pc, self.submode
        );
        StepResult::IllegalOpcode {
            address: self.latch.insn_pc,
            opcode: self.latch.opcode,
        }
    }

    // ---------------------------------------------------------------------
    // Reset and interrupt inputs
    // ---------------------------------------------------------------------

    /// Start the reset sequence. It runs on the following `advance` calls.
    pub fn reset(&mut self) {
        self.signals.reset();
        self.halted = false;
        self.suppress_stop = false;
        if self.pending_rebuild {
            self.rebuild_now();
        }
        self.sync_submode();
        self.enter(DispatchKey::Extended(ExtendedOp::Reset));
    }

    /// Assert the IRQ line at host cycle `at`.
    pub fn assert_irq(&mut self, at: Ticks) {
        self.signals.assert_irq(at);
    }

    pub fn negate_irq(&mut self) {
        self.signals.negate_irq();
    }

    /// Signal an NMI edge at host cycle `at`. Returns false if the edge
    /// was dropped by NMI blocking.
    pub fn assert_nmi(&mut self, at: Ticks) -> bool {
        self.signals.nmi_edge(at, self.config.nmi_blocking)
    }

    /// Release the NMI line at host cycle `at`. An edge younger than the
    /// synchronizer window has not been latched yet and is withdrawn;
    /// returns true in that case.
    pub fn negate_nmi(&mut self, at: Ticks) -> bool {
        self.signals.negate_nmi(at, self.sync_window)
    }

    /// Assert ABORT at host cycle `at` (65C816 only; ignored otherwise).
    /// The current instruction completes its bus cycles, then its register
    /// effects are rolled back and the ABORT sequence runs. An assertion
    /// inside the synchronizer window of the next boundary aborts the
    /// following instruction instead.
    pub fn assert_abort(&mut self, at: Ticks) {
        if self.config.mode == CpuMode::W65C816 {
            trace!("ABORT at {}", at.get());
            self.signals.assert_abort(at);
        }
    }

    /// Hold (`true`) or release the CPU on RDY from host cycle `at`.
    /// The NMOS 6502 still completes write cycles while held.
    pub fn set_rdy(&mut self, held: bool, at: Ticks) {
        self.signals.set_rdy(held, at);
    }

    #[must_use]
    pub fn signals(&self) -> &Signals {
        &self.signals
    }

    // ---------------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn mode(&self) -> CpuMode {
        self.config.mode
    }

    #[must_use]
    pub fn submode(&self) -> SubMode {
        self.submode
    }

    #[must_use]
    pub fn config(&self) -> &CpuConfig {
        &self.config
    }

    /// Switch CPU family. Tables are rebuilt at the next instruction
    /// boundary.
    pub fn set_mode(&mut self, mode: CpuMode) {
        if mode != self.config.mode {
            debug!("CPU mode {} -> {mode}", self.config.mode);
            self.config.mode = mode;
            self.sync_window = self.config.effective_sync_window();
            self.request_rebuild();
        }
    }

    pub fn set_illegal_opcodes(&mut self, enabled: bool) {
        if enabled != self.config.illegal_opcodes {
            self.config.illegal_opcodes = enabled;
            self.request_rebuild();
        }
    }

    /// Turn history recording on or off. Enabling allocates the ring.
    pub fn set_history_enabled(&mut self, enabled: bool) -> Result<(), CpuError> {
        if enabled != self.config.history {
            self.debug.set_history(enabled)?;
            self.config.history = enabled;
            self.request_rebuild();
        }
        Ok(())
    }

    pub fn set_pathfinding(&mut self, enabled: bool) {
        if enabled != self.config.pathfinding {
            self.config.pathfinding = enabled;
            self.request_rebuild();
        }
    }

    pub fn set_stop_on_brk(&mut self, enabled: bool) {
        self.config.stop_on_brk = enabled;
        self.debug.set_stop_on_brk(enabled);
    }

    pub fn set_nmi_blocking(&mut self, enabled: bool) {
        self.config.nmi_blocking = enabled;
    }

    /// Log every instruction start at `trace` level.
    pub fn set_trace(&mut self, enabled: bool) {
        self.debug.set_trace(enabled);
    }

    fn request_rebuild(&mut self) {
        if self.is_instruction_in_progress() {
            self.pending_rebuild = true;
        } else {
            self.rebuild_now();
        }
    }

    /// Rebuild tables and park the cursor on the boot fetch.
    fn rebuild_now(&mut self) {
        self.store = MicroStore::build(self.config.mode, Self::decode_options(&self.config));
        self.pending_rebuild = false;
        self.program = ProgramRef::Boot;
        self.cursor = 0;
        self.sync_submode();
    }

    pub(crate) fn install_store(&mut self, store: MicroStore) {
        self.store = store;
        self.adopt_store_config();
    }

    /// Make the configuration describe the installed tables, dropping any
    /// rebuild still waiting for an instruction boundary.
    pub(crate) fn adopt_store_config(&mut self) {
        self.config.mode = self.store.mode();
        let options = self.store.options();
        self.config.illegal_opcodes = options.illegal_opcodes;
        if let Err(err) = self.debug.set_history(options.history) {
            warn!("history not restored: {err}");
        } else {
            self.config.history = options.history;
        }
        self.config.pathfinding = options.pathfinding;
        self.sync_window = self.config.effective_sync_window();
        self.pending_rebuild = false;
    }

    /// True while a mode or option change waits for the next boundary.
    #[must_use]
    pub fn is_rebuild_pending(&self) -> bool {
        self.pending_rebuild
    }

    #[must_use]
    pub fn store(&self) -> &MicroStore {
        &self.store
    }

    // ---------------------------------------------------------------------
    // Debugging
    // ---------------------------------------------------------------------

    pub fn set_breakpoint(&mut self, address: u32) {
        self.debug.set_breakpoint(address & 0xFF_FFFF, false);
    }

    /// Breakpoint that removes itself when hit.
    pub fn set_one_shot_breakpoint(&mut self, address: u32) {
        self.debug.set_breakpoint(address & 0xFF_FFFF, true);
    }

    pub fn clear_breakpoint(&mut self, address: u32) -> bool {
        self.debug.clear_breakpoint(address & 0xFF_FFFF)
    }

    pub fn clear_all_breakpoints(&mut self) {
        self.debug.clear_all_breakpoints();
    }

    #[must_use]
    pub fn is_breakpoint_set(&self, address: u32) -> bool {
        self.debug
            .flags(address & 0xFF_FFFF)
            .contains(InsnFlags::BREAKPOINT)
    }

    /// Breakpoint addresses, ascending.
    #[must_use]
    pub fn breakpoints(&self) -> Vec<u32> {
        self.debug.breakpoints()
    }

    /// Offer fetches at `address` to [`Host::hook`].
    pub fn set_hook(&mut self, address: u32, enabled: bool) {
        self.debug.set_hook(address & 0xFF_FFFF, enabled);
    }

    pub fn add_step_condition(&mut self, condition: StepCondition) -> StepId {
        self.debug.add_step(condition)
    }

    pub fn remove_step_condition(&mut self, id: StepId) -> Option<StepCondition> {
        self.debug.remove_step(id)
    }

    pub fn clear_step_conditions(&mut self) {
        self.debug.clear_steps();
    }

    #[must_use]
    pub fn history(&self) -> Option<&History> {
        self.debug.history()
    }

    pub fn reset_paths(&mut self) {
        self.debug.reset_paths();
    }

    #[must_use]
    pub fn is_path_start(&self, address: u32) -> bool {
        self.debug.is_path_start(address)
    }

    #[must_use]
    pub fn is_in_path(&self, address: u32) -> bool {
        self.debug.is_in_path(address)
    }

    #[must_use]
    pub fn next_path_instruction(&self, after: u32) -> Option<u32> {
        self.debug.next_path_instruction(after)
    }

    #[must_use]
    pub fn debugger(&self) -> &Debugger {
        &self.debug
    }

    // ---------------------------------------------------------------------
    // Registers
    // ---------------------------------------------------------------------

    /// PC with program bank.
    #[must_use]
    pub fn pc(&self) -> u32 {
        self.regs.pc24()
    }

    /// Set PC and K. Takes effect at the next fetch.
    pub fn set_pc(&mut self, address: u32) {
        self.regs.pc = address as u16;
        self.regs.pbr = (address >> 16) as u8;
    }

    /// Replace every register, applying width rules.
    pub fn set_registers(&mut self, regs: Registers) {
        self.regs = regs;
        self.sync_submode();
    }

    /// Set P, applying width rules.
    pub fn set_p(&mut self, p: u8) {
        self.regs.p.0 = p;
        self.sync_submode();
    }

    /// Set the emulation flag (65C816), applying width rules.
    pub fn set_emulation(&mut self, emulation: bool) {
        self.regs.e = emulation;
        self.sync_submode();
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Address of the current (or last) instruction.
    #[must_use]
    pub fn instruction_pc(&self) -> u32 {
        self.latch.insn_pc
    }

    #[must_use]
    pub fn opcode(&self) -> u8 {
        self.latch.opcode
    }

    /// CPU cycles performed (including idle cycles).
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }
}

// ============================================================================
// Trait implementations
// ============================================================================

impl<H: Host> Cpu<H> for Cpu65xx {
    type Registers = Registers;
    type Step = StepResult;

    fn advance(&mut self, host: &mut H) -> StepResult {
        Cpu65xx::advance(self, host)
    }

    fn pc(&self) -> u32 {
        Cpu65xx::pc(self)
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.halted
    }

    fn interrupt(&mut self, at: Ticks) {
        self.assert_irq(at);
    }

    fn nmi(&mut self, at: Ticks) {
        self.assert_nmi(at);
    }

    fn reset(&mut self) {
        Cpu65xx::reset(self);
    }
}

impl Observable for Cpu65xx {
    fn query(&self, path: &str) -> Option<Value> {
        let r = &self.regs;
        match path {
            "pc" => Some(Value::Address(r.pc24())),
            "a" => Some(r.a.into()),
            "c" => Some(r.c().into()),
            "x" => Some(r.x16().into()),
            "y" => Some(r.y16().into()),
            "s" | "sp" => Some(r.s16().into()),
            "p" | "status" => Some(r.p.0.into()),
            "k" | "pbr" => Some(r.pbr.into()),
            "b" | "dbr" => Some(r.dbr.into()),
            "d" | "dp" => Some(r.d.into()),
            "e" => Some(r.e.into()),
            "flags.c" => Some(r.p.is_set(C).into()),
            "flags.z" => Some(r.p.is_set(Z).into()),
            "flags.i" => Some(r.p.is_set(I).into()),
            "flags.d" => Some(r.p.is_set(D).into()),
            "flags.x" => Some(r.p.is_set(X).into()),
            "flags.m" => Some(r.p.is_set(M).into()),
            "flags.v" => Some(r.p.is_set(V).into()),
            "flags.n" => Some(r.p.is_set(N).into()),
            "mode" => Some(Value::String(self.config.mode.to_string())),
            "submode" => Some(Value::String(self.submode.to_string())),
            "opcode" => Some(self.latch.opcode.into()),
            "insn_pc" => Some(Value::Address(self.latch.insn_pc)),
            "cycle" => Some(Value::U64(self.total_cycles)),
            "halted" => Some(self.halted.into()),
            "irq" => Some(self.signals.irq_asserted().into()),
            "nmi" => Some(self.signals.nmi_pending().into()),
            "breakpoints" => Some(Value::Array(
                self.breakpoints().into_iter().map(Value::Address).collect(),
            )),
            "history.len" => self.history().map(|h| Value::U64(h.len() as u64)),
            "history.counter" => self.history().map(|h| Value::U64(h.counter())),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc", "a", "c", "x", "y", "s", "p", "k", "b", "d", "e", "flags.c", "flags.z",
            "flags.i", "flags.d", "flags.x", "flags.m", "flags.v", "flags.n", "mode", "submode",
            "opcode", "insn_pc", "cycle", "halted", "irq", "nmi", "breakpoints", "history.len",
            "history.counter",
        ]
    }
}
