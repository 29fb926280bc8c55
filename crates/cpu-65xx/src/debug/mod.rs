//! Debug instrumentation: breakpoints, hooks, step conditions, history and
//! path tracking.
//!
//! Everything here is consulted at instruction fetch only when the
//! corresponding [`DebugFlags`] bit is live, so an idle debugger costs one
//! byte test per instruction.

mod flags;
mod history;
mod step;

pub use flags::{AddressFlags, DebugFlags, InsnFlags};
pub use history::{History, HistoryEntry};
pub use step::{StepCondition, StepConditions, StepContext, StepDecision, StepId};

use log::debug;

use crate::CpuError;

/// Debugger state owned by the CPU.
#[derive(Debug)]
pub struct Debugger {
    flags: AddressFlags,
    active: DebugFlags,
    breakpoints: usize,
    hooks: usize,
    steps: StepConditions,
    history: Option<History>,
    history_capacity: usize,
    /// NMI sequences entered.
    nmi_count: u64,
    /// Instructions dispatched.
    insn_count: u64,
}

impl Debugger {
    pub(crate) fn new(history_capacity: usize) -> Self {
        Self {
            flags: AddressFlags::new(),
            active: DebugFlags::empty(),
            breakpoints: 0,
            hooks: 0,
            steps: StepConditions::default(),
            history: None,
            history_capacity,
            nmi_count: 0,
            insn_count: 0,
        }
    }

    #[must_use]
    pub fn active(&self) -> DebugFlags {
        self.active
    }

    #[must_use]
    pub fn flags(&self, address: u32) -> InsnFlags {
        self.flags.get(address)
    }

    // ---------------------------------------------------------------------
    // Breakpoints
    // ---------------------------------------------------------------------

    pub(crate) fn set_breakpoint(&mut self, address: u32, one_shot: bool) {
        let old = self.flags.get(address);
        if !old.contains(InsnFlags::BREAKPOINT) {
            self.breakpoints += 1;
        }
        self.flags.remove(address, InsnFlags::ONE_SHOT);
        let mut add = InsnFlags::BREAKPOINT;
        if one_shot {
            add |= InsnFlags::ONE_SHOT;
        }
        self.flags.insert(address, add);
        self.active.insert(DebugFlags::BREAKPOINTS);
    }

    pub(crate) fn clear_breakpoint(&mut self, address: u32) -> bool {
        let old = self
            .flags
            .remove(address, InsnFlags::BREAKPOINT | InsnFlags::ONE_SHOT);
        let was_set = old.contains(InsnFlags::BREAKPOINT);
        if was_set {
            self.breakpoints -= 1;
            if self.breakpoints == 0 {
                self.active.remove(DebugFlags::BREAKPOINTS);
            }
        }
        was_set
    }

    pub(crate) fn clear_all_breakpoints(&mut self) {
        self.flags.clear(InsnFlags::BREAKPOINT | InsnFlags::ONE_SHOT);
        self.breakpoints = 0;
        self.active.remove(DebugFlags::BREAKPOINTS);
    }

    #[must_use]
    pub fn breakpoints(&self) -> Vec<u32> {
        self.flags.addresses(InsnFlags::BREAKPOINT).collect()
    }

    /// Check for a breakpoint at `address`, consuming it if one-shot.
    pub(crate) fn hit_breakpoint(&mut self, address: u32) -> bool {
        let flags = self.flags.get(address);
        if !flags.contains(InsnFlags::BREAKPOINT) {
            return false;
        }
        if flags.contains(InsnFlags::ONE_SHOT) {
            self.clear_breakpoint(address);
        }
        true
    }

    // ---------------------------------------------------------------------
    // Hooks
    // ---------------------------------------------------------------------

    pub(crate) fn set_hook(&mut self, address: u32, enabled: bool) {
        let had = self.flags.get(address).contains(InsnFlags::HOOK);
        match (had, enabled) {
            (false, true) => {
                self.flags.insert(address, InsnFlags::HOOK);
                self.hooks += 1;
            }
            (true, false) => {
                self.flags.remove(address, InsnFlags::HOOK);
                self.hooks -= 1;
            }
            _ => {}
        }
        self.active.set(DebugFlags::HOOKS, self.hooks > 0);
    }

    // ---------------------------------------------------------------------
    // Step conditions
    // ---------------------------------------------------------------------

    pub(crate) fn add_step(&mut self, condition: StepCondition) -> StepId {
        let id = self.steps.add(condition, self.insn_count, self.nmi_count);
        self.active.insert(DebugFlags::STEP);
        id
    }

    pub(crate) fn remove_step(&mut self, id: StepId) -> Option<StepCondition> {
        let removed = self.steps.remove(id);
        self.active.set(DebugFlags::STEP, !self.steps.is_empty());
        removed
    }

    pub(crate) fn clear_steps(&mut self) {
        self.steps.clear();
        self.active.remove(DebugFlags::STEP);
    }

    pub(crate) fn check_steps(&mut self, ctx: &StepContext) -> Option<StepId> {
        let hit = self.steps.check(ctx, self.insn_count);
        self.active.set(DebugFlags::STEP, !self.steps.is_empty());
        hit
    }

    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    // ---------------------------------------------------------------------
    // Options
    // ---------------------------------------------------------------------

    pub(crate) fn set_trace(&mut self, enabled: bool) {
        self.active.set(DebugFlags::TRACE, enabled);
    }

    pub(crate) fn set_stop_on_brk(&mut self, enabled: bool) {
        self.active.set(DebugFlags::STOP_ON_BRK, enabled);
    }

    // ---------------------------------------------------------------------
    // Counters
    // ---------------------------------------------------------------------

    pub(crate) fn count_instruction(&mut self) {
        self.insn_count += 1;
    }

    pub(crate) fn count_nmi(&mut self) {
        self.nmi_count += 1;
    }

    #[must_use]
    pub fn nmi_count(&self) -> u64 {
        self.nmi_count
    }

    #[must_use]
    pub fn instruction_count(&self) -> u64 {
        self.insn_count
    }

    // ---------------------------------------------------------------------
    // History
    // ---------------------------------------------------------------------

    /// Allocate or drop the history ring.
    pub(crate) fn set_history(&mut self, enabled: bool) -> Result<(), CpuError> {
        match (enabled, self.history.is_some()) {
            (true, false) => {
                self.history = Some(History::new(self.history_capacity)?);
                debug!("history enabled, {} entries", self.history_capacity);
            }
            (false, true) => self.history = None,
            _ => {}
        }
        Ok(())
    }

    #[must_use]
    pub fn history(&self) -> Option<&History> {
        self.history.as_ref()
    }

    pub(crate) fn history_mut(&mut self) -> Option<&mut History> {
        self.history.as_mut()
    }

    // ---------------------------------------------------------------------
    // Paths
    // ---------------------------------------------------------------------

    pub(crate) fn mark_path(&mut self, address: u32) {
        self.flags.insert(address, InsnFlags::PATH_EXECUTED);
    }

    pub(crate) fn mark_path_start(&mut self, address: u32) {
        self.flags.insert(address, InsnFlags::PATH_START);
    }

    pub(crate) fn reset_paths(&mut self) {
        self.flags
            .clear(InsnFlags::PATH_START | InsnFlags::PATH_EXECUTED);
    }

    #[must_use]
    pub fn is_path_start(&self, address: u32) -> bool {
        self.flags.get(address).contains(InsnFlags::PATH_START)
    }

    #[must_use]
    pub fn is_in_path(&self, address: u32) -> bool {
        self.flags.get(address).contains(InsnFlags::PATH_EXECUTED)
    }

    /// Next executed instruction address after `address` in its bank.
    #[must_use]
    pub fn next_path_instruction(&self, address: u32) -> Option<u32> {
        self.flags.next_with(address, InsnFlags::PATH_EXECUTED)
    }
}
