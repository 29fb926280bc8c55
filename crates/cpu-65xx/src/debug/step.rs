//! Step conditions: single-step, step over, step out, wait for NMI.

use std::fmt;
use std::ops::Range;

use crate::CpuMode;

/// Handle returned when a step condition is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepId(pub u32);

/// What a step callback wants to happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDecision {
    Continue,
    Stop,
}

/// State offered to a step condition at an instruction boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepContext {
    /// Address of the instruction about to be fetched.
    pub pc: u32,
    /// 16-bit stack pointer.
    pub s: u16,
    /// Opcode of the instruction that just finished.
    pub previous_opcode: u8,
    pub mode: CpuMode,
    /// NMI sequences entered since power-on.
    pub nmi_count: u64,
}

impl StepContext {
    /// True if the previous instruction was a subroutine or interrupt
    /// return.
    #[must_use]
    pub fn after_return(&self) -> bool {
        match self.previous_opcode {
            0x40 | 0x60 => true,
            0x6B => self.mode == CpuMode::W65C816,
            _ => false,
        }
    }
}

type StepCallback = Box<dyn FnMut(&StepContext) -> StepDecision>;

/// A condition checked at every instruction boundary while registered.
///
/// Conditions are one-shot: the first one to stop is unregistered and
/// reported in [`crate::StepResult::StepStop`]. They are first checked at
/// the boundary after the instruction at the current PC.
#[derive(Default)]
pub struct StepCondition {
    skip: Option<Range<u32>>,
    stack_level: Option<u16>,
    return_only: bool,
    wait_for_nmi: bool,
    callback: Option<StepCallback>,
    /// Instruction count at registration.
    armed_at: u64,
    /// NMI count at registration.
    nmi_mark: u64,
}

impl fmt::Debug for StepCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepCondition")
            .field("skip", &self.skip)
            .field("stack_level", &self.stack_level)
            .field("return_only", &self.return_only)
            .field("wait_for_nmi", &self.wait_for_nmi)
            .field("callback", &self.callback.is_some())
            .finish_non_exhaustive()
    }
}

impl StepCondition {
    /// Stop at the next instruction.
    #[must_use]
    pub fn single_step() -> Self {
        Self::default()
    }

    /// Stop at the next instruction that runs at `stack_level` or
    /// shallower, running calls made from here at full speed.
    #[must_use]
    pub fn step_over(stack_level: u16) -> Self {
        Self {
            stack_level: Some(stack_level),
            ..Self::default()
        }
    }

    /// Stop after a return leaves S at or above `stack_level`.
    #[must_use]
    pub fn step_out(stack_level: u16) -> Self {
        Self {
            stack_level: Some(stack_level),
            return_only: true,
            ..Self::default()
        }
    }

    /// Stop at the first instruction after an NMI is taken.
    #[must_use]
    pub fn wait_for_nmi() -> Self {
        Self {
            wait_for_nmi: true,
            ..Self::default()
        }
    }

    /// Keep running while PC is inside `range`.
    #[must_use]
    pub fn skipping(mut self, range: Range<u32>) -> Self {
        self.skip = Some(range);
        self
    }

    /// Ask `callback` before stopping.
    #[must_use]
    pub fn with_callback(
        mut self,
        callback: impl FnMut(&StepContext) -> StepDecision + 'static,
    ) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    fn evaluate(&mut self, ctx: &StepContext, insn_count: u64) -> StepDecision {
        if insn_count <= self.armed_at {
            return StepDecision::Continue;
        }
        if self.wait_for_nmi && ctx.nmi_count <= self.nmi_mark {
            return StepDecision::Continue;
        }
        if self.skip.as_ref().is_some_and(|r| r.contains(&ctx.pc)) {
            return StepDecision::Continue;
        }
        if let Some(level) = self.stack_level {
            // The stack grows down: a smaller S is a deeper call.
            if ctx.s < level {
                return StepDecision::Continue;
            }
        }
        if self.return_only && !ctx.after_return() {
            return StepDecision::Continue;
        }
        match self.callback.as_mut() {
            Some(callback) => callback(ctx),
            None => StepDecision::Stop,
        }
    }
}

/// Registered step conditions.
#[derive(Debug, Default)]
pub struct StepConditions {
    conditions: Vec<(StepId, StepCondition)>,
    next_id: u32,
}

impl StepConditions {
    pub(crate) fn add(&mut self, mut condition: StepCondition, insn_count: u64, nmi_count: u64) -> StepId {
        let id = StepId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        condition.armed_at = insn_count;
        condition.nmi_mark = nmi_count;
        self.conditions.push((id, condition));
        id
    }

    pub(crate) fn remove(&mut self, id: StepId) -> Option<StepCondition> {
        let index = self.conditions.iter().position(|(i, _)| *i == id)?;
        Some(self.conditions.remove(index).1)
    }

    pub(crate) fn clear(&mut self) {
        self.conditions.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Check every condition; the first that stops is removed and returned.
    pub(crate) fn check(&mut self, ctx: &StepContext, insn_count: u64) -> Option<StepId> {
        let index = self
            .conditions
            .iter_mut()
            .position(|(_, c)| c.evaluate(ctx, insn_count) == StepDecision::Stop)?;
        Some(self.conditions.remove(index).0)
    }
}
