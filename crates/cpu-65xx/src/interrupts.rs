//! IRQ, NMI, ABORT and RDY line state.
//!
//! Edges are timestamped in host cycles. At an instruction boundary an
//! edge younger than the synchronizer window is not yet visible; it is
//! marked deferred and then taken unconditionally at the following
//! boundary, so a late edge is serviced exactly one instruction later and
//! never lost.

use emu_core::Ticks;
use log::trace;

use crate::store::ExtendedOp;

/// Interrupt input state. Part of every snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signals {
    irq: bool,
    irq_at: Ticks,
    irq_deferred: bool,
    /// CLI/PLP just cleared I: hold off IRQ for one boundary.
    irq_release: bool,

    nmi_pending: bool,
    nmi_at: Ticks,
    nmi_deferred: bool,
    /// One extra edge, kept when NMI blocking is off.
    nmi_queued: Option<Ticks>,
    /// An NMI sequence is being entered.
    nmi_entering: bool,

    abort: bool,
    abort_at: Ticks,
    /// Asserted too late for the running instruction; the next one is
    /// aborted instead.
    abort_deferred: bool,

    rdy: bool,
    rdy_at: Ticks,

    /// An interrupt sequence just finished; the handler's first instruction
    /// always runs.
    entered: bool,
}

impl Signals {
    pub(crate) fn assert_irq(&mut self, at: Ticks) {
        if !self.irq {
            self.irq = true;
            self.irq_at = at;
        }
    }

    pub(crate) fn negate_irq(&mut self) {
        self.irq = false;
        self.irq_deferred = false;
    }

    /// Register an NMI edge. Returns false if the edge was dropped.
    pub(crate) fn nmi_edge(&mut self, at: Ticks, blocking: bool) -> bool {
        if self.nmi_pending || self.nmi_entering {
            if blocking || self.nmi_queued.is_some() {
                trace!("NMI edge at {} dropped", at.get());
                return false;
            }
            self.nmi_queued = Some(at);
            return true;
        }
        self.nmi_pending = true;
        self.nmi_at = at;
        true
    }

    /// Release NMI. A pulse that ends inside the synchronizer window of
    /// its edge is never latched and is forgotten. Returns true if an edge
    /// was withdrawn.
    pub(crate) fn negate_nmi(&mut self, at: Ticks, window: u32) -> bool {
        let window = u64::from(window);
        if let Some(edge) = self.nmi_queued {
            if at.since(edge) > window {
                return false;
            }
            self.nmi_queued = None;
        } else if self.nmi_pending && !self.nmi_deferred && at.since(self.nmi_at) <= window {
            self.nmi_pending = false;
        } else {
            return false;
        }
        trace!("NMI pulse ending at {} too short to latch", at.get());
        true
    }

    pub(crate) fn assert_abort(&mut self, at: Ticks) {
        if !self.abort {
            self.abort = true;
            self.abort_at = at;
            self.abort_deferred = false;
        }
    }

    pub(crate) fn set_rdy(&mut self, held: bool, at: Ticks) {
        self.rdy = held;
        self.rdy_at = at;
    }

    /// True when RDY holds the CPU at host cycle `now`.
    pub(crate) fn rdy_holds(&self, now: Ticks) -> bool {
        self.rdy && now >= self.rdy_at
    }

    pub(crate) fn release_irq(&mut self) {
        self.irq_release = true;
    }

    /// WAI resumes once IRQ or NMI is asserted, masked or not.
    pub(crate) fn wakes(&self) -> bool {
        self.irq || self.nmi_pending || self.abort
    }

    #[must_use]
    pub fn irq_asserted(&self) -> bool {
        self.irq
    }

    #[must_use]
    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    #[must_use]
    pub fn abort_pending(&self) -> bool {
        self.abort
    }

    #[must_use]
    pub fn rdy_asserted(&self) -> bool {
        self.rdy
    }

    /// Forget pending edges. Line levels stay as the host set them.
    pub(crate) fn reset(&mut self) {
        *self = Self {
            irq: self.irq,
            irq_at: self.irq_at,
            rdy: self.rdy,
            rdy_at: self.rdy_at,
            ..Self::default()
        };
    }

    /// Decide which sequence, if any, to enter at an instruction boundary.
    pub(crate) fn poll(&mut self, now: Ticks, irq_masked: bool, window: u32) -> Option<ExtendedOp> {
        let window = u64::from(window);

        if self.abort {
            if self.abort_deferred || now.since(self.abort_at) > window {
                self.abort = false;
                self.abort_deferred = false;
                self.entered = true;
                return Some(ExtendedOp::Abort);
            }
            // Nothing else may start before the instruction being aborted.
            self.abort_deferred = true;
            return None;
        }

        self.nmi_entering = false;
        if std::mem::take(&mut self.entered) {
            // Edges seen while skipping are still honoured next time.
            if self.nmi_pending {
                self.nmi_deferred = true;
            }
            self.irq_release = false;
            return None;
        }

        if self.nmi_pending {
            if self.nmi_deferred || now.since(self.nmi_at) > window {
                self.nmi_pending = false;
                self.nmi_deferred = false;
                if let Some(at) = self.nmi_queued.take() {
                    self.nmi_pending = true;
                    self.nmi_at = at;
                }
                self.nmi_entering = true;
                self.entered = true;
                return Some(ExtendedOp::Nmi);
            }
            self.nmi_deferred = true;
        }

        let released = std::mem::take(&mut self.irq_release);
        if self.irq && !irq_masked && !released {
            if self.irq_deferred || now.since(self.irq_at) > window {
                self.irq_deferred = false;
                self.entered = true;
                return Some(ExtendedOp::Irq);
            }
            self.irq_deferred = true;
        } else {
            self.irq_deferred = false;
        }
        None
    }
}
