//! CPU configuration.

use crate::{CpuError, CpuMode};

/// Default number of history entries kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 131_072;

/// Largest synchronizer window accepted.
pub const MAX_SYNC_WINDOW: u32 = 16;

/// CPU configuration, applied at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CpuConfig {
    /// CPU family. Defaults to NMOS 6502.
    pub mode: CpuMode,
    /// Execute NMOS undocumented opcodes. When false they report
    /// [`crate::StepResult::IllegalOpcode`] and act as one-byte NOPs.
    pub illegal_opcodes: bool,
    /// Report [`crate::StepResult::BrkStop`] before executing BRK.
    pub stop_on_brk: bool,
    /// Drop NMI edges that arrive while one is pending or being entered.
    /// When false, one extra edge is queued instead.
    pub nmi_blocking: bool,
    /// Record per-instruction history.
    pub history: bool,
    /// History ring size; must be a power of two.
    pub history_capacity: usize,
    /// Track executed paths and path starts.
    pub pathfinding: bool,
    /// Interrupt synchronizer window in cycles. `None` uses the family
    /// default.
    pub sync_window: Option<u32>,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            mode: CpuMode::default(),
            illegal_opcodes: true,
            stop_on_brk: false,
            nmi_blocking: true,
            history: false,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            pathfinding: false,
            sync_window: None,
        }
    }
}

impl CpuConfig {
    /// Default configuration for a family.
    #[must_use]
    pub fn for_mode(mode: CpuMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Check the configuration for values the CPU cannot honour.
    pub fn validate(&self) -> Result<(), CpuError> {
        if self.history_capacity < 2 || !self.history_capacity.is_power_of_two() {
            return Err(CpuError::HistoryCapacity(self.history_capacity));
        }
        if let Some(window) = self.sync_window
            && window > MAX_SYNC_WINDOW
        {
            return Err(CpuError::SyncWindow(window));
        }
        Ok(())
    }

    /// Synchronizer window in effect.
    #[must_use]
    pub fn effective_sync_window(&self) -> u32 {
        self.sync_window
            .unwrap_or_else(|| self.mode.default_sync_window())
    }
}
