//! Error type for configuration and snapshot restore.

use std::fmt;

use crate::{CpuMode, SubMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpuError {
    /// History capacity must be a power of two and at least 2.
    HistoryCapacity(usize),
    /// Synchronizer window larger than any real part would use.
    SyncWindow(u32),
    /// Snapshot submode does not belong to the CPU family.
    ModeMismatch { mode: CpuMode, submode: SubMode },
    /// Snapshot cursor points past the end of its program.
    CursorOutOfRange { position: u32, len: u32 },
}

impl fmt::Display for CpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HistoryCapacity(n) => {
                write!(f, "history capacity {n} is not a power of two >= 2")
            }
            Self::SyncWindow(n) => write!(f, "synchronizer window of {n} cycles is out of range"),
            Self::ModeMismatch { mode, submode } => {
                write!(f, "submode {submode} does not belong to {mode}")
            }
            Self::CursorOutOfRange { position, len } => write!(
                f,
                "cursor position {position} is outside a program of {len} micro-ops"
            ),
        }
    }
}

impl std::error::Error for CpuError {}
