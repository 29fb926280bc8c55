//! Save and restore CPU state.
//!
//! The cursor is stored as a program identity plus a position inside that
//! program rather than as a raw arena offset, so a snapshot survives table
//! rebuilds and differently-ordered arenas. Debug state (breakpoints,
//! step conditions, history) is not part of a snapshot.

use log::debug;

use crate::cpu::{Cpu65xx, Latches};
use crate::decode::DecodeOptions;
use crate::interrupts::Signals;
use crate::store::{MicroStore, ProgramRef};
use crate::{CpuError, CpuMode, Registers};

/// Complete execution state of a [`Cpu65xx`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CpuSnapshot {
    pub mode: CpuMode,
    pub options: DecodeOptions,
    pub registers: Registers,
    /// Registers at the start of the current instruction.
    pub instruction_registers: Registers,
    pub signals: Signals,
    /// Program the cursor is in.
    pub program: ProgramRef,
    /// Token index inside `program`.
    pub position: u32,
    pub latches: Latches,
    pub halted: bool,
    pub total_cycles: u64,
}

impl Cpu65xx {
    /// Capture the execution state.
    #[must_use]
    pub fn snapshot(&self) -> CpuSnapshot {
        let start = self.store.resolve(self.program).unwrap_or(0);
        CpuSnapshot {
            mode: self.store.mode(),
            options: self.store.options(),
            registers: self.regs,
            instruction_registers: self.insn_regs,
            signals: self.signals.clone(),
            program: self.program,
            position: (self.cursor - start) as u32,
            latches: self.latch,
            halted: self.halted,
            total_cycles: self.total_cycles,
        }
    }

    /// Restore a snapshot. Tables are rebuilt first if the snapshot was
    /// taken with a different family or decode options.
    ///
    /// On error the CPU is left unchanged.
    pub fn restore(&mut self, snap: &CpuSnapshot) -> Result<(), CpuError> {
        if let ProgramRef::Dispatch { submode, .. } = snap.program
            && submode.family() != snap.mode
        {
            return Err(CpuError::ModeMismatch {
                mode: snap.mode,
                submode,
            });
        }

        let rebuilt = (self.store.mode() != snap.mode || self.store.options() != snap.options)
            .then(|| MicroStore::build(snap.mode, snap.options));
        let store = rebuilt.as_ref().unwrap_or(&self.store);

        let start = store.resolve(snap.program).ok_or(CpuError::ModeMismatch {
            mode: snap.mode,
            submode: self.submode,
        })?;
        let len = store.program(start).len() as u32;
        if snap.position >= len {
            return Err(CpuError::CursorOutOfRange {
                position: snap.position,
                len,
            });
        }

        match rebuilt {
            Some(store) => {
                debug!("restore rebuilt tables for {}", snap.mode);
                self.install_store(store);
            }
            None => self.adopt_store_config(),
        }
        self.regs = snap.registers;
        self.insn_regs = snap.instruction_registers;
        self.signals = snap.signals.clone();
        self.latch = snap.latches;
        self.halted = snap.halted;
        self.total_cycles = snap.total_cycles;
        self.program = snap.program;
        self.cursor = start + snap.position as usize;
        self.suppress_stop = false;
        self.entered = None;
        self.sync_submode();
        Ok(())
    }
}
