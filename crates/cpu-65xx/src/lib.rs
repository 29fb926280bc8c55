//! Cycle-accurate 6502, 65C02 and 65C816 CPU core.
//!
//! Every opcode (and the reset, IRQ, NMI and ABORT sequences) is compiled
//! ahead of time into a short program of micro-operations, one dispatch
//! table per register-width submode. Each `advance()` call runs the
//! program forward by exactly one bus cycle, so the host can interleave
//! video, DMA and timers at cycle granularity.

mod alu;
mod config;
mod cpu;
pub mod debug;
pub mod decode;
mod error;
mod execute;
pub mod flags;
mod host;
mod interrupts;
pub mod microcode;
mod mode;
mod registers;
mod snapshot;
mod store;

pub use config::{CpuConfig, DEFAULT_HISTORY_CAPACITY, MAX_SYNC_WINDOW};
pub use cpu::{Cpu65xx, Latches, StepResult};
pub use debug::{
    DebugFlags, History, HistoryEntry, InsnFlags, StepCondition, StepContext, StepDecision, StepId,
};
pub use decode::{DecodeOptions, compile, compile_extended};
pub use error::CpuError;
pub use flags::Status;
pub use host::Host;
pub use interrupts::Signals;
pub use microcode::MicroOp;
pub use mode::{CpuMode, SubMode};
pub use registers::Registers;
pub use snapshot::CpuSnapshot;
pub use store::{DispatchKey, ExtendedOp, MicroStore, ProgramRef};
