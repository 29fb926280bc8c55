//! The host side of the CPU: bus, clock and opcode hooks.

use emu_core::{Bus, CycleClock, SimpleBus};

/// Everything the CPU needs from the machine it runs in.
///
/// Bus accesses are one cycle each; the clock is read but never advanced
/// by the CPU. Advancing it (and honouring [`crate::StepResult::Held`]) is
/// the host's job.
pub trait Host: Bus + CycleClock {
    /// Called when an instruction is fetched from an address carrying a
    /// hook flag. Returning `Some(opcode)` executes that opcode instead of
    /// the byte in memory; `None` falls through to a normal fetch.
    fn hook(&mut self, pc: u32) -> Option<u8> {
        let _ = pc;
        None
    }
}

impl Host for SimpleBus {}
