//! CPU core trait.

use crate::Ticks;

/// A CPU core driven one bus cycle at a time.
///
/// `H` is whatever the core needs from its host: at minimum a bus, usually
/// also a clock. The host is passed in, not owned, so it can be shared with
/// other components between calls.
pub trait Cpu<H: ?Sized> {
    /// The type used for register inspection.
    type Registers;

    /// What a single step reports back to the host.
    type Step;

    /// Advance the CPU by one bus cycle.
    fn advance(&mut self, host: &mut H) -> Self::Step;

    /// Returns the current program counter, zero-extended to 32 bits.
    fn pc(&self) -> u32;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU is halted.
    fn is_halted(&self) -> bool;

    /// Assert the maskable interrupt line at host cycle `at`.
    fn interrupt(&mut self, at: Ticks);

    /// Signal a non-maskable interrupt edge at host cycle `at`.
    fn nmi(&mut self, at: Ticks);

    /// Begin the reset sequence.
    fn reset(&mut self);
}
