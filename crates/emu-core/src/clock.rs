//! Host clock interface.

use crate::Ticks;

/// The host's view of emulated time.
///
/// A CPU core samples this to timestamp history entries and to decide
/// whether an interrupt edge arrived early enough to be recognised.
pub trait CycleClock {
    /// Current cycle, counting every cycle since power-on.
    fn cycle(&self) -> Ticks;

    /// Current cycle, excluding cycles the CPU spent held on RDY.
    fn unhalted_cycle(&self) -> Ticks {
        self.cycle()
    }

    /// Current cycle, additionally excluding cycles stolen by other bus
    /// masters (DMA, video fetch).
    fn unstolen_cycle(&self) -> Ticks {
        self.unhalted_cycle()
    }
}
