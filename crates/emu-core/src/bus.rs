//! Memory bus interface.

use crate::{CycleClock, Ticks};

/// Memory bus interface.
///
/// CPU cores access memory and memory-mapped devices through this trait.
/// Addresses are 24-bit; 8-bit cores only drive the low 16 bits.
pub trait Bus {
    /// Read a byte. May trigger device side effects.
    fn read(&mut self, address: u32) -> u8;

    /// Write a byte.
    fn write(&mut self, address: u32, value: u8);

    /// Debug read.
    ///
    /// Must not trigger side effects. Used by debuggers and instrumentation,
    /// never by architectural execution.
    fn peek(&self, address: u32) -> u8;
}

/// Flat RAM bus with a host cycle counter.
///
/// The backing store is a power-of-two size; addresses wrap by mask. The
/// cycle counter only moves when the host calls [`SimpleBus::tick`].
#[derive(Debug, Clone)]
pub struct SimpleBus {
    ram: Vec<u8>,
    mask: u32,
    cycle: u64,
    halted: u64,
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleBus {
    /// 64 KiB of zeroed RAM.
    #[must_use]
    pub fn new() -> Self {
        Self::with_size(0x1_0000)
    }

    /// RAM of the given size, rounded up to a power of two (max 16 MiB).
    #[must_use]
    pub fn with_size(size: usize) -> Self {
        let size = size.clamp(1, 0x100_0000).next_power_of_two();
        Self {
            ram: vec![0; size],
            mask: (size - 1) as u32,
            cycle: 0,
            halted: 0,
        }
    }

    /// Copy `data` into RAM starting at `address`.
    pub fn load(&mut self, address: u32, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            let addr = address.wrapping_add(i as u32) & self.mask;
            self.ram[addr as usize] = byte;
        }
    }

    /// Advance the host clock by one cycle.
    ///
    /// `held` marks a cycle the CPU spent frozen on RDY; it still counts
    /// toward [`CycleClock::cycle`] but not toward the unhalted counter.
    pub fn tick(&mut self, held: bool) {
        self.cycle += 1;
        if held {
            self.halted += 1;
        }
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u32) -> u8 {
        self.ram[(address & self.mask) as usize]
    }

    fn write(&mut self, address: u32, value: u8) {
        self.ram[(address & self.mask) as usize] = value;
    }

    fn peek(&self, address: u32) -> u8 {
        self.ram[(address & self.mask) as usize]
    }
}

impl CycleClock for SimpleBus {
    fn cycle(&self) -> Ticks {
        Ticks::new(self.cycle)
    }

    fn unhalted_cycle(&self) -> Ticks {
        Ticks::new(self.cycle - self.halted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_wrap_by_mask() {
        let mut bus = SimpleBus::new();
        bus.write(0x01_0010, 0xAB);
        assert_eq!(bus.peek(0x0010), 0xAB);
    }

    #[test]
    fn size_rounds_up_to_power_of_two() {
        let mut bus = SimpleBus::with_size(0x1_8000);
        bus.load(0x1_FFFF, &[0x11, 0x22]);
        assert_eq!(bus.peek(0x1_FFFF), 0x11);
        assert_eq!(bus.peek(0x0000), 0x22);
    }

    #[test]
    fn held_cycles_excluded_from_unhalted() {
        let mut bus = SimpleBus::new();
        bus.tick(false);
        bus.tick(true);
        bus.tick(false);
        assert_eq!(bus.cycle(), Ticks::new(3));
        assert_eq!(bus.unhalted_cycle(), Ticks::new(2));
        assert_eq!(bus.unstolen_cycle(), Ticks::new(2));
    }
}
