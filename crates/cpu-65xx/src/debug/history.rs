//! Instruction history ring.

use crate::CpuError;

/// Architectural state captured when an instruction starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoryEntry {
    /// Host cycle of the opcode fetch.
    pub cycle: u64,
    /// Same, excluding RDY-held cycles.
    pub unhalted_cycle: u64,
    /// Effective address, once the instruction has formed one.
    pub ea: Option<u32>,
    pub pc: u16,
    /// Program bank.
    pub k: u8,
    pub s: u8,
    pub sh: u8,
    pub p: u8,
    pub a: u8,
    pub ah: u8,
    pub x: u8,
    pub xh: u8,
    pub y: u8,
    pub yh: u8,
    /// Data bank.
    pub b: u8,
    pub d: u16,
    /// First instruction of an IRQ handler.
    pub irq: bool,
    /// First instruction of an NMI handler.
    pub nmi: bool,
    pub emulation: bool,
    /// Opcode and the three bytes after it.
    pub opcode: [u8; 4],
}

impl HistoryEntry {
    /// PC with program bank.
    #[must_use]
    pub const fn pc24(&self) -> u32 {
        ((self.k as u32) << 16) | self.pc as u32
    }
}

/// Fixed-size ring of [`HistoryEntry`], allocated once.
///
/// Entries are addressed by logical index: the value of [`History::counter`]
/// when they were recorded. A logical index stays valid until the ring
/// wraps past it.
#[derive(Debug, Clone)]
pub struct History {
    entries: Box<[HistoryEntry]>,
    mask: usize,
    counter: u64,
}

impl History {
    pub fn new(capacity: usize) -> Result<Self, CpuError> {
        if capacity < 2 || !capacity.is_power_of_two() {
            return Err(CpuError::HistoryCapacity(capacity));
        }
        Ok(Self {
            entries: vec![HistoryEntry::default(); capacity].into_boxed_slice(),
            mask: capacity - 1,
            counter: 0,
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counter.min(self.entries.len() as u64) as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counter == 0
    }

    /// Total entries ever recorded; the next entry's logical index.
    #[must_use]
    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub(crate) fn push(&mut self, entry: HistoryEntry) {
        let slot = (self.counter as usize) & self.mask;
        self.entries[slot] = entry;
        self.counter += 1;
    }

    pub(crate) fn newest_mut(&mut self) -> Option<&mut HistoryEntry> {
        if self.counter == 0 {
            return None;
        }
        let slot = ((self.counter - 1) as usize) & self.mask;
        self.entries.get_mut(slot)
    }

    /// Entry by logical index, if it has not been overwritten.
    #[must_use]
    pub fn get(&self, index: u64) -> Option<&HistoryEntry> {
        if index >= self.counter || self.counter - index > self.entries.len() as u64 {
            return None;
        }
        self.entries.get((index as usize) & self.mask)
    }

    /// The `n`th most recent entry (0 = newest).
    #[must_use]
    pub fn latest(&self, n: usize) -> Option<&HistoryEntry> {
        let index = self.counter.checked_sub(n as u64 + 1)?;
        self.get(index)
    }

    /// Held entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        let first = self.counter - self.len() as u64;
        (first..self.counter).filter_map(|i| self.get(i))
    }

    pub fn clear(&mut self) {
        self.counter = 0;
    }
}
