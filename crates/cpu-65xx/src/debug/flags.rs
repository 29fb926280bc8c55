//! Per-address instruction flags.

use bitflags::bitflags;

bitflags! {
    /// Flags attached to an instruction address.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InsnFlags: u8 {
        const BREAKPOINT = 0x01;
        /// Breakpoint is removed when hit.
        const ONE_SHOT = 0x02;
        /// Offer the fetch to [`crate::Host::hook`].
        const HOOK = 0x08;
        /// Target of a jump, call, return or vector.
        const PATH_START = 0x10;
        /// An instruction started here.
        const PATH_EXECUTED = 0x20;
    }
}

bitflags! {
    /// Which debug features are live; the fetch fast path tests this once.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DebugFlags: u8 {
        const BREAKPOINTS = 0x01;
        const STEP = 0x02;
        const HOOKS = 0x04;
        const TRACE = 0x08;
        const STOP_ON_BRK = 0x10;
    }
}

const BANK_SIZE: usize = 0x1_0000;

/// Instruction flags over the 24-bit address space, one lazily allocated
/// 64 KiB page per bank.
#[derive(Debug, Clone)]
pub struct AddressFlags {
    banks: Vec<Option<Box<[InsnFlags]>>>,
}

impl Default for AddressFlags {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressFlags {
    #[must_use]
    pub fn new() -> Self {
        Self {
            banks: vec![None; 256],
        }
    }

    fn split(address: u32) -> (usize, usize) {
        (((address >> 16) & 0xFF) as usize, (address & 0xFFFF) as usize)
    }

    #[must_use]
    pub fn get(&self, address: u32) -> InsnFlags {
        let (bank, offset) = Self::split(address);
        self.banks[bank]
            .as_ref()
            .map_or(InsnFlags::empty(), |page| page[offset])
    }

    /// Add `flags` at `address`, allocating the bank on first use.
    pub fn insert(&mut self, address: u32, flags: InsnFlags) {
        let (bank, offset) = Self::split(address);
        let page = self.banks[bank]
            .get_or_insert_with(|| vec![InsnFlags::empty(); BANK_SIZE].into_boxed_slice());
        page[offset] |= flags;
    }

    /// Remove `flags` at `address`. Returns the flags that were set before.
    pub fn remove(&mut self, address: u32, flags: InsnFlags) -> InsnFlags {
        let (bank, offset) = Self::split(address);
        match self.banks[bank].as_mut() {
            Some(page) => {
                let old = page[offset];
                page[offset] &= !flags;
                old
            }
            None => InsnFlags::empty(),
        }
    }

    /// Remove `flags` everywhere.
    pub fn clear(&mut self, flags: InsnFlags) {
        for page in self.banks.iter_mut().flatten() {
            for slot in page.iter_mut() {
                *slot &= !flags;
            }
        }
    }

    /// Addresses carrying any of `flags`, ascending.
    pub fn addresses(&self, flags: InsnFlags) -> impl Iterator<Item = u32> + '_ {
        self.banks.iter().enumerate().flat_map(move |(bank, page)| {
            page.iter().flat_map(move |page| {
                page.iter().enumerate().filter_map(move |(offset, f)| {
                    f.intersects(flags)
                        .then_some(((bank as u32) << 16) | offset as u32)
                })
            })
        })
    }

    /// First address after `address` in the same bank carrying `flags`.
    #[must_use]
    pub fn next_with(&self, address: u32, flags: InsnFlags) -> Option<u32> {
        let (bank, offset) = Self::split(address);
        let page = self.banks[bank].as_ref()?;
        page.get(offset + 1..)?
            .iter()
            .position(|f| f.intersects(flags))
            .map(|i| ((bank as u32) << 16) | (offset + 1 + i) as u32)
    }
}
