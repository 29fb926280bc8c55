//! Micro-program arena and per-submode dispatch tables.
//!
//! Every compiled program lives in one contiguous token arena; dispatch
//! tables map an opcode (or a synthetic reset/IRQ/NMI/ABORT key) to an
//! offset into it. Identical programs share storage.
//!
//! Offset 0 always holds a program consisting only of [`MicroOp::Fetch`],
//! which is where a freshly constructed CPU starts.

use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::decode::{DecodeOptions, compile, compile_extended};
use crate::microcode::MicroOp;
use crate::{CpuMode, SubMode};

/// Synthetic dispatch keys beyond the 256 opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExtendedOp {
    Reset,
    Irq,
    Nmi,
    Abort,
}

impl ExtendedOp {
    pub const ALL: [ExtendedOp; 4] = [Self::Reset, Self::Irq, Self::Nmi, Self::Abort];

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ExtendedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reset => "RESET",
            Self::Irq => "IRQ",
            Self::Nmi => "NMI",
            Self::Abort => "ABORT",
        })
    }
}

/// Key into a dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DispatchKey {
    Opcode(u8),
    Extended(ExtendedOp),
}

/// Identity of the program the cursor is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProgramRef {
    /// The standalone fetch program at offset 0.
    Boot,
    Dispatch { submode: SubMode, key: DispatchKey },
}

#[derive(Debug, Clone)]
struct DispatchTable {
    opcodes: [u32; 256],
    extended: [u32; 4],
}

/// Compiled programs for one CPU family.
#[derive(Debug, Clone)]
pub struct MicroStore {
    arena: Vec<MicroOp>,
    tables: [Option<DispatchTable>; SubMode::COUNT],
    mode: CpuMode,
    options: DecodeOptions,
}

impl MicroStore {
    /// Compile every table the family can use.
    #[must_use]
    pub fn build(mode: CpuMode, options: DecodeOptions) -> Self {
        let mut arena = vec![MicroOp::Fetch];
        let mut seen: HashMap<Vec<MicroOp>, u32> = HashMap::new();
        seen.insert(vec![MicroOp::Fetch], 0);

        let mut intern = |program: Vec<MicroOp>| -> u32 {
            if let Some(&offset) = seen.get(&program) {
                return offset;
            }
            let offset = arena.len() as u32;
            arena.extend_from_slice(&program);
            seen.insert(program, offset);
            offset
        };

        let mut tables: [Option<DispatchTable>; SubMode::COUNT] = Default::default();
        for &sub in mode.submodes() {
            let mut table = DispatchTable {
                opcodes: [0; 256],
                extended: [0; 4],
            };
            for (opcode, slot) in (0..=255u8).zip(table.opcodes.iter_mut()) {
                *slot = intern(compile(opcode, sub, &options));
            }
            for op in ExtendedOp::ALL {
                table.extended[op.index()] = intern(compile_extended(op, sub, &options));
            }
            tables[sub.index()] = Some(table);
        }

        debug!(
            "{mode}: compiled {} tables, {} micro-ops ({} unique programs)",
            mode.submodes().len(),
            arena.len(),
            seen.len()
        );

        Self {
            arena,
            tables,
            mode,
            options,
        }
    }

    #[must_use]
    pub fn mode(&self) -> CpuMode {
        self.mode
    }

    #[must_use]
    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    /// Token at an arena position.
    ///
    /// # Panics
    ///
    /// Panics if `cursor` is outside the arena, which only a corrupted
    /// cursor can cause.
    #[must_use]
    pub fn op(&self, cursor: usize) -> MicroOp {
        self.arena[cursor]
    }

    /// Total token count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Offset of the program for `key`, or `None` if the submode does not
    /// belong to this family.
    #[must_use]
    pub fn offset(&self, submode: SubMode, key: DispatchKey) -> Option<usize> {
        let table = self.tables[submode.index()].as_ref()?;
        let offset = match key {
            DispatchKey::Opcode(op) => table.opcodes[usize::from(op)],
            DispatchKey::Extended(ext) => table.extended[ext.index()],
        };
        Some(offset as usize)
    }

    /// Offset of a program reference.
    #[must_use]
    pub fn resolve(&self, program: ProgramRef) -> Option<usize> {
        match program {
            ProgramRef::Boot => Some(0),
            ProgramRef::Dispatch { submode, key } => self.offset(submode, key),
        }
    }

    /// The tokens of the program starting at `offset`, up to and including
    /// its terminating fetch.
    #[must_use]
    pub fn program(&self, offset: usize) -> &[MicroOp] {
        let tail = self.arena.get(offset..).unwrap_or_default();
        let end = tail
            .iter()
            .position(|op| *op == MicroOp::Fetch)
            .map_or(tail.len(), |i| i + 1);
        &tail[..end]
    }

    /// The program for `key` in `submode`.
    #[must_use]
    pub fn lookup(&self, submode: SubMode, key: DispatchKey) -> Option<&[MicroOp]> {
        self.offset(submode, key).map(|offset| self.program(offset))
    }
}
