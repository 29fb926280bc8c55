//! CPU family and register-width submodes.

use std::fmt;

/// CPU family.
///
/// Changing the family rebuilds every dispatch table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CpuMode {
    /// NMOS 6502 (and 6510/8502/2A03-style derivatives).
    #[default]
    Nmos6502,
    /// WDC 65C02 CMOS variant.
    Cmos65C02,
    /// WDC 65C816 with 8-bit emulation mode.
    W65C816,
}

impl CpuMode {
    /// Cycles before a fetch boundary in which an interrupt edge is too late
    /// to be recognised at that boundary.
    #[must_use]
    pub const fn default_sync_window(self) -> u32 {
        match self {
            Self::Nmos6502 | Self::Cmos65C02 | Self::W65C816 => 1,
        }
    }

    /// Submodes that can be active for this family.
    #[must_use]
    pub const fn submodes(self) -> &'static [SubMode] {
        match self {
            Self::Nmos6502 => &[SubMode::Nmos],
            Self::Cmos65C02 => &[SubMode::Cmos],
            Self::W65C816 => &[
                SubMode::Emulation,
                SubMode::NativeM16X16,
                SubMode::NativeM16X8,
                SubMode::NativeM8X16,
                SubMode::NativeM8X8,
            ],
        }
    }
}

impl fmt::Display for CpuMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nmos6502 => "6502",
            Self::Cmos65C02 => "65C02",
            Self::W65C816 => "65C816",
        })
    }
}

/// Register-width submode; one dispatch table exists per submode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SubMode {
    Nmos,
    Cmos,
    /// 65C816 with E=1: 8-bit registers, stack in page 1.
    Emulation,
    NativeM16X16,
    NativeM16X8,
    NativeM8X16,
    NativeM8X8,
}

impl SubMode {
    pub const COUNT: usize = 7;

    pub const ALL: [SubMode; Self::COUNT] = [
        SubMode::Nmos,
        SubMode::Cmos,
        SubMode::Emulation,
        SubMode::NativeM16X16,
        SubMode::NativeM16X8,
        SubMode::NativeM8X16,
        SubMode::NativeM8X8,
    ];

    /// Derive the submode from the family and the E/M/X state.
    ///
    /// `m8`/`x8` are the P.M/P.X bits (set = 8-bit); ignored unless native.
    #[must_use]
    pub const fn select(mode: CpuMode, emulation: bool, m8: bool, x8: bool) -> Self {
        match mode {
            CpuMode::Nmos6502 => Self::Nmos,
            CpuMode::Cmos65C02 => Self::Cmos,
            CpuMode::W65C816 => match (emulation, m8, x8) {
                (true, _, _) => Self::Emulation,
                (false, false, false) => Self::NativeM16X16,
                (false, false, true) => Self::NativeM16X8,
                (false, true, false) => Self::NativeM8X16,
                (false, true, true) => Self::NativeM8X8,
            },
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn family(self) -> CpuMode {
        match self {
            Self::Nmos => CpuMode::Nmos6502,
            Self::Cmos => CpuMode::Cmos65C02,
            _ => CpuMode::W65C816,
        }
    }

    /// True for the 65C816 native submodes.
    #[must_use]
    pub const fn is_native(self) -> bool {
        matches!(
            self,
            Self::NativeM16X16 | Self::NativeM16X8 | Self::NativeM8X16 | Self::NativeM8X8
        )
    }

    /// True when the accumulator and memory operations are 16-bit.
    #[must_use]
    pub const fn wide_accumulator(self) -> bool {
        matches!(self, Self::NativeM16X16 | Self::NativeM16X8)
    }

    /// True when X and Y are 16-bit.
    #[must_use]
    pub const fn wide_index(self) -> bool {
        matches!(self, Self::NativeM16X16 | Self::NativeM8X16)
    }
}

impl fmt::Display for SubMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nmos => "6502",
            Self::Cmos => "65C02",
            Self::Emulation => "65C816-E",
            Self::NativeM16X16 => "65C816-M16X16",
            Self::NativeM16X8 => "65C816-M16X8",
            Self::NativeM8X16 => "65C816-M8X16",
            Self::NativeM8X8 => "65C816-M8X8",
        })
    }
}
