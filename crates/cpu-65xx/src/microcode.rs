//! Micro-operation vocabulary.
//!
//! Every instruction, interrupt and reset sequence is compiled into a
//! sequence of these tokens. Tokens fall into three timing classes:
//!
//! - **bus** tokens consume exactly one cycle (a read, a write, or an
//!   internal cycle where the bus is free);
//! - **instant** tokens only touch CPU-internal state and take no time;
//! - **conditional** tokens are either one bus cycle or an instant skip,
//!   decided at run time (page crossing, branch taken, decimal mode).
//!
//! A program always ends with [`MicroOp::Fetch`], which doubles as the
//! sentinel and as the first cycle of the next instruction.

/// Operand width of a data token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    Byte,
    Word,
}

/// Register operand of [`MicroOp::Load`] and [`MicroOp::Store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    A,
    X,
    Y,
    S,
    /// Data bank register.
    Dbr,
    /// Program bank register (K).
    Pbr,
    /// Direct page register (always 16-bit).
    Dp,
    /// Constant zero, for STZ.
    Zero,
}

/// Index register operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Index {
    X,
    Y,
}

/// How a pointer's next byte address is formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wrap {
    /// Wrap inside the current 256-byte page (NMOS `JMP (abs)` bug).
    Page,
    /// Direct-page rules: page wrap in emulation mode with D low byte 0,
    /// otherwise linear within bank 0.
    Direct,
    /// Linear within the pointer's bank.
    Linear,
}

/// Bank used by the effective address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BankSel {
    Zero,
    Data,
    Program,
}

/// Branch condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cond {
    Plus,
    Minus,
    OverflowClear,
    OverflowSet,
    CarryClear,
    CarrySet,
    NotEqual,
    Equal,
    Always,
    /// Result of the last [`MicroOp::TestBit`].
    Latched,
}

/// How P is formatted when pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PushedStatus {
    /// BRK/PHP in 8-bit modes: B and U set.
    Break,
    /// IRQ/NMI/ABORT in 8-bit modes: B clear, U set.
    Interrupt,
    /// 65C816 native mode: P as-is.
    Native,
}

/// Block move direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// MVN: X and Y increment.
    Increment,
    /// MVP: X and Y decrement.
    Decrement,
}

/// Register ANDed with the address high byte by the SHx family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighAnd {
    /// SHA: A & X & (H+1).
    Ax,
    /// SHX: X & (H+1).
    X,
    /// SHY: Y & (H+1).
    Y,
    /// TAS: S = A & X, then stores S & (H+1).
    Tas,
}

/// Arithmetic/logic operation applied to the data latch and registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alu {
    /// A |= data.
    Ora,
    /// A &= data.
    And,
    /// A ^= data.
    Eor,
    /// A += data + C, binary or decimal.
    Adc,
    /// A -= data + !C, binary or decimal.
    Sbc,
    /// Compare A with data.
    Cmp,
    /// Compare X with data.
    Cpx,
    /// Compare Y with data.
    Cpy,
    /// N/V from data, Z from A & data.
    Bit,
    /// Z from A & data only (BIT immediate).
    BitImm,
    Asl,
    Lsr,
    Rol,
    Ror,
    Inc,
    Dec,
    /// Z from A & data, then data |= A.
    Tsb,
    /// Z from A & data, then data &= !A.
    Trb,
    /// AND, then C = N.
    Anc,
    /// AND, then ROR with the decimal-mode quirks of ARR.
    Arr,
    /// A = (A | magic) & X & data.
    Xaa,
    /// A = X = (A | magic) & data.
    Lxa,
    /// A = X = S = S & data.
    Las,
    /// X = (A & X) - data, flags as CMP.
    Sbx,
    /// data = A & X, flags untouched.
    Sax,
}

/// A micro-operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MicroOp {
    // ------------------------------------------------------------------
    // Sequencing
    // ------------------------------------------------------------------
    /// Instruction boundary: interrupt poll, debug checks, opcode read
    /// at K:PC, dispatch. Bus.
    Fetch,

    /// NMOS JAM/KIL: lock the bus until reset. Bus, never advances.
    Jam,

    /// WAI: idle until IRQ or NMI is asserted. Bus (idle), repeats.
    WaitForInterrupt,

    /// STP: idle until reset. Bus (idle), repeats.
    Stop,

    /// Opcode has no compiled behaviour in this configuration. Reports
    /// [`crate::StepResult::IllegalOpcode`] without taking a cycle.
    Unsupported,

    // ------------------------------------------------------------------
    // Instrumentation (instant, only compiled in when enabled)
    // ------------------------------------------------------------------
    /// Append a history entry for the instruction just fetched.
    RecordHistory,

    /// Store the effective address into the newest history entry.
    RecordEa,

    /// Mark the instruction address as executed.
    MarkPath,

    /// Mark the new PC as the start of a path (jump/call/vector target).
    MarkPathStart,

    // ------------------------------------------------------------------
    // Bus cycles
    // ------------------------------------------------------------------
    /// Read K:PC and discard.
    DummyReadPc,

    /// Read the effective address and discard.
    DummyRead,

    /// Read the current stack address and discard.
    DummyStack,

    /// Read the stack address and decrement S, as reset does in place of
    /// the three interrupt pushes.
    DummyStackDec,

    /// Write the data latch back to the effective address (NMOS RMW).
    DummyWrite,

    /// Internal operation: no bus access.
    Idle,

    /// data = read(K:PC); PC += 1.
    ReadImm,

    /// data.high = read(K:PC); PC += 1.
    ReadImmHigh,

    /// addr = D + read(K:PC); bank 0; PC += 1.
    ReadDp,

    /// addr.low = read(K:PC); PC += 1.
    ReadAddrLo,

    /// addr.high = read(K:PC); PC += 1; bank = DBR.
    ReadAddrHi,

    /// bank = read(K:PC); PC += 1.
    ReadAddrBank,

    /// ptr = EA; data.low = read(ptr).
    ReadPtrLo,

    /// data.high = read(ptr + 1); addr = data; bank = DBR.
    ReadPtrHi(Wrap),

    /// bank = read(ptr + 1) after [`MicroOp::ReadPtrHi`].
    ReadPtrBank(Wrap),

    /// data = read(EA).
    Read,

    /// data.high = read(EA + 1).
    ReadHigh,

    /// write(EA, data.low).
    Write,

    /// write(EA + 1, data.high).
    WriteHigh,

    /// data.low = read(vector) in bank 0.
    ReadVectorLo(u16),

    /// PC = data.low | read(vector + 1) << 8; K = 0.
    ReadVectorHi(u16),

    /// Read K:PC and discard, then PC += 1 (RTS last cycle).
    ReadIncPc,

    /// write(stack, data.low); S -= 1.
    Push,

    /// write(stack, data.high); S -= 1.
    PushHigh,

    PushPch,
    PushPcl,
    /// Push the program bank register.
    PushK,

    /// S += 1; data = read(stack).
    Pop,

    /// S += 1; data.high = read(stack).
    PopHigh,

    PopPcl,
    PopPch,
    /// Pop the program bank register.
    PopK,

    /// data = read(bank:X) for a block move.
    MoveRead,

    /// write(DBR:Y, data); step X and Y.
    MoveWrite(Direction),

    // ------------------------------------------------------------------
    // Conditional cycles
    // ------------------------------------------------------------------
    /// Dummy read at the uncarried address if indexing crossed a page;
    /// otherwise instant.
    ReadCarry,

    /// Dummy read at the uncarried address, always.
    ReadCarryForced,

    /// Internal cycle if indexing crossed a page; otherwise instant.
    IdleCarry,

    /// Internal cycle if D's low byte is non-zero; otherwise instant.
    DpPenalty,

    /// Dummy read at K:PC in decimal mode; otherwise instant (65C02).
    DecimalPenalty,

    /// Taken: dummy read of K:PC, PC += offset. Not taken: instant and the
    /// following fixup is skipped.
    Branch(Cond),

    /// Dummy read at the half-updated PC after a page-crossing branch.
    /// Skipped by [`MicroOp::Branch`] when no fixup is needed.
    BranchFixup,

    // ------------------------------------------------------------------
    // Instant: address arithmetic
    // ------------------------------------------------------------------
    /// Index a direct-page address, honouring emulation-mode page wrap.
    DpIndex(Index),

    /// EA += index across the data bank, tracking page crossing.
    AddIndex(Index),

    /// addr += index, wrapping inside the current bank.
    AddIndexInBank(Index),

    /// addr = S + addr; bank 0.
    StackRelative,

    SetBank(BankSel),

    // ------------------------------------------------------------------
    // Instant: data movement and ALU
    // ------------------------------------------------------------------
    /// data = register.
    Load(Reg, Width),

    /// register = data.
    Store(Reg, Width),

    /// Update N and Z from data.
    SetNz(Width),

    /// data = P, formatted for pushing.
    LoadStatus(PushedStatus),

    /// P = data (PLP/RTI), with width and IRQ-release side effects.
    StoreStatus,

    Alu(Alu, Width),

    /// SHA/SHX/SHY/TAS store value and address glitch.
    StoreHighAnd(HighAnd),

    SetFlag(u8),
    ClearFlag(u8),

    /// Clear I and delay IRQ recognition by one instruction.
    Cli,

    /// P &= !data (REP).
    Rep,

    /// P |= data (SEP).
    Sep,

    /// Swap C and E.
    Xce,

    /// Swap A and AH.
    Xba,

    /// Apply reset-time register state for the active family.
    ResetState,

    /// Latch whether bit n of data equals the given state (BBR/BBS).
    TestBit(u8, bool),

    ResetBit(u8),
    SetBit(u8),

    // ------------------------------------------------------------------
    // Instant: control flow
    // ------------------------------------------------------------------
    /// PC = addr.
    JumpAddr,

    /// PC = addr; K = bank.
    JumpLong,

    /// PC += data (BRL).
    BranchLong,

    /// PC += 1 (RTL).
    IncPc,

    /// PC -= 1, so a 65C816 call pushes the address of its last operand
    /// byte after reading it.
    DecPc,

    /// data = PC + data (PER).
    PcRelative,

    /// C -= 1; if C != $FFFF, PC -= 3 so the move repeats.
    MoveRepeat,
}

/// Timing class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Timing {
    Instant,
    Bus,
    Conditional,
    /// Reports to the host without taking a cycle.
    Event,
}

impl MicroOp {
    pub(crate) const fn timing(self) -> Timing {
        match self {
            Self::RecordHistory
            | Self::RecordEa
            | Self::MarkPath
            | Self::MarkPathStart
            | Self::DpIndex(_)
            | Self::AddIndex(_)
            | Self::AddIndexInBank(_)
            | Self::StackRelative
            | Self::SetBank(_)
            | Self::Load(..)
            | Self::Store(..)
            | Self::SetNz(_)
            | Self::LoadStatus(_)
            | Self::StoreStatus
            | Self::Alu(..)
            | Self::StoreHighAnd(_)
            | Self::SetFlag(_)
            | Self::ClearFlag(_)
            | Self::Cli
            | Self::Rep
            | Self::Sep
            | Self::Xce
            | Self::Xba
            | Self::ResetState
            | Self::TestBit(..)
            | Self::ResetBit(_)
            | Self::SetBit(_)
            | Self::JumpAddr
            | Self::JumpLong
            | Self::BranchLong
            | Self::IncPc
            | Self::DecPc
            | Self::PcRelative
            | Self::MoveRepeat => Timing::Instant,

            Self::ReadCarry
            | Self::IdleCarry
            | Self::DpPenalty
            | Self::DecimalPenalty
            | Self::Branch(_) => Timing::Conditional,

            Self::Unsupported => Timing::Event,

            _ => Timing::Bus,
        }
    }

    /// True for tokens whose bus cycle is a write.
    ///
    /// RDY does not stop the NMOS 6502 on write cycles.
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(
            self,
            Self::Write
                | Self::WriteHigh
                | Self::DummyWrite
                | Self::Push
                | Self::PushHigh
                | Self::PushPch
                | Self::PushPcl
                | Self::PushK
                | Self::MoveWrite(_)
        )
    }
}
