//! Global (not per-level) control registers, grounded in the field list
//! `examples/original_source/cpu_state.c` saves under `PVL`, `IID`, `IIE`,
//! `CSR`, `CCL`, `ACTL`, `LCIL`, `ALD`, `UCIL`, `PES`, `PGC`, `PEA`, `ECCR`,
//! `MIIC`, `MPEA`, `MPES`, `MPGS`, `INCT`, `MIR`, `MPFB`, `PANS`, `PANC`,
//! `OPR`, `LMP`, `PGS`. `PID`/`PIE` are persisted too, but their owner is
//! `InterruptController`, not this struct (see `interrupt.rs`).

use crate::primitives::Word;

#[derive(Debug, Clone, Default)]
pub struct ControlRegisters {
    /// Instruction register: the last-fetched instruction word.
    pub ir: Word,
    /// Previous Active Level, pushed by `check_and_switch` on every level
    /// change and restored by `RTCR`/level-return.
    pub pvl: Word,
    /// Internal Interrupt Code: sub-code bitmask for the last level-14
    /// internal interrupt.
    pub iic: Word,
    /// Internal Interrupt Destination level (fixed at 14 on this machine,
    /// kept as a register because `cpustate.bin` persists it).
    pub iid: Word,
    /// Internal Interrupt Enable mask.
    pub iie: Word,
    /// Control and Status Register (paging/cache enable bits).
    pub csr: Word,
    /// Cache Control register.
    pub ccl: Word,
    /// Active level: must equal the current STS bank's level field at all
    /// times (spec §4.5 invariant).
    pub actl: Word,
    /// Lower/upper Current Instruction Level bounds (memory protection).
    pub lcil: Word,
    pub ucil: Word,
    /// Automatic Load Descriptor.
    pub ald: Word,
    /// Page Exception Status.
    pub pes: Word,
    /// Page exception Cause.
    pub pgc: Word,
    /// Page Exception Address.
    pub pea: Word,
    /// Page Fault Bus-error address.
    pub pfb: Word,
    /// Panel Control / Panel Status.
    pub panc: Word,
    pub pans: Word,
    /// Operator panel register.
    pub opr: Word,
    /// Lamp/indicator register.
    pub lmp: Word,
    /// Error Correcting Code Register.
    pub eccr: Word,
    /// Free-running executed-instruction counter, persisted as `INSTR_COUNT`
    /// in `cpustate.bin`.
    pub instruction_counter: u64,
}

impl ControlRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    /// `MCL`: master clear of the global control registers (spec §4.6).
    /// Per-level banks and the page table are cleared separately by their
    /// own owners.
    pub fn master_clear(&mut self) {
        *self = Self {
            instruction_counter: self.instruction_counter,
            ..Self::default()
        };
    }
}
