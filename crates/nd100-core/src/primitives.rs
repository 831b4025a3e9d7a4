//! Global constants shared across the CORE.

/// A word is 16 bits on the ND100.
pub type Word = u16;

/// Number of words in physical memory (2^16).
pub const MEM_WORDS: usize = 65_536;

/// Number of bytes in the byte-addressable view of memory (2^17).
pub const MEM_BYTES: usize = MEM_WORDS * 2;

/// Number of priority levels (program levels 0..15).
pub const NUM_LEVELS: usize = 16;

/// Number of general registers per level bank (STS, D, P, B, L, A, T, X).
pub const REGS_PER_BANK: usize = 8;

/// Number of page-table shadow sets (one selectable via PGS).
pub const NUM_PAGE_SETS: usize = 4;

/// Number of page-table entries per shadow set.
pub const PTES_PER_SET: usize = 64;

/// Words per page (1K words).
pub const PAGE_SIZE_WORDS: u16 = 1024;

/// Register bank index layout, fixed by the ISA.
pub mod reg_idx {
    pub const STS: usize = 0;
    pub const D: usize = 1;
    pub const P: usize = 2;
    pub const B: usize = 3;
    pub const L: usize = 4;
    pub const A: usize = 5;
    pub const T: usize = 6;
    pub const X: usize = 7;
}

/// Internal-interrupt level, used for illegal instruction, page fault,
/// IOX error, protect violation and unhandled MON.
pub const INTERNAL_INTERRUPT_LEVEL: u8 = 14;

/// RTC interrupt level.
pub const RTC_LEVEL: u8 = 13;
/// Console input interrupt level.
pub const CONSOLE_IN_LEVEL: u8 = 12;
/// Console output interrupt level.
pub const CONSOLE_OUT_LEVEL: u8 = 10;
/// Floppy / HDD shared interrupt level.
pub const DISK_LEVEL: u8 = 11;
