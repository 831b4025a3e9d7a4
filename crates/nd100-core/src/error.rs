//! Internal-interrupt taxonomy (spec §7). Every variant here corresponds to
//! a condition that is raised as a level-14 internal interrupt rather than
//! propagated as a host-level `Result` error past `Machine::step`.

use thiserror::Error;

/// A condition detected during instruction execution that must be turned
/// into a level-14 internal interrupt.
///
/// This plays the role the teacher's `rv64_emu::exception::Exception` plays
/// for RISC-V traps: it is the `Err` arm threaded through every `exec::*`
/// handler, and `Machine::step` turns it into the IIC sub-code the guest
/// observes.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    #[error("illegal instruction {0:#06x}")]
    IllegalInstruction(u16),
    #[error("privileged instruction {0:#06x} executed outside ring 0")]
    PrivilegedInUser(u16),
    #[error("IOX error/timeout at io address {0:#06o}")]
    IoxError(u16),
    #[error("page fault translating virtual address {0:#06o}")]
    PageFault(u16),
    #[error("protect violation translating virtual address {0:#06o}")]
    ProtectViolation(u16),
    #[error("unhandled MON {0}")]
    MonUnhandled(u8),
    #[error("IDENT on level {0} found no queued entry")]
    NoIdent(u8),
    #[error("nested EXR is forbidden")]
    NestedExr,
}

impl Exception {
    /// The sub-code recorded in IIC (spec §3, §7). Values are assigned in
    /// the order the original `interrupt()` call sites in
    /// `examples/original_source/io.c` raise them; callers only need the
    /// values to be stable and distinct, since no guest software depends on
    /// these exact bit patterns outside generated test programs.
    pub fn iic_subcode(&self) -> u16 {
        match self {
            Exception::IllegalInstruction(_) => 1 << 0,
            Exception::PrivilegedInUser(_) => 1 << 1,
            Exception::PageFault(_) => 1 << 2,
            Exception::ProtectViolation(_) => 1 << 3,
            Exception::MonUnhandled(_) => 1 << 4,
            Exception::NoIdent(_) => 1 << 5,
            Exception::NestedExr => 1 << 6,
            // IOX error/timeout uses bit 7, matching io.c's
            // `interrupt(14, 1<<7)` call in `Default_IO`.
            Exception::IoxError(_) => 1 << 7,
        }
    }
}
