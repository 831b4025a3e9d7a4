//! Top-level CPU: owns every subsystem and runs the fetch/decode/execute
//! loop (spec §2 "Data/control flow").

use tracing::trace;

use crate::decode::{self, Instr};
use crate::error::Exception;
use crate::exec;
use crate::interrupt::InterruptController;
use crate::io::IoDispatch;
use crate::memory::MemoryStore;
use crate::page::{PageFault, PageTable};
use crate::primitives::INTERNAL_INTERRUPT_LEVEL;
use crate::reg::{ControlRegisters, RegisterFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
}

pub struct Machine {
    pub mem: MemoryStore,
    pub page: PageTable,
    pub regs: RegisterFile,
    pub ctl: ControlRegisters,
    pub intr: InterruptController,
    pub io: IoDispatch,
    pub run_state: RunState,
    /// Set while an `EXR`-dispatched instruction is executing, so a nested
    /// `EXR` can be rejected (spec §4.6).
    pub(crate) exr_active: bool,
}

impl Machine {
    pub fn new() -> Self {
        Self {
            mem: MemoryStore::new(),
            page: PageTable::new(),
            regs: RegisterFile::new(),
            ctl: ControlRegisters::new(),
            intr: InterruptController::new(),
            io: IoDispatch::new(),
            run_state: RunState::Stopped,
            exr_active: false,
        }
    }

    pub fn level(&self) -> u8 {
        self.ctl.actl as u8
    }

    /// Cache-unavailable bit of CSR, forced on by MCL (spec §3).
    const CSR_CACHE_UNAVAILABLE: u16 = 1 << 2;

    /// `MCL`: spec §4.6. Registers, STS and the IDENT chain are cleared;
    /// memory and the page table are left untouched (a separate `LOAD`
    /// operation supplies those), and the CPU is left in `Stopped` state.
    pub fn master_clear(&mut self) {
        self.regs.clear();
        self.ctl.master_clear();
        self.ctl.csr |= Self::CSR_CACHE_UNAVAILABLE;
        self.intr.clear();
        let mut sts = crate::reg::Sts::default();
        sts.clear_static_overflow();
        sts.0 |= crate::reg::sts::O | crate::reg::sts::N100;
        self.regs.set_sts(0, sts);
        self.run_state = RunState::Stopped;
    }

    /// Translate a virtual word address, turning a page-table miss into the
    /// matching `Exception` variant (spec §4.2, §7).
    pub fn translate(&mut self, virt: u16, for_write: bool, use_apt: bool) -> Result<u16, Exception> {
        self.page
            .translate(virt, for_write, use_apt)
            .map(|t| t.phys_word_addr)
            .map_err(|e| match e {
                PageFault::Invalid => Exception::PageFault(virt),
                PageFault::Protected => Exception::ProtectViolation(virt),
            })
    }

    fn fetch(&mut self) -> Result<u16, Exception> {
        let p = self.regs.pc(self.level());
        let phys = self.translate(p, false, false)?;
        Ok(self.mem.read_word(phys))
    }

    /// Run exactly one instruction, including the interrupt/level-switch
    /// check that follows every instruction (spec §4.7 `check_and_switch`).
    pub fn step(&mut self) -> Result<(), Exception> {
        if self.run_state == RunState::Stopped {
            return Ok(());
        }
        let word = self.fetch()?;
        self.ctl.ir = word;
        self.ctl.instruction_counter = self.ctl.instruction_counter.wrapping_add(1);

        let outcome = match decode::decode(word) {
            Some(instr) => self.execute(instr),
            None => Err(Exception::IllegalInstruction(word)),
        };

        if let Err(e) = outcome {
            trace!(?e, word, "instruction raised an internal interrupt");
            self.ctl.iic = e.iic_subcode();
            self.intr.raise(INTERNAL_INTERRUPT_LEVEL);
        }

        self.check_and_switch();
        Ok(())
    }

    /// `InterruptController::check_and_switch` (spec §4.7). Each level
    /// already keeps its own P register, so switching levels is just
    /// updating PVL/ACTL; the next `fetch` naturally reads P out of the
    /// newly active bank.
    pub fn check_and_switch(&mut self) {
        let target = self.intr.highest_runnable();
        let current = self.level();
        if target != current {
            self.ctl.pvl = current as u16;
            self.ctl.actl = target as u16;
        }
    }

    fn execute(&mut self, instr: Instr) -> Result<(), Exception> {
        exec::dispatch(self, instr)
    }

    /// Decode and run a single instruction word out of line, used by `EXR`
    /// (spec §4.5). Does not touch the instruction counter or IIC.
    pub(crate) fn execute_word(&mut self, word: u16) -> Result<(), Exception> {
        match decode::decode(word) {
            Some(instr) => self.execute(instr),
            None => Err(Exception::IllegalInstruction(word)),
        }
    }

    /// Octal word address where the host-time side channel is stamped
    /// (spec §6: `[0125..0132]` octal).
    pub const HOST_TIME_BASE: u16 = 0o125;

    /// Stamps the six-word (sec, min, hour, day, month, year) host-time
    /// side channel (spec §6), grounded in `cpu_state.c`'s snapshot-save
    /// "Hack the date in 0000125..." block. The caller supplies the actual
    /// wall-clock values so the CORE stays free of a system-time
    /// dependency; `bins/nd100emu` is what reads the host clock.
    pub fn stamp_host_time(&mut self, sec: u16, min: u16, hour: u16, day: u16, month: u16, year: u16) {
        for (i, word) in [sec, min, hour, day, month, year].into_iter().enumerate() {
            self.mem
                .write_word(Self::HOST_TIME_BASE + i as u16, word, crate::memory::ByteSelect::Whole);
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_machine_does_not_fetch() {
        let mut m = Machine::new();
        assert!(m.step().is_ok());
        assert_eq!(m.ctl.instruction_counter, 0);
    }

    #[test]
    fn master_clear_resets_sticky_overflow_and_n100() {
        let mut m = Machine::new();
        m.master_clear();
        let sts = m.regs.sts(0);
        assert!(sts.static_overflow());
        assert!(sts.n100());
    }

    #[test]
    fn master_clear_marks_the_cache_unavailable() {
        let mut m = Machine::new();
        m.master_clear();
        assert_ne!(m.ctl.csr & Machine::CSR_CACHE_UNAVAILABLE, 0);
    }

    #[test]
    fn stamp_host_time_writes_six_consecutive_words() {
        let mut m = Machine::new();
        m.stamp_host_time(1, 2, 3, 4, 5, 2026);
        assert_eq!(m.mem.read_word(Machine::HOST_TIME_BASE), 1);
        assert_eq!(m.mem.read_word(Machine::HOST_TIME_BASE + 5), 2026);
    }
}
