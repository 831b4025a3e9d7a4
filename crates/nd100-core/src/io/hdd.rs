//! HDD controller, registers 1540-1547 octal (spec §4.8), grounded in
//! `examples/original_source/io.c`'s `HDD_IO` and `hdd_thread`'s 823/5/18
//! cylinder/surface/sector geometry.

use crate::interrupt::{IdentEntry, InterruptController};
use crate::primitives::DISK_LEVEL;

const HDD_IDENT: u16 = 0o17;
const HDD_CALLER_ID: u16 = 101;

pub const READ_TRANSFER: u8 = 0;
pub const WRITE_TRANSFER: u8 = 1;
pub const INITIATE_SEEK: u8 = 4;
pub const RETURN_TO_ZERO: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub opcode: u8,
    pub cylinder: u16,
    pub surface: u16,
    pub sector: u16,
    pub word_count: u32,
    pub mem_addr: u32,
}

#[derive(Debug, Default)]
pub struct Hdd {
    word_count_hi: u16,
    mem_addr_hi: u16,
    surface: u16,
    sector: u16,
    status: u16,
    error: u16,
    irq_en: bool,
    /// Mirrors `HDD_IO`'s `dev->cwr & 0x8000`: selects whether register 1
    /// loads the word-count or the memory-address high half. Latched from
    /// the control word written through register 5, not register 1 itself.
    wc_select: bool,
    pending: Option<Command>,
}

impl Hdd {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_pending(&mut self) -> Option<Command> {
        self.pending.take()
    }

    pub fn complete(&mut self, intr: &mut InterruptController) {
        self.status |= 1 << 0;
        if self.irq_en {
            intr.enqueue_ident(IdentEntry {
                level: DISK_LEVEL,
                identcode: HDD_IDENT,
                caller_id: HDD_CALLER_ID,
            });
        }
    }

    pub fn read(&mut self, reg: u16) -> u16 {
        match reg {
            0 => self.status,
            6 => self.error,
            _ => 0,
        }
    }

    pub fn write(&mut self, reg: u16, value: u16) {
        match reg {
            1 => {
                if self.wc_select {
                    self.word_count_hi = value;
                } else {
                    self.mem_addr_hi = value;
                }
            }
            3 => {
                self.surface = (value >> 8) & 0xff;
                self.sector = value & 0xff;
            }
            5 => self.dispatch_cwr(value),
            7 => {
                self.pending = None;
                self.status = 0;
                self.error = 0;
            }
            _ => {}
        }
    }

    /// Register 5, `HDD_IO`'s case 5 `WCWD`: the command-dispatch register.
    /// Bit 15 latches `wc_select` for the register-1 alias, bits 11-14 are
    /// the opcode, bits 0-10 the target cylinder (spec §4.8).
    fn dispatch_cwr(&mut self, value: u16) {
        self.wc_select = value & 0x8000 != 0;
        self.irq_en = value & (1 << 10) != 0;
        let opcode = ((value >> 11) & 0x0f) as u8;
        let cylinder = value & 0x7ff;
        let word_count = ((self.word_count_hi as u32) << 16) | value as u32;
        let mem_addr = ((self.mem_addr_hi as u32) << 16) | value as u32;
        self.pending = Some(Command {
            opcode,
            cylinder,
            surface: self.surface,
            sector: self.sector,
            word_count,
            mem_addr,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cwr_write_queues_a_command() {
        let mut h = Hdd::new();
        h.write(3, (2u16 << 8) | 7);
        h.write(5, ((READ_TRANSFER as u16) << 11) | (1 << 10) | 10);
        let cmd = h.take_pending().unwrap();
        assert_eq!(cmd.opcode, READ_TRANSFER);
        assert_eq!(cmd.cylinder, 10);
        assert_eq!(cmd.surface, 2);
        assert_eq!(cmd.sector, 7);
    }

    #[test]
    fn completion_posts_disk_level_ident() {
        let mut h = Hdd::new();
        let mut intr = InterruptController::new();
        h.write(5, (1 << 10) | ((WRITE_TRANSFER as u16) << 11));
        h.take_pending();
        h.complete(&mut intr);
        assert_eq!(intr.pop_ident(DISK_LEVEL).unwrap().identcode, HDD_IDENT);
    }

    #[test]
    fn even_registers_are_read_only_and_ignored_by_write() {
        let mut h = Hdd::new();
        h.write(4, 0xffff);
        assert!(h.take_pending().is_none());
    }
}
