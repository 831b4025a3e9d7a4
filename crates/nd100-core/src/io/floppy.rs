//! Floppy controller, registers 1560-1567 octal (spec §4.8), grounded in
//! `examples/original_source/io.c`'s `Floppy_IO` and `floppy.c`'s sector
//! geometry.

use crate::interrupt::{IdentEntry, InterruptController};
use crate::primitives::DISK_LEVEL;

const FLOPPY_IDENT: u16 = 0o21;
const FLOPPY_CALLER_ID: u16 = 201;

pub const RECALIBRATE: u8 = 64;
pub const SEEK: u8 = 32;
pub const READ_ID: u8 = 8;
pub const READ_DATA: u8 = 16;
pub const WRITE_DATA: u8 = 4 | 2;
pub const FORMAT_TRACK: u8 = 1;
pub const CONTROL_RESET: u8 = 128;

/// A command the host-side disk-image worker must service. `Floppy::write`
/// only records intent; the actual file I/O happens off this struct
/// (spec's ambient concurrency model keeps file access out of the core).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub opcode: u8,
    pub track: u16,
    pub sector: u16,
    pub side: u16,
}

#[derive(Debug)]
pub struct Floppy {
    rdad: u16,
    wdat: u16,
    rsr1: u16,
    rsr2: u16,
    wdad: u16,
    wsct: u16,
    irq_en: bool,
    pending: Option<Command>,
    /// The controller's 2K-word sector buffer (spec §4.8).
    buffer: Vec<u16>,
    bufptr: usize,
}

impl Floppy {
    pub fn new() -> Self {
        Self {
            rdad: 0,
            wdat: 0,
            rsr1: 0,
            rsr2: 0,
            wdad: 0,
            wsct: 0,
            irq_en: false,
            pending: None,
            buffer: vec![0; 2048],
            bufptr: 0,
        }
    }

    pub fn take_pending(&mut self) -> Option<Command> {
        self.pending.take()
    }

    pub fn buffer_mut(&mut self) -> &mut [u16] {
        &mut self.buffer
    }

    pub fn buffer(&self) -> &[u16] {
        &self.buffer
    }

    /// Called by the host worker once it has serviced `take_pending`.
    pub fn complete(&mut self, intr: &mut InterruptController) {
        self.rsr1 |= 1 << 0;
        if self.irq_en {
            intr.enqueue_ident(IdentEntry {
                level: DISK_LEVEL,
                identcode: FLOPPY_IDENT,
                caller_id: FLOPPY_CALLER_ID,
            });
        }
    }

    pub fn read(&mut self, reg: u16) -> u16 {
        match reg {
            0 => self.rdad,
            2 => self.rsr1,
            4 => self.rsr2,
            6 => self.buffer.get(self.bufptr).copied().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn write(&mut self, reg: u16, value: u16) {
        match reg {
            0 => self.rdad = value,
            1 => self.wdat = value,
            3 => self.dispatch_wcwd(value),
            5 => self.wdad = value,
            7 => self.wsct = value,
            _ => {}
        }
    }

    fn dispatch_wcwd(&mut self, value: u16) {
        let command_byte = (value >> 8) as u8;
        self.irq_en = value & (1 << 7) != 0;

        // Autoload: bit 2 of the command byte recalibrates to a fixed
        // track/sector and resets the read pointer (spec §6 supplement,
        // grounded on `io.c`'s `WCWD` autoload handling).
        if command_byte & (1 << 2) != 0 {
            self.rdad = 48;
            self.wsct = 1;
            self.bufptr = 0;
            return;
        }

        self.pending = Some(Command {
            opcode: command_byte,
            track: self.rdad,
            sector: self.wsct,
            side: self.wdad,
        });
        self.bufptr = 0;
    }
}

impl Default for Floppy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_command_queues_a_command_for_the_host() {
        let mut f = Floppy::new();
        f.write(0, 3); // track
        f.write(7, 2); // sector
        f.write(3, (READ_DATA as u16) << 8);
        let cmd = f.take_pending().unwrap();
        assert_eq!(cmd.opcode, READ_DATA);
        assert_eq!(cmd.track, 3);
        assert_eq!(cmd.sector, 2);
    }

    #[test]
    fn completion_raises_the_disk_level_when_enabled() {
        let mut f = Floppy::new();
        let mut intr = InterruptController::new();
        f.write(3, ((READ_DATA as u16) << 8) | (1 << 7));
        f.take_pending();
        f.complete(&mut intr);
        assert_eq!(intr.pop_ident(DISK_LEVEL).unwrap().identcode, FLOPPY_IDENT);
    }

    #[test]
    fn autoload_bit_forces_track_48() {
        let mut f = Floppy::new();
        f.write(3, 1 << 2);
        assert!(f.take_pending().is_none());
        assert_eq!(f.read(0), 48);
    }
}
