//! IOX/IOXT family (spec §4.5, §4.8): even IO addresses read a device
//! register into A, odd addresses consume A and write it out. `IOX` takes
//! its 11-bit address from the instruction itself; `IOXT` takes it from
//! the T register (spec §4.8 "IOXT takes address from T register").

use super::advance_pc;
use crate::error::Exception;
use crate::machine::Machine;
use crate::primitives::reg_idx;

pub fn exec(m: &mut Machine, use_t: bool, addr: u16) -> Result<(), Exception> {
    let level = m.level();
    let io_addr = if use_t { m.regs.read(level, reg_idx::T) } else { addr };
    let iie = m.ctl.iie;

    if io_addr & 1 == 0 {
        let value = m.io.read(io_addr, &mut m.intr, iie)?;
        m.regs.write(level, reg_idx::A, value);
    } else {
        let value = m.regs.read(level, reg_idx::A);
        m.io.write(io_addr, value, &mut m.intr, iie)?;
    }

    advance_pc(m, 1);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_address_reads_a_device_register_into_a() {
        let mut m = Machine::new();
        m.io.console.write(7, b'q' as u16, &mut m.intr);
        // 0o307 is the console output data register (odd, a write port);
        // 0o304 is its even status-read counterpart.
        exec(&mut m, false, 0o304).unwrap();
        assert_eq!(m.regs.read(0, reg_idx::A) & 0o10, 0o10, "ready bit set");
    }

    #[test]
    fn odd_address_writes_a_into_the_device() {
        let mut m = Machine::new();
        m.regs.write(0, reg_idx::A, b'z' as u16);
        exec(&mut m, false, 0o307).unwrap();
        assert_eq!(m.io.console.host_pop_output(), Some(b'z'));
    }

    #[test]
    fn ioxt_takes_its_address_from_t() {
        let mut m = Machine::new();
        m.regs.write(0, reg_idx::A, b'y' as u16);
        m.regs.write(0, reg_idx::T, 0o307);
        exec(&mut m, true, 0).unwrap();
        assert_eq!(m.io.console.host_pop_output(), Some(b'y'));
    }

    #[test]
    fn unmapped_address_times_out_when_iie_bit_seven_set() {
        let mut m = Machine::new();
        m.ctl.iie = 1 << 7;
        let err = exec(&mut m, false, 0x7ffe).unwrap_err();
        assert_eq!(err, Exception::IoxError(0x7ffe));
    }
}
