//! Byte operations (spec §4.5): act on the big-endian byte view over
//! memory. The byte-op encoding only has room for one base register (P or
//! X) and a 7-bit displacement, so `MOVB`/`MOVBF`/`BFILL` work against a
//! fixed A/T register pair rather than an arbitrary src/dst pair — see
//! DESIGN.md.

use super::advance_pc;
use crate::decode::ByteOp;
use crate::error::Exception;
use crate::machine::Machine;
use crate::primitives::reg_idx;

fn byte_address(m: &mut Machine, use_x: bool, displacement: i8, for_write: bool) -> Result<u32, Exception> {
    let level = m.level();
    let base = if use_x {
        m.regs.read(level, reg_idx::X)
    } else {
        m.regs.pc(level)
    };
    let byte_addr = (base as u32) * 2 + (displacement as i32 as u32 & 0xffff);
    let word_addr = (byte_addr / 2) as u16;
    let phys_word = m.translate(word_addr, for_write, false)?;
    Ok((phys_word as u32) * 2 + (byte_addr % 2))
}

pub fn exec(m: &mut Machine, op: ByteOp, use_x: bool, displacement: i8) -> Result<(), Exception> {
    match op {
        ByteOp::Lbyt => {
            let addr = byte_address(m, use_x, displacement, false)?;
            let b = m.mem.read_byte(addr);
            let level = m.level();
            m.regs.write(level, reg_idx::T, b as u16);
        }
        ByteOp::Sbyt => {
            let addr = byte_address(m, use_x, displacement, true)?;
            let level = m.level();
            let b = m.regs.read(level, reg_idx::T) as u8;
            m.mem.write_byte(addr, b);
        }
        ByteOp::Movb => {
            let level = m.level();
            let b = m.regs.read(level, reg_idx::A) as u8;
            m.regs.write(level, reg_idx::T, b as u16);
        }
        ByteOp::Movbf => {
            let level = m.level();
            let b = m.regs.read(level, reg_idx::A) as u8 as i8;
            m.regs.write(level, reg_idx::T, b as i16 as u16);
        }
        ByteOp::Bfill => {
            let addr = byte_address(m, use_x, displacement, true)?;
            let level = m.level();
            let b = m.regs.read(level, reg_idx::A) as u8;
            m.mem.write_byte(addr, b);
        }
    }
    advance_pc(m, 1);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::RunState;
    use crate::memory::ByteSelect;

    fn identity_map(m: &mut Machine) {
        m.run_state = RunState::Running;
        for i in 0..64 {
            m.page.setpt(i, crate::page::Pte::new(i as u16, true, false, i as u8));
        }
    }

    #[test]
    fn sbyt_then_lbyt_round_trips_a_single_byte() {
        let mut m = Machine::new();
        identity_map(&mut m);
        m.regs.write(0, reg_idx::T, 0xab);
        exec(&mut m, ByteOp::Sbyt, true, 10).unwrap();
        exec(&mut m, ByteOp::Lbyt, true, 10).unwrap();
        assert_eq!(m.regs.read(0, reg_idx::T), 0xab);
    }

    #[test]
    fn lbyt_and_sbyt_address_opposite_bytes_of_the_same_word() {
        let mut m = Machine::new();
        identity_map(&mut m);
        m.regs.write(0, reg_idx::T, 0x11);
        exec(&mut m, ByteOp::Sbyt, true, 0).unwrap();
        m.regs.write(0, reg_idx::T, 0x22);
        exec(&mut m, ByteOp::Sbyt, true, 1).unwrap();
        assert_eq!(m.mem.read_word(0), 0x1122, "byte 0 is the high byte, big-endian");
        let _ = ByteSelect::Whole;
    }
}
