//! Compare-and-jump family (spec §4.5): tests A, X or carry; on success
//! P is set to a P-relative target, otherwise execution falls through.

use super::advance_pc;
use crate::decode::CmpJumpCond;
use crate::error::Exception;
use crate::machine::Machine;
use crate::primitives::reg_idx;

fn holds(m: &Machine, cond: CmpJumpCond) -> bool {
    let level = m.level();
    let a = m.regs.read(level, reg_idx::A) as i16;
    let x = m.regs.read(level, reg_idx::X);
    match cond {
        CmpJumpCond::Jap => a > 0,
        CmpJumpCond::Jan => a < 0,
        CmpJumpCond::Jaz => a == 0,
        CmpJumpCond::Jaf => a != 0,
        CmpJumpCond::Jpc => m.regs.sts(level).carry(),
        CmpJumpCond::Jnc => !m.regs.sts(level).carry(),
        CmpJumpCond::Jxz => x == 0,
        CmpJumpCond::Jxn => x != 0,
        CmpJumpCond::Jpl => true,
    }
}

pub fn exec(m: &mut Machine, cond: CmpJumpCond, displacement: i8) -> Result<(), Exception> {
    if holds(m, cond) {
        let level = m.level();
        let p = m.regs.pc(level);
        let target = p.wrapping_add(displacement as i16 as u16);
        m.regs.set_pc(level, target);
    } else {
        advance_pc(m, 1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jaz_jumps_when_a_is_zero() {
        let mut m = Machine::new();
        m.regs.set_pc(0, 100);
        exec(&mut m, CmpJumpCond::Jaz, 10).unwrap();
        assert_eq!(m.regs.pc(0), 110);
    }

    #[test]
    fn jaz_falls_through_when_a_nonzero() {
        let mut m = Machine::new();
        m.regs.write(0, reg_idx::A, 5);
        m.regs.set_pc(0, 100);
        exec(&mut m, CmpJumpCond::Jaz, 10).unwrap();
        assert_eq!(m.regs.pc(0), 101);
    }

    #[test]
    fn jpl_always_jumps() {
        let mut m = Machine::new();
        m.regs.set_pc(0, 0);
        exec(&mut m, CmpJumpCond::Jpl, -5).unwrap();
        assert_eq!(m.regs.pc(0), 0xfffb);
    }
}
