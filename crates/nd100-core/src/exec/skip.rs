//! Skip family (spec §4.5): compare two register sources, skip the next
//! instruction if the condition holds.

use super::advance_pc;
use crate::decode::SkipCond;
use crate::error::Exception;
use crate::machine::Machine;

fn holds(cond: SkipCond, a: u16, b: u16) -> bool {
    let (sa, sb) = (a as i16, b as i16);
    match cond {
        SkipCond::Eql => a == b,
        SkipCond::Ueq => a != b,
        SkipCond::Geq => sa >= sb,
        SkipCond::Gre => sa > sb,
        SkipCond::Lss => sa < sb,
        SkipCond::Lsse => sa <= sb,
        SkipCond::Mgre => a > b,
        SkipCond::Mlss => a < b,
    }
}

pub fn exec(m: &mut Machine, cond: SkipCond, reg_a: usize, reg_b: usize) -> Result<(), Exception> {
    let level = m.level();
    let a = m.regs.read(level, reg_a);
    let b = m.regs.read(level, reg_b);
    advance_pc(m, if holds(cond, a, b) { 2 } else { 1 });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::reg_idx;

    #[test]
    fn equal_registers_skip() {
        let mut m = Machine::new();
        m.regs.write(0, reg_idx::A, 7);
        m.regs.write(0, reg_idx::T, 7);
        exec(&mut m, SkipCond::Eql, reg_idx::A, reg_idx::T).unwrap();
        assert_eq!(m.regs.pc(0), 2);
    }

    #[test]
    fn unequal_does_not_skip_under_eql() {
        let mut m = Machine::new();
        m.regs.write(0, reg_idx::A, 7);
        m.regs.write(0, reg_idx::T, 8);
        exec(&mut m, SkipCond::Eql, reg_idx::A, reg_idx::T).unwrap();
        assert_eq!(m.regs.pc(0), 1);
    }

    #[test]
    fn mgre_compares_unsigned() {
        let mut m = Machine::new();
        m.regs.write(0, reg_idx::A, 0x8000);
        m.regs.write(0, reg_idx::T, 1);
        exec(&mut m, SkipCond::Mgre, reg_idx::A, reg_idx::T).unwrap();
        assert_eq!(m.regs.pc(0), 2, "0x8000 > 1 unsigned even though it's negative signed");
    }
}
