//! Register-to-register operations (spec §4.4 "new-regop and regop").

use super::advance_pc;
use crate::decode::RegOp;
use crate::error::Exception;
use crate::machine::Machine;

pub fn exec(m: &mut Machine, op: RegOp, dst: usize, src: usize) -> Result<(), Exception> {
    let level = m.level();
    match op {
        RegOp::Move => {
            let v = m.regs.read(level, src);
            m.regs.write(level, dst, v);
        }
        RegOp::Clear => m.regs.write(level, dst, 0),
        RegOp::Incr => {
            let v = m.regs.read(level, dst).wrapping_add(1);
            m.regs.write(level, dst, v);
        }
        RegOp::Decr => {
            let v = m.regs.read(level, dst).wrapping_sub(1);
            m.regs.write(level, dst, v);
        }
        RegOp::Compl => {
            let v = !m.regs.read(level, dst);
            m.regs.write(level, dst, v);
        }
        RegOp::Neg => {
            let v = m.regs.read(level, dst).wrapping_neg();
            m.regs.write(level, dst, v);
        }
        RegOp::Swap => {
            let a = m.regs.read(level, dst);
            let b = m.regs.read(level, src);
            m.regs.write(level, dst, b);
            m.regs.write(level, src, a);
        }
        RegOp::Nop => {}
    }
    advance_pc(m, 1);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::reg_idx;

    #[test]
    fn move_copies_src_into_dst() {
        let mut m = Machine::new();
        m.regs.write(0, reg_idx::T, 42);
        exec(&mut m, RegOp::Move, reg_idx::A, reg_idx::T).unwrap();
        assert_eq!(m.regs.read(0, reg_idx::A), 42);
    }

    #[test]
    fn swap_exchanges_both_registers() {
        let mut m = Machine::new();
        m.regs.write(0, reg_idx::A, 1);
        m.regs.write(0, reg_idx::T, 2);
        exec(&mut m, RegOp::Swap, reg_idx::A, reg_idx::T).unwrap();
        assert_eq!(m.regs.read(0, reg_idx::A), 2);
        assert_eq!(m.regs.read(0, reg_idx::T), 1);
    }
}
