//! Per-opcode handlers (spec §4.5, §4.6). Each handler owns advancing the
//! active level's P register; ordinary instructions add 1, skips that take
//! add 2, jumps set P directly.

mod bops;
mod byte_ops;
mod cmpjump;
mod io_instr;
mod mem_ref;
mod privileged;
mod regop;
mod shift;
mod skip;

use crate::decode::Instr;
use crate::ea::{self, Mode};
use crate::error::Exception;
use crate::machine::Machine;
use crate::primitives::reg_idx;

pub fn dispatch(m: &mut Machine, instr: Instr) -> Result<(), Exception> {
    match instr {
        Instr::Mrf { .. } => mem_ref::exec(m, instr),
        Instr::RegOp { op, dst, src } => regop::exec(m, op, dst, src),
        Instr::Shift { kind, pair, count } => shift::exec(m, kind, pair, count),
        Instr::Skip { cond, reg_a, reg_b } => skip::exec(m, cond, reg_a, reg_b),
        Instr::Bops { op, bit } => bops::exec(m, op, bit),
        Instr::CmpJump { cond, displacement } => cmpjump::exec(m, cond, displacement),
        Instr::Io { use_t, addr } => io_instr::exec(m, use_t, addr),
        Instr::Privileged { op, operand } => privileged::exec(m, op, operand),
        Instr::ByteOp {
            op,
            use_x,
            displacement,
        } => byte_ops::exec(m, op, use_x, displacement),
    }
}

/// Resolve a memory-reference effective address using the active level's
/// P/B/X registers (spec §4.4).
pub(crate) fn resolve_ea(m: &Machine, mode: Mode, displacement: i8, indirect: bool) -> u16 {
    let level = m.level();
    let p = m.regs.pc(level);
    let b = m.regs.read(level, reg_idx::B);
    let x = m.regs.read(level, reg_idx::X);
    ea::compute_ea(&m.mem, mode, p, b, x, displacement, indirect)
}

/// Advance P by `n` on the active level (the common case: 1 for a taken
/// straight-line instruction, 2 for a taken skip).
pub(crate) fn advance_pc(m: &mut Machine, n: u16) {
    let level = m.level();
    let p = m.regs.pc(level);
    m.regs.set_pc(level, p.wrapping_add(n));
}

/// STS update after an ALU op (spec §4.5): C from the 17th bit of the
/// 32-bit result, Q from signed overflow into bit 15, O sticky-ORed with Q.
pub(crate) fn adjust_sts(m: &mut Machine, result32: i32) {
    let level = m.level();
    let mut sts = m.regs.sts(level);
    sts.set_carry((result32 as u32) & 0x1_0000 != 0);
    let overflow = result32 > i16::MAX as i32 || result32 < i16::MIN as i32;
    sts.set_dynamic_overflow(overflow);
    m.regs.set_sts(level, sts);
}
