//! Memory-reference family: loads, stores and the A-accumulator arithmetic
//! and floating-point ops (spec §4.5).

use super::{adjust_sts, advance_pc, resolve_ea};
use crate::decode::{Instr, MrfOp};
use crate::error::Exception;
use crate::float::NdFloat;
use crate::machine::Machine;
use crate::primitives::reg_idx;

pub fn exec(m: &mut Machine, instr: Instr) -> Result<(), Exception> {
    let Instr::Mrf {
        op,
        mode,
        indirect,
        displacement,
    } = instr
    else {
        unreachable!("mem_ref::exec only receives Instr::Mrf")
    };

    let level = m.level();
    let ea = resolve_ea(m, mode, displacement, indirect);

    match op {
        MrfOp::Lda => load(m, ea, reg_idx::A)?,
        MrfOp::Ldt => load(m, ea, reg_idx::T)?,
        MrfOp::Ldx => load(m, ea, reg_idx::X)?,
        MrfOp::Ldd => load_double(m, ea)?,
        MrfOp::Ldf => load_float(m, ea)?,
        MrfOp::Sta => store(m, ea, reg_idx::A, false)?,
        MrfOp::Stt => store(m, ea, reg_idx::T, false)?,
        MrfOp::Stx => store(m, ea, reg_idx::X, false)?,
        MrfOp::Stz => store_zero(m, ea)?,
        MrfOp::Std => store_double(m, ea)?,
        MrfOp::Stf => store_float(m, ea)?,
        MrfOp::Statx => store(m, ea, reg_idx::A, true)?,
        MrfOp::Add => arith(m, ea, |a, b| a as i32 + b as i32)?,
        MrfOp::Sub => arith(m, ea, |a, b| a as i32 - b as i32)?,
        MrfOp::And => logical(m, ea, |a, b| a & b)?,
        MrfOp::Ora => logical(m, ea, |a, b| a | b)?,
        MrfOp::Min => min_and_skip(m, ea)?,
        MrfOp::Fad => float_arith(m, ea, NdFloat::add)?,
        MrfOp::Fsb => float_arith(m, ea, NdFloat::sub)?,
        MrfOp::Fmu => float_arith(m, ea, NdFloat::mul)?,
        MrfOp::Fdv => float_arith(m, ea, NdFloat::div)?,
    }

    let _ = level;
    advance_pc(m, 1);
    Ok(())
}

fn load(m: &mut Machine, ea: u16, reg: usize) -> Result<(), Exception> {
    let phys = m.translate(ea, false, false)?;
    let value = m.mem.read_word(phys);
    let level = m.level();
    m.regs.write(level, reg, value);
    Ok(())
}

fn store(m: &mut Machine, ea: u16, reg: usize, use_apt: bool) -> Result<(), Exception> {
    let level = m.level();
    let value = m.regs.read(level, reg);
    let phys = m.translate(ea, true, use_apt)?;
    m.mem.write_word(phys, value, crate::memory::ByteSelect::Whole);
    Ok(())
}

fn store_zero(m: &mut Machine, ea: u16) -> Result<(), Exception> {
    let phys = m.translate(ea, true, false)?;
    m.mem.write_word(phys, 0, crate::memory::ByteSelect::Whole);
    Ok(())
}

/// Two consecutive words, MSB (the A half) first (spec §4.5).
fn load_double(m: &mut Machine, ea: u16) -> Result<(), Exception> {
    let hi_phys = m.translate(ea, false, false)?;
    let lo_phys = m.translate(ea.wrapping_add(1), false, false)?;
    let hi = m.mem.read_word(hi_phys);
    let lo = m.mem.read_word(lo_phys);
    let level = m.level();
    m.regs.write(level, reg_idx::A, hi);
    m.regs.write(level, reg_idx::D, lo);
    Ok(())
}

fn store_double(m: &mut Machine, ea: u16) -> Result<(), Exception> {
    let level = m.level();
    let hi = m.regs.read(level, reg_idx::A);
    let lo = m.regs.read(level, reg_idx::D);
    let hi_phys = m.translate(ea, true, false)?;
    let lo_phys = m.translate(ea.wrapping_add(1), true, false)?;
    m.mem.write_word(hi_phys, hi, crate::memory::ByteSelect::Whole);
    m.mem.write_word(lo_phys, lo, crate::memory::ByteSelect::Whole);
    Ok(())
}

/// Three consecutive words: exponent, fraction-high, fraction-low (spec
/// §4.5), carried through the A/D/X registers.
fn load_float(m: &mut Machine, ea: u16) -> Result<(), Exception> {
    let words = read_three(m, ea, false)?;
    let level = m.level();
    m.regs.write(level, reg_idx::A, words[0]);
    m.regs.write(level, reg_idx::D, words[1]);
    m.regs.write(level, reg_idx::X, words[2]);
    Ok(())
}

fn store_float(m: &mut Machine, ea: u16) -> Result<(), Exception> {
    let level = m.level();
    let words = [
        m.regs.read(level, reg_idx::A),
        m.regs.read(level, reg_idx::D),
        m.regs.read(level, reg_idx::X),
    ];
    write_three(m, ea, words)
}

fn read_three(m: &mut Machine, ea: u16, for_write: bool) -> Result<[u16; 3], Exception> {
    let mut out = [0u16; 3];
    for (i, slot) in out.iter_mut().enumerate() {
        let phys = m.translate(ea.wrapping_add(i as u16), for_write, false)?;
        *slot = m.mem.read_word(phys);
    }
    Ok(out)
}

fn write_three(m: &mut Machine, ea: u16, words: [u16; 3]) -> Result<(), Exception> {
    for (i, word) in words.into_iter().enumerate() {
        let phys = m.translate(ea.wrapping_add(i as u16), true, false)?;
        m.mem.write_word(phys, word, crate::memory::ByteSelect::Whole);
    }
    Ok(())
}

fn current_float(m: &Machine) -> NdFloat {
    let level = m.level();
    NdFloat::from_words(
        m.regs.read(level, reg_idx::A),
        m.regs.read(level, reg_idx::D),
        m.regs.read(level, reg_idx::X),
    )
}

fn write_float(m: &mut Machine, f: NdFloat) {
    let level = m.level();
    let (e, hi, lo) = f.to_words();
    m.regs.write(level, reg_idx::A, e);
    m.regs.write(level, reg_idx::D, hi);
    m.regs.write(level, reg_idx::X, lo);
}

fn float_arith(
    m: &mut Machine,
    ea: u16,
    op: impl Fn(NdFloat, NdFloat) -> (NdFloat, crate::float::FloatStatus),
) -> Result<(), Exception> {
    let words = read_three(m, ea, false)?;
    let operand = NdFloat::from_words(words[0], words[1], words[2]);
    let accumulator = current_float(m);
    let (result, status) = op(accumulator, operand);
    write_float(m, result);
    let level = m.level();
    let mut sts = m.regs.sts(level);
    sts.set_zero(status.underflow);
    if status.overflow {
        sts.0 |= crate::reg::sts::O;
    }
    m.regs.set_sts(level, sts);
    Ok(())
}

/// `A <- A op mem[EA]`, updating C/Q/O via `adjust_sts` (spec §4.5).
fn arith(m: &mut Machine, ea: u16, op: impl Fn(u16, u16) -> i32) -> Result<(), Exception> {
    let phys = m.translate(ea, false, false)?;
    let operand = m.mem.read_word(phys);
    let level = m.level();
    let a = m.regs.read(level, reg_idx::A);
    let result = op(a, operand);
    m.regs.write(level, reg_idx::A, result as u16);
    adjust_sts(m, result);
    Ok(())
}

fn logical(m: &mut Machine, ea: u16, op: impl Fn(u16, u16) -> u16) -> Result<(), Exception> {
    let phys = m.translate(ea, false, false)?;
    let operand = m.mem.read_word(phys);
    let level = m.level();
    let a = m.regs.read(level, reg_idx::A);
    let result = op(a, operand);
    m.regs.write(level, reg_idx::A, result);
    let mut sts = m.regs.sts(level);
    sts.set_zero(result == 0);
    m.regs.set_sts(level, sts);
    Ok(())
}

/// `MIN`: increment the addressed word; the skip chain that follows reads
/// STS.Z, which this sets when the incremented word wrapped to zero (spec
/// §4.5).
fn min_and_skip(m: &mut Machine, ea: u16) -> Result<(), Exception> {
    let phys = m.translate(ea, true, false)?;
    let value = m.mem.read_word(phys).wrapping_add(1);
    m.mem.write_word(phys, value, crate::memory::ByteSelect::Whole);
    let level = m.level();
    let mut sts = m.regs.sts(level);
    sts.set_zero(value == 0);
    m.regs.set_sts(level, sts);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ea::Mode;
    use crate::machine::RunState;
    use crate::memory::ByteSelect;

    fn running(m: &mut Machine) {
        m.run_state = RunState::Running;
        for i in 0..64 {
            m.page.setpt(i, crate::page::Pte::new(i as u16, true, false, i as u8));
        }
    }

    #[test]
    fn lda_loads_a_from_memory() {
        let mut m = Machine::new();
        running(&mut m);
        m.mem.write_word(50, 0x1234, ByteSelect::Whole);
        m.regs.set_pc(0, 50);
        let instr = Instr::Mrf {
            op: MrfOp::Lda,
            mode: Mode::PRelative,
            indirect: false,
            displacement: 0,
        };
        exec(&mut m, instr).unwrap();
        assert_eq!(m.regs.read(0, reg_idx::A), 0x1234);
        assert_eq!(m.regs.pc(0), 51);
    }

    #[test]
    fn add_sets_carry_on_unsigned_wrap() {
        let mut m = Machine::new();
        running(&mut m);
        m.mem.write_word(10, 1, ByteSelect::Whole);
        m.regs.write(0, reg_idx::A, 0xffff);
        let instr = Instr::Mrf {
            op: MrfOp::Add,
            mode: Mode::PRelative,
            indirect: false,
            displacement: 10,
        };
        exec(&mut m, instr).unwrap();
        assert_eq!(m.regs.read(0, reg_idx::A), 0);
        assert!(m.regs.sts(0).carry());
    }

    #[test]
    fn min_sets_zero_flag_on_wrap() {
        let mut m = Machine::new();
        running(&mut m);
        m.mem.write_word(20, 0xffff, ByteSelect::Whole);
        let instr = Instr::Mrf {
            op: MrfOp::Min,
            mode: Mode::PRelative,
            indirect: false,
            displacement: 20,
        };
        exec(&mut m, instr).unwrap();
        assert_eq!(m.mem.read_word(20), 0);
        assert!(m.regs.sts(0).zero());
    }
}
