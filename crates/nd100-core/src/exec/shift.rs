//! Shift family (spec §4.5): single (A) or double (AD pair) register
//! shifts, 5-bit signed count (left positive, right negative), with the
//! last bit shifted out landing in STS.M.

use super::advance_pc;
use crate::decode::ShiftKind;
use crate::error::Exception;
use crate::machine::Machine;
use crate::primitives::reg_idx;

fn mask(width: u32) -> u32 {
    if width == 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

fn shift_value(value: &mut u32, width: u32, kind: ShiftKind, count: i8, link: &mut bool) {
    let sign_bit = 1u32 << (width - 1);
    let amount = count.unsigned_abs() as u32;
    if count >= 0 {
        for _ in 0..amount {
            let out = *value & sign_bit != 0;
            let incoming = if kind == ShiftKind::Rotate { *link as u32 } else { 0 };
            *value = ((*value << 1) | incoming) & mask(width);
            *link = out;
        }
    } else {
        for _ in 0..amount {
            let out = *value & 1 != 0;
            let fill = match kind {
                ShiftKind::Arithmetic => *value & sign_bit != 0,
                ShiftKind::Logical => false,
                ShiftKind::Rotate => *link,
            };
            *value = (*value >> 1) | if fill { sign_bit } else { 0 };
            *link = out;
        }
    }
}

pub fn exec(m: &mut Machine, kind: ShiftKind, pair: bool, count: i8) -> Result<(), Exception> {
    let level = m.level();
    let mut link = m.regs.sts(level).multi_shift_link();

    if pair {
        let hi = m.regs.read(level, reg_idx::A) as u32;
        let lo = m.regs.read(level, reg_idx::D) as u32;
        let mut value = (hi << 16) | lo;
        shift_value(&mut value, 32, kind, count, &mut link);
        m.regs.write(level, reg_idx::A, (value >> 16) as u16);
        m.regs.write(level, reg_idx::D, (value & 0xffff) as u16);
    } else {
        let mut value = m.regs.read(level, reg_idx::A) as u32;
        shift_value(&mut value, 16, kind, count, &mut link);
        m.regs.write(level, reg_idx::A, value as u16);
    }

    let mut sts = m.regs.sts(level);
    sts.set_multi_shift_link(link);
    m.regs.set_sts(level, sts);
    advance_pc(m, 1);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::RunState;

    #[test]
    fn logical_left_shift_fills_zero_and_sets_link() {
        let mut m = Machine::new();
        m.run_state = RunState::Running;
        m.regs.write(0, reg_idx::A, 0x8001);
        exec(&mut m, ShiftKind::Logical, false, 1).unwrap();
        assert_eq!(m.regs.read(0, reg_idx::A), 0x0002);
        assert!(m.regs.sts(0).multi_shift_link());
    }

    #[test]
    fn arithmetic_right_shift_sign_extends() {
        let mut m = Machine::new();
        m.run_state = RunState::Running;
        m.regs.write(0, reg_idx::A, 0x8000);
        exec(&mut m, ShiftKind::Arithmetic, false, -1).unwrap();
        assert_eq!(m.regs.read(0, reg_idx::A), 0xc000);
    }

    #[test]
    fn rotate_moves_through_the_link() {
        let mut m = Machine::new();
        m.run_state = RunState::Running;
        m.regs.write(0, reg_idx::A, 0x0001);
        exec(&mut m, ShiftKind::Rotate, false, -1).unwrap();
        assert_eq!(m.regs.read(0, reg_idx::A), 0x0000);
        assert!(m.regs.sts(0).multi_shift_link());
        exec(&mut m, ShiftKind::Rotate, false, -1).unwrap();
        assert_eq!(m.regs.read(0, reg_idx::A), 0x8000, "link bit rotated back in");
    }

    #[test]
    fn pair_shift_crosses_the_ad_boundary() {
        let mut m = Machine::new();
        m.run_state = RunState::Running;
        m.regs.write(0, reg_idx::A, 0x0000);
        m.regs.write(0, reg_idx::D, 0x8000);
        exec(&mut m, ShiftKind::Logical, true, 1).unwrap();
        assert_eq!(m.regs.read(0, reg_idx::A), 0x0001);
        assert_eq!(m.regs.read(0, reg_idx::D), 0x0000);
    }
}
