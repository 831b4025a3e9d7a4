//! Bit operations (spec §4.5/§4.6): SETB/CLRB/SKPB against a named status
//! bit. K/Z/Q/O/C/M live in STS; SSPTM/SSTM/TG are cache/paging control
//! bits folded into CSR; PIL0..PIL3 select the low four bits of PIE (the
//! enable mask for the lowest four priority levels).

use super::advance_pc;
use crate::decode::{BopsOp, StsBit};
use crate::error::Exception;
use crate::machine::Machine;
use crate::reg::sts;

enum Target {
    Sts(u16),
    Csr(u16),
    Pie(u16),
}

fn target_for(bit: StsBit) -> Target {
    match bit {
        StsBit::K => Target::Sts(sts::K),
        StsBit::Z => Target::Sts(sts::Z),
        StsBit::Q => Target::Sts(sts::Q),
        StsBit::O => Target::Sts(sts::O),
        StsBit::C => Target::Sts(sts::C),
        StsBit::M => Target::Sts(sts::M),
        StsBit::Ssptm => Target::Csr(1 << 0),
        StsBit::Sstm => Target::Csr(1 << 1),
        StsBit::Tg => Target::Csr(1 << 2),
        StsBit::Pil0 => Target::Pie(1 << 0),
        StsBit::Pil1 => Target::Pie(1 << 1),
        StsBit::Pil2 => Target::Pie(1 << 2),
        StsBit::Pil3 => Target::Pie(1 << 3),
    }
}

fn read(m: &Machine, bit: StsBit) -> bool {
    match target_for(bit) {
        Target::Sts(mask) => m.regs.sts(m.level()).0 & mask != 0,
        Target::Csr(mask) => m.ctl.csr & mask != 0,
        Target::Pie(mask) => m.intr.pie & mask != 0,
    }
}

fn write(m: &mut Machine, bit: StsBit, value: bool) {
    match target_for(bit) {
        Target::Sts(mask) => {
            let level = m.level();
            let mut s = m.regs.sts(level);
            if value {
                s.0 |= mask;
            } else {
                s.0 &= !mask;
            }
            m.regs.set_sts(level, s);
        }
        Target::Csr(mask) => {
            if value {
                m.ctl.csr |= mask;
            } else {
                m.ctl.csr &= !mask;
            }
        }
        Target::Pie(mask) => {
            if value {
                m.intr.pie |= mask;
            } else {
                m.intr.pie &= !mask;
            }
        }
    }
}

pub fn exec(m: &mut Machine, op: BopsOp, bit: StsBit) -> Result<(), Exception> {
    match op {
        BopsOp::Setb => {
            write(m, bit, true);
            advance_pc(m, 1);
        }
        BopsOp::Clrb => {
            write(m, bit, false);
            advance_pc(m, 1);
        }
        BopsOp::Skpb => {
            advance_pc(m, if read(m, bit) { 2 } else { 1 });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setb_then_skpb_skips() {
        let mut m = Machine::new();
        exec(&mut m, BopsOp::Setb, StsBit::Z).unwrap();
        assert!(m.regs.sts(0).zero());
        exec(&mut m, BopsOp::Skpb, StsBit::Z).unwrap();
        assert_eq!(m.regs.pc(0), 2);
    }

    #[test]
    fn pil_bits_touch_pie_not_sts() {
        let mut m = Machine::new();
        exec(&mut m, BopsOp::Setb, StsBit::Pil2).unwrap();
        assert_eq!(m.intr.pie & 0b0100, 0b0100);
        assert_eq!(m.regs.sts(0).0 & 0b0100, 0);
    }
}
