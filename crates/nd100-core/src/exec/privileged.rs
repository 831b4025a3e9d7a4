//! Privileged operations (spec §4.6).

use super::advance_pc;
use crate::decode::PrivOp;
use crate::error::Exception;
use crate::interrupt::IdentEntry;
use crate::machine::Machine;
use crate::page::Pte;
use crate::primitives::reg_idx;

/// `TRA`/`TRR` register designator mapping (operand's low 4 bits), per
/// spec §4.6 "a named global control register designated by r's low bits".
fn control_reg(index: u8, m: &mut Machine, write: Option<u16>) -> u16 {
    macro_rules! field {
        ($f:expr) => {{
            if let Some(v) = write {
                $f = v;
            }
            $f
        }};
    }
    match index & 0x0f {
        0 => {
            if let Some(v) = write {
                m.intr.pid = v;
            }
            m.intr.pid
        }
        1 => {
            if let Some(v) = write {
                m.intr.pie = v;
            }
            m.intr.pie
        }
        2 => field!(m.ctl.pvl),
        3 => field!(m.ctl.actl),
        4 => field!(m.ctl.csr),
        5 => field!(m.ctl.iic),
        6 => field!(m.ctl.iie),
        7 => {
            if let Some(v) = write {
                m.page.set_pgs(v as u8);
            }
            m.page.pgs() as u16
        }
        8 => field!(m.ctl.pes),
        9 => field!(m.ctl.pgc),
        10 => field!(m.ctl.pea),
        11 => field!(m.ctl.eccr),
        12 => field!(m.ctl.lcil),
        13 => field!(m.ctl.ucil),
        14 => field!(m.ctl.ald),
        _ => field!(m.ctl.opr),
    }
}

pub fn exec(m: &mut Machine, op: PrivOp, operand: u8) -> Result<(), Exception> {
    let level = m.level();
    let pc = m.regs.pc(level);
    if !m.page.pte_for(pc, false).privileged() {
        return Err(Exception::PrivilegedInUser(m.ctl.ir));
    }

    match op {
        PrivOp::Setpt => {
            let level = m.level();
            let index = m.regs.read(level, reg_idx::X) as usize % 256;
            let hi = m.regs.read(level, reg_idx::D) as u32;
            let lo = m.regs.read(level, reg_idx::A) as u32;
            m.page.setpt(index, Pte::from_raw((hi << 16) | lo));
        }
        PrivOp::Clept => {
            let level = m.level();
            let index = m.regs.read(level, reg_idx::X) as usize % 256;
            m.page.clept(index);
        }
        PrivOp::Tra => {
            let value = control_reg(operand, m, None);
            let level = m.level();
            m.regs.write(level, reg_idx::A, value);
        }
        PrivOp::Trr => {
            let level = m.level();
            let value = m.regs.read(level, reg_idx::A);
            control_reg(operand, m, Some(value));
        }
        PrivOp::Mcl => {
            m.master_clear();
            return Ok(());
        }
        PrivOp::Mst => {
            let level = m.level();
            let mut sts = m.regs.sts(level);
            sts.0 = (sts.0 & !0x7f) | (operand as u16 & 0x7f);
            m.regs.set_sts(level, sts);
        }
        PrivOp::Wait => {
            let level = m.level();
            m.intr.clear_level(level);
        }
        PrivOp::Mon => {
            advance_pc(m, 1);
            return Err(Exception::MonUnhandled(operand));
        }
        PrivOp::Exr => {
            if m.exr_active {
                return Err(Exception::NestedExr);
            }
            let level = m.level();
            let reg = (operand as usize) % 8;
            let target = m.regs.read(level, reg);
            let word = {
                let phys = m.translate(target, false, false)?;
                m.mem.read_word(phys)
            };
            advance_pc(m, 1);
            m.exr_active = true;
            let result = m.execute_word(word);
            m.exr_active = false;
            return result;
        }
        PrivOp::Ident => {
            let level_arg = operand & 0x0f;
            let level = m.level();
            match m.intr.pop_ident(level_arg) {
                Some(IdentEntry { identcode, .. }) => {
                    m.regs.write(level, reg_idx::A, identcode);
                }
                None => {
                    m.regs.write(level, reg_idx::A, 0);
                    advance_pc(m, 1);
                    return Err(Exception::NoIdent(level_arg));
                }
            }
        }
    }
    advance_pc(m, 1);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interrupt::IdentEntry;

    /// A fresh `Machine` with PC 0's page marked privileged, so the ring
    /// check at the top of `exec` doesn't get in the way of tests that are
    /// about something else.
    fn privileged_machine() -> Machine {
        let mut m = Machine::new();
        m.page.setpt(0, Pte::new(0, true, true, 0));
        m
    }

    #[test]
    fn tra_trr_round_trip_through_pid() {
        let mut m = privileged_machine();
        m.intr.pid = 0x1234;
        exec(&mut m, PrivOp::Tra, 0).unwrap();
        assert_eq!(m.regs.read(0, reg_idx::A), 0x1234);
        m.regs.write(0, reg_idx::A, 0x4321);
        exec(&mut m, PrivOp::Trr, 0).unwrap();
        assert_eq!(m.intr.pid, 0x4321);
    }

    #[test]
    fn ident_pops_the_queued_entry() {
        let mut m = privileged_machine();
        m.intr.enqueue_ident(IdentEntry {
            level: 11,
            identcode: 0o21,
            caller_id: 201,
        });
        exec(&mut m, PrivOp::Ident, 11).unwrap();
        assert_eq!(m.regs.read(0, reg_idx::A), 0o21);
    }

    #[test]
    fn ident_on_empty_chain_is_an_exception() {
        let mut m = privileged_machine();
        let err = exec(&mut m, PrivOp::Ident, 3).unwrap_err();
        assert_eq!(err, Exception::NoIdent(3));
        assert_eq!(m.regs.read(0, reg_idx::A), 0);
    }

    #[test]
    fn nested_exr_is_rejected() {
        let mut m = privileged_machine();
        m.exr_active = true;
        let err = exec(&mut m, PrivOp::Exr, 0).unwrap_err();
        assert_eq!(err, Exception::NestedExr);
    }

    #[test]
    fn privileged_op_from_unprivileged_page_is_rejected() {
        let mut m = Machine::new();
        let err = exec(&mut m, PrivOp::Mcl, 0).unwrap_err();
        assert_eq!(err, Exception::PrivilegedInUser(0));
    }
}
