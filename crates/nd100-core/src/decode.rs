//! Instruction decode (spec §4.4).
//!
//! The top two bits select between the three memory-reference opcode
//! groups (arithmetic, load, store — each a 3-bit opcode plus I/B/X bits
//! and an 8-bit displacement, matching the field widths spec §4.4 names)
//! and a fourth "extended" group that a further 3-bit family tag fans out
//! into register ops, shifts, skips, bit ops, compare-and-jump, IO,
//! privileged ops and byte ops. Compare-and-jump and byte-op displacements
//! are narrower (7 bits) than the memory-reference ones to make room for
//! their own op fields; see DESIGN.md.

use crate::ea::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MrfOp {
    Add,
    Sub,
    And,
    Ora,
    Min,
    Lda,
    Ldt,
    Ldx,
    Ldd,
    Ldf,
    Sta,
    Stt,
    Stx,
    Stz,
    Std,
    Stf,
    /// Stores through the alternate page table (spec §4.2, §4.4).
    Statx,
    Fad,
    Fsb,
    Fmu,
    Fdv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegOp {
    Move,
    Clear,
    Incr,
    Decr,
    Compl,
    Neg,
    Swap,
    Nop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftKind {
    Arithmetic,
    Logical,
    Rotate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipCond {
    Eql,
    Geq,
    Gre,
    Mgre,
    Ueq,
    Lss,
    Lsse,
    Mlss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BopsOp {
    Setb,
    Clrb,
    Skpb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StsBit {
    Ssptm,
    Sstm,
    Tg,
    K,
    Z,
    Q,
    O,
    C,
    M,
    Pil0,
    Pil1,
    Pil2,
    Pil3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpJumpCond {
    Jap,
    Jan,
    Jaz,
    Jaf,
    Jpc,
    Jnc,
    Jxz,
    Jxn,
    Jpl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivOp {
    Setpt,
    Clept,
    Tra,
    Trr,
    Mcl,
    Mst,
    Wait,
    Mon,
    Exr,
    Ident,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOp {
    Lbyt,
    Sbyt,
    Movb,
    Movbf,
    Bfill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    Mrf {
        op: MrfOp,
        mode: Mode,
        indirect: bool,
        displacement: i8,
    },
    RegOp {
        op: RegOp,
        dst: usize,
        src: usize,
    },
    Shift {
        kind: ShiftKind,
        pair: bool,
        count: i8,
    },
    Skip {
        cond: SkipCond,
        reg_a: usize,
        reg_b: usize,
    },
    Bops {
        op: BopsOp,
        bit: StsBit,
    },
    CmpJump {
        cond: CmpJumpCond,
        displacement: i8,
    },
    Io {
        use_t: bool,
        addr: u16,
    },
    Privileged {
        op: PrivOp,
        operand: u8,
    },
    ByteOp {
        op: ByteOp,
        use_x: bool,
        displacement: i8,
    },
}

fn sign_extend(value: u16, bits: u32) -> i8 {
    let shift = 16 - bits;
    (((value << shift) as i16) >> shift) as i8
}

const STS_BITS: [StsBit; 13] = [
    StsBit::Ssptm,
    StsBit::Sstm,
    StsBit::Tg,
    StsBit::K,
    StsBit::Z,
    StsBit::Q,
    StsBit::O,
    StsBit::C,
    StsBit::M,
    StsBit::Pil0,
    StsBit::Pil1,
    StsBit::Pil2,
    StsBit::Pil3,
];

/// Decode a 16-bit instruction word. Returns `None` for a reserved or
/// unassigned bit pattern, which the caller turns into
/// `Exception::IllegalInstruction`.
pub fn decode(word: u16) -> Option<Instr> {
    let group = (word >> 14) & 0b11;
    if group <= 2 {
        return decode_mrf(group, word);
    }
    let family = (word >> 11) & 0b111;
    match family {
        0 => decode_regop(word),
        1 => decode_shift(word),
        2 => decode_skip(word),
        3 => decode_bops(word),
        4 => decode_cmpjump(word),
        5 => decode_io(word),
        6 => decode_privileged(word),
        7 => decode_byteop(word),
        _ => unreachable!("family is a 3-bit field"),
    }
}

fn decode_mrf(group: u16, word: u16) -> Option<Instr> {
    let opcode = (word >> 11) & 0b111;
    let op = match (group, opcode) {
        (0, 0) => MrfOp::Add,
        (0, 1) => MrfOp::Sub,
        (0, 2) => MrfOp::And,
        (0, 3) => MrfOp::Ora,
        (0, 4) => MrfOp::Min,
        (0, 5) => MrfOp::Fad,
        (0, 6) => MrfOp::Fsb,
        (0, 7) => MrfOp::Fmu,
        (1, 0) => MrfOp::Lda,
        (1, 1) => MrfOp::Ldt,
        (1, 2) => MrfOp::Ldx,
        (1, 3) => MrfOp::Ldd,
        (1, 4) => MrfOp::Ldf,
        (1, 5) => MrfOp::Fdv,
        (2, 0) => MrfOp::Sta,
        (2, 1) => MrfOp::Stt,
        (2, 2) => MrfOp::Stx,
        (2, 3) => MrfOp::Stz,
        (2, 4) => MrfOp::Std,
        (2, 5) => MrfOp::Stf,
        (2, 6) => MrfOp::Statx,
        _ => return None,
    };
    let indirect = (word >> 10) & 1 != 0;
    let b_bit = (word >> 9) & 1 != 0;
    let x_bit = (word >> 8) & 1 != 0;
    let displacement = (word & 0xff) as i8;
    Some(Instr::Mrf {
        op,
        mode: Mode::from_bits(b_bit, x_bit),
        indirect,
        displacement,
    })
}

fn decode_regop(word: u16) -> Option<Instr> {
    let op = match (word >> 8) & 0b111 {
        0 => RegOp::Move,
        1 => RegOp::Clear,
        2 => RegOp::Incr,
        3 => RegOp::Decr,
        4 => RegOp::Compl,
        5 => RegOp::Neg,
        6 => RegOp::Swap,
        7 => RegOp::Nop,
        _ => unreachable!(),
    };
    let dst = ((word >> 5) & 0b111) as usize;
    let src = ((word >> 2) & 0b111) as usize;
    Some(Instr::RegOp { op, dst, src })
}

fn decode_shift(word: u16) -> Option<Instr> {
    let kind = match (word >> 9) & 0b11 {
        0 => ShiftKind::Arithmetic,
        1 => ShiftKind::Logical,
        2 => ShiftKind::Rotate,
        _ => return None,
    };
    let pair = (word >> 8) & 1 != 0;
    let count = sign_extend(word & 0x1f, 5);
    Some(Instr::Shift { kind, pair, count })
}

fn decode_skip(word: u16) -> Option<Instr> {
    let cond = match (word >> 8) & 0b111 {
        0 => SkipCond::Eql,
        1 => SkipCond::Geq,
        2 => SkipCond::Gre,
        3 => SkipCond::Mgre,
        4 => SkipCond::Ueq,
        5 => SkipCond::Lss,
        6 => SkipCond::Lsse,
        7 => SkipCond::Mlss,
        _ => unreachable!(),
    };
    let reg_a = ((word >> 5) & 0b111) as usize;
    let reg_b = ((word >> 2) & 0b111) as usize;
    Some(Instr::Skip { cond, reg_a, reg_b })
}

fn decode_bops(word: u16) -> Option<Instr> {
    let op = match (word >> 8) & 0b111 {
        0 => BopsOp::Setb,
        1 => BopsOp::Clrb,
        2 => BopsOp::Skpb,
        _ => return None,
    };
    let idx = ((word >> 4) & 0b1111) as usize;
    let bit = *STS_BITS.get(idx)?;
    Some(Instr::Bops { op, bit })
}

fn decode_cmpjump(word: u16) -> Option<Instr> {
    let cond = match (word >> 7) & 0b1111 {
        0 => CmpJumpCond::Jap,
        1 => CmpJumpCond::Jan,
        2 => CmpJumpCond::Jaz,
        3 => CmpJumpCond::Jaf,
        4 => CmpJumpCond::Jpc,
        5 => CmpJumpCond::Jnc,
        6 => CmpJumpCond::Jxz,
        7 => CmpJumpCond::Jxn,
        8 => CmpJumpCond::Jpl,
        _ => return None,
    };
    let displacement = sign_extend(word & 0x7f, 7);
    Some(Instr::CmpJump { cond, displacement })
}

fn decode_io(word: u16) -> Option<Instr> {
    let use_t = (word >> 10) & 1 != 0;
    let addr = word & 0x3ff;
    Some(Instr::Io { use_t, addr })
}

fn decode_privileged(word: u16) -> Option<Instr> {
    let op = match (word >> 7) & 0b1111 {
        0 => PrivOp::Setpt,
        1 => PrivOp::Clept,
        2 => PrivOp::Tra,
        3 => PrivOp::Trr,
        4 => PrivOp::Mcl,
        5 => PrivOp::Mst,
        6 => PrivOp::Wait,
        7 => PrivOp::Mon,
        8 => PrivOp::Exr,
        9 => PrivOp::Ident,
        _ => return None,
    };
    let operand = (word & 0x7f) as u8;
    Some(Instr::Privileged { op, operand })
}

fn decode_byteop(word: u16) -> Option<Instr> {
    let op = match (word >> 8) & 0b111 {
        0 => ByteOp::Lbyt,
        1 => ByteOp::Sbyt,
        2 => ByteOp::Movb,
        3 => ByteOp::Movbf,
        4 => ByteOp::Bfill,
        _ => return None,
    };
    let use_x = (word >> 7) & 1 != 0;
    let displacement = sign_extend(word & 0x7f, 7);
    Some(Instr::ByteOp {
        op,
        use_x,
        displacement,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_add_with_displacement() {
        let word = 0b00_000_0_0_0_00000101u16;
        match decode(word) {
            Some(Instr::Mrf {
                op: MrfOp::Add,
                displacement: 5,
                indirect: false,
                mode: Mode::PRelative,
            }) => {}
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn decodes_statx_as_store_group_opcode_six() {
        let word = (0b10u16 << 14) | (6u16 << 11);
        assert_eq!(
            decode(word),
            Some(Instr::Mrf {
                op: MrfOp::Statx,
                mode: Mode::PRelative,
                indirect: false,
                displacement: 0,
            })
        );
    }

    #[test]
    fn decodes_ident_privileged_op() {
        let word = (0b11u16 << 14) | (6u16 << 11) | (9u16 << 7) | 0b1011;
        assert_eq!(
            decode(word),
            Some(Instr::Privileged {
                op: PrivOp::Ident,
                operand: 0b1011,
            })
        );
    }

    #[test]
    fn reserved_bops_index_is_illegal() {
        let word = (0b11u16 << 14) | (3u16 << 11) | (0u16 << 8) | (15u16 << 4);
        assert_eq!(decode(word), None);
    }
}
