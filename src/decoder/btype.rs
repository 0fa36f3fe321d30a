use crate::arch::b_op;
use crate::bits::value_of;
use crate::instruction::Instruction;
use super::{concat, funct3, rs1, rs2};

pub(super) fn decode(bits: &[bool]) -> Option<Instruction> {
    let cond = b_op(funct3(bits))?;
    // B-imm: [12|10:5|4:1|11], bit 0 always clear
    let imm = concat(&[&[false], &bits[8..=11], &bits[25..=30], &bits[7..=7], &bits[31..=31]]);
    Some(Instruction::BType {
        rs1: rs1(bits),
        rs2: rs2(bits),
        imm: value_of(&imm, true) as i32,
        cond,
    })
}
