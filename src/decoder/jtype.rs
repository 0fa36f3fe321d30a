use crate::bits::value_of;
use crate::instruction::Instruction;
use super::{concat, rd};

pub(super) fn decode_jal(bits: &[bool]) -> Instruction {
    // J-imm: [20|10:1|11|19:12], bit 0 always clear
    let imm = concat(&[&[false], &bits[21..=30], &bits[20..=20], &bits[12..=19], &bits[31..=31]]);
    Instruction::JType { rd: rd(bits), imm: value_of(&imm, true) as i32 }
}
