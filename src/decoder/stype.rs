use crate::arch::FUNCT3_WORD;
use crate::bits::value_of;
use crate::instruction::Instruction;
use super::{concat, funct3, rs1, rs2};

pub(super) fn decode(bits: &[bool]) -> Option<Instruction> {
    if funct3(bits) != FUNCT3_WORD { return None; }
    // low 5 bits sit in the rd slot, high 7 in the funct7 slot
    let imm = value_of(&concat(&[&bits[7..=11], &bits[25..=31]]), true) as i32;
    Some(Instruction::SType { rs1: rs1(bits), rs2: rs2(bits), imm })
}
