use crate::arch::r_op;
use crate::instruction::Instruction;
use super::{funct3, funct7, rd, rs1, rs2};

pub(super) fn decode(bits: &[bool]) -> Option<Instruction> {
    let op = r_op(funct7(bits), funct3(bits))?;
    Some(Instruction::RType { rd: rd(bits), rs1: rs1(bits), rs2: rs2(bits), op })
}
