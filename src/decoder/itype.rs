use crate::arch::{i_op, FUNCT3_WORD, FUNCT7_ALT};
use crate::bits::{field, value_of};
use crate::instruction::{AluOp, Instruction};
use super::{funct3, funct7, rd, rs1};

fn imm12(bits: &[bool]) -> i32 {
    value_of(&bits[20..=31], true) as i32
}

pub(super) fn decode_opimm(bits: &[bool]) -> Option<Instruction> {
    let (rd, rs1) = (rd(bits), rs1(bits));
    let op = i_op(funct3(bits))?;
    Some(match op {
        AluOp::Sll | AluOp::Srl => {
            let shamt = field(bits, 20, 24) as i32;
            let op = match (op, funct7(bits)) {
                (AluOp::Sll, 0) => AluOp::Sll,
                (AluOp::Srl, 0) => AluOp::Srl,
                (AluOp::Srl, FUNCT7_ALT) => AluOp::Sra,
                _ => return None,
            };
            Instruction::IType { rd, rs1, imm: shamt, op }
        }
        _ => Instruction::IType { rd, rs1, imm: imm12(bits), op },
    })
}

pub(super) fn decode_load(bits: &[bool]) -> Option<Instruction> {
    if funct3(bits) != FUNCT3_WORD { return None; }
    Some(Instruction::Load { rd: rd(bits), rs1: rs1(bits), imm: imm12(bits) })
}

pub(super) fn decode_jalr(bits: &[bool]) -> Option<Instruction> {
    if funct3(bits) != 0 { return None; }
    Some(Instruction::JalrType { rd: rd(bits), rs1: rs1(bits), imm: imm12(bits) })
}

pub(super) fn decode_lui(bits: &[bool]) -> Instruction {
    Instruction::UType { rd: rd(bits), imm: field(bits, 12, 31) }
}
