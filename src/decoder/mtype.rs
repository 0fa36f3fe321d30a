use crate::bits::{field, value_of};
use crate::instruction::Instruction;

pub(super) fn decode_gemm(bits: &[bool]) -> Option<Instruction> {
    if bits[7..=15].iter().any(|&b| b) {
        return None;
    }
    Some(Instruction::MatrixAlu {
        rd: field(bits, 28, 31) as u8,
        ra: field(bits, 24, 27) as u8,
        rb: field(bits, 20, 23) as u8,
        rc: field(bits, 16, 19) as u8,
    })
}

pub(super) fn decode_mem(bits: &[bool], is_load: bool) -> Instruction {
    Instruction::MatrixMem {
        rd: field(bits, 28, 31) as u8,
        rs1: field(bits, 23, 27) as u8,
        stride: field(bits, 18, 22) as u8,
        imm: value_of(&bits[7..=17], true) as i32,
        is_load,
    }
}
