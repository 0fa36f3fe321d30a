mod btype;
mod itype;
mod jtype;
mod mtype;
mod rtype;
mod stype;

use crate::arch::{Opcode, HALT_WORD};
use crate::bits::{field, word_bits, Bits};
use crate::errors::DecodeError;
use crate::instruction::Instruction;

#[inline] fn rd(bits: &[bool]) -> u8 { field(bits, 7, 11) as u8 }
#[inline] fn funct3(bits: &[bool]) -> u32 { field(bits, 12, 14) }
#[inline] fn rs1(bits: &[bool]) -> u8 { field(bits, 15, 19) as u8 }
#[inline] fn rs2(bits: &[bool]) -> u8 { field(bits, 20, 24) as u8 }
#[inline] fn funct7(bits: &[bool]) -> u32 { field(bits, 25, 31) }

/// Joins bit slices, first slice lowest.
fn concat(parts: &[&[bool]]) -> Bits {
    parts.iter().flat_map(|p| p.iter().copied()).collect()
}

pub fn decode(word: u32) -> Result<Instruction, DecodeError> {
    if word == HALT_WORD {
        return Ok(Instruction::Halt);
    }
    let bits = word_bits(word);
    let opcode = field(&bits, 0, 6) as u8;
    let opcode = Opcode::try_from(opcode)
        .map_err(|_| DecodeError::UnknownOpcode { word, opcode })?;
    let malformed = |reason| DecodeError::MalformedInstruction { word, reason };

    match opcode {
        Opcode::RType     => rtype::decode(&bits).ok_or_else(|| malformed("invalid R-type funct")),
        Opcode::OpImm     => itype::decode_opimm(&bits).ok_or_else(|| malformed("invalid OP-IMM funct")),
        Opcode::Load      => itype::decode_load(&bits).ok_or_else(|| malformed("only word loads exist")),
        Opcode::Jalr      => itype::decode_jalr(&bits).ok_or_else(|| malformed("JALR with funct3 != 0")),
        Opcode::Store     => stype::decode(&bits).ok_or_else(|| malformed("only word stores exist")),
        Opcode::Branch    => btype::decode(&bits).ok_or_else(|| malformed("invalid branch condition")),
        Opcode::Lui       => Ok(itype::decode_lui(&bits)),
        Opcode::Jal       => Ok(jtype::decode_jal(&bits)),
        Opcode::Gemm      => mtype::decode_gemm(&bits).ok_or_else(|| malformed("GEMM reserved bits set")),
        Opcode::LoadTile  => Ok(mtype::decode_mem(&bits, true)),
        Opcode::StoreTile => Ok(mtype::decode_mem(&bits, false)),
        Opcode::Halt      => Err(malformed("halt opcode outside the all-ones sentinel")),
    }
}
