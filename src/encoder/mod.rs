use crate::arch::*;
use crate::bits::fits_signed;
use crate::errors::EncodeError;
use crate::instruction::{AluOp, Instruction};

#[inline] fn r(f7:u32, rs2:u32, rs1:u32, f3:u32, rd:u32, opc:u32) -> u32 {
    (f7<<25) | (rs2<<20) | (rs1<<15) | (f3<<12) | (rd<<7) | opc
}
#[inline] fn i(imm12:i32, rs1:u32, f3:u32, rd:u32, opc:u32) -> u32 {
    let imm = (imm12 as u32) & 0xFFF;
    (imm<<20) | (rs1<<15) | (f3<<12) | (rd<<7) | opc
}
#[inline] fn s(imm12:i32, rs2:u32, rs1:u32, f3:u32, opc:u32) -> u32 {
    let imm = (imm12 as u32) & 0xFFF;
    let imm_lo = imm & 0x1F;
    let imm_hi = (imm >> 5) & 0x7F;
    (imm_hi<<25) | (rs2<<20) | (rs1<<15) | (f3<<12) | (imm_lo<<7) | opc
}
#[inline] fn b(imm_bytes:i32, rs2:u32, rs1:u32, f3:u32, opc:u32) -> u32 {
    let imm = imm_bytes as u32;
    let b12  = ((imm >> 12) & 1) << 31;
    let b10_5= ((imm >> 5)  & 0x3F) << 25;
    let b4_1 = ((imm >> 1)  & 0xF)  << 8;
    let b11  = ((imm >> 11) & 1)    << 7;
    b12 | b10_5 | (rs2<<20) | (rs1<<15) | (f3<<12) | b4_1 | b11 | opc
}
#[inline] fn u(imm20:u32, rd:u32, opc:u32) -> u32 {
    ((imm20 & 0xFFFFF) << 12) | (rd<<7) | opc
}
#[inline] fn j(imm_bytes:i32, rd:u32, opc:u32) -> u32 {
    let imm = imm_bytes as u32;
    let b20   = ((imm >> 20) & 1) << 31;
    let b10_1 = ((imm >> 1)  & 0x3FF) << 21;
    let b11   = ((imm >> 11) & 1) << 20;
    let b19_12= ((imm >> 12) & 0xFF) << 12;
    b20 | b10_1 | b11 | b19_12 | (rd<<7) | opc
}
// GEMM: | rd:4 | ra:4 | rb:4 | rc:4 | 0:9 | opcode:7 |
#[inline] fn m(rd:u32, ra:u32, rb:u32, rc:u32, opc:u32) -> u32 {
    (rd<<28) | (ra<<24) | (rb<<20) | (rc<<16) | opc
}
// LDM/STM: | rd:4 | rs1:5 | stride:5 | imm:11 | opcode:7 |
#[inline] fn mm(rd:u32, rs1:u32, stride:u32, imm11:i32, opc:u32) -> u32 {
    let imm = (imm11 as u32) & 0x7FF;
    (rd<<28) | (rs1<<23) | (stride<<18) | (imm<<7) | opc
}

fn x(index: u8) -> Result<u32, EncodeError> {
    reg(index, SCALAR_REGS)
}

fn mreg(index: u8) -> Result<u32, EncodeError> {
    reg(index, MATRIX_REGS)
}

fn reg(index: u8, limit: usize) -> Result<u32, EncodeError> {
    if (index as usize) < limit {
        Ok(index as u32)
    } else {
        Err(EncodeError::RegisterOutOfRange { index, limit: limit as u8 })
    }
}

fn signed(imm: i32, bits: u32) -> Result<i32, EncodeError> {
    if fits_signed(imm as i64, bits) {
        Ok(imm)
    } else {
        Err(EncodeError::ImmediateOutOfRange { imm: imm as i64, bits })
    }
}

// B/J offsets are byte offsets and must be even
fn offset(imm: i32, bits: u32) -> Result<i32, EncodeError> {
    if imm % 2 != 0 {
        return Err(EncodeError::MisalignedOffset { imm });
    }
    signed(imm, bits)
}

fn opc(op: Opcode) -> u32 {
    u8::from(op) as u32
}

pub fn encode(inst: Instruction) -> Result<u32, EncodeError> {
    use Instruction::*;
    Ok(match inst {
        RType{rd,rs1,rs2,op} => {
            let (f7, f3) = r_funct(op);
            r(f7, x(rs2)?, x(rs1)?, f3, x(rd)?, opc(Opcode::RType))
        }
        IType{rd,rs1,imm,op} => {
            let f3 = i_funct(op).ok_or(EncodeError::NoImmediateForm(op.into()))?;
            match op {
                AluOp::Sll | AluOp::Srl | AluOp::Sra => {
                    if !(0..32).contains(&imm) {
                        return Err(EncodeError::ImmediateOutOfRange { imm: imm as i64, bits: 5 });
                    }
                    let f7 = if op == AluOp::Sra { FUNCT7_ALT } else { 0 };
                    r(f7, imm as u32, x(rs1)?, f3, x(rd)?, opc(Opcode::OpImm))
                }
                _ => i(signed(imm, 12)?, x(rs1)?, f3, x(rd)?, opc(Opcode::OpImm)),
            }
        }
        Load{rd,rs1,imm} => i(signed(imm, 12)?, x(rs1)?, FUNCT3_WORD, x(rd)?, opc(Opcode::Load)),
        SType{rs1,rs2,imm} => s(signed(imm, 12)?, x(rs2)?, x(rs1)?, FUNCT3_WORD, opc(Opcode::Store)),
        BType{rs1,rs2,imm,cond} => b(offset(imm, 13)?, x(rs2)?, x(rs1)?, b_funct(cond), opc(Opcode::Branch)),
        UType{rd,imm} => {
            if imm > 0xFFFFF {
                return Err(EncodeError::ImmediateOutOfRange { imm: imm as i64, bits: 20 });
            }
            u(imm, x(rd)?, opc(Opcode::Lui))
        }
        JType{rd,imm} => j(offset(imm, 21)?, x(rd)?, opc(Opcode::Jal)),
        JalrType{rd,rs1,imm} => i(signed(imm, 12)?, x(rs1)?, 0x0, x(rd)?, opc(Opcode::Jalr)),
        MatrixAlu{rd,ra,rb,rc} => m(mreg(rd)?, mreg(ra)?, mreg(rb)?, mreg(rc)?, opc(Opcode::Gemm)),
        MatrixMem{rd,rs1,stride,imm,is_load} => {
            let op = if is_load { Opcode::LoadTile } else { Opcode::StoreTile };
            mm(mreg(rd)?, x(rs1)?, x(stride)?, signed(imm, 11)?, opc(op))
        }
        Halt => HALT_WORD,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::BranchOp;

    #[test]
    fn matches_reference_words() {
        let addi = op_imm(1, 0, 512, AluOp::Add);
        assert_eq!(encode(addi).unwrap(), 0x2000_0093);
        let lw = Instruction::Load { rd: 2, rs1: 1, imm: 0 };
        assert_eq!(encode(lw).unwrap(), 0x0000_a103);
        let sw = Instruction::SType { rs1: 1, rs2: 3, imm: 4 };
        assert_eq!(encode(sw).unwrap(), 0x0030_a223);
        let ldm = Instruction::MatrixMem { rd: 1, rs1: 1, stride: 0, imm: 8, is_load: true };
        assert_eq!(encode(ldm).unwrap(), 0x1080_0447);
        let gemm = Instruction::MatrixAlu { rd: 3, ra: 1, rb: 1, rc: 1 };
        assert_eq!(encode(gemm).unwrap(), 0x3111_0077);
        let stm = Instruction::MatrixMem { rd: 3, rs1: 1, stride: 0, imm: 40, is_load: false };
        assert_eq!(encode(stm).unwrap(), 0x3080_1457);
        assert_eq!(encode(Instruction::Halt).unwrap(), 0xFFFF_FFFF);
    }

    fn op_imm(rd: u8, rs1: u8, imm: i32, op: AluOp) -> Instruction {
        Instruction::IType { rd, rs1, imm, op }
    }

    #[test]
    fn rejects_out_of_range_fields() {
        assert!(matches!(
            encode(op_imm(1, 0, 2048, AluOp::Add)),
            Err(EncodeError::ImmediateOutOfRange { bits: 12, .. })
        ));
        assert!(matches!(
            encode(Instruction::BType { rs1: 0, rs2: 0, imm: 3, cond: BranchOp::Beq }),
            Err(EncodeError::MisalignedOffset { imm: 3 })
        ));
        assert!(matches!(
            encode(Instruction::RType { rd: 32, rs1: 0, rs2: 0, op: AluOp::Add }),
            Err(EncodeError::RegisterOutOfRange { index: 32, limit: 32 })
        ));
        assert!(matches!(
            encode(Instruction::MatrixAlu { rd: 16, ra: 0, rb: 0, rc: 0 }),
            Err(EncodeError::RegisterOutOfRange { index: 16, limit: 16 })
        ));
        assert!(matches!(
            encode(op_imm(1, 0, 1, AluOp::Sub)),
            Err(EncodeError::NoImmediateForm("sub"))
        ));
    }

    #[test]
    fn jump_offset_limits() {
        assert!(encode(Instruction::JType { rd: 1, imm: 1 << 20 }).is_err());
        assert!(encode(Instruction::JType { rd: 1, imm: -(1 << 20) }).is_ok());
        assert!(encode(Instruction::JType { rd: 1, imm: (1 << 20) - 2 }).is_ok());
    }

    #[test]
    fn shift_immediates_carry_funct7() {
        let srai = encode(op_imm(1, 2, 3, AluOp::Sra)).unwrap();
        assert_eq!(srai >> 25, 0x20);
        assert_eq!(srai >> 20 & 0x1F, 3);
        assert!(encode(op_imm(1, 2, 32, AluOp::Sll)).is_err());
    }
}
