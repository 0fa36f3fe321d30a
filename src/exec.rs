use log::trace;

use crate::bits::{value_of, word_bits, Bits};
use crate::decoder::decode;
use crate::errors::SimError;
use crate::instruction::{AluOp, Instruction};
use crate::matrix::{Tile, ROW_BYTES, TILE_DIM};
use crate::memory::Bus;
use crate::registers::Cpu;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Running,
    Halted,
}

pub fn alu(op: AluOp, a: i32, b: i32) -> i32 {
    match op {
        AluOp::Add => a.wrapping_add(b),
        AluOp::Sub => a.wrapping_sub(b),
        AluOp::Xor => a ^ b,
        AluOp::Or => a | b,
        AluOp::And => a & b,
        AluOp::Sll => shift_left(a, b),
        AluOp::Srl => shift_right_logical(a, b),
        AluOp::Sra => a >> (b & 0x1F),
        AluOp::Slt => (a < b) as i32,
        AluOp::Sltu => ((a as u32) < (b as u32)) as i32,
        AluOp::Mul => a.wrapping_mul(b),
    }
}

fn shift_left(a: i32, b: i32) -> i32 {
    let n = (b & 0x1F) as usize;
    let bits = word_bits(a as u32);
    let shifted: Bits = std::iter::repeat_n(false, n)
        .chain(bits[..32 - n].iter().copied())
        .collect();
    value_of(&shifted, true) as i32
}

fn shift_right_logical(a: i32, b: i32) -> i32 {
    let n = (b & 0x1F) as usize;
    let bits = word_bits(a as u32);
    let shifted: Bits = bits[n..]
        .iter()
        .copied()
        .chain(std::iter::repeat_n(false, n))
        .collect();
    value_of(&shifted, true) as i32
}

/// `rs1 - rs2` without 32-bit wraparound, so the sign is the true ordering.
#[inline]
pub fn compare(a: i32, b: i32) -> i64 {
    a as i64 - b as i64
}

#[inline]
fn offset(base: u32, imm: i32) -> u32 {
    base.wrapping_add(imm as u32)
}

/// Address of row `row` of a tile at `base`; a zero pitch packs rows back to back.
fn row_addr(base: u32, pitch: u32, row: usize) -> u32 {
    let pitch = if pitch == 0 { ROW_BYTES } else { pitch };
    base.wrapping_add(pitch.wrapping_mul(row as u32))
}

pub fn load_tile<B: Bus>(mem: &B, base: u32, pitch: u32) -> Result<Tile, SimError> {
    let mut tile = Tile::default();
    for row in 0..TILE_DIM {
        let addr = row_addr(base, pitch, row);
        tile.set_row_word(row, 0, mem.load32(addr)?);
        tile.set_row_word(row, 1, mem.load32(addr.wrapping_add(4))?);
    }
    Ok(tile)
}

pub fn store_tile<B: Bus>(mem: &mut B, base: u32, pitch: u32, tile: &Tile) -> Result<(), SimError> {
    for row in 0..TILE_DIM {
        let addr = row_addr(base, pitch, row);
        mem.store32(addr, tile.row_word(row, 0))?;
        mem.store32(addr.wrapping_add(4), tile.row_word(row, 1))?;
    }
    Ok(())
}

/// Fetches, decodes, and executes one instruction at `cpu.pc`.
pub fn step<B: Bus>(cpu: &mut Cpu, mem: &mut B) -> Result<StepOutcome, SimError> {
    let pc = cpu.pc;
    let word = mem.load32(pc)?;
    let instr = decode(word).map_err(|source| SimError::Decode { pc, source })?;
    trace!("pc=0x{pc:08x} word=0x{word:08x} {instr:?}");
    let next = pc.wrapping_add(4);

    match instr {
        Instruction::RType { rd, rs1, rs2, op } => {
            let v = alu(op, cpu.read(rs1)?, cpu.read(rs2)?);
            cpu.write(rd, v)?;
        }
        Instruction::IType { rd, rs1, imm, op } => {
            let v = alu(op, cpu.read(rs1)?, imm);
            cpu.write(rd, v)?;
        }
        Instruction::UType { rd, imm } => cpu.write(rd, (imm << 12) as i32)?,
        Instruction::Load { rd, rs1, imm } => {
            let a = offset(cpu.read(rs1)? as u32, imm);
            cpu.write(rd, mem.load32(a)? as i32)?;
        }
        Instruction::SType { rs1, rs2, imm } => {
            let a = offset(cpu.read(rs1)? as u32, imm);
            mem.store32(a, cpu.read(rs2)? as u32)?;
        }
        Instruction::BType { rs1, rs2, imm, cond } => {
            if cond.taken(compare(cpu.read(rs1)?, cpu.read(rs2)?)) {
                cpu.pc = offset(pc, imm);
                return Ok(StepOutcome::Running);
            }
        }
        Instruction::JType { rd, imm } => {
            cpu.write(rd, next as i32)?;
            cpu.pc = offset(pc, imm);
            return Ok(StepOutcome::Running);
        }
        Instruction::JalrType { rd, rs1, imm } => {
            let target = offset(cpu.read(rs1)? as u32, imm);
            cpu.write(rd, next as i32)?;
            cpu.pc = target;
            return Ok(StepOutcome::Running);
        }
        Instruction::MatrixAlu { rd, ra, rb, rc } => {
            let v = Tile::fma(cpu.tile(ra)?, cpu.tile(rb)?, cpu.tile(rc)?);
            *cpu.tile_mut(rd)? = v;
        }
        Instruction::MatrixMem { rd, rs1, stride, imm, is_load } => {
            let base = offset(cpu.read(rs1)? as u32, imm);
            let pitch = cpu.read(stride)? as u32;
            if is_load {
                *cpu.tile_mut(rd)? = load_tile(mem, base, pitch)?;
            } else {
                let tile = *cpu.tile(rd)?;
                store_tile(mem, base, pitch, &tile)?;
            }
        }
        Instruction::Halt => return Ok(StepOutcome::Halted),
    }
    cpu.pc = next;
    Ok(StepOutcome::Running)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;
    use crate::instruction::BranchOp;
    use crate::memory::Ram;

    #[test]
    fn alu_table() {
        assert_eq!(alu(AluOp::Add, 3, 4), 7);
        assert_eq!(alu(AluOp::Sub, 3, 4), -1);
        assert_eq!(alu(AluOp::Sll, 1, 4), 16);
        assert_eq!(alu(AluOp::Srl, -1, 1), 0x7FFF_FFFF);
        assert_eq!(alu(AluOp::Sra, -8, 1), -4);
        assert_eq!(alu(AluOp::Slt, -1, 0), 1);
        assert_eq!(alu(AluOp::Sltu, -1, 0), 0);
        assert_eq!(alu(AluOp::Mul, -3, 5), -15);
        assert_eq!(alu(AluOp::Xor, 0b1100, 0b1010), 0b0110);
        assert_eq!(alu(AluOp::Add, i32::MAX, 1), i32::MIN);
    }

    #[test]
    fn codec_shifts_match_native_shifts() {
        for a in [0, 1, -1, 0x1234_5678, i32::MIN, -12345] {
            for b in [0, 1, 5, 31, 32, 33] {
                assert_eq!(alu(AluOp::Sll, a, b), ((a as u32) << (b & 0x1F)) as i32);
                assert_eq!(alu(AluOp::Srl, a, b), ((a as u32) >> (b & 0x1F)) as i32);
            }
        }
    }

    #[test]
    fn halt_stops() {
        let mut cpu = Cpu::default();
        let mut mem = Ram::new(4);
        mem.store32(0, encode(Instruction::Halt).unwrap()).unwrap();
        assert_eq!(step(&mut cpu, &mut mem), Ok(StepOutcome::Halted));
        assert_eq!(cpu.pc, 0);
    }

    #[test]
    fn sw_stores_word() {
        let mut cpu = Cpu::default();
        let mut mem = Ram::new(64);
        cpu.write(1, 0xDEADBEEFu32 as i32).unwrap();
        cpu.write(2, 0x20).unwrap();
        let sw = encode(Instruction::SType { rs1: 2, rs2: 1, imm: 0 }).unwrap();
        mem.store32(0, sw).unwrap();
        assert_eq!(step(&mut cpu, &mut mem), Ok(StepOutcome::Running));
        assert_eq!(mem.load32(0x20).unwrap(), 0xDEADBEEF);
        assert_eq!(cpu.pc, 4);
    }

    #[test]
    fn lui_replaces_register() {
        let mut cpu = Cpu::default();
        let mut mem = Ram::new(8);
        cpu.write(5, 0x7FF).unwrap();
        mem.store32(0, encode(Instruction::UType { rd: 5, imm: 0xFFFFF }).unwrap()).unwrap();
        step(&mut cpu, &mut mem).unwrap();
        assert_eq!(cpu.read(5).unwrap(), 0xFFFF_F000u32 as i32);
    }

    #[test]
    fn branch_taken_and_not_taken() {
        let mut mem = Ram::new(64);
        let blt = encode(Instruction::BType { rs1: 1, rs2: 2, imm: -8, cond: BranchOp::Blt }).unwrap();
        mem.store32(16, blt).unwrap();

        let mut cpu = Cpu { pc: 16, ..Cpu::default() };
        cpu.write(1, i32::MIN).unwrap();
        cpu.write(2, 1).unwrap();
        step(&mut cpu, &mut mem).unwrap();
        assert_eq!(cpu.pc, 8);

        let mut cpu = Cpu { pc: 16, ..Cpu::default() };
        cpu.write(1, 1).unwrap();
        step(&mut cpu, &mut mem).unwrap();
        assert_eq!(cpu.pc, 20);
    }

    #[test]
    fn jal_and_jalr_link() {
        let mut mem = Ram::new(64);
        mem.store32(0, encode(Instruction::JType { rd: 1, imm: 12 }).unwrap()).unwrap();
        mem.store32(12, encode(Instruction::JalrType { rd: 3, rs1: 1, imm: 4 }).unwrap()).unwrap();
        let mut cpu = Cpu::default();
        step(&mut cpu, &mut mem).unwrap();
        assert_eq!((cpu.pc, cpu.read(1).unwrap()), (12, 4));
        step(&mut cpu, &mut mem).unwrap();
        assert_eq!((cpu.pc, cpu.read(3).unwrap()), (8, 16));
    }

    #[test]
    fn jalr_reads_source_before_linking() {
        let mut mem = Ram::new(64);
        mem.store32(0, encode(Instruction::JalrType { rd: 5, rs1: 5, imm: 0 }).unwrap()).unwrap();
        let mut cpu = Cpu::default();
        cpu.write(5, 40).unwrap();
        step(&mut cpu, &mut mem).unwrap();
        assert_eq!((cpu.pc, cpu.read(5).unwrap()), (40, 4));
    }

    #[test]
    fn misaligned_load_faults() {
        let mut mem = Ram::new(64);
        mem.store32(0, encode(Instruction::Load { rd: 1, rs1: 0, imm: 1 }).unwrap()).unwrap();
        let mut cpu = Cpu::default();
        assert_eq!(step(&mut cpu, &mut mem), Err(SimError::AlignmentFault { addr: 1 }));
    }

    #[test]
    fn undecodable_word_faults_with_pc() {
        let mut mem = Ram::new(8);
        mem.store32(4, 0x0000_000B).unwrap();
        let mut cpu = Cpu { pc: 4, ..Cpu::default() };
        assert!(matches!(step(&mut cpu, &mut mem), Err(SimError::Decode { pc: 4, .. })));
    }

    #[test]
    fn strided_tile_load_and_store() {
        let mut mem = Ram::new(256);
        let tile = Tile::from_f32([
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
            [13.0, 14.0, 15.0, 16.0],
        ]);
        store_tile(&mut mem, 64, 16, &tile).unwrap();
        // rows land 16 bytes apart
        assert_eq!(&mem.as_bytes()[80..88], &tile.to_bytes()[8..16]);
        assert_eq!(&mem.as_bytes()[72..80], &[0u8; 8]);
        assert_eq!(load_tile(&mem, 64, 16).unwrap(), tile);

        store_tile(&mut mem, 128, 0, &tile).unwrap();
        assert_eq!(&mem.as_bytes()[128..160], &tile.to_bytes());
        assert!(load_tile(&mem, 130, 0).is_err());
    }
}
