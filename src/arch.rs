use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum::IntoEnumIterator;

use crate::instruction::{AluOp, BranchOp};

pub const SCALAR_REGS: usize = 32;
pub const MATRIX_REGS: usize = 16;

/// Code starts at address 0; data conventionally starts here.
pub const DATA_START: u32 = 0x200;
pub const DEFAULT_MEMORY_SIZE: usize = 64 * 1024;
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Register index of the stack pointer (`sp`).
pub const SP: u8 = 2;
/// Register index of the return address (`ra`).
pub const RA: u8 = 1;

/// The all-ones word terminates a program.
pub const HALT_WORD: u32 = 0xFFFF_FFFF;

/// 7-bit opcode discriminant occupying bits [0:6] of every word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Opcode {
    RType = 0b011_0011,
    OpImm = 0b001_0011,
    Load = 0b000_0011,
    Store = 0b010_0011,
    Branch = 0b110_0011,
    Lui = 0b011_0111,
    Jal = 0b110_1111,
    Jalr = 0b110_0111,
    LoadTile = 0b100_0111,
    StoreTile = 0b101_0111,
    Gemm = 0b111_0111,
    Halt = 0b111_1111,
}

pub const FUNCT3_WORD: u32 = 0x2;
pub const FUNCT7_ALT: u32 = 0x20;
pub const FUNCT7_MUL: u32 = 0x01;

/// (funct7, funct3) of the register-register form.
pub fn r_funct(op: AluOp) -> (u32, u32) {
    match op {
        AluOp::Add => (0x00, 0x0),
        AluOp::Sub => (FUNCT7_ALT, 0x0),
        AluOp::Xor => (0x00, 0x4),
        AluOp::Or => (0x00, 0x6),
        AluOp::And => (0x00, 0x7),
        AluOp::Sll => (0x00, 0x1),
        AluOp::Srl => (0x00, 0x5),
        AluOp::Sra => (FUNCT7_ALT, 0x5),
        AluOp::Slt => (0x00, 0x2),
        AluOp::Sltu => (0x00, 0x3),
        AluOp::Mul => (FUNCT7_MUL, 0x0),
    }
}

pub fn r_op(funct7: u32, funct3: u32) -> Option<AluOp> {
    AluOp::iter().find(|&op| r_funct(op) == (funct7, funct3))
}

/// funct3 for the immediate form, `None` for ops with no immediate encoding (SUB, MUL).
/// SRLI and SRAI share funct3 0x5 and are split by funct7.
pub fn i_funct(op: AluOp) -> Option<u32> {
    match op {
        AluOp::Sub | AluOp::Mul => None,
        _ => Some(r_funct(op).1),
    }
}

/// Reads funct3 0x5 as SRL; the decoder promotes it to SRA from funct7.
pub fn i_op(funct3: u32) -> Option<AluOp> {
    AluOp::iter().find(|&op| op != AluOp::Sra && i_funct(op) == Some(funct3))
}

pub fn b_funct(op: BranchOp) -> u32 {
    match op {
        BranchOp::Beq => 0x0,
        BranchOp::Bne => 0x1,
        BranchOp::Blt => 0x4,
        BranchOp::Bge => 0x5,
    }
}

pub fn b_op(funct3: u32) -> Option<BranchOp> {
    BranchOp::iter().find(|&op| b_funct(op) == funct3)
}

/// Seeds the program counter and `sp` when a core is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRegister {
    pub start_address: u32,
    pub stack_pointer: u32,
}

impl ControlRegister {
    pub fn new(start_address: u32, stack_pointer: u32) -> Self {
        Self { start_address, stack_pointer }
    }
}

impl Default for ControlRegister {
    fn default() -> Self {
        Self::new(0, DEFAULT_MEMORY_SIZE as u32)
    }
}
