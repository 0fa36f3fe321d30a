use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Scalar ALU operation selected by funct3/funct7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum AluOp {
    Add,
    Sub,
    Xor,
    Or,
    And,
    Sll,
    Srl,
    Sra,
    Slt,
    Sltu,
    Mul,
}

/// Branch condition applied to `rs1 - rs2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum BranchOp {
    Beq,
    Bne,
    Blt,
    Bge,
}

impl BranchOp {
    pub fn taken(self, diff: i64) -> bool {
        match self {
            BranchOp::Beq => diff == 0,
            BranchOp::Bne => diff != 0,
            BranchOp::Blt => diff < 0,
            BranchOp::Bge => diff >= 0,
        }
    }
}

/// A decoded instruction. Scalar register fields are 0..32, matrix fields 0..16.
/// B/J immediates are byte offsets from the instruction's own address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    RType { rd: u8, rs1: u8, rs2: u8, op: AluOp },
    /// Register-immediate ALU op. For shifts `imm` is the shift amount.
    IType { rd: u8, rs1: u8, imm: i32, op: AluOp },
    /// `lw`, I-format.
    Load { rd: u8, rs1: u8, imm: i32 },
    /// `sw`.
    SType { rs1: u8, rs2: u8, imm: i32 },
    BType { rs1: u8, rs2: u8, imm: i32, cond: BranchOp },
    /// `lui`; `imm` is the 20-bit upper value, not yet shifted.
    UType { rd: u8, imm: u32 },
    JType { rd: u8, imm: i32 },
    JalrType { rd: u8, rs1: u8, imm: i32 },
    /// `rd = ra * rb + rc` over 4x4 tiles.
    MatrixAlu { rd: u8, ra: u8, rb: u8, rc: u8 },
    /// `ld.m` / `st.m`: tile at `x[rs1] + imm`, row pitch in `x[stride]`.
    MatrixMem { rd: u8, rs1: u8, stride: u8, imm: i32, is_load: bool },
    Halt,
}
