use thiserror::Error;

/// A word the decoder has no reading for.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown opcode 0b{opcode:07b} in word 0x{word:08x}")]
    UnknownOpcode { word: u32, opcode: u8 },

    #[error("malformed instruction 0x{word:08x}: {reason}")]
    MalformedInstruction { word: u32, reason: &'static str },
}

/// Fields that cannot be packed into their bit ranges.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("immediate {imm} out of {bits}-bit range")]
    ImmediateOutOfRange { imm: i64, bits: u32 },

    #[error("offset {imm} must be even")]
    MisalignedOffset { imm: i32 },

    #[error("register index {index} out of range (0..{limit})")]
    RegisterOutOfRange { index: u8, limit: u8 },

    #[error("{0} has no immediate form")]
    NoImmediateForm(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterFile {
    Scalar,
    Matrix,
}

/// Faults that abort a simulation run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("decode error at pc 0x{pc:08x}: {source}")]
    Decode {
        pc: u32,
        #[source]
        source: DecodeError,
    },

    #[error("misaligned access at 0x{addr:08x}")]
    AlignmentFault { addr: u32 },

    #[error("access of {len} bytes at 0x{addr:08x} is outside memory")]
    OutOfBounds { addr: u32, len: usize },

    #[error("{file:?} register index {index} out of range")]
    RegisterIndexFault { file: RegisterFile, index: u8 },
}
