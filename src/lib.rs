pub mod arch;
pub mod bits;
pub mod errors;
pub mod instruction;
pub mod matrix;
pub mod memory;
pub mod registers;

pub mod decoder;
pub mod encoder;

pub mod asm;
pub mod exec;
pub mod program;
pub mod sim;

pub use arch::ControlRegister;
pub use asm::{assemble, assemble_program, AsmError, Program};
pub use decoder::decode;
pub use encoder::encode;
pub use errors::{DecodeError, EncodeError, SimError};
pub use instruction::{AluOp, BranchOp, Instruction};
pub use matrix::Tile;
pub use memory::{Bus, Ram};
pub use registers::Cpu;
pub use sim::{Core, RunOutcome, StepOutcome};
