use crate::arch::{MATRIX_REGS, SCALAR_REGS};
use crate::errors::{RegisterFile, SimError};
use crate::matrix::Tile;

/// Scalar and matrix register files plus the program counter.
#[derive(Debug, Default, Clone)]
pub struct Cpu {
    pub x: [i32; SCALAR_REGS], // x0..x31 (x0 always 0)
    pub m: [Tile; MATRIX_REGS],
    pub pc: u32,
}

impl Cpu {
    #[inline]
    pub fn read(&self, r: u8) -> Result<i32, SimError> {
        match r {
            0 => Ok(0),
            _ => self.x.get(r as usize).copied().ok_or(Self::fault(RegisterFile::Scalar, r)),
        }
    }

    #[inline]
    pub fn write(&mut self, r: u8, v: i32) -> Result<(), SimError> {
        let slot = self.x.get_mut(r as usize).ok_or(Self::fault(RegisterFile::Scalar, r))?;
        if r != 0 {
            *slot = v;
        }
        Ok(())
    }

    pub fn tile(&self, r: u8) -> Result<&Tile, SimError> {
        self.m.get(r as usize).ok_or(Self::fault(RegisterFile::Matrix, r))
    }

    pub fn tile_mut(&mut self, r: u8) -> Result<&mut Tile, SimError> {
        self.m.get_mut(r as usize).ok_or(Self::fault(RegisterFile::Matrix, r))
    }

    fn fault(file: RegisterFile, index: u8) -> SimError {
        SimError::RegisterIndexFault { file, index }
    }
}
