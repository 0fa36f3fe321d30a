use crate::errors::SimError;

/// Word-granular access to simulated memory. Every access must be 4-byte aligned.
pub trait Bus {
    fn load32(&self, addr: u32) -> Result<u32, SimError>;
    fn store32(&mut self, addr: u32, value: u32) -> Result<(), SimError>;

    /// Raw byte write used by image loaders; no alignment requirement.
    fn store8(&mut self, addr: u32, value: u8) -> Result<(), SimError>;
}

/// Flat, byte-addressable memory with a size fixed at creation.
#[derive(Clone)]
pub struct Ram {
    data: Vec<u8>,
}

impl Ram {
    pub fn new(size: usize) -> Self {
        Self { data: vec![0; size] }
    }

    /// Memory holding `image` at address 0, zero-filled up to `size` bytes.
    pub fn from_image(image: &[u8], size: usize) -> Self {
        let mut data = image.to_vec();
        data.resize(size.max(image.len()), 0);
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn range(&self, addr: u32, len: usize) -> Result<std::ops::Range<usize>, SimError> {
        let start = addr as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(start..end),
            _ => Err(SimError::OutOfBounds { addr, len }),
        }
    }

    fn aligned(addr: u32) -> Result<(), SimError> {
        if addr % 4 == 0 { Ok(()) } else { Err(SimError::AlignmentFault { addr }) }
    }
}

impl Bus for Ram {
    fn load32(&self, addr: u32) -> Result<u32, SimError> {
        Self::aligned(addr)?;
        let r = self.range(addr, 4)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.data[r]);
        Ok(u32::from_le_bytes(word))
    }

    fn store32(&mut self, addr: u32, value: u32) -> Result<(), SimError> {
        Self::aligned(addr)?;
        let r = self.range(addr, 4)?;
        self.data[r].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn store8(&mut self, addr: u32, value: u8) -> Result<(), SimError> {
        let r = self.range(addr, 1)?;
        self.data[r.start] = value;
        Ok(())
    }
}
