use crate::program::image_from_words;

/// Assembled code and data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// Instruction words, starting at address 0.
    pub text: Vec<u32>,
    /// Raw data bytes.
    pub data: Vec<u8>,
    /// Base address for data region.
    pub data_base: u32,
}

impl Program {
    /// Binary image: code words little-endian, zero padding up to `data_base`, then data.
    pub fn image(&self) -> Vec<u8> {
        let mut out = image_from_words(&self.text);
        if !self.data.is_empty() {
            out.resize(self.data_base as usize, 0);
            out.extend_from_slice(&self.data);
        }
        out
    }
}
