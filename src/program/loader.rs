use crate::{errors::SimError, memory::Bus};

/// Serializes instruction words as a little-endian byte image.
pub fn image_from_words(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// Copies an image into memory starting at `base`.
pub fn load_bytes(mem: &mut impl Bus, base: u32, bytes: &[u8]) -> Result<(), SimError> {
    let mut addr = base;
    for &b in bytes {
        mem.store8(addr, b)?;
        addr = addr.wrapping_add(1);
    }
    Ok(())
}
