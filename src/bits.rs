//! Byte <-> bit sequence <-> integer conversions shared by the decoder and the ALU.
//!
//! `bits_of` expands each byte MSB-first and then reverses the whole sequence, so
//! element `i` is bit `i` of the big-endian value of the input. Fixed bit-range
//! slices over the result therefore address instruction fields directly when the
//! word is passed as `word.to_be_bytes()`.

pub type Bits = Vec<bool>;

pub fn bits_of(bytes: &[u8]) -> Bits {
    bits_of_width(bytes, 8)
}

/// Same as [`bits_of`], taking only the low `width` bits of every byte.
pub fn bits_of_width(bytes: &[u8], width: u32) -> Bits {
    let mut bits = Vec::with_capacity(bytes.len() * width as usize);
    for &b in bytes {
        for i in (0..width).rev() {
            bits.push((b >> i) & 1 == 1);
        }
    }
    bits.reverse();
    bits
}

/// Bit 0 of the slice is the least significant. With `signed`, the slice length is
/// the two's-complement width.
pub fn value_of(bits: &[bool], signed: bool) -> i64 {
    let raw = bits
        .iter()
        .enumerate()
        .fold(0i64, |acc, (i, &b)| acc | ((b as i64) << i));
    match bits.len() {
        n if signed && n > 0 && n < 64 && bits[n - 1] => raw - (1i64 << n),
        _ => raw,
    }
}

/// Inclusive bit range `[lo, hi]` of `bits`, as an unsigned value.
pub fn field(bits: &[bool], lo: usize, hi: usize) -> u32 {
    value_of(&bits[lo..=hi], false) as u32
}

/// Sign-extends the low `width` bits of `v`.
#[inline]
pub fn sext(v: u32, width: u32) -> i32 {
    let shift = 32 - width;
    ((v << shift) as i32) >> shift
}

pub fn fits_signed(v: i64, width: u32) -> bool {
    let max = (1i64 << (width - 1)) - 1;
    let min = -(1i64 << (width - 1));
    (min..=max).contains(&v)
}

/// The 32 bits of `v`, least significant first.
pub fn word_bits(v: u32) -> Bits {
    bits_of(&v.to_be_bytes())
}
