use half::f16;

pub const TILE_DIM: usize = 4;
/// Bytes of one packed row (4 x f16).
pub const ROW_BYTES: u32 = (TILE_DIM * 2) as u32;
/// Bytes of one packed tile (4 x 4 x f16).
pub const TILE_BYTES: usize = TILE_DIM * TILE_DIM * 2;

/// A 4x4 half-precision matrix register value, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tile(pub [[f16; TILE_DIM]; TILE_DIM]);

impl Tile {
    pub fn from_f32(rows: [[f32; TILE_DIM]; TILE_DIM]) -> Self {
        Tile(rows.map(|row| row.map(f16::from_f32)))
    }

    pub fn to_f32(&self) -> [[f32; TILE_DIM]; TILE_DIM] {
        self.0.map(|row| row.map(f16::to_f32))
    }

    pub fn identity() -> Self {
        let mut t = Tile::default();
        for i in 0..TILE_DIM {
            t.0[i][i] = f16::ONE;
        }
        t
    }

    /// `a * b + c`, accumulated in f32 and rounded once per element.
    pub fn fma(a: &Tile, b: &Tile, c: &Tile) -> Tile {
        let (a, b, c) = (a.to_f32(), b.to_f32(), c.to_f32());
        let mut out = [[0f32; TILE_DIM]; TILE_DIM];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = (0..TILE_DIM).map(|k| a[i][k] * b[k][j]).sum::<f32>() + c[i][j];
            }
        }
        Tile::from_f32(out)
    }

    /// Two elements of `row` packed into a little-endian word, element `2 * half` low.
    pub fn row_word(&self, row: usize, half: usize) -> u32 {
        let lo = self.0[row][2 * half].to_bits() as u32;
        let hi = self.0[row][2 * half + 1].to_bits() as u32;
        lo | (hi << 16)
    }

    pub fn set_row_word(&mut self, row: usize, half: usize, word: u32) {
        self.0[row][2 * half] = f16::from_bits(word as u16);
        self.0[row][2 * half + 1] = f16::from_bits((word >> 16) as u16);
    }

    pub fn to_bytes(&self) -> [u8; TILE_BYTES] {
        let mut out = [0u8; TILE_BYTES];
        for (i, v) in self.0.iter().flatten().enumerate() {
            out[2 * i..2 * i + 2].copy_from_slice(&v.to_le_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8; TILE_BYTES]) -> Self {
        let mut t = Tile::default();
        for (i, v) in t.0.iter_mut().flatten().enumerate() {
            *v = f16::from_le_bytes([bytes[2 * i], bytes[2 * i + 1]]);
        }
        t
    }
}
