//! Binary images: flat little-endian byte files that load at address 0.

mod loader;

pub use loader::{image_from_words, load_bytes};
