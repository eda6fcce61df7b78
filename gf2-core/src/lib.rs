//! Packed-bit dense matrix core over GF(2).
//!
//! This crate owns the data model (`Mat`/`MatRef`/`MatMut`, `Permutation`),
//! the two process-wide singletons (the Gray-code table family and the MMC
//! block cache), the row combiner, transpose, naive multiply, and the
//! allocator/RNG/die hooks. Higher-level algorithms (M4RM, Strassen, PLE,
//! TRSM) live in `gf2-mul` and `gf2-lu`.

pub mod combine;
pub mod graycode;
pub mod hooks;
pub mod matrix;
pub mod mmc;
pub mod naive;
pub mod permutation;
pub mod scratch;
pub mod transpose;
pub mod word;

pub use graycode::{GrayCodeTable, MAXKAY};
pub use matrix::{Mat, MatMut, MatRef};
pub use permutation::Permutation;
