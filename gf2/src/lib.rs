//! Dense linear algebra over GF(2), assembled from three lower-level crates:
//! [`gf2_core`] (the packed-bit matrix, permutations, and row combiner),
//! [`gf2_mul`] (M4RM and Strassen–Winograd multiplication), and [`gf2_lu`]
//! (PLE/PLUQ, TRSM, and the algorithms derived from them). This crate adds
//! nothing algorithmic; it's the facade spec.md §6 describes — hooks and
//! file I/O — plus the re-exports that make the three crates usable as one.

pub mod io;

pub use gf2_core::combine;
pub use gf2_core::graycode;
pub use gf2_core::matrix::{Mat, MatMut, MatRef};
pub use gf2_core::permutation::Permutation;
pub use gf2_core::transpose;
pub use gf2_core::{naive, MAXKAY};

pub use gf2_mul::{m4rm, strassen, Parallelism};

pub use gf2_lu::{derived, echelonize, invert, kernel_left, ple, rank, solve_left, trsm, SolveError};
pub use gf2_lu::{pluq, pluq_with_options, Pluq, PluqOptions};

pub use io::{read, write, Gf2IoError};

/// The allocator/RNG/die escape hatches spec.md §6 grants callers. Lives in
/// `gf2_core` alongside the MMC it's a sibling singleton to; re-exported
/// here so callers reach for `gf2::hooks` rather than reaching past the
/// facade into a dependency.
pub mod hooks {
    pub use gf2_core::hooks::{die, dimension_mismatch, random_word, set_die_hook, set_random_hook};
}
