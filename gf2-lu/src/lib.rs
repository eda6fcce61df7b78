//! PLE/PLUQ decomposition (M4RI), triangular solve, and the algorithms
//! derived from them: rank, echelon form, kernel, inverse, and system
//! solving over GF(2) (spec.md §4.6-§4.10).

pub mod derived;
pub mod ple;
pub mod trsm;

pub use derived::{echelonize, invert, kernel_left, rank, solve_left, SolveError};
pub use ple::{pluq, pluq_with_options, Pluq, PluqOptions};
