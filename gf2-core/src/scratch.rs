//! Scratch-workspace sizing for recursive algorithms (Strassen quadrant
//! sums, PLE right-half updates, TRSM temporaries), mirroring the teacher's
//! `lu_in_place_req`/`lu_unblocked_req` pair built on `dyn_stack`: callers
//! size their recursion's total scratch once up front (`*_req` functions
//! compose with `StackReq::try_all_of`/`try_any_of`) and hand a single
//! `DynStack` down through the recursion rather than allocating at every
//! level.
//!
//! Unlike the teacher's generic `temp_mat_uninit`, carving an actual matrix
//! view out of a `DynStack` here is two steps rather than one: call
//! `stack.make_with::<u64>(nrows * rowstride, |_| 0)` to get a zeroed word
//! buffer (this is the same call the teacher uses for transposition scratch
//! in `lu_in_place_impl`), then wrap it with [`MatMut::from_scratch`]. Doing
//! it in two steps keeps the buffer's lifetime tied directly to the
//! caller's own stack borrow instead of a helper's local variable.

use dyn_stack::{SizeOverflow, StackReq};

fn rowstride_for(ncols: usize) -> usize {
    if ncols == 0 {
        0
    } else {
        (ncols + 63) / 64
    }
}

/// Number of `u64` words backing a tightly packed `nrows x ncols` scratch
/// matrix (zero offset).
pub fn words_for(nrows: usize, ncols: usize) -> usize {
    nrows * rowstride_for(ncols)
}

/// Workspace required for an `nrows x ncols` scratch matrix, for composing
/// into a larger `StackReq` via `try_all_of`/`try_any_of`.
pub fn temp_mat_req(nrows: usize, ncols: usize) -> Result<StackReq, SizeOverflow> {
    StackReq::try_new::<u64>(words_for(nrows, ncols))
}
