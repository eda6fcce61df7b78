//! PLE/PLUQ decomposition via Gaussian elimination over GF(2) (spec.md
//! §4.7): factor `A` in place as `P * L * E * Q`, `L` unit-lower-triangular,
//! `E` row-echelon with unit pivots, `P`/`Q` row/column permutations,
//! `r = rank(A)`.
//!
//! Grounded in the teacher's `lu_in_place_impl` at the shape of the
//! algorithm (advance a pivot cursor, record transpositions, eliminate in
//! place, leaving the multiplier bits below the diagonal) — there is no
//! partial pivoting over GF(2), just "first nonzero row wins". The strip/`k`
//! cursor inherited from the Four-Russians design still paces the pivot
//! search, but the elimination itself is a direct per-pivot row XOR rather
//! than a Gray-code table sweep — see DESIGN.md.

use reborrow::ReborrowMut;

use gf2_core::combine;
use gf2_core::matrix::{Mat, MatMut, MatRef};
use gf2_core::permutation::Permutation;
use gf2_mul::m4rm;

/// Result of [`pluq`]: the rank and the row/column transposition sequences
/// that realize `P` and `Q`. `L` and `E` are left in `A`'s own storage —
/// see [`extract_l`]/[`extract_e`].
pub struct Pluq {
    pub rank: usize,
    pub row_perm: Permutation,
    pub col_perm: Permutation,
}

/// Tunables threaded through [`pluq_with_options`], mirroring the teacher's
/// `*ComputeParams` workspace-sizing structs: every field defaults to
/// "auto-select", and new fields can be added without breaking callers that
/// only ever construct this via [`Default::default`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default)]
pub struct PluqOptions {
    /// Overrides the Four-Russians strip width; `None` defers to
    /// [`m4rm::choose_k`].
    pub k_override: Option<usize>,
}

/// Factors `a` in place with the default options. See [`pluq_with_options`].
pub fn pluq(a: MatMut<'_>) -> Pluq {
    pluq_with_options(a, PluqOptions::default())
}

/// Factors `a` in place. On return, the strictly-lower-triangular part of
/// `a` below the first `rank` rows (restricted to the first `rank`
/// post-`Q` columns) holds `L`'s off-diagonal bits, and rows `0..rank`
/// hold `E`; both with implicit unit diagonal.
pub fn pluq_with_options(mut a: MatMut<'_>, options: PluqOptions) -> Pluq {
    let m = a.nrows();
    let n = a.ncols();
    let mut row_perm = Permutation::identity(m);
    let mut col_perm = Permutation::identity(n);

    let mut p = 0usize;
    let mut tail = n;
    while p < m && p < tail {
        let budget = (tail - p).min(m - p).max(1);
        let k = options
            .k_override
            .unwrap_or_else(|| m4rm::choose_k(budget, budget))
            .min(tail - p)
            .max(1);
        let found = eliminate_strip(a.rb_mut(), p, k, &mut tail, &mut row_perm, &mut col_perm);
        p += found;
        if found == 0 {
            break;
        }
    }

    tracing::debug!(rank = p, rows = m, cols = n, "pluq done");

    Pluq {
        rank: p,
        row_perm,
        col_perm,
    }
}

/// Runs one strip of the pivot search at cursor `p`: finds up to `k` pivots
/// among columns `[p, tail)` (pushing rank-deficient columns past `tail` as
/// they're found), eliminating each as soon as it's confirmed. Returns the
/// number of pivots actually found.
fn eliminate_strip(
    mut a: MatMut<'_>,
    p: usize,
    k: usize,
    tail: &mut usize,
    row_perm: &mut Permutation,
    col_perm: &mut Permutation,
) -> usize {
    let m = a.nrows();
    let mut found = 0usize;
    let mut col = 0usize;

    while found < k && p + col < *tail {
        let target_col = p + col;
        let pivot_row = (p + found..m).find(|&row| a.rb_ref().get(row, target_col));

        match pivot_row {
            Some(pr) => {
                let pivot_pos = p + found;
                row_perm.push_transposition(pivot_pos, pr);
                a.swap_rows(pivot_pos, pr);

                // Standard in-place LU elimination, generalized to GF(2):
                // every row below the pivot with a set bit at `target_col`
                // gets the pivot row XORed in, but only at columns *after*
                // `target_col` — its own bit there is left untouched, which
                // is exactly what records it as `L`'s multiplier entry (the
                // same "leave it below the diagonal" convention the
                // teacher's in-place LU uses). Rows *above* `pivot_pos`
                // (earlier pivots) are never touched by a later pivot: `L`
                // is strictly lower triangular, so pivot row `i` can only
                // ever be expressed in terms of pivot rows `j < i`.
                for row in (pivot_pos + 1)..m {
                    if a.rb_ref().get(row, target_col) {
                        xor_row_suffix(&mut a, pivot_pos, row, target_col + 1);
                    }
                }
                found += 1;
                col += 1;
            }
            None => {
                *tail -= 1;
                col_perm.push_transposition(target_col, *tail);
                a.swap_columns(target_col, *tail);
                // retry the same `target_col` with whatever column moved in
            }
        }
    }

    found
}

/// `a[dst, from..] ^= a[src, from..]`. Chunked through `read_bits`/
/// `xor_bits` (rather than a whole-word slice XOR) since `from` is not in
/// general word-aligned — only the tail of the pivot's word, not all of it,
/// is folded into `dst`.
fn xor_row_suffix(a: &mut MatMut<'_>, src: usize, dst: usize, from: usize) {
    let n = a.ncols();
    let mut col = from;
    while col < n {
        let chunk = (n - col).min(64);
        let bits = combine::read_bits(a.rb_ref(), src, col, chunk);
        combine::xor_bits(a, dst, col, chunk, bits);
        col += chunk;
    }
}

/// Extracts the explicit `m x rank` unit-lower-triangular `L` (spec.md §8
/// invariant 4's "documented extraction"): ones on the diagonal, `a`'s
/// below-diagonal bits within the first `rank` columns, zero elsewhere.
pub fn extract_l(a: MatRef<'_>, rank: usize) -> Mat {
    let mut l = Mat::zeros(a.nrows(), rank);
    let mut view = l.as_mut();
    for i in 0..a.nrows() {
        if i < rank {
            view.set(i, i, true);
        }
        for j in 0..rank.min(i) {
            if a.get(i, j) {
                view.set(i, j, true);
            }
        }
    }
    l
}

/// Extracts the explicit `rank x n` row-echelon `E`: rows `0..rank` of
/// `a`, with each pivot column's diagonal bit forced to `1` (implicit unit
/// pivots) and the rest of that pivot's column left as stored (already
/// zero below the pivot block by construction).
pub fn extract_e(a: MatRef<'_>, rank: usize) -> Mat {
    let mut e = Mat::zeros(rank, a.ncols());
    combine::copy_into(e.as_mut(), a.submatrix(0, 0, rank, a.ncols()));
    for i in 0..rank {
        e.as_mut().set(i, i, true);
    }
    e
}
