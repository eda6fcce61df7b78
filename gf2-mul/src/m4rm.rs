//! Method-of-Four-Russians multiplication (spec.md §4.4): precompute every
//! XOR-combination of a `k`-row strip of `B` in Gray-code order, then reduce
//! each row of `A` to a single table lookup per strip instead of `k`
//! scalar XORs.

use gf2_core::combine;
use gf2_core::matrix::{Mat, MatMut, MatRef};
use gf2_core::MAXKAY;

/// Number of strips whose tables are built before sweeping `A`'s rows once
/// across all of them — spec.md §4.4's "typical batch: 8 tables", traded
/// for better reuse of each `A` row while it's hot.
const TABLE_BATCH: usize = 8;

/// `k` chosen automatically from the problem's smaller dimension: spec.md
/// §4.4's `max(1, round(0.75 * ceil(log2(min(m, n)))))`, capped at
/// [`MAXKAY`].
pub fn choose_k(m: usize, n: usize) -> usize {
    let dim = m.min(n);
    let ceil_log2 = if dim <= 1 {
        0
    } else {
        (usize::BITS - (dim - 1).leading_zeros()) as usize
    };
    let k = ((0.75 * ceil_log2 as f64).round() as usize).max(1);
    k.min(MAXKAY)
}

/// Builds the `2^k`-row combination table for one strip of `B`, per
/// spec.md §4.4 step 1: `T[ord[0]]` is the zero row, and each later entry
/// is the previous one XORed with a single strip row.
fn build_table(k: usize, strip: MatRef<'_>, ncols: usize) -> Mat {
    let size = 1usize << k;
    let mut table = Mat::zeros(size, ncols);
    let gc = gf2_core::graycode::tables().get(k);
    let mut view = table.as_mut();
    for j in 1..size {
        let prev = gc.ord[j - 1] as usize;
        let cur = gc.ord[j] as usize;
        let flipped_row = gc.inc[j - 1] as usize;

        let prev_words: Vec<u64> = view.rb_ref().row(prev).to_vec();
        view.row_mut(cur).copy_from_slice(&prev_words);

        let mut col = 0;
        while col < ncols {
            let chunk = (ncols - col).min(64);
            let bits = combine::read_bits(strip, flipped_row, col, chunk);
            combine::xor_bits(&mut view, cur, col, chunk, bits);
            col += chunk;
        }
    }
    drop(view);
    table
}

/// `dst ^= A * B` over GF(2), `k = 0` to choose `k` automatically.
pub fn multiply_accumulate(mut dst: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>, k: usize) {
    assert2::assert!(a.ncols() == b.nrows(), "M4RM: A.ncols must equal B.nrows");
    assert2::assert!(
        dst.nrows() == a.nrows() && dst.ncols() == b.ncols(),
        "M4RM: destination shape must be A.nrows x B.ncols"
    );
    let k = if k == 0 {
        choose_k(a.nrows(), b.ncols())
    } else {
        assert2::assert!(k >= 1 && k <= MAXKAY);
        k
    };
    if b.nrows() == 0 || a.nrows() == 0 {
        return;
    }

    let ncols = b.ncols();
    let nstrips = (b.nrows() + k - 1) / k;
    let mut strip_idx = 0;
    let mut row_start = 0;
    while strip_idx < nstrips {
        let batch_len = TABLE_BATCH.min(nstrips - strip_idx);
        let mut tables: Vec<(usize, usize, Mat)> = Vec::with_capacity(batch_len);
        let mut row = row_start;
        for _ in 0..batch_len {
            let k_eff = k.min(b.nrows() - row);
            let strip = b.submatrix(row, 0, k_eff, ncols);
            tables.push((row, k_eff, build_table(k_eff, strip, ncols)));
            row += k_eff;
        }

        for i in 0..a.nrows() {
            for &(col_start, k_eff, ref table) in &tables {
                let idx = combine::read_bits(a, i, col_start, k_eff) as usize;
                let trow = table.as_ref().submatrix(idx, 0, 1, ncols);
                let drow = dst.submatrix(i, 0, 1, ncols);
                combine::xor_assign(drow, trow);
            }
        }

        row_start = row;
        strip_idx += batch_len;
    }
}

/// `dst = A * B`, `dst` pre-zeroed by the caller.
pub fn multiply_into(dst: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>, k: usize) {
    assert2::debug_assert!(dst.rb_ref().is_zero(), "M4RM multiply_into expects a zeroed destination");
    multiply_accumulate(dst, a, b, k);
}

/// `A * B`, allocating the result.
pub fn multiply(a: MatRef<'_>, b: MatRef<'_>, k: usize) -> Mat {
    let mut dst = Mat::zeros(a.nrows(), b.ncols());
    multiply_into(dst.as_mut(), a, b, k);
    dst
}
