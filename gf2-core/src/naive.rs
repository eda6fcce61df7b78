//! Cubic multiplication (spec.md §4 "naive multiply"): the base case for
//! M4RM/Strassen recursion and the correctness oracle used by their tests.

use crate::combine::{read_bits, xor_bits};
use crate::matrix::{Mat, MatMut, MatRef};

/// `dst = a * b` over GF(2). `dst` must be pre-zeroed and correctly shaped.
pub fn multiply_into(a: MatRef<'_>, b: MatRef<'_>, dst: &mut MatMut<'_>) {
    assert2::assert!(a.ncols() == b.nrows());
    assert2::assert!(dst.nrows() == a.nrows() && dst.ncols() == b.ncols());
    for i in 0..a.nrows() {
        for k in 0..a.ncols() {
            if a.get(i, k) {
                xor_row_of_b_into_dst(b, k, dst, i);
            }
        }
    }
}

fn xor_row_of_b_into_dst(b: MatRef<'_>, k: usize, dst: &mut MatMut<'_>, i: usize) {
    let n = b.ncols();
    let mut col = 0;
    while col < n {
        let chunk = (n - col).min(64);
        let bits = read_bits(b, k, col, chunk);
        xor_bits(dst, i, col, chunk, bits);
        col += chunk;
    }
}

/// `a * b`, allocating the result.
pub fn multiply(a: MatRef<'_>, b: MatRef<'_>) -> Mat {
    let mut dst = Mat::zeros(a.nrows(), b.ncols());
    {
        let mut dm = dst.as_mut();
        multiply_into(a, b, &mut dm);
    }
    dst
}
