//! Triangular solve (spec.md §4.6): block-recursive TRSM layered over M4RM,
//! mirroring the teacher's `lu_in_place_impl` split (solve the trailing
//! block, apply the off-diagonal correction via a multiply, solve the
//! leading block) rather than the teacher's own `solve_unit_lower_triangular_
//! in_place`, since our base case needs a different trick: direct row-by-row
//! back/forward substitution over GF(2) XORs in place of SIMD float kernels.
//!
//! All four variants (`{upper,lower} x {left,right}`) solve for `X` and
//! leave the result in `B`'s storage. The two "right" variants reduce to
//! their "left" counterparts on the transpose, since `X * U = B` iff
//! `Uᵀ * Xᵀ = Bᵀ` and `Uᵀ` is lower-triangular — transposing a 2^k-bounded
//! block is cheap next to the recursive solve itself.

use reborrow::ReborrowMut;

use gf2_core::matrix::{MatMut, MatRef};
use gf2_core::transpose;
use gf2_mul::m4rm;

/// Below this many rows, TRSM bottoms out in direct back/forward
/// substitution, one row at a time. The actual Four-Russians speedup lives
/// in the recursive step's off-diagonal `multiply_accumulate` call, which
/// is where the real M4RI implementation spends its table lookups too — the
/// base case itself is small enough that per-row XORs dominate nothing.
const BASE_CASE: usize = 32;

/// Solves `U * X = B` for `X`, `U` being `m x m` upper-unit-triangular
/// (implicit diagonal) — spec.md §4.6.
pub fn trsm_upper_left(u: MatRef<'_>, b: MatMut<'_>) {
    assert2::assert!(u.nrows() == u.ncols());
    assert2::assert!(u.nrows() == b.nrows());
    let m = u.nrows();
    if m <= BASE_CASE {
        trsm_upper_left_base(u, b);
        return;
    }
    let r = m / 2;
    let u00 = u.submatrix(0, 0, r, r);
    let u01 = u.submatrix(0, r, r, m - r);
    let u11 = u.submatrix(r, r, m - r, m - r);
    let (mut b0, mut b1) = b.split_rows_at(r);

    trsm_upper_left(u11, b1.rb_mut());
    m4rm::multiply_accumulate(b0.rb_mut(), u01, b1.rb_ref(), 0);
    trsm_upper_left(u00, b0);
}

/// Solves `L * X = B` for `X`, `L` being `m x m` lower-unit-triangular.
pub fn trsm_lower_left(l: MatRef<'_>, b: MatMut<'_>) {
    assert2::assert!(l.nrows() == l.ncols());
    assert2::assert!(l.nrows() == b.nrows());
    let m = l.nrows();
    if m <= BASE_CASE {
        trsm_lower_left_base(l, b);
        return;
    }
    let r = m / 2;
    let l00 = l.submatrix(0, 0, r, r);
    let l10 = l.submatrix(r, 0, m - r, r);
    let l11 = l.submatrix(r, r, m - r, m - r);
    let (mut b0, mut b1) = b.split_rows_at(r);

    trsm_lower_left(l00, b0.rb_mut());
    m4rm::multiply_accumulate(b1.rb_mut(), l10, b0.rb_ref(), 0);
    trsm_lower_left(l11, b1);
}

/// Solves `X * U = B` for `X`, `U` being `n x n` upper-unit-triangular.
pub fn trsm_upper_right(u: MatRef<'_>, mut b: MatMut<'_>) {
    assert2::assert!(u.nrows() == u.ncols());
    assert2::assert!(u.nrows() == b.ncols());
    let ut = transpose::transpose(u);
    let mut bt = transpose::transpose(b.rb_ref());
    trsm_lower_left(ut.as_ref(), bt.as_mut());
    transpose::transpose_into(bt.as_ref(), &mut b);
}

/// Solves `X * L = B` for `X`, `L` being `n x n` lower-unit-triangular.
pub fn trsm_lower_right(l: MatRef<'_>, mut b: MatMut<'_>) {
    assert2::assert!(l.nrows() == l.ncols());
    assert2::assert!(l.nrows() == b.ncols());
    let lt = transpose::transpose(l);
    let mut bt = transpose::transpose(b.rb_ref());
    trsm_upper_left(lt.as_ref(), bt.as_mut());
    transpose::transpose_into(bt.as_ref(), &mut b);
}

fn trsm_upper_left_base(u: MatRef<'_>, mut b: MatMut<'_>) {
    let m = u.nrows();
    for i in (0..m).rev() {
        for j in (i + 1)..m {
            if u.get(i, j) {
                let (ri, rj) = b.two_rows_mut(i, j);
                for (x, y) in ri.iter_mut().zip(rj.iter()) {
                    *x ^= *y;
                }
            }
        }
    }
}

fn trsm_lower_left_base(l: MatRef<'_>, mut b: MatMut<'_>) {
    let m = l.nrows();
    for i in 0..m {
        for j in 0..i {
            if l.get(i, j) {
                let (ri, rj) = b.two_rows_mut(i, j);
                for (x, y) in ri.iter_mut().zip(rj.iter()) {
                    *x ^= *y;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;
    use gf2_core::matrix::Mat;
    use gf2_core::naive;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_unit_upper(rng: &mut StdRng, m: usize) -> Mat {
        let mut u = Mat::zeros(m, m);
        let mut view = u.as_mut();
        for i in 0..m {
            view.set(i, i, true);
            for j in (i + 1)..m {
                if rng.gen_bool(0.5) {
                    view.set(i, j, true);
                }
            }
        }
        u
    }

    fn random_unit_lower(rng: &mut StdRng, m: usize) -> Mat {
        let mut l = Mat::zeros(m, m);
        let mut view = l.as_mut();
        for i in 0..m {
            view.set(i, i, true);
            for j in 0..i {
                if rng.gen_bool(0.5) {
                    view.set(i, j, true);
                }
            }
        }
        l
    }

    fn random_mat(rng: &mut StdRng, nrows: usize, ncols: usize) -> Mat {
        let mut m = Mat::zeros(nrows, ncols);
        let mut view = m.as_mut();
        for i in 0..nrows {
            for j in 0..ncols {
                if rng.gen_bool(0.5) {
                    view.set(i, j, true);
                }
            }
        }
        m
    }

    #[test]
    fn scenario_s5() {
        let mut rng = StdRng::seed_from_u64(5);
        let u = random_unit_upper(&mut rng, 128);
        let b = random_mat(&mut rng, 128, 256);
        let mut x = b.clone();
        trsm_upper_left(u.as_ref(), x.as_mut());
        let check = naive::multiply(u.as_ref(), x.as_ref());
        assert!(check == b);
    }

    #[test]
    fn lower_left_round_trips_through_naive() {
        let mut rng = StdRng::seed_from_u64(6);
        let l = random_unit_lower(&mut rng, 70);
        let b = random_mat(&mut rng, 70, 40);
        let mut x = b.clone();
        trsm_lower_left(l.as_ref(), x.as_mut());
        let check = naive::multiply(l.as_ref(), x.as_ref());
        assert!(check == b);
    }

    #[test]
    fn upper_right_solves_x_times_u() {
        let mut rng = StdRng::seed_from_u64(8);
        let u = random_unit_upper(&mut rng, 50);
        let b = random_mat(&mut rng, 17, 50);
        let mut x = b.clone();
        trsm_upper_right(u.as_ref(), x.as_mut());
        let check = naive::multiply(x.as_ref(), u.as_ref());
        assert!(check == b);
    }

    #[test]
    fn lower_right_solves_x_times_l() {
        let mut rng = StdRng::seed_from_u64(9);
        let l = random_unit_lower(&mut rng, 50);
        let b = random_mat(&mut rng, 17, 50);
        let mut x = b.clone();
        trsm_lower_right(l.as_ref(), x.as_mut());
        let check = naive::multiply(x.as_ref(), l.as_ref());
        assert!(check == b);
    }

    #[test]
    fn small_below_base_case_threshold() {
        let mut rng = StdRng::seed_from_u64(10);
        let u = random_unit_upper(&mut rng, 5);
        let b = random_mat(&mut rng, 5, 3);
        let mut x = b.clone();
        trsm_upper_left(u.as_ref(), x.as_mut());
        let check = naive::multiply(u.as_ref(), x.as_ref());
        assert!(check == b);
    }
}
