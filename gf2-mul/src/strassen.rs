//! Strassen-Winograd block-recursive multiplication (spec.md §4.5): seven
//! recursive products and fifteen block additions over four quadrants,
//! falling back to M4RM below `cutoff` and peeling an odd row/column/shared
//! dimension with naive multiplication when the split isn't exact.

use gf2_core::matrix::{Mat, MatMut, MatRef};
use gf2_core::{combine, naive};

use crate::m4rm;
use crate::parallelism::Parallelism;

/// Below this many rows/cols/inner-dim, recursion bottoms out in M4RM.
/// Spec.md §4.5: `min((int)sqrt(4*L2)/2, 2048)`, L2 taken as 256 KiB — a
/// common desktop L2 size, absent a way to query the real cache at runtime.
pub fn default_cutoff() -> usize {
    const L2_BYTES: usize = 256 * 1024;
    let by_cache = ((4 * L2_BYTES) as f64).sqrt() as usize / 2;
    by_cache.min(2048).max(1)
}

/// Forking a recursive product onto another thread only pays off once its
/// smallest dimension clears this many rows.
const FORK_THRESHOLD: usize = 256;

/// `dst = A * B`, `dst` pre-zeroed by the caller.
pub fn multiply_into(dst: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>, cutoff: usize, parallelism: Parallelism) {
    assert2::assert!(a.ncols() == b.nrows());
    assert2::assert!(dst.nrows() == a.nrows() && dst.ncols() == b.ncols());
    assert2::debug_assert!(dst.rb_ref().is_zero());
    recurse(dst, a, b, cutoff, parallelism);
}

/// `A * B`, allocating the result.
pub fn multiply(a: MatRef<'_>, b: MatRef<'_>, cutoff: usize, parallelism: Parallelism) -> Mat {
    let mut dst = Mat::zeros(a.nrows(), b.ncols());
    multiply_into(dst.as_mut(), a, b, cutoff, parallelism);
    dst
}

fn recurse(mut dst: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>, cutoff: usize, parallelism: Parallelism) {
    let (m, k, n) = (a.nrows(), a.ncols(), b.ncols());
    if m < cutoff || k < cutoff || n < cutoff || m < 2 || k < 2 || n < 2 {
        m4rm::multiply_accumulate(dst, a, b, 0);
        return;
    }

    let m_even = m - (m % 2);
    let k_even = k - (k % 2);
    let n_even = n - (n % 2);

    strassen_core(
        dst.submatrix(0, 0, m_even, n_even),
        a.submatrix(0, 0, m_even, k_even),
        b.submatrix(0, 0, k_even, n_even),
        cutoff,
        parallelism,
    );

    if k_even != k {
        // Outer-product correction for the column of A / row of B left out
        // of the even-even block above.
        let a_tail = a.submatrix(0, k_even, m_even, 1);
        let b_tail = b.submatrix(k_even, 0, 1, n_even);
        let mut extra = Mat::zeros(m_even, n_even);
        naive::multiply_into(a_tail, b_tail, &mut extra.as_mut());
        combine::xor_assign(dst.submatrix(0, 0, m_even, n_even), extra.as_ref());
    }

    if n_even != n {
        // Last column of C, full (unpeeled) inner dimension, rows 0..m_even.
        let a_left = a.submatrix(0, 0, m_even, k);
        let b_last_col = b.submatrix(0, n_even, k, 1);
        let mut col = Mat::zeros(m_even, 1);
        naive::multiply_into(a_left, b_last_col, &mut col.as_mut());
        combine::copy_into(dst.submatrix(0, n_even, m_even, 1), col.as_ref());
    }

    if m_even != m {
        // Last row of C, full inner dimension and full column count.
        let a_last_row = a.submatrix(m_even, 0, 1, k);
        let mut last_row = Mat::zeros(1, n);
        naive::multiply_into(a_last_row, b, &mut last_row.as_mut());
        combine::copy_into(dst.submatrix(m_even, 0, 1, n), last_row.as_ref());
    }
}

fn maybe_join<FA, FB, RA, RB>(parallel: bool, a: FA, b: FB) -> (RA, RB)
where
    FA: FnOnce() -> RA + Send,
    FB: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    if parallel {
        rayon::join(a, b)
    } else {
        (a(), b())
    }
}

/// The Winograd schedule on four quadrants whose dimensions are already
/// even: four `S`-sums over `A`, four `T`-sums over `B`, seven recursive
/// products, and the combination into `C`'s four quadrants (spec.md §4.5).
fn strassen_core(mut dst: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>, cutoff: usize, parallelism: Parallelism) {
    let (mh, kh, nh) = (a.nrows() / 2, a.ncols() / 2, b.ncols() / 2);

    let a11 = a.submatrix(0, 0, mh, kh);
    let a12 = a.submatrix(0, kh, mh, kh);
    let a21 = a.submatrix(mh, 0, mh, kh);
    let a22 = a.submatrix(mh, kh, mh, kh);
    let b11 = b.submatrix(0, 0, kh, nh);
    let b12 = b.submatrix(0, nh, kh, nh);
    let b21 = b.submatrix(kh, 0, kh, nh);
    let b22 = b.submatrix(kh, nh, kh, nh);

    let mut s1 = Mat::zeros(mh, kh);
    combine::xor_into(s1.as_mut(), a21, a22);
    let mut s2 = Mat::zeros(mh, kh);
    combine::xor_into(s2.as_mut(), s1.as_ref(), a11);
    let mut s3 = Mat::zeros(mh, kh);
    combine::xor_into(s3.as_mut(), a11, a21);
    let mut s4 = Mat::zeros(mh, kh);
    combine::xor_into(s4.as_mut(), a12, s2.as_ref());

    let mut t1 = Mat::zeros(kh, nh);
    combine::xor_into(t1.as_mut(), b12, b11);
    let mut t2 = Mat::zeros(kh, nh);
    combine::xor_into(t2.as_mut(), b22, t1.as_ref());
    let mut t3 = Mat::zeros(kh, nh);
    combine::xor_into(t3.as_mut(), b22, b12);
    let mut t4 = Mat::zeros(kh, nh);
    combine::xor_into(t4.as_mut(), t2.as_ref(), b21);

    let mut p1 = Mat::zeros(mh, nh);
    let mut p2 = Mat::zeros(mh, nh);
    let mut p3 = Mat::zeros(mh, nh);
    let mut p4 = Mat::zeros(mh, nh);
    let mut p5 = Mat::zeros(mh, nh);
    let mut p6 = Mat::zeros(mh, nh);
    let mut p7 = Mat::zeros(mh, nh);

    let parallel = parallelism.should_fork(mh.min(kh).min(nh), FORK_THRESHOLD);
    maybe_join(
        parallel,
        || recurse(p1.as_mut(), a11, b11, cutoff, parallelism),
        || recurse(p2.as_mut(), a12, b21, cutoff, parallelism),
    );
    maybe_join(
        parallel,
        || recurse(p3.as_mut(), s4.as_ref(), b22, cutoff, parallelism),
        || recurse(p4.as_mut(), a22, t4.as_ref(), cutoff, parallelism),
    );
    maybe_join(
        parallel,
        || recurse(p5.as_mut(), s1.as_ref(), t1.as_ref(), cutoff, parallelism),
        || recurse(p6.as_mut(), s2.as_ref(), t2.as_ref(), cutoff, parallelism),
    );
    recurse(p7.as_mut(), s3.as_ref(), t3.as_ref(), cutoff, parallelism);

    let mut u2 = Mat::zeros(mh, nh);
    combine::xor_into(u2.as_mut(), p1.as_ref(), p6.as_ref());
    let mut u3 = Mat::zeros(mh, nh);
    combine::xor_into(u3.as_mut(), u2.as_ref(), p7.as_ref());
    let mut u4 = Mat::zeros(mh, nh);
    combine::xor_into(u4.as_mut(), u2.as_ref(), p5.as_ref());

    combine::xor_into(dst.submatrix(0, 0, mh, nh), p1.as_ref(), p2.as_ref());

    let mut u5 = Mat::zeros(mh, nh);
    combine::xor_into(u5.as_mut(), u4.as_ref(), p3.as_ref());
    combine::copy_into(dst.submatrix(0, nh, mh, nh), u5.as_ref());

    let mut u6 = Mat::zeros(mh, nh);
    combine::xor_into(u6.as_mut(), u3.as_ref(), p4.as_ref());
    combine::copy_into(dst.submatrix(mh, 0, mh, nh), u6.as_ref());

    let mut u7 = Mat::zeros(mh, nh);
    combine::xor_into(u7.as_mut(), u3.as_ref(), p5.as_ref());
    combine::copy_into(dst.submatrix(mh, nh, mh, nh), u7.as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;
    use gf2_core::naive;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_mat(rng: &mut StdRng, nrows: usize, ncols: usize, density: f64) -> Mat {
        let mut m = Mat::zeros(nrows, ncols);
        let mut view = m.as_mut();
        for i in 0..nrows {
            for j in 0..ncols {
                if rng.gen_bool(density) {
                    view.set(i, j, true);
                }
            }
        }
        m
    }

    #[test]
    fn matches_naive_small_cutoff_forces_recursion() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = random_mat(&mut rng, 17, 23, 0.4);
        let b = random_mat(&mut rng, 23, 11, 0.4);
        let expected = naive::multiply(a.as_ref(), b.as_ref());
        let got = multiply(a.as_ref(), b.as_ref(), 4, Parallelism::None);
        assert!(got == expected);
    }

    #[test]
    fn scenario_s4() {
        let mut rng = StdRng::seed_from_u64(19);
        let a = random_mat(&mut rng, 193, 65, 0.5);
        let b = random_mat(&mut rng, 65, 65, 0.5);
        let strassen = multiply(a.as_ref(), b.as_ref(), 64, Parallelism::None);
        let m4rm = m4rm::multiply(a.as_ref(), b.as_ref(), 10);
        assert!(strassen == m4rm);
    }

    #[test]
    fn handles_all_odd_dimensions() {
        let mut rng = StdRng::seed_from_u64(29);
        let a = random_mat(&mut rng, 15, 9, 0.5);
        let b = random_mat(&mut rng, 9, 13, 0.5);
        let expected = naive::multiply(a.as_ref(), b.as_ref());
        let got = multiply(a.as_ref(), b.as_ref(), 2, Parallelism::None);
        assert!(got == expected);
    }

    #[test]
    fn rayon_parallel_matches_sequential() {
        let mut rng = StdRng::seed_from_u64(31);
        let a = random_mat(&mut rng, 40, 40, 0.5);
        let b = random_mat(&mut rng, 40, 40, 0.5);
        let sequential = multiply(a.as_ref(), b.as_ref(), 4, Parallelism::None);
        let parallel = multiply(a.as_ref(), b.as_ref(), 4, Parallelism::Rayon(0));
        assert!(sequential == parallel);
    }

    #[test]
    fn default_cutoff_is_reasonable() {
        let c = default_cutoff();
        assert!(c >= 1 && c <= 2048);
    }
}
