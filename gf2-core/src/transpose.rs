//! Block transpose: sweep the source's 64x64 blocks and transpose each one
//! independently into its mirrored destination block (block `(i, j)` only
//! ever writes destination block `(j, i)`, so there's nothing to combine
//! across blocks and no reason to recurse to find that partition).

use crate::combine::{read_bits, write_bits};
use crate::matrix::{Mat, MatMut, MatRef};

/// Transposes an aligned 64x64 block in place using six mask-and-shift
/// passes — the textbook log-structured bit-block transpose.
fn transpose_64x64(block: &mut [u64; 64]) {
    const MASKS: [u64; 6] = [
        0x5555_5555_5555_5555,
        0x3333_3333_3333_3333,
        0x0F0F_0F0F_0F0F_0F0F,
        0x00FF_00FF_00FF_00FF,
        0x0000_FFFF_0000_FFFF,
        0x0000_0000_FFFF_FFFF,
    ];
    // For each power-of-two block size `j` from 32 down to 1, swap the
    // `j`-bit sub-blocks across the diagonal.
    let mut j = 32usize;
    let mut step = 5usize;
    while j != 0 {
        let mask = MASKS[step];
        let mut k = 0usize;
        while k < 64 {
            let mut l = k;
            while l < k + j {
                let t = (block[l] ^ (block[l + j] >> j)) & mask;
                block[l] ^= t;
                block[l + j] ^= t << j;
                l += 1;
            }
            k += 2 * j;
        }
        j >>= 1;
        step = step.wrapping_sub(1);
    }
}

/// Reads a (possibly partial, zero-padded) 64x64 block starting at
/// `(row0, col0)` into register form, transposes it, and writes the valid
/// portion back to `dst` at `(col0, row0)`.
fn transpose_block(src: MatRef<'_>, row0: usize, col0: usize, dst: &mut MatMut<'_>) {
    let rows = (src.nrows() - row0).min(64);
    let cols = (src.ncols() - col0).min(64);
    let mut block = [0u64; 64];
    for i in 0..rows {
        // bit `j` of `block[i]` holds `src(row0 + i, col0 + j)`; rows/cols
        // beyond the matrix's extent stay implicitly zero.
        block[i] = read_bits(src, row0 + i, col0, cols);
    }
    transpose_64x64(&mut block);
    for j in 0..cols {
        let bits = if rows == 64 { block[j] } else { block[j] & ((1u64 << rows) - 1) };
        write_bits(dst, col0 + j, row0, rows, bits);
    }
}

/// `dst = src^T`. `dst` must already be allocated with `dst.nrows() ==
/// src.ncols()` and `dst.ncols() == src.nrows()`.
pub fn transpose_into(src: MatRef<'_>, dst: &mut MatMut<'_>) {
    assert2::assert!(dst.nrows() == src.ncols() && dst.ncols() == src.nrows());
    let mut row0 = 0;
    while row0 < src.nrows() {
        let mut col0 = 0;
        while col0 < src.ncols() {
            transpose_block(src, row0, col0, dst);
            col0 += 64;
        }
        row0 += 64;
    }
}

pub fn transpose(src: MatRef<'_>) -> Mat {
    let mut dst = Mat::zeros(src.ncols(), src.nrows());
    {
        let mut dm = dst.as_mut();
        transpose_into(src, &mut dm);
    }
    dst
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;

    #[test]
    fn transpose_is_involution() {
        let mut m = Mat::zeros(37, 91);
        for i in 0..37 {
            m.as_mut().set(i, (i * 7 + 3) % 91, true);
        }
        let t = transpose(m.as_ref());
        let tt = transpose(t.as_ref());
        assert!(tt == m);
    }

    #[test]
    fn transpose_single_block_matches_naive() {
        let mut m = Mat::zeros(64, 64);
        for i in 0..64 {
            m.as_mut().set(i, 63 - i, true);
        }
        let t = transpose(m.as_ref());
        for i in 0..64 {
            for j in 0..64 {
                assert!(t.as_ref().get(i, j) == m.as_ref().get(j, i));
            }
        }
    }

    #[test]
    fn transpose_non_multiple_of_64() {
        let mut m = Mat::zeros(5, 130);
        m.as_mut().set(3, 129, true);
        m.as_mut().set(0, 0, true);
        let t = transpose(m.as_ref());
        assert!(t.as_ref().get(129, 3));
        assert!(t.as_ref().get(0, 0));
        assert!(t.nrows() == 130 && t.ncols() == 5);
    }
}
