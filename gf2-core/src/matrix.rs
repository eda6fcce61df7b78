//! The packed-bit dense matrix data model: an owned [`Mat`] plus the
//! non-owning [`MatRef`]/[`MatMut`] windows into it, following the teacher's
//! `Mat`/`MatRef`/`MatMut` split (with `reborrow` providing the short-lived
//! re-borrows that let the same `MatMut` be passed to several calls in
//! sequence without being consumed).
//!
//! A window never owns storage: it borrows the parent's word buffer for its
//! lifetime, so "the parent must outlive its windows" (spec.md §4.9) is
//! enforced by the Rust borrow checker rather than by a runtime invariant.

use reborrow::{Reborrow, ReborrowMut};

use crate::word::{get_bit, left_mask, right_mask, write_bit};

#[inline(always)]
fn width_for(offset: usize, ncols: usize) -> usize {
    if ncols == 0 {
        0
    } else {
        (offset + ncols + 63) / 64
    }
}

/// Masks that pin down which bits of a row's first/last word are load-bearing.
/// Bits outside `[offset, offset + ncols)` are don't-care (spec.md §3).
#[derive(Clone, Copy, Debug)]
struct RowMasks {
    low: u64,
    high: u64,
    width: usize,
}

impl RowMasks {
    fn new(offset: usize, ncols: usize) -> Self {
        let width = width_for(offset, ncols);
        let low = right_mask(64 - offset);
        let last_bit = (offset + ncols) % 64;
        let high = if width == 0 {
            0
        } else if width == 1 {
            low & left_mask(last_bit)
        } else {
            left_mask(last_bit)
        };
        RowMasks { low, high, width }
    }
}

/// An owned, row-major, bit-packed `nrows x ncols` matrix over GF(2).
#[derive(Clone)]
pub struct Mat {
    nrows: usize,
    ncols: usize,
    rowstride: usize,
    data: Box<[u64]>,
}

impl Mat {
    /// Allocates a zeroed `nrows x ncols` matrix (spec.md §4.9 `init`).
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        let rowstride = width_for(0, ncols);
        let data = crate::mmc::alloc(nrows * rowstride);
        Mat {
            nrows,
            ncols,
            rowstride,
            data,
        }
    }

    /// `set_ui`: scalar multiple of the identity. `value` must be 0 or 1.
    pub fn set_ui(nrows: usize, ncols: usize, value: u64) -> Self {
        let mut m = Self::zeros(nrows, ncols);
        if value & 1 == 1 {
            for i in 0..nrows.min(ncols) {
                m.as_mut().set(i, i, true);
            }
        }
        m
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn as_ref(&self) -> MatRef<'_> {
        MatRef {
            nrows: self.nrows,
            ncols: self.ncols,
            offset: 0,
            rowstride: self.rowstride,
            col_word: 0,
            data: &self.data,
        }
    }

    pub fn as_mut(&mut self) -> MatMut<'_> {
        MatMut {
            nrows: self.nrows,
            ncols: self.ncols,
            offset: 0,
            rowstride: self.rowstride,
            col_word: 0,
            data: &mut self.data,
        }
    }
}

impl std::fmt::Debug for Mat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_ref().fmt(f)
    }
}

impl PartialEq for Mat {
    fn eq(&self, other: &Self) -> bool {
        self.as_ref() == other.as_ref()
    }
}
impl Eq for Mat {}

/// An immutable, non-owning view into a matrix's storage.
#[derive(Clone, Copy)]
pub struct MatRef<'a> {
    nrows: usize,
    ncols: usize,
    offset: usize,
    rowstride: usize,
    col_word: usize,
    data: &'a [u64],
}

/// A mutable, non-owning view into a matrix's storage.
pub struct MatMut<'a> {
    nrows: usize,
    ncols: usize,
    offset: usize,
    rowstride: usize,
    col_word: usize,
    data: &'a mut [u64],
}

impl<'short, 'a> Reborrow<'short> for MatMut<'a> {
    type Target = MatRef<'short>;
    fn rb(&'short self) -> Self::Target {
        MatRef {
            nrows: self.nrows,
            ncols: self.ncols,
            offset: self.offset,
            rowstride: self.rowstride,
            col_word: self.col_word,
            data: self.data,
        }
    }
}

impl<'short, 'a> ReborrowMut<'short> for MatMut<'a> {
    type Target = MatMut<'short>;
    fn rb_mut(&'short mut self) -> Self::Target {
        MatMut {
            nrows: self.nrows,
            ncols: self.ncols,
            offset: self.offset,
            rowstride: self.rowstride,
            col_word: self.col_word,
            data: self.data,
        }
    }
}

macro_rules! shared_impl {
    ($t:ident) => {
        impl<'a> $t<'a> {
            pub fn nrows(&self) -> usize {
                self.nrows
            }
            pub fn ncols(&self) -> usize {
                self.ncols
            }
            pub fn offset(&self) -> usize {
                self.offset
            }
            /// Words between the start of consecutive rows, in the parent's
            /// storage (may exceed `width()`).
            pub fn rowstride(&self) -> usize {
                self.rowstride
            }
            pub fn width(&self) -> usize {
                width_for(self.offset, self.ncols)
            }
            fn masks(&self) -> RowMasks {
                RowMasks::new(self.offset, self.ncols)
            }
            pub fn row(&self, i: usize) -> &[u64] {
                assert2::assert!(i < self.nrows);
                let start = i * self.rowstride + self.col_word;
                &self.data[start..start + self.width()]
            }
            pub fn get(&self, i: usize, j: usize) -> bool {
                assert2::assert!(i < self.nrows && j < self.ncols);
                let row = self.row(i);
                let bitpos = self.offset + j;
                get_bit(row[bitpos / 64], bitpos % 64) == 1
            }
            pub fn is_zero(&self) -> bool {
                let masks = self.masks();
                (0..self.nrows).all(|i| {
                    let row = self.row(i);
                    row_is_zero(row, masks)
                })
            }
        }

        impl<'a> PartialEq for $t<'a> {
            fn eq(&self, other: &Self) -> bool {
                if self.nrows != other.nrows || self.ncols != other.ncols {
                    return false;
                }
                (0..self.nrows).all(|i| (0..self.ncols).all(|j| self.get(i, j) == other.get(i, j)))
            }
        }
        impl<'a> Eq for $t<'a> {}

        impl<'a> std::fmt::Debug for $t<'a> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                for i in 0..self.nrows {
                    for j in 0..self.ncols {
                        write!(f, "{}", u8::from(self.get(i, j)))?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
        }
    };
}

shared_impl!(MatRef);
shared_impl!(MatMut);

fn row_is_zero(row: &[u64], masks: RowMasks) -> bool {
    if row.is_empty() {
        return true;
    }
    if row.len() == 1 {
        return row[0] & masks.low & masks.high == 0;
    }
    if row[0] & masks.low != 0 {
        return false;
    }
    if row[row.len() - 1] & masks.high != 0 {
        return false;
    }
    row[1..row.len() - 1].iter().all(|&w| w == 0)
}

impl<'a> MatRef<'a> {
    /// A narrowed view sharing this view's storage (spec.md §3 "window").
    pub fn submatrix(&self, row0: usize, col0: usize, nrows: usize, ncols: usize) -> MatRef<'a> {
        assert2::assert!(row0 + nrows <= self.nrows && col0 + ncols <= self.ncols);
        let abs_col = self.offset + col0;
        MatRef {
            nrows,
            ncols,
            offset: abs_col % 64,
            rowstride: self.rowstride,
            col_word: self.col_word + abs_col / 64,
            data: &self.data[row0 * self.rowstride..],
        }
    }

    pub fn to_owned(&self) -> Mat {
        let mut out = Mat::zeros(self.nrows, self.ncols);
        crate::combine::copy_into(out.as_mut(), *self);
        out
    }
}

impl<'a> MatMut<'a> {
    /// Wraps a flat, tightly-packed (`offset == 0`) word buffer as a matrix
    /// view — used to turn scratch memory (e.g. a `dyn_stack::DynStack`
    /// carve-out) into a matrix without a further allocation.
    pub fn from_scratch(data: &'a mut [u64], nrows: usize, ncols: usize, rowstride: usize) -> Self {
        assert2::assert!(data.len() >= nrows * rowstride);
        assert2::assert!(rowstride >= width_for(0, ncols));
        MatMut {
            nrows,
            ncols,
            offset: 0,
            rowstride,
            col_word: 0,
            data,
        }
    }

    pub fn rb_ref(&self) -> MatRef<'_> {
        MatRef {
            nrows: self.nrows,
            ncols: self.ncols,
            offset: self.offset,
            rowstride: self.rowstride,
            col_word: self.col_word,
            data: self.data,
        }
    }

    pub fn submatrix(&mut self, row0: usize, col0: usize, nrows: usize, ncols: usize) -> MatMut<'_> {
        assert2::assert!(row0 + nrows <= self.nrows && col0 + ncols <= self.ncols);
        let abs_col = self.offset + col0;
        MatMut {
            nrows,
            ncols,
            offset: abs_col % 64,
            rowstride: self.rowstride,
            col_word: self.col_word + abs_col / 64,
            data: &mut self.data[row0 * self.rowstride..],
        }
    }

    /// Splits into top/bottom windows at row `r`, both borrowing disjoint
    /// halves of the same storage — the basis for divide-and-conquer
    /// recursion (spec.md §5 "disjoint windows ... may be mutated
    /// concurrently").
    pub fn split_rows_at(self, r: usize) -> (MatMut<'a>, MatMut<'a>) {
        assert2::assert!(r <= self.nrows);
        let (top, bot) = self.data.split_at_mut(r * self.rowstride);
        (
            MatMut {
                nrows: r,
                ncols: self.ncols,
                offset: self.offset,
                rowstride: self.rowstride,
                col_word: self.col_word,
                data: top,
            },
            MatMut {
                nrows: self.nrows - r,
                ncols: self.ncols,
                offset: self.offset,
                rowstride: self.rowstride,
                col_word: self.col_word,
                data: bot,
            },
        )
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [u64] {
        assert2::assert!(i < self.nrows);
        let width = self.width();
        let start = i * self.rowstride + self.col_word;
        &mut self.data[start..start + width]
    }

    /// Two distinct, simultaneously-mutable rows.
    pub fn two_rows_mut(&mut self, a: usize, b: usize) -> (&mut [u64], &mut [u64]) {
        assert2::assert!(a < self.nrows && b < self.nrows && a != b);
        let width = self.width();
        let col_word = self.col_word;
        let rowstride = self.rowstride;
        let (lo, hi, swap) = if a < b { (a, b, false) } else { (b, a, true) };
        let (left, right) = self.data.split_at_mut(hi * rowstride);
        let lo_row = &mut left[lo * rowstride + col_word..lo * rowstride + col_word + width];
        let hi_row = &mut right[col_word..col_word + width];
        if swap {
            (hi_row, lo_row)
        } else {
            (lo_row, hi_row)
        }
    }

    pub fn set(&mut self, i: usize, j: usize, value: bool) {
        assert2::assert!(i < self.nrows && j < self.ncols);
        let offset = self.offset;
        let row = self.row_mut(i);
        let bitpos = offset + j;
        row[bitpos / 64] = write_bit(row[bitpos / 64], bitpos % 64, value as u64);
    }

    /// Swaps rows `a` and `b`, masking don't-care bits out of the swap so
    /// they don't cross between rows (spec.md §4.2).
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let masks = self.masks();
        let (ra, rb) = self.two_rows_mut(a, b);
        for (x, y) in ra.iter_mut().zip(rb.iter_mut()) {
            std::mem::swap(x, y);
        }
        let _ = masks; // swapping whole words preserves each row's don't-care bits.
    }

    /// Swaps columns `c1` and `c2` across every row, per spec.md §4.2.
    pub fn swap_columns(&mut self, c1: usize, c2: usize) {
        if c1 == c2 {
            return;
        }
        let offset = self.offset;
        let (p, q) = (offset + c1, offset + c2);
        let (wp, bp) = (p / 64, p % 64);
        let (wq, bq) = (q / 64, q % 64);
        for i in 0..self.nrows {
            let row = self.row_mut(i);
            if wp == wq {
                row[wp] = crate::word::swap_bits_in_word(row[wp], bp, bq);
            } else {
                let vp = get_bit(row[wp], bp);
                let vq = get_bit(row[wq], bq);
                row[wp] = write_bit(row[wp], bp, vq);
                row[wq] = write_bit(row[wq], bq, vp);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;

    #[test]
    fn identity_layout_matches_scenario_s2() {
        let m = Mat::set_ui(3, 5, 1);
        let r = m.as_ref();
        let rows: Vec<String> = (0..3)
            .map(|i| (0..5).map(|j| if r.get(i, j) { '1' } else { '0' }).collect())
            .collect();
        assert!(rows == vec!["10000", "01000", "00100"]);
    }

    #[test]
    fn window_aliases_parent() {
        let mut m = Mat::zeros(4, 4);
        {
            let mut m_mut = m.as_mut();
            let mut w = m_mut.submatrix(1, 1, 2, 2);
            w.set(0, 0, true);
        }
        assert!(m.as_ref().get(1, 1));
    }

    #[test]
    fn disjoint_windows_do_not_alias() {
        let mut m = Mat::zeros(2, 130);
        let (mut top, mut bot) = m.as_mut().split_rows_at(1);
        top.set(0, 65, true);
        bot.set(0, 65, true);
        assert!(m.as_ref().get(0, 65));
        assert!(m.as_ref().get(1, 65));
        assert!(!m.as_ref().get(0, 64));
    }

    #[test]
    fn row_and_column_swap_roundtrip() {
        let mut m = Mat::zeros(3, 3);
        m.as_mut().set(0, 1, true);
        m.as_mut().swap_rows(0, 2);
        assert!(m.as_ref().get(2, 1));
        assert!(!m.as_ref().get(0, 1));
        m.as_mut().swap_columns(1, 2);
        assert!(m.as_ref().get(2, 2));
        assert!(!m.as_ref().get(2, 1));
    }

    #[test]
    fn excess_bits_seeded_with_garbage_do_not_leak() {
        let mut m = Mat::zeros(1, 5);
        m.data[0] |= !left_mask(5); // poison every don't-care bit in the only word.
        assert!(!m.as_ref().get(0, 0));
        for j in 0..5 {
            assert!(!m.as_ref().get(0, j));
        }
    }
}
