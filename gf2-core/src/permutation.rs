//! Row/column permutations (spec.md §3 "Permutation P"): a sequence of
//! transpositions rather than an arbitrary bijection — `p[i] = j` means
//! "at step `i`, swap row/column `i` and `j`".

use crate::matrix::MatMut;

#[derive(Clone, Debug)]
pub struct Permutation {
    p: Vec<usize>,
}

impl Permutation {
    pub fn identity(n: usize) -> Self {
        Permutation { p: (0..n).collect() }
    }

    pub fn len(&self) -> usize {
        self.p.len()
    }

    pub fn is_empty(&self) -> bool {
        self.p.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.p
    }

    pub fn as_mut_slice(&mut self) -> &mut [usize] {
        &mut self.p
    }

    pub fn push_transposition(&mut self, at: usize, with: usize) {
        assert2::assert!(at < self.p.len());
        self.p[at] = with;
    }

    /// Applies the transposition sequence to the given matrix's rows,
    /// in program order: for `i = 0..len`, swap rows `i` and `p[i]`.
    pub fn apply_rows(&self, mut m: MatMut<'_>) {
        assert2::assert!(self.p.len() <= m.nrows());
        for (i, &j) in self.p.iter().enumerate() {
            m.swap_rows(i, j);
        }
    }

    /// Applies the transposition sequence to the given matrix's columns.
    pub fn apply_cols(&self, mut m: MatMut<'_>) {
        assert2::assert!(self.p.len() <= m.ncols());
        for (i, &j) in self.p.iter().enumerate() {
            m.swap_columns(i, j);
        }
    }

    /// Undoes [`Self::apply_rows`]: iterate the transposition sequence in
    /// reverse.
    pub fn apply_rows_inverse(&self, mut m: MatMut<'_>) {
        assert2::assert!(self.p.len() <= m.nrows());
        for (i, &j) in self.p.iter().enumerate().rev() {
            m.swap_rows(i, j);
        }
    }

    pub fn apply_cols_inverse(&self, mut m: MatMut<'_>) {
        assert2::assert!(self.p.len() <= m.ncols());
        for (i, &j) in self.p.iter().enumerate().rev() {
            m.swap_columns(i, j);
        }
    }

    /// Expands the transposition sequence into the permutation it realizes:
    /// `dst[i]` is the original row index now sitting at position `i`.
    pub fn to_mapping(&self) -> Vec<usize> {
        let mut mapping: Vec<usize> = (0..self.p.len()).collect();
        for (i, &j) in self.p.iter().enumerate() {
            mapping.swap(i, j);
        }
        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Mat;
    use assert2::assert;

    #[test]
    fn apply_then_inverse_is_identity() {
        let mut m = Mat::zeros(5, 5);
        for i in 0..5 {
            m.as_mut().set(i, i, true);
        }
        let before = m.clone();
        let mut perm = Permutation::identity(5);
        perm.push_transposition(0, 3);
        perm.push_transposition(1, 4);
        perm.push_transposition(2, 2);

        perm.apply_rows(m.as_mut());
        assert!(m != before);
        perm.apply_rows_inverse(m.as_mut());
        assert!(m == before);
    }

    #[test]
    fn to_mapping_matches_apply() {
        let mut perm = Permutation::identity(4);
        perm.push_transposition(0, 2);
        perm.push_transposition(1, 3);
        let mapping = perm.to_mapping();

        let mut m = Mat::zeros(4, 1);
        for i in 0..4 {
            m.as_mut().set(i, 0, i % 2 == 0);
        }
        let original = m.clone();
        perm.apply_rows(m.as_mut());
        for i in 0..4 {
            assert!(m.as_ref().get(i, 0) == original.as_ref().get(mapping[i], 0));
        }
    }
}
