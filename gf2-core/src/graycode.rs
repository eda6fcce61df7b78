//! Precomputed Gray-code sequences used by M4RM and the M4RI elimination
//! base case.
//!
//! For each `k` in `1..=MAXKAY` we keep the reflected-binary Gray code
//! `ord[0..2^k)` and, alongside it, the index of the single bit that flips
//! going from `ord[i]` to `ord[i + 1]`, `inc[i]`. Both tables are built once
//! and shared behind a `OnceLock`, mirroring the process-wide
//! lazily-initialized singleton called for in the design notes.

use std::sync::OnceLock;

/// Largest `k` for which a Gray-code table is precomputed.
pub const MAXKAY: usize = 10;

/// One entry of the Gray-code table family, for a fixed `k`.
#[derive(Debug, Clone)]
pub struct GrayCodeTable {
    pub k: usize,
    pub ord: Vec<u32>,
    pub inc: Vec<u32>,
}

impl GrayCodeTable {
    fn build(k: usize) -> Self {
        assert2::assert!(k >= 1 && k <= MAXKAY);
        let size = 1usize << k;
        let mut ord = vec![0u32; size];
        let mut inc = vec![0u32; size.saturating_sub(1).max(1)];
        for i in 0..size {
            ord[i] = ((i >> 1) ^ i) as u32;
        }
        for i in 0..size.saturating_sub(1) {
            inc[i] = (ord[i] ^ ord[i + 1]).trailing_zeros();
        }
        GrayCodeTable { k, ord, inc }
    }
}

/// All Gray-code tables for `k = 1..=MAXKAY`, indexed by `k - 1`.
pub struct GrayCodeTables {
    tables: Vec<GrayCodeTable>,
}

impl GrayCodeTables {
    fn build() -> Self {
        let tables = (1..=MAXKAY).map(GrayCodeTable::build).collect();
        GrayCodeTables { tables }
    }

    pub fn get(&self, k: usize) -> &GrayCodeTable {
        assert2::assert!(k >= 1 && k <= MAXKAY, "k out of range for Gray-code table");
        &self.tables[k - 1]
    }
}

static TABLES: OnceLock<GrayCodeTables> = OnceLock::new();

/// Returns the process-wide Gray-code table family, building it on first use.
pub fn tables() -> &'static GrayCodeTables {
    TABLES.get_or_init(GrayCodeTables::build)
}

/// Rebuilds a fresh (uncached) table family; used by tests to check that the
/// lazily-initialized singleton agrees with a from-scratch build.
#[cfg(test)]
pub fn force_rebuild() -> GrayCodeTables {
    GrayCodeTables::build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;

    #[test]
    fn consecutive_entries_differ_by_one_bit() {
        for k in 1..=MAXKAY {
            let t = &tables().get(k);
            let size = 1usize << k;
            assert!(t.ord.len() == size);
            assert!(t.inc.len() == size - 1 || size == 1);
            for i in 0..size - 1 {
                let diff = t.ord[i] ^ t.ord[i + 1];
                assert!(diff.count_ones() == 1);
                assert!(diff.trailing_zeros() == t.inc[i]);
            }
        }
    }

    #[test]
    fn cached_matches_from_scratch() {
        let fresh = force_rebuild();
        for k in 1..=MAXKAY {
            assert!(tables().get(k).ord == fresh.get(k).ord);
            assert!(tables().get(k).inc == fresh.get(k).inc);
        }
    }

    #[test]
    fn k_one_is_trivial() {
        let t = tables().get(1);
        assert!(t.ord == vec![0, 1]);
        assert!(t.inc == vec![0]);
    }
}
