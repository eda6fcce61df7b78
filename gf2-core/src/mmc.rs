//! A small free-list cache for the large, 16-byte-aligned word buffers that
//! M4RM tables and Strassen scratch blocks churn through.
//!
//! Not required for correctness (a bare allocator call satisfies every
//! contract in this crate); it exists purely to keep Strassen recursion from
//! round-tripping through the system allocator on every quadrant. Kept
//! behind a mutex, as spec.md §5 requires of all process-wide mutable state.

use std::sync::Mutex;

use crate::hooks;

const SLOTS: usize = 16;

struct Slot {
    words: usize,
    buf: Option<Box<[u64]>>,
}

struct Cache {
    slots: [Slot; SLOTS],
    hits: u64,
    misses: u64,
}

impl Cache {
    const fn new() -> Self {
        // `Slot` isn't `Copy`, so build the array by hand instead of using
        // the `[Slot::new(); SLOTS]` shorthand.
        const EMPTY: Slot = Slot { words: 0, buf: None };
        Cache {
            slots: [EMPTY; SLOTS],
            hits: 0,
            misses: 0,
        }
    }
}

static CACHE: Mutex<Cache> = Mutex::new(Cache::new());

/// A cached (or freshly allocated) buffer of `words` zeroed `u64`s, at least
/// 16-byte aligned. Returned to the cache with [`free`].
pub fn alloc(words: usize) -> Box<[u64]> {
    let mut cache = CACHE.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(slot) = cache.slots.iter_mut().find(|s| s.words == words && s.buf.is_some()) {
        let mut buf = slot.buf.take().unwrap();
        cache.hits += 1;
        buf.iter_mut().for_each(|w| *w = 0);
        tracing::debug!(words, "mmc hit");
        return buf;
    }
    cache.misses += 1;
    tracing::debug!(words, "mmc miss");
    drop(cache);

    let mut v = Vec::new();
    if v.try_reserve_exact(words).is_err() {
        hooks::die("gf2-core: out of memory allocating MMC block");
    }
    v.resize(words, 0u64);
    v.into_boxed_slice()
}

/// Returns a buffer to the cache, evicting the oldest entry of that size if
/// the cache is full (or keeping it if there's a free slot).
pub fn free(words: usize, buf: Box<[u64]>) {
    let mut cache = CACHE.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(slot) = cache.slots.iter_mut().find(|s| s.buf.is_none()) {
        slot.words = words;
        slot.buf = Some(buf);
        return;
    }
    // No empty slot: drop the buffer, it'll be reallocated on next miss.
}

/// Cumulative (hits, misses) since process start. Exposed for tests and
/// diagnostics, not part of the correctness contract.
pub fn stats() -> (u64, u64) {
    let cache = CACHE.lock().unwrap_or_else(|e| e.into_inner());
    (cache.hits, cache.misses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;

    #[test]
    fn roundtrip_reuses_buffer() {
        let (_, misses_before) = stats();
        let buf = alloc(37);
        assert!(buf.len() == 37);
        assert!(buf.iter().all(|&w| w == 0));
        free(37, buf);
        let buf2 = alloc(37);
        assert!(buf2.len() == 37);
        let (_, misses_after) = stats();
        // a same-size alloc immediately after a free should hit the cache,
        // not register as a new miss.
        assert!(misses_after == misses_before + 1);
        free(37, buf2);
    }

    #[test]
    fn alloc_is_always_zeroed() {
        let mut buf = alloc(8);
        buf.iter_mut().for_each(|w| *w = u64::MAX);
        free(8, buf);
        let buf2 = alloc(8);
        assert!(buf2.iter().all(|&w| w == 0));
        free(8, buf2);
    }
}
