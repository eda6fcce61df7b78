//! The three escape hatches spec.md §6 grants to callers: an allocator, an
//! RNG, and a "die" routine invoked on unrecoverable errors. Each is a
//! process-wide override, installed once before first use, exactly like the
//! Gray-code table and the MMC are process-wide singletons.

use std::sync::{Mutex, OnceLock};

type DieHook = dyn Fn(&str) + Send + Sync + 'static;
type RngHook = dyn Fn() -> u64 + Send + Sync + 'static;

static DIE_HOOK: OnceLock<Mutex<Box<DieHook>>> = OnceLock::new();
static RNG_HOOK: OnceLock<Mutex<Box<RngHook>>> = OnceLock::new();

fn die_hook_cell() -> &'static Mutex<Box<DieHook>> {
    DIE_HOOK.get_or_init(|| Mutex::new(Box::new(default_die)))
}

fn rng_hook_cell() -> &'static Mutex<Box<RngHook>> {
    RNG_HOOK.get_or_init(|| Mutex::new(Box::new(default_random_word)))
}

fn default_die(msg: &str) {
    tracing::error!(%msg, "gf2: fatal error");
    eprintln!("gf2: fatal error: {msg}");
    std::process::abort();
}

/// Installs a custom die hook. Overriding it to something that doesn't abort
/// (e.g. setting a thread-local flag and unwinding) turns fatal errors into
/// a recoverable long-jump escape, per spec.md §7.
pub fn set_die_hook<F>(hook: F)
where
    F: Fn(&str) + Send + Sync + 'static,
{
    *die_hook_cell().lock().unwrap_or_else(|e| e.into_inner()) = Box::new(hook);
}

/// Invokes the installed die hook. Out-of-memory, dimension mismatches in
/// high-level routines, and other unrecoverable conditions all funnel
/// through here rather than panicking directly, so an override can
/// intercept them.
pub fn die(msg: &str) -> ! {
    (die_hook_cell().lock().unwrap_or_else(|e| e.into_inner()))(msg);
    // the default hook aborts; a misbehaving override that returns still
    // must not let control fall back into the caller with invalid state.
    unreachable!("gf2 die hook returned without aborting or unwinding")
}

/// Raised by high-level entry points on shape mismatches.
pub fn dimension_mismatch(msg: &str) -> ! {
    die(msg)
}

/// A small 31-bit linear congruential generator, the same family POSIX
/// `random()` uses; three calls are composed into one 64-bit word by the
/// default RNG hook.
struct Lcg31(u64);

impl Lcg31 {
    const A: u64 = 1_103_515_245;
    const C: u64 = 12_345;
    const M: u64 = 1 << 31;

    fn next(&mut self) -> u32 {
        self.0 = (Self::A.wrapping_mul(self.0).wrapping_add(Self::C)) % Self::M;
        self.0 as u32
    }
}

fn default_random_word() -> u64 {
    thread_local! {
        static STATE: std::cell::RefCell<Lcg31> = std::cell::RefCell::new(Lcg31(seed()));
    }

    fn seed() -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9E37_79B9_7F4A_7C15)
            | 1
    }

    STATE.with(|s| {
        let mut lcg = s.borrow_mut();
        let hi = lcg.next() as u64 & 0x7FFF_FFFF;
        let mid = lcg.next() as u64 & 0x7FFF_FFFF;
        let lo = lcg.next() as u64 & 0x7FFF_FFFF;
        (hi << 33) ^ (mid << 2) ^ (lo >> 29) ^ lo
    })
}

/// Installs a custom RNG hook, replacing the default three-call 31-bit LCG
/// composition.
pub fn set_random_hook<F>(hook: F)
where
    F: Fn() -> u64 + Send + Sync + 'static,
{
    *rng_hook_cell().lock().unwrap_or_else(|e| e.into_inner()) = Box::new(hook);
}

/// Returns a uniformly distributed 64-bit value from the installed RNG hook.
pub fn random_word() -> u64 {
    (rng_hook_cell().lock().unwrap_or_else(|e| e.into_inner()))()
}
