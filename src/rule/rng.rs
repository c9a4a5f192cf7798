//! Seeded PRNG for faction draws. SplitMix64: fast, deterministic, not cryptographically secure.
//! Same seed produces the same selection, which keeps sweeps and tests reproducible.

const SPLITMIX64_GOLDEN: u64 = 0x9e3779b97f4a7c15;
const SPLITMIX64_M1: u64 = 0xbf58476d1ce4e5b9;
const SPLITMIX64_M2: u64 = 0x94d049bb133111eb;

#[derive(Debug, Clone, Copy)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from OS entropy. Falls back to the golden constant if the OS source is unavailable.
    pub fn from_entropy() -> Self {
        let mut buf = [0u8; 8];
        match getrandom::getrandom(&mut buf) {
            Ok(()) => Self::new(u64::from_le_bytes(buf)),
            Err(err) => {
                tracing::warn!(%err, "entropy source unavailable, using fixed seed");
                Self::new(SPLITMIX64_GOLDEN)
            }
        }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(SPLITMIX64_GOLDEN);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(SPLITMIX64_M1);
        z = (z ^ (z >> 27)).wrapping_mul(SPLITMIX64_M2);
        z ^ (z >> 31)
    }

    /// Uniform index in `0..bound`. Rejection sampling removes modulo bias.
    /// `bound` must be non-zero.
    pub fn next_below(&mut self, bound: usize) -> usize {
        debug_assert!(bound > 0, "next_below requires a non-zero bound");
        let bound = bound as u64;
        let zone = u64::MAX - (u64::MAX % bound);
        loop {
            let value = self.next_u64();
            if value < zone {
                return (value % bound) as usize;
            }
        }
    }

    /// Remove and return a uniformly chosen element. `None` when `items` is empty.
    pub fn pick_and_take<T>(&mut self, items: &mut Vec<T>) -> Option<T> {
        if items.is_empty() {
            return None;
        }
        let index = self.next_below(items.len());
        Some(items.swap_remove(index))
    }
}
