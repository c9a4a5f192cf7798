//! Seed partitioning for outcome sweeps.
//!
//! A sweep of `runs` rounds is cut into contiguous seed windows so each rayon task
//! owns one window and reports it back in order.

use serde::Serialize;

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Earlier ranges take the remainder, so sizes differ by at most one.
///
/// ```
/// # use cultists::parallel::batch_ranges;
/// assert_eq!(batch_ranges(10, 3), vec![(0, 4), (4, 7), (7, 10)]);
/// ```
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = num_batches.min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut start = 0;
    (0..num_batches)
        .map(|index| {
            let end = start + base + usize::from(index < remainder);
            let range = (start, end);
            start = end;
            range
        })
        .collect()
}

/// A contiguous window of round seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedBatch {
    pub index: usize,
    pub first_seed: u64,
    pub len: usize,
}

impl SeedBatch {
    pub fn seeds(&self) -> impl Iterator<Item = u64> {
        let first = self.first_seed;
        (0..self.len as u64).map(move |offset| first.wrapping_add(offset))
    }
}

/// Windows covering `base_seed .. base_seed + runs`.
pub fn seed_batches(base_seed: u64, runs: usize, num_batches: usize) -> Vec<SeedBatch> {
    batch_ranges(runs, num_batches)
        .into_iter()
        .enumerate()
        .map(|(index, (start, end))| SeedBatch {
            index,
            first_seed: base_seed.wrapping_add(start as u64),
            len: end - start,
        })
        .collect()
}
