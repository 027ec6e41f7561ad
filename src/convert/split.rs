//! Train/validation partitioning of matched images.

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

/// How matched images are ordered before the split point is applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Keep input order: the first `train_len` items go to train.
    #[default]
    Sequential,
    /// Shuffle with a seeded RNG first; identical seeds give identical splits.
    Shuffled { seed: u64 },
}

/// Number of items assigned to train: `floor(ratio * len)`, capped at `len`.
///
/// A tolerance of 1e-9 absorbs binary rounding of the ratio, so
/// `0.85 * 20` yields 17 rather than 16.
pub fn train_len(len: usize, ratio: f64) -> usize {
    let raw = (ratio * len as f64 + 1e-9).floor();
    if raw <= 0.0 {
        0
    } else {
        (raw as usize).min(len)
    }
}

/// Splits `items` into `(train, val)`.
///
/// The two halves are disjoint and together contain every input item
/// exactly once.
pub fn split<T>(mut items: Vec<T>, ratio: f64, strategy: SplitStrategy) -> (Vec<T>, Vec<T>) {
    if let SplitStrategy::Shuffled { seed } = strategy {
        let mut rng = StdRng::seed_from_u64(seed);
        items.shuffle(&mut rng);
    }

    let cut = train_len(items.len(), ratio);
    let val = items.split_off(cut);
    (items, val)
}
