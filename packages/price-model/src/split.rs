//! Seeded train/test partitioning.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{TrainError, TrainResult};

/// Smallest dataset that can be split into two non-empty parts.
pub const MIN_SPLIT_ROWS: usize = 2;

/// Rows assigned to fitting and to evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit<T> {
    pub train: Vec<T>,
    pub test: Vec<T>,
}

/// Number of held-out rows: `ceil(n * fraction)`, clamped to `1..n`.
pub fn test_size(n: usize, fraction: f64) -> usize {
    let wanted = (n as f64 * fraction).ceil() as usize;
    wanted.clamp(1, n.saturating_sub(1).max(1))
}

/// Shuffle with a ChaCha8 stream seeded by `seed` and cut off the test rows.
///
/// The same input, fraction, and seed always give the same split.
pub fn train_test_split<T: Clone>(
    rows: &[T],
    test_fraction: f64,
    seed: u64,
) -> TrainResult<TrainTestSplit<T>> {
    if rows.len() < MIN_SPLIT_ROWS {
        return Err(TrainError::InsufficientRows {
            needed: MIN_SPLIT_ROWS,
            got: rows.len(),
        });
    }

    let mut order: Vec<usize> = (0..rows.len()).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let n_test = test_size(rows.len(), test_fraction);
    let (test_idx, train_idx) = order.split_at(n_test);

    Ok(TrainTestSplit {
        train: train_idx.iter().map(|&i| rows[i].clone()).collect(),
        test: test_idx.iter().map(|&i| rows[i].clone()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eighty_twenty_on_hundred_rows() {
        let rows: Vec<u32> = (0..100).collect();
        let split = train_test_split(&rows, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 20);
        assert_eq!(split.train.len(), 80);

        let mut all: Vec<u32> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, rows);
    }

    #[test]
    fn same_seed_same_split() {
        let rows: Vec<u32> = (0..37).collect();
        let a = train_test_split(&rows, 0.2, 42).unwrap();
        let b = train_test_split(&rows, 0.2, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn both_sides_stay_non_empty() {
        assert_eq!(test_size(2, 0.2), 1);
        assert_eq!(test_size(3, 0.99), 2);
        assert_eq!(test_size(11, 0.2), 3);

        let split = train_test_split(&[1, 2], 0.2, 42).unwrap();
        assert_eq!(split.train.len(), 1);
        assert_eq!(split.test.len(), 1);
    }

    #[test]
    fn single_row_cannot_be_split() {
        let err = train_test_split(&[1], 0.2, 42).unwrap_err();
        assert!(matches!(err, TrainError::InsufficientRows { needed: 2, got: 1 }));
    }
}
