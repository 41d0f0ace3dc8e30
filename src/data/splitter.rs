// ============================================================
// Layer 4 — Train/Holdout Splitter
// ============================================================
// Shuffles row indices with a seeded RNG and splits them into:
//   - Training set: used to fit the classifier
//   - Holdout set:  used only to compute metrics
//
// The seed makes the split reproducible: the same rows and the
// same seed always yield the same partition.
//
// The holdout size is ceil(n * holdout_fraction), so a 20% split
// of 101 rows holds out 21.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom over a
// StdRng seeded with seed_from_u64.
//
// Reference: rand crate documentation

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and split into (train, holdout).
///
/// # Example
/// ```ignore
/// let (train, holdout) = split_train_holdout(rows, 0.2, 42);
/// // holdout has ceil(20%) of rows, train has the rest
/// ```
pub fn split_train_holdout<T>(mut samples: Vec<T>, holdout_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total   = samples.len();
    let holdout = ((total as f64) * holdout_fraction.clamp(0.0, 1.0)).ceil() as usize;
    let split_at = total - holdout.min(total);

    // split_off(n) leaves [0..n] in `samples` and returns [n..total]
    let held = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split (seed={}): {} training, {} holdout",
        seed,
        samples.len(),
        held.len(),
    );

    (samples, held)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, holdout) = split_train_holdout(items, 0.2, 42);
        assert_eq!(train.len(), 80);
        assert_eq!(holdout.len(), 20);
    }

    #[test]
    fn test_holdout_rounds_up() {
        let items: Vec<usize> = (0..101).collect();
        let (train, holdout) = split_train_holdout(items, 0.2, 42);
        assert_eq!(holdout.len(), 21);
        assert_eq!(train.len(), 80);
    }

    #[test]
    fn test_same_seed_same_partition() {
        let a = split_train_holdout((0..50).collect::<Vec<usize>>(), 0.3, 7);
        let b = split_train_holdout((0..50).collect::<Vec<usize>>(), 0.3, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize> = (0..50).collect();
        let (train, holdout) = split_train_holdout(items, 0.3, 1);
        let mut all: Vec<usize> = train.into_iter().chain(holdout).collect();
        all.sort();
        assert_eq!(all, (0..50).collect::<Vec<usize>>());
    }

    #[test]
    fn test_empty_dataset() {
        let (train, holdout) = split_train_holdout(Vec::<usize>::new(), 0.2, 42);
        assert!(train.is_empty());
        assert!(holdout.is_empty());
    }
}
