//! Train/test partitioning of motion datasets.
//!
//! One shuffled index set is drawn per call and applied to every motion type,
//! so position `i` refers to the same physical trial in every sequence.

use crate::error::{PipelineError, Result};
use crate::record::Dataset;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Index positions selected for each side of a split, in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Choose train and test positions for `n` records.
///
/// The first `round(n * train_fraction)` entries of a shuffled `0..n` go to
/// train and the rest to test.
pub fn split_indices<R: Rng + ?Sized>(
    n: usize,
    train_fraction: f64,
    rng: &mut R,
) -> Result<SplitIndices> {
    check_fraction(train_fraction)?;

    let train_size = ((n as f64 * train_fraction).round() as usize).min(n);
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mut test = order.split_off(train_size);
    let mut train = order;
    train.sort_unstable();
    test.sort_unstable();

    Ok(SplitIndices { train, test })
}

/// Split every motion type of `dataset` with the same index selection.
///
/// All sequences must have the same length. Records keep their relative
/// order within each side.
pub fn split<T: Clone, R: Rng + ?Sized>(
    dataset: &Dataset<T>,
    train_fraction: f64,
    rng: &mut R,
) -> Result<(Dataset<T>, Dataset<T>)> {
    check_fraction(train_fraction)?;

    let n = check_lengths(dataset)?;
    let indices = split_indices(n, train_fraction, rng)?;

    let mut train = Dataset::new();
    let mut test = Dataset::new();
    for (motion, records) in dataset {
        train.insert(motion.clone(), select(records, &indices.train));
        test.insert(motion.clone(), select(records, &indices.test));
    }

    debug!(train = ?indices.train, test = ?indices.test, "split indices");
    info!(
        motions = dataset.len(),
        records_per_motion = n,
        train = indices.train.len(),
        test = indices.test.len(),
        "split dataset"
    );

    Ok((train, test))
}

/// Split with a generator seeded from `seed`, for reproducible partitions.
pub fn split_seeded<T: Clone>(
    dataset: &Dataset<T>,
    train_fraction: f64,
    seed: u64,
) -> Result<(Dataset<T>, Dataset<T>)> {
    let mut rng = StdRng::seed_from_u64(seed);
    split(dataset, train_fraction, &mut rng)
}

fn check_fraction(train_fraction: f64) -> Result<()> {
    if train_fraction > 0.0 && train_fraction <= 1.0 {
        Ok(())
    } else {
        Err(PipelineError::InvalidTrainFraction(train_fraction))
    }
}

/// Length shared by every motion sequence; the first key is the reference.
fn check_lengths<T>(dataset: &Dataset<T>) -> Result<usize> {
    let Some((_, reference)) = dataset.iter().next() else {
        return Ok(0);
    };
    let expected = reference.len();

    for (motion, records) in dataset {
        if records.len() != expected {
            return Err(PipelineError::InconsistentDatasetLength {
                motion: motion.clone(),
                expected,
                actual: records.len(),
            });
        }
    }
    Ok(expected)
}

fn select<T: Clone>(records: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| records[i].clone()).collect()
}
