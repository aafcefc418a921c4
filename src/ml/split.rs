//! Train/validation partitioning.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::warn;

/// Row indices for each partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
    /// `false` when the split fell back to a plain shuffle.
    pub stratified: bool,
}

/// Why a stratified split cannot represent every class in both partitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StratifyError {
    #[error("class {class} has only {count} member(s); at least 2 are required")]
    TooFewMembers { class: usize, count: usize },
    #[error("{partition} partition of {size} rows cannot hold {classes} classes")]
    PartitionTooSmall {
        partition: &'static str,
        size: usize,
        classes: usize,
    },
}

/// Number of validation rows for `n` rows at `test_fraction`, rounded up.
pub fn validation_size(n: usize, test_fraction: f64) -> usize {
    ((n as f64) * test_fraction).ceil() as usize
}

/// Split per class so every class lands in both partitions.
pub fn stratified_split(
    y: &[usize],
    test_fraction: f64,
    rng: &mut StdRng,
) -> Result<SplitIndices, StratifyError> {
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, &class) in y.iter().enumerate() {
        by_class.entry(class).or_default().push(idx);
    }
    if let Some((&class, members)) = by_class.iter().find(|(_, members)| members.len() < 2) {
        return Err(StratifyError::TooFewMembers {
            class,
            count: members.len(),
        });
    }
    let n = y.len();
    let classes = by_class.len();
    let n_validation = validation_size(n, test_fraction);
    let n_train = n.saturating_sub(n_validation);
    if n_validation < classes {
        return Err(StratifyError::PartitionTooSmall {
            partition: "validation",
            size: n_validation,
            classes,
        });
    }
    if n_train < classes {
        return Err(StratifyError::PartitionTooSmall {
            partition: "train",
            size: n_train,
            classes,
        });
    }

    let mut train = Vec::with_capacity(n_train);
    let mut validation = Vec::with_capacity(n_validation);
    for (_class, mut members) in by_class {
        members.shuffle(rng);
        let count = members.len();
        let take = ((count as f64) * test_fraction).round() as usize;
        let take = take.clamp(1, count - 1);
        validation.extend_from_slice(&members[..take]);
        train.extend_from_slice(&members[take..]);
    }
    train.sort_unstable();
    validation.sort_unstable();
    Ok(SplitIndices {
        train,
        validation,
        stratified: true,
    })
}

/// Shuffle and cut, keeping at least one training row.
pub fn random_split(n: usize, test_fraction: f64, rng: &mut StdRng) -> SplitIndices {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    let n_validation = validation_size(n, test_fraction).min(n.saturating_sub(1));
    let mut validation = indices[..n_validation].to_vec();
    let mut train = indices[n_validation..].to_vec();
    train.sort_unstable();
    validation.sort_unstable();
    SplitIndices {
        train,
        validation,
        stratified: false,
    }
}

/// Stratified split with a non-stratified fallback when some class is too small.
pub fn train_validation_split(y: &[usize], test_fraction: f64, seed: u64) -> SplitIndices {
    let mut rng = StdRng::seed_from_u64(seed);
    match stratified_split(y, test_fraction, &mut rng) {
        Ok(split) => split,
        Err(err) => {
            warn!("Stratification failed: {err}. Falling back to non-stratified split.");
            random_split(y.len(), test_fraction, &mut rng)
        }
    }
}
