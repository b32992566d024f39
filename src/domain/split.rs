//! Combinatorial purged cross-validation splits.

use std::collections::HashSet;

use super::error::KestrelError;
use super::fluctuations::Fluctuations;

/// Train and test candle positions of one cross-validation fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train_indexes: Vec<usize>,
    pub test_indexes: Vec<usize>,
}

/// A collection of splits bound to the fluctuations they index into.
pub struct SplitManager {
    fluctuations: Fluctuations,
    splits: Vec<Split>,
}

impl SplitManager {
    pub fn new(fluctuations: Fluctuations, splits: Vec<Split>) -> Self {
        SplitManager {
            fluctuations,
            splits,
        }
    }

    pub fn len(&self) -> usize {
        self.splits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    /// Materialize the train and test fluctuations of one fold.
    pub fn get_split(&self, index: usize) -> Result<(Fluctuations, Fluctuations), KestrelError> {
        let split = &self.splits[index];
        let train = self.fluctuations.subset(&split.train_indexes)?;
        let test = self.fluctuations.subset(&split.test_indexes)?;
        Ok((train, test))
    }
}

/// Enumerate the ways of reserving `nb_test` of `nb_divisions` contiguous
/// portions for testing.
///
/// Each returned vector is an indicator over the portions, e.g. with four
/// divisions and two test portions: `[1, 1, 0, 0]`, `[1, 0, 1, 0]`,
/// `[1, 0, 0, 1]`, `[0, 1, 1, 0]`, `[0, 1, 0, 1]`, `[0, 0, 1, 1]`.
fn create_divisions(nb_divisions: usize, nb_test: usize) -> Vec<Vec<u8>> {
    if nb_test == 1 {
        return (0..nb_divisions)
            .map(|ii| {
                let mut row = vec![0; nb_divisions];
                row[ii] = 1;
                row
            })
            .collect();
    }

    let mut all_divisions = Vec::new();
    for ii in 0..=(nb_divisions - nb_test) {
        let mut base = vec![0; ii];
        base.push(1);
        for tail in create_divisions(nb_divisions - base.len(), nb_test - 1) {
            let mut division = base.clone();
            division.extend(tail);
            all_divisions.push(division);
        }
    }
    all_divisions
}

/// Convert a division indicator to concrete train and test indexes.
///
/// A purge margin of `purge_size` indexes on each side of every test block is
/// dropped from the train set to avoid leakage across the boundary.
fn division_to_split(division: &[u8], total_size: usize, purge_size: usize) -> Split {
    let division_size = total_size / division.len();
    let mut test_indexes = Vec::new();
    let mut purged: HashSet<usize> = HashSet::new();

    for (ii, &flag) in division.iter().enumerate() {
        if flag == 0 {
            continue;
        }
        let division_from = division_size * ii;
        let division_to = division_from + division_size;
        test_indexes.extend(division_from..division_to);

        let purge_from = division_from.saturating_sub(purge_size);
        let purge_to = (division_to + purge_size).min(total_size);
        purged.extend(purge_from..purge_to);
    }

    let train_indexes = (0..total_size).filter(|ii| !purged.contains(ii)).collect();
    test_indexes.sort_unstable();

    Split {
        train_indexes,
        test_indexes,
    }
}

/// Build the combinatorial purged cross-validation folds of `fluctuations`.
///
/// `test_size` is the overall ratio of candles reserved for testing and
/// `test_samples` the number of contiguous test portions per fold. The number
/// of divisions follows as `round(test_samples / test_size)`. The purge margin
/// is `round(len * purge_factor)` candles on each side of a test block.
///
/// Rejects geometries that cannot produce folds: `test_samples` of zero, a
/// non-positive `test_size`, or fewer divisions than test portions.
pub fn create_ccpv_splits(
    fluctuations: Fluctuations,
    test_size: f64,
    test_samples: usize,
    purge_factor: f64,
) -> Result<SplitManager, KestrelError> {
    if test_samples == 0 {
        return Err(KestrelError::ConfigInvalid {
            section: "optimize".into(),
            key: "test_samples".into(),
            reason: "must be at least 1".into(),
        });
    }
    if test_size <= 0.0 {
        return Err(KestrelError::ConfigInvalid {
            section: "optimize".into(),
            key: "test_size".into(),
            reason: "must be a positive ratio".into(),
        });
    }

    let nb_divisions = (test_samples as f64 / test_size).round() as usize;
    if nb_divisions < test_samples {
        return Err(KestrelError::ConfigInvalid {
            section: "optimize".into(),
            key: "test_size".into(),
            reason: format!(
                "leaves {nb_divisions} divisions for {test_samples} test portions"
            ),
        });
    }

    let purge_size = (fluctuations.len() as f64 * purge_factor).round() as usize;
    let total_size = fluctuations.len();

    let splits = create_divisions(nb_divisions, test_samples)
        .iter()
        .map(|division| division_to_split(division, total_size, purge_size))
        .collect();

    Ok(SplitManager::new(fluctuations, splits))
}
