//! Stratified sampling of sample indices
//!
//! Both helpers group the indices by class, shuffle every group with the provided random number
//! generator and then distribute the groups independently. Classes are visited in ascending
//! order so a seeded generator always yields the same partition.
use std::collections::BTreeMap;

use rand::{seq::SliceRandom, Rng};

use super::Label;
use crate::error::{Error, Result};

fn group_by_class<L: Label + Ord, G: Rng>(labels: &[L], rng: &mut G) -> Vec<Vec<usize>> {
    let mut groups: BTreeMap<&L, Vec<usize>> = BTreeMap::new();
    for (idx, label) in labels.iter().enumerate() {
        groups.entry(label).or_default().push(idx);
    }

    groups
        .into_values()
        .map(|mut group| {
            group.shuffle(rng);
            group
        })
        .collect()
}

/// Split indices into (train, test) with `test_ratio` of every class in the test part
///
/// Both index lists are returned in ascending order.
pub fn stratified_split<L: Label + Ord, G: Rng>(
    labels: &[L],
    test_ratio: f32,
    rng: &mut G,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(Error::Parameters(format!(
            "test ratio should be in (0, 1), but was {}",
            test_ratio
        )));
    }

    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::with_capacity(labels.len());
    for group in group_by_class(labels, rng) {
        let ntest = (group.len() as f32 * test_ratio).round() as usize;
        test.extend_from_slice(&group[..ntest]);
        train.extend_from_slice(&group[ntest..]);
    }

    if train.is_empty() || test.is_empty() {
        return Err(Error::NotEnoughSamples(format!(
            "cannot split {} samples with test ratio {}",
            labels.len(),
            test_ratio
        )));
    }

    train.sort_unstable();
    test.sort_unstable();

    Ok((train, test))
}

/// Partition indices into `k` validation folds with equal class shares
///
/// The shuffled members of each class are dealt round-robin over the folds. The dealing position
/// carries over from one class to the next, so fold sizes differ by at most one.
pub fn stratified_folds<L: Label + Ord, G: Rng>(
    labels: &[L],
    k: usize,
    rng: &mut G,
) -> Result<Vec<Vec<usize>>> {
    if k < 2 {
        return Err(Error::Parameters(format!(
            "number of folds should be at least 2, but was {}",
            k
        )));
    }
    if labels.len() < k {
        return Err(Error::NotEnoughSamples(format!(
            "cannot build {} folds from {} samples",
            k,
            labels.len()
        )));
    }

    let mut folds = vec![Vec::with_capacity(labels.len() / k + 1); k];
    let mut position = 0;
    for group in group_by_class(labels, rng) {
        for idx in group {
            folds[position % k].push(idx);
            position += 1;
        }
    }

    folds.iter_mut().for_each(|fold| fold.sort_unstable());

    Ok(folds)
}
