use crate::error::{EnsembleError, Result};
use cardio::{Float, Label, ParamGuard};
use std::marker::PhantomData;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::tree::TreeConfig;
use super::GradientBoosting;

/// The set of valid hyperparameters of [GradientBoosting](crate::GradientBoosting)
///
/// Trees minimize a second order approximation of the logistic loss. The leaf outputs are
/// regularized by `reg_alpha` (l1) and `reg_lambda` (l2), a split has to reduce the loss by more
/// than `min_split_gain`.
///
/// Without `max_leaves` every tree grows depth-wise up to `max_depth`. With a leaf budget the
/// tree is grown leaf-wise, always splitting the leaf with the largest loss reduction, until the
/// budget is spent.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientBoostingValidParams<F, L> {
    n_estimators: usize,
    learning_rate: f64,
    max_depth: Option<usize>,
    max_leaves: Option<usize>,
    min_child_weight: f64,
    min_samples_leaf: usize,
    reg_alpha: f64,
    reg_lambda: f64,
    min_split_gain: f64,
    subsample: f64,
    colsample_bytree: f64,
    seed: u64,

    marker: PhantomData<(F, L)>,
}

impl<F, L> GradientBoostingValidParams<F, L> {
    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn max_leaves(&self) -> Option<usize> {
        self.max_leaves
    }

    pub fn min_child_weight(&self) -> f64 {
        self.min_child_weight
    }

    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    pub fn reg_alpha(&self) -> f64 {
        self.reg_alpha
    }

    pub fn reg_lambda(&self) -> f64 {
        self.reg_lambda
    }

    pub fn min_split_gain(&self) -> f64 {
        self.min_split_gain
    }

    pub fn subsample(&self) -> f64 {
        self.subsample
    }

    pub fn colsample_bytree(&self) -> f64 {
        self.colsample_bytree
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub(crate) fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            max_depth: self.max_depth,
            max_leaves: self.max_leaves,
            min_child_weight: self.min_child_weight,
            min_samples_leaf: self.min_samples_leaf,
            reg_alpha: self.reg_alpha,
            reg_lambda: self.reg_lambda,
            min_split_gain: self.min_split_gain,
            shrinkage: self.learning_rate,
        }
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientBoostingParams<F, L>(GradientBoostingValidParams<F, L>);

impl<F: Float, L: Label> GradientBoostingParams<F, L> {
    pub fn new() -> Self {
        Self(GradientBoostingValidParams {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: Some(6),
            max_leaves: None,
            min_child_weight: 1.0,
            min_samples_leaf: 1,
            reg_alpha: 0.0,
            reg_lambda: 1.0,
            min_split_gain: 0.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            seed: 42,
            marker: PhantomData,
        })
    }

    /// Sets the number of boosting rounds
    pub fn n_estimators(mut self, n_estimators: usize) -> Self {
        self.0.n_estimators = n_estimators;
        self
    }

    /// Sets the shrinkage applied to every tree output
    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.0.learning_rate = learning_rate;
        self
    }

    /// Sets the optional depth limit of every tree
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.0.max_depth = max_depth;
        self
    }

    /// Sets the optional leaf budget of every tree, switching to leaf-wise growth
    pub fn max_leaves(mut self, max_leaves: Option<usize>) -> Self {
        self.0.max_leaves = max_leaves;
        self
    }

    /// Sets the minimum sum of hessians in a child
    pub fn min_child_weight(mut self, min_child_weight: f64) -> Self {
        self.0.min_child_weight = min_child_weight;
        self
    }

    /// Sets the minimum number of samples in a child
    pub fn min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.0.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Sets the l1 regularization of the leaf outputs
    pub fn reg_alpha(mut self, reg_alpha: f64) -> Self {
        self.0.reg_alpha = reg_alpha;
        self
    }

    /// Sets the l2 regularization of the leaf outputs
    pub fn reg_lambda(mut self, reg_lambda: f64) -> Self {
        self.0.reg_lambda = reg_lambda;
        self
    }

    /// Sets the loss reduction a split has to exceed
    pub fn min_split_gain(mut self, min_split_gain: f64) -> Self {
        self.0.min_split_gain = min_split_gain;
        self
    }

    /// Sets the fraction of rows drawn without replacement for every tree
    pub fn subsample(mut self, subsample: f64) -> Self {
        self.0.subsample = subsample;
        self
    }

    /// Sets the fraction of features drawn without replacement for every tree
    pub fn colsample_bytree(mut self, colsample_bytree: f64) -> Self {
        self.0.colsample_bytree = colsample_bytree;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }
}

impl<F: Float, L: Label> Default for GradientBoostingParams<F, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float, L: Label> GradientBoosting<F, L> {
    /// Defaults are 100 rounds with learning rate 0.1, depth-wise trees of depth at most 6,
    /// `min_child_weight = 1`, `reg_lambda = 1`, no l1 penalty, no row or feature sampling and
    /// seed 42.
    // Violates the convention that new should return a value of type `Self`
    #[allow(clippy::new_ret_no_self)]
    pub fn params() -> GradientBoostingParams<F, L> {
        GradientBoostingParams::new()
    }
}

fn fraction(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(EnsembleError::InvalidParameter(format!(
            "{} should be in (0, 1], but was {}",
            name, value
        )))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(EnsembleError::InvalidParameter(format!(
            "{} should be non-negative, but was {}",
            name, value
        )))
    }
}

impl<F, L> ParamGuard for GradientBoostingParams<F, L> {
    type Checked = GradientBoostingValidParams<F, L>;
    type Error = EnsembleError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let p = &self.0;
        if p.n_estimators == 0 {
            return Err(EnsembleError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if !(p.learning_rate > 0.0 && p.learning_rate.is_finite()) {
            return Err(EnsembleError::InvalidParameter(format!(
                "learning_rate must be positive and finite, got {}",
                p.learning_rate
            )));
        }
        if p.max_depth == Some(0) {
            return Err(EnsembleError::InvalidParameter(
                "max_depth should be at least one".to_string(),
            ));
        }
        if let Some(leaves) = p.max_leaves.filter(|l| *l < 2) {
            return Err(EnsembleError::InvalidParameter(format!(
                "max_leaves should be at least two, but was {}",
                leaves
            )));
        }
        non_negative("min_child_weight", p.min_child_weight)?;
        non_negative("reg_alpha", p.reg_alpha)?;
        non_negative("reg_lambda", p.reg_lambda)?;
        non_negative("min_split_gain", p.min_split_gain)?;
        fraction("subsample", p.subsample)?;
        fraction("colsample_bytree", p.colsample_bytree)?;

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
