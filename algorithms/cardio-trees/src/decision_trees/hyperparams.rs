use cardio::{
    error::{Error, Result},
    Float, Label, ParamGuard,
};
use std::marker::PhantomData;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::DecisionTree;

/// Impurity measure minimised when choosing a split
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitQuality {
    /// `1 - sum(p_k^2)` over the label frequencies `p_k` of a node
    Gini,
    /// `-sum(p_k * log2(p_k))`, so the best split maximises the information gain
    Entropy,
}

impl SplitQuality {
    /// Parses the criterion names `gini` and `entropy`
    pub fn from_name(name: &str) -> Option<SplitQuality> {
        match name {
            "gini" => Some(SplitQuality::Gini),
            "entropy" => Some(SplitQuality::Entropy),
            _ => None,
        }
    }
}

/// Checked settings of a [decision tree](struct.DecisionTree.html)
///
/// ### Example
///
/// ```rust
/// use cardio_trees::{DecisionTree, SplitQuality};
/// use cardio::prelude::*;
/// use ndarray::array;
///
/// let params = DecisionTree::params()
///     .split_quality(SplitQuality::Entropy)
///     .max_depth(Some(5))
///     .min_weight_leaf(1.);
///
/// let train = Dataset::new(array![[1.], [2.], [8.], [9.]], array![false, false, true, true]);
/// let tree = params.fit(&train).unwrap();
/// assert_eq!(tree.predict(train.records()), array![false, false, true, true]);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecisionTreeValidParams<F, L> {
    split_quality: SplitQuality,
    max_depth: Option<usize>,
    min_weight_split: f32,
    min_weight_leaf: f32,
    min_impurity_decrease: F,
    max_features: Option<f32>,
    seed: u64,

    label_marker: PhantomData<L>,
}

impl<F: Float, L> DecisionTreeValidParams<F, L> {
    pub fn split_quality(&self) -> SplitQuality {
        self.split_quality
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn min_weight_split(&self) -> f32 {
        self.min_weight_split
    }

    pub fn min_weight_leaf(&self) -> f32 {
        self.min_weight_leaf
    }

    pub fn min_impurity_decrease(&self) -> F {
        self.min_impurity_decrease
    }

    pub fn max_features(&self) -> Option<f32> {
        self.max_features
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecisionTreeParams<F, L>(DecisionTreeValidParams<F, L>);

impl<F: Float, L: Label> DecisionTreeParams<F, L> {
    pub fn new() -> Self {
        Self(DecisionTreeValidParams {
            split_quality: SplitQuality::Gini,
            max_depth: None,
            min_weight_split: 2.0,
            min_weight_leaf: 1.0,
            min_impurity_decrease: F::cast(0.00001),
            max_features: None,
            seed: 42,
            label_marker: PhantomData,
        })
    }

    /// Impurity measure of the splits
    pub fn split_quality(mut self, split_quality: SplitQuality) -> Self {
        self.0.split_quality = split_quality;
        self
    }

    /// Deepest level a node may be created on, unbounded with `None`
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.0.max_depth = max_depth;
        self
    }

    /// Nodes lighter than this are never split, for unweighted data the weight is a sample count
    pub fn min_weight_split(mut self, min_weight_split: f32) -> Self {
        self.0.min_weight_split = min_weight_split;
        self
    }

    /// Both children of a split must carry at least this weight
    pub fn min_weight_leaf(mut self, min_weight_leaf: f32) -> Self {
        self.0.min_weight_leaf = min_weight_leaf;
        self
    }

    /// Splits improving the weighted impurity by less are discarded
    pub fn min_impurity_decrease(mut self, min_impurity_decrease: F) -> Self {
        self.0.min_impurity_decrease = min_impurity_decrease;
        self
    }

    /// Sets the fraction of features drawn as split candidates at every node
    ///
    /// `None` considers every feature. A fraction `r` draws `ceil(r * nfeatures)` features without
    /// replacement, at least one.
    pub fn max_features(mut self, max_features: Option<f32>) -> Self {
        self.0.max_features = max_features;
        self
    }

    /// Sets the seed of the feature sampling, only used together with `max_features`
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }
}

impl<F: Float, L: Label> Default for DecisionTreeParams<F, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float, L: Label> DecisionTree<F, L> {
    /// Unbounded Gini tree splitting nodes of two or more samples on every feature
    #[allow(clippy::new_ret_no_self)]
    pub fn params() -> DecisionTreeParams<F, L> {
        DecisionTreeParams::new()
    }
}

impl<F: Float, L> ParamGuard for DecisionTreeParams<F, L> {
    type Checked = DecisionTreeValidParams<F, L>;
    type Error = Error;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.min_impurity_decrease < F::epsilon() {
            Err(Error::Parameters(format!(
                "Minimum impurity decrease should be greater than zero, but was {}",
                self.0.min_impurity_decrease
            )))
        } else if self.0.min_weight_leaf < 0.0 || self.0.min_weight_split < 0.0 {
            Err(Error::Parameters(format!(
                "Minimum weights should be non-negative, but were {} (split) and {} (leaf)",
                self.0.min_weight_split, self.0.min_weight_leaf
            )))
        } else if self.0.max_depth == Some(0) {
            Err(Error::Parameters(
                "Maximum depth should be at least one".to_string(),
            ))
        } else if let Some(ratio) = self.0.max_features.filter(|r| !(*r > 0.0 && *r <= 1.0)) {
            Err(Error::Parameters(format!(
                "Fraction of candidate features should be in (0, 1], but was {}",
                ratio
            )))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
