use crate::error::{EnsembleError, Result};
use cardio::{Float, Label, ParamGuard};
use cardio_trees::{DecisionTree, DecisionTreeParams};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::AdaBoost;

/// The set of valid hyperparameters for the [AdaBoost](crate::AdaBoost) algorithm.
///
/// ## Parameters
///
/// * `n_estimators`: The maximum number of weak learners to train sequentially. Boosting stops
///   early when a learner fits the weighted data perfectly. Default: 50.
///
/// * `learning_rate`: Shrinks the contribution of each classifier. There is a trade-off between
///   `learning_rate` and `n_estimators`. Must be positive. Default: 1.0.
///
/// * `weak_learner`: The parameters of the decision tree fitted in every round, a stump of depth
///   one unless replaced.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdaBoostValidParams<F, L> {
    n_estimators: usize,
    learning_rate: f64,
    weak_learner: DecisionTreeParams<F, L>,
}

impl<F, L> AdaBoostValidParams<F, L> {
    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn weak_learner(&self) -> &DecisionTreeParams<F, L> {
        &self.weak_learner
    }
}

/// A helper struct for building [AdaBoost](crate::AdaBoost) hyperparameters.
///
/// ## Example
///
/// ```rust
/// use cardio_ensemble::AdaBoost;
///
/// let params = AdaBoost::<f64, bool>::params()
///     .n_estimators(100)
///     .learning_rate(0.5);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdaBoostParams<F, L>(AdaBoostValidParams<F, L>);

impl<F: Float, L: Label> AdaBoostParams<F, L> {
    /// Default values are 50 estimators, a learning rate of 1.0 and decision stumps
    pub fn new() -> Self {
        Self(AdaBoostValidParams {
            n_estimators: 50,
            learning_rate: 1.0,
            weak_learner: DecisionTree::params().max_depth(Some(1)),
        })
    }

    /// Set the maximum number of weak learners to train.
    pub fn n_estimators(mut self, n_estimators: usize) -> Self {
        self.0.n_estimators = n_estimators;
        self
    }

    /// Set the learning rate (shrinkage parameter).
    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.0.learning_rate = learning_rate;
        self
    }

    /// Replace the parameters of the weak learner
    pub fn weak_learner(mut self, weak_learner: DecisionTreeParams<F, L>) -> Self {
        self.0.weak_learner = weak_learner;
        self
    }
}

impl<F: Float, L: Label> Default for AdaBoostParams<F, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float, L: Label> AdaBoost<F, L> {
    // Violates the convention that new should return a value of type `Self`
    #[allow(clippy::new_ret_no_self)]
    pub fn params() -> AdaBoostParams<F, L> {
        AdaBoostParams::new()
    }
}

impl<F: Float, L> ParamGuard for AdaBoostParams<F, L> {
    type Checked = AdaBoostValidParams<F, L>;
    type Error = EnsembleError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.n_estimators == 0 {
            return Err(EnsembleError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if !(self.0.learning_rate > 0.0 && self.0.learning_rate.is_finite()) {
            return Err(EnsembleError::InvalidParameter(format!(
                "learning_rate must be positive and finite, got {}",
                self.0.learning_rate
            )));
        }
        self.0.weak_learner.check_ref()?;

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
