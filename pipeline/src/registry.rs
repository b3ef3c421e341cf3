//! The classifier families taking part in model selection

use std::fmt;

use cardio::ParamGuard;
use cardio_ensemble::{AdaBoost, GradientBoosting};
use cardio_logistic::LogisticRegression;
use cardio_trees::{DecisionTree, DecisionTreeParams, RandomForest, SplitQuality};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::model::ModelParams;
use crate::search_space::{get_count, get_float, get_text, Distribution, ParamSet, SearchSpace};

const LOGISTIC_MAX_ITERATIONS: u64 = 1000;

/// A classifier family with its hyperparameter search space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFamily {
    LogisticRegression,
    DecisionTree,
    RandomForest,
    AdaBoost,
    GradientBoosting,
    LeafwiseGradientBoosting,
}

impl ModelFamily {
    /// Every family, in the order they are trained and reported
    pub fn all() -> &'static [ModelFamily] {
        &[
            ModelFamily::LogisticRegression,
            ModelFamily::DecisionTree,
            ModelFamily::RandomForest,
            ModelFamily::AdaBoost,
            ModelFamily::GradientBoosting,
            ModelFamily::LeafwiseGradientBoosting,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelFamily::LogisticRegression => "Logistic Regression",
            ModelFamily::DecisionTree => "Decision Tree",
            ModelFamily::RandomForest => "Random Forest",
            ModelFamily::AdaBoost => "AdaBoost",
            ModelFamily::GradientBoosting => "Gradient Boosting",
            ModelFamily::LeafwiseGradientBoosting => "Leaf-wise Gradient Boosting",
        }
    }

    pub fn from_name(name: &str) -> Option<ModelFamily> {
        ModelFamily::all()
            .iter()
            .find(|family| family.name() == name.trim())
            .copied()
    }

    /// Position in [`ModelFamily::all`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Whether the fitted models report feature importances
    pub fn is_tree_based(&self) -> bool {
        !matches!(self, ModelFamily::LogisticRegression)
    }

    pub fn search_space(&self) -> SearchSpace {
        let criterion = || Distribution::choice(&["gini", "entropy"]);
        let int = |low, high| Distribution::IntUniform { low, high };
        let log_uniform = |low, high| Distribution::LogUniform { low, high };

        match self {
            ModelFamily::LogisticRegression => SearchSpace::new()
                .with("c", log_uniform(1e-4, 1e3))
                .with("penalty", Distribution::choice(&["l2"])),
            ModelFamily::DecisionTree => SearchSpace::new()
                .with("max_depth", int(3, 30))
                .with("min_samples_leaf", int(5, 500))
                .with("criterion", criterion()),
            ModelFamily::RandomForest => SearchSpace::new()
                .with("n_estimators", int(50, 500))
                .with("max_depth", int(5, 30))
                .with("min_samples_leaf", int(5, 500))
                .with("max_features", Distribution::Uniform { loc: 0.3, scale: 0.4 })
                .with("criterion", criterion()),
            ModelFamily::AdaBoost => SearchSpace::new()
                .with("n_estimators", int(50, 500))
                .with("learning_rate", log_uniform(1e-3, 1.0)),
            ModelFamily::GradientBoosting => boosting_space(),
            ModelFamily::LeafwiseGradientBoosting => boosting_space()
                .with("max_depth", int(3, 50))
                .with("num_leaves", int(20, 512)),
        }
    }

    /// Turn a sampled configuration into validated hyperparameters
    ///
    /// Every estimator is seeded with `seed`. Fails if a hyperparameter of the search space is
    /// missing, has the wrong kind or an invalid value.
    pub fn build(&self, params: &ParamSet, seed: u64) -> Result<ModelParams> {
        match self {
            ModelFamily::LogisticRegression => {
                let penalty = get_text(params, "penalty")?;
                if penalty != "l2" {
                    return Err(PipelineError::InvalidParam {
                        name: "penalty".to_string(),
                        reason: format!("only `l2` is supported, got `{}`", penalty),
                    });
                }
                let checked = LogisticRegression::params()
                    .c(get_float(params, "c")?)
                    .max_iterations(LOGISTIC_MAX_ITERATIONS)
                    .check()?;
                Ok(ModelParams::LogisticRegression(checked))
            }
            ModelFamily::DecisionTree => {
                let checked = tree_params(params, seed)?.check()?;
                Ok(ModelParams::DecisionTree(checked))
            }
            ModelFamily::RandomForest => {
                let max_features = get_float(params, "max_features")? as f32;
                let checked = RandomForest::params(get_count(params, "n_estimators")?)
                    .tree_params(tree_params(params, seed)?.max_features(Some(max_features)))
                    .seed(seed)
                    .check()?;
                Ok(ModelParams::RandomForest(checked))
            }
            ModelFamily::AdaBoost => {
                let checked = AdaBoost::params()
                    .n_estimators(get_count(params, "n_estimators")?)
                    .learning_rate(get_float(params, "learning_rate")?)
                    .weak_learner(DecisionTree::params().max_depth(Some(1)).seed(seed))
                    .check()?;
                Ok(ModelParams::AdaBoost(checked))
            }
            ModelFamily::GradientBoosting | ModelFamily::LeafwiseGradientBoosting => {
                let mut builder = GradientBoosting::params()
                    .n_estimators(get_count(params, "n_estimators")?)
                    .max_depth(Some(get_count(params, "max_depth")?))
                    .learning_rate(get_float(params, "learning_rate")?)
                    .colsample_bytree(get_float(params, "colsample_bytree")?)
                    .reg_alpha(get_float(params, "reg_alpha")?)
                    .reg_lambda(get_float(params, "reg_lambda")?)
                    .seed(seed);
                if *self == ModelFamily::LeafwiseGradientBoosting {
                    builder = builder.max_leaves(Some(get_count(params, "num_leaves")?));
                }
                Ok(ModelParams::GradientBoosting(builder.check()?))
            }
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn boosting_space() -> SearchSpace {
    SearchSpace::new()
        .with("n_estimators", Distribution::IntUniform { low: 50, high: 500 })
        .with("max_depth", Distribution::IntUniform { low: 3, high: 20 })
        .with("learning_rate", Distribution::LogUniform { low: 1e-3, high: 0.3 })
        .with("colsample_bytree", Distribution::Uniform { loc: 0.6, scale: 0.4 })
        .with("reg_alpha", Distribution::LogUniform { low: 1e-4, high: 10.0 })
        .with("reg_lambda", Distribution::LogUniform { low: 1e-4, high: 10.0 })
}

/// Decision tree hyperparameters shared by the single tree and the forest
///
/// With unit sample weights the minimum leaf weight is the minimum number of samples per leaf.
fn tree_params(params: &ParamSet, seed: u64) -> Result<DecisionTreeParams<f64, bool>> {
    let criterion = get_text(params, "criterion")?;
    let split_quality =
        SplitQuality::from_name(criterion).ok_or_else(|| PipelineError::InvalidParam {
            name: "criterion".to_string(),
            reason: format!("unknown split criterion `{}`", criterion),
        })?;
    let min_samples_leaf = get_count(params, "min_samples_leaf")? as f32;

    Ok(DecisionTree::params()
        .split_quality(split_quality)
        .max_depth(Some(get_count(params, "max_depth")?))
        .min_weight_leaf(min_samples_leaf)
        .min_weight_split(2.0 * min_samples_leaf)
        .seed(seed))
}
