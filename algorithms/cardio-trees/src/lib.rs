//!
//! # Decision tree learning
//! `cardio-trees` provides pure Rust implementations of decision tree learning for the
//! cardiovascular-disease classifiers.
//!
//! Decision Trees (DTs) are a non-parametric supervised learning method used for classification.
//! The goal is to create a model that predicts the value of a target variable by learning simple
//! decision rules inferred from the data features.
//!
//! # Current state
//!
//! `cardio-trees` provides an [implementation](DecisionTree) of single-tree fitting for
//! classification with class probabilities, sample weights and per-split feature sampling, and a
//! [random forest](RandomForest) of bootstrapped trees grown in parallel.

mod decision_trees;

pub use decision_trees::*;

pub use decision_trees::random_forest::{RandomForest, RandomForestParams, RandomForestValidParams};

pub use cardio::error::Result;
