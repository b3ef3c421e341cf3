//!
//! # Boosted ensembles
//! `cardio-ensemble` provides the boosted tree classifiers of the cardiovascular-disease
//! pipeline.
//!
//! * [AdaBoost] fits a sequence of shallow [decision trees](cardio_trees::DecisionTree) on
//!   reweighted samples, every tree focusing on the samples its predecessors got wrong.
//! * [GradientBoosting] fits regression trees on the gradients of the logistic loss. Trees grow
//!   depth-wise, or leaf-wise when a leaf budget is set.
//!
//! ## Example
//!
//! ```rust
//! use cardio::prelude::*;
//! use cardio_ensemble::GradientBoosting;
//! use ndarray::array;
//!
//! let dataset = Dataset::new(
//!     array![[0.1], [0.4], [0.35], [0.8], [0.9], [0.75]],
//!     array![false, false, false, true, true, true],
//! );
//! let model = GradientBoosting::params()
//!     .n_estimators(20)
//!     .min_child_weight(0.0)
//!     .fit(&dataset)
//!     .unwrap();
//! let predictions = model.predict(dataset.records());
//! assert_eq!(predictions, dataset.targets());
//! ```

mod adaboost;
pub mod error;
mod gradient_boosting;

pub use adaboost::*;
pub use error::{EnsembleError, Result};
pub use gradient_boosting::*;
