//!
//! `cardio` provides the shared building blocks for selecting a cardiovascular-disease classifier
//! from tabular patient measurements.
//!
//! # Current state
//!
//! The crate is organised like a small machine learning framework:
//!
//! * [`DatasetBase`](dataset::DatasetBase) couples records with targets, sample weights and
//!   feature names, plus seeded stratified splitting and K-folding
//! * [`Table`](table::Table) holds the processed patient table with typed columns and reads or
//!   writes delimited files
//! * [`FeatureSet`](features::FeatureSet) partitions the table columns into categorical and
//!   numeric features
//! * the traits [`Fit`](traits::Fit), [`Predict`](traits::Predict) and
//!   [`PredictProba`](traits::PredictProba) are implemented by the algorithm crates
//!   `cardio-trees`, `cardio-logistic`, `cardio-ensemble` and `cardio-preprocessing`
//! * [`metrics`] evaluates binary classifiers, [`correlation`], [`association`] and [`profile`]
//!   support the exploratory analysis

pub mod association;
pub mod correlation;
pub mod dataset;
pub mod error;
pub mod features;
mod metrics_classification;
mod metrics_report;
pub mod param_guard;
pub mod prelude;
pub mod profile;
pub mod table;
pub mod traits;

pub use dataset::{Dataset, DatasetBase, DatasetView, Float, Label};
pub use param_guard::ParamGuard;

/// Common metrics functions for classification
pub mod metrics {
    pub use crate::metrics_classification::{
        BinaryClassification, ConfusionMatrix, PrecisionRecallCurve,
        ReceiverOperatingCharacteristic, ToConfusionMatrix,
    };
    pub use crate::metrics_report::MetricsReport;
}
