//! Glob import of the traits and containers needed to fit and evaluate a classifier

#[doc(no_inline)]
pub use crate::error::{Error, Result};

#[doc(no_inline)]
pub use crate::traits::*;

#[doc(no_inline)]
pub use crate::dataset::{
    AsTargets, Dataset, DatasetBase, DatasetView, Float, Label, Labels, Records, Select,
};

#[doc(no_inline)]
pub use crate::table::{Column, Table};

#[doc(no_inline)]
pub use crate::features::FeatureSet;

#[doc(no_inline)]
pub use crate::metrics_classification::{BinaryClassification, ConfusionMatrix, ToConfusionMatrix};

#[doc(no_inline)]
pub use crate::metrics_report::MetricsReport;

#[doc(no_inline)]
pub use crate::correlation::PearsonCorrelation;

#[doc(no_inline)]
pub use crate::param_guard::ParamGuard;
