//! Fixed set of scalar metrics for a binary classifier

use std::collections::BTreeMap;

use ndarray::{Array1, ArrayBase, ArrayView1, Data, Ix1, Ix2};

use crate::error::{Error, Result};
use crate::metrics_classification::{BinaryClassification, ToConfusionMatrix};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Accuracy, ROC AUC, precision, recall and F1 score of a set of predicted probabilities
///
/// Every value lies in [0, 1].
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsReport {
    pub accuracy: f64,
    pub auc: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

impl MetricsReport {
    /// Names of the reported metrics, in report order
    pub const KEYS: [&'static str; 5] = ["accuracy", "auc", "precision", "recall", "f1_score"];

    /// Compute the report from positive-class probabilities
    ///
    /// A sample is predicted positive iff its probability is strictly larger than `threshold`.
    /// Fails when the lengths differ or when `truth` holds a single class, because the ROC AUC is
    /// undefined then.
    pub fn from_scores<D: Data<Elem = f64>>(
        truth: &[bool],
        scores: &ArrayBase<D, Ix1>,
        threshold: f64,
    ) -> Result<MetricsReport> {
        if truth.len() != scores.len() {
            return Err(Error::LengthMismatch {
                expected: truth.len(),
                actual: scores.len(),
            });
        }

        let predicted = scores.mapv(|p| p > threshold);
        let cm = predicted.confusion_matrix(&ArrayView1::from(truth))?;
        let auc = scores.roc(truth)?.area_under_curve();

        Ok(MetricsReport {
            accuracy: cm.accuracy() as f64,
            auc,
            precision: cm.precision() as f64,
            recall: cm.recall() as f64,
            f1_score: cm.f1_score() as f64,
        })
    }

    /// Compute the report from a (nsamples, 2) probability matrix, column 1 is the positive class
    pub fn from_probabilities<D: Data<Elem = f64>>(
        truth: &[bool],
        probabilities: &ArrayBase<D, Ix2>,
        threshold: f64,
    ) -> Result<MetricsReport> {
        if probabilities.ncols() != 2 {
            return Err(Error::Parameters(format!(
                "expected probabilities of two classes, got {} columns",
                probabilities.ncols()
            )));
        }
        let positive: Array1<f64> = probabilities.column(1).to_owned();

        MetricsReport::from_scores(truth, &positive, threshold)
    }

    /// Returns a metric by name
    pub fn get(&self, key: &str) -> Option<f64> {
        match key {
            "accuracy" => Some(self.accuracy),
            "auc" => Some(self.auc),
            "precision" => Some(self.precision),
            "recall" => Some(self.recall),
            "f1_score" => Some(self.f1_score),
            _ => None,
        }
    }

    /// Returns the report as a mapping with exactly the five metric names as keys
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        vec![
            ("accuracy", self.accuracy),
            ("auc", self.auc),
            ("precision", self.precision),
            ("recall", self.recall),
            ("f1_score", self.f1_score),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}
