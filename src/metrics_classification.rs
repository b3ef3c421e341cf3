//! Common metrics for performance evaluation of classifier
//!
//! Scoring is essential for classification and regression tasks. This module implements
//! common scoring functions like precision, accuracy, recall, f1-score, ROC and ROC
//! Area-Under-Curve.
use std::collections::HashMap;
use std::fmt;

use ndarray::prelude::*;
use ndarray::Data;

use crate::dataset::{AsTargets, Label};
use crate::error::{Error, Result};
use crate::Float;

/// Confusion matrix for multi-label evaluation
///
/// A confusion matrix shows predictions in a matrix, where rows correspond to target and columns
/// to predicted. The diagonal entries are correct predictions.
pub struct ConfusionMatrix<A> {
    matrix: Array2<f32>,
    members: Array1<A>,
}

impl<A: Label> ConfusionMatrix<A> {
    fn count(&self, truth: &A, predicted: &A) -> f32 {
        let idx = |x: &A| self.members.iter().position(|m| m == x);

        match (idx(truth), idx(predicted)) {
            (Some(i), Some(j)) => self.matrix[(i, j)],
            _ => 0.0,
        }
    }

    /// Return mean accuracy
    ///
    /// Ratio of correctly predicted samples, zero for an empty matrix
    pub fn accuracy(&self) -> f32 {
        let total = self.matrix.sum();
        if total > 0.0 {
            self.matrix.diag().sum() / total
        } else {
            0.0
        }
    }

    /// Returns the classes in the order of the matrix rows
    pub fn members(&self) -> &Array1<A> {
        &self.members
    }
}

/// Binary confusion matrix
///
/// The positive class is `true`. Metrics which would divide by zero are reported as zero.
impl ConfusionMatrix<bool> {
    pub fn true_positives(&self) -> f32 {
        self.count(&true, &true)
    }

    pub fn false_positives(&self) -> f32 {
        self.count(&false, &true)
    }

    pub fn false_negatives(&self) -> f32 {
        self.count(&true, &false)
    }

    pub fn true_negatives(&self) -> f32 {
        self.count(&false, &false)
    }

    /// Ratio of true positives among predicted positives
    pub fn precision(&self) -> f32 {
        ratio(
            self.true_positives(),
            self.true_positives() + self.false_positives(),
        )
    }

    /// Ratio of true positives among actual positives
    pub fn recall(&self) -> f32 {
        ratio(
            self.true_positives(),
            self.true_positives() + self.false_negatives(),
        )
    }

    /// Return the F-beta score
    pub fn f_score(&self, beta: f32) -> f32 {
        let sb = beta * beta;
        let p = self.precision();
        let r = self.recall();

        ratio((1.0 + sb) * (p * r), sb * p + r)
    }

    /// Return the F1 score
    pub fn f1_score(&self) -> f32 {
        self.f_score(1.0)
    }
}

fn ratio(num: f32, denom: f32) -> f32 {
    if denom > 0.0 {
        num / denom
    } else {
        0.0
    }
}

/// Print a confusion matrix
impl<A: fmt::Display> fmt::Debug for ConfusionMatrix<A> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let len = self.matrix.len_of(Axis(0));
        write!(f, "{:>10}", "")?;
        for member in self.members.iter() {
            write!(f, "{:>10}", member)?;
        }
        writeln!(f)?;
        for i in 0..len {
            write!(f, "{:>10}", self.members[i])?;
            for j in 0..len {
                write!(f, "{:>10}", self.matrix[(i, j)])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Classification functions
///
/// Contains only routine for Confusion Matrix, as all other current metrices can be derived from
/// the entries in the matrix.
pub trait ToConfusionMatrix<A, T> {
    fn confusion_matrix(&self, ground_truth: T) -> Result<ConfusionMatrix<A>>;
}

impl<L: Label + Ord, S: Data<Elem = L>, T: AsTargets<Elem = L>> ToConfusionMatrix<L, &T>
    for ArrayBase<S, Ix1>
{
    fn confusion_matrix(&self, ground_truth: &T) -> Result<ConfusionMatrix<L>> {
        let targets = ground_truth.as_targets();
        if targets.len() != self.len() {
            return Err(Error::LengthMismatch {
                expected: targets.len(),
                actual: self.len(),
            });
        }

        let mut classes = targets
            .iter()
            .chain(self.iter())
            .cloned()
            .collect::<Vec<_>>();
        classes.sort();
        classes.dedup();

        let indices = classes
            .iter()
            .enumerate()
            .map(|(idx, class)| (class, idx))
            .collect::<HashMap<_, _>>();

        let mut matrix = Array2::zeros((classes.len(), classes.len()));
        for (truth, predicted) in targets.iter().zip(self.iter()) {
            matrix[(indices[truth], indices[predicted])] += 1.0;
        }

        Ok(ConfusionMatrix {
            matrix,
            members: Array1::from(classes),
        })
    }
}

/// Integration using the trapezoidal rule.
fn trapezoidal<A: Float>(vals: &[(A, A)]) -> A {
    let mut prev_x = vals[0].0;
    let mut prev_y = vals[0].1;
    let mut integral = A::zero();

    for (x, y) in vals.iter().skip(1) {
        integral += (*x - prev_x) * (prev_y + *y) / A::cast(2.0);
        prev_x = *x;
        prev_y = *y;
    }
    integral
}

/// Positive and negative counts above every distinct score, highest score first
///
/// Samples sharing a score form a single step so that ties never depend on the sample order.
fn cumulative_counts<A: Float>(scores: &[A], y: &[bool]) -> Result<Vec<(A, A, A)>> {
    if scores.len() != y.len() {
        return Err(Error::LengthMismatch {
            expected: y.len(),
            actual: scores.len(),
        });
    }

    let mut tuples = scores
        .iter()
        .cloned()
        .zip(y.iter().cloned())
        .collect::<Vec<(A, bool)>>();
    tuples.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let (mut tp, mut fp) = (A::zero(), A::zero());
    let mut steps = Vec::new();
    for (idx, (score, truth)) in tuples.iter().enumerate() {
        if *truth {
            tp += A::one();
        } else {
            fp += A::one();
        }
        let last_of_tie = tuples.get(idx + 1).map(|x| x.0 != *score).unwrap_or(true);
        if last_of_tie {
            steps.push((*score, tp, fp));
        }
    }

    Ok(steps)
}

/// Receiver operating characteristic
///
/// The curve starts in (0, 0) and ends in (1, 1), every other point is the (false positive rate,
/// true positive rate) pair obtained when all samples with a score of at least the corresponding
/// threshold are predicted positive.
pub struct ReceiverOperatingCharacteristic<A> {
    curve: Vec<(A, A)>,
}

impl<A: Float> ReceiverOperatingCharacteristic<A> {
    pub fn get_curve(&self) -> Vec<(A, A)> {
        self.curve.clone()
    }

    pub fn area_under_curve(&self) -> A {
        trapezoidal(&self.curve)
    }
}

/// Precision and recall per decision threshold
///
/// Thresholds are the distinct scores in ascending order. A sample counts as predicted positive
/// when its score is strictly larger than the threshold, precision of an empty prediction is zero.
pub struct PrecisionRecallCurve<A> {
    pub thresholds: Vec<A>,
    pub precision: Vec<A>,
    pub recall: Vec<A>,
}

pub trait BinaryClassification<A> {
    /// Returns the ROC curve, fails if `y` contains a single class
    fn roc(&self, y: &[bool]) -> Result<ReceiverOperatingCharacteristic<A>>;

    /// Returns precision and recall for every distinct score used as threshold
    fn precision_recall(&self, y: &[bool]) -> Result<PrecisionRecallCurve<A>>;
}

/// The ROC curve gives insight about the seperability of a binary classification task. This
/// functions returns the ROC curve and threshold belonging to each position on the curve.
impl<A: Float, D: Data<Elem = A>> BinaryClassification<A> for ArrayBase<D, Ix1> {
    fn roc(&self, y: &[bool]) -> Result<ReceiverOperatingCharacteristic<A>> {
        let scores = self.to_vec();
        let steps = cumulative_counts(&scores, y)?;
        let (max_tp, max_fp) = steps
            .last()
            .map(|(_, tp, fp)| (*tp, *fp))
            .unwrap_or((A::zero(), A::zero()));
        if max_tp == A::zero() || max_fp == A::zero() {
            return Err(Error::SingleClass);
        }

        let mut curve = vec![(A::zero(), A::zero())];
        for (_, tp, fp) in steps {
            curve.push((fp / max_fp, tp / max_tp));
        }

        Ok(ReceiverOperatingCharacteristic { curve })
    }

    fn precision_recall(&self, y: &[bool]) -> Result<PrecisionRecallCurve<A>> {
        let scores = self.to_vec();
        let steps = cumulative_counts(&scores, y)?;
        let positives = y.iter().filter(|x| **x).count();
        if positives == 0 {
            return Err(Error::SingleClass);
        }
        let positives = A::cast(positives);

        let mut curve = PrecisionRecallCurve {
            thresholds: Vec::with_capacity(steps.len()),
            precision: Vec::with_capacity(steps.len()),
            recall: Vec::with_capacity(steps.len()),
        };
        // a threshold equal to the score of step i keeps every sample of the earlier steps
        let mut above = (A::zero(), A::zero());
        for (score, tp, fp) in steps {
            let (tp_above, fp_above) = above;
            let predicted = tp_above + fp_above;
            curve.thresholds.push(score);
            curve.precision.push(if predicted > A::zero() {
                tp_above / predicted
            } else {
                A::zero()
            });
            curve.recall.push(tp_above / positives);
            above = (tp, fp);
        }
        curve.thresholds.reverse();
        curve.precision.reverse();
        curve.recall.reverse();

        Ok(curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1};
    use rand::{distributions::Uniform, rngs::SmallRng, Rng, SeedableRng};

    #[test]
    fn test_confusion_matrix() {
        let predicted = array![false, true, false, true, false, true];
        let ground_truth = array![true, true, false, true, false, true];

        let cm = predicted.confusion_matrix(&ground_truth).unwrap();

        assert_eq!(cm.members(), &array![false, true]);
        assert_abs_diff_eq!(cm.true_positives(), 3.0);
        assert_abs_diff_eq!(cm.false_negatives(), 1.0);
        assert_abs_diff_eq!(cm.true_negatives(), 2.0);
        assert_abs_diff_eq!(cm.false_positives(), 0.0);
    }

    #[test]
    fn test_cm_metrics() {
        let predicted = array![false, true, false, true, false, true];
        let ground_truth = array![true, true, false, true, false, true];

        let cm = predicted.confusion_matrix(&ground_truth).unwrap();

        assert_abs_diff_eq!(cm.accuracy(), 5.0 / 6.0_f32, epsilon = 1e-5);
        assert_abs_diff_eq!(cm.precision(), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(cm.recall(), 0.75, epsilon = 1e-5);
        assert_abs_diff_eq!(cm.f1_score(), 6.0 / 7.0, epsilon = 1e-5);
    }

    #[test]
    fn no_positive_predictions_give_zero() {
        let predicted = array![false, false, false];
        let ground_truth = array![true, false, false];

        let cm = predicted.confusion_matrix(&ground_truth).unwrap();

        assert_abs_diff_eq!(cm.precision(), 0.0);
        assert_abs_diff_eq!(cm.recall(), 0.0);
        assert_abs_diff_eq!(cm.f1_score(), 0.0);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let predicted = array![false, true];
        let ground_truth = array![true, false, false];

        assert!(predicted.confusion_matrix(&ground_truth).is_err());
    }

    #[test]
    fn test_roc_curve() {
        let predicted = Array1::linspace(0.0, 1.0, 10);

        let groundtruth = vec![
            false, true, false, true, true, true, true, true, true, true,
        ];

        let result = &[
            (0.0, 0.0),
            (0.0, 0.125),
            (0.0, 0.25),
            (0.0, 0.375),
            (0.0, 0.5),
            (0.0, 0.625),
            (0.0, 0.75),
            (0.0, 0.875),
            (0.5, 0.875),
            (0.5, 1.0),
            (1.0, 1.0),
        ];

        let roc = predicted.roc(&groundtruth).unwrap();
        assert_eq!(roc.get_curve(), result);
        assert_abs_diff_eq!(roc.area_under_curve(), 0.9375, epsilon = 1e-10);
    }

    #[test]
    fn roc_handles_ties() {
        // all scores equal, the curve is the diagonal
        let predicted = array![0.5, 0.5, 0.5, 0.5];
        let roc = predicted.roc(&[true, false, true, false]).unwrap();

        assert_eq!(roc.get_curve(), vec![(0.0, 0.0), (1.0, 1.0)]);
        assert_abs_diff_eq!(roc.area_under_curve(), 0.5);
    }

    #[test]
    fn roc_single_class_is_undefined() {
        let predicted = array![0.1, 0.7, 0.4];

        assert!(matches!(
            predicted.roc(&[true, true, true]),
            Err(Error::SingleClass)
        ));
    }

    #[test]
    fn random_scores_give_chance_auc() {
        let mut rng = SmallRng::seed_from_u64(42);
        let predicted = Array1::from_shape_fn(10_000, |_| rng.sample(Uniform::new(0.0, 1.0)));
        let truth = (0..10_000).map(|_| rng.gen_bool(0.3)).collect::<Vec<_>>();

        let auc = predicted.roc(&truth).unwrap().area_under_curve();
        assert_abs_diff_eq!(auc, 0.5, epsilon = 0.03);
    }

    #[test]
    fn precision_recall_uses_strict_threshold() {
        let predicted = array![0.1, 0.4, 0.35, 0.8];
        let truth = [false, false, true, true];

        let curve = predicted.precision_recall(&truth).unwrap();

        assert_eq!(curve.thresholds, vec![0.1, 0.35, 0.4, 0.8]);
        // above 0.1: 0.35, 0.4, 0.8
        assert_abs_diff_eq!(curve.precision[0], 2.0 / 3.0);
        assert_abs_diff_eq!(curve.recall[0], 1.0);
        // above 0.35: 0.4, 0.8
        assert_abs_diff_eq!(curve.precision[1], 0.5);
        assert_abs_diff_eq!(curve.recall[1], 0.5);
        // above 0.8: nothing
        assert_abs_diff_eq!(curve.precision[3], 0.0);
        assert_abs_diff_eq!(curve.recall[3], 0.0);
    }
}
