use crate::error::{EnsembleError, Result};
use cardio::prelude::{
    AsTargets, DatasetBase, Fit, Float, Label, Labels, Predict, PredictInplace, PredictProba,
};
use cardio_trees::DecisionTree;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::AdaBoostValidParams;

/// A fitted AdaBoost ensemble classifier.
///
/// ## Structure
///
/// AdaBoost (Adaptive Boosting) combines multiple weak learners into a strong classifier.
/// Learners are trained sequentially, and each new learner focuses on the samples that
/// previous learners misclassified through increased sample weights.
///
/// Each fitted tree has an associated weight (alpha) that represents its contribution to the
/// final prediction. Trees with a lower weighted error receive higher weights.
///
/// ## Algorithm Overview
///
/// The multi-class SAMME variant is used, which reduces to the discrete AdaBoost for two classes:
/// 1. Initialize sample weights uniformly
/// 2. For each round:
///    a. Fit a decision tree on the weighted training data
///    b. Compute the weighted error rate `err`
///    c. Compute the tree weight `alpha = learning_rate * (ln((1 - err) / err) + ln(K - 1))`
///    d. Multiply the weights of misclassified samples by `exp(alpha)` and normalize
///
/// A perfect learner ends the boosting with weight one. A learner not better than random guessing
/// ends the boosting without being added.
///
/// ## Prediction
///
/// Every tree votes `1` for its predicted class and `-1 / (K - 1)` for the others, weighted by
/// alpha. The class probabilities are the softmax of the normalized votes divided by `K - 1`.
///
/// ## References
///
/// * Zhu, J., Zou, H., Rosset, S., & Hastie, T. (2009). Multi-class AdaBoost. Statistics and its
///   Interface, 2(3), 349-360.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct AdaBoost<F: Float, L: Label> {
    models: Vec<DecisionTree<F, L>>,
    model_weights: Vec<f64>,
    classes: Vec<L>,
}

impl<F: Float, L: Label> AdaBoost<F, L> {
    /// Returns the number of estimators in the ensemble
    pub fn n_estimators(&self) -> usize {
        self.models.len()
    }

    /// Returns the model weights (alpha values)
    pub fn weights(&self) -> &[f64] {
        &self.model_weights
    }

    pub fn models(&self) -> &[DecisionTree<F, L>] {
        &self.models
    }

    /// Classes seen during fitting, in ascending order
    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    /// Feature importances of the trees averaged with the tree weights
    pub fn feature_importance(&self) -> Vec<F> {
        let nfeatures = self.models.first().map_or(0, |m| m.num_features());
        let mut importance = vec![F::zero(); nfeatures];
        let total = self.model_weights.iter().sum::<f64>();
        if total <= 0.0 {
            return importance;
        }

        for (model, weight) in self.models.iter().zip(&self.model_weights) {
            let weight = F::cast(weight / total);
            for (acc, imp) in importance.iter_mut().zip(model.feature_importance()) {
                *acc += imp * weight;
            }
        }

        importance
    }

    /// Weighted votes per class, normalized by the sum of the tree weights
    fn decision_function<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix2>) -> Array2<f64>
    where
        L: Default,
    {
        let nclasses = self.classes.len();
        let against = -1.0 / (nclasses as f64 - 1.0);
        let mut decision = Array2::zeros((x.nrows(), nclasses));

        for (model, alpha) in self.models.iter().zip(&self.model_weights) {
            let predictions = model.predict(x);
            for (mut row, pred) in decision.rows_mut().into_iter().zip(predictions.iter()) {
                for (value, class) in row.iter_mut().zip(&self.classes) {
                    *value += alpha * if class == pred { 1.0 } else { against };
                }
            }
        }

        let total = self.model_weights.iter().sum::<f64>();
        if total > 0.0 {
            decision /= total;
        }
        decision
    }
}

impl<F: Float, L: Label + Default, D: Data<Elem = F>> PredictProba<ArrayBase<D, Ix2>, F>
    for AdaBoost<F, L>
{
    fn predict_proba(&self, x: &ArrayBase<D, Ix2>) -> Array2<F> {
        let scale = (self.classes.len() as f64 - 1.0).max(1.0);
        let mut decision = self.decision_function(x);

        for mut row in decision.rows_mut() {
            row /= scale;
            let max = row.fold(f64::NEG_INFINITY, |m, v| m.max(*v));
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row /= sum;
        }

        decision.mapv(F::cast)
    }
}

impl<F: Float, L: Label + Default, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<L>>
    for AdaBoost<F, L>
{
    /// The class with the highest weighted vote, ties go to the smaller class
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<L>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        let decision = self.decision_function(x);
        for (row, target) in decision.rows().into_iter().zip(y.iter_mut()) {
            let best = row
                .iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (idx, v)| {
                    if *v > best.1 {
                        (idx, *v)
                    } else {
                        best
                    }
                })
                .0;
            *target = self.classes[best].clone();
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<L> {
        Array1::default(x.nrows())
    }
}

impl<F, L, D, T> Fit<ArrayBase<D, Ix2>, T, EnsembleError> for AdaBoostValidParams<F, L>
where
    F: Float,
    L: Label + Ord + Default,
    D: Data<Elem = F>,
    T: AsTargets<Elem = L> + Labels<Elem = L>,
{
    type Object = AdaBoost<F, L>;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let x = dataset.records();
        let targets = dataset.targets().as_targets();
        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(cardio::error::Error::NotEnoughSamples(
                "cannot fit AdaBoost on an empty dataset".to_string(),
            )
            .into());
        }

        let mut classes = dataset.targets().labels();
        classes.sort();
        if classes.len() < 2 {
            return Err(EnsembleError::WrongNumberOfClasses {
                expected: "at least 2",
                found: classes.len(),
            });
        }
        let k = classes.len() as f64;

        let mut sample_weights = (0..n_samples)
            .map(|idx| dataset.weight_for(idx) as f64)
            .collect::<Array1<f64>>();

        let mut models = Vec::with_capacity(self.n_estimators());
        let mut model_weights = Vec::with_capacity(self.n_estimators());

        for iteration in 0..self.n_estimators() {
            let weight_sum = sample_weights.sum();
            if !(weight_sum > 0.0) {
                return Err(EnsembleError::NotConverged(format!(
                    "sample weights sum to zero at iteration {}",
                    iteration
                )));
            }
            // keep the weights at an average of one, so leaf weight limits read as sample counts
            sample_weights *= n_samples as f64 / weight_sum;

            let weighted = DatasetBase::new(x.view(), targets.view())
                .with_weights(sample_weights.mapv(|w| w as f32));
            let model = self.weak_learner().fit(&weighted)?;

            let predictions = model.predict(x);
            let incorrect = targets
                .iter()
                .zip(predictions.iter())
                .map(|(truth, pred)| truth != pred)
                .collect::<Vec<_>>();
            let weighted_error = incorrect
                .iter()
                .zip(sample_weights.iter())
                .filter(|(wrong, _)| **wrong)
                .map(|(_, w)| w)
                .sum::<f64>()
                / n_samples as f64;

            if weighted_error <= 0.0 {
                models.push(model);
                model_weights.push(1.0);
                break;
            }

            if weighted_error >= 1.0 - 1.0 / k {
                if models.is_empty() {
                    return Err(EnsembleError::NotConverged(format!(
                        "the first weak learner is no better than random guessing (error {:.4})",
                        weighted_error
                    )));
                }
                break;
            }

            let alpha =
                self.learning_rate() * (((1.0 - weighted_error) / weighted_error).ln() + (k - 1.0).ln());

            if iteration + 1 < self.n_estimators() {
                for (weight, wrong) in sample_weights.iter_mut().zip(&incorrect) {
                    if *wrong {
                        *weight *= alpha.exp();
                    }
                }
            }

            models.push(model);
            model_weights.push(alpha);
        }

        Ok(AdaBoost {
            models,
            model_weights,
            classes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AdaBoostParams;
    use approx::assert_abs_diff_eq;
    use cardio::prelude::{Dataset, ToConfusionMatrix};
    use ndarray::{array, Array};
    use ndarray_rand::{
        rand::{rngs::SmallRng, SeedableRng},
        rand_distr::Uniform,
        RandomExt,
    };

    /// Two features, the positive class lives where both are large
    fn diagonal(rng: &mut SmallRng) -> Dataset<f64, bool> {
        let data = Array::random_using((200, 2), Uniform::new(0., 1.), rng);
        let targets = data
            .rows()
            .into_iter()
            .map(|row| row[0] + row[1] > 1.0)
            .collect::<Array1<_>>();
        Dataset::new(data, targets)
    }

    #[test]
    fn boosting_beats_a_single_stump() -> Result<()> {
        let dataset = diagonal(&mut SmallRng::seed_from_u64(42));

        let stump = AdaBoost::params().n_estimators(1).fit(&dataset)?;
        let boosted = AdaBoost::params().n_estimators(100).fit(&dataset)?;

        let stump_acc = stump
            .predict(dataset.records())
            .confusion_matrix(&dataset)?
            .accuracy();
        let boosted_acc = boosted
            .predict(dataset.records())
            .confusion_matrix(&dataset)?
            .accuracy();
        assert!(boosted_acc > stump_acc);
        assert!(boosted_acc > 0.9);

        Ok(())
    }

    #[test]
    fn probabilities_agree_with_predictions() -> Result<()> {
        let dataset = diagonal(&mut SmallRng::seed_from_u64(3));
        let model = AdaBoostParams::new().n_estimators(30).fit(&dataset)?;

        let proba = model.predict_proba(dataset.records());
        let predictions = model.predict(dataset.records());
        assert_eq!(proba.ncols(), 2);
        for (row, pred) in proba.rows().into_iter().zip(predictions.iter()) {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
            if row[1] > row[0] {
                assert!(*pred);
            }
        }

        Ok(())
    }

    #[test]
    fn perfect_stump_stops_boosting() -> Result<()> {
        let dataset = Dataset::new(
            array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]],
            array![false, false, false, true, true, true],
        );
        let model = AdaBoost::params().n_estimators(20).fit(&dataset)?;

        assert_eq!(model.n_estimators(), 1);
        assert_eq!(model.weights(), &[1.0]);
        assert_eq!(model.predict(dataset.records()), *dataset.targets());

        // a single unanimous vote of +1 against -1 gives sigmoid(2)
        let proba = model.predict_proba(&array![[0.0]]);
        assert_abs_diff_eq!(proba[(0, 0)], 1.0 / (1.0 + (-2.0f64).exp()), epsilon = 1e-12);

        Ok(())
    }

    #[test]
    fn importance_is_normalized() -> Result<()> {
        let dataset = diagonal(&mut SmallRng::seed_from_u64(7));
        let model = AdaBoost::params().n_estimators(10).fit(&dataset)?;

        let importance = model.feature_importance();
        assert_eq!(importance.len(), 2);
        assert_abs_diff_eq!(importance.iter().sum::<f64>(), 1.0, epsilon = 1e-9);

        Ok(())
    }

    #[test]
    fn single_class_is_rejected() {
        let dataset = Dataset::new(array![[1.0], [2.0]], array![true, true]);
        let res = AdaBoost::<f64, bool>::params().fit(&dataset);
        assert!(matches!(
            res,
            Err(EnsembleError::WrongNumberOfClasses { found: 1, .. })
        ));
    }
}
