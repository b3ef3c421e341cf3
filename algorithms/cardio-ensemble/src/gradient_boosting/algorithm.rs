use crate::error::{EnsembleError, Result};
use cardio::prelude::{
    AsTargets, DatasetBase, Fit, Float, Label, Labels, PredictInplace, PredictProba,
};
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};
use rand::seq::index;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::tree::{BoostedTree, TreeBuilder};
use super::GradientBoostingValidParams;

const PROBABILITY_CLIP: f64 = 1e-7;
const MIN_HESSIAN: f64 = 1e-16;

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// A fitted gradient boosted ensemble of regression trees for binary classification
///
/// The ensemble models the log-odds of the larger class as the sum of a constant base score and
/// the outputs of all trees. Every tree is fitted with a Newton step on the logistic loss: the
/// gradient `p - y` and hessian `p (1 - p)` of the current predictions drive the split search and
/// the leaf outputs.
///
/// Rows are subsampled without replacement for every tree, and so are the features when
/// `colsample_bytree` is below one. Both draws come from a generator seeded with the `seed`
/// hyperparameter, two fits with the same parameters on the same data are identical.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct GradientBoosting<F: Float, L: Label> {
    trees: Vec<BoostedTree<F>>,
    base_score: f64,
    classes: Vec<L>,
    nfeatures: usize,
}

impl<F: Float, L: Label> GradientBoosting<F, L> {
    pub fn trees(&self) -> &[BoostedTree<F>] {
        &self.trees
    }

    /// Log-odds every prediction starts from
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    /// The two classes seen during fitting, in ascending order
    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    /// Total split gain per feature, normalized to sum to one
    ///
    /// All importances are zero if no tree contains a split.
    pub fn feature_importance(&self) -> Vec<F> {
        let mut importance = vec![0.0; self.nfeatures];
        for tree in &self.trees {
            tree.accumulate_gain(&mut importance);
        }
        let total = importance.iter().sum::<f64>();
        if total > 0.0 {
            importance.iter_mut().for_each(|v| *v /= total);
        }
        importance.into_iter().map(F::cast).collect()
    }

    /// Raw log-odds of the second class
    pub fn decision_function<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix2>) -> Array1<f64> {
        x.rows()
            .into_iter()
            .map(|row| {
                self.base_score
                    + self
                        .trees
                        .iter()
                        .map(|tree| tree.predict_row(&row))
                        .sum::<f64>()
            })
            .collect()
    }
}

impl<F: Float, L: Label, D: Data<Elem = F>> PredictProba<ArrayBase<D, Ix2>, F>
    for GradientBoosting<F, L>
{
    fn predict_proba(&self, x: &ArrayBase<D, Ix2>) -> Array2<F> {
        let mut proba = Array2::zeros((x.nrows(), 2));
        for (mut row, score) in proba
            .rows_mut()
            .into_iter()
            .zip(self.decision_function(x))
        {
            let p = sigmoid(score);
            row[0] = F::cast(1.0 - p);
            row[1] = F::cast(p);
        }
        proba
    }
}

impl<F: Float, L: Label + Default, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<L>>
    for GradientBoosting<F, L>
{
    /// Predicts the second class iff its probability exceeds one half
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<L>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        for (target, score) in y.iter_mut().zip(self.decision_function(x)) {
            *target = if score > 0.0 {
                self.classes[1].clone()
            } else {
                self.classes[0].clone()
            };
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<L> {
        Array1::default(x.nrows())
    }
}

/// Draws `ceil(fraction * total)` indices without replacement, sorted ascending
fn subsample(rng: &mut Xoshiro256Plus, total: usize, fraction: f64) -> Vec<usize> {
    if fraction >= 1.0 {
        return (0..total).collect();
    }
    let amount = ((total as f64 * fraction).ceil() as usize).clamp(1, total);
    let mut picked = index::sample(rng, total, amount).into_vec();
    picked.sort_unstable();
    picked
}

impl<F, L, D, T> Fit<ArrayBase<D, Ix2>, T, EnsembleError> for GradientBoostingValidParams<F, L>
where
    F: Float,
    L: Label + Ord,
    D: Data<Elem = F>,
    T: AsTargets<Elem = L> + Labels<Elem = L>,
{
    type Object = GradientBoosting<F, L>;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let x = dataset.records();
        let n_samples = x.nrows();
        let nfeatures = x.ncols();
        if n_samples == 0 {
            return Err(cardio::error::Error::NotEnoughSamples(
                "cannot fit gradient boosting on an empty dataset".to_string(),
            )
            .into());
        }

        let mut classes = dataset.targets().labels();
        classes.sort();
        if classes.len() != 2 {
            return Err(EnsembleError::WrongNumberOfClasses {
                expected: "2",
                found: classes.len(),
            });
        }

        let targets = dataset.targets().as_targets();
        let labels = targets
            .iter()
            .map(|t| if *t == classes[1] { 1.0 } else { 0.0 })
            .collect::<Vec<f64>>();
        let weights = (0..n_samples)
            .map(|idx| dataset.weight_for(idx) as f64)
            .collect::<Vec<f64>>();

        let weight_sum = weights.iter().sum::<f64>();
        if !(weight_sum > 0.0) {
            return Err(EnsembleError::InvalidParameter(
                "sample weights must have a positive sum".to_string(),
            ));
        }
        let positive_rate = (labels.iter().zip(&weights).map(|(y, w)| y * w).sum::<f64>()
            / weight_sum)
            .clamp(PROBABILITY_CLIP, 1.0 - PROBABILITY_CLIP);
        let base_score = (positive_rate / (1.0 - positive_rate)).ln();

        let mut rng = Xoshiro256Plus::seed_from_u64(self.seed());
        let config = self.tree_config();
        let mut scores = vec![base_score; n_samples];
        let mut gradients = vec![0.0; n_samples];
        let mut hessians = vec![0.0; n_samples];
        let mut trees = Vec::with_capacity(self.n_estimators());

        for _ in 0..self.n_estimators() {
            for idx in 0..n_samples {
                let p = sigmoid(scores[idx]);
                gradients[idx] = (p - labels[idx]) * weights[idx];
                hessians[idx] = (p * (1.0 - p)).max(MIN_HESSIAN) * weights[idx];
            }

            let rows = subsample(&mut rng, n_samples, self.subsample());
            let features = subsample(&mut rng, nfeatures, self.colsample_bytree());

            let tree = TreeBuilder {
                records: x.view(),
                gradients: &gradients,
                hessians: &hessians,
                features: &features,
                config,
            }
            .build(rows);

            for (score, row) in scores.iter_mut().zip(x.rows()) {
                *score += tree.predict_row(&row);
            }
            trees.push(tree);
        }

        Ok(GradientBoosting {
            trees,
            base_score,
            classes,
            nfeatures,
        })
    }
}
