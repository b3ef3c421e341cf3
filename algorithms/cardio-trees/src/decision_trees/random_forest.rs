//! Random Forest Classifier
//!
//! An ensemble of decision trees trained on bootstrapped samples of the data, each drawing a random
//! subset of candidate features at every split. The forest predicts the average of the class
//! probabilities of its trees.

use cardio::prelude::*;
use cardio::error::Error;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::{DecisionTree, DecisionTreeParams};

/// A fitted random forest
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest<F: Float, L: Label> {
    trees: Vec<DecisionTree<F, L>>,
    classes: Vec<L>,
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestValidParams<F, L> {
    trees: DecisionTreeParams<F, L>,
    n_estimators: usize,
    bootstrap: bool,
    seed: u64,
}

impl<F, L> RandomForestValidParams<F, L> {
    pub fn tree_params(&self) -> &DecisionTreeParams<F, L> {
        &self.trees
    }

    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    pub fn bootstrap(&self) -> bool {
        self.bootstrap
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestParams<F, L>(RandomForestValidParams<F, L>);

impl<F: Float, L: Label> RandomForestParams<F, L> {
    /// Forest of `n_estimators` trees with the default tree parameters, bootstrap sampling and seed 42
    pub fn new(n_estimators: usize) -> Self {
        Self(RandomForestValidParams {
            trees: DecisionTreeParams::new(),
            n_estimators,
            bootstrap: true,
            seed: 42,
        })
    }

    /// Sets the number of trees
    pub fn n_estimators(mut self, n_estimators: usize) -> Self {
        self.0.n_estimators = n_estimators;
        self
    }

    /// Sets the parameters every tree is grown with
    ///
    /// The seed of the tree parameters is replaced by a per-tree seed drawn from the forest seed.
    pub fn tree_params(mut self, trees: DecisionTreeParams<F, L>) -> Self {
        self.0.trees = trees;
        self
    }

    /// Draw a bootstrap sample of the training data for every tree
    pub fn bootstrap(mut self, bootstrap: bool) -> Self {
        self.0.bootstrap = bootstrap;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }
}

impl<F: Float, L: Label> RandomForest<F, L> {
    // Violates the convention that new should return a value of type `Self`
    #[allow(clippy::new_ret_no_self)]
    pub fn params(n_estimators: usize) -> RandomForestParams<F, L> {
        RandomForestParams::new(n_estimators)
    }

    pub fn trees(&self) -> &[DecisionTree<F, L>] {
        &self.trees
    }

    /// Classes seen during fitting, in ascending order
    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    /// Mean of the feature importances of all trees
    pub fn feature_importance(&self) -> Vec<F> {
        let nfeatures = self.trees.first().map_or(0, |t| t.num_features());
        let mut importance = vec![F::zero(); nfeatures];

        for tree in &self.trees {
            for (total, imp) in importance.iter_mut().zip(tree.feature_importance()) {
                *total += imp;
            }
        }

        let ntrees = F::cast(self.trees.len().max(1));
        importance.into_iter().map(|x| x / ntrees).collect()
    }
}

impl<F: Float, L> ParamGuard for RandomForestParams<F, L> {
    type Checked = RandomForestValidParams<F, L>;
    type Error = Error;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.n_estimators == 0 {
            return Err(Error::Parameters(
                "A random forest needs at least one tree".into(),
            ));
        }
        self.0.trees.check_ref()?;

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float, L: Label + Ord + Send + Sync> Fit<Array2<F>, Array1<L>, Error>
    for RandomForestValidParams<F, L>
{
    type Object = RandomForest<F, L>;

    fn fit(&self, dataset: &DatasetBase<Array2<F>, Array1<L>>) -> Result<Self::Object> {
        let nsamples = dataset.nsamples();
        if nsamples == 0 {
            return Err(Error::NotEnoughSamples(
                "cannot grow a random forest without samples".to_string(),
            ));
        }

        let mut classes = dataset.targets.labels();
        classes.sort();

        // seeds are drawn upfront, so the forest does not depend on the thread schedule
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let seeds = (0..self.n_estimators)
            .map(|_| rng.gen::<u64>())
            .collect::<Vec<_>>();

        let trees = seeds
            .into_par_iter()
            .map(|seed| {
                let params = self.trees.clone().seed(seed);
                if self.bootstrap {
                    let mut rng = SmallRng::seed_from_u64(seed);
                    let indices = (0..nsamples)
                        .map(|_| rng.gen_range(0..nsamples))
                        .collect::<Vec<_>>();
                    params.fit(&dataset.select(&indices))
                } else {
                    params.fit(dataset)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RandomForest { trees, classes })
    }
}

impl<F: Float, L: Label, D: Data<Elem = F>> PredictProba<ArrayBase<D, Ix2>, F>
    for RandomForest<F, L>
{
    /// Average of the tree probabilities, one column per class of [`RandomForest::classes`]
    ///
    /// A tree whose bootstrap sample missed a class contributes zero to that class.
    fn predict_proba(&self, x: &ArrayBase<D, Ix2>) -> Array2<F> {
        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));

        for tree in &self.trees {
            let tree_proba = tree.predict_proba(x);
            for (j, class) in tree.classes().iter().enumerate() {
                if let Some(col) = self.classes.iter().position(|c| c == class) {
                    let mut target = proba.column_mut(col);
                    target += &tree_proba.column(j);
                }
            }
        }

        proba /= F::cast(self.trees.len().max(1));
        proba
    }
}

impl<F: Float, L: Label + Default, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<L>>
    for RandomForest<F, L>
{
    /// Soft vote, the class with the highest mean probability wins, ties go to the smaller class
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<L>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        let proba = self.predict_proba(x);
        for (row, target) in proba.rows().into_iter().zip(y.iter_mut()) {
            let best = row
                .iter()
                .enumerate()
                .fold((0, F::neg_infinity()), |best, (idx, p)| {
                    if *p > best.1 {
                        (idx, *p)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SplitQuality;
    use approx::assert_abs_diff_eq;
    use ndarray::Array;
    use ndarray_rand::{rand_distr::Uniform, RandomExt};

    fn two_blobs(rng: &mut SmallRng) -> Dataset<f64, bool> {
        let mut data = Array::random_using((60, 3), Uniform::new(-1., 1.), rng);
        let targets = (0..60).map(|i| i >= 30).collect::<Array1<_>>();
        for (mut row, target) in data.rows_mut().into_iter().zip(targets.iter()) {
            row[0] += if *target { 2.0 } else { -2.0 };
        }

        Dataset::new(data, targets)
    }

    #[test]
    fn separates_two_blobs() -> Result<()> {
        let dataset = two_blobs(&mut SmallRng::seed_from_u64(1));

        let forest = RandomForest::params(20)
            .tree_params(DecisionTree::params().max_depth(Some(4)).max_features(Some(0.5)))
            .seed(7)
            .fit(&dataset)?;

        let accuracy = forest
            .predict(dataset.records())
            .confusion_matrix(&dataset)?
            .accuracy();
        assert!(accuracy > 0.95);
        assert_eq!(forest.trees().len(), 20);
        assert_eq!(forest.classes(), &[false, true]);

        Ok(())
    }

    #[test]
    fn probabilities_sum_to_one() -> Result<()> {
        let dataset = two_blobs(&mut SmallRng::seed_from_u64(2));
        let forest = RandomForest::params(10)
            .tree_params(DecisionTree::params().split_quality(SplitQuality::Entropy))
            .fit(&dataset)?;

        let proba = forest.predict_proba(dataset.records());
        assert_eq!(proba.ncols(), 2);
        for row in proba.rows() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-6);
        }

        Ok(())
    }

    #[test]
    fn same_seed_same_forest() -> Result<()> {
        let dataset = two_blobs(&mut SmallRng::seed_from_u64(3));
        let params = RandomForest::params(8)
            .tree_params(DecisionTree::params().max_features(Some(0.3)))
            .seed(11);

        assert_eq!(params.fit(&dataset)?, params.fit(&dataset)?);

        let other = params.clone().seed(12).fit(&dataset)?;
        assert_ne!(params.fit(&dataset)?, other);

        Ok(())
    }

    #[test]
    fn importance_points_at_informative_feature() -> Result<()> {
        let dataset = two_blobs(&mut SmallRng::seed_from_u64(4));
        let forest = RandomForest::params(10).fit(&dataset)?;

        let importance = forest.feature_importance();
        assert_eq!(importance.len(), 3);
        assert_abs_diff_eq!(importance.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        assert!(importance[0] > importance[1] && importance[0] > importance[2]);

        Ok(())
    }

    #[test]
    fn invalid_params() {
        assert!(RandomForest::<f64, bool>::params(0).check().is_err());
        assert!(RandomForest::<f64, bool>::params(5)
            .tree_params(DecisionTree::params().max_features(Some(0.0)))
            .check()
            .is_err());
    }
}
