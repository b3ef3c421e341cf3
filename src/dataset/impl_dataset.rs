
use ndarray::{Array1, ArrayView1, Axis};
use rand::Rng;

use super::{stratified_folds, stratified_split, AsTargets, DatasetBase, Label, Records, Select};
use crate::error::Result;

/// Implementation without constraints on records and targets
///
/// This implementation block provides methods for the creation and mutation of datasets. This
/// includes swapping the targets, return the records etc.
impl<R: Records, T> DatasetBase<R, T> {
    /// Create a new dataset from records and targets
    ///
    /// # Example
    ///
    /// ```ignore
    /// let dataset = Dataset::new(records, targets);
    /// ```
    pub fn new(records: R, targets: T) -> DatasetBase<R, T> {
        DatasetBase {
            records,
            targets,
            weights: Array1::zeros(0),
            feature_names: Vec::new(),
        }
    }

    /// Returns reference to targets
    pub fn targets(&self) -> &T {
        &self.targets
    }

    /// Returns optionally weights
    pub fn weights(&self) -> Option<&[f32]> {
        if !self.weights.is_empty() {
            self.weights.as_slice()
        } else {
            None
        }
    }

    /// Return a single weight
    ///
    /// The weight of the `idx`th observation is returned. If no weight is specified, then all
    /// observations are unweighted with default value `1.0`.
    pub fn weight_for(&self, idx: usize) -> f32 {
        self.weights.get(idx).copied().unwrap_or(1.0)
    }

    /// Returns feature names
    ///
    /// A feature name gives a human-readable string describing the purpose of a single feature.
    /// This allow the reader to understand its purpose while analysing results, for example
    /// correlation analysis or feature importance.
    pub fn feature_names(&self) -> Vec<String> {
        if !self.feature_names.is_empty() {
            self.feature_names.clone()
        } else {
            (0..self.records.nfeatures())
                .map(|idx| format!("feature-{}", idx))
                .collect()
        }
    }

    /// Return records of a dataset
    ///
    /// The records are data points from which predictions are made. This functions returns a
    /// reference to the record field.
    pub fn records(&self) -> &R {
        &self.records
    }

    /// Updates the records of a dataset
    ///
    /// This function overwrites the records in a dataset. It also invalidates the weights and
    /// feature names.
    pub fn with_records<S: Records>(self, records: S) -> DatasetBase<S, T> {
        DatasetBase {
            records,
            targets: self.targets,
            weights: Array1::zeros(0),
            feature_names: Vec::new(),
        }
    }

    /// Updates the weights of a dataset
    pub fn with_weights(mut self, weights: Array1<f32>) -> DatasetBase<R, T> {
        self.weights = weights;

        self
    }

    /// Updates the feature names of a dataset
    pub fn with_feature_names<I: Into<String>>(mut self, names: Vec<I>) -> DatasetBase<R, T> {
        let feature_names = names.into_iter().map(|x| x.into()).collect();

        self.feature_names = feature_names;

        self
    }
}

impl<R: Records + Select, T: Select> DatasetBase<R, T> {
    /// Restrict the dataset to a subset of its samples
    ///
    /// Indices may repeat, weights and feature names are carried over.
    pub fn select(&self, indices: &[usize]) -> DatasetBase<R, T> {
        let weights = if self.weights.is_empty() {
            Array1::zeros(0)
        } else {
            self.weights.select(Axis(0), indices)
        };

        DatasetBase {
            records: self.records.select_rows(indices),
            targets: self.targets.select_rows(indices),
            weights,
            feature_names: self.feature_names.clone(),
        }
    }
}

impl<L: Label + Ord, R: Records + Select, T: Select + AsTargets<Elem = L>> DatasetBase<R, T> {
    /// Split the dataset into a training and a test part, preserving the class proportions
    ///
    /// `test_ratio` is the fraction of samples of every class which ends up in the test part.
    pub fn stratified_split<G: Rng>(
        &self,
        test_ratio: f32,
        rng: &mut G,
    ) -> Result<(DatasetBase<R, T>, DatasetBase<R, T>)> {
        let labels = self.targets.as_targets().to_vec();
        let (train, test) = stratified_split(&labels, test_ratio, rng)?;

        Ok((self.select(&train), self.select(&test)))
    }

    /// Performs K-folding with stratification
    ///
    /// Returns `k` pairs of (training, validation) datasets. Every sample appears in exactly one
    /// validation set and every validation set holds roughly the same share of each class.
    pub fn stratified_fold<G: Rng>(
        &self,
        k: usize,
        rng: &mut G,
    ) -> Result<Vec<(DatasetBase<R, T>, DatasetBase<R, T>)>> {
        let labels = self.targets.as_targets().to_vec();
        let folds = stratified_folds(&labels, k, rng)?;
        let nsamples = labels.len();

        Ok(folds
            .into_iter()
            .map(|valid| {
                let mut in_valid = vec![false; nsamples];
                valid.iter().for_each(|idx| in_valid[*idx] = true);
                let train = (0..nsamples).filter(|idx| !in_valid[*idx]).collect::<Vec<_>>();

                (self.select(&train), self.select(&valid))
            })
            .collect())
    }
}

impl<R: Records, T> Records for DatasetBase<R, T> {
    fn nsamples(&self) -> usize {
        self.records.nsamples()
    }

    fn nfeatures(&self) -> usize {
        self.records.nfeatures()
    }
}

impl<L: Label, R: Records, T: AsTargets<Elem = L>> AsTargets for DatasetBase<R, T> {
    type Elem = L;

    fn as_targets(&self) -> ArrayView1<L> {
        self.targets.as_targets()
    }
}
