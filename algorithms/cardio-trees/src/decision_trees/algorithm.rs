//! Decision trees for classification

use std::collections::HashSet;

use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Ix1, Ix2};
use rand::{rngs::SmallRng, seq::index::sample, SeedableRng};

use super::NodeIter;
use super::{DecisionTreeValidParams, SplitQuality};
use cardio::{
    dataset::{AsTargets, Labels},
    error::{Error, Result},
    traits::*,
    DatasetBase, Float, Label,
};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Samples reaching a node, as a boolean mask over the training rows
struct RowMask {
    mask: Vec<bool>,
    nsamples: usize,
}

impl RowMask {
    /// Every row visible
    fn all(nsamples: usize) -> Self {
        RowMask {
            mask: vec![true; nsamples],
            nsamples,
        }
    }

    /// No row visible
    fn none(nsamples: usize) -> Self {
        RowMask {
            mask: vec![false; nsamples],
            nsamples: 0,
        }
    }

    /// Show row `idx`, which must be in bounds
    fn mark(&mut self, idx: usize) {
        self.mask[idx] = true;
        self.nsamples += 1;
    }
}

/// Values of one feature sorted ascending, paired with their row index
struct SortedIndex<'a, F: Float> {
    feature_name: &'a str,
    sorted_values: Vec<(usize, F)>,
}

impl<'a, F: Float> SortedIndex<'a, F> {
    /// Sorts the values of a given feature in ascending order, missing values last
    fn of_array_column(x: &ArrayView2<F>, feature_idx: usize, feature_name: &'a str) -> Self {
        let mut pairs: Vec<(usize, F)> = x
            .index_axis(Axis(1), feature_idx)
            .iter()
            .cloned()
            .enumerate()
            .collect();
        pairs.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or_else(|| a.1.is_nan().cmp(&b.1.is_nan()))
        });

        SortedIndex {
            sorted_values: pairs,
            feature_name,
        }
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
/// A node in the decision tree
pub struct TreeNode<F, L> {
    feature_idx: usize,
    feature_name: String,
    split_value: F,
    impurity_decrease: F,
    weight: f32,
    left_child: Option<Box<TreeNode<F, L>>>,
    right_child: Option<Box<TreeNode<F, L>>>,
    leaf_node: bool,
    prediction: L,
    probabilities: Vec<F>,
    depth: usize,
}

impl<F: Float, L: Label> TreeNode<F, L> {
    /// Leaf predicting the class distribution `class_freq`, ties go to the smallest class
    fn leaf(classes: &[L], class_freq: &[f32], depth: usize) -> Self {
        let weight = class_freq.iter().sum::<f32>();
        let modal = class_freq
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (idx, freq)| {
                if *freq > best.1 {
                    (idx, *freq)
                } else {
                    best
                }
            })
            .0;
        let total = class_freq
            .iter()
            .fold(F::zero(), |acc, freq| acc + F::cast(*freq));
        let probabilities = class_freq
            .iter()
            .map(|freq| {
                if total > F::zero() {
                    F::cast(*freq) / total
                } else {
                    F::one() / F::cast(class_freq.len())
                }
            })
            .collect();

        TreeNode {
            feature_idx: 0,
            feature_name: "".to_string(),
            split_value: F::zero(),
            impurity_decrease: F::zero(),
            weight,
            left_child: None,
            right_child: None,
            leaf_node: true,
            prediction: classes[modal].clone(),
            probabilities,
            depth,
        }
    }

    /// Returns true if the node has no children
    pub fn is_leaf(&self) -> bool {
        self.leaf_node
    }

    /// Returns the depth of the node in the decision tree
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns `Some(prediction)` for leaf nodes and `None` for internal nodes.
    pub fn prediction(&self) -> Option<L> {
        if self.is_leaf() {
            Some(self.prediction.clone())
        } else {
            None
        }
    }

    /// Class distribution of the training samples in this node, in ascending class order
    pub fn probabilities(&self) -> &[F] {
        &self.probabilities
    }

    /// Total sample weight that reached this node during fitting
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Returns both children, first left then right
    pub fn children(&self) -> Vec<&Option<Box<TreeNode<F, L>>>> {
        vec![&self.left_child, &self.right_child]
    }

    /// Return the split (feature index, value) and its impurity decrease
    pub fn split(&self) -> (usize, F, F) {
        (self.feature_idx, self.split_value, self.impurity_decrease)
    }

    /// Returns the name of the feature used in the split if the node is internal,
    /// `None` otherwise
    pub fn feature_name(&self) -> Option<&String> {
        if self.leaf_node {
            None
        } else {
            Some(&self.feature_name)
        }
    }
}

/// State shared by all nodes while growing a single tree
struct TreeGrower<'a, F: Float, L> {
    records: ArrayView2<'a, F>,
    targets: Vec<usize>,
    weights: Vec<f32>,
    classes: &'a [L],
    sorted_indices: Vec<SortedIndex<'a, F>>,
    params: &'a DecisionTreeValidParams<F, L>,
    rng: SmallRng,
}

impl<'a, F: Float, L: Label> TreeGrower<'a, F, L> {
    /// Weighted class frequencies of the visible observations
    fn class_frequencies(&self, mask: &RowMask) -> Vec<f32> {
        let mut freq = vec![0.0; self.classes.len()];
        for (idx, _) in mask.mask.iter().enumerate().filter(|(_, visible)| **visible) {
            freq[self.targets[idx]] += self.weights[idx];
        }

        freq
    }

    /// Features considered for the split of one node, in ascending order
    fn candidate_features(&mut self) -> Vec<usize> {
        let nfeatures = self.sorted_indices.len();
        match self.params.max_features() {
            Some(ratio) if nfeatures > 0 => {
                let amount = ((nfeatures as f32 * ratio).ceil() as usize).clamp(1, nfeatures);
                let mut features = sample(&mut self.rng, nfeatures, amount).into_vec();
                features.sort_unstable();
                features
            }
            _ => (0..nfeatures).collect(),
        }
    }

    fn impurity(&self, class_freq: &[f32]) -> f32 {
        match self.params.split_quality() {
            SplitQuality::Gini => gini_impurity(class_freq),
            SplitQuality::Entropy => entropy(class_freq),
        }
    }

    /// Recursively fits the node
    fn grow(&mut self, mask: &RowMask, depth: usize) -> TreeNode<F, L> {
        // compute weighted frequencies for target classes
        let parent_class_freq = self.class_frequencies(mask);
        let leaf = TreeNode::leaf(self.classes, &parent_class_freq, depth);
        let total_weight = leaf.weight;

        // return leaf when we don't have enough weight or the maximal depth is reached
        if total_weight < self.params.min_weight_split()
            || self
                .params
                .max_depth()
                .map(|max_depth| depth >= max_depth)
                .unwrap_or(false)
        {
            return leaf;
        }

        let mut best: Option<(usize, F, f32)> = None;

        for feature_idx in self.candidate_features() {
            let visible = self.sorted_indices[feature_idx]
                .sorted_values
                .iter()
                .filter(|(idx, _)| mask.mask[*idx])
                .collect::<Vec<_>>();

            let mut right_class_freq = parent_class_freq.clone();
            let mut left_class_freq = vec![0.0; self.classes.len()];
            let mut weight_on_right_side = total_weight;
            let mut weight_on_left_side = 0.0;

            // All observations start in the right subtree and move one by one, in ascending order
            // of the feature, to the left subtree. A split is evaluated between two distinct
            // consecutive values only, so that equal values end up in the same subtree.
            for pair in visible.windows(2) {
                let (idx, value) = *pair[0];
                let (_, next_value) = *pair[1];

                let sample_class = self.targets[idx];
                let sample_weight = self.weights[idx];

                right_class_freq[sample_class] -= sample_weight;
                weight_on_right_side -= sample_weight;
                left_class_freq[sample_class] += sample_weight;
                weight_on_left_side += sample_weight;

                // missing values are sorted last and never used as split points
                if next_value.is_nan() {
                    break;
                }
                if value == next_value {
                    continue;
                }

                if weight_on_right_side < self.params.min_weight_leaf()
                    || weight_on_left_side < self.params.min_weight_leaf()
                {
                    continue;
                }

                let w = weight_on_left_side / total_weight;
                let score = w * self.impurity(&left_class_freq)
                    + (1.0 - w) * self.impurity(&right_class_freq);

                // midpoint between this value and the next one, unless it rounds onto the next
                let midpoint = (value + next_value) / F::cast(2.0);
                let split_value = if midpoint < next_value { midpoint } else { value };

                best = match best.take() {
                    None => Some((feature_idx, split_value, score)),
                    Some((_, _, best_score)) if score < best_score => {
                        Some((feature_idx, split_value, score))
                    }
                    x => x,
                };
            }
        }

        // The impurity decrease is the impurity of the node before splitting minus the weighted
        // impurity of the split. Without a split decreasing it enough the node stays a leaf.
        let (best_feature_idx, best_split_value, best_score) = match best {
            Some(best) => best,
            None => return leaf,
        };
        let impurity_decrease = F::cast(self.impurity(&parent_class_freq) - best_score);
        if impurity_decrease < self.params.min_impurity_decrease() {
            return leaf;
        }

        // determine new masks for the left and right subtrees
        let nsamples = mask.mask.len();
        let mut left_mask = RowMask::none(nsamples);
        let mut right_mask = RowMask::none(nsamples);

        for i in (0..nsamples).filter(|i| mask.mask[*i]) {
            if self.records[(i, best_feature_idx)] <= best_split_value {
                left_mask.mark(i);
            } else {
                right_mask.mark(i);
            }
        }

        if left_mask.nsamples == 0 || right_mask.nsamples == 0 {
            return leaf;
        }

        let left_child = self.grow(&left_mask, depth + 1);
        let right_child = self.grow(&right_mask, depth + 1);

        TreeNode {
            feature_idx: best_feature_idx,
            feature_name: self.sorted_indices[best_feature_idx]
                .feature_name
                .to_owned(),
            split_value: best_split_value,
            impurity_decrease,
            left_child: Some(Box::new(left_child)),
            right_child: Some(Box::new(right_child)),
            leaf_node: false,
            ..leaf
        }
    }
}

/// Fitted binary tree of threshold tests on single features
///
/// An internal node sends a sample left when `feature <= split_value` and right otherwise. A leaf
/// predicts its most frequent label and reports the weighted label frequencies of the training
/// samples that reached it as class probabilities.
///
/// Growing starts at a root holding every sample. Each node scans the candidate features for
/// the split with the lowest weighted child impurity and is split when that improves on the node
/// by at least `min_impurity_decrease`, respecting the depth and weight limits. Nodes without
/// such a split become leaves.
///
/// ### Example
///
/// ```rust
/// use cardio_trees::DecisionTree;
/// use cardio::prelude::*;
/// use ndarray::array;
///
/// let dataset = Dataset::new(
///     array![[1., 0.], [2., 1.], [3., 0.], [7., 1.], [8., 0.], [9., 1.]],
///     array![false, false, false, true, true, true],
/// );
/// let tree = DecisionTree::params().fit(&dataset).unwrap();
/// assert_eq!(tree.predict(dataset.records()), *dataset.targets());
/// assert_eq!(tree.max_depth(), 1);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree<F: Float, L: Label> {
    root_node: TreeNode<F, L>,
    classes: Vec<L>,
    num_features: usize,
}

impl<F: Float, L: Label + Default, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<L>>
    for DecisionTree<F, L>
{
    /// Make predictions for each row of a matrix of features `x`.
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<L>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        for (row, target) in x.rows().into_iter().zip(y.iter_mut()) {
            *target = find_leaf(&row, &self.root_node).prediction.clone();
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<L> {
        Array1::default(x.nrows())
    }
}

impl<F: Float, L: Label, D: Data<Elem = F>> PredictProba<ArrayBase<D, Ix2>, F>
    for DecisionTree<F, L>
{
    /// Class probabilities of the reached leaves, one column per class of [`DecisionTree::classes`]
    fn predict_proba(&self, x: &ArrayBase<D, Ix2>) -> Array2<F> {
        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));

        for (row, mut out) in x.rows().into_iter().zip(proba.rows_mut()) {
            let leaf = find_leaf(&row, &self.root_node);
            out.assign(&ArrayView1::from(leaf.probabilities.as_slice()));
        }

        proba
    }
}

impl<F: Float, L: Label + Ord, D, T> Fit<ArrayBase<D, Ix2>, T, Error>
    for DecisionTreeValidParams<F, L>
where
    D: Data<Elem = F>,
    T: AsTargets<Elem = L> + Labels<Elem = L>,
{
    type Object = DecisionTree<F, L>;

    /// Grow a tree on the records, weighting every sample by the dataset weights
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let x = dataset.records();
        let targets = dataset.targets.as_targets();
        if x.nrows() == 0 {
            return Err(Error::NotEnoughSamples(
                "cannot grow a decision tree without samples".to_string(),
            ));
        }
        if targets.len() != x.nrows() {
            return Err(Error::LengthMismatch {
                expected: x.nrows(),
                actual: targets.len(),
            });
        }

        let mut classes = dataset.targets.labels();
        classes.sort();
        let target_classes = targets
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or(0))
            .collect();
        let weights = (0..x.nrows()).map(|idx| dataset.weight_for(idx)).collect();

        let feature_names = dataset.feature_names();
        let records = x.view();
        let sorted_indices: Vec<_> = (0..(x.ncols()))
            .map(|feature_idx| {
                SortedIndex::of_array_column(&records, feature_idx, &feature_names[feature_idx])
            })
            .collect();

        let mut grower = TreeGrower {
            records,
            targets: target_classes,
            weights,
            classes: &classes,
            sorted_indices,
            params: self,
            rng: SmallRng::seed_from_u64(self.seed()),
        };
        let root_node = grower.grow(&RowMask::all(x.nrows()), 0);

        Ok(DecisionTree {
            root_node,
            classes,
            num_features: x.ncols(),
        })
    }
}

impl<F: Float, L: Label> DecisionTree<F, L> {
    /// Create a node iterator in depth-first order
    pub fn iter_nodes(&self) -> NodeIter<F, L> {
        // queue of nodes yet to explore
        let queue = vec![&self.root_node];

        NodeIter::new(queue)
    }

    /// Return the indices of the features used in splits, in ascending order
    pub fn features(&self) -> Vec<usize> {
        let fitted_features = self
            .iter_nodes()
            .filter(|node| !node.is_leaf())
            .map(|node| node.feature_idx)
            .collect::<HashSet<_>>();

        let mut features = fitted_features.into_iter().collect::<Vec<_>>();
        features.sort_unstable();
        features
    }

    /// Return the feature importance for each feature
    ///
    /// The importance of a feature is the total impurity decrease of the splits on it, weighted
    /// by the share of samples reaching the split, normalized to sum to one. A tree without splits
    /// returns zeros.
    pub fn feature_importance(&self) -> Vec<F> {
        let mut importance = vec![F::zero(); self.num_features];
        let root_weight = F::cast(self.root_node.weight);

        for node in self.iter_nodes().filter(|node| !node.is_leaf()) {
            importance[node.feature_idx] +=
                F::cast(node.weight) / root_weight * node.impurity_decrease;
        }

        let total = importance.iter().cloned().sum::<F>();
        if total > F::zero() {
            importance.iter_mut().for_each(|x| *x /= total);
        }

        importance
    }

    /// Return root node of the tree
    pub fn root_node(&self) -> &TreeNode<F, L> {
        &self.root_node
    }

    /// Classes seen during fitting, in ascending order
    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    /// Number of features the tree was fitted on
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Return max depth of the tree
    pub fn max_depth(&self) -> usize {
        self.iter_nodes()
            .fold(0, |max, node| usize::max(max, node.depth))
    }

    /// Return the number of leaves in this tree
    pub fn num_leaves(&self) -> usize {
        self.iter_nodes().filter(|node| node.is_leaf()).count()
    }
}

/// Traverse the tree from `node` to the leaf reached by the sample `x`
fn find_leaf<'a, F: Float, L>(
    x: &ArrayBase<impl Data<Elem = F>, Ix1>,
    node: &'a TreeNode<F, L>,
) -> &'a TreeNode<F, L> {
    let mut node = node;
    while let (false, Some(left), Some(right)) =
        (node.leaf_node, &node.left_child, &node.right_child)
    {
        node = if x[node.feature_idx] <= node.split_value {
            left.as_ref()
        } else {
            right.as_ref()
        };
    }

    node
}

/// Gini impurity of weighted label counts, zero for an empty node
fn gini_impurity(class_freq: &[f32]) -> f32 {
    let n_samples = class_freq.iter().sum::<f32>();
    if n_samples <= 0.0 {
        return 0.0;
    }

    let purity = class_freq
        .iter()
        .map(|x| x / n_samples)
        .map(|x| x * x)
        .sum::<f32>();

    1.0 - purity
}

/// Entropy in bits of weighted label counts, zero for an empty node
fn entropy(class_freq: &[f32]) -> f32 {
    let n_samples = class_freq.iter().sum::<f32>();
    if n_samples <= 0.0 {
        return 0.0;
    }

    class_freq
        .iter()
        .map(|x| x / n_samples)
        .map(|x| if x > 0.0 { -x * x.log2() } else { 0.0 })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use cardio::{error::Result, metrics::ToConfusionMatrix, Dataset, ParamGuard};
    use ndarray::{array, concatenate, s, Array, Array1, Array2, Axis};
    use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};
    use rand::rngs::SmallRng;

    #[test]
    fn gini_impurity_example() {
        // Class 0 occurs 75% of the time
        // Class 1 occurs 25% of the time
        // Class 2 occurs 0% of the time
        // Gini impurity is 1 - 0.75*0.75 - 0.25*0.25 - 0*0 = 0.375
        assert_abs_diff_eq!(gini_impurity(&[6.0, 2.0, 0.0]), 0.375, epsilon = 1e-5);
        assert_abs_diff_eq!(gini_impurity(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn entropy_example() {
        // Entropy is -0.75*log2(0.75) - 0.25*log2(0.25) - 0*log2(0) = 0.81127812
        assert_abs_diff_eq!(entropy(&[6.0, 2.0, 0.0]), 0.81127, epsilon = 1e-5);

        // If split is perfect then entropy is zero
        assert_abs_diff_eq!(entropy(&[8.0, 0.0, 0.0]), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn modal_class_prefers_smallest_on_ties() {
        let leaf = TreeNode::<f64, usize>::leaf(&[0, 1, 2], &[2.0, 3.0, 3.0], 0);

        assert_eq!(leaf.prediction(), Some(1));
        assert_abs_diff_eq!(leaf.probabilities()[0], 0.25);
        assert_abs_diff_eq!(leaf.weight(), 8.0);
    }

    #[test]
    /// Single feature test
    ///
    /// Generate a dataset where a single feature perfectly correlates
    /// with the target while the remaining features are uniform noise
    /// and do not add any information.
    fn single_feature_random_noise_binary() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut data = Array::random_using((50, 10), Uniform::new(-4., 4.), &mut rng);
        data.slice_mut(s![.., 8]).assign(
            &(0..50)
                .map(|x| if x < 25 { 0.0 } else { 1.0 })
                .collect::<Array1<_>>(),
        );

        let targets = (0..50).map(|x| x < 25).collect::<Array1<_>>();
        let dataset = Dataset::new(data, targets);

        let model = DecisionTree::params().max_depth(Some(2)).fit(&dataset)?;

        // we should only use feature index 8 here
        assert_eq!(&model.features(), &[8]);

        let ground_truth = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0];

        for (imp, truth) in model.feature_importance().iter().zip(&ground_truth) {
            assert_abs_diff_eq!(imp, truth, epsilon = 1e-15);
        }

        // check for perfect accuracy
        let cm = model
            .predict(dataset.records())
            .confusion_matrix(&dataset)?;
        assert_abs_diff_eq!(cm.accuracy(), 1.0, epsilon = 1e-15);

        Ok(())
    }

    #[test]
    /// Check that for random data the max depth is used
    fn check_max_depth() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(42);

        // create very sparse data
        let data = Array::random_using((50, 50), Uniform::new(-1., 1.), &mut rng);
        let targets = (0..50).collect::<Array1<usize>>();

        let dataset = Dataset::new(data, targets);

        // check that the provided depth is actually used
        for max_depth in &[1, 3, 5] {
            let model = DecisionTree::params()
                .max_depth(Some(*max_depth))
                .min_impurity_decrease(1e-10f64)
                .min_weight_split(1e-10)
                .fit(&dataset)?;
            assert_eq!(model.max_depth(), *max_depth);
        }

        Ok(())
    }

    #[test]
    /// Small perfectly separable dataset test
    ///
    /// This dataset of three elements is perfectly using the second feature.
    fn perfectly_separable_small() -> Result<()> {
        let data = array![[1., 2., 3.], [1., 2., 4.], [1., 3., 3.5]];
        let targets = array![0, 0, 1];

        let dataset = Dataset::new(data.clone(), targets);
        let model = DecisionTree::params().max_depth(Some(1)).fit(&dataset)?;

        assert_eq!(model.predict(&data), array![0, 0, 1]);
        assert_eq!(model.root_node().split().0, 1);
        assert_abs_diff_eq!(model.root_node().split().1, 2.5);

        Ok(())
    }

    #[test]
    /// Small toy dataset from scikit-sklearn
    fn toy_dataset() -> Result<()> {
        let data = array![
            [0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 1.0, -14.0, 0.0, -4.0, 0.0, 0.0, 0.0, 0.0,],
            [0.0, 0.0, 5.0, 3.0, 0.0, -4.0, 0.0, 0.0, 1.0, -5.0, 0.2, 0.0, 4.0, 1.0,],
            [-1.0, -1.0, 0.0, 0.0, -4.5, 0.0, 0.0, 2.1, 1.0, 0.0, 0.0, -4.5, 0.0, 1.0,],
            [-1.0, -1.0, 0.0, -1.2, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.2, 0.0, 0.0, 1.0,],
            [-1.0, -1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0,],
            [-1.0, -2.0, 0.0, 4.0, -3.0, 10.0, 4.0, 0.0, -3.2, 0.0, 4.0, 3.0, -4.0, 1.0,],
            [2.11, 0.0, -6.0, -0.5, 0.0, 11.0, 0.0, 0.0, -3.2, 6.0, 0.5, 0.0, -3.0, 1.0,],
            [2.11, 0.0, -6.0, -0.5, 0.0, 11.0, 0.0, 0.0, -3.2, 6.0, 0.0, 0.0, -2.0, 1.0,],
            [2.11, 8.0, -6.0, -0.5, 0.0, 11.0, 0.0, 0.0, -3.2, 6.0, 0.0, 0.0, -2.0, 1.0,],
            [2.11, 8.0, -6.0, -0.5, 0.0, 11.0, 0.0, 0.0, -3.2, 6.0, 0.5, 0.0, -1.0, 0.0,],
            [2.0, 8.0, 5.0, 1.0, 0.5, -4.0, 10.0, 0.0, 1.0, -5.0, 3.0, 0.0, 2.0, 0.0,],
            [2.0, 0.0, 1.0, 1.0, 1.0, -1.0, 1.0, 0.0, 0.0, -2.0, 3.0, 0.0, 1.0, 0.0,],
            [2.0, 0.0, 1.0, 2.0, 3.0, -1.0, 10.0, 2.0, 0.0, -1.0, 1.0, 2.0, 2.0, 0.0,],
            [1.0, 1.0, 0.0, 2.0, 2.0, -1.0, 1.0, 2.0, 0.0, -5.0, 1.0, 2.0, 3.0, 0.0,],
            [3.0, 1.0, 0.0, 3.0, 0.0, -4.0, 10.0, 0.0, 1.0, -5.0, 3.0, 0.0, 3.0, 1.0,],
            [2.11, 8.0, -6.0, -0.5, 0.0, 1.0, 0.0, 0.0, -3.2, 6.0, 0.5, 0.0, -3.0, 1.0,],
            [2.11, 8.0, -6.0, -0.5, 0.0, 1.0, 0.0, 0.0, -3.2, 6.0, 1.5, 1.0, -1.0, -1.0,],
            [2.11, 8.0, -6.0, -0.5, 0.0, 10.0, 0.0, 0.0, -3.2, 6.0, 0.5, 0.0, -1.0, -1.0,],
            [2.0, 0.0, 5.0, 1.0, 0.5, -2.0, 10.0, 0.0, 1.0, -5.0, 3.0, 1.0, 0.0, -1.0,],
            [2.0, 0.0, 1.0, 1.0, 1.0, -2.0, 1.0, 0.0, 0.0, -2.0, 0.0, 0.0, 0.0, 1.0,],
            [2.0, 1.0, 1.0, 1.0, 2.0, -1.0, 10.0, 2.0, 0.0, -1.0, 0.0, 2.0, 1.0, 1.0,],
            [1.0, 1.0, 0.0, 0.0, 1.0, -3.0, 1.0, 2.0, 0.0, -5.0, 1.0, 2.0, 1.0, 1.0,],
            [3.0, 1.0, 0.0, 1.0, 0.0, -4.0, 1.0, 0.0, 1.0, -2.0, 0.0, 0.0, 1.0, 0.0,]
        ];

        let targets = array![1, 1, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 0, 0, 0, 1, 0, 0, 1, 0, 0, 0, 0];

        let dataset = Dataset::new(data, targets);
        let model = DecisionTree::params().fit(&dataset)?;
        let prediction = model.predict(dataset.records());

        let cm = prediction.confusion_matrix(&dataset)?;
        assert!(cm.accuracy() > 0.95);

        Ok(())
    }

    #[test]
    /// Multilabel classification
    fn multilabel_four_uniform() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut data = concatenate(
            Axis(0),
            &[Array2::random_using((40, 2), Uniform::new(-1., 1.), &mut rng).view()],
        )
        .unwrap();

        data.outer_iter_mut().enumerate().for_each(|(i, mut p)| {
            if i < 10 {
                p += &array![-2., -2.]
            } else if i < 20 {
                p += &array![-2., 2.];
            } else if i < 30 {
                p += &array![2., -2.];
            } else {
                p += &array![2., 2.];
            }
        });

        let targets = (0..40)
            .map(|x| match x {
                x if x < 10 => 0,
                x if x < 20 => 1,
                x if x < 30 => 2,
                _ => 3,
            })
            .collect::<Array1<_>>();

        let dataset = Dataset::new(data.clone(), targets);

        let model = DecisionTree::params().fit(&dataset)?;
        let prediction = model.predict(&data);

        let cm = prediction.confusion_matrix(&dataset)?;
        assert!(cm.accuracy() > 0.99);
        assert_eq!(model.classes(), &[0, 1, 2, 3]);

        Ok(())
    }

    #[test]
    fn probabilities_follow_leaf_frequencies() -> Result<()> {
        // with two samples per leaf the best split separates [f, t, f] from [t, t]
        let data = array![[0.], [1.], [2.], [10.], [11.]];
        let dataset = Dataset::new(data.clone(), array![false, true, false, true, true]);

        let model = DecisionTree::params()
            .max_depth(Some(1))
            .min_weight_leaf(2.0)
            .fit(&dataset)?;
        let proba = model.predict_proba(&data);

        assert_eq!(proba.dim(), (5, 2));
        for row in proba.rows() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(proba.row(0), array![2. / 3., 1. / 3.], epsilon = 1e-12);
        assert_abs_diff_eq!(proba.row(4), array![0., 1.], epsilon = 1e-12);

        Ok(())
    }

    #[test]
    fn sample_weights_shift_the_prediction() -> Result<()> {
        // a constant feature can not be split, the root predicts the heavier class
        let data = array![[1.], [1.], [1.]];
        let dataset = Dataset::new(data.clone(), array![true, false, false])
            .with_weights(array![5., 1., 1.]);

        let model = DecisionTree::params().fit(&dataset)?;

        assert_eq!(model.num_leaves(), 1);
        assert_eq!(model.predict(&data), array![true, true, true]);
        let proba = model.predict_proba(&data);
        assert_abs_diff_eq!(proba.row(0), array![2. / 7., 5. / 7.], epsilon = 1e-12);

        Ok(())
    }

    #[test]
    fn min_weight_leaf_blocks_splits() -> Result<()> {
        let data = array![[0.], [1.], [2.], [3.]];
        let dataset = Dataset::new(data, array![false, false, true, true]);

        let model = DecisionTree::params().min_weight_leaf(3.0).fit(&dataset)?;
        assert_eq!(model.num_leaves(), 1);
        assert!(model.feature_importance().iter().all(|x| *x == 0.0));

        Ok(())
    }

    #[test]
    fn feature_sampling_is_seeded() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(7);
        let data = Array::random_using((80, 6), Uniform::new(-1., 1.), &mut rng);
        let targets = data.column(0).mapv(|x| x > 0.2);
        let dataset = Dataset::new(data, targets);

        let params = DecisionTree::params().max_features(Some(0.5)).seed(3);
        let a = params.fit(&dataset)?;
        let b = params.fit(&dataset)?;

        assert_eq!(a, b);

        Ok(())
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let dataset = Dataset::new(Array2::<f64>::zeros((0, 2)), Array1::<bool>::from(vec![]));

        assert!(DecisionTree::params().fit(&dataset).is_err());
    }

    #[test]
    #[should_panic]
    /// Check that a small or negative impurity decrease panics
    fn panic_min_impurity_decrease() {
        DecisionTree::<f64, bool>::params()
            .min_impurity_decrease(0.0)
            .check()
            .unwrap();
    }
}
