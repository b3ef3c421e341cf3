//! Regression trees fitted on the gradients and hessians of the boosting loss
//!
//! Nodes live in an arena, the root has index zero. A split sends a sample to the left child iff
//! its feature value is smaller or equal than the threshold.

use cardio::Float;
use ndarray::{ArrayBase, ArrayView2, Data, Ix1};
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub enum BoostNode<F> {
    /// Leaf with its output, already scaled by the learning rate
    Leaf { value: f64 },
    Split {
        feature: usize,
        threshold: F,
        gain: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted regression tree of a boosted ensemble
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct BoostedTree<F> {
    nodes: Vec<BoostNode<F>>,
}

impl<F: Float> BoostedTree<F> {
    pub fn nodes(&self) -> &[BoostNode<F>] {
        &self.nodes
    }

    pub fn num_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, BoostNode::Leaf { .. }))
            .count()
    }

    /// Number of splits on the longest path from the root to a leaf
    pub fn depth(&self) -> usize {
        let mut stack = vec![(0, 0)];
        let mut max_depth = 0;
        while let Some((idx, depth)) = stack.pop() {
            match &self.nodes[idx] {
                BoostNode::Leaf { .. } => max_depth = max_depth.max(depth),
                BoostNode::Split { left, right, .. } => {
                    stack.push((*left, depth + 1));
                    stack.push((*right, depth + 1));
                }
            }
        }
        max_depth
    }

    /// Output of the tree for a single sample
    pub fn predict_row<D: Data<Elem = F>>(&self, row: &ArrayBase<D, Ix1>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                BoostNode::Leaf { value } => return *value,
                BoostNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Adds the split gains of the tree to `importance`, indexed by feature
    pub(crate) fn accumulate_gain(&self, importance: &mut [f64]) {
        for node in &self.nodes {
            if let BoostNode::Split { feature, gain, .. } = node {
                importance[*feature] += gain;
            }
        }
    }
}

/// Limits and regularization of a single tree
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeConfig {
    pub max_depth: Option<usize>,
    pub max_leaves: Option<usize>,
    pub min_child_weight: f64,
    pub min_samples_leaf: usize,
    pub reg_alpha: f64,
    pub reg_lambda: f64,
    pub min_split_gain: f64,
    pub shrinkage: f64,
}

impl TreeConfig {
    /// Gradient sum after the l1 penalty
    fn threshold_l1(&self, g: f64) -> f64 {
        if g > self.reg_alpha {
            g - self.reg_alpha
        } else if g < -self.reg_alpha {
            g + self.reg_alpha
        } else {
            0.0
        }
    }

    /// Loss reduction of a node holding the sums `g` and `h`, up to a factor of one half
    fn score(&self, g: f64, h: f64) -> f64 {
        let denom = h + self.reg_lambda;
        if denom <= 0.0 {
            return 0.0;
        }
        let g = self.threshold_l1(g);
        g * g / denom
    }

    /// Optimal leaf output `-T(G) / (H + lambda)`, scaled by the learning rate
    fn leaf_value(&self, g: f64, h: f64) -> f64 {
        let denom = h + self.reg_lambda;
        if denom <= 0.0 {
            return 0.0;
        }
        -self.threshold_l1(g) / denom * self.shrinkage
    }
}

#[derive(Debug)]
struct SplitCandidate<F> {
    feature: usize,
    threshold: F,
    gain: f64,
}

struct Pending<F> {
    node: usize,
    depth: usize,
    rows: Vec<usize>,
    split: SplitCandidate<F>,
}

/// Grows a tree best-first: the open leaf with the largest gain is split next
///
/// Without a leaf budget every splittable leaf is split eventually, which yields the same tree as
/// depth-wise growth.
pub(crate) struct TreeBuilder<'a, F> {
    pub records: ArrayView2<'a, F>,
    pub gradients: &'a [f64],
    pub hessians: &'a [f64],
    pub features: &'a [usize],
    pub config: TreeConfig,
}

impl<'a, F: Float> TreeBuilder<'a, F> {
    fn sums(&self, rows: &[usize]) -> (f64, f64) {
        rows.iter().fold((0.0, 0.0), |(g, h), &r| {
            (g + self.gradients[r], h + self.hessians[r])
        })
    }

    fn can_grow(&self, depth: usize, rows: &[usize]) -> bool {
        self.config.max_depth.map_or(true, |max| depth < max)
            && rows.len() >= 2 * self.config.min_samples_leaf.max(1)
    }

    /// Best split of a single feature by exact greedy search
    fn best_split_of_feature(&self, rows: &[usize], feature: usize) -> Option<SplitCandidate<F>> {
        let column = self.records.column(feature);
        let mut sorted = rows.to_vec();
        sorted.sort_by(|a, b| {
            column[*a]
                .partial_cmp(&column[*b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let (g_total, h_total) = self.sums(rows);
        let parent = self.config.score(g_total, h_total);
        let min_leaf = self.config.min_samples_leaf.max(1);

        let mut best: Option<SplitCandidate<F>> = None;
        let (mut g_left, mut h_left) = (0.0, 0.0);
        for (pos, pair) in sorted.windows(2).enumerate() {
            g_left += self.gradients[pair[0]];
            h_left += self.hessians[pair[0]];

            let (value, next) = (column[pair[0]], column[pair[1]]);
            if next.is_nan() {
                break;
            }
            if value == next {
                continue;
            }

            let n_left = pos + 1;
            if n_left < min_leaf || sorted.len() - n_left < min_leaf {
                continue;
            }
            let (g_right, h_right) = (g_total - g_left, h_total - h_left);
            if h_left < self.config.min_child_weight || h_right < self.config.min_child_weight {
                continue;
            }

            let gain = 0.5
                * (self.config.score(g_left, h_left) + self.config.score(g_right, h_right)
                    - parent)
                - self.config.min_split_gain;
            if gain > 0.0 && best.as_ref().map_or(true, |b| gain > b.gain) {
                let mut threshold = (value + next) / F::cast(2.0);
                if threshold >= next {
                    threshold = value;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    gain,
                });
            }
        }

        best
    }

    /// Best split over all candidate features, ties go to the feature listed first
    fn best_split(&self, rows: &[usize]) -> Option<SplitCandidate<F>> {
        let per_feature = self
            .features
            .par_iter()
            .map(|&feature| self.best_split_of_feature(rows, feature))
            .collect::<Vec<_>>();

        per_feature
            .into_iter()
            .flatten()
            .fold(None, |best: Option<SplitCandidate<F>>, candidate| match best {
                Some(b) if b.gain >= candidate.gain => Some(b),
                _ => Some(candidate),
            })
    }

    fn leaf(&self, rows: &[usize]) -> BoostNode<F> {
        let (g, h) = self.sums(rows);
        BoostNode::Leaf {
            value: self.config.leaf_value(g, h),
        }
    }

    pub fn build(&self, rows: Vec<usize>) -> BoostedTree<F> {
        let mut nodes = vec![self.leaf(&rows)];
        let mut pending = Vec::new();
        if self.can_grow(0, &rows) {
            if let Some(split) = self.best_split(&rows) {
                pending.push(Pending {
                    node: 0,
                    depth: 0,
                    rows,
                    split,
                });
            }
        }

        let mut leaves = 1;
        while self.config.max_leaves.map_or(true, |max| leaves < max) {
            // the earliest queued leaf wins ties
            let next = pending
                .iter()
                .enumerate()
                .fold(None, |best: Option<(usize, f64)>, (idx, p)| match best {
                    Some((_, gain)) if gain >= p.split.gain => best,
                    _ => Some((idx, p.split.gain)),
                });
            let Pending {
                node,
                depth,
                rows,
                split,
            } = match next {
                Some((idx, _)) => pending.remove(idx),
                None => break,
            };

            let column = self.records.column(split.feature);
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .into_iter()
                .partition(|&r| column[r] <= split.threshold);

            let left = nodes.len();
            nodes.push(self.leaf(&left_rows));
            let right = nodes.len();
            nodes.push(self.leaf(&right_rows));
            nodes[node] = BoostNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                gain: split.gain,
                left,
                right,
            };
            leaves += 1;

            for (child, child_rows) in [(left, left_rows), (right, right_rows)] {
                if !self.can_grow(depth + 1, &child_rows) {
                    continue;
                }
                if let Some(split) = self.best_split(&child_rows) {
                    pending.push(Pending {
                        node: child,
                        depth: depth + 1,
                        rows: child_rows,
                        split,
                    });
                }
            }
        }

        BoostedTree { nodes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn config() -> TreeConfig {
        TreeConfig {
            max_depth: None,
            max_leaves: None,
            min_child_weight: 0.0,
            min_samples_leaf: 1,
            reg_alpha: 0.0,
            reg_lambda: 0.0,
            min_split_gain: 0.0,
            shrinkage: 1.0,
        }
    }

    #[test]
    fn leaf_value_is_newton_step() {
        let mut config = config();
        config.reg_lambda = 1.0;
        assert_abs_diff_eq!(config.leaf_value(-4.0, 3.0), 1.0);

        config.reg_alpha = 2.0;
        assert_abs_diff_eq!(config.leaf_value(-4.0, 3.0), 0.5);
        assert_abs_diff_eq!(config.leaf_value(1.5, 3.0), 0.0);
    }

    #[test]
    fn splits_at_the_gradient_sign_change() {
        let records = array![[1.0], [2.0], [3.0], [4.0]];
        let gradients = [-1.0, -1.0, 1.0, 1.0];
        let hessians = [1.0; 4];
        let builder = TreeBuilder {
            records: records.view(),
            gradients: &gradients,
            hessians: &hessians,
            features: &[0],
            config: config(),
        };

        let tree = builder.build(vec![0, 1, 2, 3]);
        assert_eq!(tree.num_leaves(), 2);
        assert_eq!(
            tree.nodes()[0],
            BoostNode::Split {
                feature: 0,
                threshold: 2.5,
                gain: 2.0,
                left: 1,
                right: 2
            }
        );
        assert_abs_diff_eq!(tree.predict_row(&array![0.0]), 1.0);
        assert_abs_diff_eq!(tree.predict_row(&array![9.0]), -1.0);
    }

    #[test]
    fn leaf_budget_limits_growth() {
        let records = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0]];
        let gradients = [-3.0, -1.0, 2.0, -2.0, 1.0, 3.0, -1.0, 4.0];
        let hessians = [1.0; 8];
        let mut builder = TreeBuilder {
            records: records.view(),
            gradients: &gradients,
            hessians: &hessians,
            features: &[0],
            config: config(),
        };

        let unlimited = builder.build((0..8).collect());
        assert!(unlimited.num_leaves() > 3);

        builder.config.max_leaves = Some(3);
        assert_eq!(builder.build((0..8).collect()).num_leaves(), 3);

        builder.config.max_leaves = None;
        builder.config.max_depth = Some(1);
        let stump = builder.build((0..8).collect());
        assert_eq!(stump.depth(), 1);
    }

    #[test]
    fn min_child_weight_blocks_splits() {
        let records = array![[1.0], [2.0], [3.0], [4.0]];
        let gradients = [-1.0, -1.0, 1.0, 1.0];
        let hessians = [0.25; 4];
        let mut config = config();
        config.min_child_weight = 1.0;
        let builder = TreeBuilder {
            records: records.view(),
            gradients: &gradients,
            hessians: &hessians,
            features: &[0],
            config,
        };

        assert_eq!(builder.build(vec![0, 1, 2, 3]).num_leaves(), 1);
    }
}
