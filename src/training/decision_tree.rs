//! Regression tree with an MSE split criterion

use crate::error::{HappinessError, Result};
use super::models::Regressor;
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf { value: f64, n_samples: usize },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    /// Reduction of the summed squared error
    gain: f64,
}

/// Decision tree regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features drawn per split; all when `None`
    pub max_features: Option<usize>,
    /// Number of features
    n_features: usize,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    /// Create a new regressor tree
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Consider only `n` randomly drawn features at each split
    pub fn with_max_features(mut self, n: usize) -> Self {
        self.max_features = Some(n.max(1));
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        self.fit_with_rng(x, y, &mut rng)
    }

    /// Fit using `rng` for per-split feature sampling
    pub fn fit_with_rng(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rng: &mut ChaCha8Rng,
    ) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(HappinessError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(HappinessError::TrainingError(
                "cannot grow a tree from zero samples".to_string(),
            ));
        }

        self.n_features = n_features;

        let mut importances = vec![0.0; n_features];
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, y, indices, 0, &mut importances, rng));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: Vec<usize>,
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let (sum, sq_sum) = indices
            .iter()
            .fold((0.0, 0.0), |(s, q), &i| (s + y[i], q + y[i] * y[i]));
        let mean = sum / n_samples as f64;
        let sse = (sq_sum - sum * sum / n_samples as f64).max(0.0);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || is_pure(y, &indices);

        if should_stop {
            return TreeNode::Leaf { value: mean, n_samples };
        }

        let candidates = self.candidate_features(rng);
        let Some(best) = self.find_best_split(x, y, &indices, &candidates, sse) else {
            return TreeNode::Leaf { value: mean, n_samples };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[[i, best.feature_idx]] <= best.threshold);

        importances[best.feature_idx] += best.gain;

        let left = Box::new(self.build_tree(x, y, left_indices, depth + 1, importances, rng));
        let right = Box::new(self.build_tree(x, y, right_indices, depth + 1, importances, rng));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
            impurity: sse / n_samples as f64,
        }
    }

    fn candidate_features(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        match self.max_features {
            Some(k) if k < self.n_features => {
                let mut drawn = index::sample(rng, self.n_features, k).into_vec();
                drawn.sort_unstable();
                drawn
            }
            _ => (0..self.n_features).collect(),
        }
    }

    /// Scan each candidate feature in sorted order with running sums and
    /// return the split with the largest SSE reduction.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        candidates: &[usize],
        parent_sse: f64,
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.min_samples_leaf;
        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();

        let per_feature: Vec<Option<SplitCandidate>> = candidates
            .par_iter()
            .map(|&feature_idx| {
                let mut pairs: Vec<(f64, f64)> = indices
                    .iter()
                    .map(|&i| (x[[i, feature_idx]], y[i]))
                    .collect();
                pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

                let mut best: Option<SplitCandidate> = None;
                let mut left_sum = 0.0;
                let mut left_sq = 0.0;

                for k in 0..n - 1 {
                    let (value, target) = pairs[k];
                    left_sum += target;
                    left_sq += target * target;

                    let next = pairs[k + 1].0;
                    if next <= value {
                        continue;
                    }

                    let n_left = k + 1;
                    let n_right = n - n_left;
                    if n_left < min_leaf || n_right < min_leaf {
                        continue;
                    }

                    let right_sum = total_sum - left_sum;
                    let right_sq = total_sq - left_sq;
                    let left_sse = left_sq - left_sum * left_sum / n_left as f64;
                    let right_sse = right_sq - right_sum * right_sum / n_right as f64;
                    let gain = parent_sse - (left_sse + right_sse);

                    if gain > best.map_or(0.0, |b| b.gain) {
                        let mut threshold = (value + next) / 2.0;
                        // midpoint of adjacent floats can round up to `next`
                        if threshold >= next {
                            threshold = value;
                        }
                        best = Some(SplitCandidate {
                            feature_idx,
                            threshold,
                            gain,
                        });
                    }
                }

                best
            })
            .collect();

        // Earliest feature wins ties so the result is independent of thread timing
        per_feature
            .into_iter()
            .flatten()
            .fold(None, |acc: Option<SplitCandidate>, c| match acc {
                Some(a) if a.gain >= c.gain => Some(a),
                _ => Some(c),
            })
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(HappinessError::ModelNotFitted)?;

        if x.ncols() != self.n_features {
            return Err(HappinessError::ShapeError {
                expected: format!("{} columns", self.n_features),
                actual: format!("{} columns", x.ncols()),
            });
        }

        Ok(x.rows()
            .into_iter()
            .map(|row| Self::predict_sample(root, row))
            .collect())
    }

    fn predict_sample(mut node: &TreeNode, sample: ArrayView1<f64>) -> f64 {
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if sample[*feature_idx] <= *threshold {
                        &**left
                    } else {
                        &**right
                    };
                }
            }
        }
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get tree depth
    pub fn get_depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, depth)
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        fn leaves(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        self.root.as_ref().map_or(0, leaves)
    }
}

fn is_pure(y: &Array1<f64>, indices: &[usize]) -> bool {
    match indices.first() {
        None => true,
        Some(&first) => indices.iter().all(|&i| (y[i] - y[first]).abs() < 1e-10),
    }
}

impl Regressor for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        DecisionTree::fit(self, x, y)?;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        DecisionTree::predict(self, x)
    }

    fn name(&self) -> &'static str {
        "Decision Tree"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regressor_simple() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        // fully grown tree memorizes distinct points
        let predictions = tree.predict(&x).unwrap();
        for (p, a) in predictions.iter().zip(y.iter()) {
            assert!((p - a).abs() < 1e-12);
        }
        assert_eq!(tree.get_n_leaves(), 5);
    }

    #[test]
    fn test_step_function_threshold() {
        let x = array![[0.0], [1.0], [2.0], [10.0], [11.0], [12.0]];
        let y = array![0.0, 0.0, 0.0, 5.0, 5.0, 5.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.get_depth(), 2);
        let pred = tree.predict(&array![[5.9], [6.1]]).unwrap();
        assert_eq!(pred, array![0.0, 5.0]);
    }

    #[test]
    fn test_max_depth() {
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let y = array![0.0, 1.0, 2.0, 3.0];

        let mut tree = DecisionTree::new().with_max_depth(1);
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.get_depth(), 2);
        assert_eq!(tree.get_n_leaves(), 2);
    }

    #[test]
    fn test_min_samples_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![0.0, 10.0, 20.0, 30.0];

        let mut tree = DecisionTree::new().with_min_samples_leaf(2);
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.get_n_leaves(), 2);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let importances = tree.feature_importances().unwrap();
        assert!((importances[0] - 1.0).abs() < 1e-12);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_single_sample_is_leaf() {
        let mut tree = DecisionTree::new();
        tree.fit(&array![[3.0]], &array![7.5]).unwrap();
        assert_eq!(tree.predict(&array![[100.0]]).unwrap(), array![7.5]);
    }

    #[test]
    fn test_feature_sampling_is_seeded() {
        let x = Array2::from_shape_fn((30, 4), |(r, c)| ((r * (c + 3)) % 11) as f64);
        let y = Array1::from_shape_fn(30, |r| (r % 7) as f64);

        let mut a = DecisionTree::new().with_max_features(2);
        let mut b = DecisionTree::new().with_max_features(2);
        a.fit_with_rng(&x, &y, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        b.fit_with_rng(&x, &y, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_predict_before_fit() {
        let tree = DecisionTree::new();
        assert!(matches!(
            tree.predict(&array![[1.0]]),
            Err(HappinessError::ModelNotFitted)
        ));
    }
}
