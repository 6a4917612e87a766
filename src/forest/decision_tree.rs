//! Multi-class CART decision tree (Gini impurity)

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::{ModelError, ModelResult};

/// Decision tree configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum depth of tree
    pub max_depth: usize,
    /// Minimum samples required to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf node
    pub min_samples_leaf: usize,
    /// Maximum features to consider for split (None = all)
    pub max_features: Option<usize>,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
            seed: 42,
        }
    }
}

/// Tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    /// Feature index for split
    pub feature_idx: Option<usize>,
    /// Threshold for split (`<=` goes left)
    pub threshold: Option<f64>,
    /// Class distribution of the training samples that reached this node
    pub class_probs: Vec<f64>,
    /// Number of samples in this node
    pub n_samples: usize,
    pub left: Option<Box<TreeNode>>,
    pub right: Option<Box<TreeNode>>,
    /// Gini impurity at this node
    pub impurity: f64,
}

impl TreeNode {
    fn leaf(class_probs: Vec<f64>, n_samples: usize, impurity: f64) -> Self {
        Self {
            feature_idx: None,
            threshold: None,
            class_probs,
            n_samples,
            left: None,
            right: None,
            impurity,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn depth(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            1 + self
                .left
                .as_ref()
                .map(|n| n.depth())
                .unwrap_or(0)
                .max(self.right.as_ref().map(|n| n.depth()).unwrap_or(0))
        }
    }

    pub fn n_leaves(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.left.as_ref().map(|n| n.n_leaves()).unwrap_or(0)
                + self.right.as_ref().map(|n| n.n_leaves()).unwrap_or(0)
        }
    }
}

struct Split {
    feature_idx: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
    importance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    config: TreeConfig,
    n_classes: usize,
    root: Option<TreeNode>,
    feature_importances: Vec<f64>,
}

impl DecisionTree {
    pub fn new(config: TreeConfig, n_classes: usize) -> Self {
        Self {
            config,
            n_classes,
            root: None,
            feature_importances: Vec::new(),
        }
    }

    pub fn fit(&mut self, dataset: &Dataset) {
        let n_features = dataset.n_features();
        self.feature_importances = vec![0.0; n_features];

        let indices: Vec<usize> = (0..dataset.n_samples()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        self.root = Some(self.build_tree(dataset, &indices, 0, &mut rng));

        let sum: f64 = self.feature_importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut self.feature_importances {
                *imp /= sum;
            }
        }
    }

    fn build_tree(
        &mut self,
        dataset: &Dataset,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let counts = self.class_counts(dataset, indices);
        let n = indices.len();
        let impurity = gini(&counts, n);

        if depth >= self.config.max_depth || n < self.config.min_samples_split || impurity < 1e-10 {
            return TreeNode::leaf(probabilities(&counts, n), n, impurity);
        }

        match self.find_best_split(dataset, indices, &counts, impurity, rng) {
            Some(split) => {
                self.feature_importances[split.feature_idx] += split.importance;

                let left = self.build_tree(dataset, &split.left, depth + 1, rng);
                let right = self.build_tree(dataset, &split.right, depth + 1, rng);

                TreeNode {
                    feature_idx: Some(split.feature_idx),
                    threshold: Some(split.threshold),
                    class_probs: probabilities(&counts, n),
                    n_samples: n,
                    left: Some(Box::new(left)),
                    right: Some(Box::new(right)),
                    impurity,
                }
            }
            None => TreeNode::leaf(probabilities(&counts, n), n, impurity),
        }
    }

    /// Sweep each candidate feature in sorted order, moving one sample at a
    /// time from the right partition to the left.
    fn find_best_split(
        &self,
        dataset: &Dataset,
        indices: &[usize],
        parent_counts: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<Split> {
        let n = indices.len();
        let n_features = dataset.n_features();
        if n < 2 || n_features == 0 {
            return None;
        }
        let max_features = self.config.max_features.unwrap_or(n_features).clamp(1, n_features);

        let mut feature_indices: Vec<usize> = (0..n_features).collect();
        feature_indices.shuffle(rng);
        feature_indices.truncate(max_features);

        let min_leaf = self.config.min_samples_leaf.max(1);
        let mut best_gain = 0.0;
        let mut best: Option<(usize, f64, Vec<usize>, usize)> = None;

        for &feature_idx in &feature_indices {
            let mut sorted = indices.to_vec();
            sorted.sort_by(|&a, &b| {
                dataset.features[a][feature_idx].total_cmp(&dataset.features[b][feature_idx])
            });

            let mut left_counts = vec![0usize; self.n_classes];
            let mut right_counts = parent_counts.to_vec();

            for pos in 0..n - 1 {
                let label = dataset.labels[sorted[pos]];
                left_counts[label] += 1;
                right_counts[label] -= 1;

                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let here = dataset.features[sorted[pos]][feature_idx];
                let next = dataset.features[sorted[pos + 1]][feature_idx];
                if here == next {
                    continue;
                }

                let weighted = (n_left as f64 * gini(&left_counts, n_left)
                    + n_right as f64 * gini(&right_counts, n_right))
                    / n as f64;
                let gain = parent_impurity - weighted;

                if gain > best_gain {
                    best_gain = gain;
                    best = Some((feature_idx, (here + next) / 2.0, sorted.clone(), n_left));
                }
            }
        }

        best.map(|(feature_idx, threshold, sorted, n_left)| {
            let (left, right) = sorted.split_at(n_left);
            Split {
                feature_idx,
                threshold,
                left: left.to_vec(),
                right: right.to_vec(),
                importance: best_gain * n as f64,
            }
        })
    }

    fn class_counts(&self, dataset: &Dataset, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[dataset.labels[i]] += 1;
        }
        counts
    }

    /// Class probabilities for one feature vector
    pub fn predict_proba_one(&self, features: &[f64]) -> ModelResult<Vec<f64>> {
        let mut node = self.root.as_ref().ok_or(ModelError::NotTrained)?;

        loop {
            match (node.feature_idx, node.threshold, &node.left, &node.right) {
                (Some(idx), Some(threshold), Some(left), Some(right)) => {
                    let value = features.get(idx).ok_or_else(|| {
                        ModelError::MalformedFeatures(format!(
                            "split on feature {} but only {} features given",
                            idx,
                            features.len()
                        ))
                    })?;
                    node = if *value <= threshold { left } else { right };
                }
                _ => break,
            }
        }

        if node.class_probs.len() != self.n_classes {
            return Err(ModelError::InvalidModel(format!(
                "leaf has {} class probabilities, expected {}",
                node.class_probs.len(),
                self.n_classes
            )));
        }
        Ok(node.class_probs.clone())
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn depth(&self) -> usize {
        self.root.as_ref().map(|r| r.depth()).unwrap_or(0)
    }

    pub fn n_leaves(&self) -> usize {
        self.root.as_ref().map(|r| r.n_leaves()).unwrap_or(0)
    }
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

fn probabilities(counts: &[usize], n: usize) -> Vec<f64> {
    if n == 0 {
        let k = counts.len().max(1) as f64;
        return vec![1.0 / k; counts.len()];
    }
    counts.iter().map(|&c| c as f64 / n as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn threshold_dataset() -> Dataset {
        let mut dataset = Dataset::new();
        for i in 0..120 {
            let x = i as f64;
            let label = (i / 30) as usize;
            dataset.add_sample(vec![x, 0.0], label);
        }
        dataset
    }

    #[test]
    fn test_learns_ordered_thresholds() {
        let mut tree = DecisionTree::new(TreeConfig::default(), 4);
        tree.fit(&threshold_dataset());

        for (x, expected) in [(5.0, 0), (45.0, 1), (75.0, 2), (110.0, 3)] {
            let probs = tree.predict_proba_one(&[x, 0.0]).unwrap();
            let argmax = probs
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap();
            assert_eq!(argmax, expected, "x={} probs={:?}", x, probs);
        }
        assert!(tree.feature_importances()[0] > 0.99);
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(&[10, 0, 0, 0], 10), 0.0);
        assert!((gini(&[5, 5, 0, 0], 10) - 0.5).abs() < 1e-12);
        assert!((gini(&[1, 1, 1, 1], 4) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_unfitted_tree_reports_not_trained() {
        let tree = DecisionTree::new(TreeConfig::default(), 4);
        assert!(matches!(tree.predict_proba_one(&[1.0, 2.0]), Err(ModelError::NotTrained)));
    }

    #[test]
    fn test_short_feature_vector_is_an_error() {
        let mut tree = DecisionTree::new(TreeConfig::default(), 4);
        tree.fit(&threshold_dataset());
        assert!(matches!(
            tree.predict_proba_one(&[]),
            Err(ModelError::MalformedFeatures(_))
        ));
    }

    #[test]
    fn test_depth_is_bounded() {
        let config = TreeConfig {
            max_depth: 2,
            ..Default::default()
        };
        let mut tree = DecisionTree::new(config, 4);
        tree.fit(&threshold_dataset());
        assert!(tree.depth() <= 3);
        assert!(tree.n_leaves() <= 4);
    }
}
