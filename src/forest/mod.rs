//! Random forest classifier
//!
//! Bagged CART trees with random feature subsets per split. Each tree gets
//! its own seed (`seed + tree index`) so a parallel fit is reproducible.

pub mod decision_tree;

pub use decision_tree::{DecisionTree, TreeConfig, TreeNode};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::{ModelError, ModelResult};
use crate::sanitize::normalize_probabilities;

/// Random Forest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Max features per split (ceil(sqrt(n_features)) if None)
    pub max_features: Option<usize>,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    n_classes: usize,
    n_features: usize,
    trees: Vec<DecisionTree>,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    pub fn new(config: ForestConfig, n_classes: usize) -> Self {
        Self {
            config,
            n_classes,
            n_features: 0,
            trees: Vec::new(),
            feature_importances: Vec::new(),
        }
    }

    pub fn fit(&mut self, dataset: &Dataset) -> ModelResult<()> {
        if dataset.is_empty() {
            return Err(ModelError::DegenerateDataset("no training samples".into()));
        }
        if self.config.n_trees == 0 {
            return Err(ModelError::DegenerateDataset("forest needs at least one tree".into()));
        }
        if let Some(bad) = dataset.labels.iter().find(|&&l| l >= self.n_classes) {
            return Err(ModelError::DegenerateDataset(format!(
                "label {} out of range for {} classes",
                bad, self.n_classes
            )));
        }

        let n_features = dataset.n_features();
        if dataset.features.iter().any(|row| row.len() != n_features) {
            return Err(ModelError::DegenerateDataset("ragged feature rows".into()));
        }

        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize);

        let trees: Vec<DecisionTree> = (0..self.config.n_trees)
            .into_par_iter()
            .map(|i| {
                let tree_seed = self.config.seed.wrapping_add(i as u64);
                let tree_config = TreeConfig {
                    max_depth: self.config.max_depth,
                    min_samples_split: self.config.min_samples_split,
                    min_samples_leaf: self.config.min_samples_leaf,
                    max_features: Some(max_features),
                    seed: tree_seed,
                };

                let mut tree = DecisionTree::new(tree_config, self.n_classes);
                if self.config.bootstrap {
                    tree.fit(&dataset.bootstrap_sample(tree_seed));
                } else {
                    tree.fit(dataset);
                }
                tree
            })
            .collect();

        self.trees = trees;
        self.n_features = n_features;

        self.feature_importances = vec![0.0; n_features];
        for tree in &self.trees {
            for (acc, &imp) in self.feature_importances.iter_mut().zip(tree.feature_importances()) {
                *acc += imp;
            }
        }
        let sum: f64 = self.feature_importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut self.feature_importances {
                *imp /= sum;
            }
        }

        Ok(())
    }

    /// Mean of the per-tree class distributions
    pub fn predict_proba(&self, features: &[f64]) -> ModelResult<Vec<f64>> {
        if self.trees.is_empty() {
            return Err(ModelError::NotTrained);
        }
        if features.len() != self.n_features {
            return Err(ModelError::MalformedFeatures(format!(
                "forest expects {} features, got {}",
                self.n_features,
                features.len()
            )));
        }

        let mut total = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let probs = tree.predict_proba_one(features)?;
            for (acc, p) in total.iter_mut().zip(probs) {
                *acc += p;
            }
        }

        if !normalize_probabilities(&mut total) {
            return Err(ModelError::InvalidModel("forest produced no probability mass".into()));
        }
        Ok(total)
    }

    /// Argmax class and the full distribution
    pub fn predict(&self, features: &[f64]) -> ModelResult<(usize, Vec<f64>)> {
        let probs = self.predict_proba(features)?;
        let class = argmax(&probs);
        Ok((class, probs))
    }

    /// Fraction of samples whose argmax class matches the label
    pub fn accuracy(&self, dataset: &Dataset) -> f64 {
        if dataset.is_empty() {
            return 0.0;
        }
        let correct = dataset
            .features
            .iter()
            .zip(&dataset.labels)
            .filter(|(row, &label)| matches!(self.predict(row), Ok((class, _)) if class == label))
            .count();
        correct as f64 / dataset.n_samples() as f64
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }
}

/// Index of the largest value; ties keep the lowest index
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
