//! Random forest classifier
//!
//! Bootstrap-aggregated CART trees with per-node random feature subsets.
//! Every tree gets its own RNG derived from the forest seed, so trees can be
//! fit in parallel while the fitted forest stays a pure function of
//! (data, params).

mod tree;

pub use tree::{gini, DecisionTree, Node, TreeBuilder};

use crate::error::{HiringError, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Seed used by every shipped training preset
pub const DEFAULT_SEED: u64 = 42;

/// Number of features considered at each split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxFeatures {
    Sqrt,
    All,
    Count(usize),
}

impl MaxFeatures {
    pub fn resolve(self, n_features: usize) -> usize {
        let n = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(k) => k.min(n_features),
        };
        n.max(1)
    }
}

/// Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    /// Reweight classes inversely to their frequency
    pub balanced_class_weight: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self::legacy()
    }
}

impl ForestParams {
    /// Hyperparameters of the smart hiring match model
    pub fn smart_hiring() -> Self {
        Self {
            n_trees: 200,
            max_depth: Some(15),
            min_samples_split: 10,
            min_samples_leaf: 5,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            balanced_class_weight: true,
            seed: DEFAULT_SEED,
        }
    }

    /// Hyperparameters of the candidate form model
    pub fn legacy() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            balanced_class_weight: false,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(HiringError::invalid_input("n_trees", "must be at least 1"));
        }
        if self.min_samples_split < 2 {
            return Err(HiringError::invalid_input("min_samples_split", "must be at least 2"));
        }
        if self.min_samples_leaf == 0 {
            return Err(HiringError::invalid_input("min_samples_leaf", "must be at least 1"));
        }
        if let MaxFeatures::Count(0) = self.max_features {
            return Err(HiringError::invalid_input("max_features", "must be at least 1"));
        }
        Ok(())
    }
}

/// Fitted random forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    importances: Vec<f64>,
}

impl RandomForest {
    /// Fit a forest on row-major feature vectors and binary labels
    pub fn fit(x: &[Vec<f64>], y: &[bool], params: &ForestParams) -> Result<Self> {
        params.validate()?;
        if x.is_empty() {
            return Err(HiringError::InsufficientData { rows: 0, min: 1 });
        }
        if x.len() != y.len() {
            return Err(HiringError::invalid_input(
                "labels",
                format!("{} feature rows but {} labels", x.len(), y.len()),
            ));
        }
        let n_features = x[0].len();
        if let Some(row) = x.iter().find(|row| row.len() != n_features) {
            return Err(HiringError::SchemaMismatch {
                expected: n_features,
                actual: row.len(),
            });
        }

        let class_weights = class_weights(y, params.balanced_class_weight);
        let max_features = params.max_features.resolve(n_features);

        let mut master = ChaCha8Rng::seed_from_u64(params.seed);
        let tree_seeds: Vec<u64> = (0..params.n_trees).map(|_| master.gen()).collect();

        let fitted: Vec<(DecisionTree, Vec<f64>)> = tree_seeds
            .into_par_iter()
            .map(|seed| fit_tree(x, y, &class_weights, params, max_features, seed))
            .collect();

        let mut importances = vec![0.0; n_features];
        let mut trees = Vec::with_capacity(fitted.len());
        for (tree, tree_importances) in fitted {
            let total: f64 = tree_importances.iter().sum();
            if total > 0.0 {
                for (acc, value) in importances.iter_mut().zip(&tree_importances) {
                    *acc += value / total;
                }
            }
            trees.push(tree);
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }

        debug!(
            trees = trees.len(),
            rows = x.len(),
            features = n_features,
            max_features,
            "Random forest fitted"
        );

        Ok(Self {
            trees,
            n_features,
            importances,
        })
    }

    /// Probability of the positive class: mean of the trees' leaf probabilities
    pub fn predict_proba(&self, x: &[f64]) -> Result<f64> {
        if x.len() != self.n_features {
            return Err(HiringError::SchemaMismatch {
                expected: self.n_features,
                actual: x.len(),
            });
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(x)).sum();
        Ok(sum / self.trees.len() as f64)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Normalized mean decrease in impurity, in feature order
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }
}

fn class_weights(y: &[bool], balanced: bool) -> [f64; 2] {
    if !balanced {
        return [1.0, 1.0];
    }
    let positives = y.iter().filter(|&&v| v).count();
    let negatives = y.len() - positives;
    let weight = |count: usize| {
        if count == 0 {
            1.0
        } else {
            y.len() as f64 / (2.0 * count as f64)
        }
    };
    [weight(negatives), weight(positives)]
}

fn fit_tree(
    x: &[Vec<f64>],
    y: &[bool],
    class_weights: &[f64; 2],
    params: &ForestParams,
    max_features: usize,
    seed: u64,
) -> (DecisionTree, Vec<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n = x.len();

    let mut multiplicity = vec![0usize; n];
    if params.bootstrap {
        for _ in 0..n {
            multiplicity[rng.gen_range(0..n)] += 1;
        }
    } else {
        multiplicity.iter_mut().for_each(|m| *m = 1);
    }

    let weights: Vec<f64> = multiplicity
        .iter()
        .zip(y)
        .map(|(&m, &label)| m as f64 * class_weights[usize::from(label)])
        .collect();
    let indices: Vec<usize> = (0..n).filter(|&i| multiplicity[i] > 0).collect();

    TreeBuilder {
        x,
        y,
        weights: &weights,
        max_depth: params.max_depth,
        min_samples_split: params.min_samples_split,
        min_samples_leaf: params.min_samples_leaf,
        max_features,
        rng,
    }
    .fit(indices)
}
