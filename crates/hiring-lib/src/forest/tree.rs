//! CART decision tree with weighted Gini impurity

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        /// Weighted fraction of positive samples that reached this leaf
        probability: f64,
        samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut node = self;
        loop {
            match node {
                Node::Leaf { probability, .. } => return *probability,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Split { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Node,
}

impl DecisionTree {
    pub fn predict_proba(&self, x: &[f64]) -> f64 {
        self.root.predict(x)
    }

    pub fn root(&self) -> &Node {
        &self.root
    }
}

/// Split candidate found while scanning one feature
struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
    weighted_decrease: f64,
}

/// Builds one tree over a weighted sample of the training rows
pub struct TreeBuilder<'a, R> {
    pub x: &'a [Vec<f64>],
    pub y: &'a [bool],
    /// Per-row weight; bootstrap multiplicity times class weight
    pub weights: &'a [f64],
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: usize,
    pub rng: R,
}

impl<'a, R: Rng> TreeBuilder<'a, R> {
    /// Fit a tree on the given row indices. Returns the tree and its
    /// unnormalized per-feature impurity decrease.
    pub fn fit(mut self, mut indices: Vec<usize>) -> (DecisionTree, Vec<f64>) {
        let n_features = self.x.first().map(Vec::len).unwrap_or(0);
        let mut importances = vec![0.0; n_features];
        let root = self.build(&mut indices, 0, &mut importances);
        (DecisionTree { root }, importances)
    }

    fn build(&mut self, indices: &mut [usize], depth: usize, importances: &mut [f64]) -> Node {
        let (w_pos, w_total) = self.weighted_counts(indices);
        let probability = if w_total > 0.0 { w_pos / w_total } else { 0.0 };
        let leaf = Node::Leaf {
            probability,
            samples: indices.len(),
        };

        let depth_reached = self.max_depth.map_or(false, |max| depth >= max);
        let pure = w_pos <= 0.0 || w_pos >= w_total;
        if depth_reached
            || pure
            || indices.len() < self.min_samples_split
            || indices.len() < 2 * self.min_samples_leaf
        {
            return leaf;
        }

        let Some(split) = self.best_split(indices, w_pos, w_total) else {
            return leaf;
        };
        importances[split.feature] += split.weighted_decrease;

        self.sort_by_feature(indices, split.feature);
        let split_at = indices
            .iter()
            .take_while(|&&i| self.x[i][split.feature] <= split.threshold)
            .count();
        let (left, right) = indices.split_at_mut(split_at);

        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(self.build(left, depth + 1, importances)),
            right: Box::new(self.build(right, depth + 1, importances)),
        }
    }

    fn best_split(&mut self, indices: &mut [usize], w_pos: f64, w_total: f64) -> Option<Split> {
        let n_features = self.x[indices[0]].len();
        let impurity = gini(w_pos, w_total);
        let candidates = index::sample(&mut self.rng, n_features, self.max_features.min(n_features));

        let mut best: Option<Split> = None;
        for feature in candidates.iter() {
            self.sort_by_feature(indices, feature);

            let mut left_pos = 0.0;
            let mut left_total = 0.0;
            for k in 0..indices.len() - 1 {
                let i = indices[k];
                let w = self.weights[i];
                left_total += w;
                if self.y[i] {
                    left_pos += w;
                }

                let left_count = k + 1;
                let right_count = indices.len() - left_count;
                if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                    continue;
                }

                let current = self.x[i][feature];
                let next = self.x[indices[k + 1]][feature];
                if next <= current {
                    continue;
                }

                let right_pos = w_pos - left_pos;
                let right_total = w_total - left_total;
                let children = left_total * gini(left_pos, left_total)
                    + right_total * gini(right_pos, right_total);
                let gain = impurity - children / w_total;

                if gain > 0.0 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    let mid = current + (next - current) / 2.0;
                    best = Some(Split {
                        feature,
                        threshold: if mid < next { mid } else { current },
                        gain,
                        weighted_decrease: w_total * impurity - children,
                    });
                }
            }
        }
        best
    }

    fn sort_by_feature(&self, indices: &mut [usize], feature: usize) {
        let x = self.x;
        indices.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]).then(a.cmp(&b)));
    }

    fn weighted_counts(&self, indices: &[usize]) -> (f64, f64) {
        indices.iter().fold((0.0, 0.0), |(pos, total), &i| {
            let w = self.weights[i];
            (if self.y[i] { pos + w } else { pos }, total + w)
        })
    }
}

/// Gini impurity of a binary node from its weighted positive and total mass
pub fn gini(positive: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    let p = positive / total;
    2.0 * p * (1.0 - p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn builder<'a>(x: &'a [Vec<f64>], y: &'a [bool], w: &'a [f64]) -> TreeBuilder<'a, ChaCha8Rng> {
        TreeBuilder {
            x,
            y,
            weights: w,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: x[0].len(),
            rng: ChaCha8Rng::seed_from_u64(7),
        }
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(0.0, 10.0), 0.0);
        assert_eq!(gini(10.0, 10.0), 0.0);
        assert!((gini(5.0, 10.0) - 0.5).abs() < 1e-12);
        assert_eq!(gini(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_separable_data_fits_exactly() {
        let x = vec![vec![1.0], vec![2.0], vec![3.0], vec![10.0], vec![11.0], vec![12.0]];
        let y = vec![false, false, false, true, true, true];
        let w = vec![1.0; 6];
        let (tree, importances) = builder(&x, &y, &w).fit((0..6).collect());

        assert_eq!(tree.predict_proba(&[2.5]), 0.0);
        assert_eq!(tree.predict_proba(&[11.5]), 1.0);
        assert_eq!(tree.root().depth(), 2);
        assert!(importances[0] > 0.0);
        match tree.root() {
            Node::Split { threshold, .. } => assert_eq!(*threshold, 6.5),
            Node::Leaf { .. } => panic!("expected a split at the root"),
        }
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let x = vec![vec![1.0], vec![2.0]];
        let y = vec![true, true];
        let w = vec![1.0; 2];
        let (tree, _) = builder(&x, &y, &w).fit(vec![0, 1]);
        assert_eq!(tree.root(), &Node::Leaf { probability: 1.0, samples: 2 });
    }

    #[test]
    fn test_constant_feature_cannot_split() {
        let x = vec![vec![4.0], vec![4.0], vec![4.0], vec![4.0]];
        let y = vec![true, false, true, false];
        let w = vec![1.0; 4];
        let (tree, _) = builder(&x, &y, &w).fit((0..4).collect());
        assert_eq!(tree.root().leaf_count(), 1);
        assert_eq!(tree.predict_proba(&[4.0]), 0.5);
    }

    #[test]
    fn test_max_depth_limits_tree() {
        let x: Vec<Vec<f64>> = (0..16).map(|i| vec![i as f64]).collect();
        let y: Vec<bool> = (0..16).map(|i| i % 2 == 0).collect();
        let w = vec![1.0; 16];
        let mut b = builder(&x, &y, &w);
        b.max_depth = Some(2);
        let (tree, _) = b.fit((0..16).collect());
        assert!(tree.root().depth() <= 3);
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        let x = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
        let y = vec![true, false, false, false];
        let w = vec![1.0; 4];
        let mut b = builder(&x, &y, &w);
        b.min_samples_leaf = 2;
        let (tree, _) = b.fit((0..4).collect());
        if let Node::Split { left, right, .. } = tree.root() {
            for child in [left, right] {
                if let Node::Leaf { samples, .. } = child.as_ref() {
                    assert!(*samples >= 2);
                }
            }
        }
    }
}
