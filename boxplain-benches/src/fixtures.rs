//! Synthetic ensembles and feature spaces sized for Criterion benchmarks.

use std::collections::BTreeMap;

use boxplain_core::{ConfigError, Ensemble, FeatureSpace, Limits, Node, Objective, Tree};

/// Build a balanced binary ensemble of `tree_count` trees, each splitting on
/// `feature_count` features at evenly spaced thresholds in `[0, 1)`.
///
/// Each tree is a single chain of internal nodes (one per feature) ending in
/// two leaves, mirroring the shape of a shallow boosted stump ensemble.
#[must_use]
pub fn balanced_ensemble(tree_count: usize, feature_count: usize) -> Ensemble {
    let feature_count = feature_count.max(1);
    let mut trees = Vec::with_capacity(tree_count.max(1));
    for t in 0..tree_count.max(1) {
        trees.push(chain_tree(feature_count, t));
    }
    let tree_info = vec![0; trees.len()];
    Ensemble::new(trees, tree_info, feature_count, 1, Objective::BinaryLogistic)
}

/// Builds a chain tree: node `i` (`i < feature_count`) splits on feature `i`
/// and routes either to node `i+1` (continue the chain) or to leaf
/// `feature_count + i + 1` (stop early on that feature's threshold).
fn chain_tree(feature_count: usize, tree_index: usize) -> Tree {
    let leaf_count = feature_count + 1;
    let node_count = feature_count + leaf_count;
    let mut nodes = Vec::with_capacity(node_count);
    let mut parents = vec![boxplain_core::NO_PARENT; node_count];

    for feature in 0..feature_count {
        #[expect(
            clippy::cast_precision_loss,
            reason = "feature indices are small benchmark sizes, not precision-sensitive"
        )]
        let threshold = (feature as f64 + 1.0) / (feature_count as f64 + 2.0);
        let left = feature + 1;
        let right = feature_count + feature + 1;
        nodes.push(Node::Internal {
            split_index: feature,
            split_condition: threshold,
            left,
            right,
        });
        let parent = i32::try_from(feature).unwrap_or_default();
        parents[left] = parent;
        parents[right] = parent;
    }
    for leaf in 0..leaf_count {
        let weight = if (leaf + tree_index) % 2 == 0 { -1.0 } else { 1.0 };
        nodes.push(Node::Leaf { weight });
    }

    Tree::new(nodes, parents)
}

/// Build a [`FeatureSpace`] over `feature_count` features, each with the
/// thresholds `chain_tree` would have produced and limits `[0, 1)`.
///
/// # Errors
/// Returns [`ConfigError`] if the synthetic thresholds and limits disagree,
/// which should not happen for any `feature_count` this helper accepts.
pub fn balanced_feature_space(
    tree_count: usize,
    feature_count: usize,
) -> Result<FeatureSpace, ConfigError> {
    let ensemble = balanced_ensemble(tree_count, feature_count);
    let thresholds = ensemble.thresholds();
    let limits: Limits = thresholds.keys().map(|&f| (f, (0.0, 1.0))).collect();
    FeatureSpace::build(&thresholds, &limits)
}

/// A point at the centre of every feature's domain, useful as an anchor seed
/// for benchmark runs.
#[must_use]
pub fn midpoint(feature_count: usize) -> Vec<f64> {
    vec![0.5; feature_count]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_ensemble_predicts_without_panicking() {
        let ensemble = balanced_ensemble(3, 4);
        let result = ensemble.predict_direct(&midpoint(4));
        assert!(result.is_ok());
    }

    #[test]
    fn balanced_feature_space_builds_one_domain_per_feature() {
        let feature_space = balanced_feature_space(2, 3).expect("feature space must build");
        assert_eq!(feature_space.features().count(), 3);
    }
}
