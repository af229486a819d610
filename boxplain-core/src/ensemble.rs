//! The ensemble data model: an array-based forest of decision trees.
//!
//! Trees are represented as flat node arrays with integer parent/child
//! indices, mirroring the layout used by gradient-boosting libraries on
//! disk. [`NO_PARENT`] marks the root; nodes unreachable from the root are
//! treated as deleted and never walked.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

use crate::error::OracleError;

/// Sentinel parent index denoting "this node is the root".
pub const NO_PARENT: i32 = 2_147_483_647;

/// Supported prediction objectives.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Objective {
    /// Single-group binary classification via the sign of the weight sum.
    BinaryLogistic,
    /// Multi-group classification via `argmax` over per-group probabilities.
    MultiSoftprob,
    /// Multi-group classification via `argmax` over per-group raw scores.
    MultiSoftmax,
}

impl Objective {
    /// Parse the XGBoost-style objective tag.
    ///
    /// # Errors
    /// Returns [`OracleError::UnsupportedObjective`] for any tag outside
    /// `{binary:logistic, multi:softprob, multi:softmax}`.
    pub fn parse(tag: &str) -> Result<Self, OracleError> {
        match tag {
            "binary:logistic" => Ok(Self::BinaryLogistic),
            "multi:softprob" => Ok(Self::MultiSoftprob),
            "multi:softmax" => Ok(Self::MultiSoftmax),
            other => Err(OracleError::UnsupportedObjective {
                objective: other.to_owned(),
            }),
        }
    }
}

/// A single node in a tree's flat array representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Node {
    /// An internal split: `x[split_index] < split_condition` routes left.
    Internal {
        split_index: usize,
        split_condition: f64,
        left: usize,
        right: usize,
    },
    /// A leaf carrying the tree's contribution to its group's weight sum.
    Leaf { weight: f64 },
}

/// One branch direction taken along a root-to-leaf path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Branch {
    /// `x[feature] < threshold`.
    Left,
    /// `x[feature] >= threshold`.
    Right,
}

/// One constraint contributed by an edge on a root-to-leaf path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathStep {
    pub feature: usize,
    pub threshold: f64,
    pub branch: Branch,
}

/// A single decision tree, stored as a flat node array with parent links.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<Node>,
    parents: Vec<i32>,
}

impl Tree {
    /// Construct a tree from its flat node array and parent-index array.
    ///
    /// # Panics
    /// Panics if `nodes` and `parents` have different lengths.
    #[must_use]
    pub fn new(nodes: Vec<Node>, parents: Vec<i32>) -> Self {
        assert_eq!(nodes.len(), parents.len());
        Self { nodes, parents }
    }

    /// Index of the root node (the node whose parent is [`NO_PARENT`]).
    #[must_use]
    pub fn root(&self) -> usize {
        self.parents
            .iter()
            .position(|&p| p == NO_PARENT)
            .unwrap_or(0)
    }

    /// Walk from the root to a leaf following `point`, returning the leaf
    /// weight, or `None` if the tree's path cover does not terminate (a
    /// malformed tree — internal nodes pointing to out-of-range children).
    #[must_use]
    pub fn predict_leaf_weight(&self, point: &[f64]) -> Option<f64> {
        let mut idx = self.root();
        loop {
            match self.nodes.get(idx)? {
                Node::Leaf { weight } => return Some(*weight),
                Node::Internal {
                    split_index,
                    split_condition,
                    left,
                    right,
                } => {
                    let value = *point.get(*split_index)?;
                    idx = if value < *split_condition { *left } else { *right };
                }
            }
        }
    }

    /// Enumerate every root-to-leaf path reachable from the root, as the
    /// conjunction of edge constraints paired with the leaf's weight.
    /// Nodes not reachable from the root (deleted leaves) are never
    /// visited.
    #[must_use]
    pub fn leaf_paths(&self) -> Vec<(Vec<PathStep>, f64)> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        self.collect_paths(self.root(), &mut path, &mut out);
        out
    }

    fn collect_paths(&self, idx: usize, path: &mut Vec<PathStep>, out: &mut Vec<(Vec<PathStep>, f64)>) {
        let Some(node) = self.nodes.get(idx) else {
            return;
        };
        match *node {
            Node::Leaf { weight } => out.push((path.clone(), weight)),
            Node::Internal {
                split_index,
                split_condition,
                left,
                right,
            } => {
                path.push(PathStep {
                    feature: split_index,
                    threshold: split_condition,
                    branch: Branch::Left,
                });
                self.collect_paths(left, path, out);
                path.pop();

                path.push(PathStep {
                    feature: split_index,
                    threshold: split_condition,
                    branch: Branch::Right,
                });
                self.collect_paths(right, path, out);
                path.pop();
            }
        }
    }

    /// Every split threshold used by reachable internal nodes, keyed by
    /// feature index.
    #[must_use]
    pub fn thresholds(&self) -> BTreeMap<usize, Vec<f64>> {
        let mut out: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
        for (path, _) in self.leaf_paths() {
            for step in path {
                out.entry(step.feature).or_default().push(step.threshold);
            }
        }
        out
    }
}

/// A forest of trees partitioned into output groups.
#[derive(Clone, Debug)]
pub struct Ensemble {
    trees: Vec<Tree>,
    tree_info: Vec<usize>,
    num_feature: usize,
    num_output_group: usize,
    objective: Objective,
}

impl Ensemble {
    /// Construct an ensemble from its trees, per-tree group assignment, and
    /// metadata.
    ///
    /// # Panics
    /// Panics if `tree_info.len() != trees.len()`.
    #[must_use]
    pub fn new(
        trees: Vec<Tree>,
        tree_info: Vec<usize>,
        num_feature: usize,
        num_output_group: usize,
        objective: Objective,
    ) -> Self {
        assert_eq!(trees.len(), tree_info.len());
        Self {
            trees,
            tree_info,
            num_feature,
            num_output_group,
            objective,
        }
    }

    /// Number of features the ensemble was trained on.
    #[must_use]
    pub fn num_feature(&self) -> usize {
        self.num_feature
    }

    /// Number of output groups (1 for binary logistic).
    #[must_use]
    pub fn groups(&self) -> usize {
        self.num_output_group.max(1)
    }

    /// The objective tag governing class derivation.
    #[must_use]
    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// The trees in this ensemble, in order.
    #[must_use]
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// The output group that tree `t` contributes to.
    #[must_use]
    pub fn group_of(&self, tree: usize) -> usize {
        self.tree_info[tree]
    }

    /// Every split threshold in the ensemble, keyed by feature index.
    #[must_use]
    pub fn thresholds(&self) -> BTreeMap<usize, Vec<f64>> {
        let mut out: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
        for tree in &self.trees {
            for (feature, mut values) in tree.thresholds() {
                out.entry(feature).or_default().append(&mut values);
            }
        }
        out
    }

    /// Walk every tree directly (no SMT) and derive the predicted class.
    /// Used as the structural reference implementation that the SMT-backed
    /// oracle's `predict` is checked against.
    ///
    /// # Errors
    /// Returns [`OracleError::EncodingViolation`] if any tree's path cover
    /// does not terminate at a leaf for `point`.
    pub fn predict_direct(&self, point: &[f64]) -> Result<usize, OracleError> {
        let mut sums = vec![0.0_f64; self.groups()];
        for (t, tree) in self.trees.iter().enumerate() {
            let weight = tree.predict_leaf_weight(point).ok_or_else(|| {
                OracleError::EncodingViolation {
                    point: point.iter().copied().map(OrderedFloat).collect(),
                }
            })?;
            sums[self.tree_info[t]] += weight;
        }
        Ok(derive_class(self.objective, &sums))
    }
}

/// Derive the predicted class from per-group weight sums.
#[must_use]
pub fn derive_class(objective: Objective, sums: &[f64]) -> usize {
    match objective {
        Objective::BinaryLogistic => usize::from(sums.first().is_none_or(|&w| w >= 0.0)),
        Objective::MultiSoftprob | Objective::MultiSoftmax => sums
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map_or(0, |(idx, _)| idx),
    }
}
