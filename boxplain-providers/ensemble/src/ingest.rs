//! Deserialisation of an ensemble file's JSON shape and its lowering into
//! the core's array-based [`Ensemble`].

use serde::Deserialize;

use boxplain_core::{Branch, Ensemble, NO_PARENT, Node, Objective, Tree};

use crate::errors::EnsembleProviderError;

#[derive(Debug, Deserialize)]
struct EnsembleFile {
    learner: Learner,
}

#[derive(Debug, Deserialize)]
struct Learner {
    gradient_booster: GradientBooster,
    objective: ObjectiveTag,
}

#[derive(Debug, Deserialize)]
struct ObjectiveTag {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GradientBooster {
    model: Model,
}

#[derive(Debug, Deserialize)]
struct Model {
    trees: Vec<RawTree>,
    tree_info: Vec<usize>,
    #[serde(default = "default_num_feature")]
    num_feature: usize,
    #[serde(default)]
    num_output_group: usize,
}

fn default_num_feature() -> usize {
    0
}

#[derive(Debug, Deserialize)]
struct RawTree {
    split_indices: Vec<usize>,
    split_conditions: Vec<f64>,
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    parents: Vec<i64>,
}

/// Parse an ensemble file's raw JSON bytes and lower it into the core's
/// [`Ensemble`] representation.
///
/// # Errors
/// Returns [`EnsembleProviderError::MalformedJson`] if `bytes` is not valid
/// JSON matching the expected shape, [`EnsembleProviderError::ArrayLengthMismatch`]
/// if a tree's parallel arrays disagree in length,
/// [`EnsembleProviderError::InvalidNodeReference`] if a child/parent index
/// falls outside the tree's node array, or
/// [`EnsembleProviderError::UnsupportedObjective`] if the objective tag is
/// not recognised.
pub fn parse_ensemble(bytes: &[u8]) -> Result<Ensemble, EnsembleProviderError> {
    let file: EnsembleFile = serde_json::from_slice(bytes)?;
    let model = file.learner.gradient_booster.model;
    let objective = Objective::parse(&file.learner.objective.name).map_err(|_| {
        EnsembleProviderError::UnsupportedObjective {
            objective: file.learner.objective.name.clone(),
        }
    })?;

    let mut trees = Vec::with_capacity(model.trees.len());
    for (idx, raw) in model.trees.into_iter().enumerate() {
        trees.push(lower_tree(idx, raw)?);
    }

    let num_output_group = if model.num_output_group == 0 {
        1
    } else {
        model.num_output_group
    };

    Ok(Ensemble::new(
        trees,
        model.tree_info,
        model.num_feature,
        num_output_group,
        objective,
    ))
}

fn lower_tree(tree_index: usize, raw: RawTree) -> Result<Tree, EnsembleProviderError> {
    let n = raw.split_indices.len();
    let lengths = [
        raw.split_conditions.len(),
        raw.left_children.len(),
        raw.right_children.len(),
        raw.parents.len(),
    ];
    if lengths.iter().any(|&len| len != n) {
        return Err(EnsembleProviderError::ArrayLengthMismatch {
            tree: tree_index,
            detail: format!(
                "split_indices has {n} entries but siblings report {lengths:?}"
            ),
        });
    }

    let mut nodes = Vec::with_capacity(n);
    let mut parents = Vec::with_capacity(n);
    for i in 0..n {
        let left = raw.left_children[i];
        let right = raw.right_children[i];
        let is_leaf = left < 0 || right < 0;
        if is_leaf {
            nodes.push(Node::Leaf {
                weight: raw.split_conditions[i],
            });
        } else {
            let left_idx = usize::try_from(left).map_err(|_| {
                EnsembleProviderError::InvalidNodeReference {
                    tree: tree_index,
                    node: i,
                }
            })?;
            let right_idx = usize::try_from(right).map_err(|_| {
                EnsembleProviderError::InvalidNodeReference {
                    tree: tree_index,
                    node: i,
                }
            })?;
            if left_idx >= n || right_idx >= n {
                return Err(EnsembleProviderError::InvalidNodeReference {
                    tree: tree_index,
                    node: i,
                });
            }
            nodes.push(Node::Internal {
                split_index: raw.split_indices[i],
                split_condition: raw.split_conditions[i],
                left: left_idx,
                right: right_idx,
            });
        }

        let parent_raw = raw.parents[i];
        #[expect(
            clippy::cast_possible_truncation,
            reason = "ensemble files encode the root sentinel as i32::MAX"
        )]
        let parent = if parent_raw < 0 || parent_raw == i64::from(NO_PARENT) {
            NO_PARENT
        } else {
            parent_raw as i32
        };
        parents.push(parent);
    }

    if !parents.contains(&NO_PARENT) {
        return Err(EnsembleProviderError::InvalidNodeReference {
            tree: tree_index,
            node: 0,
        });
    }

    Ok(Tree::new(nodes, parents))
}

/// Direction helper retained for callers that want to re-derive branch
/// semantics without re-parsing a file (e.g. tests synthesising fixtures).
#[must_use]
pub fn branch_for(value: f64, threshold: f64) -> Branch {
    if value < threshold {
        Branch::Left
    } else {
        Branch::Right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "learner": {
                "gradient_booster": {
                    "model": {
                        "trees": [
                            {
                                "split_indices": [0, 0, 0],
                                "split_conditions": [0.5, -1.0, 1.0],
                                "left_children": [1, -1, -1],
                                "right_children": [2, -1, -1],
                                "parents": [2147483647, 0, 0]
                            }
                        ],
                        "tree_info": [0],
                        "num_feature": 1,
                        "num_output_group": 1
                    }
                },
                "objective": { "name": "binary:logistic" }
            }
        }"#
    }

    #[test]
    fn parses_a_single_stump() {
        let ensemble = parse_ensemble(sample_json().as_bytes()).unwrap();
        assert_eq!(ensemble.num_feature(), 1);
        assert_eq!(ensemble.trees().len(), 1);
        assert_eq!(ensemble.predict_direct(&[0.1]).unwrap(), 0);
        assert_eq!(ensemble.predict_direct(&[0.9]).unwrap(), 1);
    }

    #[test]
    fn rejects_unsupported_objective() {
        let json = sample_json().replace("binary:logistic", "reg:squarederror");
        let err = parse_ensemble(json.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            EnsembleProviderError::UnsupportedObjective { .. }
        ));
    }

    #[test]
    fn rejects_mismatched_array_lengths() {
        let json = sample_json().replace(r#""split_indices": [0, 0, 0],"#, r#""split_indices": [0, 0],"#);
        let err = parse_ensemble(json.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            EnsembleProviderError::ArrayLengthMismatch { .. }
        ));
    }
}
