use super::{ensure_dimension, Regressor};
use crate::error::ExecutionError;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Serialized regression model (`model.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressorArtifact {
    /// `intercept + coefficients · x`
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    /// Forest (mean of trees) or boosted ensemble (base score + sum of trees).
    TreeEnsemble {
        trees: Vec<TreeModel>,
        #[serde(default)]
        aggregation: Aggregation,
        #[serde(default)]
        base_score: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    #[default]
    Mean,
    Sum,
}

/// Flat binary tree; node 0 is the root and children always follow their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeModel {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Leaf {
        leaf: f64,
    },
    /// Go left when `x[feature] <= threshold`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

impl TreeModel {
    fn validate(&self, dimension: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Leaf { leaf } if !leaf.is_finite() => {
                    return Err(format!("node {idx}: leaf value must be finite"));
                }
                TreeNode::Leaf { .. } => {}
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= dimension {
                        return Err(format!("node {idx}: feature {feature} out of range"));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {idx}: threshold is NaN"));
                    }
                    for child in [left, right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {idx}: invalid child index {child}"));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, tree: usize, x: ArrayView1<'_, f64>) -> Result<f64, ExecutionError> {
        let malformed = |reason: String| ExecutionError::MalformedTree { tree, reason };
        let mut idx = 0usize;
        // Each step moves strictly forward, so the walk is bounded by the node count.
        for _ in 0..self.nodes.len() {
            let node = self
                .nodes
                .get(idx)
                .ok_or_else(|| malformed(format!("node {idx} does not exist")))?;
            match *node {
                TreeNode::Leaf { leaf } => return Ok(leaf),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = x
                        .get(feature)
                        .ok_or_else(|| malformed(format!("feature {feature} out of range")))?;
                    let next = if *value <= threshold { left } else { right };
                    if next <= idx {
                        return Err(malformed(format!("node {idx} points backwards")));
                    }
                    idx = next;
                }
            }
        }
        Err(malformed("walk did not reach a leaf".to_string()))
    }
}

impl RegressorArtifact {
    pub(crate) fn validate(&self, dimension: usize) -> Result<(), String> {
        match self {
            Self::Linear {
                coefficients,
                intercept,
            } => {
                if coefficients.len() != dimension {
                    return Err(format!(
                        "expected {dimension} coefficients, got {}",
                        coefficients.len()
                    ));
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err("coefficients must be finite".to_string());
                }
            }
            Self::TreeEnsemble {
                trees, base_score, ..
            } => {
                if trees.is_empty() {
                    return Err("ensemble has no trees".to_string());
                }
                if !base_score.is_finite() {
                    return Err("base_score must be finite".to_string());
                }
                for (idx, tree) in trees.iter().enumerate() {
                    tree.validate(dimension)
                        .map_err(|reason| format!("tree {idx}: {reason}"))?;
                }
            }
        }
        Ok(())
    }
}

impl Regressor for RegressorArtifact {
    fn predict(&self, normalized: ArrayView1<'_, f64>) -> Result<f64, ExecutionError> {
        let estimate = match self {
            Self::Linear {
                coefficients,
                intercept,
            } => {
                ensure_dimension(coefficients.len(), normalized.len())?;
                intercept + normalized.dot(&ArrayView1::from(coefficients.as_slice()))
            }
            Self::TreeEnsemble {
                trees,
                aggregation,
                base_score,
            } => {
                if trees.is_empty() {
                    return Err(ExecutionError::MalformedTree {
                        tree: 0,
                        reason: "ensemble has no trees".to_string(),
                    });
                }
                let mut total = 0.0;
                for (idx, tree) in trees.iter().enumerate() {
                    total += tree.evaluate(idx, normalized)?;
                }
                match aggregation {
                    Aggregation::Mean => base_score + total / trees.len() as f64,
                    Aggregation::Sum => base_score + total,
                }
            }
        };
        if !estimate.is_finite() {
            return Err(ExecutionError::NonFinite { stage: "model" });
        }
        Ok(estimate)
    }
}
