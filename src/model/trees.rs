//! Gradient boosted decision-tree ensemble
//!
//! Each tree routes the feature vector to a leaf; the leaf values are
//! summed onto `base_score` to form a raw margin, and the sigmoid of that
//! margin is the win probability for player 1.

use serde::{Deserialize, Serialize};

use super::{sigmoid, ModelKind, WinClassifier};
use crate::preprocess::TransformedRecord;
use crate::{ArtifactKind, Result, TennisError};

/// A node of a decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Go to `left` when `features[feature] <= threshold`, else `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { value: f64 },
}

/// A single tree; node 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    /// Leaf value reached by `features`
    ///
    /// Traversal is bounded by the node count, so a malformed tree fails
    /// instead of looping.
    fn evaluate(&self, features: &[f64]) -> Result<f64> {
        let mut index = 0;
        for _ in 0..self.nodes.len() {
            let node = self.nodes.get(index).ok_or_else(|| {
                TennisError::Inference(format!("tree references missing node {}", index))
            })?;
            match node {
                TreeNode::Leaf { value } => return Ok(*value),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).ok_or_else(|| {
                        TennisError::Inference(format!(
                            "tree splits on feature {} but only {} features were given",
                            feature,
                            features.len()
                        ))
                    })?;
                    index = if value <= threshold { *left } else { *right };
                }
            }
        }
        Err(TennisError::Inference(
            "tree traversal did not reach a leaf".to_string(),
        ))
    }

    /// Children must point forward so traversal always terminates
    fn validate(&self, tree_index: usize, feature_count: usize) -> Result<()> {
        let fail = |message: String| {
            Err(TennisError::artifact(
                ArtifactKind::Model,
                format!("tree {}: {}", tree_index, message),
            ))
        };

        if self.nodes.is_empty() {
            return fail("has no nodes".to_string());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= feature_count {
                        return fail(format!(
                            "node {} splits on feature {} but the model has {} features",
                            index, feature, feature_count
                        ));
                    }
                    if threshold.is_nan() {
                        return fail(format!("node {} has a NaN threshold", index));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return fail(format!(
                                "node {} has invalid child index {}",
                                index, child
                            ));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return fail(format!("leaf {} has a non-finite value", index));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Boosted tree ensemble for binary classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

impl GradientBoostedTrees {
    /// Parse and validate a model artifact
    pub fn from_json_str(content: &str) -> Result<Self> {
        let model: GradientBoostedTrees = serde_json::from_str(content)
            .map_err(|e| TennisError::artifact(ArtifactKind::Model, e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        if self.feature_names.is_empty() {
            return Err(TennisError::artifact(ArtifactKind::Model, "model has no features"));
        }
        if self.trees.is_empty() {
            return Err(TennisError::artifact(ArtifactKind::Model, "model has no trees"));
        }
        if !self.base_score.is_finite() {
            return Err(TennisError::artifact(
                ArtifactKind::Model,
                "base score is not finite",
            ));
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(index, self.feature_names.len())?;
        }
        Ok(())
    }

    /// Raw margin (log-odds) for a feature vector
    pub fn margin(&self, features: &[f64]) -> Result<f64> {
        let mut margin = self.base_score;
        for tree in &self.trees {
            margin += tree.evaluate(features)?;
        }
        Ok(margin)
    }
}

impl WinClassifier for GradientBoostedTrees {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_proba(&self, record: &TransformedRecord) -> Result<f64> {
        record.ensure_features(&self.feature_names)?;
        let margin = self.margin(&record.features())?;
        if !margin.is_finite() {
            return Err(TennisError::Inference(format!(
                "model produced non-finite margin {}",
                margin
            )));
        }
        Ok(sigmoid(margin))
    }

    fn validate(&self) -> Result<()> {
        GradientBoostedTrees::validate(self)
    }

    fn kind(&self) -> ModelKind {
        ModelKind::GradientBoosted
    }
}
