//! Win classifiers
//!
//! A classifier scores one transformed match and returns the probability
//! that player 1 wins.

pub mod mlp;
pub mod trees;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::preprocess::TransformedRecord;
use crate::Result;

pub use mlp::{MlpClassifier, MlpConfig};
pub use trees::GradientBoostedTrees;

/// Backend used for neural network inference
pub type InferenceBackend = burn::backend::NdArray<f32>;

/// Which classifier artifact format to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Boosted decision-tree ensemble stored as JSON
    GradientBoosted,
    /// Burn MLP stored as a named MessagePack record
    Mlp,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::GradientBoosted => write!(f, "gradient boosted trees"),
            ModelKind::Mlp => write!(f, "MLP"),
        }
    }
}

/// A trained binary classifier for match outcomes
pub trait WinClassifier: fmt::Debug {
    /// Feature names the model was trained on, in input order
    fn feature_names(&self) -> &[String];

    /// Probability in [0, 1] that player 1 wins
    fn predict_proba(&self, record: &TransformedRecord) -> Result<f64>;

    /// Check the model's own structure; run before the model is used
    fn validate(&self) -> Result<()>;

    fn kind(&self) -> ModelKind;
}

/// Logistic function
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
