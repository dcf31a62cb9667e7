//! Tennis match winner prediction
//!
//! Turns raw player and match attributes into a win probability for each
//! player: feature assembly, a fitted preprocessing transform, a trained
//! classifier, and a two-outcome ranked result.

pub mod artifacts;
pub mod features;
pub mod model;
pub mod predict;
pub mod preprocess;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use artifacts::Artifacts;
pub use features::{MatchContext, MatchRecord, PlayerAttributes};
pub use predict::{PredictionResult, Predictor};

/// One of the two players in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player1,
    Player2,
}

impl Side {
    /// Column name prefix used by the feature schema
    pub fn prefix(&self) -> &'static str {
        match self {
            Side::Player1 => "player1",
            Side::Player2 => "player2",
        }
    }

    pub fn other(&self) -> Side {
        match self {
            Side::Player1 => Side::Player2,
            Side::Player2 => Side::Player1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Player1 => write!(f, "Player 1"),
            Side::Player2 => write!(f, "Player 2"),
        }
    }
}

/// Which of the three loaded artifacts an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Model,
    Transform,
    Vocabulary,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Model => write!(f, "model"),
            ArtifactKind::Transform => write!(f, "preprocessing transform"),
            ArtifactKind::Vocabulary => write!(f, "category vocabulary"),
        }
    }
}

/// Coarse classification of failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Startup only; the process must not serve requests
    ArtifactLoad,
    /// Request aborted, input does not match the fitted schema
    SchemaMismatch,
    /// Request aborted, the model could not score the row
    Inference,
    Other,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum TennisError {
    #[error("Failed to load {artifact}: {message}")]
    ArtifactLoad {
        artifact: ArtifactKind,
        message: String,
    },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TennisError {
    pub fn artifact(artifact: ArtifactKind, message: impl Into<String>) -> Self {
        TennisError::ArtifactLoad {
            artifact,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TennisError::ArtifactLoad { .. } => ErrorKind::ArtifactLoad,
            TennisError::SchemaMismatch(_) => ErrorKind::SchemaMismatch,
            TennisError::Inference(_) => ErrorKind::Inference,
            TennisError::Config(_) | TennisError::Io(_) | TennisError::Json(_) => {
                ErrorKind::Other
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, TennisError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub artifacts: ArtifactPaths,
    pub model: ModelConfig,
    pub labels: LabelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub model_path: String,
    pub transform_path: String,
    pub vocabulary_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub kind: model::ModelKind,
    /// Hidden layer widths, only read for `kind = "mlp"`
    pub hidden_dims: Vec<usize>,
    pub dropout: f64,
}

/// Display names for the two outcomes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    pub player1: String,
    pub player2: String,
}

impl LabelConfig {
    pub fn label(&self, side: Side) -> &str {
        match side {
            Side::Player1 => &self.player1,
            Side::Player2 => &self.player2,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            artifacts: ArtifactPaths {
                model_path: "artifacts/model/best_lgbm.json".to_string(),
                transform_path: "artifacts/model/preprocessing_pipeline.json".to_string(),
                vocabulary_path: "artifacts/model/dict_categories.json".to_string(),
            },
            model: ModelConfig {
                kind: model::ModelKind::GradientBoosted,
                hidden_dims: vec![64, 32],
                dropout: 0.1,
            },
            labels: LabelConfig {
                player1: Side::Player1.to_string(),
                player2: Side::Player2.to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TennisError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| TennisError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TennisError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
