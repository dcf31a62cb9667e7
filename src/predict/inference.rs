//! Model inference for predictions

use super::result::PredictionResult;
use crate::artifacts::Artifacts;
use crate::features::{FeatureRow, MatchRecord};
use crate::preprocess::TransformedRecord;
use crate::{Config, LabelConfig, Result, TennisError};

/// Predictor for making match predictions
#[derive(Debug)]
pub struct Predictor {
    artifacts: Artifacts,
    labels: LabelConfig,
}

impl Predictor {
    /// Create a new predictor over loaded artifacts
    pub fn new(artifacts: Artifacts, labels: LabelConfig) -> Self {
        Predictor { artifacts, labels }
    }

    /// Load artifacts named in the config and build a predictor
    pub fn load(config: &Config) -> Result<Self> {
        let artifacts = Artifacts::load(config)?;
        Ok(Self::new(artifacts, config.labels.clone()))
    }

    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    pub fn labels(&self) -> &LabelConfig {
        &self.labels
    }

    /// Apply the fitted transform and restore column labels
    pub fn transform_row(&self, row: &FeatureRow) -> Result<TransformedRecord> {
        let raw = self.artifacts.pipeline().transform(row)?;
        TransformedRecord::relabel(&raw, self.artifacts.schema())
    }

    pub fn transform(&self, record: &MatchRecord) -> Result<TransformedRecord> {
        self.transform_row(&record.to_row())
    }

    /// Predict a single match
    pub fn predict(&self, record: &MatchRecord) -> Result<PredictionResult> {
        self.predict_row(&record.to_row())
    }

    /// Predict from an already assembled row
    pub fn predict_row(&self, row: &FeatureRow) -> Result<PredictionResult> {
        let transformed = self.transform_row(row)?;
        self.predict_transformed(&transformed)
    }

    /// Score a transformed record and format the result
    pub fn predict_transformed(&self, record: &TransformedRecord) -> Result<PredictionResult> {
        let probability = self.artifacts.model().predict_proba(record)?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(TennisError::Inference(format!(
                "model returned probability {} outside [0, 1]",
                probability
            )));
        }
        log::debug!("P(player 1 wins) = {:.4}", probability);

        PredictionResult::from_probability(probability, &self.labels)
    }

    /// Predict multiple matches; each one succeeds or fails on its own
    pub fn predict_batch(&self, rows: &[FeatureRow]) -> Vec<Result<PredictionResult>> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }
}
