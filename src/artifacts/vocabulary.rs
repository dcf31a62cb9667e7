//! Permitted values for categorical inputs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::preprocess::PreprocessingPipeline;
use crate::{ArtifactKind, Result, TennisError};

/// Categorical field name → ordered sequence of permitted values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryVocabulary {
    fields: BTreeMap<String, Vec<String>>,
}

impl CategoryVocabulary {
    pub fn new(fields: BTreeMap<String, Vec<String>>) -> Self {
        CategoryVocabulary { fields }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| TennisError::artifact(ArtifactKind::Vocabulary, e.to_string()))
    }

    /// Permitted values for a field, in display order
    pub fn choices(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// Value at `index` for a field, falling back to the first entry
    pub fn choice_or_first(&self, field: &str, index: usize) -> Option<&str> {
        let choices = self.choices(field)?;
        choices
            .get(index)
            .or_else(|| choices.first())
            .map(String::as_str)
    }

    pub fn contains(&self, field: &str, value: &str) -> bool {
        self.choices(field)
            .map(|choices| choices.iter().any(|c| c == value))
            .unwrap_or(false)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check every field against the transform's fitted categorical levels
    pub fn validate_against(&self, pipeline: &PreprocessingPipeline) -> Result<()> {
        for (field, values) in &self.fields {
            let levels = pipeline.levels(field).ok_or_else(|| {
                TennisError::artifact(
                    ArtifactKind::Vocabulary,
                    format!("field '{}' is not a categorical column of the transform", field),
                )
            })?;
            if values.is_empty() {
                return Err(TennisError::artifact(
                    ArtifactKind::Vocabulary,
                    format!("field '{}' has no permitted values", field),
                ));
            }
            if let Some(unknown) = values.iter().find(|v| !levels.contains(*v)) {
                return Err(TennisError::artifact(
                    ArtifactKind::Vocabulary,
                    format!(
                        "value '{}' of field '{}' is not a fitted level of the transform",
                        unknown, field
                    ),
                ));
            }
        }
        Ok(())
    }
}
