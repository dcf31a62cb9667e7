//! Labelled transform output

use serde::Serialize;

use crate::artifacts::schema::SchemaDescriptor;
use crate::{Result, TennisError};

/// One transformed row with its column labels restored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformedRecord {
    pub numeric: Vec<(String, f64)>,
    pub categorical: Vec<(String, f64)>,
    /// Name of the outcome column; its value is always unknown
    pub target: String,
}

impl TransformedRecord {
    /// Restore labels on a raw positional transform output.
    ///
    /// The raw row must be exactly numeric values, categorical codes, then
    /// the target passthrough, in the order the schema lists them.
    pub fn relabel(raw: &[Option<f64>], schema: &SchemaDescriptor) -> Result<Self> {
        if raw.len() != schema.output_width() {
            return Err(TennisError::SchemaMismatch(format!(
                "transform produced {} values, schema expects {} ({} numeric + {} categorical + target)",
                raw.len(),
                schema.output_width(),
                schema.numeric.len(),
                schema.categorical.len()
            )));
        }

        let (features, _target) = raw.split_at(schema.feature_count());
        let (numeric_values, categorical_values) = features.split_at(schema.numeric.len());

        let label = |names: &[String], values: &[Option<f64>]| -> Result<Vec<(String, f64)>> {
            names
                .iter()
                .zip(values)
                .map(|(name, value)| {
                    value.map(|v| (name.clone(), v)).ok_or_else(|| {
                        TennisError::SchemaMismatch(format!(
                            "transform left column '{}' without a value",
                            name
                        ))
                    })
                })
                .collect()
        };

        Ok(TransformedRecord {
            numeric: label(&schema.numeric, numeric_values)?,
            categorical: label(&schema.categorical, categorical_values)?,
            target: schema.target.clone(),
        })
    }

    /// Model input vector, numeric then categorical
    pub fn features(&self) -> Vec<f64> {
        self.numeric
            .iter()
            .chain(self.categorical.iter())
            .map(|(_, value)| *value)
            .collect()
    }

    /// Feature names in model input order
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.numeric
            .iter()
            .chain(self.categorical.iter())
            .map(|(name, _)| name.as_str())
    }

    /// All column labels, target included
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.feature_names().chain(std::iter::once(self.target.as_str()))
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.numeric
            .iter()
            .chain(self.categorical.iter())
            .find(|(column, _)| column == name)
            .map(|(_, value)| *value)
    }

    /// Check the feature names match what a model was trained on
    pub fn ensure_features(&self, expected: &[String]) -> Result<()> {
        let matches = self.feature_names().count() == expected.len()
            && self
                .feature_names()
                .zip(expected)
                .all(|(found, wanted)| found == wanted.as_str());
        if matches {
            Ok(())
        } else {
            Err(TennisError::SchemaMismatch(format!(
                "record features {:?} do not match model features {:?}",
                self.feature_names().collect::<Vec<_>>(),
                expected
            )))
        }
    }
}
