//! Fitted preprocessing pipeline
//!
//! Imputes missing values and encodes features with parameters captured at
//! training time. There is no fitting here: every statistic comes from the
//! artifact.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::artifacts::schema::SchemaDescriptor;
use crate::features::{CellValue, FeatureRow};
use crate::{ArtifactKind, Result, TennisError};

/// Z-score parameters for one numeric column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Standardize {
    pub mean: f64,
    pub std: f64,
}

impl Standardize {
    /// Normalize a value: (x - mean) / std
    pub fn normalize(&self, value: f64) -> f64 {
        (value - self.mean) / self.std
    }
}

/// Fitted parameters for a numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    /// Training-time fill value (mean, median or constant)
    pub fill: f64,
    #[serde(default)]
    pub scale: Option<Standardize>,
}

impl NumericColumn {
    fn apply(&self, cell: &CellValue) -> Result<f64> {
        let value = match cell {
            CellValue::Number(x) if x.is_finite() => *x,
            CellValue::Number(x) => {
                return Err(TennisError::SchemaMismatch(format!(
                    "numeric column '{}' holds non-finite value {}",
                    self.name, x
                )))
            }
            CellValue::Missing => self.fill,
            other => {
                return Err(TennisError::SchemaMismatch(format!(
                    "numeric column '{}' holds {} '{}'",
                    self.name,
                    other.type_name(),
                    other
                )))
            }
        };
        Ok(match &self.scale {
            Some(scale) => scale.normalize(value),
            None => value,
        })
    }
}

/// Fitted parameters for a categorical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    /// Training-time fill value (mode or constant)
    pub fill: String,
    /// Ordinal encoding: a level is encoded as its index
    pub levels: Vec<String>,
}

impl CategoricalColumn {
    pub fn encode(&self, level: &str) -> Option<usize> {
        self.levels.iter().position(|l| l == level)
    }

    fn apply(&self, cell: &CellValue) -> Result<f64> {
        let level = match cell {
            CellValue::Category(s) => s.as_str(),
            CellValue::Missing => self.fill.as_str(),
            other => {
                return Err(TennisError::SchemaMismatch(format!(
                    "categorical column '{}' holds {} '{}'",
                    self.name,
                    other.type_name(),
                    other
                )))
            }
        };
        self.encode(level).map(|code| code as f64).ok_or_else(|| {
            TennisError::Inference(format!(
                "unseen level '{}' for categorical column '{}'",
                level, self.name
            ))
        })
    }
}

/// The fitted transform together with its column schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingPipeline {
    schema: SchemaDescriptor,
    numeric: Vec<NumericColumn>,
    categorical: Vec<CategoricalColumn>,
}

impl PreprocessingPipeline {
    pub fn new(
        schema: SchemaDescriptor,
        numeric: Vec<NumericColumn>,
        categorical: Vec<CategoricalColumn>,
    ) -> Result<Self> {
        let pipeline = PreprocessingPipeline {
            schema,
            numeric,
            categorical,
        };
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Parse and validate a transform artifact
    pub fn from_json_str(content: &str) -> Result<Self> {
        let pipeline: PreprocessingPipeline = serde_json::from_str(content)
            .map_err(|e| TennisError::artifact(ArtifactKind::Transform, e.to_string()))?;
        pipeline.validate()?;
        Ok(pipeline)
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    pub fn numeric_columns(&self) -> &[NumericColumn] {
        &self.numeric
    }

    pub fn categorical_columns(&self) -> &[CategoricalColumn] {
        &self.categorical
    }

    /// Fitted levels of a categorical column
    pub fn levels(&self, column: &str) -> Option<&[String]> {
        self.categorical
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.levels.as_slice())
    }

    fn validate(&self) -> Result<()> {
        let fail = |message: String| Err(TennisError::artifact(ArtifactKind::Transform, message));

        self.schema.validate()?;

        let numeric_names: Vec<&str> = self.numeric.iter().map(|c| c.name.as_str()).collect();
        if numeric_names != self.schema.numeric {
            return fail(format!(
                "numeric parameters {:?} do not match schema numeric columns {:?}",
                numeric_names, self.schema.numeric
            ));
        }
        let categorical_names: Vec<&str> =
            self.categorical.iter().map(|c| c.name.as_str()).collect();
        if categorical_names != self.schema.categorical {
            return fail(format!(
                "categorical parameters {:?} do not match schema categorical columns {:?}",
                categorical_names, self.schema.categorical
            ));
        }

        for column in &self.numeric {
            if !column.fill.is_finite() {
                return fail(format!("numeric column '{}' has a non-finite fill", column.name));
            }
            if let Some(scale) = &column.scale {
                if !scale.mean.is_finite() || !scale.std.is_finite() || scale.std <= 0.0 {
                    return fail(format!(
                        "numeric column '{}' has invalid scaling (mean={}, std={})",
                        column.name, scale.mean, scale.std
                    ));
                }
            }
        }

        for column in &self.categorical {
            if column.levels.is_empty() {
                return fail(format!("categorical column '{}' has no levels", column.name));
            }
            let unique: HashSet<&str> = column.levels.iter().map(String::as_str).collect();
            if unique.len() != column.levels.len() {
                return fail(format!(
                    "categorical column '{}' has duplicate levels",
                    column.name
                ));
            }
            if column.encode(&column.fill).is_none() {
                return fail(format!(
                    "fill '{}' of categorical column '{}' is not one of its levels",
                    column.fill, column.name
                ));
            }
        }

        Ok(())
    }

    /// Check the row carries exactly the fitted input columns, in order
    fn check_columns(&self, row: &FeatureRow) -> Result<()> {
        let expected = &self.schema.input_order;
        let present: HashSet<&str> = row.names().collect();

        if let Some(missing) = expected.iter().find(|c| !present.contains(c.as_str())) {
            return Err(TennisError::SchemaMismatch(format!(
                "missing column '{}'",
                missing
            )));
        }
        if let Some(unexpected) = row.names().find(|c| !expected.iter().any(|e| e.as_str() == *c)) {
            return Err(TennisError::SchemaMismatch(format!(
                "unexpected column '{}'",
                unexpected
            )));
        }
        if row.len() != expected.len() {
            return Err(TennisError::SchemaMismatch(format!(
                "row has {} columns, expected {} (duplicate column names)",
                row.len(),
                expected.len()
            )));
        }
        for (position, (found, wanted)) in row.names().zip(expected.iter()).enumerate() {
            if found != wanted.as_str() {
                return Err(TennisError::SchemaMismatch(format!(
                    "column order differs at position {}: expected '{}', found '{}'",
                    position, wanted, found
                )));
            }
        }
        Ok(())
    }

    /// Transform one row.
    ///
    /// The output is positional: numeric columns, then categorical codes,
    /// then an absent value for the target passthrough. Use
    /// [`TransformedRecord::relabel`](super::TransformedRecord::relabel) to
    /// recover the column labels.
    pub fn transform(&self, row: &FeatureRow) -> Result<Vec<Option<f64>>> {
        self.check_columns(row)?;

        let mut output = Vec::with_capacity(self.schema.output_width());
        let mut imputed = 0usize;

        for column in &self.numeric {
            let cell = self.cell(row, &column.name)?;
            if cell.is_missing() {
                imputed += 1;
            }
            output.push(Some(column.apply(cell)?));
        }
        for column in &self.categorical {
            let cell = self.cell(row, &column.name)?;
            if cell.is_missing() {
                imputed += 1;
            }
            output.push(Some(column.apply(cell)?));
        }
        // Target passes through as unknown
        output.push(None);

        if imputed > 0 {
            log::debug!("Imputed {} missing value(s)", imputed);
        }
        Ok(output)
    }

    /// Transform several rows, failing on the first bad one
    pub fn transform_batch(&self, rows: &[FeatureRow]) -> Result<Vec<Vec<Option<f64>>>> {
        rows.iter().map(|row| self.transform(row)).collect()
    }

    fn cell<'r>(&self, row: &'r FeatureRow, name: &str) -> Result<&'r CellValue> {
        row.get(name)
            .ok_or_else(|| TennisError::SchemaMismatch(format!("missing column '{}'", name)))
    }
}
