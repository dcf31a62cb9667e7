//! Versioned column schema stored alongside the fitted transform
//!
//! The transform emits values by position: numeric columns, then
//! categorical columns, then the target passthrough. This descriptor is
//! the only source of labels for that output.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{ArtifactKind, Result, TennisError};

/// Schema versions this build can read
pub const SUPPORTED_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub version: u32,
    /// Column order of the raw input row the transform was fitted on
    pub input_order: Vec<String>,
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub target: String,
}

impl SchemaDescriptor {
    /// Number of model input features (numeric + categorical)
    pub fn feature_count(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }

    /// Width of the raw transform output, target included
    pub fn output_width(&self) -> usize {
        self.feature_count() + 1
    }

    /// Model input feature names, numeric then categorical
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.numeric
            .iter()
            .chain(self.categorical.iter())
            .map(String::as_str)
    }

    pub fn is_categorical(&self, column: &str) -> bool {
        self.categorical.iter().any(|c| c == column)
    }

    /// Check internal consistency of the descriptor
    pub fn validate(&self) -> Result<()> {
        let fail = |message: String| Err(TennisError::artifact(ArtifactKind::Transform, message));

        if self.version != SUPPORTED_SCHEMA_VERSION {
            return fail(format!(
                "unsupported schema version {} (expected {})",
                self.version, SUPPORTED_SCHEMA_VERSION
            ));
        }
        if self.feature_count() == 0 {
            return fail("schema declares no feature columns".to_string());
        }

        let mut seen = HashSet::new();
        for column in self.feature_names().chain(std::iter::once(self.target.as_str())) {
            if !seen.insert(column) {
                return fail(format!("column '{}' declared more than once", column));
            }
        }

        let mut input_seen = HashSet::new();
        for column in &self.input_order {
            if !input_seen.insert(column.as_str()) {
                return fail(format!("input column '{}' listed more than once", column));
            }
            if !seen.contains(column.as_str()) {
                return fail(format!(
                    "input column '{}' is neither numeric, categorical nor the target",
                    column
                ));
            }
        }
        if let Some(column) = seen.iter().find(|c| !input_seen.contains(*c)) {
            return fail(format!("column '{}' is absent from the input order", column));
        }

        Ok(())
    }
}
