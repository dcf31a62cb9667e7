//! Labelled single-row representation with typed cells

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::{Result, TennisError};

/// A single cell of a feature row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Category(String),
    Missing,
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Number(_) => "number",
            CellValue::Category(_) => "category",
            CellValue::Missing => "missing",
        }
    }

    fn from_json(column: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(CellValue::Missing),
            Value::Number(n) => n.as_f64().map(CellValue::Number).ok_or_else(|| {
                TennisError::SchemaMismatch(format!("column '{}' holds an invalid number", column))
            }),
            Value::String(s) => Ok(CellValue::Category(s.clone())),
            other => Err(TennisError::SchemaMismatch(format!(
                "column '{}' holds unsupported JSON value {}",
                column, other
            ))),
        }
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        value.map(CellValue::Number).unwrap_or(CellValue::Missing)
    }
}

impl From<Option<&str>> for CellValue {
    fn from(value: Option<&str>) -> Self {
        value
            .map(|s| CellValue::Category(s.to_string()))
            .unwrap_or(CellValue::Missing)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Category(s) => write!(f, "{}", s),
            CellValue::Missing => write!(f, "-"),
        }
    }
}

/// An ordered sequence of named cells
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    columns: Vec<(String, CellValue)>,
}

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<CellValue>) {
        self.columns.push((name.into(), value.into()));
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn cells(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    /// Remove a column, returning its value
    pub fn remove(&mut self, name: &str) -> Option<CellValue> {
        let index = self.columns.iter().position(|(column, _)| column == name)?;
        Some(self.columns.remove(index).1)
    }

    /// Build a row from a JSON object.
    ///
    /// JSON objects carry no column order, so columns named in `order` come
    /// first in that order, followed by any other keys. Absent columns are
    /// left out rather than filled; the transform reports them.
    pub fn from_json_object(object: &Map<String, Value>, order: &[&str]) -> Result<Self> {
        let mut row = FeatureRow::new();
        for name in order {
            if let Some(value) = object.get(*name) {
                row.push(*name, CellValue::from_json(name, value)?);
            }
        }
        for (name, value) in object {
            if !order.contains(&name.as_str()) {
                row.push(name.clone(), CellValue::from_json(name, value)?);
            }
        }
        Ok(row)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Category(value.to_string())
    }
}
