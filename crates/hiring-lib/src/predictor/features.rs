//! Feature vector construction
//!
//! Turns a (possibly partial) name→value mapping into the ordered vector the
//! classifier expects. Absent features default to 0.0 and unknown keys are
//! ignored, so the output length always equals the schema length.

use crate::error::{HiringError, Result};
use crate::models::{FeatureMap, RawFeatures};
use crate::schema::FeatureSchema;
use serde_json::Value;

/// Builds feature vectors in the canonical order of a schema
#[derive(Debug, Clone)]
pub struct FeatureVectorBuilder {
    schema: FeatureSchema,
}

impl FeatureVectorBuilder {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Build from already-numeric values
    pub fn build(&self, values: &FeatureMap) -> Vec<f64> {
        self.schema
            .features()
            .iter()
            .map(|name| values.get(name).copied().unwrap_or(0.0))
            .collect()
    }

    /// Build from raw caller input, coercing each recognized value to a number
    pub fn build_raw(&self, raw: &RawFeatures) -> Result<Vec<f64>> {
        self.schema
            .features()
            .iter()
            .map(|name| match raw.get(name) {
                Some(value) => coerce(name, value),
                None => Ok(0.0),
            })
            .collect()
    }

    /// Coerce the recognized features of a raw mapping, keeping names
    pub fn coerce_map(&self, raw: &RawFeatures) -> Result<FeatureMap> {
        let vector = self.build_raw(raw)?;
        Ok(self
            .schema
            .features()
            .iter()
            .cloned()
            .zip(vector)
            .filter(|(name, _)| raw.contains_key(name))
            .collect())
    }

    /// Parse a string value such as a form field
    pub fn parse_field(name: &str, value: &str) -> Result<f64> {
        coerce(name, &Value::String(value.to_string()))
    }
}

/// Coerce a single raw value to a finite f64
pub fn coerce(field: &str, value: &Value) -> Result<f64> {
    let number = match value {
        Value::Null => return Ok(0.0),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| HiringError::invalid_input(field, format!("unrepresentable number {}", n)))?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(HiringError::invalid_input(field, "empty value"));
            }
            trimmed.parse::<f64>().map_err(|_| {
                HiringError::invalid_input(field, format!("expected a number, got {:?}", s))
            })?
        }
        Value::Array(_) | Value::Object(_) => {
            return Err(HiringError::invalid_input(field, "expected a number, got a structured value"))
        }
    };

    if !number.is_finite() {
        return Err(HiringError::invalid_input(field, "value must be finite"));
    }
    Ok(number)
}
