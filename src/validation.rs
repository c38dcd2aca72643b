//! Validation
//!
//! Checks batches of live records against a [`Schema`].
use crate::data::{column_values, Record};
use crate::errors::DriftWatchError;
use crate::schema::{FeatureKind, Schema};
use crate::utils::items_to_strings;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Outcome of validating one batch.
///
/// Every failure found produces a name in one of the column lists and a
/// matching message in `errors`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub missing_columns: Vec<String>,
    pub type_errors: Vec<String>,
    pub range_errors: Vec<String>,
}

/// Validates batches against an immutable schema.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    schema: Schema,
}

impl SchemaValidator {
    pub fn new(schema: Schema) -> Self {
        SchemaValidator { schema }
    }

    /// Load the schema document at `path` and build a validator for it.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DriftWatchError> {
        Ok(Self::new(Schema::load(path)?))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Validate a non-empty batch.
    ///
    /// Validation failures are reported in the returned [`ValidationResult`],
    /// only an empty batch is an error.
    ///
    /// * `batch` - Records to check.
    pub fn validate(&self, batch: &[Record]) -> Result<ValidationResult, DriftWatchError> {
        if batch.is_empty() {
            return Err(DriftWatchError::EmptyBatch);
        }
        let mut results = ValidationResult::default();

        // A column is missing only when no record in the batch carries it.
        let missing: Vec<String> = self
            .schema
            .required_features()
            .into_iter()
            .filter(|name| column_values(batch, name).is_none())
            .map(String::from)
            .collect();
        if !missing.is_empty() {
            results
                .errors
                .push(format!("Missing required columns: {}", items_to_strings(&missing)));
            results.missing_columns = missing;
        }

        for (name, spec) in self.schema.features() {
            if spec.kind != FeatureKind::Numeric {
                continue;
            }
            let values = match column_values(batch, name) {
                Some(v) => v,
                None => continue,
            };

            let present: Vec<_> = values.iter().filter(|v| !v.is_null()).collect();
            let numbers: Vec<f64> = present.iter().filter_map(|v| v.as_f64()).collect();
            // An all-null column cannot be shown to be numeric.
            if present.is_empty() || numbers.len() != present.len() {
                results.type_errors.push(name.to_string());
                results.errors.push(format!("Column {} should be numeric", name));
                continue;
            }

            if let Some(range) = spec.range {
                let lo = numbers.iter().copied().fold(f64::INFINITY, f64::min);
                let hi = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                if !range.contains_span(lo, hi) {
                    results.range_errors.push(name.to_string());
                    results.errors.push(format!(
                        "Column {} has values outside range [{}, {}]",
                        name, range.min, range.max
                    ));
                }
            }
        }

        results.valid =
            results.missing_columns.is_empty() && results.type_errors.is_empty() && results.range_errors.is_empty();
        debug!(
            "Validated batch of {} records, {} errors found.",
            batch.len(),
            results.errors.len()
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    const SCHEMA: &str = r#"{
        "features": {
            "feature1": {"type": "numeric", "required": true, "range": [0.0, 1.0]},
            "feature2": {"type": "numeric", "required": true},
            "feature3": {"type": "categorical", "required": false}
        }
    }"#;

    fn validator() -> SchemaValidator {
        SchemaValidator::new(Schema::from_json(SCHEMA).unwrap())
    }

    fn record(items: &[(&str, Value)]) -> Record {
        items.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_valid_batch() {
        let batch = vec![
            record(&[("feature1", 0.5.into()), ("feature2", 1.0.into()), ("feature3", "a".into())]),
            record(&[("feature1", 0.0.into()), ("feature2", "2.5".into()), ("feature3", "b".into())]),
            record(&[("feature1", 1.0.into()), ("feature2", (-3.0).into())]),
        ];
        let res = validator().validate(&batch).unwrap();
        assert!(res.valid);
        assert!(res.errors.is_empty());
        assert!(res.missing_columns.is_empty());
    }

    #[test]
    fn test_missing_required_column() {
        let batch = vec![record(&[("feature1", 0.5.into()), ("feature3", "a".into())])];
        let res = validator().validate(&batch).unwrap();
        assert!(!res.valid);
        assert_eq!(res.missing_columns, vec!["feature2"]);
        assert_eq!(res.errors.len(), 1);
        assert!(res.errors[0].contains("feature2"));
    }

    #[test]
    fn test_missing_is_column_level() {
        // feature2 is absent from one record only, so it is not missing.
        let batch = vec![
            record(&[("feature1", 0.5.into()), ("feature2", 1.0.into())]),
            record(&[("feature1", 0.6.into())]),
        ];
        let res = validator().validate(&batch).unwrap();
        assert!(res.valid);
    }

    #[test]
    fn test_type_error() {
        let batch = vec![
            record(&[("feature1", 0.5.into()), ("feature2", 1.0.into())]),
            record(&[("feature1", 0.5.into()), ("feature2", "abc".into())]),
        ];
        let res = validator().validate(&batch).unwrap();
        assert!(!res.valid);
        assert_eq!(res.type_errors, vec!["feature2"]);
        assert_eq!(res.errors, vec!["Column feature2 should be numeric"]);
    }

    #[test]
    fn test_all_null_column_is_type_error() {
        let batch = vec![record(&[("feature1", Value::Null), ("feature2", 1.0.into())])];
        let res = validator().validate(&batch).unwrap();
        assert!(!res.valid);
        assert_eq!(res.type_errors, vec!["feature1"]);
        assert!(res.range_errors.is_empty());
    }

    #[test]
    fn test_range_errors() {
        for bad in [1.5, -0.1] {
            let batch = vec![
                record(&[("feature1", 0.5.into()), ("feature2", 1.0.into())]),
                record(&[("feature1", bad.into()), ("feature2", 1.0.into())]),
            ];
            let res = validator().validate(&batch).unwrap();
            assert!(!res.valid);
            assert_eq!(res.range_errors, vec!["feature1"]);
            assert_eq!(res.errors, vec!["Column feature1 has values outside range [0, 1]"]);
        }
    }

    #[test]
    fn test_all_failures_reported() {
        let batch = vec![record(&[("feature1", 2.0.into()), ("feature3", 4.0.into())])];
        let res = validator().validate(&batch).unwrap();
        assert!(!res.valid);
        assert_eq!(res.missing_columns, vec!["feature2"]);
        assert_eq!(res.range_errors, vec!["feature1"]);
        assert_eq!(res.errors.len(), 2);
        assert!(res.errors[0].starts_with("Missing required columns"));
    }

    #[test]
    fn test_empty_batch() {
        assert!(matches!(validator().validate(&[]), Err(DriftWatchError::EmptyBatch)));
    }
}
