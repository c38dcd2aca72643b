//! Schema
//!
//! The declared data contract for model inputs: which features exist,
//! whether they are required, their kind, and the allowed numeric range.
use crate::errors::DriftWatchError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::fs;
use std::path::Path;

/// How a feature is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    /// Values must coerce to numbers.
    Numeric,
    /// Values are category labels.
    Categorical,
}

impl FeatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKind::Numeric => "numeric",
            FeatureKind::Categorical => "categorical",
        }
    }
}

impl Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive bounds for a numeric feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl From<(f64, f64)> for Range {
    fn from((min, max): (f64, f64)) -> Self {
        Range { min, max }
    }
}

impl From<Range> for (f64, f64) {
    fn from(r: Range) -> Self {
        (r.min, r.max)
    }
}

impl Range {
    /// Whether `[lo, hi]` lies inside the bounds.
    pub fn contains_span(&self, lo: f64, hi: f64) -> bool {
        lo >= self.min && hi <= self.max
    }
}

/// Declaration of a single feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

#[derive(Serialize, Deserialize)]
struct SchemaDocument {
    features: BTreeMap<String, FeatureSpec>,
}

/// Immutable mapping of feature name to its declaration, held in name order.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    features: BTreeMap<String, FeatureSpec>,
}

impl Schema {
    /// Create a schema, rejecting declarations that can never be satisfied.
    pub fn new(features: BTreeMap<String, FeatureSpec>) -> Result<Self, DriftWatchError> {
        if features.is_empty() {
            return Err(DriftWatchError::MalformedSchema("no features declared".to_string()));
        }
        for (name, spec) in &features {
            if name.is_empty() {
                return Err(DriftWatchError::MalformedSchema("empty feature name".to_string()));
            }
            if let Some(range) = spec.range {
                if spec.kind != FeatureKind::Numeric {
                    return Err(DriftWatchError::MalformedSchema(format!(
                        "feature {} declares a range but is {}",
                        name, spec.kind
                    )));
                }
                if !range.min.is_finite() || !range.max.is_finite() || range.min > range.max {
                    return Err(DriftWatchError::MalformedSchema(format!(
                        "feature {} has an invalid range [{}, {}]",
                        name, range.min, range.max
                    )));
                }
            }
        }
        Ok(Schema { features })
    }

    /// Parse a schema document of the form `{"features": {name: {"type": ..}}}`.
    ///
    /// * `json_str` - The schema document.
    pub fn from_json(json_str: &str) -> Result<Self, DriftWatchError> {
        let doc: SchemaDocument =
            serde_json::from_str(json_str).map_err(|e| DriftWatchError::MalformedSchema(e.to_string()))?;
        Self::new(doc.features)
    }

    /// Load a schema document from a file.
    ///
    /// * `path` - Path of the JSON schema document.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DriftWatchError> {
        let path = path.as_ref();
        let json_str = fs::read_to_string(path)
            .map_err(|e| DriftWatchError::UnableToRead(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json_str)
    }

    /// Dump the schema as a JSON document.
    pub fn json_dump(&self) -> Result<String, DriftWatchError> {
        let doc = SchemaDocument {
            features: self.features.clone(),
        };
        serde_json::to_string(&doc).map_err(|e| DriftWatchError::UnableToWrite(e.to_string()))
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureSpec> {
        self.features.get(name)
    }

    /// Iterate over all declared features in name order.
    pub fn features(&self) -> impl Iterator<Item = (&str, &FeatureSpec)> {
        self.features.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Names of the required features, in name order.
    pub fn required_features(&self) -> Vec<&str> {
        self.features()
            .filter(|(_, spec)| spec.required)
            .map(|(name, _)| name)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
