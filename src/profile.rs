//! Reference Profile
//!
//! Statistical summary of the baseline dataset. A profile is built once at
//! startup and then only read, so it can be shared across threads behind an
//! `Arc` without locking.
use crate::constants::HISTOGRAM_BINS;
use crate::data::{Dataset, Record, Value};
use crate::errors::DriftWatchError;
use crate::io::JsonIO;
use crate::schema::FeatureKind;
use crate::utils::{float_cmp, mean, median_sorted, sample_std};
use hashbrown::HashMap;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Equal-width histogram over `[min, max]`.
///
/// `edges` has one more element than `counts`. The last bin includes its
/// right edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width bins spanning `[min, max]`.
    /// A degenerate span is widened by one half on each side.
    pub fn new(values: &[f64], min: f64, max: f64, bins: usize) -> Self {
        let (lo, hi) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };
        let width = (hi - lo) / bins as f64;
        let mut edges: Vec<f64> = (0..bins).map(|i| lo + width * i as f64).collect();
        edges.push(hi);

        let mut counts = vec![0; bins];
        for &v in values {
            if v < lo || v > hi {
                continue;
            }
            let idx = (((v - lo) / (hi - lo)) * bins as f64).floor() as usize;
            counts[idx.min(bins - 1)] += 1;
        }
        Histogram { edges, counts }
    }
}

/// Summary of a numeric reference feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericProfile {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub histogram: Histogram,
    /// Sorted non-missing reference values, used by the two-sample test.
    pub sample: Vec<f64>,
}

impl NumericProfile {
    /// Summarise non-missing values. Returns `None` if there are none.
    pub fn from_values(mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_unstable_by(float_cmp);
        let m = mean(&values);
        let min = values[0];
        let max = values[values.len() - 1];
        Some(NumericProfile {
            count: values.len(),
            mean: m,
            std: sample_std(&values, m),
            min,
            max,
            median: median_sorted(&values),
            histogram: Histogram::new(&values, min, max, HISTOGRAM_BINS),
            sample: values,
        })
    }

    /// Everything `from_values` guarantees, checked on a loaded profile.
    fn check(&self) -> Result<(), String> {
        if self.sample.is_empty() {
            return Err("sample is empty".to_string());
        }
        if self.sample.iter().any(|v| !v.is_finite()) {
            return Err("sample has non-finite values".to_string());
        }
        if self.sample.windows(2).any(|w| w[0] > w[1]) {
            return Err("sample is not sorted".to_string());
        }
        if self.count != self.sample.len() {
            return Err(format!("count {} but {} sample values", self.count, self.sample.len()));
        }
        if self.min != self.sample[0] || self.max != self.sample[self.sample.len() - 1] {
            return Err("min and max do not match the sample".to_string());
        }
        if [self.mean, self.std, self.median].iter().any(|v| !v.is_finite()) {
            return Err("summary statistics are not finite".to_string());
        }
        let h = &self.histogram;
        if h.counts.len() != HISTOGRAM_BINS || h.edges.len() != HISTOGRAM_BINS + 1 {
            return Err(format!(
                "histogram has {} bins and {} edges, expected {} and {}",
                h.counts.len(),
                h.edges.len(),
                HISTOGRAM_BINS,
                HISTOGRAM_BINS + 1
            ));
        }
        if h.edges.iter().any(|e| !e.is_finite()) || h.edges.windows(2).any(|w| w[0] > w[1]) {
            return Err("histogram edges are not increasing".to_string());
        }
        if h.counts.iter().sum::<usize>() != self.count {
            return Err("histogram counts do not add up to count".to_string());
        }
        Ok(())
    }
}

/// Summary of a categorical reference feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalProfile {
    pub count: usize,
    pub unique_count: usize,
    /// Normalised value counts, in category order.
    pub value_probabilities: BTreeMap<String, f64>,
}

impl CategoricalProfile {
    /// Summarise category labels. Returns `None` if there are none.
    pub fn from_labels<I, S>(labels: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut total = 0;
        for label in labels {
            *counts.entry(label.into()).or_insert(0) += 1;
            total += 1;
        }
        if total == 0 {
            return None;
        }
        let value_probabilities: BTreeMap<String, f64> = counts
            .into_iter()
            .map(|(k, c)| (k, c as f64 / total as f64))
            .collect();
        Some(CategoricalProfile {
            count: total,
            unique_count: value_probabilities.len(),
            value_probabilities,
        })
    }

    fn check(&self) -> Result<(), String> {
        if self.count == 0 || self.value_probabilities.is_empty() {
            return Err("no categories".to_string());
        }
        if self.unique_count != self.value_probabilities.len() {
            return Err(format!(
                "unique_count {} but {} categories",
                self.unique_count,
                self.value_probabilities.len()
            ));
        }
        if self.value_probabilities.values().any(|p| !(0.0..=1.0).contains(p)) {
            return Err("probabilities outside [0, 1]".to_string());
        }
        let total: f64 = self.value_probabilities.values().sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(format!("probabilities add up to {}", total));
        }
        Ok(())
    }
}

/// Profile of a single feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FeatureProfile {
    Numeric(NumericProfile),
    Categorical(CategoricalProfile),
}

impl FeatureProfile {
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureProfile::Numeric(_) => FeatureKind::Numeric,
            FeatureProfile::Categorical(_) => FeatureKind::Categorical,
        }
    }

    /// Profile one column. Numeric when every non-missing value coerces to a
    /// number, categorical otherwise. `None` for a column with no values.
    fn from_column(values: &[Value]) -> Option<Self> {
        let present: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
        if present.is_empty() {
            return None;
        }
        let numbers: Vec<f64> = present.iter().filter_map(|v| v.as_f64()).collect();
        if numbers.len() == present.len() {
            NumericProfile::from_values(numbers).map(FeatureProfile::Numeric)
        } else {
            CategoricalProfile::from_labels(present.iter().filter_map(|v| v.label())).map(FeatureProfile::Categorical)
        }
    }
}

/// Immutable per-feature baseline used as the comparison target for drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceProfile {
    /// Rows in the dataset the profile was built from.
    pub rows: usize,
    features: BTreeMap<String, FeatureProfile>,
}

impl ReferenceProfile {
    /// Build the profile of a reference dataset.
    ///
    /// Columns without a single non-missing value are excluded.
    ///
    /// * `dataset` - The reference dataset.
    pub fn build(dataset: &Dataset) -> Result<Self, DriftWatchError> {
        let mut features = BTreeMap::new();
        for (name, values) in dataset.columns.iter().zip(dataset.values.iter()) {
            match FeatureProfile::from_column(values) {
                Some(profile) => {
                    features.insert(name.clone(), profile);
                }
                None => warn!("Reference column {} has no values, excluding it from the profile.", name),
            }
        }
        if features.is_empty() {
            return Err(DriftWatchError::MalformedDataset(
                "no column of the reference dataset has values".to_string(),
            ));
        }
        let profile = ReferenceProfile {
            rows: dataset.rows,
            features,
        };
        info!(
            "Built reference profile from {} rows: {} numeric, {} categorical features.",
            profile.rows,
            profile.count_kind(FeatureKind::Numeric),
            profile.count_kind(FeatureKind::Categorical)
        );
        Ok(profile)
    }

    /// Build the profile of in-memory reference records.
    pub fn from_records(records: &[Record]) -> Result<Self, DriftWatchError> {
        Self::build(&Dataset::from_records(records)?)
    }

    /// Load a CSV reference dataset and build its profile.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, DriftWatchError> {
        Self::build(&Dataset::from_csv_path(path)?)
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureProfile> {
        self.features.get(name)
    }

    pub fn kind(&self, name: &str) -> Option<FeatureKind> {
        self.features.get(name).map(|f| f.kind())
    }

    /// Iterate over all profiled features in name order.
    pub fn features(&self) -> impl Iterator<Item = (&str, &FeatureProfile)> {
        self.features.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn numeric(&self, name: &str) -> Option<&NumericProfile> {
        match self.features.get(name) {
            Some(FeatureProfile::Numeric(p)) => Some(p),
            _ => None,
        }
    }

    pub fn categorical(&self, name: &str) -> Option<&CategoricalProfile> {
        match self.features.get(name) {
            Some(FeatureProfile::Categorical(p)) => Some(p),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    fn count_kind(&self, kind: FeatureKind) -> usize {
        self.features.values().filter(|f| f.kind() == kind).count()
    }
}

impl JsonIO for ReferenceProfile {
    /// A loaded profile must be one `build` could have produced.
    fn check(&self) -> Result<(), DriftWatchError> {
        if self.features.is_empty() {
            return Err(DriftWatchError::MalformedDataset("profile has no features".to_string()));
        }
        for (name, feature) in &self.features {
            let checked = match feature {
                FeatureProfile::Numeric(p) => p.check(),
                FeatureProfile::Categorical(p) => p.check(),
            };
            checked.map_err(|e| DriftWatchError::MalformedDataset(format!("profile of {}: {}", name, e)))?;
        }
        Ok(())
    }
}
