use crate::constants::{DEFAULT_DRIFT_THRESHOLD, JS_TEST_NAME, KS_TEST_NAME};
use crate::data::{column_values, Record, Value};
use crate::drift::stats::{jensen_shannon_divergence, ks_2samp};
use crate::errors::DriftWatchError;
use crate::profile::{CategoricalProfile, FeatureProfile, ReferenceProfile};
use crate::utils::{float_cmp, validate_threshold};
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};
use std::sync::Arc;

/// Statistical test used to compare a feature against its reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriftTest {
    /// Two-sample Kolmogorov-Smirnov, for numeric features.
    #[serde(rename = "ks")]
    KolmogorovSmirnov,
    /// Jensen-Shannon divergence, for categorical features.
    #[serde(rename = "jensen_shannon")]
    JensenShannon,
}

impl DriftTest {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriftTest::KolmogorovSmirnov => KS_TEST_NAME,
            DriftTest::JensenShannon => JS_TEST_NAME,
        }
    }
}

/// Comparison of one feature against the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDrift {
    pub test: DriftTest,
    /// KS distance or JS divergence.
    pub statistic: f64,
    /// Only the KS test produces a p-value.
    pub p_value: Option<f64>,
    pub drift: bool,
}

/// Why a feature was left out of the comparison for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The batch holds values that do not match the reference kind.
    TypeConflict,
    /// Every value of the feature in the batch is missing.
    AllNull,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TypeConflict => f.write_str("values conflict with the reference type"),
            SkipReason::AllNull => f.write_str("all values are missing"),
        }
    }
}

/// Drift found in one batch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DriftResult {
    pub drift_detected: bool,
    pub feature_drifts: BTreeMap<String, FeatureDrift>,
    pub flagged_features: BTreeSet<String>,
    pub skipped_features: BTreeMap<String, SkipReason>,
}

enum Comparison {
    Compared(FeatureDrift),
    Skipped(SkipReason),
}

fn compare_numeric(reference: &[f64], values: &[&Value], threshold: f64) -> Comparison {
    let present: Vec<&&Value> = values.iter().filter(|v| !v.is_null()).collect();
    if present.is_empty() {
        return Comparison::Skipped(SkipReason::AllNull);
    }
    let mut current: Vec<f64> = present.iter().filter_map(|v| v.as_f64()).collect();
    if current.len() != present.len() {
        return Comparison::Skipped(SkipReason::TypeConflict);
    }
    current.sort_unstable_by(float_cmp);
    match ks_2samp(reference, &current) {
        Some(ks) => Comparison::Compared(FeatureDrift {
            test: DriftTest::KolmogorovSmirnov,
            statistic: ks.statistic,
            p_value: Some(ks.p_value),
            drift: ks.p_value < threshold,
        }),
        None => Comparison::Skipped(SkipReason::AllNull),
    }
}

fn compare_categorical(reference: &CategoricalProfile, values: &[&Value], threshold: f64) -> Comparison {
    match CategoricalProfile::from_labels(values.iter().filter_map(|v| v.label())) {
        Some(current) => {
            let js = jensen_shannon_divergence(&reference.value_probabilities, &current.value_probabilities);
            Comparison::Compared(FeatureDrift {
                test: DriftTest::JensenShannon,
                statistic: js,
                p_value: None,
                drift: js > threshold,
            })
        }
        None => Comparison::Skipped(SkipReason::AllNull),
    }
}

fn compare(profile: &FeatureProfile, values: &[&Value], threshold: f64) -> Comparison {
    match profile {
        FeatureProfile::Numeric(p) => compare_numeric(&p.sample, values, threshold),
        FeatureProfile::Categorical(p) => compare_categorical(p, values, threshold),
    }
}

fn detect_with(
    profile: &ReferenceProfile,
    batch: &[Record],
    threshold: f64,
    parallel: bool,
) -> Result<DriftResult, DriftWatchError> {
    if batch.is_empty() {
        return Err(DriftWatchError::EmptyBatch);
    }
    validate_threshold(threshold)?;

    // Reference features absent from the batch are not compared,
    // batch columns unknown to the reference are never looked at.
    let jobs: Vec<(&str, &FeatureProfile, Vec<&Value>)> = profile
        .features()
        .filter_map(|(name, fp)| column_values(batch, name).map(|v| (name, fp, v)))
        .collect();

    let comparisons: Vec<(&str, Comparison)> = if parallel {
        jobs.par_iter()
            .map(|(name, fp, values)| (*name, compare(fp, values, threshold)))
            .collect()
    } else {
        jobs.iter()
            .map(|(name, fp, values)| (*name, compare(fp, values, threshold)))
            .collect()
    };

    let mut result = DriftResult::default();
    for (name, comparison) in comparisons {
        match comparison {
            Comparison::Compared(fd) => {
                if fd.drift {
                    result.drift_detected = true;
                    result.flagged_features.insert(name.to_string());
                }
                result.feature_drifts.insert(name.to_string(), fd);
            }
            Comparison::Skipped(reason) => {
                warn!("Skipping drift check for feature {}: {}.", name, reason);
                result.skipped_features.insert(name.to_string(), reason);
            }
        }
    }
    debug!(
        "Compared {} features, {} flagged, {} skipped.",
        result.feature_drifts.len(),
        result.flagged_features.len(),
        result.skipped_features.len()
    );
    Ok(result)
}

/// Compare a batch against a reference profile.
///
/// Numeric features are flagged when the KS p-value falls below `threshold`,
/// categorical features when the JS divergence rises above it.
///
/// * `profile` - The reference profile.
/// * `batch` - Current records, which should already have passed validation.
/// * `threshold` - Significance level / divergence limit, within (0, 1].
pub fn detect_drift(profile: &ReferenceProfile, batch: &[Record], threshold: f64) -> Result<DriftResult, DriftWatchError> {
    detect_with(profile, batch, threshold, false)
}

/// Drift detector bound to a shared reference profile.
///
/// Holds no mutable state, so a single detector may be used from many
/// threads at once.
#[derive(Debug, Clone)]
pub struct DriftDetector {
    profile: Arc<ReferenceProfile>,
    threshold: f64,
    parallel: bool,
}

impl DriftDetector {
    pub fn new(profile: Arc<ReferenceProfile>) -> Self {
        DriftDetector {
            profile,
            threshold: DEFAULT_DRIFT_THRESHOLD,
            parallel: false,
        }
    }

    /// Set the drift threshold.
    /// * `threshold` - Significance level for KS, divergence limit for JS.
    pub fn set_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set whether features are compared in parallel.
    /// * `parallel` - Use the rayon thread pool to compare features.
    pub fn set_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn profile(&self) -> &ReferenceProfile {
        &self.profile
    }

    /// Compare a validated batch against the reference profile.
    pub fn detect(&self, batch: &[Record]) -> Result<DriftResult, DriftWatchError> {
        detect_with(&self.profile, batch, self.threshold, self.parallel)
    }
}
