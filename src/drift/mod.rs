//! Drift Detection Logic
//!
//! This module compares batches of live records against a [`ReferenceProfile`](crate::profile::ReferenceProfile),
//! using the two-sample Kolmogorov-Smirnov test for numeric features and the
//! Jensen-Shannon divergence for categorical ones.

pub mod detector;
pub mod stats;

pub use detector::{detect_drift, DriftDetector, DriftResult, DriftTest, FeatureDrift, SkipReason};
pub use stats::{jensen_shannon_divergence, ks_2samp, ks_asymptotic_sf, ks_exact_sf, KsResult};
