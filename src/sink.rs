//! Observation Sink
//!
//! The interface the monitor reports through. How observations are exposed
//! (a metrics endpoint, a time-series database, plain logs) is up to the
//! serving layer that implements [`ObservationSink`].
use crate::drift::DriftResult;
use crate::validation::ValidationResult;
use serde::{Deserialize, Serialize};

/// Result label of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationOutcome {
    Valid,
    Invalid,
}

impl ValidationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationOutcome::Valid => "valid",
            ValidationOutcome::Invalid => "invalid",
        }
    }
}

impl From<&ValidationResult> for ValidationOutcome {
    fn from(result: &ValidationResult) -> Self {
        if result.valid {
            ValidationOutcome::Valid
        } else {
            ValidationOutcome::Invalid
        }
    }
}

/// Receives named scalar observations.
///
/// Methods take `&self` so one sink can be shared between concurrent
/// requests; implementations handle their own synchronisation.
pub trait ObservationSink {
    /// A numeric feature value seen in a request.
    fn emit_feature_value(&self, name: &str, value: f64);

    /// The statistic of a drift test for one feature.
    fn emit_drift_score(&self, feature: &str, statistic: f64, test_name: &str);

    /// Whether a batch passed validation.
    fn emit_validation_outcome(&self, outcome: ValidationOutcome);

    /// An error of the given type while handling a request.
    fn emit_error(&self, _error_type: &str) {}

    /// Time spent in an operation, in seconds.
    fn emit_latency(&self, _operation: &str, _seconds: f64) {}
}

/// Report a validation result and, if drift detection ran, its scores.
pub fn report<S: ObservationSink + ?Sized>(sink: &S, validation: &ValidationResult, drift: Option<&DriftResult>) {
    sink.emit_validation_outcome(validation.into());
    if let Some(drift) = drift {
        for (feature, fd) in &drift.feature_drifts {
            sink.emit_drift_score(feature, fd.statistic, fd.test.as_str());
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Sink that keeps everything it receives, for assertions in tests.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) feature_values: Mutex<Vec<(String, f64)>>,
        pub(crate) drift_scores: Mutex<Vec<(String, f64, String)>>,
        pub(crate) outcomes: Mutex<Vec<ValidationOutcome>>,
        pub(crate) errors: Mutex<Vec<String>>,
        pub(crate) latencies: Mutex<Vec<(String, f64)>>,
    }

    impl ObservationSink for RecordingSink {
        fn emit_feature_value(&self, name: &str, value: f64) {
            self.feature_values.lock().unwrap().push((name.to_string(), value));
        }
        fn emit_drift_score(&self, feature: &str, statistic: f64, test_name: &str) {
            self.drift_scores
                .lock()
                .unwrap()
                .push((feature.to_string(), statistic, test_name.to_string()));
        }
        fn emit_validation_outcome(&self, outcome: ValidationOutcome) {
            self.outcomes.lock().unwrap().push(outcome);
        }
        fn emit_error(&self, error_type: &str) {
            self.errors.lock().unwrap().push(error_type.to_string());
        }
        fn emit_latency(&self, operation: &str, seconds: f64) {
            self.latencies.lock().unwrap().push((operation.to_string(), seconds));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;
    use crate::drift::{DriftTest, FeatureDrift};

    #[test]
    fn test_report_valid_with_drift() {
        let sink = RecordingSink::default();
        let validation = ValidationResult {
            valid: true,
            ..Default::default()
        };
        let mut drift = DriftResult::default();
        drift.feature_drifts.insert(
            "feature1".to_string(),
            FeatureDrift {
                test: DriftTest::KolmogorovSmirnov,
                statistic: 0.4,
                p_value: Some(0.3),
                drift: false,
            },
        );
        report(&sink, &validation, Some(&drift));
        assert_eq!(*sink.outcomes.lock().unwrap(), vec![ValidationOutcome::Valid]);
        assert_eq!(
            *sink.drift_scores.lock().unwrap(),
            vec![("feature1".to_string(), 0.4, "ks".to_string())]
        );
    }

    #[test]
    fn test_report_invalid() {
        let sink = RecordingSink::default();
        report(&sink, &ValidationResult::default(), None);
        assert_eq!(*sink.outcomes.lock().unwrap(), vec![ValidationOutcome::Invalid]);
        assert!(sink.drift_scores.lock().unwrap().is_empty());
        assert_eq!(ValidationOutcome::Invalid.as_str(), "invalid");
    }

    #[test]
    fn test_default_methods_are_noops() {
        struct Quiet;
        impl ObservationSink for Quiet {
            fn emit_feature_value(&self, _name: &str, _value: f64) {}
            fn emit_drift_score(&self, _feature: &str, _statistic: f64, _test_name: &str) {}
            fn emit_validation_outcome(&self, _outcome: ValidationOutcome) {}
        }
        let sink: &dyn ObservationSink = &Quiet;
        sink.emit_error("validation_error");
        sink.emit_latency("observe", 0.1);
    }
}
