//! Monitor
//!
//! The serving-side context that ties validation, drift detection and
//! reporting together. A monitor is built once at startup, then shared by
//! reference (or cheaply cloned) into request handling.
use crate::config::MonitorConfig;
use crate::constants::{OBSERVE_OPERATION, VALIDATION_ERROR};
use crate::data::Record;
use crate::drift::{DriftDetector, DriftResult};
use crate::errors::DriftWatchError;
use crate::io::JsonIO;
use crate::profile::ReferenceProfile;
use crate::schema::{FeatureKind, Schema};
use crate::sink::{report, ObservationSink};
use crate::timing::LatencyTimer;
use crate::utils::validate_threshold;
use crate::validation::{SchemaValidator, ValidationResult};
use log::{debug, info, warn};
use std::sync::Arc;


/// What the monitor found for one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub validation: ValidationResult,
    /// Present only when the batch passed validation.
    pub drift: Option<DriftResult>,
}

/// Validation and drift monitor for one model version.
#[derive(Debug, Clone)]
pub struct Monitor {
    model_name: String,
    model_version: String,
    validator: SchemaValidator,
    detector: DriftDetector,
}

/// Every feature both declared and profiled must agree on its kind.
fn check_kinds(schema: &Schema, profile: &ReferenceProfile) -> Result<(), DriftWatchError> {
    for (name, spec) in schema.features() {
        match profile.kind(name) {
            Some(kind) if kind != spec.kind => {
                return Err(DriftWatchError::KindMismatch(
                    name.to_string(),
                    spec.kind.to_string(),
                    kind.to_string(),
                ));
            }
            Some(_) => (),
            None => warn!("Feature {} is declared in the schema but has no reference profile.", name),
        }
    }
    Ok(())
}

impl Monitor {
    /// Create a monitor from an already loaded schema and profile.
    ///
    /// * `schema` - The declared data contract.
    /// * `profile` - The reference profile, shared read-only.
    /// * `threshold` - Drift threshold, within (0, 1].
    pub fn new(schema: Schema, profile: Arc<ReferenceProfile>, threshold: f64) -> Result<Self, DriftWatchError> {
        validate_threshold(threshold)?;
        check_kinds(&schema, &profile)?;
        let defaults = MonitorConfig::default();
        Ok(Monitor {
            model_name: defaults.model_name,
            model_version: defaults.model_version,
            validator: SchemaValidator::new(schema),
            detector: DriftDetector::new(profile).set_threshold(threshold),
        })
    }

    /// Load the schema and reference named by `config` and build a monitor.
    /// A saved profile is used when `profile_path` is set, otherwise the
    /// reference dataset is profiled. Any failure here means the monitor
    /// cannot serve.
    pub fn from_config(config: &MonitorConfig) -> Result<Self, DriftWatchError> {
        config.validate()?;
        let schema_path = config.resolved_schema_path();
        let schema = Schema::load(&schema_path)?;
        let (profile, reference_path) = match &config.profile_path {
            Some(path) => (ReferenceProfile::load_json(path)?, path.clone()),
            None => {
                let path = config.resolved_reference_path();
                (ReferenceProfile::from_csv_path(&path)?, path)
            }
        };
        let monitor = Monitor::new(schema, Arc::new(profile), config.drift_threshold)?
            .set_model(&config.model_name, &config.model_version)
            .set_parallel(config.parallel);
        info!(
            "Monitor ready for model {} version {} (schema {}, reference {}).",
            monitor.model_name,
            monitor.model_version,
            schema_path.display(),
            reference_path.display()
        );
        Ok(monitor)
    }

    pub fn set_model(mut self, model_name: &str, model_version: &str) -> Self {
        self.model_name = model_name.to_string();
        self.model_version = model_version.to_string();
        self
    }

    /// Set whether features are compared in parallel.
    pub fn set_parallel(mut self, parallel: bool) -> Self {
        self.detector = self.detector.set_parallel(parallel);
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    pub fn schema(&self) -> &Schema {
        self.validator.schema()
    }

    pub fn profile(&self) -> &ReferenceProfile {
        self.detector.profile()
    }

    pub fn threshold(&self) -> f64 {
        self.detector.threshold()
    }

    pub fn validate(&self, batch: &[Record]) -> Result<ValidationResult, DriftWatchError> {
        self.validator.validate(batch)
    }

    /// Compare a batch against the reference. The batch should already
    /// have passed [`Monitor::validate`].
    pub fn detect(&self, batch: &[Record]) -> Result<DriftResult, DriftWatchError> {
        self.detector.detect(batch)
    }

    /// Validate a batch, and if it is valid check it for drift, reporting
    /// everything to `sink`. The time spent is reported on every exit path.
    ///
    /// * `batch` - Records to observe.
    /// * `sink` - Where observations are sent.
    pub fn observe<S: ObservationSink + ?Sized>(
        &self,
        batch: &[Record],
        sink: &S,
    ) -> Result<Observation, DriftWatchError> {
        let _timer = LatencyTimer::start(sink, OBSERVE_OPERATION);

        let validation = self.validator.validate(batch)?;
        if !validation.valid {
            debug!("Rejected batch: {}", validation.errors.join("; "));
            sink.emit_error(VALIDATION_ERROR);
            report(sink, &validation, None);
            return Ok(Observation {
                validation,
                drift: None,
            });
        }

        for record in batch {
            for (name, spec) in self.schema().features() {
                if spec.kind != FeatureKind::Numeric {
                    continue;
                }
                if let Some(v) = record.get(name).and_then(|v| v.as_f64()) {
                    sink.emit_feature_value(name, v);
                }
            }
        }

        let drift = self.detector.detect(batch)?;
        if drift.drift_detected {
            warn!(
                "Drift detected for model {} version {} in features: {}.",
                self.model_name,
                self.model_version,
                drift.flagged_features.iter().cloned().collect::<Vec<_>>().join(", ")
            );
        }
        report(sink, &validation, Some(&drift));
        Ok(Observation {
            validation,
            drift: Some(drift),
        })
    }

    /// Observe a single request, as a batch of one.
    pub fn observe_record<S: ObservationSink + ?Sized>(
        &self,
        record: &Record,
        sink: &S,
    ) -> Result<Observation, DriftWatchError> {
        self.observe(std::slice::from_ref(record), sink)
    }
}
