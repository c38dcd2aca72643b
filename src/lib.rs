// Modules
pub mod config;
pub mod constants;
pub mod data;
pub mod drift;
pub mod errors;
pub mod io;
pub mod monitor;
pub mod profile;
pub mod schema;
pub mod sink;
pub mod timing;
pub mod utils;
pub mod validation;

// Individual classes, and functions
pub use config::MonitorConfig;
pub use data::{Dataset, Record, Value};
pub use drift::{detect_drift, DriftDetector, DriftResult};
pub use errors::DriftWatchError;
pub use io::JsonIO;
pub use monitor::{Monitor, Observation};
pub use profile::ReferenceProfile;
pub use schema::{FeatureKind, FeatureSpec, Schema};
pub use sink::{ObservationSink, ValidationOutcome};
pub use validation::{SchemaValidator, ValidationResult};
