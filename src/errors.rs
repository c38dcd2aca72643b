//! Errors
//!
//! Custom error types used throughout the `driftwatch` crate.
use thiserror::Error;

/// Errors that can occur while building or running the monitor.
#[derive(Debug, Error)]
pub enum DriftWatchError {
    /// Unable to read a schema, dataset, profile or config.
    #[error("Unable to read from {0}")]
    UnableToRead(String),
    /// Unable to write a profile or config.
    #[error("Unable to write to file: {0}")]
    UnableToWrite(String),
    /// The schema document could not be understood.
    #[error("Malformed schema: {0}")]
    MalformedSchema(String),
    /// The reference dataset could not be understood.
    #[error("Malformed reference dataset: {0}")]
    MalformedDataset(String),
    /// First value is the feature, second is the kind declared in the schema,
    /// third is the kind the reference profile assigned.
    #[error("Feature {0} is declared {1} in the schema, but profiled as {2}.")]
    KindMismatch(String, String, String),
    /// A batch with no records was passed in.
    #[error("Batch contains no records.")]
    EmptyBatch,
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
}

impl DriftWatchError {
    /// Whether this error happens while building the monitor, and so
    /// should abort startup rather than fail a single request.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, DriftWatchError::EmptyBatch)
    }
}
