//! IO
//!
//! JSON persistence shared by everything that is saved between runs.
use crate::errors::DriftWatchError;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::Path;

pub trait JsonIO: Serialize + DeserializeOwned + Sized {
    /// Invariants a loaded object must satisfy. Runs after every load.
    fn check(&self) -> Result<(), DriftWatchError> {
        Ok(())
    }

    /// Save the object as a json object to a file.
    ///
    /// * `path` - Path to save the object.
    fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), DriftWatchError> {
        fs::write(path, self.json_dump()?).map_err(|e| DriftWatchError::UnableToWrite(e.to_string()))
    }

    /// Dump the object as a json object
    fn json_dump(&self) -> Result<String, DriftWatchError> {
        serde_json::to_string(self).map_err(|e| DriftWatchError::UnableToWrite(e.to_string()))
    }

    /// Load the object from a Json string, then check it.
    ///
    /// * `json_str` - String object, which can be serialized to json.
    fn from_json(json_str: &str) -> Result<Self, DriftWatchError> {
        let value = serde_json::from_str::<Self>(json_str).map_err(|e| DriftWatchError::UnableToRead(e.to_string()))?;
        value.check()?;
        Ok(value)
    }

    /// Load the object from a path to a json file.
    ///
    /// * `path` - Path to load the object from.
    fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, DriftWatchError> {
        let path = path.as_ref();
        let json_str =
            fs::read_to_string(path).map_err(|e| DriftWatchError::UnableToRead(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json_str)
    }
}
