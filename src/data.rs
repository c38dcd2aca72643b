//! Data
//!
//! Scalar values, live records and the columnar reference dataset.
use crate::errors::DriftWatchError;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// A single feature value, as it arrives in a request or a reference file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Explicit null, or a value that was left empty.
    Null,
    /// A numeric value.
    Number(f64),
    /// A text value, which may still coerce to a number.
    Text(String),
}

static NULL: Value = Value::Null;

impl Value {
    /// Whether the value should be treated as missing.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Number(v) => v.is_nan(),
            Value::Text(_) => false,
        }
    }

    /// Coerce the value to a finite number, if possible.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) if v.is_finite() => Some(*v),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    /// Category label of the value. Missing values have no label.
    ///
    /// Anything that coerces to a number is labelled by the number's
    /// display, so text `"1.0"` and the number `1.0` share the label `"1"`.
    pub fn label(&self) -> Option<String> {
        if self.is_null() {
            return None;
        }
        match self.as_f64() {
            Some(v) => Some(v.to_string()),
            None => Some(self.to_string()),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Number(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// One inference request: feature name to value.
pub type Record = HashMap<String, Value>;

/// Columns observed anywhere in the batch, in name order.
pub fn observed_columns(batch: &[Record]) -> BTreeSet<&str> {
    batch.iter().flat_map(|r| r.keys().map(|k| k.as_str())).collect()
}

/// Values of a column across the batch.
///
/// Returns `None` when no record carries the column. Records that lack
/// the column while others carry it contribute a null.
pub fn column_values<'a>(batch: &'a [Record], name: &str) -> Option<Vec<&'a Value>> {
    if !batch.iter().any(|r| r.contains_key(name)) {
        return None;
    }
    Some(batch.iter().map(|r| r.get(name).unwrap_or(&NULL)).collect())
}

/// Columnar table holding the reference dataset.
///
/// Every column has exactly `rows` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Column names, in file order.
    pub columns: Vec<String>,
    /// Values for each column.
    pub values: Vec<Vec<Value>>,
    /// Number of rows in the table.
    pub rows: usize,
}

impl Dataset {
    /// Load a dataset from a CSV file with a header row.
    ///
    /// * `path` - Path of the CSV file.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, DriftWatchError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DriftWatchError::UnableToRead(format!("{}: {}", path.display(), e)))?;
        Self::from_csv_reader(BufReader::new(file))
    }

    /// Load a dataset from any CSV reader. Empty cells are missing values,
    /// every other cell is kept as text until the profile introspects it.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DriftWatchError> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|e| DriftWatchError::MalformedDataset(e.to_string()))?
            .clone();
        let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
        if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
            return Err(DriftWatchError::MalformedDataset("no columns found".to_string()));
        }
        let unique: BTreeSet<&String> = columns.iter().collect();
        if unique.len() != columns.len() {
            return Err(DriftWatchError::MalformedDataset("duplicate column names".to_string()));
        }

        let mut values: Vec<Vec<Value>> = vec![Vec::new(); columns.len()];
        let mut rows = 0;
        for result in csv_reader.records() {
            let record = result.map_err(|e| DriftWatchError::MalformedDataset(e.to_string()))?;
            for (i, cell) in record.iter().enumerate() {
                let cell = cell.trim();
                let v = if cell.is_empty() {
                    Value::Null
                } else {
                    Value::Text(cell.to_string())
                };
                values[i].push(v);
            }
            rows += 1;
        }
        if rows == 0 {
            return Err(DriftWatchError::MalformedDataset("no rows found".to_string()));
        }
        Ok(Dataset { columns, values, rows })
    }

    /// Build a dataset from in-memory records. Columns are the union of
    /// all keys in name order; a record missing a key contributes a null.
    pub fn from_records(records: &[Record]) -> Result<Self, DriftWatchError> {
        if records.is_empty() {
            return Err(DriftWatchError::MalformedDataset("no rows found".to_string()));
        }
        let columns: Vec<String> = observed_columns(records).into_iter().map(String::from).collect();
        if columns.is_empty() {
            return Err(DriftWatchError::MalformedDataset("no columns found".to_string()));
        }
        let values = columns
            .iter()
            .map(|c| records.iter().map(|r| r.get(c).cloned().unwrap_or(Value::Null)).collect())
            .collect();
        Ok(Dataset {
            columns,
            values,
            rows: records.len(),
        })
    }

    /// Get an entire column by name.
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[i].as_slice())
    }
}
