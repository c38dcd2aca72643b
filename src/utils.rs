use crate::errors::DriftWatchError;
use std::cmp::Ordering;

/// Create a string of all available items, separated by commas.
pub fn items_to_strings<S: AsRef<str>>(items: &[S]) -> String {
    let mut s = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            s.push_str(", ");
        }
        s.push_str(item.as_ref());
    }
    s
}

// Validation
pub fn validate_float_parameter(value: f64, min: f64, max: f64, parameter: &str) -> Result<(), DriftWatchError> {
    if value.is_nan() || value < min || max < value {
        let ex_msg = format!("real value within range {} and {}", min, max);
        Err(DriftWatchError::InvalidParameter(
            parameter.to_string(),
            ex_msg,
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Drift thresholds are probabilities or bounded divergences,
/// so anything outside (0, 1] is rejected.
pub fn validate_threshold(threshold: f64) -> Result<(), DriftWatchError> {
    validate_float_parameter(threshold, f64::MIN_POSITIVE, 1.0, "threshold")
}

/// Total ordering for finite floats, used for sorting samples.
#[inline]
pub fn float_cmp(a: &f64, b: &f64) -> Ordering {
    a.total_cmp(b)
}

/// Arithmetic mean, NaN for an empty slice.
pub fn mean(v: &[f64]) -> f64 {
    if v.is_empty() {
        return f64::NAN;
    }
    v.iter().sum::<f64>() / v.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
///
/// Fewer than two values carry no spread, so `0.0` is returned.
pub fn sample_std(v: &[f64], mean: f64) -> f64 {
    if v.len() < 2 {
        return 0.0;
    }
    let ss: f64 = v.iter().map(|x| (x - mean).powi(2)).sum();
    (ss / (v.len() - 1) as f64).sqrt()
}

/// Median of an already sorted slice.
pub fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}
