pub const DEFAULT_DRIFT_THRESHOLD: f64 = 0.05;
pub const HISTOGRAM_BINS: usize = 10;
pub const KS_TEST_NAME: &str = "ks";
pub const JS_TEST_NAME: &str = "jensen_shannon";
pub const VALIDATION_ERROR: &str = "validation_error";
pub const OBSERVE_OPERATION: &str = "observe";
// Terms of the Kolmogorov series smaller than this are dropped.
pub const KS_SERIES_EPS: f64 = 1e-12;
pub const KS_SERIES_TERMS: usize = 100;
// Up to this many lattice cells (`n1 * n2`) the KS p-value is exact.
pub const KS_EXACT_MAX_CELLS: usize = 1_000_000;
