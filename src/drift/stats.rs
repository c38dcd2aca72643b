use crate::constants::{KS_EXACT_MAX_CELLS, KS_SERIES_EPS, KS_SERIES_TERMS};
use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::PI;

/// Result of a two-sample Kolmogorov-Smirnov test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsResult {
    /// Largest distance between the two empirical CDFs.
    pub statistic: f64,
    pub p_value: f64,
}

/// Two-sample Kolmogorov-Smirnov test.
///
/// Both samples must be sorted ascending and free of missing values.
/// Returns `None` if either sample is empty.
///
/// * `a` - The reference sample.
/// * `b` - The current sample.
pub fn ks_2samp(a: &[f64], b: &[f64]) -> Option<KsResult> {
    let (n1, n2) = (a.len(), b.len());
    if n1 == 0 || n2 == 0 {
        return None;
    }
    let (mut i, mut j) = (0, 0);
    let mut d: f64 = 0.0;
    // Step both CDFs past every value tied at x, then compare.
    // Once a sample is exhausted the distance can only shrink.
    while i < n1 && j < n2 {
        let x = if a[i] <= b[j] { a[i] } else { b[j] };
        while i < n1 && a[i] <= x {
            i += 1;
        }
        while j < n2 && b[j] <= x {
            j += 1;
        }
        let diff = (i as f64 / n1 as f64 - j as f64 / n2 as f64).abs();
        d = d.max(diff);
    }

    let p_value = if n1 * n2 <= KS_EXACT_MAX_CELLS {
        ks_exact_sf(n1, n2, d)
    } else {
        ks_asymptotic_sf(n1, n2, d)
    };
    Some(KsResult { statistic: d, p_value })
}

/// Exact two-sided p-value `P(D >= d)` for samples of size `n1` and `n2`.
///
/// Under the null hypothesis every interleaving of the two samples is
/// equally likely, i.e. every monotone lattice path from `(0, 0)` to
/// `(n1, n2)`. The p-value is the share of paths that touch a point where
/// `|i / n1 - j / n2| >= d`. Probabilities are propagated along the grid
/// instead of path counts so nothing overflows.
pub fn ks_exact_sf(n1: usize, n2: usize, d: f64) -> f64 {
    if n1 == 0 || n2 == 0 || d <= 0.0 {
        return 1.0;
    }
    // `d` is `k / (n1 * n2)` for an integer `k`; compare in integers.
    let h = (d * (n1 * n2) as f64).round() as u64;
    let outside = |i: usize, j: usize| ((i * n2) as i64 - (j * n1) as i64).unsigned_abs() >= h;

    let mut prev = vec![0.0; n2 + 1];
    let mut cur = vec![0.0; n2 + 1];
    for i in 0..=n1 {
        for j in 0..=n2 {
            cur[j] = if outside(i, j) {
                0.0
            } else if i == 0 && j == 0 {
                1.0
            } else {
                let mut p = 0.0;
                if i > 0 {
                    // Step along the first sample from (i - 1, j).
                    let (ri, rj) = (n1 - i + 1, n2 - j);
                    p += prev[j] * ri as f64 / (ri + rj) as f64;
                }
                if j > 0 {
                    let (ri, rj) = (n1 - i, n2 - j + 1);
                    p += cur[j - 1] * rj as f64 / (ri + rj) as f64;
                }
                p
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    (1.0 - prev[n2]).clamp(0.0, 1.0)
}

/// Asymptotic two-sided p-value, Kolmogorov distribution with Stephens'
/// effective sample size correction.
pub fn ks_asymptotic_sf(n1: usize, n2: usize, d: f64) -> f64 {
    let en = ((n1 * n2) as f64 / (n1 + n2) as f64).sqrt();
    let lambda = (en + 0.12 + 0.11 / en) * d;
    kolmogorov_q(lambda)
}

/// Survival function of the Kolmogorov distribution, `P(K > lambda)`.
pub fn kolmogorov_q(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    let p = if lambda < 1.18 {
        // The alternating series converges slowly for small lambda,
        // use the Jacobi theta form of the CDF instead.
        let y = (-PI * PI / (8.0 * lambda * lambda)).exp();
        let mut s = 0.0;
        for k in 0..KS_SERIES_TERMS {
            let term = y.powi(((2 * k + 1) * (2 * k + 1)) as i32);
            s += term;
            if term < KS_SERIES_EPS {
                break;
            }
        }
        1.0 - (2.0 * PI).sqrt() / lambda * s
    } else {
        let mut s = 0.0;
        for k in 1..=KS_SERIES_TERMS {
            let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
            let term = (-2.0 * (k * k) as f64 * lambda * lambda).exp();
            s += sign * term;
            if term < KS_SERIES_EPS {
                break;
            }
        }
        2.0 * s
    };
    p.clamp(0.0, 1.0)
}

/// Jensen-Shannon divergence between two discrete distributions, base 2.
///
/// Categories absent on one side have probability zero and `0 * log(0 / x)`
/// is taken as zero. The result is symmetric and bounded in `[0, 1]`.
///
/// * `p` - Reference probabilities by category.
/// * `q` - Current probabilities by category.
pub fn jensen_shannon_divergence(p: &BTreeMap<String, f64>, q: &BTreeMap<String, f64>) -> f64 {
    let categories: BTreeSet<&String> = p.keys().chain(q.keys()).collect();
    let mut kl_pm = 0.0;
    let mut kl_qm = 0.0;
    for c in categories {
        let pi = p.get(c).copied().unwrap_or(0.0);
        let qi = q.get(c).copied().unwrap_or(0.0);
        let mi = 0.5 * (pi + qi);
        if pi > 0.0 {
            kl_pm += pi * (pi / mi).log2();
        }
        if qi > 0.0 {
            kl_qm += qi * (qi / mi).log2();
        }
    }
    (0.5 * kl_pm + 0.5 * kl_qm).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(items: &[(&str, f64)]) -> BTreeMap<String, f64> {
        items.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_ks_identical() {
        let a = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        let r = ks_2samp(&a, &a).unwrap();
        assert_eq!(r.statistic, 0.0);
        assert_eq!(r.p_value, 1.0);
    }

    #[test]
    fn test_ks_disjoint() {
        let a = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        let b = vec![0.6, 0.7, 0.8, 0.9, 1.0];
        let r = ks_2samp(&a, &b).unwrap();
        assert_eq!(r.statistic, 1.0);
        // Only the two fully separated interleavings reach D = 1.
        assert!((r.p_value - 2.0 / 252.0).abs() < 1e-12);
    }

    #[test]
    fn test_ks_exact_small_sample() {
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let b = vec![4.5, 6.0, 7.0, 8.0, 9.0];
        let r = ks_2samp(&a, &b).unwrap();
        assert!((r.statistic - 0.8).abs() < 1e-12);
        // 2 * C(10, 1) / C(10, 5) paths reach |i - j| = 4.
        assert!((r.p_value - 20.0 / 252.0).abs() < 1e-12);
        assert!(r.p_value > 0.05);
    }

    #[test]
    fn test_ks_exact_unequal_sizes() {
        // All of b above all of a: only the two extreme paths reach D = 1.
        let a: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let b = vec![100.0, 101.0, 102.0, 103.0, 104.0];
        let r = ks_2samp(&a, &b).unwrap();
        assert_eq!(r.statistic, 1.0);
        assert!((r.p_value - 2.0 / 53130.0).abs() < 1e-12);
        assert_eq!(ks_exact_sf(20, 5, 0.0), 1.0);
    }

    #[test]
    fn test_ks_exact_close_to_asymptotic() {
        // D only takes multiples of 1/500 here, so agreement is within a lattice step.
        for d in [0.06, 0.08, 0.1, 0.12] {
            let exact = ks_exact_sf(500, 500, d);
            let asymptotic = ks_asymptotic_sf(500, 500, d);
            assert!((exact - asymptotic).abs() < 0.02, "d={} {} {}", d, exact, asymptotic);
        }
    }

    #[test]
    fn test_ks_large_samples_use_asymptotic() {
        let a: Vec<f64> = (0..2000).map(|i| i as f64 / 2000.0).collect();
        let b: Vec<f64> = (0..1000).map(|i| i as f64 / 1000.0 + 0.05).collect();
        let r = ks_2samp(&a, &b).unwrap();
        assert_eq!(r.p_value, ks_asymptotic_sf(2000, 1000, r.statistic));
    }

    #[test]
    fn test_ks_statistic_with_ties() {
        // CDFs: a reaches 2/4 at 1.0 while b is still at 0/2.
        let a = vec![1.0, 1.0, 2.0, 3.0];
        let b = vec![2.0, 3.0];
        let r = ks_2samp(&a, &b).unwrap();
        assert_eq!(r.statistic, 0.5);
        assert!(r.p_value > 0.05);
    }

    #[test]
    fn test_ks_symmetric() {
        let a = vec![0.0, 0.4, 0.9, 1.3, 2.2, 2.5];
        let b = vec![0.3, 1.1, 1.2, 3.0];
        let (ab, ba) = (ks_2samp(&a, &b).unwrap(), ks_2samp(&b, &a).unwrap());
        assert_eq!(ab.statistic, ba.statistic);
        assert!((ab.p_value - ba.p_value).abs() < 1e-12);
    }

    #[test]
    fn test_ks_empty() {
        assert!(ks_2samp(&[], &[1.0]).is_none());
    }

    #[test]
    fn test_kolmogorov_q() {
        assert_eq!(kolmogorov_q(0.0), 1.0);
        // Known values of the Kolmogorov survival function.
        assert!((kolmogorov_q(1.0) - 0.2699996).abs() < 1e-6);
        assert!((kolmogorov_q(1.36) - 0.0494).abs() < 1e-3);
        assert!((kolmogorov_q(0.5) - 0.9639452).abs() < 1e-6);
        // Both branches agree near the switch point.
        assert!((kolmogorov_q(1.1799999) - kolmogorov_q(1.18)).abs() < 1e-6);
        let mut prev = 1.0;
        for i in 1..40 {
            let q = kolmogorov_q(i as f64 * 0.1);
            assert!(q <= prev);
            prev = q;
        }
    }

    #[test]
    fn test_js_identical() {
        let p = dist(&[("a", 0.5), ("b", 0.5)]);
        assert_eq!(jensen_shannon_divergence(&p, &p), 0.0);
    }

    #[test]
    fn test_js_shift() {
        let p = dist(&[("a", 0.5), ("b", 0.5)]);
        let q = dist(&[("a", 0.0), ("b", 1.0)]);
        let js = jensen_shannon_divergence(&p, &q);
        // 0.5 * KL(p || m) + 0.5 * KL(q || m) with m = {a: 0.25, b: 0.75}
        let expected = 0.5 * (0.5 * 2f64.log2() + 0.5 * (0.5f64 / 0.75).log2()) + 0.5 * (1.0f64 / 0.75).log2();
        assert!((js - expected).abs() < 1e-12);
        assert!(js > 0.05);
        // Missing categories are the same as explicit zeros.
        let q_sparse = dist(&[("b", 1.0)]);
        assert_eq!(jensen_shannon_divergence(&p, &q_sparse), js);
    }

    #[test]
    fn test_js_bounds_and_symmetry() {
        let p = dist(&[("a", 1.0)]);
        let q = dist(&[("b", 1.0)]);
        assert!((jensen_shannon_divergence(&p, &q) - 1.0).abs() < 1e-12);
        let r = dist(&[("a", 0.2), ("b", 0.3), ("c", 0.5)]);
        let s = dist(&[("a", 0.6), ("c", 0.4)]);
        assert_eq!(jensen_shannon_divergence(&r, &s), jensen_shannon_divergence(&s, &r));
    }
}
