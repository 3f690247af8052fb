//! Discrete power-law fitting and the Kolmogorov-Smirnov statistic.
//!
//! For every candidate `x_min`, estimate the exponent by discrete
//! maximum likelihood (continuous approximation with the half-step
//! shift), normalize the tail distribution with the Hurwitz zeta
//! function, and keep the `x_min` whose tail minimizes the KS distance
//! between the empirical and fitted CDFs.

#[derive(Clone, Copy, Debug)]
pub struct FitResult {
    pub alpha: f64,
    pub xmin: f64,
    /// The Kolmogorov-Smirnov statistic of the best fit.
    pub d: f64,
}

/// Minimum tail size for a candidate `x_min` to be considered.
const MIN_TAIL: usize = 4;

/// Exponents above this produce degenerate, numerically useless tails.
const MAX_ALPHA: f64 = 20.0;

/// Fits a discrete power law to the sample values, scanning `x_min` over
/// the observed values. Returns `None` when no candidate tail is large
/// and diverse enough to fit.
pub fn fit_discrete_power_law(data: &[f64]) -> Option<FitResult> {
    let mut samples: Vec<f64> = data.iter().copied().filter(|&x| x >= 1.0).collect();
    samples.sort_by(|a, b| a.partial_cmp(b).expect("power-law samples must not be NaN"));
    if samples.len() < MIN_TAIL {
        return None;
    }

    let mut candidates = samples.clone();
    candidates.dedup();

    let mut best: Option<FitResult> = None;
    for &xmin in &candidates {
        let tail_begin = samples.iter().position(|&x| x >= xmin).expect("xmin is a sample");
        let tail = &samples[tail_begin..];
        if tail.len() < MIN_TAIL || tail.last() == tail.first() {
            continue;
        }

        let n = tail.len() as f64;
        let log_sum: f64 = tail.iter().map(|&x| (x / (xmin - 0.5)).ln()).sum();
        if log_sum <= 0.0 {
            continue;
        }
        let alpha = 1.0 + n / log_sum;
        if alpha > MAX_ALPHA {
            continue;
        }

        let d = ks_statistic(tail, alpha, xmin);
        if best.map_or(true, |b| d < b.d) {
            best = Some(FitResult { alpha, xmin, d });
        }
    }
    best
}

/// Supremum distance between the tail's empirical CDF and the fitted
/// discrete power-law CDF `1 - zeta(alpha, x + 1) / zeta(alpha, xmin)`.
fn ks_statistic(sorted_tail: &[f64], alpha: f64, xmin: f64) -> f64 {
    let normalization = hurwitz_zeta(alpha, xmin);
    let n = sorted_tail.len() as f64;

    let mut d = 0.0_f64;
    let mut seen = 0_usize;
    let mut index = 0;
    while index < sorted_tail.len() {
        let value = sorted_tail[index];
        while index < sorted_tail.len() && sorted_tail[index] == value {
            seen += 1;
            index += 1;
        }
        let empirical = seen as f64 / n;
        let fitted = 1.0 - hurwitz_zeta(alpha, value + 1.0) / normalization;
        d = d.max((empirical - fitted).abs());
    }
    d
}

/// Hurwitz zeta `sum_{k >= 0} (a + k)^-s` for `s > 1`, by direct
/// summation with an Euler-Maclaurin tail correction.
pub fn hurwitz_zeta(s: f64, a: f64) -> f64 {
    assert!(s > 1.0, "Hurwitz zeta diverges for s <= 1");
    assert!(a > 0.0, "Hurwitz zeta requires a positive offset");
    const DIRECT_TERMS: usize = 64;

    let mut sum = 0.0;
    for k in 0..DIRECT_TERMS {
        sum += (a + k as f64).powf(-s);
    }
    let edge = a + DIRECT_TERMS as f64;
    sum += edge.powf(1.0 - s) / (s - 1.0);
    sum += 0.5 * edge.powf(-s);
    sum += s * edge.powf(-s - 1.0) / 12.0;
    sum -= s * (s + 1.0) * (s + 2.0) * edge.powf(-s - 3.0) / 720.0;
    sum
}
