//! Rate statistics, histograms and the event-size Poisson fit.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Duration of one read-out clock tick (one tree entry) in seconds.
pub const CLOCK_PERIOD_S: f64 = 2.5e-8;

/// Converts a count over `entries` clock ticks into a rate in Hz.
///
/// A store without entries has rate 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rate_hz(count: u64, entries: u64) -> f64 {
    if entries == 0 {
        return 0.0;
    }
    count as f64 / (CLOCK_PERIOD_S * entries as f64)
}

/// Formats a rate in Hz as MHz with the given number of decimals, width 5.
#[must_use]
pub fn format_mhz(rate_hz: f64, decimals: usize) -> String {
    format!("{:5.decimals$} MHz", rate_hz / 1e6)
}

/// Buffer errors as a percentage of valid hits; 0 when there are no valid hits.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn buffer_proportion(buffer_errors: f64, valid_hits: u64) -> f64 {
    if valid_hits == 0 {
        return 0.0;
    }
    buffer_errors / valid_hits as f64 * 100.0
}

/// `bad / (good + bad)` in per mille; 0 when both are zero.
#[must_use]
pub fn per_mille(bad: f64, good: f64) -> f64 {
    let total = good + bad;
    if total == 0.0 {
        0.0
    } else {
        bad / total * 1000.0
    }
}

/// Fixed-width 1D histogram over `[lo, hi)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram1D {
    lo: f64,
    hi: f64,
    counts: Vec<f64>,
}

impl Histogram1D {
    /// Creates an empty histogram with `n_bins` bins over `[lo, hi)`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] for zero bins or an empty range.
    pub fn new(n_bins: usize, lo: f64, hi: f64) -> Result<Self> {
        if n_bins == 0 || hi <= lo {
            return Err(Error::InvalidBinning(format!(
                "{n_bins} bins over [{lo}, {hi})"
            )));
        }
        Ok(Self {
            lo,
            hi,
            counts: vec![0.0; n_bins],
        })
    }

    /// Number of bins.
    #[must_use]
    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    /// Width of one bin.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bin_width(&self) -> f64 {
        (self.hi - self.lo) / self.counts.len() as f64
    }

    /// Lower edge of bin `i`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bin_low_edge(&self, i: usize) -> f64 {
        self.lo + i as f64 * self.bin_width()
    }

    /// Bin index of `x`, `None` for under- or overflow.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        if !(self.lo..self.hi).contains(&x) {
            return None;
        }
        let bin = ((x - self.lo) / self.bin_width()) as usize;
        Some(bin.min(self.counts.len() - 1))
    }

    /// Adds `weight` at `x`. Returns false if `x` is outside the range.
    pub fn fill(&mut self, x: f64, weight: f64) -> bool {
        match self.find_bin(x) {
            Some(bin) => {
                self.counts[bin] += weight;
                true
            }
            None => false,
        }
    }

    /// Bin contents.
    #[must_use]
    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    /// Sum of all bin contents.
    #[must_use]
    pub fn entries(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Weighted mean of the lower bin edges; 0 for an empty histogram.
    #[must_use]
    pub fn mean(&self) -> f64 {
        let total = self.entries();
        if total == 0.0 {
            return 0.0;
        }
        self.counts
            .iter()
            .enumerate()
            .map(|(i, c)| self.bin_low_edge(i) * c)
            .sum::<f64>()
            / total
    }

    /// First bin with content above `threshold`.
    #[must_use]
    pub fn first_bin_above(&self, threshold: f64) -> Option<usize> {
        self.counts.iter().position(|&c| c > threshold)
    }

    /// Last bin with content above `threshold`.
    #[must_use]
    pub fn last_bin_above(&self, threshold: f64) -> Option<usize> {
        self.counts.iter().rposition(|&c| c > threshold)
    }

    /// Display range around the filled bins, padded by `margin` bins.
    #[must_use]
    pub fn filled_range(&self, margin: usize) -> Option<(usize, usize)> {
        let first = self.first_bin_above(0.0)?;
        let last = self.last_bin_above(0.0)?;
        Some((
            first.saturating_sub(margin),
            (last + margin).min(self.counts.len() - 1),
        ))
    }
}

/// Mean of `y` per bin of `x` over `[lo, hi)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile1D {
    lo: f64,
    hi: f64,
    sums: Vec<f64>,
    entries: Vec<u64>,
}

impl Profile1D {
    /// Creates an empty profile with `n_bins` bins over `[lo, hi)`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] for zero bins or an empty range.
    pub fn new(n_bins: usize, lo: f64, hi: f64) -> Result<Self> {
        if n_bins == 0 || hi <= lo {
            return Err(Error::InvalidBinning(format!(
                "{n_bins} bins over [{lo}, {hi})"
            )));
        }
        Ok(Self {
            lo,
            hi,
            sums: vec![0.0; n_bins],
            entries: vec![0; n_bins],
        })
    }

    /// Adds a `(x, y)` pair. Returns false if `x` is outside the range.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn fill(&mut self, x: f64, y: f64) -> bool {
        if !(self.lo..self.hi).contains(&x) {
            return false;
        }
        let n = self.sums.len();
        let bin = (((x - self.lo) / (self.hi - self.lo)) * n as f64) as usize;
        let bin = bin.min(n - 1);
        self.sums[bin] += y;
        self.entries[bin] += 1;
        true
    }

    /// Number of bins.
    #[must_use]
    pub fn n_bins(&self) -> usize {
        self.sums.len()
    }

    /// Entries per bin.
    #[must_use]
    pub fn entries(&self) -> &[u64] {
        &self.entries
    }

    /// Mean per bin; empty bins are 0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn means(&self) -> Vec<f64> {
        self.sums
            .iter()
            .zip(&self.entries)
            .map(|(&s, &n)| if n == 0 { 0.0 } else { s / n as f64 })
            .collect()
    }
}

/// Start values for the Poisson fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoissonSeed {
    pub constant: f64,
    pub lambda: f64,
}

impl Default for PoissonSeed {
    fn default() -> Self {
        Self {
            constant: 1e7,
            lambda: 5.0,
        }
    }
}

/// Result of fitting `C * Poisson(k; lambda)` to a histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoissonFit {
    pub constant: f64,
    pub lambda: f64,
    pub chi2: f64,
    /// Number of filled bins minus the two parameters.
    pub ndf: usize,
}

impl PoissonFit {
    /// Model value at `k`.
    #[must_use]
    pub fn eval(&self, k: f64) -> f64 {
        self.constant * poisson_pmf(k, self.lambda)
    }
}

/// Poisson probability for a (non-negative) count `k`, ln-space evaluated.
#[must_use]
pub fn poisson_pmf(k: f64, lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return if k == 0.0 { 1.0 } else { 0.0 };
    }
    (k * lambda.ln() - lambda - ln_factorial(k)).exp()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn ln_factorial(k: f64) -> f64 {
    let n = k.max(0.0).round() as u64;
    (2..=n).map(|i| (i as f64).ln()).sum()
}

const GOLDEN: f64 = 0.618_033_988_749_894_9;
const SCAN_STEPS: usize = 400;

/// Least-squares fit of `C * Poisson(k; lambda)` with bin errors `sqrt(n)`.
///
/// Bins are evaluated at their lower edge, which is the hit count for the
/// unit-width event-size histogram. Empty bins do not contribute. For a
/// fixed `lambda` the best `C` has a closed form, so only `lambda` is
/// searched: a coarse scan over `(0, max(2 * seed, upper edge)]` followed
/// by a golden-section refinement around the best scan point.
///
/// # Errors
/// Returns [`Error::EmptyHistogram`] if no bin has content.
#[allow(clippy::cast_precision_loss)]
pub fn fit_poisson(hist: &Histogram1D, seed: PoissonSeed) -> Result<PoissonFit> {
    let points: Vec<(f64, f64)> = hist
        .counts()
        .iter()
        .enumerate()
        .filter(|(_, &c)| c > 0.0)
        .map(|(i, &c)| (hist.bin_low_edge(i), c))
        .collect();
    if points.is_empty() {
        return Err(Error::EmptyHistogram);
    }

    let upper = points.last().map_or(seed.lambda, |p| p.0 + 1.0);
    let lambda_max = (2.0 * seed.lambda).max(upper);
    let step = lambda_max / SCAN_STEPS as f64;

    let mut best = (step, chi2_at(&points, step).0);
    for i in 2..=SCAN_STEPS {
        let lambda = step * i as f64;
        let chi2 = chi2_at(&points, lambda).0;
        if chi2 < best.1 {
            best = (lambda, chi2);
        }
    }

    let (mut a, mut b) = ((best.0 - step).max(f64::EPSILON), best.0 + step);
    let mut c = b - GOLDEN * (b - a);
    let mut d = a + GOLDEN * (b - a);
    for _ in 0..100 {
        if chi2_at(&points, c).0 < chi2_at(&points, d).0 {
            b = d;
        } else {
            a = c;
        }
        c = b - GOLDEN * (b - a);
        d = a + GOLDEN * (b - a);
        if (b - a).abs() < 1e-10 {
            break;
        }
    }
    let lambda = 0.5 * (a + b);
    let (chi2, constant) = chi2_at(&points, lambda);
    Ok(PoissonFit {
        constant,
        lambda,
        chi2,
        ndf: points.len().saturating_sub(2),
    })
}

/// Chi-square and optimal constant for a fixed `lambda`.
fn chi2_at(points: &[(f64, f64)], lambda: f64) -> (f64, f64) {
    let (mut sp, mut sp2) = (0.0, 0.0);
    for &(k, y) in points {
        let p = poisson_pmf(k, lambda);
        sp += p;
        sp2 += p * p / y;
    }
    let constant = if sp2 > 0.0 { sp / sp2 } else { 0.0 };
    let chi2 = points
        .iter()
        .map(|&(k, y)| {
            let r = y - constant * poisson_pmf(k, lambda);
            r * r / y
        })
        .sum();
    (chi2, constant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rate_and_format() {
        let rate = rate_hz(900_000, 1_000_000);
        // 900000 / (2.5e-8 * 1e6)
        assert_relative_eq!(rate, 3.6e7, max_relative = 1e-12);
        assert_eq!(format_mhz(rate, 1), " 36.0 MHz");
        assert_eq!(format_mhz(3.6e10, 1), "36000.0 MHz");
        assert_eq!(format_mhz(2.5e6, 1), "  2.5 MHz");
        assert_eq!(format_mhz(2.5e6, 4), "2.5000 MHz");
        assert_relative_eq!(rate_hz(10, 0), 0.0);
    }

    #[test]
    fn test_buffer_proportion() {
        assert_relative_eq!(
            buffer_proportion(500.0, 900_000),
            0.055_555_555_555_555_6,
            max_relative = 1e-12
        );
        assert_relative_eq!(buffer_proportion(0.0, 0), 0.0);
    }

    #[test]
    fn test_per_mille() {
        assert_relative_eq!(per_mille(1.0, 999.0), 1.0);
        assert_relative_eq!(per_mille(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_histogram_binning() {
        let mut h = Histogram1D::new(100, 0.0, 100.0).unwrap();
        assert!(h.fill(3.0, 1.0));
        assert!(h.fill(3.0, 1.0));
        assert!(h.fill(7.0, 1.0));
        assert!(!h.fill(100.0, 1.0));
        assert!(!h.fill(-1.0, 1.0));
        assert_relative_eq!(h.counts()[3], 2.0);
        assert_eq!(h.first_bin_above(0.0), Some(3));
        assert_eq!(h.last_bin_above(0.0), Some(7));
        assert_eq!(h.filled_range(3), Some((0, 10)));
        assert_relative_eq!(h.mean(), 13.0 / 3.0);
        assert!(Histogram1D::new(0, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_profile_means() {
        let mut p = Profile1D::new(2, 0.0, 10.0).unwrap();
        p.fill(1.0, 2.0);
        p.fill(2.0, 4.0);
        p.fill(9.0, 1.0);
        assert!(!p.fill(10.0, 1.0));
        assert_eq!(p.means(), vec![3.0, 1.0]);
        assert_eq!(p.entries(), &[2, 1]);
    }

    #[test]
    fn test_poisson_fit_recovers_lambda() {
        let mut h = Histogram1D::new(100, 0.0, 100.0).unwrap();
        for k in 0..40u32 {
            let expected = 1e6 * poisson_pmf(f64::from(k), 6.5);
            h.fill(f64::from(k), expected.round());
        }
        let fit = fit_poisson(&h, PoissonSeed::default()).unwrap();
        assert_relative_eq!(fit.lambda, 6.5, epsilon = 1e-3);
        assert_relative_eq!(fit.constant, 1e6, max_relative = 1e-3);
        assert_relative_eq!(fit.eval(6.0), 1e6 * poisson_pmf(6.0, 6.5), max_relative = 1e-2);
    }

    #[test]
    fn test_poisson_fit_empty_histogram() {
        let h = Histogram1D::new(10, 0.0, 10.0).unwrap();
        assert!(matches!(
            fit_poisson(&h, PoissonSeed::default()),
            Err(Error::EmptyHistogram)
        ));
    }
}
