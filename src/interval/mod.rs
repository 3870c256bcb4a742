/////////////////////////////////////////////////////////////////////////////////////////////\
//
// Credible intervals (HDI and ETI) for posterior draws.
//
// Created on: 19 Oct 2026
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Credible intervals
//!
//! Computes the highest-density interval (HDI) and the equal-tailed interval
//! (ETI) of a posterior sample at a given probability mass.
//!
//! Degenerate samples (empty, non-finite, constant, or too short to bound the
//! requested mass) return an `IntervalError` whose
//! [`is_degenerate`](IntervalError::is_degenerate) is true; callers that work
//! over many parameters treat those as missing cells instead of aborting.
//!
//! # Examples
//!
//! ```
//! use posterior_summaries::{CiMethod, credible_interval};
//!
//! let draws: Vec<f64> = (0..=100_i32).map(|i| f64::from(i) / 100.0).collect();
//! let eti = credible_interval(&draws, 0.9, CiMethod::Eti).expect("interval");
//! assert!((eti.lower - 0.05).abs() < 1.0e-12);
//! assert!((eti.upper - 0.95).abs() < 1.0e-12);
//! ```

use thiserror::Error;

use crate::preprocess::sample_diagnostics;
use crate::utils::{f64_to_usize, percentile, sorted_copy, usize_to_f64};

/// Credible interval construction method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CiMethod {
    /// Narrowest interval holding the requested mass.
    Hdi,
    /// Interval leaving equal mass in each tail.
    #[default]
    Eti,
}

/// Interval bounds at a given probability mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CredibleInterval {
    pub level: f64,
    pub lower: f64,
    pub upper: f64,
}

impl CredibleInterval {
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Errors returned by the interval engine.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum IntervalError {
    #[error("confidence level must lie strictly between 0 and 1 (got {level})")]
    InvalidLevel { level: f64 },
    #[error("cannot compute an interval from an empty sample")]
    EmptySample,
    #[error("sample contains {count} non-finite draws")]
    NonFiniteSample { count: usize },
    #[error("sample is constant at {value}")]
    ConstantSample { value: f64 },
    #[error("interval window of {window} draws is too small (sample has {draws} draws)")]
    WindowTooSmall { window: usize, draws: usize },
    #[error("interval window of {window} draws leaves no room to slide over {draws} draws")]
    NoRoomForWindow { window: usize, draws: usize },
}

impl IntervalError {
    /// True for failures caused by the sample rather than the caller.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        !matches!(self, Self::InvalidLevel { .. })
    }
}

/// Check that `level` is a usable probability mass.
///
/// # Errors
///
/// Returns `IntervalError::InvalidLevel` unless `0 < level < 1`.
pub fn validate_level(level: f64) -> Result<(), IntervalError> {
    if level.is_finite() && level > 0.0 && level < 1.0 {
        Ok(())
    } else {
        Err(IntervalError::InvalidLevel { level })
    }
}

/// Credible interval of `sample` holding `level` of its mass.
///
/// # Errors
///
/// Returns `IntervalError::InvalidLevel` for a level outside `(0, 1)` and a
/// degenerate variant when the sample cannot bound the requested mass.
pub fn credible_interval(
    sample: &[f64],
    level: f64,
    method: CiMethod,
) -> Result<CredibleInterval, IntervalError> {
    match method {
        CiMethod::Hdi => hdi(sample, level),
        CiMethod::Eti => eti(sample, level),
    }
}

/// Equal-tailed interval from interpolated quantiles at `(1 - level) / 2`
/// and `(1 + level) / 2`.
///
/// # Errors
///
/// See [`credible_interval`].
pub fn eti(sample: &[f64], level: f64) -> Result<CredibleInterval, IntervalError> {
    let sorted = prepare(sample, level)?;
    let tail = (1.0 - level) / 2.0;
    Ok(CredibleInterval {
        level,
        lower: percentile(&sorted, tail),
        upper: percentile(&sorted, 1.0 - tail),
    })
}

/// Highest-density interval: the narrowest window of `ceil(level * n)` sorted
/// draws. Tied windows that are adjacent resolve to their middle start
/// (rounded down); non-adjacent ties resolve to the last one.
///
/// # Errors
///
/// See [`credible_interval`].
pub fn hdi(sample: &[f64], level: f64) -> Result<CredibleInterval, IntervalError> {
    let sorted = prepare(sample, level)?;
    let draws = sorted.len();
    let window = f64_to_usize((level * usize_to_f64(draws)).ceil());
    if window < 2 {
        return Err(IntervalError::WindowTooSmall { window, draws });
    }
    let candidates = draws.saturating_sub(window);
    if candidates < 1 {
        return Err(IntervalError::NoRoomForWindow { window, draws });
    }

    let mut first_min = 0usize;
    let mut last_min = 0usize;
    let mut best_width = f64::INFINITY;
    let mut tied_apart = false;
    for start in 0..candidates {
        let width = sorted[start + window] - sorted[start];
        if width < best_width {
            best_width = width;
            first_min = start;
            last_min = start;
            tied_apart = false;
        } else if width == best_width {
            tied_apart |= start != last_min + 1;
            last_min = start;
        }
    }
    let best_start = if tied_apart {
        tracing::debug!(
            level,
            draws,
            "several non-adjacent windows share the minimal width; using the last one"
        );
        last_min
    } else {
        (first_min + last_min) / 2
    };

    Ok(CredibleInterval {
        level,
        lower: sorted[best_start],
        upper: sorted[best_start + window],
    })
}

fn prepare(sample: &[f64], level: f64) -> Result<Vec<f64>, IntervalError> {
    validate_level(level)?;
    let diagnostics = sample_diagnostics(sample);
    if diagnostics.n_draws == 0 {
        return Err(IntervalError::EmptySample);
    }
    if diagnostics.n_non_finite > 0 {
        return Err(IntervalError::NonFiniteSample {
            count: diagnostics.n_non_finite,
        });
    }
    if diagnostics.is_constant() {
        return Err(IntervalError::ConstantSample {
            value: diagnostics.min,
        });
    }
    Ok(sorted_copy(sample))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid(n: u32) -> Vec<f64> {
        (0..n).map(|i| f64::from(i) / f64::from(n - 1)).collect()
    }

    #[test]
    fn eti_matches_interpolated_quantiles() {
        let interval = eti(&grid(101), 0.9).expect("eti");
        assert_relative_eq!(interval.lower, 0.05, epsilon = 1.0e-12);
        assert_relative_eq!(interval.upper, 0.95, epsilon = 1.0e-12);
        assert_relative_eq!(interval.level, 0.9);
    }

    #[test]
    fn hdi_finds_the_dense_region() {
        let mut draws = vec![0.0, 0.01, 0.02, 0.03, 0.04, 0.05, 0.06, 0.07, 0.08];
        draws.push(10.0);
        let interval = hdi(&draws, 0.8).expect("hdi");
        assert_relative_eq!(interval.lower, 0.0);
        assert_relative_eq!(interval.upper, 0.08);
    }

    #[test]
    fn hdi_takes_the_middle_of_adjacent_ties() {
        let draws = [0.0, 1.0, 2.0, 3.0, 4.0];
        let interval = hdi(&draws, 0.4).expect("hdi");
        assert_relative_eq!(interval.lower, 1.0);
        assert_relative_eq!(interval.upper, 3.0);

        let two_way = hdi(&[0.0, 1.0, 2.0, 3.0, 10.0], 0.4).expect("hdi");
        assert_relative_eq!(two_way.lower, 0.0);
        assert_relative_eq!(two_way.upper, 2.0);
    }

    #[test]
    fn hdi_takes_the_last_of_separated_ties() {
        let draws = [0.0, 1.0, 2.0, 6.0, 9.0, 10.0, 11.0];
        let interval = hdi(&draws, 0.25).expect("hdi");
        assert_relative_eq!(interval.lower, 9.0);
        assert_relative_eq!(interval.upper, 11.0);
    }

    #[test]
    fn hdi_is_never_wider_than_eti() {
        let draws: Vec<f64> = (1..=200_i32).map(|i| f64::from(i).powi(2) / 1000.0).collect();
        let narrow = hdi(&draws, 0.89).expect("hdi");
        let tails = eti(&draws, 0.89).expect("eti");
        assert!(narrow.width() <= tails.width());
    }

    #[test]
    fn invalid_levels_are_not_degenerate() {
        for level in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            let err = credible_interval(&grid(10), level, CiMethod::Eti)
                .expect_err("invalid level");
            assert!(matches!(err, IntervalError::InvalidLevel { .. }));
            assert!(!err.is_degenerate());
        }
    }

    #[test]
    fn degenerate_samples_are_reported() {
        let empty = eti(&[], 0.9).expect_err("empty");
        assert_eq!(empty, IntervalError::EmptySample);
        assert!(empty.is_degenerate());

        let constant = hdi(&[3.0; 20], 0.9).expect_err("constant");
        assert!(matches!(constant, IntervalError::ConstantSample { .. }));

        let non_finite = eti(&[1.0, f64::NAN, 2.0], 0.5).expect_err("nan");
        assert_eq!(non_finite, IntervalError::NonFiniteSample { count: 1 });
    }

    #[test]
    fn hdi_rejects_windows_that_cannot_slide() {
        let err = hdi(&[1.0, 2.0], 0.95).expect_err("window covers sample");
        assert!(matches!(err, IntervalError::NoRoomForWindow { .. }));

        let err = hdi(&[1.0, 2.0, 3.0], 0.1).expect_err("window too small");
        assert!(matches!(err, IntervalError::WindowTooSmall { .. }));
    }

    #[test]
    fn contains_is_inclusive() {
        let interval = CredibleInterval {
            level: 0.9,
            lower: -1.0,
            upper: 1.0,
        };
        assert!(interval.contains(-1.0));
        assert!(interval.contains(1.0));
        assert!(!interval.contains(1.0 + 1.0e-9));
    }
}
