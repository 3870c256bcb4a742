//! Advisory pairwise-correlation check for marginal ROPE summaries.
//!
//! ROPE shares are computed one parameter at a time. When two parameters
//! are strongly correlated in the posterior, their marginal shares can
//! mislead; this check reports such pairs without affecting any share.

use faer::Mat;
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;

use super::RopeError;
use crate::input::ParameterTable;
use crate::preprocess::varying_columns;
use crate::utils::usize_to_f64;

/// Thresholds for the collinearity advisory.
#[derive(Debug, Clone, PartialEq)]
pub struct CollinearityOptions {
    /// Minimum absolute Pearson correlation that triggers a warning.
    pub threshold: f64,
    /// Two-sided p-value a correlation must fall below.
    pub significance: f64,
    /// Parameters left out of the check (intercepts by default).
    pub excluded_parameters: Vec<String>,
}

impl Default for CollinearityOptions {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            significance: 0.05,
            excluded_parameters: vec![
                "(Intercept)".to_string(),
                "Intercept".to_string(),
                "b_Intercept".to_string(),
            ],
        }
    }
}

impl CollinearityOptions {
    /// # Errors
    ///
    /// Returns `RopeError::InvalidCollinearityOptions` if the threshold is not
    /// in `(0, 1]` or the significance level is not in `(0, 1)`.
    pub fn validate(&self) -> Result<(), RopeError> {
        let threshold_ok = self.threshold > 0.0 && self.threshold <= 1.0;
        let significance_ok = self.significance > 0.0 && self.significance < 1.0;
        if threshold_ok && significance_ok {
            Ok(())
        } else {
            Err(RopeError::InvalidCollinearityOptions {
                threshold: self.threshold,
                significance: self.significance,
            })
        }
    }
}

/// A pair of parameters whose draws are strongly correlated.
#[derive(Debug, Clone, PartialEq)]
pub struct CollinearityWarning {
    pub first: String,
    pub second: String,
    pub correlation: f64,
    pub p_value: f64,
}

/// Pearson correlation matrix of the table's columns, in column order.
///
/// Entries involving a zero-variance column are `NaN`.
#[must_use]
pub fn correlation_matrix(table: &ParameterTable) -> Mat<f64> {
    let draws = table.to_matrix();
    let n_rows = draws.nrows();
    let n_cols = draws.ncols();

    let means: Vec<f64> = (0..n_cols)
        .map(|col| (0..n_rows).map(|row| draws[(row, col)]).mean())
        .collect();
    let centered = Mat::from_fn(n_rows, n_cols, |row, col| draws[(row, col)] - means[col]);

    let mut cross = Mat::<f64>::zeros(n_cols, n_cols);
    for i in 0..n_cols {
        for j in i..n_cols {
            let mut sum = 0.0;
            for row in 0..n_rows {
                sum += centered[(row, i)] * centered[(row, j)];
            }
            cross[(i, j)] = sum;
            cross[(j, i)] = sum;
        }
    }

    Mat::from_fn(n_cols, n_cols, |i, j| {
        let denominator = (cross[(i, i)] * cross[(j, j)]).sqrt();
        if denominator > 0.0 {
            (cross[(i, j)] / denominator).clamp(-1.0, 1.0)
        } else {
            f64::NAN
        }
    })
}

/// Two-sided p-value for a Pearson correlation from `n` paired draws.
#[must_use]
pub fn correlation_p_value(correlation: f64, n: usize) -> f64 {
    if n < 3 || !correlation.is_finite() {
        return f64::NAN;
    }
    let df = usize_to_f64(n - 2);
    let residual = correlation.mul_add(-correlation, 1.0);
    if residual <= 0.0 {
        return 0.0;
    }
    let statistic = correlation.abs() * (df / residual).sqrt();
    StudentsT::new(0.0, 1.0, df).map_or(f64::NAN, |dist| 2.0 * (1.0 - dist.cdf(statistic)))
}

/// Report parameter pairs whose correlation exceeds the advisory threshold.
///
/// Every reported pair is also logged at warn level.
#[must_use]
pub fn check_collinearity(
    table: &ParameterTable,
    options: &CollinearityOptions,
) -> Vec<CollinearityWarning> {
    let candidates: Vec<String> = varying_columns(table, 0.0)
        .into_iter()
        .filter(|name| !options.excluded_parameters.contains(name))
        .collect();
    if candidates.len() < 2 || table.n_rows() < 3 {
        return Vec::new();
    }
    let Ok(subset) = table.select_columns(candidates.as_slice()) else {
        return Vec::new();
    };

    let correlations = correlation_matrix(&subset);
    let mut warnings = Vec::new();
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let correlation = correlations[(i, j)];
            if correlation.is_nan() || correlation.abs() < options.threshold {
                continue;
            }
            let p_value = correlation_p_value(correlation, subset.n_rows());
            if p_value.is_nan() || p_value >= options.significance {
                continue;
            }
            tracing::warn!(
                first = %candidates[i],
                second = %candidates[j],
                correlation,
                "possible multicollinearity between {} and {} (r = {:.2}); marginal ROPE shares may be inappropriate",
                candidates[i],
                candidates[j],
                correlation
            );
            warnings.push(CollinearityWarning {
                first: candidates[i].clone(),
                second: candidates[j].clone(),
                correlation,
                p_value,
            });
        }
    }
    warnings
}
