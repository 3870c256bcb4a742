/////////////////////////////////////////////////////////////////////////////////////////////\
//
// Region of practical equivalence (ROPE) shares for posterior draws.
//
// Created on: 19 Oct 2026
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # ROPE overlap
//!
//! Computes, for each requested confidence level, the share of the draws
//! inside the credible interval that also fall inside a region of practical
//! equivalence around the null value.
//!
//! The restricted sample is a literal filter of the draws lying inside the
//! interval bounds, not a resample. When the interval cannot be computed for
//! a parameter the share is reported as missing (`None`) for that cell only.
//!
//! Parameters are summarized one at a time; see [`collinearity`] for the
//! advisory check that flags strongly correlated pairs.
//!
//! # Examples
//!
//! ```
//! use posterior_summaries::{RopeOptions, RopeRange, rope_overlap};
//!
//! let draws: Vec<f64> = (0..200_i32).map(|i| f64::from(i) / 1000.0 - 0.1).collect();
//! let range = RopeRange::new(0.1, -0.1).expect("range");
//! let estimates = rope_overlap(&draws, range, &RopeOptions::default()).expect("rope");
//!
//! assert_eq!(estimates.len(), 1);
//! assert_eq!(estimates[0].percentage, Some(1.0));
//! ```

use indexmap::IndexMap;
use thiserror::Error;

use crate::adapters::{ParameterFilter, PosteriorSource, SourceError};
use crate::input::{ParameterGroups, ParameterTable, TableError};
use crate::interval::{CiMethod, CredibleInterval, IntervalError, credible_interval};
use crate::utils::usize_to_f64;

pub mod collinearity;

pub use collinearity::{
    CollinearityOptions, CollinearityWarning, check_collinearity, correlation_matrix,
    correlation_p_value,
};

/// Errors returned by ROPE computations.
///
/// All variants are caller errors; degenerate samples never surface here.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RopeError {
    #[error("confidence level must lie strictly between 0 and 1 (got {level})")]
    InvalidLevel { level: f64 },
    #[error("at least one confidence level is required")]
    NoLevels,
    #[error("range bounds must not be NaN (got [{low}, {high}])")]
    InvalidRange { low: f64, high: f64 },
    #[error("range must have exactly 2 bounds (got {len})")]
    RangeLength { len: usize },
    #[error("no range supplied for response `{group}`")]
    MissingGroupRange { group: String },
    #[error("per-response ranges require a parameter grouping")]
    MissingGroups,
    #[error("model `{model}` cannot derive a default range")]
    MissingDefaultRange { model: String },
    #[error(
        "collinearity threshold must be in (0, 1] and significance in (0, 1) (got {threshold}, {significance})"
    )]
    InvalidCollinearityOptions { threshold: f64, significance: f64 },
    #[error("invalid parameter table: {0}")]
    Table(#[from] TableError),
    #[error("parameter extraction failed: {0}")]
    Source(#[from] SourceError),
}

/// Region of practical equivalence, stored with `low <= high`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RopeRange {
    low: f64,
    high: f64,
}

impl RopeRange {
    /// Build a range from two bounds given in either order. Infinite bounds
    /// give one-sided or unbounded ranges.
    ///
    /// # Errors
    ///
    /// Returns `RopeError::InvalidRange` if a bound is `NaN`.
    pub fn new(first: f64, second: f64) -> Result<Self, RopeError> {
        if first.is_nan() || second.is_nan() {
            return Err(RopeError::InvalidRange {
                low: first,
                high: second,
            });
        }
        Ok(Self {
            low: first.min(second),
            high: first.max(second),
        })
    }

    /// Build a range from a two-element slice.
    ///
    /// # Errors
    ///
    /// Returns `RopeError::RangeLength` unless the slice has two elements, or
    /// `RopeError::InvalidRange` for `NaN` bounds.
    pub fn from_slice(bounds: &[f64]) -> Result<Self, RopeError> {
        match bounds {
            [first, second] => Self::new(*first, *second),
            _ => Err(RopeError::RangeLength { len: bounds.len() }),
        }
    }

    /// `[-half_width, half_width]`.
    ///
    /// # Errors
    ///
    /// Returns `RopeError::InvalidRange` if `half_width` is `NaN`.
    pub fn symmetric(half_width: f64) -> Result<Self, RopeError> {
        Self::new(-half_width, half_width)
    }

    #[must_use]
    pub const fn low(&self) -> f64 {
        self.low
    }

    #[must_use]
    pub const fn high(&self) -> f64 {
        self.high
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// One range for every parameter, or one range per response.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeSpec {
    Single(RopeRange),
    PerResponse(IndexMap<String, RopeRange>),
}

/// Settings for ROPE computations.
#[derive(Debug, Clone, PartialEq)]
pub struct RopeOptions {
    /// Confidence levels in `(0, 1)`, reported in this order.
    pub levels: Vec<f64>,
    /// Credible interval method.
    pub method: CiMethod,
    /// Run the advisory collinearity check on table inputs.
    pub check_collinearity: bool,
    pub collinearity: CollinearityOptions,
}

impl Default for RopeOptions {
    fn default() -> Self {
        Self {
            levels: vec![0.95],
            method: CiMethod::Eti,
            check_collinearity: false,
            collinearity: CollinearityOptions::default(),
        }
    }
}

impl RopeOptions {
    /// Options for the given levels with defaults elsewhere.
    #[must_use]
    pub fn with_levels(levels: &[f64]) -> Self {
        Self {
            levels: levels.to_vec(),
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns `RopeError` if no level is given, a level is outside `(0, 1)`,
    /// or the collinearity thresholds are invalid.
    pub fn validate(&self) -> Result<(), RopeError> {
        if self.levels.is_empty() {
            return Err(RopeError::NoLevels);
        }
        if let Some(&level) = self
            .levels
            .iter()
            .find(|&&level| !(level.is_finite() && level > 0.0 && level < 1.0))
        {
            return Err(RopeError::InvalidLevel { level });
        }
        if self.check_collinearity {
            self.collinearity.validate()?;
        }
        Ok(())
    }
}

/// ROPE share for one (parameter, level) cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RopeEstimate {
    /// Parameter name, absent for bare samples.
    pub parameter: Option<String>,
    /// Response group, present for per-response ranges.
    pub group: Option<String>,
    pub level: f64,
    pub range: RopeRange,
    /// Share of the interval-restricted draws inside the range, `None` if the
    /// interval could not be computed.
    pub percentage: Option<f64>,
    /// Interval bounds the share was computed over.
    pub interval: Option<CredibleInterval>,
}

impl RopeEstimate {
    /// Confidence level as a percentage (`0.89` reports as `89`).
    #[must_use]
    pub fn ci_percent(&self) -> f64 {
        self.level * 100.0
    }

    #[must_use]
    pub const fn is_missing(&self) -> bool {
        self.percentage.is_none()
    }
}

/// ROPE shares for a parameter table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RopeTable {
    /// One row per (parameter, level), parameters in table order.
    pub rows: Vec<RopeEstimate>,
    /// Strongly correlated parameter pairs, when the check ran.
    pub advisories: Vec<CollinearityWarning>,
    /// Set when the source model or the advisory check reports collinearity.
    pub collinearity_flagged: bool,
}

impl RopeTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn for_parameter<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RopeEstimate> {
        self.rows
            .iter()
            .filter(move |row| row.parameter.as_deref() == Some(name))
    }

    /// Interval bounds used at `level`, keyed by parameter.
    #[must_use]
    pub fn interval_bounds(&self, level: f64) -> Vec<(Option<&str>, Option<CredibleInterval>)> {
        self.rows
            .iter()
            .filter(|row| (row.level - level).abs() < f64::EPSILON)
            .map(|row| (row.parameter.as_deref(), row.interval))
            .collect()
    }
}

/// ROPE shares of a single sample, one estimate per requested level.
///
/// # Errors
///
/// Returns `RopeError` if the options are invalid. A sample whose interval
/// cannot be computed yields estimates with `percentage: None`.
pub fn rope_overlap(
    sample: &[f64],
    range: RopeRange,
    options: &RopeOptions,
) -> Result<Vec<RopeEstimate>, RopeError> {
    options.validate()?;
    options
        .levels
        .iter()
        .map(|&level| {
            let (percentage, interval) = estimate_cell(sample, range, level, options.method)?;
            Ok(RopeEstimate {
                parameter: None,
                group: None,
                level,
                range,
                percentage,
                interval,
            })
        })
        .collect()
}

/// ROPE shares of every column of `table` against one range.
///
/// # Errors
///
/// Returns `RopeError` if the options are invalid.
pub fn rope_table(
    table: &ParameterTable,
    range: RopeRange,
    options: &RopeOptions,
) -> Result<RopeTable, RopeError> {
    options.validate()?;
    let rows = table_rows(table, range, None, options)?;
    Ok(with_advisories(rows, table, options))
}

/// ROPE shares where each response group uses its own range.
///
/// Results are merged in group order.
///
/// # Errors
///
/// Returns `RopeError` if the options are invalid, a table column has no
/// group, or a group has no range.
pub fn rope_grouped(
    table: &ParameterTable,
    groups: &ParameterGroups,
    ranges: &IndexMap<String, RopeRange>,
    options: &RopeOptions,
) -> Result<RopeTable, RopeError> {
    options.validate()?;
    let parts = groups.split(table)?;
    if let Some((group, _)) = parts.iter().find(|(group, _)| !ranges.contains_key(group)) {
        return Err(RopeError::MissingGroupRange {
            group: group.clone(),
        });
    }

    let mut rows = Vec::with_capacity(table.n_cols() * options.levels.len());
    for (group, part) in &parts {
        let range = ranges[group];
        rows.extend(table_rows(part, range, Some(group), options)?);
    }
    Ok(with_advisories(rows, table, options))
}

/// Dispatch on a [`RangeSpec`].
///
/// # Errors
///
/// Returns `RopeError::MissingGroups` for per-response ranges without a
/// grouping, plus the errors of [`rope_table`] and [`rope_grouped`].
pub fn rope_with_spec(
    table: &ParameterTable,
    range: &RangeSpec,
    groups: Option<&ParameterGroups>,
    options: &RopeOptions,
) -> Result<RopeTable, RopeError> {
    match range {
        RangeSpec::Single(range) => rope_table(table, *range, options),
        RangeSpec::PerResponse(ranges) => {
            let groups = groups.ok_or(RopeError::MissingGroups)?;
            rope_grouped(table, groups, ranges, options)
        }
    }
}

/// ROPE shares for the parameters a model exposes.
///
/// With `range: None` the model's default range is used. The model's own
/// collinearity flag takes precedence over the table-based check.
///
/// # Errors
///
/// Returns `RopeError` if extraction fails, no default range is available,
/// or the range does not fit the model's grouping.
pub fn rope_source(
    source: &dyn PosteriorSource,
    range: Option<&RangeSpec>,
    filter: &ParameterFilter,
    options: &RopeOptions,
) -> Result<RopeTable, RopeError> {
    options.validate()?;
    let table = source.extract_parameters(filter)?;
    let default_range;
    let range = match range {
        Some(range) => range,
        None => {
            default_range = source
                .default_range()
                .ok_or_else(|| RopeError::MissingDefaultRange {
                    model: source.name().to_string(),
                })?;
            &default_range
        }
    };

    let table_options = RopeOptions {
        check_collinearity: false,
        ..options.clone()
    };
    let groups = source.parameter_groups();
    let mut result = rope_with_spec(&table, range, groups.as_ref(), &table_options)?;

    if options.check_collinearity {
        match source.collinearity_flag() {
            Some(flagged) => {
                if flagged {
                    tracing::warn!(
                        model = source.name(),
                        "model reports collinear parameters; marginal ROPE shares may be inappropriate"
                    );
                }
                result.collinearity_flagged = flagged;
            }
            None => {
                result.advisories = check_collinearity(&table, &options.collinearity);
                result.collinearity_flagged = !result.advisories.is_empty();
            }
        }
    }
    Ok(result)
}

fn table_rows(
    table: &ParameterTable,
    range: RopeRange,
    group: Option<&str>,
    options: &RopeOptions,
) -> Result<Vec<RopeEstimate>, RopeError> {
    let mut rows = Vec::with_capacity(table.n_cols() * options.levels.len());
    for (name, draws) in table.iter() {
        for &level in &options.levels {
            let (percentage, interval) = estimate_cell(draws, range, level, options.method)?;
            if percentage.is_none() {
                tracing::debug!(parameter = name, level, "ROPE share unavailable");
            }
            rows.push(RopeEstimate {
                parameter: Some(name.to_string()),
                group: group.map(str::to_string),
                level,
                range,
                percentage,
                interval,
            });
        }
    }
    Ok(rows)
}

fn with_advisories(
    rows: Vec<RopeEstimate>,
    table: &ParameterTable,
    options: &RopeOptions,
) -> RopeTable {
    let advisories = if options.check_collinearity {
        check_collinearity(table, &options.collinearity)
    } else {
        Vec::new()
    };
    RopeTable {
        rows,
        collinearity_flagged: !advisories.is_empty(),
        advisories,
    }
}

type Cell = (Option<f64>, Option<CredibleInterval>);

fn estimate_cell(
    draws: &[f64],
    range: RopeRange,
    level: f64,
    method: CiMethod,
) -> Result<Cell, RopeError> {
    let interval = match credible_interval(draws, level, method) {
        Ok(interval) => interval,
        Err(IntervalError::InvalidLevel { level }) => {
            return Err(RopeError::InvalidLevel { level });
        }
        Err(err) => {
            tracing::debug!(%err, level, "credible interval unavailable");
            return Ok((None, None));
        }
    };

    let mut in_interval = 0usize;
    let mut in_rope = 0usize;
    for &value in draws {
        if interval.contains(value) {
            in_interval += 1;
            if range.contains(value) {
                in_rope += 1;
            }
        }
    }

    if in_interval == 0 {
        return Ok((None, Some(interval)));
    }
    Ok((
        Some(usize_to_f64(in_rope) / usize_to_f64(in_interval)),
        Some(interval),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn idx_to_f64(idx: usize) -> f64 {
        f64::from(u32::try_from(idx).unwrap_or(u32::MAX))
    }

    fn spread(center: f64, n: usize, width: f64) -> Vec<f64> {
        (0..n)
            .map(|i| center + width * (idx_to_f64(i) / idx_to_f64(n - 1) - 0.5))
            .collect()
    }

    #[test]
    fn range_normalizes_bound_order() {
        let range = RopeRange::new(0.3, -0.2).expect("range");
        assert_relative_eq!(range.low(), -0.2);
        assert_relative_eq!(range.high(), 0.3);
    }

    #[test]
    fn range_rejects_wrong_length_and_nan_bounds() {
        assert_eq!(
            RopeRange::from_slice(&[0.1]).expect_err("short"),
            RopeError::RangeLength { len: 1 }
        );
        assert!(matches!(
            RopeRange::new(f64::NAN, 0.1).expect_err("nan"),
            RopeError::InvalidRange { .. }
        ));
    }

    #[test]
    fn infinite_bounds_give_one_sided_ranges() {
        let upper = RopeRange::new(f64::INFINITY, 0.0).expect("one-sided");
        assert_relative_eq!(upper.low(), 0.0);
        assert!(upper.high().is_infinite());
        assert!(upper.contains(1.0e300));
        assert!(!upper.contains(-1.0e-9));

        let draws = spread(0.5, 101, 2.0);
        let estimates = rope_overlap(&draws, upper, &RopeOptions::with_levels(&[0.5]))
            .expect("rope");
        assert_eq!(estimates[0].percentage, Some(1.0));

        let everything = RopeRange::new(f64::NEG_INFINITY, f64::INFINITY).expect("unbounded");
        let estimates = rope_overlap(&spread(-3.0, 101, 1.0), everything, &RopeOptions::default())
            .expect("rope");
        assert_eq!(estimates[0].percentage, Some(1.0));
    }

    #[test]
    fn covering_range_gives_full_share() {
        let draws = spread(0.0, 101, 0.1);
        let range = RopeRange::symmetric(1.0).expect("range");
        let estimates = rope_overlap(&draws, range, &RopeOptions::default()).expect("rope");
        assert_eq!(estimates[0].percentage, Some(1.0));
    }

    #[test]
    fn disjoint_range_gives_zero_share() {
        let draws = spread(5.0, 101, 0.1);
        let range = RopeRange::symmetric(0.1).expect("range");
        let estimates = rope_overlap(&draws, range, &RopeOptions::default()).expect("rope");
        assert_eq!(estimates[0].percentage, Some(0.0));
    }

    #[test]
    fn share_counts_only_draws_inside_the_interval() {
        let draws: Vec<f64> = (0..=100_i32).map(|i| f64::from(i) / 100.0).collect();
        let range = RopeRange::new(0.0, 0.5).expect("range");
        let options = RopeOptions::with_levels(&[0.5]);
        let estimates = rope_overlap(&draws, range, &options).expect("rope");
        let interval = estimates[0].interval.expect("bounds");
        assert_relative_eq!(interval.lower, 0.25, epsilon = 1.0e-12);
        assert_relative_eq!(interval.upper, 0.75, epsilon = 1.0e-12);
        let share = estimates[0].percentage.expect("share");
        assert_relative_eq!(share, 26.0 / 51.0, epsilon = 1.0e-12);
    }

    #[test]
    fn levels_keep_requested_order() {
        let draws = spread(0.0, 200, 1.0);
        let range = RopeRange::symmetric(0.1).expect("range");
        let options = RopeOptions::with_levels(&[0.95, 0.5, 0.89]);
        let estimates = rope_overlap(&draws, range, &options).expect("rope");
        let percents: Vec<f64> = estimates.iter().map(RopeEstimate::ci_percent).collect();
        assert_relative_eq!(percents[0], 95.0, epsilon = 1.0e-9);
        assert_relative_eq!(percents[1], 50.0, epsilon = 1.0e-9);
        assert_relative_eq!(percents[2], 89.0, epsilon = 1.0e-9);
    }

    #[test]
    fn invalid_levels_fail_fast() {
        let draws = spread(0.0, 50, 1.0);
        let range = RopeRange::symmetric(0.1).expect("range");
        for levels in [vec![0.9, 1.0], vec![0.0], vec![-0.5]] {
            let err = rope_overlap(&draws, range, &RopeOptions::with_levels(&levels))
                .expect_err("invalid level");
            assert!(matches!(err, RopeError::InvalidLevel { .. }));
        }
        let err = rope_overlap(&draws, range, &RopeOptions::with_levels(&[]))
            .expect_err("no levels");
        assert_eq!(err, RopeError::NoLevels);
    }

    #[test]
    fn degenerate_sample_reports_missing_share() {
        let range = RopeRange::symmetric(0.1).expect("range");
        let estimates = rope_overlap(&[0.0; 10], range, &RopeOptions::default()).expect("rope");
        assert!(estimates[0].is_missing());
        assert!(estimates[0].interval.is_none());
    }

    #[test]
    fn degenerate_column_does_not_halt_siblings() {
        let table = ParameterTable::from_columns(vec![
            ("flat", vec![1.0; 40]),
            ("b_x", spread(0.0, 40, 0.1)),
        ])
        .expect("table");
        let range = RopeRange::symmetric(0.5).expect("range");
        let result = rope_table(&table, range, &RopeOptions::with_levels(&[0.9, 0.5]))
            .expect("rope table");
        assert_eq!(result.len(), 4);
        assert!(result.for_parameter("flat").all(RopeEstimate::is_missing));
        assert!(
            result
                .for_parameter("b_x")
                .all(|row| row.percentage == Some(1.0))
        );
    }

    #[test]
    fn grouped_ranges_apply_only_to_their_group() {
        let table = ParameterTable::from_columns(vec![
            ("b_y1_x", spread(0.0, 60, 0.1)),
            ("b_y2_x", spread(10.0, 60, 0.1)),
        ])
        .expect("table");
        let groups =
            ParameterGroups::from_assignments(vec![("b_y1_x", "y1"), ("b_y2_x", "y2")])
                .expect("groups");
        let mut ranges = IndexMap::new();
        ranges.insert("y2".to_string(), RopeRange::new(9.0, 11.0).expect("range"));
        ranges.insert("y1".to_string(), RopeRange::symmetric(0.5).expect("range"));

        let result =
            rope_grouped(&table, &groups, &ranges, &RopeOptions::default()).expect("grouped");
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0].group.as_deref(), Some("y1"));
        assert_eq!(result.rows[0].percentage, Some(1.0));
        assert_eq!(result.rows[1].group.as_deref(), Some("y2"));
        assert_eq!(result.rows[1].percentage, Some(1.0));
        assert_relative_eq!(result.rows[1].range.low(), 9.0);
    }

    #[test]
    fn grouped_ranges_require_every_group() {
        let table =
            ParameterTable::from_columns(vec![("b_y1_x", spread(0.0, 20, 0.1))]).expect("table");
        let groups = ParameterGroups::from_assignments(vec![("b_y1_x", "y1")]).expect("groups");
        let ranges = IndexMap::new();
        let err = rope_grouped(&table, &groups, &ranges, &RopeOptions::default())
            .expect_err("missing range");
        assert_eq!(
            err,
            RopeError::MissingGroupRange {
                group: "y1".to_string()
            }
        );
    }

    #[test]
    fn per_response_spec_requires_groups() {
        let table =
            ParameterTable::from_columns(vec![("b_x", spread(0.0, 20, 0.1))]).expect("table");
        let spec = RangeSpec::PerResponse(IndexMap::new());
        let err = rope_with_spec(&table, &spec, None, &RopeOptions::default())
            .expect_err("groups required");
        assert_eq!(err, RopeError::MissingGroups);
    }

    #[test]
    fn interval_bounds_are_keyed_by_level() {
        let table = ParameterTable::from_columns(vec![
            ("a", spread(0.0, 50, 1.0)),
            ("b", spread(1.0, 50, 1.0)),
        ])
        .expect("table");
        let range = RopeRange::symmetric(0.1).expect("range");
        let result =
            rope_table(&table, range, &RopeOptions::with_levels(&[0.9, 0.5])).expect("table");
        let bounds = result.interval_bounds(0.5);
        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds[0].0, Some("a"));
        assert!(bounds.iter().all(|(_, interval)| interval.is_some()));
    }
}
