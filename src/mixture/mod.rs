/////////////////////////////////////////////////////////////////////////////////////////////\
//
// Weighted posterior mixtures across candidate models.
//
// Created on: 19 Oct 2026
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Weighted posteriors
//!
//! Combines posterior draws from several candidate models into one mixture
//! sample. Each model contributes `round(target_rows * p_i)` rows, drawn
//! without replacement, where `p_i` is its normalized weight.
//!
//! Notes:
//! - Rounding is half-to-even and never rebalanced, so the mixture can hold
//!   slightly more or fewer than `target_rows` rows.
//! - Models allocated zero rows are left out of the mixture but stay in the
//!   weights table.
//! - A parameter missing from a contributing model is filled with
//!   `missing_fill` for that model's rows.
//!
//! # Examples
//!
//! ```
//! use posterior_summaries::{MixtureOptions, ModelDraws, ParameterTable, weighted_mixture};
//!
//! let full = ParameterTable::from_columns(vec![
//!     ("a", vec![1.0; 100]),
//!     ("b", vec![2.0; 100]),
//! ])
//! .expect("table");
//! let reduced = ParameterTable::from_columns(vec![("a", vec![-1.0; 100])]).expect("table");
//!
//! let options = MixtureOptions {
//!     target_rows: 100,
//!     seed: Some(7),
//!     ..MixtureOptions::default()
//! };
//! let mixture = weighted_mixture(
//!     &[ModelDraws::new("full", &full), ModelDraws::new("reduced", &reduced)],
//!     &[0.75, 0.25],
//!     &options,
//! )
//! .expect("mixture");
//!
//! assert_eq!(mixture.draws.n_rows(), 100);
//! assert_eq!(mixture.weights[0].draws, 75);
//! assert_eq!(mixture.weights[1].draws, 25);
//! ```

use indexmap::IndexMap;
use rand::Rng;
use rand::prelude::*;
use rand::rngs::StdRng;
use thiserror::Error;

use crate::adapters::SourceError;
use crate::input::{ParameterTable, TableError};
use crate::utils::{f64_to_usize, usize_to_f64};

pub mod bayes_factor;

pub use bayes_factor::{posterior_model_probabilities, weighted_posteriors_models};

/// Errors returned by mixture construction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MixtureError {
    #[error("at least one model is required")]
    NoModels,
    #[error("got {weights} weights for {models} models")]
    WeightCountMismatch { models: usize, weights: usize },
    #[error("got {names} names for {models} models")]
    NameCountMismatch { models: usize, names: usize },
    #[error("weight {index} is negative ({weight})")]
    NegativeWeight { index: usize, weight: f64 },
    #[error("weight {index} is not finite ({weight})")]
    NonFiniteWeight { index: usize, weight: f64 },
    #[error("weights sum to zero")]
    ZeroTotalWeight,
    #[error("target row count must be positive")]
    InvalidTargetRows,
    #[error("missing-parameter fill value must be finite (got {value})")]
    NonFiniteMissingFill { value: f64 },
    #[error("model `{model}` has {available} draws but {requested} were requested")]
    InsufficientSamples {
        model: String,
        requested: usize,
        available: usize,
    },
    #[error("invalid parameter table: {0}")]
    Table(#[from] TableError),
    #[error("parameter extraction failed: {0}")]
    Source(#[from] SourceError),
}

/// Settings for mixture construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixtureOptions {
    /// Number of mixture rows before rounding drift.
    pub target_rows: usize,
    /// Value used for parameters a model does not have.
    pub missing_fill: f64,
    /// RNG seed; drawn from the thread RNG when `None`.
    pub seed: Option<u64>,
}

impl Default for MixtureOptions {
    fn default() -> Self {
        Self {
            target_rows: 4_000,
            missing_fill: 0.0,
            seed: None,
        }
    }
}

impl MixtureOptions {
    /// # Errors
    ///
    /// Returns `MixtureError` if `target_rows` is zero or `missing_fill` is not
    /// finite.
    pub const fn validate(self) -> Result<(), MixtureError> {
        if self.target_rows == 0 {
            return Err(MixtureError::InvalidTargetRows);
        }
        if !self.missing_fill.is_finite() {
            return Err(MixtureError::NonFiniteMissingFill {
                value: self.missing_fill,
            });
        }
        Ok(())
    }
}

/// Posterior draws of one candidate model.
#[derive(Debug, Clone, Copy)]
pub struct ModelDraws<'a> {
    pub name: &'a str,
    pub draws: &'a ParameterTable,
}

impl<'a> ModelDraws<'a> {
    #[must_use]
    pub const fn new(name: &'a str, draws: &'a ParameterTable) -> Self {
        Self { name, draws }
    }
}

/// Weight and realized row count of one input model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAllocation {
    pub model: String,
    /// Normalized weight.
    pub weight: f64,
    /// Rows contributed to the mixture.
    pub draws: usize,
}

/// Mixture draws plus the weights used to build them.
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureResult {
    pub draws: ParameterTable,
    /// One entry per input model, zero-count models included.
    pub weights: Vec<ModelAllocation>,
    /// Seed the rows were drawn with, when the engine created the RNG.
    pub seed: Option<u64>,
}

impl MixtureResult {
    #[must_use]
    pub fn allocation(&self, model: &str) -> Option<&ModelAllocation> {
        self.weights.iter().find(|allocation| allocation.model == model)
    }
}

/// Normalize non-negative weights to sum to one.
///
/// # Errors
///
/// Returns `MixtureError` if the list is empty, a weight is negative or not
/// finite, or the weights sum to zero.
pub fn normalize_weights(weights: &[f64]) -> Result<Vec<f64>, MixtureError> {
    if weights.is_empty() {
        return Err(MixtureError::NoModels);
    }
    for (index, &weight) in weights.iter().enumerate() {
        if !weight.is_finite() {
            return Err(MixtureError::NonFiniteWeight { index, weight });
        }
        if weight < 0.0 {
            return Err(MixtureError::NegativeWeight { index, weight });
        }
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(MixtureError::ZeroTotalWeight);
    }
    Ok(weights.iter().map(|weight| weight / total).collect())
}

/// Rows per model: `round(target_rows * p_i)`, ties to even, no rebalancing.
#[must_use]
pub fn allocate_rows(probabilities: &[f64], target_rows: usize) -> Vec<usize> {
    let target = usize_to_f64(target_rows);
    probabilities
        .iter()
        .map(|probability| f64_to_usize((target * probability).round_ties_even()))
        .collect()
}

/// Build a mixture with an RNG seeded from `options.seed`.
///
/// # Errors
///
/// Returns `MixtureError` for invalid weights or options, or
/// `MixtureError::InsufficientSamples` when a model has fewer draws than its
/// allocation.
pub fn weighted_mixture(
    models: &[ModelDraws<'_>],
    weights: &[f64],
    options: &MixtureOptions,
) -> Result<MixtureResult, MixtureError> {
    let seed = options.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut result = weighted_mixture_with_rng(models, weights, options, &mut rng)?;
    result.seed = Some(seed);
    Ok(result)
}

/// Build a mixture drawing rows from a caller-supplied RNG of any kind.
///
/// `options.seed` is ignored.
///
/// # Errors
///
/// See [`weighted_mixture`].
pub fn weighted_mixture_with_rng<R: Rng + ?Sized>(
    models: &[ModelDraws<'_>],
    weights: &[f64],
    options: &MixtureOptions,
    rng: &mut R,
) -> Result<MixtureResult, MixtureError> {
    options.validate()?;
    if models.is_empty() {
        return Err(MixtureError::NoModels);
    }
    if weights.len() != models.len() {
        return Err(MixtureError::WeightCountMismatch {
            models: models.len(),
            weights: weights.len(),
        });
    }
    let probabilities = normalize_weights(weights)?;
    let counts = allocate_rows(&probabilities, options.target_rows);
    mix_allocated(models, &probabilities, &counts, options.missing_fill, rng)
}

/// Mixture of data-only models weighted by prior odds (uniform when `None`).
///
/// # Errors
///
/// See [`weighted_mixture`].
pub fn weighted_posteriors_tables(
    models: &[ModelDraws<'_>],
    prior_odds: Option<&[f64]>,
    options: &MixtureOptions,
) -> Result<MixtureResult, MixtureError> {
    let uniform;
    let odds = match prior_odds {
        Some(odds) => odds,
        None => {
            uniform = vec![1.0; models.len()];
            uniform.as_slice()
        }
    };
    weighted_mixture(models, odds, options)
}

pub(crate) fn mix_allocated<R: Rng + ?Sized>(
    models: &[ModelDraws<'_>],
    probabilities: &[f64],
    counts: &[usize],
    missing_fill: f64,
    rng: &mut R,
) -> Result<MixtureResult, MixtureError> {
    let weights: Vec<ModelAllocation> = models
        .iter()
        .zip(probabilities)
        .zip(counts)
        .map(|((model, &weight), &draws)| ModelAllocation {
            model: model.name.to_string(),
            weight,
            draws,
        })
        .collect();

    let contributing: Vec<(&ModelDraws<'_>, usize)> = models
        .iter()
        .zip(counts.iter().copied())
        .filter(|(_, count)| *count > 0)
        .collect();

    for (model, count) in &contributing {
        let available = model.draws.n_rows();
        if *count > available {
            return Err(MixtureError::InsufficientSamples {
                model: model.name.to_string(),
                requested: *count,
                available,
            });
        }
    }
    if contributing.is_empty() {
        tracing::warn!("every model was allocated zero rows; the mixture is empty");
    }

    let mut columns: IndexMap<String, Vec<f64>> = IndexMap::new();
    for (model, _) in &contributing {
        for name in model.draws.names() {
            columns.entry(name.to_string()).or_default();
        }
    }
    let total_rows: usize = contributing.iter().map(|(_, count)| count).sum();
    for column in columns.values_mut() {
        column.reserve(total_rows);
    }

    for (model, count) in &contributing {
        let mut rows: Vec<usize> = (0..model.draws.n_rows()).collect();
        rows.shuffle(rng);
        rows.truncate(*count);
        let block = model.draws.select_rows(&rows)?;

        for (name, column) in &mut columns {
            match block.column(name) {
                Some(values) => column.extend_from_slice(values),
                None => column.extend(std::iter::repeat_n(missing_fill, *count)),
            }
        }
        tracing::debug!(model = model.name, rows = *count, "sampled mixture block");
    }

    Ok(MixtureResult {
        draws: ParameterTable::from_columns(columns)?,
        weights,
        seed: None,
    })
}
