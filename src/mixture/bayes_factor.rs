//! Mixtures weighted by Bayes factors between candidate models.
//!
//! Posterior model probabilities are `p_i ∝ BF_i * odds_i`, evaluated on the
//! log scale so that large Bayes factors do not overflow.

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::{
    MixtureError, MixtureOptions, MixtureResult, ModelDraws, allocate_rows, mix_allocated,
};
use crate::adapters::{ParameterFilter, PosteriorSource, SourceError};
use crate::input::ParameterTable;

/// Posterior model probabilities from log Bayes factors and prior odds.
///
/// Prior odds default to one for every model. A zero prior odd gives the
/// model probability zero.
///
/// # Errors
///
/// Returns `MixtureError` if there are no models, the lengths disagree, a log
/// Bayes factor is `NaN` or `+inf`, a prior odd is negative or not finite, or
/// every model ends up with zero probability.
pub fn posterior_model_probabilities(
    log_bayes_factors: &[f64],
    prior_odds: Option<&[f64]>,
) -> Result<Vec<f64>, MixtureError> {
    let n_models = log_bayes_factors.len();
    if n_models == 0 {
        return Err(MixtureError::NoModels);
    }
    for (index, &value) in log_bayes_factors.iter().enumerate() {
        if value.is_nan() || (value.is_infinite() && value > 0.0) {
            return Err(MixtureError::NonFiniteWeight {
                index,
                weight: value,
            });
        }
    }

    let log_odds: Vec<f64> = match prior_odds {
        Some(odds) => {
            if odds.len() != n_models {
                return Err(MixtureError::WeightCountMismatch {
                    models: n_models,
                    weights: odds.len(),
                });
            }
            for (index, &weight) in odds.iter().enumerate() {
                if !weight.is_finite() {
                    return Err(MixtureError::NonFiniteWeight { index, weight });
                }
                if weight < 0.0 {
                    return Err(MixtureError::NegativeWeight { index, weight });
                }
            }
            odds.iter().map(|odd| odd.ln()).collect()
        }
        None => vec![0.0; n_models],
    };

    let log_posterior: Vec<f64> = log_bayes_factors
        .iter()
        .zip(&log_odds)
        .map(|(log_bf, log_odd)| log_bf + log_odd)
        .collect();
    let max = log_posterior
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Err(MixtureError::ZeroTotalWeight);
    }

    let unnormalized: Vec<f64> = log_posterior
        .iter()
        .map(|value| (value - max).exp())
        .collect();
    let total: f64 = unnormalized.iter().sum();
    Ok(unnormalized.iter().map(|value| value / total).collect())
}

/// Mixture of model posteriors weighted by posterior model probabilities.
///
/// `names` overrides the models' own names in the weights table. A model
/// with no draws contributes placeholder draws of exactly its allocated size
/// when it offers them; any other drawless model is an error.
///
/// # Errors
///
/// Returns `MixtureError` for invalid Bayes factors, prior odds or options,
/// when extraction fails for a model allocated rows, or when a model has
/// fewer draws than its allocation.
pub fn weighted_posteriors_models(
    models: &[&dyn PosteriorSource],
    names: Option<&[&str]>,
    log_bayes_factors: &[f64],
    prior_odds: Option<&[f64]>,
    filter: &ParameterFilter,
    options: &MixtureOptions,
) -> Result<MixtureResult, MixtureError> {
    options.validate()?;
    if models.is_empty() {
        return Err(MixtureError::NoModels);
    }
    if log_bayes_factors.len() != models.len() {
        return Err(MixtureError::WeightCountMismatch {
            models: models.len(),
            weights: log_bayes_factors.len(),
        });
    }
    let labels: Vec<String> = match names {
        Some(names) if names.len() != models.len() => {
            return Err(MixtureError::NameCountMismatch {
                models: models.len(),
                names: names.len(),
            });
        }
        Some(names) => names.iter().map(ToString::to_string).collect(),
        None => models.iter().map(|model| model.name().to_string()).collect(),
    };

    let probabilities = posterior_model_probabilities(log_bayes_factors, prior_odds)?;
    let counts = allocate_rows(&probabilities, options.target_rows);

    let tables = models
        .iter()
        .zip(&labels)
        .zip(&counts)
        .map(|((model, label), &rows)| model_draws(*model, label, rows, filter))
        .collect::<Result<Vec<_>, _>>()?;
    let inputs: Vec<ModelDraws<'_>> = labels
        .iter()
        .zip(&tables)
        .map(|(label, table)| ModelDraws::new(label, table))
        .collect();

    let seed = options.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut result = mix_allocated(
        &inputs,
        &probabilities,
        &counts,
        options.missing_fill,
        &mut rng,
    )?;
    result.seed = Some(seed);
    Ok(result)
}

fn model_draws(
    model: &dyn PosteriorSource,
    label: &str,
    rows: usize,
    filter: &ParameterFilter,
) -> Result<ParameterTable, MixtureError> {
    if rows == 0 {
        return Ok(ParameterTable::new());
    }
    let fallback = |error: SourceError| {
        model.placeholder_draws(rows).map_or_else(
            || Err(MixtureError::from(error)),
            |placeholder| {
                tracing::debug!(model = label, rows, "using intercept-only placeholder draws");
                Ok(placeholder)
            },
        )
    };
    match model.extract_parameters(filter) {
        Ok(table) if table.n_rows() > 0 => Ok(table),
        Ok(_) => fallback(SourceError::NoDraws {
            model: label.to_string(),
        }),
        Err(error) => fallback(error),
    }
}
