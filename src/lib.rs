#![forbid(unsafe_code)]

//! # `posterior_summaries`
//!
//! Summaries of posterior draws from Bayesian models: the share of a
//! credible interval that falls inside a region of practical equivalence
//! (ROPE), and weighted mixtures of posteriors across candidate models.
//!
//! The crate works on plain tables of draws. Models plug in through the
//! [`PosteriorSource`] trait, which supplies parameter tables, default
//! ranges and response groupings.

pub mod adapters;
pub mod input;
pub mod interval;
pub mod mixture;
pub mod preprocess;
pub mod rope;
pub mod utils;

pub use adapters::{
    Component, ComponentKind, DrawsModel, EffectKind, Effects, ParameterFilter, ParameterInfo,
    PosteriorSource, ResponseFamily, SourceError,
};
pub use input::{ParameterGroups, ParameterTable, TableError};
pub use interval::{CiMethod, CredibleInterval, IntervalError, credible_interval, eti, hdi};
pub use mixture::{
    MixtureError, MixtureOptions, MixtureResult, ModelAllocation, ModelDraws, allocate_rows,
    normalize_weights, posterior_model_probabilities, weighted_mixture, weighted_mixture_with_rng,
    weighted_posteriors_models, weighted_posteriors_tables,
};
pub use preprocess::{SampleDiagnostics, sample_diagnostics, varying_columns};
pub use rope::{
    CollinearityOptions, CollinearityWarning, RangeSpec, RopeError, RopeEstimate, RopeOptions,
    RopeRange, RopeTable, check_collinearity, rope_grouped, rope_overlap, rope_source,
    rope_table, rope_with_spec,
};
