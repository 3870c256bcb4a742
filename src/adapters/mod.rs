//! # Posterior sources
//!
//! Adapters that turn a model representation into a [`ParameterTable`] and
//! answer the questions the ROPE and mixture engines ask of a model: its
//! default range, its response grouping, its collinearity flag, and whether
//! it can stand in placeholder draws when it has none.
//!
//! Two adapters ship with the crate: a bare [`ParameterTable`] and
//! [`DrawsModel`], an in-memory model with tagged parameters.

use std::f64::consts::PI;

use thiserror::Error;

use crate::input::{ParameterGroups, ParameterTable, TableError};
use crate::rope::{RangeSpec, RopeRange};

pub mod draws_model;

pub use draws_model::{DrawsModel, ParameterInfo};

/// Errors returned while extracting parameters from a model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("no parameters of model `{model}` match the filter")]
    NoParameters { model: String },
    #[error("model `{model}` has no posterior draws")]
    NoDraws { model: String },
    #[error("invalid parameter table: {0}")]
    Table(#[from] TableError),
}

/// Which effect kinds to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Effects {
    #[default]
    Fixed,
    Random,
    All,
}

/// Which model component to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Component {
    #[default]
    Conditional,
    ZeroInflated,
    All,
}

/// Effect kind of a single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectKind {
    #[default]
    Fixed,
    Random,
}

/// Component a single parameter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentKind {
    #[default]
    Conditional,
    ZeroInflated,
}

impl Effects {
    #[must_use]
    pub const fn matches(self, kind: EffectKind) -> bool {
        matches!(
            (self, kind),
            (Self::All, _) | (Self::Fixed, EffectKind::Fixed) | (Self::Random, EffectKind::Random)
        )
    }
}

impl Component {
    #[must_use]
    pub const fn matches(self, kind: ComponentKind) -> bool {
        matches!(
            (self, kind),
            (Self::All, _)
                | (Self::Conditional, ComponentKind::Conditional)
                | (Self::ZeroInflated, ComponentKind::ZeroInflated)
        )
    }
}

/// Parameter selection applied during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParameterFilter {
    pub effects: Effects,
    pub component: Component,
    /// Keep only these parameters, in this order.
    pub parameters: Option<Vec<String>>,
}

impl ParameterFilter {
    /// Every parameter of every kind.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            effects: Effects::All,
            component: Component::All,
            parameters: None,
        }
    }

    #[must_use]
    pub fn with_parameters<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.parameters = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

/// Response distribution, used to scale the default ROPE.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResponseFamily {
    /// Continuous response with the given standard deviation.
    Gaussian { response_sd: f64 },
    /// Binary response on the logit scale.
    Bernoulli,
    Other,
}

impl ResponseFamily {
    /// Half-width of the default ROPE: a tenth of the response scale.
    #[must_use]
    pub fn default_half_width(self) -> f64 {
        match self {
            Self::Gaussian { response_sd } if response_sd.is_finite() && response_sd > 0.0 => {
                0.1 * response_sd
            }
            Self::Bernoulli => 0.1 * PI / 3.0f64.sqrt(),
            Self::Gaussian { .. } | Self::Other => 0.1,
        }
    }

    #[must_use]
    pub fn default_range(self) -> Option<RopeRange> {
        RopeRange::symmetric(self.default_half_width()).ok()
    }
}

/// A model whose posterior draws can be summarized.
pub trait PosteriorSource {
    fn name(&self) -> &str;

    /// Draws for the parameters selected by `filter`, aligned by row.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` if no parameter matches or a requested name is
    /// unknown.
    fn extract_parameters(&self, filter: &ParameterFilter) -> Result<ParameterTable, SourceError>;

    /// Range derived from the response scale, if the model knows it.
    fn default_range(&self) -> Option<RangeSpec> {
        None
    }

    /// Parameter-to-response grouping for multivariate models.
    fn parameter_groups(&self) -> Option<ParameterGroups> {
        None
    }

    /// Collinearity verdict computed by the model itself, if any.
    fn collinearity_flag(&self) -> Option<bool> {
        None
    }

    /// Placeholder draws for a model without posterior samples.
    ///
    /// Only intercept-only comparison models provide these; every other
    /// source returns `None`.
    fn placeholder_draws(&self, _rows: usize) -> Option<ParameterTable> {
        None
    }
}

impl PosteriorSource for ParameterTable {
    fn name(&self) -> &str {
        "table"
    }

    fn extract_parameters(&self, filter: &ParameterFilter) -> Result<ParameterTable, SourceError> {
        let table = match &filter.parameters {
            Some(names) => self.select_columns(names.as_slice())?,
            None => self.clone(),
        };
        if table.is_empty() {
            return Err(SourceError::NoParameters {
                model: self.name().to_string(),
            });
        }
        Ok(table)
    }
}
