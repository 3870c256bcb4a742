//! In-memory model with tagged posterior parameters.

use indexmap::IndexMap;

use super::{
    ComponentKind, EffectKind, ParameterFilter, PosteriorSource, ResponseFamily, SourceError,
};
use crate::input::{ParameterGroups, ParameterTable, TableError};
use crate::rope::RangeSpec;

/// Column name used for intercept-only placeholder draws.
pub const INTERCEPT: &str = "(Intercept)";

/// Tags attached to one parameter of a [`DrawsModel`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParameterInfo {
    pub effects: EffectKind,
    pub component: ComponentKind,
    /// Response variable the parameter belongs to (multivariate models).
    pub response: Option<String>,
}

/// Posterior draws plus the metadata the engines query.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawsModel {
    name: String,
    draws: ParameterTable,
    parameters: IndexMap<String, ParameterInfo>,
    responses: IndexMap<String, ResponseFamily>,
    collinear: Option<bool>,
    placeholder_intercept: Option<f64>,
}

impl DrawsModel {
    /// Wrap `draws`; every parameter starts as a fixed, conditional effect.
    #[must_use]
    pub fn new(name: impl Into<String>, draws: ParameterTable) -> Self {
        let parameters = draws
            .names()
            .map(|parameter| (parameter.to_string(), ParameterInfo::default()))
            .collect();
        Self {
            name: name.into(),
            draws,
            parameters,
            responses: IndexMap::new(),
            collinear: None,
            placeholder_intercept: None,
        }
    }

    /// A comparison model with no draws that can stand in a constant
    /// intercept column when a mixture allocates rows to it.
    #[must_use]
    pub fn intercept_only(name: impl Into<String>, intercept: f64) -> Self {
        let draws = ParameterTable::from_column(INTERCEPT, Vec::new());
        Self {
            placeholder_intercept: Some(intercept),
            ..Self::new(name, draws)
        }
    }

    /// Register a response variable and its family.
    #[must_use]
    pub fn with_response(mut self, response: impl Into<String>, family: ResponseFamily) -> Self {
        self.responses.insert(response.into(), family);
        self
    }

    /// Replace the tags of one parameter.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Table` if the parameter is not in the draws.
    pub fn with_parameter_info(
        mut self,
        parameter: &str,
        info: ParameterInfo,
    ) -> Result<Self, SourceError> {
        let slot = self
            .parameters
            .get_mut(parameter)
            .ok_or_else(|| TableError::UnknownParameter {
                name: parameter.to_string(),
            })?;
        *slot = info;
        Ok(self)
    }

    #[must_use]
    pub fn with_collinearity_flag(mut self, collinear: bool) -> Self {
        self.collinear = Some(collinear);
        self
    }

    #[must_use]
    pub const fn draws(&self) -> &ParameterTable {
        &self.draws
    }

    #[must_use]
    pub fn parameter_info(&self, parameter: &str) -> Option<&ParameterInfo> {
        self.parameters.get(parameter)
    }

    #[must_use]
    pub const fn is_intercept_only(&self) -> bool {
        self.placeholder_intercept.is_some()
    }
}

impl PosteriorSource for DrawsModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract_parameters(&self, filter: &ParameterFilter) -> Result<ParameterTable, SourceError> {
        let tagged: Vec<&str> = self
            .parameters
            .iter()
            .filter(|(_, info)| {
                filter.effects.matches(info.effects) && filter.component.matches(info.component)
            })
            .map(|(parameter, _)| parameter.as_str())
            .collect();

        let selected: Vec<&str> = match &filter.parameters {
            Some(names) => {
                if let Some(unknown) = names
                    .iter()
                    .find(|name| !self.draws.contains(name.as_str()))
                {
                    return Err(TableError::UnknownParameter {
                        name: unknown.clone(),
                    }
                    .into());
                }
                names
                    .iter()
                    .map(String::as_str)
                    .filter(|name| tagged.contains(name))
                    .collect()
            }
            None => tagged,
        };

        if selected.is_empty() {
            return Err(SourceError::NoParameters {
                model: self.name.clone(),
            });
        }
        Ok(self.draws.select_columns(selected.as_slice())?)
    }

    fn default_range(&self) -> Option<RangeSpec> {
        match self.responses.len() {
            0 => ResponseFamily::Other.default_range().map(RangeSpec::Single),
            1 => self
                .responses
                .values()
                .next()
                .and_then(|family| family.default_range())
                .map(RangeSpec::Single),
            _ => self
                .responses
                .iter()
                .map(|(response, family)| {
                    family
                        .default_range()
                        .map(|range| (response.clone(), range))
                })
                .collect::<Option<IndexMap<_, _>>>()
                .map(RangeSpec::PerResponse),
        }
    }

    fn parameter_groups(&self) -> Option<ParameterGroups> {
        if self.responses.len() < 2 {
            return None;
        }
        let assignments = self.parameters.iter().filter_map(|(parameter, info)| {
            info.response
                .as_ref()
                .map(|response| (parameter.clone(), response.clone()))
        });
        ParameterGroups::from_assignments(assignments).ok()
    }

    fn collinearity_flag(&self) -> Option<bool> {
        self.collinear
    }

    fn placeholder_draws(&self, rows: usize) -> Option<ParameterTable> {
        let intercept = self.placeholder_intercept?;
        Some(ParameterTable::from_column(INTERCEPT, vec![intercept; rows]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{Component, Effects};
    use approx::assert_relative_eq;

    fn mixed_model() -> DrawsModel {
        let draws = ParameterTable::from_columns(vec![
            ("b_Intercept", vec![0.1, 0.2, 0.3]),
            ("b_x", vec![1.0, 1.1, 0.9]),
            ("sd_group", vec![0.5, 0.6, 0.4]),
            ("zi_Intercept", vec![-1.0, -1.2, -0.8]),
        ])
        .expect("table");
        DrawsModel::new("mixed", draws)
            .with_parameter_info(
                "sd_group",
                ParameterInfo {
                    effects: EffectKind::Random,
                    ..ParameterInfo::default()
                },
            )
            .expect("sd tag")
            .with_parameter_info(
                "zi_Intercept",
                ParameterInfo {
                    component: ComponentKind::ZeroInflated,
                    ..ParameterInfo::default()
                },
            )
            .expect("zi tag")
    }

    #[test]
    fn default_filter_keeps_fixed_conditional_parameters() {
        let table = mixed_model()
            .extract_parameters(&ParameterFilter::default())
            .expect("extract");
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["b_Intercept", "b_x"]);
    }

    #[test]
    fn filters_select_random_and_zero_inflated_parts() {
        let model = mixed_model();
        let random = model
            .extract_parameters(&ParameterFilter {
                effects: Effects::Random,
                ..ParameterFilter::default()
            })
            .expect("random");
        assert_eq!(random.names().collect::<Vec<_>>(), vec!["sd_group"]);

        let zero_inflated = model
            .extract_parameters(&ParameterFilter {
                component: Component::ZeroInflated,
                ..ParameterFilter::default()
            })
            .expect("zi");
        assert_eq!(zero_inflated.names().collect::<Vec<_>>(), vec!["zi_Intercept"]);

        let everything = model.extract_parameters(&ParameterFilter::all()).expect("all");
        assert_eq!(everything.n_cols(), 4);
    }

    #[test]
    fn named_filter_rejects_unknown_parameters() {
        let err = mixed_model()
            .extract_parameters(&ParameterFilter::default().with_parameters(["b_missing"]))
            .expect_err("unknown parameter");
        assert!(matches!(err, SourceError::Table(TableError::UnknownParameter { .. })));
    }

    #[test]
    fn named_filter_that_excludes_everything_fails() {
        let err = mixed_model()
            .extract_parameters(&ParameterFilter::default().with_parameters(["sd_group"]))
            .expect_err("sd_group is a random effect");
        assert!(matches!(err, SourceError::NoParameters { .. }));
    }

    #[test]
    fn default_range_uses_response_scale() {
        let model = mixed_model().with_response("y", ResponseFamily::Gaussian { response_sd: 2.0 });
        let Some(RangeSpec::Single(range)) = model.default_range() else {
            panic!("expected a single range");
        };
        assert_relative_eq!(range.low(), -0.2);
        assert_relative_eq!(range.high(), 0.2);
    }

    #[test]
    fn multivariate_models_expose_groups_and_per_response_ranges() {
        let draws = ParameterTable::from_columns(vec![
            ("b_y1_x", vec![0.0, 0.1]),
            ("b_y2_x", vec![1.0, 1.1]),
        ])
        .expect("table");
        let model = DrawsModel::new("mv", draws)
            .with_response("y1", ResponseFamily::Gaussian { response_sd: 1.0 })
            .with_response("y2", ResponseFamily::Gaussian { response_sd: 10.0 })
            .with_parameter_info(
                "b_y1_x",
                ParameterInfo {
                    response: Some("y1".to_string()),
                    ..ParameterInfo::default()
                },
            )
            .expect("y1")
            .with_parameter_info(
                "b_y2_x",
                ParameterInfo {
                    response: Some("y2".to_string()),
                    ..ParameterInfo::default()
                },
            )
            .expect("y2");

        let groups = model.parameter_groups().expect("groups");
        assert_eq!(groups.group_of("b_y2_x"), Some("y2"));

        let Some(RangeSpec::PerResponse(ranges)) = model.default_range() else {
            panic!("expected per-response ranges");
        };
        assert_relative_eq!(ranges["y1"].high(), 0.1);
        assert_relative_eq!(ranges["y2"].high(), 1.0);
    }

    #[test]
    fn intercept_only_model_provides_placeholder_draws() {
        let model = DrawsModel::intercept_only("null", 0.5);
        assert!(model.is_intercept_only());
        assert_eq!(model.draws().n_rows(), 0);
        let placeholder = model.placeholder_draws(4).expect("placeholder");
        assert_eq!(placeholder.n_rows(), 4);
        assert_eq!(placeholder.column(INTERCEPT), Some(&[0.5; 4][..]));
        assert!(mixed_model().placeholder_draws(4).is_none());
    }
}
