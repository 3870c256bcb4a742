use crate::input::ParameterTable;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleDiagnostics {
    pub n_draws: usize,
    pub n_finite: usize,
    pub n_non_finite: usize,
    pub min: f64,
    pub max: f64,
}

impl SampleDiagnostics {
    /// True when there is at least one draw and every draw is finite.
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        self.n_draws > 0 && self.n_non_finite == 0
    }

    /// True when all finite draws share one value.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.n_finite > 0 && self.max <= self.min
    }
}

#[must_use]
pub fn sample_diagnostics(sample: &[f64]) -> SampleDiagnostics {
    let n_draws = sample.len();
    let mut n_finite = 0usize;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for &value in sample {
        if !value.is_finite() {
            continue;
        }
        n_finite += 1;
        min = min.min(value);
        max = max.max(value);
    }

    if n_finite == 0 {
        min = f64::NAN;
        max = f64::NAN;
    }

    SampleDiagnostics {
        n_draws,
        n_finite,
        n_non_finite: n_draws.saturating_sub(n_finite),
        min,
        max,
    }
}

#[must_use]
pub fn column_has_variation(values: &[f64], tolerance: f64) -> bool {
    if values.len() < 2 {
        return false;
    }
    let diagnostics = sample_diagnostics(values);
    diagnostics.n_finite >= 2 && (diagnostics.max - diagnostics.min).abs() > tolerance.abs()
}

/// Names of columns whose draws vary by more than `tolerance`.
#[must_use]
pub fn varying_columns(table: &ParameterTable, tolerance: f64) -> Vec<String> {
    table
        .iter()
        .filter(|(_, values)| column_has_variation(values, tolerance))
        .map(|(name, _)| name.to_string())
        .collect()
}
