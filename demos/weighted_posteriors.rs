use posterior_summaries::{
    DrawsModel, MixtureOptions, ParameterFilter, ParameterTable, PosteriorSource,
    weighted_posteriors_models,
};

fn main() {
    let n = 4_000;
    let full = DrawsModel::new(
        "full",
        ParameterTable::from_columns(vec![
            ("b_Intercept", ramp(n, 0.8, 1.2)),
            ("b_x", ramp(n, 0.2, 0.6)),
        ])
        .expect("table"),
    );
    let reduced = DrawsModel::new(
        "reduced",
        ParameterTable::from_columns(vec![("b_Intercept", ramp(n, 0.9, 1.1))]).expect("table"),
    );
    let null = DrawsModel::intercept_only("null", 1.0);
    let models: [&dyn PosteriorSource; 3] = [&full, &reduced, &null];

    let options = MixtureOptions {
        seed: Some(2026),
        ..MixtureOptions::default()
    };
    let mixture = weighted_posteriors_models(
        &models,
        None,
        &[2.0f64.ln(), 0.5f64.ln(), 0.0],
        None,
        &ParameterFilter::default(),
        &options,
    )
    .expect("mixture");

    for allocation in &mixture.weights {
        println!(
            "{:>8}  weight {:.3}  draws {}",
            allocation.model, allocation.weight, allocation.draws
        );
    }
    let slope = mixture.draws.column("b_x").expect("b_x");
    let mean = slope.iter().sum::<f64>() / idx_to_f64(slope.len());
    println!("mixture rows: {}  mean b_x: {mean:.3}", mixture.draws.n_rows());
}

fn ramp(n: usize, low: f64, high: f64) -> Vec<f64> {
    (0..n)
        .map(|i| (high - low).mul_add(idx_to_f64(i) / idx_to_f64(n - 1), low))
        .collect()
}

fn idx_to_f64(idx: usize) -> f64 {
    f64::from(u32::try_from(idx).unwrap_or(u32::MAX))
}
