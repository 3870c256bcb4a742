use posterior_summaries::{
    CiMethod, DrawsModel, ParameterFilter, ParameterTable, ResponseFamily, RopeOptions,
    rope_source,
};

fn main() {
    let n = 2_000;
    let draws = ParameterTable::from_columns(vec![
        ("b_Intercept", spread(n, 2.0, 0.4)),
        ("b_x", spread(n, 0.05, 0.2)),
        ("b_z", spread(n, 0.6, 0.3)),
    ])
    .expect("table");
    let model = DrawsModel::new("demo", draws)
        .with_response("y", ResponseFamily::Gaussian { response_sd: 1.5 });

    let options = RopeOptions {
        levels: vec![0.5, 0.89, 0.95],
        method: CiMethod::Hdi,
        check_collinearity: true,
        ..RopeOptions::default()
    };
    let result =
        rope_source(&model, None, &ParameterFilter::default(), &options).expect("rope summary");

    for row in &result.rows {
        let parameter = row.parameter.as_deref().unwrap_or("-");
        match row.percentage {
            Some(share) => println!(
                "{parameter:>12} {:>4.0}% CI  ROPE [{:.2}, {:.2}]  inside: {:.1}%",
                row.ci_percent(),
                row.range.low(),
                row.range.high(),
                share * 100.0
            ),
            None => println!("{parameter:>12} {:>4.0}% CI  unavailable", row.ci_percent()),
        }
    }
    if result.collinearity_flagged {
        println!("collinear pairs: {}", result.advisories.len());
    }
}

fn spread(n: usize, center: f64, width: f64) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let u = (idx_to_f64(i) + 0.5) / idx_to_f64(n);
            width.mul_add((u * std::f64::consts::TAU).sin() * u, center)
        })
        .collect()
}

fn idx_to_f64(idx: usize) -> f64 {
    f64::from(u32::try_from(idx).unwrap_or(u32::MAX))
}
