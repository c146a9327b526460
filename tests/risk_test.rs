use counsel::risk::report::render;
use counsel::risk::{
    DEFAULT_ITERATIONS, Factors, RiskMetrics, TribunalStance, density, histogram, rng, simulate,
};

fn factors() -> Factors {
    Factors {
        jurisdiction: 70.0,
        causation: 45.0,
        evidence: 60.0,
        precedent: 55.0,
        damages: 75.0,
    }
}

fn run(stance: TribunalStance, seed: u64) -> Vec<f64> {
    simulate(&factors(), stance, DEFAULT_ITERATIONS, &mut rng(Some(seed)))
}

#[test]
fn default_scenario_is_centred_on_weighted_score() {
    // 70*.4 + 45*.3 + 60*.1 + 55*.15 + 75*.05 = 59.5
    let samples = run(TribunalStance::Neutral, 42);
    assert_eq!(samples.len(), DEFAULT_ITERATIONS);
    assert!(samples.iter().all(|s| (0.0..=100.0).contains(s)));

    let metrics = RiskMetrics::from_samples(&samples).unwrap();
    assert!((metrics.median - 59.5).abs() < 1.5, "median {}", metrics.median);
    assert!(metrics.pessimistic < metrics.median);
    assert!(metrics.median < metrics.optimistic);
    assert!(metrics.success_probability > 70.0);
}

#[test]
fn stance_shifts_the_distribution() {
    let median = |stance| RiskMetrics::from_samples(&run(stance, 7)).unwrap().median;
    let pro_state = median(TribunalStance::ProState);
    let neutral = median(TribunalStance::Neutral);
    let pro_investor = median(TribunalStance::ProInvestor);
    assert!(pro_state < neutral);
    assert!(neutral < pro_investor);
}

#[test]
fn same_seed_same_samples() {
    assert_eq!(run(TribunalStance::Neutral, 1), run(TribunalStance::Neutral, 1));
    assert_ne!(run(TribunalStance::Neutral, 1), run(TribunalStance::Neutral, 2));
}

#[test]
fn density_and_histogram_cover_the_samples() {
    let samples = run(TribunalStance::Neutral, 3);

    let curve = density(&samples).unwrap();
    assert_eq!(curve.x.len(), 200);
    assert!(curve.x[0] >= 0.0);
    assert!(*curve.x.last().unwrap() <= 100.0);
    assert!(curve.y.iter().all(|y| y.is_finite() && *y >= 0.0));

    let hist = histogram(&samples, 50).unwrap();
    assert_eq!(hist.centers.len(), 50);
    let width = hist.centers[1] - hist.centers[0];
    let area: f64 = hist.density.iter().map(|d| d * width).sum();
    assert!((area - 1.0).abs() < 1e-6);
}

#[test]
fn report_page_embeds_metrics_and_chart() {
    let samples = run(TribunalStance::ProInvestor, 11);
    let metrics = RiskMetrics::from_samples(&samples).unwrap().rounded();
    let page = render(&metrics, &histogram(&samples, 50).unwrap());

    assert!(page.contains("<title>Counterclaim Risk Simulation Report</title>"));
    assert!(page.contains(&format!("{:.1}%", metrics.success_probability)));
    assert!(page.contains("Plotly.newPlot('chart'"));
}

#[test]
fn stance_parses_labels_and_cli_spellings() {
    assert_eq!("Pro-Investor".parse::<TribunalStance>().unwrap(), TribunalStance::ProInvestor);
    assert_eq!("pro_state".parse::<TribunalStance>().unwrap(), TribunalStance::ProState);
    assert!("hostile".parse::<TribunalStance>().is_err());
}
