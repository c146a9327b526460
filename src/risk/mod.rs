//! Monte Carlo scoring of counterclaim strategy strength.
//!
//! Five factor scores (0-100) are each perturbed with Gaussian noise,
//! clipped, weighted, scaled by the tribunal's stance and clipped again.
//! The resulting distribution is summarised by percentiles, a success
//! probability and a kernel density estimate.

pub mod report;

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use rand::RngExt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ITERATIONS: usize = 5000;

/// Standard deviation of every factor's sampling noise.
pub const FACTOR_STD_DEV: f64 = 15.0;

/// Scores strictly above this count as success.
pub const SUCCESS_THRESHOLD: f64 = 50.0;

pub const WEIGHT_JURISDICTION: f64 = 0.40;
pub const WEIGHT_CAUSATION: f64 = 0.30;
pub const WEIGHT_EVIDENCE: f64 = 0.10;
pub const WEIGHT_PRECEDENT: f64 = 0.15;
pub const WEIGHT_DAMAGES: f64 = 0.05;

const DENSITY_POINTS: usize = 200;

/// How the tribunal is expected to lean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TribunalStance {
    #[serde(rename = "Pro-Investor")]
    ProInvestor,
    #[serde(rename = "Neutral")]
    Neutral,
    #[serde(rename = "Pro-State")]
    ProState,
}

impl TribunalStance {
    pub fn multiplier(&self) -> f64 {
        match self {
            TribunalStance::ProInvestor => 1.10,
            TribunalStance::Neutral => 1.00,
            TribunalStance::ProState => 0.90,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TribunalStance::ProInvestor => "Pro-Investor",
            TribunalStance::Neutral => "Neutral",
            TribunalStance::ProState => "Pro-State",
        }
    }
}

impl fmt::Display for TribunalStance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TribunalStance {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "pro-investor" => Ok(TribunalStance::ProInvestor),
            "neutral" => Ok(TribunalStance::Neutral),
            "pro-state" => Ok(TribunalStance::ProState),
            _ => bail!("unknown tribunal stance: {s} (expected Pro-Investor, Neutral or Pro-State)"),
        }
    }
}

/// Analyst's 0-100 assessment of each factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Factors {
    pub jurisdiction: f64,
    pub causation: f64,
    pub evidence: f64,
    pub precedent: f64,
    pub damages: f64,
}

impl Factors {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("jurisdiction", self.jurisdiction),
            ("causation", self.causation),
            ("evidence", self.evidence),
            ("precedent", self.precedent),
            ("damages", self.damages),
        ] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                bail!("{name} must be between 0 and 100, got {value}");
            }
        }
        Ok(())
    }
}

/// Seeded RNG, or one seeded from the thread RNG when `seed` is `None`.
pub fn rng(seed: Option<u64>) -> StdRng {
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    StdRng::seed_from_u64(seed)
}

/// Box-Muller draw from Normal(mean, std_dev).
fn normal(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    // 1 - u keeps the log argument in (0, 1].
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    mean + std_dev * z
}

fn perturbed(rng: &mut StdRng, score: f64) -> f64 {
    normal(rng, score, FACTOR_STD_DEV).clamp(0.0, 100.0)
}

/// Run `iterations` draws and return the final scores in draw order.
pub fn simulate(
    factors: &Factors,
    stance: TribunalStance,
    iterations: usize,
    rng: &mut StdRng,
) -> Vec<f64> {
    let multiplier = stance.multiplier();
    (0..iterations)
        .map(|_| {
            let weighted = perturbed(rng, factors.jurisdiction) * WEIGHT_JURISDICTION
                + perturbed(rng, factors.causation) * WEIGHT_CAUSATION
                + perturbed(rng, factors.evidence) * WEIGHT_EVIDENCE
                + perturbed(rng, factors.precedent) * WEIGHT_PRECEDENT
                + perturbed(rng, factors.damages) * WEIGHT_DAMAGES;
            (weighted * multiplier).clamp(0.0, 100.0)
        })
        .collect()
}

/// Linear-interpolated percentile of sorted data (`p` in 0..=100).
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

fn sorted(samples: &[f64]) -> Vec<f64> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Headline numbers of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskMetrics {
    pub median: f64,
    #[serde(rename = "p25")]
    pub pessimistic: f64,
    #[serde(rename = "p75")]
    pub optimistic: f64,
    /// Percentage of draws strictly above [`SUCCESS_THRESHOLD`].
    #[serde(rename = "success_prob")]
    pub success_probability: f64,
}

impl RiskMetrics {
    pub fn from_samples(samples: &[f64]) -> Result<Self> {
        if samples.is_empty() {
            bail!("cannot summarise an empty simulation");
        }
        let sorted = sorted(samples);
        let successes = samples.iter().filter(|&&s| s > SUCCESS_THRESHOLD).count();
        Ok(Self {
            median: percentile(&sorted, 50.0),
            pessimistic: percentile(&sorted, 25.0),
            optimistic: percentile(&sorted, 75.0),
            success_probability: successes as f64 / samples.len() as f64 * 100.0,
        })
    }

    /// Every metric rounded to one decimal place.
    pub fn rounded(&self) -> Self {
        Self {
            median: round1(self.median),
            pessimistic: round1(self.pessimistic),
            optimistic: round1(self.optimistic),
            success_probability: round1(self.success_probability),
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Smooth density curve for plotting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Density {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub median: f64,
}

/// Gaussian KDE with Scott's bandwidth, evaluated on 200 points spanning
/// the samples plus a 5-point margin, clipped to 0..=100.
pub fn density(samples: &[f64]) -> Result<Density> {
    if samples.is_empty() {
        bail!("cannot estimate density of an empty simulation");
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = if samples.len() > 1 {
        samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0)
    } else {
        0.0
    };
    let mut bandwidth = variance.sqrt() * n.powf(-0.2);
    if !bandwidth.is_finite() || bandwidth <= 0.0 {
        // All draws identical: any positive width keeps the curve finite.
        bandwidth = 1.0;
    }

    let sorted = sorted(samples);
    let lo = (sorted[0] - 5.0).max(0.0);
    let hi = (sorted[sorted.len() - 1] + 5.0).min(100.0);
    let step = (hi - lo) / (DENSITY_POINTS - 1) as f64;
    let norm = 1.0 / (n * bandwidth * (2.0 * PI).sqrt());

    let x: Vec<f64> = (0..DENSITY_POINTS).map(|i| lo + step * i as f64).collect();
    let y = x
        .iter()
        .map(|&xi| {
            samples
                .iter()
                .map(|&s| {
                    let u = (xi - s) / bandwidth;
                    (-0.5 * u * u).exp()
                })
                .sum::<f64>()
                * norm
        })
        .collect();

    Ok(Density {
        x,
        y,
        median: percentile(&sorted, 50.0),
    })
}

/// Density-normalised histogram (bar areas sum to 1).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub centers: Vec<f64>,
    pub density: Vec<f64>,
}

pub fn histogram(samples: &[f64], bins: usize) -> Result<Histogram> {
    if samples.is_empty() || bins == 0 {
        bail!("histogram needs samples and at least one bin");
    }
    let sorted = sorted(samples);
    let (mut lo, mut hi) = (sorted[0], sorted[sorted.len() - 1]);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &s in samples {
        let idx = (((s - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let n = samples.len() as f64;
    Ok(Histogram {
        centers: (0..bins).map(|i| lo + width * (i as f64 + 0.5)).collect(),
        density: counts.iter().map(|&c| c as f64 / (n * width)).collect(),
    })
}

/// CSS class for a metric: `success` above `hi`, `warning` above `lo`.
pub fn metric_class(value: f64, (hi, lo): (f64, f64)) -> &'static str {
    if value > hi {
        "success"
    } else if value > lo {
        "warning"
    } else {
        "danger"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(score: f64) -> Factors {
        Factors {
            jurisdiction: score,
            causation: score,
            evidence: score,
            precedent: score,
            damages: score,
        }
    }

    #[test]
    fn weights_sum_to_one() {
        let total = WEIGHT_JURISDICTION
            + WEIGHT_CAUSATION
            + WEIGHT_EVIDENCE
            + WEIGHT_PRECEDENT
            + WEIGHT_DAMAGES;
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn stance_parsing_and_multipliers() {
        assert_eq!("Pro-Investor".parse::<TribunalStance>().unwrap(), TribunalStance::ProInvestor);
        assert_eq!("pro_state".parse::<TribunalStance>().unwrap(), TribunalStance::ProState);
        assert_eq!("neutral".parse::<TribunalStance>().unwrap().multiplier(), 1.0);
        assert!("hostile".parse::<TribunalStance>().is_err());
    }

    #[test]
    fn stance_serde_uses_display_labels() {
        let stance: TribunalStance = serde_json::from_str("\"Pro-State\"").unwrap();
        assert_eq!(stance, TribunalStance::ProState);
        assert_eq!(serde_json::to_string(&TribunalStance::ProInvestor).unwrap(), "\"Pro-Investor\"");
    }

    #[test]
    fn factors_validation() {
        assert!(flat(50.0).validate().is_ok());
        assert!(flat(0.0).validate().is_ok());
        assert!(flat(100.0).validate().is_ok());
        assert!(flat(101.0).validate().is_err());
        assert!(flat(-1.0).validate().is_err());
        assert!(flat(f64::NAN).validate().is_err());
    }

    #[test]
    fn simulation_is_bounded_and_sized() {
        let mut rng = rng(Some(7));
        let samples = simulate(&flat(100.0), TribunalStance::ProInvestor, 1000, &mut rng);
        assert_eq!(samples.len(), 1000);
        assert!(samples.iter().all(|s| (0.0..=100.0).contains(s)));
    }

    #[test]
    fn same_seed_same_samples() {
        let a = simulate(&flat(60.0), TribunalStance::Neutral, 100, &mut rng(Some(42)));
        let b = simulate(&flat(60.0), TribunalStance::Neutral, 100, &mut rng(Some(42)));
        assert_eq!(a, b);
    }

    #[test]
    fn neutral_centres_on_input_score() {
        let samples = simulate(&flat(50.0), TribunalStance::Neutral, DEFAULT_ITERATIONS, &mut rng(Some(1)));
        let metrics = RiskMetrics::from_samples(&samples).unwrap();
        assert!((metrics.median - 50.0).abs() < 1.5, "median {}", metrics.median);
        assert!(metrics.pessimistic < metrics.median);
        assert!(metrics.optimistic > metrics.median);
    }

    #[test]
    fn pro_state_lowers_scores() {
        let neutral = simulate(&flat(60.0), TribunalStance::Neutral, 2000, &mut rng(Some(3)));
        let pro_state = simulate(&flat(60.0), TribunalStance::ProState, 2000, &mut rng(Some(3)));
        let n = RiskMetrics::from_samples(&neutral).unwrap();
        let p = RiskMetrics::from_samples(&pro_state).unwrap();
        assert!(p.median < n.median);
        assert!(p.success_probability < n.success_probability);
    }

    #[test]
    fn percentiles_interpolate_linearly() {
        let sorted = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&sorted, 0.0), 10.0);
        assert_eq!(percentile(&sorted, 100.0), 40.0);
        assert!((percentile(&sorted, 50.0) - 25.0).abs() < 1e-12);
        assert!((percentile(&sorted, 25.0) - 17.5).abs() < 1e-12);
    }

    #[test]
    fn metrics_from_known_samples() {
        let metrics = RiskMetrics::from_samples(&[60.0, 10.0, 40.0, 30.0, 20.0]).unwrap();
        assert_eq!(metrics.median, 30.0);
        assert_eq!(metrics.pessimistic, 20.0);
        assert_eq!(metrics.optimistic, 40.0);
        assert_eq!(metrics.success_probability, 20.0);
    }

    #[test]
    fn success_is_strictly_above_threshold() {
        let metrics = RiskMetrics::from_samples(&[50.0, 50.0, 50.1, 49.9]).unwrap();
        assert_eq!(metrics.success_probability, 25.0);
    }

    #[test]
    fn metrics_reject_empty_input() {
        assert!(RiskMetrics::from_samples(&[]).is_err());
        assert!(density(&[]).is_err());
        assert!(histogram(&[], 10).is_err());
    }

    #[test]
    fn rounded_metrics_serialize_with_short_names() {
        let metrics = RiskMetrics {
            median: 55.55,
            pessimistic: 40.04,
            optimistic: 70.06,
            success_probability: 61.23,
        }
        .rounded();
        let json = serde_json::to_value(metrics).unwrap();
        assert_eq!(json["median"], 55.6);
        assert_eq!(json["p25"], 40.0);
        assert_eq!(json["p75"], 70.1);
        assert_eq!(json["success_prob"], 61.2);
    }

    #[test]
    fn density_spans_padded_range() {
        let samples = simulate(&flat(50.0), TribunalStance::Neutral, 500, &mut rng(Some(9)));
        let d = density(&samples).unwrap();
        let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        assert_eq!(d.x.len(), 200);
        assert_eq!(d.y.len(), 200);
        assert!((d.x[0] - (min - 5.0).max(0.0)).abs() < 1e-9);
        assert!((d.x[199] - (max + 5.0).min(100.0)).abs() < 1e-9);
        assert!(d.y.iter().all(|y| y.is_finite() && *y >= 0.0));

        // Peak sits near the centre of mass.
        let peak = d
            .x
            .iter()
            .zip(&d.y)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(x, _)| *x)
            .unwrap();
        assert!((peak - 50.0).abs() < 5.0, "peak at {peak}");
    }

    #[test]
    fn density_of_identical_samples_is_finite() {
        let d = density(&[42.0; 10]).unwrap();
        assert!(d.y.iter().all(|y| y.is_finite()));
        assert_eq!(d.median, 42.0);
    }

    #[test]
    fn histogram_integrates_to_one() {
        let samples = simulate(&flat(55.0), TribunalStance::Neutral, 1000, &mut rng(Some(5)));
        let h = histogram(&samples, 50).unwrap();
        assert_eq!(h.centers.len(), 50);
        let width = h.centers[1] - h.centers[0];
        let area: f64 = h.density.iter().map(|d| d * width).sum();
        assert!((area - 1.0).abs() < 1e-9);
    }

    #[test]
    fn histogram_of_identical_samples() {
        let h = histogram(&[10.0, 10.0], 4).unwrap();
        assert_eq!(h.density.iter().filter(|d| **d > 0.0).count(), 1);
    }

    #[test]
    fn metric_classes() {
        assert_eq!(metric_class(61.0, (60.0, 40.0)), "success");
        assert_eq!(metric_class(60.0, (60.0, 40.0)), "warning");
        assert_eq!(metric_class(40.0, (60.0, 40.0)), "danger");
    }
}
