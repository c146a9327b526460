//! Standalone HTML report for a simulation run.

use anyhow::Result;
use serde_json::json;

use super::{Histogram, RiskMetrics, SUCCESS_THRESHOLD, histogram, metric_class};

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.26.0.min.js";

const HISTOGRAM_BINS: usize = 50;

/// Summarise a run and render its report page.
pub fn build(samples: &[f64]) -> Result<(RiskMetrics, String)> {
    let metrics = RiskMetrics::from_samples(samples)?;
    let page = render(&metrics, &histogram(samples, HISTOGRAM_BINS)?);
    Ok((metrics, page))
}

/// Plotly figure (data + layout) for the outcome distribution.
pub fn chart(histogram: &Histogram, metrics: &RiskMetrics) -> serde_json::Value {
    let peak = histogram.density.iter().cloned().fold(0.0_f64, f64::max);

    json!({
        "data": [{
            "x": histogram.centers,
            "y": histogram.density,
            "mode": "lines",
            "fill": "tozeroy",
            "fillcolor": "rgba(102, 126, 234, 0.3)",
            "line": { "color": "rgba(102, 126, 234, 0.8)", "width": 3 },
            "name": "Probability Density"
        }],
        "layout": {
            "title": { "text": "Distribution of Potential Outcomes" },
            "xaxis": { "title": { "text": "Strategy Strength Score" }, "range": [0, 100] },
            "yaxis": { "title": { "text": "Likelihood" } },
            "plot_bgcolor": "rgba(0,0,0,0)",
            "paper_bgcolor": "rgba(0,0,0,0)",
            "font": { "family": "Segoe UI, sans-serif", "size": 12, "color": "#333" },
            "shapes": [
                {
                    "type": "line",
                    "x0": SUCCESS_THRESHOLD, "x1": SUCCESS_THRESHOLD, "y0": 0, "y1": peak,
                    "line": { "color": "Red", "width": 2, "dash": "dash" }
                },
                {
                    "type": "line",
                    "x0": metrics.median, "x1": metrics.median, "y0": 0, "y1": peak,
                    "line": { "color": "Green", "width": 2, "dash": "dot" }
                }
            ],
            "annotations": [
                {
                    "x": SUCCESS_THRESHOLD, "y": peak * 0.9,
                    "text": "Success Threshold (50)",
                    "showarrow": false, "font": { "color": "red" }
                },
                {
                    "x": metrics.median, "y": peak * 0.8,
                    "text": format!("Median ({:.1})", metrics.median),
                    "showarrow": false, "font": { "color": "green" }
                }
            ]
        }
    })
}

/// Render the full report page.
///
/// Takes unrounded metrics: cards are classified on the exact values and
/// rounded only for display.
pub fn render(metrics: &RiskMetrics, histogram: &Histogram) -> String {
    let median_class = metric_class(metrics.median, (60.0, 40.0));
    let success_class = metric_class(metrics.success_probability, (70.0, 40.0));
    let figure = chart(histogram, metrics);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Counterclaim Risk Simulation Report</title>
    <script src="{PLOTLY_CDN}"></script>
    <style>
        body {{ font-family: 'Segoe UI', sans-serif; background-color: #f4f7f6; color: #333; }}
        .container {{ max-width: 900px; margin: 40px auto; padding: 20px; background: white; border-radius: 8px; box-shadow: 0 4px 8px rgba(0,0,0,0.1); }}
        h1 {{ color: #2c3e50; }}
        .metrics-grid {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; margin-bottom: 30px; }}
        .metric-card {{ background: #fdfdfd; padding: 20px; border-radius: 8px; text-align: center; box-shadow: 0 2px 4px rgba(0,0,0,0.05); }}
        .metric-label {{ font-size: 0.9rem; color: #7f8c8d; margin-bottom: 8px; }}
        .metric-value {{ font-size: 2rem; font-weight: 700; }}
        .metric-value.success {{ color: #27ae60; }}
        .metric-value.warning {{ color: #f39c12; }}
        .metric-value.danger {{ color: #e74c3c; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>Counterclaim Risk Simulation Report</h1>
        <div class="metrics-grid">
            <div class="metric-card">
                <div class="metric-label">Most Likely Outcome (Median)</div>
                <div class="metric-value {median_class}">{median:.1}</div>
            </div>
            <div class="metric-card">
                <div class="metric-label">Probability of Success (&gt;50)</div>
                <div class="metric-value {success_class}">{success:.1}%</div>
            </div>
            <div class="metric-card">
                <div class="metric-label">Pessimistic Outcome (25th %)</div>
                <div class="metric-value">{pessimistic:.1}</div>
            </div>
            <div class="metric-card">
                <div class="metric-label">Optimistic Outcome (75th %)</div>
                <div class="metric-value">{optimistic:.1}</div>
            </div>
        </div>
        <div id="chart"></div>
    </div>
    <script>
        const figure = {figure};
        Plotly.newPlot('chart', figure.data, figure.layout, {{ responsive: true }});
    </script>
</body>
</html>
"#,
        median = metrics.median,
        success = metrics.success_probability,
        pessimistic = metrics.pessimistic,
        optimistic = metrics.optimistic,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (RiskMetrics, Histogram) {
        (
            RiskMetrics {
                median: 62.34,
                pessimistic: 55.0,
                optimistic: 70.0,
                success_probability: 45.0,
            },
            Histogram {
                centers: vec![50.0, 60.0, 70.0],
                density: vec![0.01, 0.05, 0.02],
            },
        )
    }

    #[test]
    fn chart_marks_threshold_and_median() {
        let (metrics, histogram) = sample();
        let figure = chart(&histogram, &metrics);
        assert_eq!(figure["data"][0]["y"][1], 0.05);
        assert_eq!(figure["layout"]["shapes"][0]["x0"], 50.0);
        assert_eq!(figure["layout"]["shapes"][1]["x0"], 62.34);
        assert_eq!(figure["layout"]["shapes"][1]["y1"], 0.05);
        assert_eq!(figure["layout"]["annotations"][1]["text"], "Median (62.3)");
    }

    #[test]
    fn page_shows_metrics_with_classes() {
        let (metrics, histogram) = sample();
        let page = render(&metrics, &histogram);
        assert!(page.contains("<div class=\"metric-value success\">62.3</div>"));
        assert!(page.contains("<div class=\"metric-value warning\">45.0%</div>"));
        assert!(page.contains(">55.0<"));
        assert!(page.contains(">70.0<"));
        assert!(page.contains(PLOTLY_CDN));
        assert!(page.contains("Plotly.newPlot('chart'"));
    }

    #[test]
    fn build_classifies_before_rounding() {
        // Median 60.04 shows as 60.0 but is still above the 60 cut-off.
        let (metrics, page) = build(&[59.0, 60.04, 61.0]).unwrap();
        assert_eq!(metrics.median, 60.04);
        assert!(page.contains("<div class=\"metric-value success\">60.0</div>"));
        assert!(page.contains("<div class=\"metric-value success\">100.0%</div>"));
    }
}
