use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{Html, Json};
use serde_json::{Value, json};
use tracing::warn;

use crate::risk::{self, DEFAULT_ITERATIONS, Factors, RiskMetrics, TribunalStance};

const PAGE: &str = include_str!("../../assets/simulator.html");

pub async fn index() -> Html<&'static str> {
    Html(PAGE)
}

/// Read the factor scores and stance out of a simulator request.
///
/// Scores may arrive as JSON numbers or numeric strings (form values).
pub fn parse_request(body: &Value) -> Result<(Factors, TribunalStance)> {
    let score = |name: &str| -> Result<f64> {
        match body.get(name) {
            Some(Value::Number(n)) => n.as_f64().ok_or_else(|| anyhow!("{name} is not a number")),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .with_context(|| format!("{name} is not a number: {s:?}")),
            Some(other) => Err(anyhow!("{name} is not a number: {other}")),
            None => Err(anyhow!("missing field: {name}")),
        }
    };
    let factors = Factors {
        jurisdiction: score("jurisdiction")?,
        causation: score("causation")?,
        evidence: score("evidence")?,
        precedent: score("precedent")?,
        damages: score("damages")?,
    };
    factors.validate()?;

    let stance = body
        .get("tribunal_stance")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("missing field: tribunal_stance"))?;
    Ok((factors, TribunalStance::from_str(stance)?))
}

/// Run a fresh simulation and return rounded metrics plus the density curve.
pub fn run(factors: &Factors, stance: TribunalStance, seed: Option<u64>) -> Result<Value> {
    let mut rng = risk::rng(seed);
    let samples = risk::simulate(factors, stance, DEFAULT_ITERATIONS, &mut rng);
    let metrics = RiskMetrics::from_samples(&samples)?.rounded();
    let density = risk::density(&samples)?;
    Ok(json!({
        "success": true,
        "metrics": metrics,
        "density_data": density,
    }))
}

/// Parse the request, then simulate on the blocking pool.
async fn evaluate(body: Result<Json<Value>, JsonRejection>) -> Result<Value> {
    let Json(body) = body.map_err(|rejection| anyhow!(rejection.body_text()))?;
    let (factors, stance) = parse_request(&body)?;
    tokio::task::spawn_blocking(move || run(&factors, stance, None)).await?
}

pub async fn simulate(body: Result<Json<Value>, JsonRejection>) -> (StatusCode, Json<Value>) {
    match evaluate(body).await {
        Ok(payload) => (StatusCode::OK, Json(payload)),
        Err(e) => {
            warn!(error = %e, "rejected simulation request");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> Value {
        json!({
            "jurisdiction": 70,
            "causation": "45",
            "evidence": 60,
            "precedent": 55.5,
            "damages": 75,
            "tribunal_stance": "Pro-State"
        })
    }

    #[test]
    fn parses_numbers_and_numeric_strings() {
        let (factors, stance) = parse_request(&body()).unwrap();
        assert_eq!(factors.causation, 45.0);
        assert_eq!(factors.precedent, 55.5);
        assert_eq!(stance, TribunalStance::ProState);
    }

    #[test]
    fn rejects_missing_and_out_of_range() {
        let mut missing = body();
        missing.as_object_mut().unwrap().remove("damages");
        assert!(parse_request(&missing).unwrap_err().to_string().contains("damages"));

        let mut high = body();
        high["jurisdiction"] = json!(120);
        assert!(parse_request(&high).is_err());

        let mut stance = body();
        stance["tribunal_stance"] = json!("Hostile");
        assert!(parse_request(&stance).is_err());
    }

    #[test]
    fn run_is_reproducible_with_seed() {
        let (factors, stance) = parse_request(&body()).unwrap();
        let a = run(&factors, stance, Some(7)).unwrap();
        let b = run(&factors, stance, Some(7)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a["success"], true);
        assert_eq!(a["density_data"]["x"].as_array().unwrap().len(), 200);
        assert!(a["metrics"]["success_prob"].is_number());
    }

    #[tokio::test]
    async fn handler_yields_while_the_run_is_on_the_blocking_pool() {
        let handler = simulate(Ok(Json(body())));
        tokio::pin!(handler);
        assert!(futures::poll!(&mut handler).is_pending());

        let (status, Json(payload)) = handler.await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["success"], true);
        assert_eq!(payload["density_data"]["y"].as_array().unwrap().len(), 200);
    }

    #[tokio::test]
    async fn handler_rejects_invalid_scores() {
        let mut high = body();
        high["damages"] = json!(-5);
        let (status, Json(payload)) = simulate(Ok(Json(high))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["success"], false);
        assert!(payload["error"].as_str().unwrap().contains("damages"));
    }
}
