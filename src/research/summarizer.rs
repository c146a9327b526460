use anyhow::{Context, Result};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::cases::{Case, CaseDate, CaseStore, Decision};
use crate::llm::{Llm, Model, ask};
use crate::prompts::decision::{NOT_RELEVANT, build_decision_prompt};

/// A case rendered for the report prompt, with only relevant decisions kept.
#[derive(Debug, Clone)]
pub struct CaseSummary {
    pub case_id: String,
    pub decisions_total: usize,
    pub decisions_kept: usize,
    pub text: String,
}

/// Case metadata without decision bodies, as shown to the model.
#[derive(Serialize)]
struct CaseHeader<'a> {
    identifier: &'a str,
    title: &'a str,
    case_number: Option<&'a str>,
    industries: &'a [String],
    status: &'a str,
    party_nationalities: &'a [String],
    institution: &'a str,
    rules_of_arbitration: &'a [String],
    applicable_treaties: &'a [String],
    decisions: Vec<DecisionHeader<'a>>,
}

#[derive(Serialize)]
struct DecisionHeader<'a> {
    title: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    date: Option<CaseDate>,
}

impl<'a> From<&'a Decision> for DecisionHeader<'a> {
    fn from(d: &'a Decision) -> Self {
        Self {
            title: &d.title,
            kind: &d.kind,
            date: d.date,
        }
    }
}

fn case_yaml(case: &Case) -> Result<String> {
    let header = CaseHeader {
        identifier: &case.identifier,
        title: &case.title,
        case_number: case.case_number.as_deref(),
        industries: &case.industries,
        status: &case.status,
        party_nationalities: &case.party_nationalities,
        institution: &case.institution,
        rules_of_arbitration: &case.rules_of_arbitration,
        applicable_treaties: &case.applicable_treaties,
        decisions: case.decisions.iter().map(DecisionHeader::from).collect(),
    };
    Ok(serde_yaml::to_string(&header)?)
}

/// Summarize every decision of a case against the query and render the
/// case block for the report prompt.
///
/// Decisions run concurrently, at most `limit` at a time. Decisions the
/// model marks irrelevant are dropped, as are decisions whose call fails.
pub async fn summarize_case(
    llm: &dyn Llm,
    model: Model,
    store: &CaseStore,
    case_id: &str,
    user_query: &str,
    limit: usize,
) -> Result<CaseSummary> {
    let case = store
        .load(case_id)?
        .with_context(|| format!("case {case_id} not found in {}", store.dir().display()))?;
    summarize_loaded(llm, model, case_id, &case, user_query, limit).await
}

/// [`summarize_case`] for a case the caller already loaded.
pub async fn summarize_loaded(
    llm: &dyn Llm,
    model: Model,
    case_id: &str,
    case: &Case,
    user_query: &str,
    limit: usize,
) -> Result<CaseSummary> {
    let header = case_yaml(case)?;

    info!(case_id, decisions = case.decisions.len(), "summarizing case");

    let semaphore = Semaphore::new(limit.max(1));
    let futures = case.decisions.iter().map(|decision| {
        let semaphore = &semaphore;
        let header = &header;
        async move {
            let _permit = semaphore.acquire().await?;
            let meta = serde_yaml::to_string(&DecisionHeader::from(decision))?;
            let prompt = build_decision_prompt(user_query, header, &meta, &decision.content);
            ask(llm, model, &prompt).await
        }
    });
    let results: Vec<Result<String>> = join_all(futures).await;

    let mut kept: Vec<(&Decision, String)> = Vec::new();
    for (decision, result) in case.decisions.iter().zip(results) {
        match result {
            Ok(summary) if summary.contains(NOT_RELEVANT) => {
                debug!(case_id, decision = %decision.title, "decision not relevant");
            }
            Ok(summary) => kept.push((decision, summary)),
            Err(e) => {
                warn!(case_id, decision = %decision.title, error = %e, "decision summary failed");
            }
        }
    }

    Ok(CaseSummary {
        case_id: case_id.to_string(),
        decisions_total: case.decisions.len(),
        decisions_kept: kept.len(),
        text: render_case(case_id, case, &kept),
    })
}

fn bullets(items: &[String]) -> String {
    items.iter().map(|item| format!("- {item}\n")).collect()
}

fn render_case(case_id: &str, case: &Case, decisions: &[(&Decision, String)]) -> String {
    let decisions: String = decisions
        .iter()
        .map(|(decision, summary)| {
            let date = decision
                .date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "None".to_string());
            format!(
                "- TITLE: {}\n  TYPE: {}\n  DATE: {date}\n  CONTENT: |\n{}\n",
                decision.title,
                decision.kind,
                summary.trim_end()
            )
        })
        .collect();

    // Each section header sits after a blank line, so a bullet list is
    // followed by two.
    format!(
        "CASE_ID: {case_id}\n\
         IDENTIFIER: {identifier}\n\
         TITLE: {title}\n\
         CASE_NUMBER: {case_number}\n\n\
         INDUSTRIES:\n{industries}\n\n\
         STATUS: {status}\n\n\
         PARTY_NATIONALITIES:\n{nationalities}\n\n\
         INSTITUTION: {institution}\n\n\
         RULES_OF_ARBITRATION:\n{rules}\n\n\
         APPLICABLE_TREATIES:\n{treaties}\n\n\
         DECISIONS:\n{decisions}\n",
        identifier = case.identifier,
        title = case.title,
        case_number = case.case_number.as_deref().unwrap_or("None"),
        industries = bullets(&case.industries),
        status = case.status,
        nationalities = bullets(&case.party_nationalities),
        institution = case.institution,
        rules = bullets(&case.rules_of_arbitration),
        treaties = bullets(&case.applicable_treaties),
    )
}
