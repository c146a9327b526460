use anyhow::Result;
use tracing::info;

use crate::llm::{Llm, Model, ask_json};
use crate::prompts::ranking::build_ranking_prompt;

/// Ask the model which `top_n` cases from the index matter for the query.
///
/// Returned ids are trimmed, de-duplicated in first-seen order and capped
/// at `top_n`.
pub async fn find_cases(
    llm: &dyn Llm,
    model: Model,
    user_query: &str,
    cases_prompt: &str,
    top_n: usize,
) -> Result<Vec<String>> {
    let prompt = build_ranking_prompt(user_query, cases_prompt, top_n);
    let raw: Vec<serde_json::Value> = ask_json(llm, model, &prompt).await?;

    let mut ids: Vec<String> = Vec::with_capacity(top_n);
    for value in raw {
        // Models occasionally emit bare numbers for numeric ids.
        let id = match value {
            serde_json::Value::String(s) => s.trim().to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            _ => continue,
        };
        if id.is_empty() || ids.contains(&id) {
            continue;
        }
        ids.push(id);
        if ids.len() == top_n {
            break;
        }
    }

    info!(count = ids.len(), ids = ?ids, "ranked cases");
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockLlm;

    #[tokio::test]
    async fn parses_fenced_list_after_reasoning() {
        let llm = MockLlm::new(["Case 502 matches best.\n```json\n[\"502\", \"17\"]\n```"]);
        let ids = find_cases(&llm, Model::Pro, "facts", "- Case ID: 502", 8)
            .await
            .unwrap();
        assert_eq!(ids, vec!["502", "17"]);

        let calls = llm.calls();
        assert_eq!(calls[0].model, Model::Pro);
        assert!(calls[0].prompt().contains("top 8 cases"));
        assert!(calls[0].prompt().contains("- Case ID: 502"));
    }

    #[tokio::test]
    async fn dedups_trims_and_caps() {
        let llm = MockLlm::new([r#"[" 1 ", "2", "1", 3, null, "", "4"]"#]);
        let ids = find_cases(&llm, Model::Pro, "q", "", 3).await.unwrap();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn non_list_response_fails() {
        let llm = MockLlm::new(["I could not find anything relevant."]);
        assert!(find_cases(&llm, Model::Pro, "q", "", 3).await.is_err());
    }
}
