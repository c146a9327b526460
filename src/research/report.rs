use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, warn};

use super::finder::find_cases;
use super::summarizer::{CaseSummary, summarize_loaded};
use crate::cases::CaseStore;
use crate::events::{Event, EventBus};
use crate::llm::{Llm, Model, ask};
use crate::prompts::report::build_report_prompt;
use crate::render;

pub const PROMPT_FILE: &str = "report_prompt.txt";
pub const REPORT_FILE: &str = "report.md";
pub const HTML_FILE: &str = "report.html";

pub struct ResearchConfig {
    pub ranking_model: Model,
    pub summary_model: Model,
    pub report_model: Model,
    pub top_n: usize,
    pub concurrency: usize,
    pub output_dir: PathBuf,
    pub render_html: bool,
}

/// Everything a research run produced.
#[derive(Debug)]
pub struct ResearchReport {
    pub case_ids: Vec<String>,
    pub summaries: Vec<CaseSummary>,
    pub markdown: String,
    pub prompt_path: PathBuf,
    pub report_path: PathBuf,
    pub html_path: Option<PathBuf>,
}

/// Rank, summarize, then write the counterclaim report.
pub struct ResearchPipeline {
    llm: Arc<dyn Llm>,
    store: CaseStore,
    cases_prompt: String,
    config: ResearchConfig,
    events: Arc<EventBus>,
}

impl ResearchPipeline {
    pub fn new(
        llm: Arc<dyn Llm>,
        store: CaseStore,
        cases_prompt: String,
        config: ResearchConfig,
    ) -> Self {
        Self {
            llm,
            store,
            cases_prompt,
            config,
            events: Arc::new(EventBus::default()),
        }
    }

    /// Progress events for this pipeline's runs.
    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    pub async fn rank(&self, user_query: &str) -> Result<Vec<String>> {
        self.events.emit(Event::Ranking {
            top_n: self.config.top_n,
        });
        let ids = find_cases(
            self.llm.as_ref(),
            self.config.ranking_model,
            user_query,
            &self.cases_prompt,
            self.config.top_n,
        )
        .await?;
        self.events.emit(Event::Ranked {
            case_ids: ids.clone(),
        });
        Ok(ids)
    }

    /// Summarize ranked cases one after another; each case fans out over
    /// its decisions. Ids without a case file are skipped.
    pub async fn summarize(&self, case_ids: &[String], user_query: &str) -> Result<Vec<CaseSummary>> {
        let mut summaries = Vec::with_capacity(case_ids.len());
        for (i, case_id) in case_ids.iter().enumerate() {
            let Some(case) = self.store.load(case_id)? else {
                warn!(case_id = %case_id, "ranked case has no case file, skipping");
                self.events.emit(Event::Skipped {
                    case_id: case_id.clone(),
                });
                continue;
            };
            self.events.emit(Event::Summarizing {
                index: i + 1,
                total: case_ids.len(),
                case_id: case_id.clone(),
            });
            let summary = summarize_loaded(
                self.llm.as_ref(),
                self.config.summary_model,
                case_id,
                &case,
                user_query,
                self.config.concurrency,
            )
            .await?;
            summaries.push(summary);
        }
        Ok(summaries)
    }

    pub async fn run(&self, user_query: &str) -> Result<ResearchReport> {
        let case_ids = self.rank(user_query).await?;
        let summaries = self.summarize(&case_ids, user_query).await?;

        let joined = summaries
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = build_report_prompt(user_query, &joined);

        let dir = &self.config.output_dir;
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;

        let prompt_path = dir.join(PROMPT_FILE);
        fs::write(&prompt_path, &prompt)
            .await
            .with_context(|| format!("failed to write {}", prompt_path.display()))?;

        self.events.emit(Event::Writing);
        let markdown = ask(self.llm.as_ref(), self.config.report_model, &prompt).await?;

        let report_path = dir.join(REPORT_FILE);
        fs::write(&report_path, &markdown)
            .await
            .with_context(|| format!("failed to write {}", report_path.display()))?;
        info!(path = %report_path.display(), cases = summaries.len(), "wrote report");

        let html_path = if self.config.render_html {
            let path = dir.join(HTML_FILE);
            fs::write(&path, render::html_report(&markdown))
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "generated HTML report");
            Some(path)
        } else {
            None
        };

        self.events.emit(Event::Finished);

        Ok(ResearchReport {
            case_ids,
            summaries,
            markdown,
            prompt_path,
            report_path,
            html_path,
        })
    }
}
