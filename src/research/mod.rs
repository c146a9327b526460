//! The counterclaim research flow: rank cases from the index, summarize
//! the chosen ones decision by decision, then write the final report.

pub mod finder;
pub mod report;
pub mod summarizer;

pub use finder::find_cases;
pub use report::{ResearchConfig, ResearchPipeline, ResearchReport};
pub use summarizer::{CaseSummary, summarize_case, summarize_loaded};
