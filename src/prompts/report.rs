const GOALS: &[(&str, &str)] = &[
    (
        "Legal source retrieval",
        "Retrieve all relevant legal sources from Jus Mundi (using available API)\n\
         Strategies need to be backed by legal sources: we will scope down this initiative to only including case law available through the API.",
    ),
    (
        "Fact matching",
        "Measure similarity between user’s facts & prior cases (metadata & semantic similarities).\n\
         Strong strategies are ones that have previous case law that positively support it. Weak strategies are ones that previous case law do not support it.\n\
         Although ALL case law can be relevant, the ones with the most weight are the ones where the elements of the facts are comparable.",
    ),
    (
        "Weakness detection",
        "Based on previous case law opposing this strategy, if there are at least 1, it should be highlighted. Detecting whether a case is supportive or not supportive of the strategy.\n\
         A weakness can be detected if the strategy is usually rejected by tribunals, or the risk that a strong jurisprudence exists that the opponent counsel can use to counter-argue.",
    ),
    (
        "UI",
        "Structured visual output: tabular with columns for retrieved sources.\n\
         Users want to absorb complex info at a glance. They need to compare sources quickly, spot inconsistencies, and justify conclusions easily. Anything from tabular, to the way the information is structured in a particular order, to interactive UI can help (and even more). Be creative!",
    ),
    (
        "Legal source breakdown",
        "Adds additional layered insights to each retrieved case: global summary, each of the parties’ arguments about the topic, the reasoning of the tribunal, how is it cited by others.\n\
         Users want to transparency and depth. They don’t just want the AI’s final conclusion, they want to see the reasoning and supporting evidence so they can evaluate it themselves.",
    ),
    (
        "Predictive analysis",
        "Estimate likely a tribunal’s response and/or chances of succeeding metric\n\
         Users want to assess risk and plan accordingly. They’re looking for informed guidance, not just raw facts. A predictive signal helps them make smarter, faster decisions under uncertainty.",
    ),
    (
        "Strategy rewriter",
        "Suggest stronger or safer version of the strategy, if needed\n\
         Act as a thought partner. User expects support in refining their arguments and exploring alternatives, especially when the stakes are high or the answer is ambiguous.",
    ),
];

/// Final report prompt over the per-case summaries.
pub fn build_report_prompt(user_query: &str, summaries: &str) -> String {
    let goals = GOALS
        .iter()
        .enumerate()
        .map(|(i, (title, body))| format!("{}. {}\n{}", i + 1, title, body))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Produce comprehensive precise report satisfying:\n\n\
         {goals}\n\n\
         <USER_QUERY>{user_query}</USER_QUERY>\n\n\
         <CASES>\n{summaries}\n</CASES>\n\n\
         REMEMBER: do NOT start your report with \"Of course. Here is a report...\", get straight to the report.\n"
    )
}
