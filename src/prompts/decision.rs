/// Marker the model returns for decisions that don't bear on the query.
pub const NOT_RELEVANT: &str = "NOT_RELEVANT";

const TOPICS: &str = "\
1.  **Jurisdiction over Counterclaim**: Did the tribunal accept jurisdiction over the state's counterclaim? What was the reasoning (e.g., 'close connection' test)?
2.  **Merits of Counterclaim - Causation**: What was the tribunal's finding on the causal link between the investor's actions and the alleged damage? What was the standard of proof required? How was evidence like expert reports treated?
3.  **Merits of Counterclaim - Quantum**: How did the tribunal assess the damages claimed by the state? Did it accept the claimed amount? What methodology did it use? State the amounts claimed vs. awarded if available.
4.  **Overall Outcome**: Briefly state the final outcome regarding the counterclaim.";

/// Prompt for summarizing one decision against the user's query.
///
/// `case_yaml` and `decision_yaml` carry metadata only; the full text goes
/// in `content`.
pub fn build_decision_prompt(
    user_query: &str,
    case_yaml: &str,
    decision_yaml: &str,
    content: &str,
) -> String {
    format!(
        "Analyze the full DECISION text provided below. Create a structured summary of the findings on the following topics, but ONLY if they are relevant to the USER_QUERY:\n\
         {TOPICS}\n\n\
         If DECISION_CONTENT is not relevant to USER_QUERY respond with {NOT_RELEVANT}.\n\n\
         <USER_QUERY>{user_query}</USER_QUERY>\n\
         <CASE>\n{case_yaml}\n</CASE>\n\
         <DECISION>\n{decision_yaml}\n</DECISION>\n\
         <DECISION_CONTENT>\n{content}\n</DECISION_CONTENT>\n\n\
         REMEMBER: do NOT include introductory sentences such as \"Here is the summary:\"\n"
    )
}
