const GOALS: &str = "\
Goals:
1. Fact matching
Measure similarity between user’s facts & prior cases (metadata & semantic similarities).
Strong strategies are ones that have previous case law that positively support it. Weak strategies are ones that previous case law do not support it.
Although ALL case law can be relevant, the ones with the most weight are the ones where the elements of the facts are comparable.
2. Weakness detection
Based on previous case law opposing this strategy, if there are at least 1, it should be highlighted. Detecting whether a case is supportive or not supportive of the strategy.";

const OUTPUT_FORMAT: &str = "\
OUTPUT:
.....
```json
[\"case_1\", \"...\", ...]
```

REMEMBER: at the very end output JSON list with case IDs strings.";

/// Ask for the `top_n` cases worth reading in full, as a JSON list of ids.
pub fn build_ranking_prompt(user_query: &str, cases: &str, top_n: usize) -> String {
    format!(
        "Given USER_QUERY and CASES respond with a list of top {top_n} cases relevant to the USER_QUERY which should be read in detail.\n\n\
         {GOALS}\n\n\
         <USER_QUERY>{user_query}</USER_QUERY>\n\
         <CASES>\n{cases}\n</CASES>\n\n\
         {OUTPUT_FORMAT}\n"
    )
}
