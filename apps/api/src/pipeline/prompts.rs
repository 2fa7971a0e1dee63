// All LLM prompt constants for the recommendation pipeline.

/// Major-inference instruction — demands a single plaintext token.
pub const MAJOR_PROMPT: &str = "You are an expert career/major predictor.\n\
    Based only on the attached resume (PDF), return a SINGLE WORD that best \
    describes the student's major (e.g., 'electrical', 'computer', 'anthropology').\n\
    Return ONLY that single word in plaintext, no JSON and no extra text.\n";

/// Recommendation instruction template. Replace `{major}` and `{evidence}`
/// before sending. The trailing JSON block is optional on the model's side —
/// the parser falls back to the "Recommended Courses" heading when absent.
pub const RECOMMENDATION_PROMPT_TEMPLATE: &str = "You are an expert academic and career advisor. \
    The predicted major based on the resume is '{major}'. Evidence: {evidence}\n\
    Using the attached lightweight course name list (text) and the resume excerpt provided, do the following:\n\
    1) Prioritize recommending courses that belong to the predicted major (at least 80% of recommendations). \
    You may include up to two cross-discipline electives.\n\
    2) Provide short-term (6-12 months) and long-term (1-3 years) course roadmaps, \
    referencing course codes/names from the list when present.\n\
    3) Provide career paths and key skills to learn.\n\
    4) Provide a 3-4 sentence summary.\n\
    Respond in well-structured markdown with a '### Recommended Courses' heading for the course list. \
    Also include a small JSON at the end with keys: recommended_courses (array of course codes), \
    short_term (array), long_term (array) for machine parsing.\n";

/// Fills the recommendation template.
pub fn recommendation_prompt(major: &str, evidence: &str) -> String {
    RECOMMENDATION_PROMPT_TEMPLATE
        .replace("{major}", major)
        .replace("{evidence}", evidence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_prompt_fills_placeholders() {
        let prompt = recommendation_prompt("electrical", "signals coursework");
        assert!(prompt.contains("'electrical'"));
        assert!(prompt.contains("Evidence: signals coursework"));
        assert!(!prompt.contains("{major}"));
        assert!(!prompt.contains("{evidence}"));
    }
}
