/// Prompt for rating a candidate's answer against the reference answer.
/// Placeholders: {question}, {user_answer}, {correct_answer}.
pub const SCORING_PROMPT_TEMPLATE: &str = r#"
Question: "{question}"
User Answer: "{user_answer}"
Correct Answer: "{correct_answer}"
Please compare the user's answer to the correct answer, and provide a rating (from 1 to 10) based on answer quality, and offer feedback for improvement.
Return the result in JSON format with the fields "ratings" (number) and "feedback" (string).
"#;
