// Prompt fragments shared by every Gemini call. Feature-specific templates
// live next to the feature (see `practice/prompts.rs`).

/// System instruction for calls whose reply is parsed as a JSON object.
pub const JSON_ONLY_SYSTEM: &str = "You are an experienced technical interviewer \
    reviewing a candidate's answer. \
    Reply with a single JSON object and nothing else. \
    No markdown, no code fences, no commentary before or after the object.";
