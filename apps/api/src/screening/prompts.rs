// Prompt constants for interview-question synthesis.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Interviewer persona. The JSON-only and unbiased fragments are appended at call time.
pub const SYNTHESIS_SYSTEM: &str = "You are an unbiased technical interviewer for an AI \
    recruitment system. You see a candidate's anonymized resume, model score and skill \
    analysis, and you must generate interview questions and improvement tips.";

/// Exact reply shape the synthesizer parses.
pub const SYNTHESIS_REPLY_SHAPE: &str =
    r#"Respond in this exact format: {"questions": ["q1", "q2", "..."], "improvements": ["tip1", "tip2", "..."]}"#;

/// User prompt template. Replace `{domain}`, `{score}`, `{strengths}`,
/// `{improvements}` and `{resume_text}` before sending.
pub const SYNTHESIS_PROMPT_TEMPLATE: &str = r#"Candidate domain: {domain}
Model score (0-1): {score}

Strengths detected:
{strengths}

Improvement areas detected:
{improvements}

Resume text:
"""{resume_text}"""

Generate:
- 5 focused, domain-specific interview questions
- 3 very practical improvement tips
Return ONLY JSON with keys "questions" and "improvements"."#;
