// Shared prompt fragments. Each service that needs LLM calls defines its own
// prompts.rs alongside it; this file holds the cross-cutting pieces.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction that keeps the interviewer persona away from protected attributes.
pub const UNBIASED_INSTRUCTION: &str = "Personal details in the resume have been replaced \
    with placeholders such as [EMAIL] or [CANDIDATE NAME]. Never ask about them and never \
    base a question on age, gender, origin, or any other personal attribute.";
