// Shared prompt fragments. Each service that calls the model keeps its own prompts.rs
// alongside it; this file only holds the cross-cutting pieces.

/// Instruction appended to every prompt that expects a structured answer.
/// Models do not reliably honour it, which is why responses go through recovery.
pub const JSON_ONLY_INSTRUCTION: &str = "Return ONLY the JSON. No extra commentary. \
    Do NOT use markdown code fences. Do NOT include explanations or apologies.";
