// Cross-cutting prompt fragments shared by the pipeline stages.
// Each stage defines its own prompts in pipeline/prompts.rs; this file holds
// the pieces that apply to more than one of them.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction for stages whose input documents may have failed extraction.
/// The stage receives an explanatory string instead of document text and
/// must still produce an assessment rather than refuse.
pub const DEGRADED_EVIDENCE_INSTRUCTION: &str = "\
    If a document section below contains an extraction error or warning \
    instead of document text, treat that evidence as missing: state what \
    could not be assessed, lower your confidence accordingly, and continue \
    with whatever evidence remains. Do not refuse to answer.";
