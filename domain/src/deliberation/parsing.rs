//! Structured-output parsing for council members and the chairman.
//!
//! Models are asked for a bare JSON object but routinely wrap it in a
//! Markdown code fence or add a sentence around it. Both readers here first
//! strip a surrounding fence, then fall back to the outermost `{...}` span.
//!
//! | Function | Input | Failure |
//! |----------|-------|---------|
//! | [`validate_response`] | council member reply | [`ParsedResponse::Fallback`] |
//! | [`parse_assessment`] | chairman reply | `Err(reason)` |

use super::assessment::RawAssessment;
use super::entities::Phase;
use super::response::{ParsedResponse, StructuredResponse};

/// Keys every council member record must carry.
pub const REQUIRED_RESPONSE_FIELDS: [&str; 5] = [
    "summary",
    "viewpoints",
    "conflicts",
    "suggestions",
    "final_answer_candidate",
];

/// Read a council member's raw output as a [`StructuredResponse`].
///
/// Any structural violation (invalid JSON, a missing required key, a field
/// of the wrong type) yields [`ParsedResponse::Fallback`]. In the divergent
/// phase the per-point analysis sections are not requested and are dropped
/// if a model volunteers them.
pub fn validate_response(raw: &str, phase: Phase) -> ParsedResponse {
    let Some(value) = extract_json_object(raw) else {
        return ParsedResponse::Fallback;
    };

    if REQUIRED_RESPONSE_FIELDS
        .iter()
        .any(|field| value.get(field).is_none())
    {
        return ParsedResponse::Fallback;
    }

    match serde_json::from_value::<StructuredResponse>(value) {
        Ok(mut record) => {
            if phase == Phase::Divergent {
                record.consensus_analysis.clear();
                record.conflict_analysis.clear();
            }
            ParsedResponse::Valid(record)
        }
        Err(_) => ParsedResponse::Fallback,
    }
}

/// Read the chairman's raw output.
///
/// Returns a human-readable reason when the reply is not JSON or lacks
/// `stability_score` (alias `convergence_score`) or `is_converged`.
pub fn parse_assessment(raw: &str) -> Result<RawAssessment, String> {
    let value = extract_json_object(raw)
        .ok_or_else(|| "chairman reply does not contain a JSON object".to_string())?;

    if value.get("stability_score").is_none() && value.get("convergence_score").is_none() {
        return Err("chairman reply is missing stability_score".to_string());
    }
    if value.get("is_converged").is_none() {
        return Err("chairman reply is missing is_converged".to_string());
    }

    serde_json::from_value(value).map_err(|e| format!("chairman reply is malformed: {e}"))
}

/// Strip one surrounding Markdown code fence (with or without a language tag).
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the language tag line, if any
    let body = match rest.find('\n') {
        Some(newline) if !rest[..newline].trim().contains(['{', '[']) => &rest[newline + 1..],
        _ => rest.strip_prefix("json").unwrap_or(rest),
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Find a JSON object in model output.
fn extract_json_object(raw: &str) -> Option<serde_json::Value> {
    let cleaned = strip_code_fence(raw);
    if let Ok(value @ serde_json::Value::Object(_)) = serde_json::from_str(cleaned) {
        return Some(value);
    }

    // Prose around the object: take the outermost braces
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str(&raw[start..=end]) {
        Ok(value @ serde_json::Value::Object(_)) => Some(value),
        _ => None,
    }
}
