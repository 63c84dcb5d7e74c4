//! The pipeline's structured output: one `Verdict` per candidate.
//!
//! The final decision stage must produce JSON conforming to this schema.
//! Output that fails to parse or validate is a `SchemaViolation` — never
//! coerced, clamped, or silently defaulted.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::PipelineError;
use crate::llm_client::strip_json_fences;

/// One detected mismatch between CV and LinkedIn evidence for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub field: String,
    pub cv_value: String,
    pub linkedin_value: String,
    pub issue: String,
}

/// The screening decision, as a closed enum. `Select` and `Reject` are the
/// terminal values that trigger persistence; anything else the model says
/// lands in `Other` with the raw string preserved, so "no action" logging
/// shows exactly what was returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Select,
    Reject,
    Other(String),
}

impl Decision {
    /// Case-insensitive parse. `"SELECT"`, `"select"`, `" Select "` all map
    /// to `Select`; unrecognized values keep their raw form.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "select" => Decision::Select,
            "reject" => Decision::Reject,
            _ => Decision::Other(raw.to_string()),
        }
    }

    /// Whether this verdict triggers persistence to the tracking system.
    pub fn is_terminal(&self) -> bool {
        match self {
            Decision::Select | Decision::Reject => true,
            Decision::Other(_) => false,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Decision::Select => "Select",
            Decision::Reject => "Reject",
            Decision::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Decision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Decision {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Decision::parse(&raw))
    }
}

/// The final structured decision for one candidate. The pipeline's sole
/// externally visible output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "VerdictDraft")]
pub struct Verdict {
    pub verdict: Decision,
    pub justification: String,
    pub confidence_score: u8,
    pub matching_score: u8,
    pub discrepancies: Vec<Discrepancy>,
}

impl Verdict {
    /// Parses and validates the final decision stage's raw output.
    ///
    /// Strips markdown code fences first (models wrap JSON in them despite
    /// instructions), then parses and range-checks. Every failure is a
    /// `SchemaViolation` carrying the parser's or validator's detail.
    pub fn from_stage_output(output: &str) -> Result<Self, PipelineError> {
        let json = strip_json_fences(output);
        serde_json::from_str(json).map_err(|e| PipelineError::SchemaViolation {
            detail: e.to_string(),
        })
    }
}

/// Wire-shape draft: scores unbounded so range violations surface as our
/// validation error instead of a serde integer-width error.
#[derive(Debug, Deserialize)]
struct VerdictDraft {
    verdict: Decision,
    justification: String,
    confidence_score: i64,
    matching_score: i64,
    #[serde(default)]
    discrepancies: Vec<Discrepancy>,
}

impl TryFrom<VerdictDraft> for Verdict {
    type Error = PipelineError;

    fn try_from(draft: VerdictDraft) -> Result<Self, Self::Error> {
        Ok(Verdict {
            verdict: draft.verdict,
            justification: draft.justification,
            confidence_score: score_in_range("confidence_score", draft.confidence_score)?,
            matching_score: score_in_range("matching_score", draft.matching_score)?,
            discrepancies: draft.discrepancies,
        })
    }
}

fn score_in_range(field: &str, value: i64) -> Result<u8, PipelineError> {
    if (0..=100).contains(&value) {
        Ok(value as u8)
    } else {
        Err(PipelineError::SchemaViolation {
            detail: format!("{field} must be within 0..=100, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_output() -> String {
        r#"{
            "verdict": "Select",
            "justification": "Strong match on Django and PostgreSQL.",
            "confidence_score": 85,
            "matching_score": 78,
            "discrepancies": [
                {
                    "field": "Contact Email",
                    "cv_value": "jane@example.com",
                    "linkedin_value": "Not Found",
                    "issue": "Missing in LinkedIn"
                }
            ]
        }"#
        .to_string()
    }

    #[test]
    fn parses_valid_output() {
        let verdict = Verdict::from_stage_output(&valid_output()).unwrap();
        assert_eq!(verdict.verdict, Decision::Select);
        assert_eq!(verdict.confidence_score, 85);
        assert_eq!(verdict.matching_score, 78);
        assert_eq!(verdict.discrepancies.len(), 1);
        assert_eq!(verdict.discrepancies[0].field, "Contact Email");
    }

    #[test]
    fn parses_output_wrapped_in_code_fences() {
        let fenced = format!("```json\n{}\n```", valid_output());
        let verdict = Verdict::from_stage_output(&fenced).unwrap();
        assert_eq!(verdict.verdict, Decision::Select);
    }

    #[test]
    fn missing_required_field_is_schema_violation() {
        let output = r#"{"verdict": "Select", "confidence_score": 85, "matching_score": 78}"#;
        let err = Verdict::from_stage_output(output).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaViolation { .. }));
    }

    #[test]
    fn out_of_range_score_is_rejected_not_clamped() {
        let output = r#"{
            "verdict": "Select",
            "justification": "x",
            "confidence_score": 120,
            "matching_score": 50
        }"#;
        let err = Verdict::from_stage_output(output).unwrap_err();
        let PipelineError::SchemaViolation { detail } = err else {
            panic!("expected schema violation");
        };
        assert!(detail.contains("confidence_score"), "detail was: {detail}");

        let output = r#"{
            "verdict": "Select",
            "justification": "x",
            "confidence_score": 50,
            "matching_score": -1
        }"#;
        assert!(matches!(
            Verdict::from_stage_output(output),
            Err(PipelineError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn non_json_output_is_schema_violation() {
        let err = Verdict::from_stage_output("I think we should hire her.").unwrap_err();
        assert!(matches!(err, PipelineError::SchemaViolation { .. }));
    }

    #[test]
    fn missing_discrepancies_defaults_to_empty() {
        let output = r#"{
            "verdict": "Reject",
            "justification": "Skills mismatch.",
            "confidence_score": 60,
            "matching_score": 20
        }"#;
        let verdict = Verdict::from_stage_output(output).unwrap();
        assert!(verdict.discrepancies.is_empty());
    }

    #[test]
    fn decision_parse_is_case_insensitive() {
        assert_eq!(Decision::parse("SELECT"), Decision::Select);
        assert_eq!(Decision::parse("select"), Decision::Select);
        assert_eq!(Decision::parse("Reject"), Decision::Reject);
        assert_eq!(Decision::parse(" reject "), Decision::Reject);
        assert_eq!(
            Decision::parse("Borderline"),
            Decision::Other("Borderline".to_string())
        );
    }

    #[test]
    fn only_select_and_reject_are_terminal() {
        assert!(Decision::Select.is_terminal());
        assert!(Decision::Reject.is_terminal());
        assert!(!Decision::Other("Maybe".to_string()).is_terminal());
        assert!(!Decision::Other(String::new()).is_terminal());
    }

    #[test]
    fn verdict_round_trips_through_json() {
        let verdict = Verdict::from_stage_output(&valid_output()).unwrap();
        let json = serde_json::to_string(&verdict).unwrap();
        let back: Verdict = serde_json::from_str(&json).unwrap();
        assert_eq!(verdict, back);
    }

    #[test]
    fn round_trip_preserves_empty_discrepancies_and_other_verdicts() {
        let verdict = Verdict {
            verdict: Decision::Other("Borderline".to_string()),
            justification: "Needs a second look.".to_string(),
            confidence_score: 0,
            matching_score: 100,
            discrepancies: vec![],
        };
        let json = serde_json::to_string(&verdict).unwrap();
        let back: Verdict = serde_json::from_str(&json).unwrap();
        assert_eq!(verdict, back);
    }
}
