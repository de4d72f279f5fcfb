//! Chairman assessments and verdict enforcement.
//!
//! The chairman is an untrusted component: it reports both a numeric
//! stability score and a boolean verdict, and the two can disagree.
//! [`ChairmanAssessment::enforce`] turns the chairman's raw claim
//! ([`RawAssessment`]) into the stored assessment, guaranteeing:
//!
//! - `is_converged` implies `stability_score >= threshold`
//! - `questions_for_next_round` is `Some` (and non-empty) iff not converged
//! - `final_integrated_conclusion` is `Some` iff converged
//!
//! Any change to the chairman's verdict is recorded in
//! [`ChairmanAssessment::correction`].

use super::policy::{ConvergencePolicy, HighScorePolicy};
use serde::{Deserialize, Deserializer, Serialize};

/// Question used when the chairman leaves no direction and there are no
/// recorded conflicts to derive one from.
const GENERIC_FOLLOW_UP: &str = "Which parts of the question remain unsettled, and what evidence or reasoning would settle them?";

/// Final answer when the round ceiling is reached and the chairman left
/// nothing to build one from.
pub const NO_CONVERGENCE_NOTICE: &str = "Maximum rounds reached without convergence.";

/// Conclusion for a converged verdict that came with no text at all.
const SILENT_CONVERGENCE_NOTICE: &str =
    "The council converged, but the chairman gave no written conclusion.";

/// The four evaluation dimensions, each weighted 25%.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionScores {
    /// Are previously unseen viewpoints still appearing?
    pub viewpoint_evolution: f64,
    /// Are prior conflicts being resolved rather than multiplying?
    pub conflict_management: f64,
    /// Is the consensus/conflict framework stable?
    pub structural_consistency: f64,
    /// Is a high-quality synthesis already possible?
    pub information_sufficiency: f64,
}

impl DimensionScores {
    /// Equal-weight aggregate of the four dimensions.
    pub fn weighted_average(&self) -> f64 {
        0.25 * (self.viewpoint_evolution
            + self.conflict_management
            + self.structural_consistency
            + self.information_sufficiency)
    }
}

/// The chairman's reply as parsed, before any enforcement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawAssessment {
    #[serde(alias = "convergence_score", deserialize_with = "lenient_score")]
    pub stability_score: f64,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_converged: bool,
    #[serde(default)]
    pub consensus_points: Vec<String>,
    #[serde(default)]
    pub conflict_points: Vec<String>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub questions_for_next_round: Option<Vec<String>>,
    #[serde(default)]
    pub final_integrated_conclusion: Option<String>,
    #[serde(default)]
    pub dimension_scores: Option<DimensionScores>,
}

/// Why the stored verdict differs from what the chairman claimed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssessmentCorrection {
    /// Convergence was claimed with a score below the threshold.
    BelowThreshold { threshold: f64 },
    /// Non-convergence was claimed with a score at or above the threshold,
    /// and the policy forces convergence.
    ForcedConvergence { threshold: f64 },
}

/// The stored, enforced assessment of one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChairmanAssessment {
    pub stability_score: f64,
    pub is_converged: bool,
    pub consensus_points: Vec<String>,
    pub conflict_points: Vec<String>,
    pub explanation: String,
    /// Present iff not converged
    pub questions_for_next_round: Option<Vec<String>>,
    /// Present iff converged
    pub final_integrated_conclusion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_scores: Option<DimensionScores>,
    /// The chairman's own verdict, before enforcement
    pub claimed_converged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<AssessmentCorrection>,
}

impl ChairmanAssessment {
    /// Apply threshold enforcement to a raw chairman reply.
    pub fn enforce(raw: RawAssessment, policy: &ConvergencePolicy) -> Self {
        let score = clamp_score(raw.stability_score);
        let meets = policy.meets_threshold(score);

        let (is_converged, correction) = match (raw.is_converged, meets) {
            (true, true) => (true, None),
            (true, false) => (
                false,
                Some(AssessmentCorrection::BelowThreshold {
                    threshold: policy.threshold(),
                }),
            ),
            (false, true) if policy.high_score_policy() == HighScorePolicy::ForceConvergence => (
                true,
                Some(AssessmentCorrection::ForcedConvergence {
                    threshold: policy.threshold(),
                }),
            ),
            (false, _) => (false, None),
        };

        let consensus_points = non_blank(raw.consensus_points);
        let conflict_points = non_blank(raw.conflict_points);
        let explanation = raw.explanation.trim().to_string();

        let (questions_for_next_round, final_integrated_conclusion) = if is_converged {
            let conclusion = raw
                .final_integrated_conclusion
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| {
                    or_notice(
                        best_effort_text(&explanation, &consensus_points),
                        SILENT_CONVERGENCE_NOTICE,
                    )
                });
            (None, Some(conclusion))
        } else {
            let questions = non_blank(raw.questions_for_next_round.unwrap_or_default());
            let questions = if questions.is_empty() {
                fallback_questions(&conflict_points)
            } else {
                questions
            };
            (Some(questions), None)
        };

        Self {
            stability_score: score,
            is_converged,
            consensus_points,
            conflict_points,
            explanation,
            questions_for_next_round,
            final_integrated_conclusion,
            dimension_scores: raw.dimension_scores,
            claimed_converged: raw.is_converged,
            correction,
        }
    }

    /// Questions the next convergent round must answer (empty when converged).
    pub fn next_questions(&self) -> &[String] {
        self.questions_for_next_round.as_deref().unwrap_or(&[])
    }

    /// Whether enforcement changed the chairman's verdict.
    pub fn was_corrected(&self) -> bool {
        self.correction.is_some()
    }

    /// Best-effort final answer built from the explanation and consensus
    /// points, used when the round ceiling is reached without convergence.
    /// Never blank.
    pub fn best_effort_conclusion(&self) -> String {
        or_notice(
            best_effort_text(&self.explanation, &self.consensus_points),
            NO_CONVERGENCE_NOTICE,
        )
    }

    /// The text that closes a turn ending on this assessment. Never blank.
    pub fn concluding_text(&self) -> String {
        match &self.final_integrated_conclusion {
            Some(conclusion) if self.is_converged && !conclusion.trim().is_empty() => {
                conclusion.clone()
            }
            _ => self.best_effort_conclusion(),
        }
    }
}

/// One follow-up question per unresolved conflict.
fn fallback_questions(conflict_points: &[String]) -> Vec<String> {
    if conflict_points.is_empty() {
        return vec![GENERIC_FOLLOW_UP.to_string()];
    }
    conflict_points
        .iter()
        .map(|point| {
            format!("How should this unresolved conflict be settled, and on what grounds: {point}?")
        })
        .collect()
}

fn best_effort_text(explanation: &str, consensus_points: &[String]) -> String {
    let mut text = explanation.to_string();
    if !consensus_points.is_empty() {
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        text.push_str("Points of consensus:\n");
        for point in consensus_points {
            text.push_str(&format!("- {point}\n"));
        }
    }
    text.trim_end().to_string()
}

fn or_notice(text: String, notice: &str) -> String {
    if text.trim().is_empty() {
        notice.to_string()
    } else {
        text
    }
}

fn non_blank(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Accepts `0.8`, `"0.8"`, `"85%"` and whole-number percentages such as `85`.
///
/// Any other value outside `0.0..=1.0` is returned as is and clamped by
/// [`ChairmanAssessment::enforce`].
fn lenient_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Value::deserialize(deserializer)?;
    match &value {
        serde_json::Value::Number(n) => match n.as_u64() {
            Some(whole) => Some(whole_number_score(whole)),
            None => n.as_f64(),
        },
        serde_json::Value::String(s) => {
            let s = s.trim();
            match s.strip_suffix('%') {
                Some(pct) => pct.trim().parse::<f64>().ok().map(|p| p / 100.0),
                None => match s.parse::<u64>() {
                    Ok(whole) => Some(whole_number_score(whole)),
                    Err(_) => s.parse::<f64>().ok(),
                },
            }
        }
        _ => None,
    }
    .ok_or_else(|| D::Error::custom(format!("stability_score is not a number: {value}")))
}

/// Whole numbers from 2 to 100 are percentages; `0` and `1` are already scores.
fn whole_number_score(whole: u64) -> f64 {
    if (2..=100).contains(&whole) {
        whole as f64 / 100.0
    } else {
        whole as f64
    }
}

/// Accepts `true` and `"true"` (case-insensitive).
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => Ok(b),
        serde_json::Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" => Ok(true),
            "false" | "no" => Ok(false),
            other => Err(D::Error::custom(format!("is_converged is not a boolean: {other}"))),
        },
        other => Err(D::Error::custom(format!(
            "is_converged is not a boolean: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(score: f64, converged: bool) -> RawAssessment {
        RawAssessment {
            stability_score: score,
            is_converged: converged,
            consensus_points: vec!["Both agree on A".to_string()],
            conflict_points: vec!["Cost of B".to_string(), "Timeline of C".to_string()],
            explanation: "Views are settling".to_string(),
            questions_for_next_round: None,
            final_integrated_conclusion: Some("Final answer".to_string()),
            dimension_scores: None,
        }
    }

    fn policy() -> ConvergencePolicy {
        ConvergencePolicy::new(0.85, 5).unwrap()
    }

    #[test]
    fn test_converged_above_threshold_is_kept() {
        let a = ChairmanAssessment::enforce(raw(0.9, true), &policy());
        assert!(a.is_converged);
        assert!(!a.was_corrected());
        assert_eq!(a.final_integrated_conclusion.as_deref(), Some("Final answer"));
        assert!(a.questions_for_next_round.is_none());
    }

    #[test]
    fn test_claimed_convergence_below_threshold_is_overridden() {
        let a = ChairmanAssessment::enforce(raw(0.6, true), &policy());
        assert!(!a.is_converged);
        assert!(a.claimed_converged);
        assert_eq!(
            a.correction,
            Some(AssessmentCorrection::BelowThreshold { threshold: 0.85 })
        );
        assert!(a.final_integrated_conclusion.is_none());
        // One synthesized question per conflict point
        let questions = a.questions_for_next_round.unwrap();
        assert_eq!(questions.len(), 2);
        assert!(questions[0].contains("Cost of B"));
        assert!(questions[1].contains("Timeline of C"));
    }

    #[test]
    fn test_override_keeps_supplied_questions() {
        let mut r = raw(0.5, true);
        r.questions_for_next_round = Some(vec!["What about D?".to_string()]);
        let a = ChairmanAssessment::enforce(r, &policy());
        assert_eq!(a.next_questions(), ["What about D?".to_string()]);
    }

    #[test]
    fn test_override_without_conflicts_uses_generic_question() {
        let mut r = raw(0.5, true);
        r.conflict_points.clear();
        r.questions_for_next_round = Some(vec!["   ".to_string()]);
        let a = ChairmanAssessment::enforce(r, &policy());
        assert_eq!(a.next_questions(), [GENERIC_FOLLOW_UP.to_string()]);
    }

    #[test]
    fn test_high_score_non_convergence_respected_by_default() {
        let a = ChairmanAssessment::enforce(raw(0.95, false), &policy());
        assert!(!a.is_converged);
        assert!(a.correction.is_none());
        assert!(!a.next_questions().is_empty());
    }

    #[test]
    fn test_high_score_non_convergence_forced_by_policy() {
        let policy = policy().with_high_score_policy(HighScorePolicy::ForceConvergence);
        let mut r = raw(0.95, false);
        r.final_integrated_conclusion = None;
        let a = ChairmanAssessment::enforce(r, &policy);
        assert!(a.is_converged);
        assert_eq!(
            a.correction,
            Some(AssessmentCorrection::ForcedConvergence { threshold: 0.85 })
        );
        let conclusion = a.final_integrated_conclusion.unwrap();
        assert!(conclusion.starts_with("Views are settling"));
        assert!(conclusion.contains("- Both agree on A"));
    }

    #[test]
    fn test_blank_assessment_still_concludes() {
        let blank = RawAssessment {
            stability_score: 0.3,
            is_converged: false,
            consensus_points: vec![],
            conflict_points: vec![],
            explanation: "  ".to_string(),
            questions_for_next_round: None,
            final_integrated_conclusion: None,
            dimension_scores: None,
        };

        let a = ChairmanAssessment::enforce(blank.clone(), &policy());
        assert_eq!(a.best_effort_conclusion(), NO_CONVERGENCE_NOTICE);
        assert_eq!(a.concluding_text(), NO_CONVERGENCE_NOTICE);

        let converged = RawAssessment {
            stability_score: 0.9,
            is_converged: true,
            final_integrated_conclusion: Some(String::new()),
            ..blank
        };
        let a = ChairmanAssessment::enforce(converged, &policy());
        assert!(a.is_converged);
        assert_eq!(
            a.final_integrated_conclusion.as_deref(),
            Some(SILENT_CONVERGENCE_NOTICE)
        );
        assert_eq!(a.concluding_text(), SILENT_CONVERGENCE_NOTICE);
    }

    #[test]
    fn test_score_is_clamped() {
        let a = ChairmanAssessment::enforce(raw(1.7, true), &policy());
        assert_eq!(a.stability_score, 1.0);
        let a = ChairmanAssessment::enforce(raw(-0.2, false), &policy());
        assert_eq!(a.stability_score, 0.0);
        let a = ChairmanAssessment::enforce(raw(f64::NAN, true), &policy());
        assert_eq!(a.stability_score, 0.0);
        assert!(!a.is_converged);
    }

    #[test]
    fn test_lenient_fields() {
        let json = r#"{"convergence_score": "0.9", "is_converged": "true"}"#;
        let r: RawAssessment = serde_json::from_str(json).unwrap();
        assert_eq!(r.stability_score, 0.9);
        assert!(r.is_converged);

        let json = r#"{"stability_score": "72%", "is_converged": false}"#;
        let r: RawAssessment = serde_json::from_str(json).unwrap();
        assert!((r.stability_score - 0.72).abs() < 1e-9);

        let json = r#"{"stability_score": 80, "is_converged": false}"#;
        let r: RawAssessment = serde_json::from_str(json).unwrap();
        assert!((r.stability_score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_fractional_score_above_one_is_clamped_not_scaled() {
        let r = crate::parse_assessment(
            r#"{"stability_score": 1.7, "is_converged": true, "final_integrated_conclusion": "Done"}"#,
        )
        .unwrap();
        assert_eq!(r.stability_score, 1.7);

        let a = ChairmanAssessment::enforce(r, &ConvergencePolicy::default());
        assert_eq!(a.stability_score, 1.0);
        assert!(a.is_converged);
        assert!(a.correction.is_none());
    }

    #[test]
    fn test_whole_number_scores() {
        let r = crate::parse_assessment(r#"{"stability_score": 85, "is_converged": true}"#).unwrap();
        assert!((r.stability_score - 0.85).abs() < 1e-9);
        let a = ChairmanAssessment::enforce(r, &ConvergencePolicy::default());
        assert!(a.is_converged);

        let r = crate::parse_assessment(r#"{"stability_score": 1, "is_converged": true}"#).unwrap();
        assert_eq!(r.stability_score, 1.0);

        let r = crate::parse_assessment(r#"{"stability_score": "85", "is_converged": false}"#)
            .unwrap();
        assert!((r.stability_score - 0.85).abs() < 1e-9);

        let r = crate::parse_assessment(r#"{"stability_score": 250, "is_converged": false}"#)
            .unwrap();
        let a = ChairmanAssessment::enforce(r, &ConvergencePolicy::default());
        assert_eq!(a.stability_score, 1.0);
    }

    #[test]
    fn test_missing_score_is_rejected() {
        let json = r#"{"is_converged": true}"#;
        assert!(serde_json::from_str::<RawAssessment>(json).is_err());
    }

    #[test]
    fn test_dimension_average() {
        let scores = DimensionScores {
            viewpoint_evolution: 0.8,
            conflict_management: 0.6,
            structural_consistency: 1.0,
            information_sufficiency: 0.6,
        };
        assert!((scores.weighted_average() - 0.75).abs() < 1e-9);
    }
}
