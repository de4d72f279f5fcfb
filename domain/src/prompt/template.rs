//! Prompt templates for the deliberation flow.
//!
//! All builders are pure: the same inputs always produce the same text.

use crate::deliberation::assessment::ChairmanAssessment;
use crate::deliberation::response::ModelResponse;

/// JSON record every council member must produce.
const RESPONSE_FORMAT: &str = r#"```json
{
  "summary": "A short summary of your thinking this round",
  "viewpoints": [
    "Your main viewpoint 1",
    "Your main viewpoint 2"
  ],
  "conflicts": [
    "Where you differ from other views (if anywhere)"
  ],
  "suggestions": [
    "What you think should be added or corrected"
  ],
  "final_answer_candidate": "Your candidate final answer, if you have one"
}
```"#;

/// Additional sections required in convergent rounds.
const ANALYSIS_FORMAT: &str = r#"```json
{
  "consensus_analysis": [
    {
      "consensus_point": "The consensus point being analyzed",
      "agreement_level": "fully agree | partially agree | disagree",
      "supplement": "Supporting detail or evidence",
      "conditions": "Conditions under which the point holds",
      "deeper_insight": "A deeper insight on the point"
    }
  ],
  "conflict_analysis": [
    {
      "conflict_point": "The conflict point being analyzed",
      "your_position": "The position you take",
      "reconciliation_approach": "How the positions could be reconciled",
      "root_cause": "Why the disagreement exists",
      "impact_assessment": "What depends on resolving it"
    }
  ]
}
```"#;

const OUTPUT_RULES: &str = r#"## Output rules
1. Respond with the JSON object only, no explanatory text around it
2. Do not copy other participants' wording; use your own
3. Keep the reasoning clear and structured"#;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// Prompt for the k-th speaker of the divergent round.
    ///
    /// `preceding` holds the responses already produced this round, in
    /// speaking order. Failed predecessors are simply absent. A parsed
    /// predecessor is shown as pretty-printed JSON of its record, an
    /// unparsed one by its raw text.
    pub fn divergent_prompt(question: &str, preceding: &[ModelResponse]) -> String {
        let mut prompt = format!(
            r#"# Role and task

You are one participant in a multi-model council, taking part in the divergent
phase of a discussion. Give your own view of the user's question, reason about
what has already been said, and answer in the structured JSON format below.

# Output format

You must follow this JSON format exactly:

{RESPONSE_FORMAT}

{OUTPUT_RULES}

# Discussion so far
"#
        );

        if preceding.is_empty() {
            prompt.push_str("\nNo participant has spoken yet.\n");
        } else {
            for (i, response) in preceding.iter().enumerate() {
                prompt.push_str(&format!("\n## Participant {}\n\n", i + 1));
                prompt.push_str(&Self::embed_response(response));
                prompt.push('\n');
            }
        }

        prompt.push_str(&format!("\n# This round\n\n## Question\n{question}\n\n## Your task\n"));
        if preceding.is_empty() {
            prompt.push_str(
                "You are the first speaker. Open the discussion:\n\
                 - Analyze the question from several angles\n\
                 - Lay a foundation the next participants can build on\n",
            );
        } else {
            prompt.push_str(
                "Build on the views above:\n\
                 - Consider where you agree and where you differ\n\
                 - Add new insights or angles that are still missing\n",
            );
        }

        prompt.push_str("\nRespond now, strictly in the JSON format above.");
        prompt
    }

    /// Prompt shared by every council member in a convergent round.
    pub fn convergent_prompt(
        question: &str,
        consensus_points: &[String],
        conflict_points: &[String],
        questions: &[String],
    ) -> String {
        let mut prompt = format!(
            r#"# Role and task

You are one participant in a multi-model council, taking part in the convergent
phase of a discussion. Answer this round's questions, help the discussion
settle, and take a clear position on every open point.

# Output format

You must follow this JSON format exactly:

{RESPONSE_FORMAT}

In addition, include one analysis item per consensus point and per conflict
point listed below:

{ANALYSIS_FORMAT}

For each consensus point state your agreement level, supporting detail, the
conditions under which it holds, and any deeper insight. For each conflict
point state the position you take, how it could be reconciled, its root cause,
and its impact.

{OUTPUT_RULES}

# Chairman summary of the previous round

## Consensus points
"#
        );

        push_bullets(&mut prompt, consensus_points);
        prompt.push_str("\n## Conflict points\n");
        push_bullets(&mut prompt, conflict_points);

        prompt.push_str(&format!(
            "\n# This round\n\n## Question\n{question}\n\n## Questions you must answer\n"
        ));
        for (i, q) in questions.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, q));
        }

        prompt.push_str("\nRespond now, strictly in the JSON format above.");
        prompt
    }

    /// Evaluation prompt for the chairman.
    ///
    /// From round 2 on, the previous assessment is embedded as a comparison
    /// context so the chairman can judge how the discussion moved.
    pub fn chairman_prompt(
        question: &str,
        responses: &[ModelResponse],
        round: u32,
        previous: Option<&ChairmanAssessment>,
    ) -> String {
        let mut prompt = String::from(
            r#"# Role

You are the chairman of a multi-model council. You guide the discussion and
judge whether it has converged.

# Tasks

1. Analyze the participants' latest responses: extract the consensus points
   (what they share) and the conflict points (where they still differ).
2. Judge whether the discussion has converged. Convergence means the
   discussion has stabilized, not that everyone agrees:
   - no significant new key viewpoints are appearing
   - the remaining disagreements are stable and clear, not spreading
   - a stable framework of consensus and conflict points exists
   - the information is sufficient for a high-quality synthesized answer
3. If converged, write the final integrated conclusion. If not, write the
   specific questions the next round must answer.

# Scoring

Score each dimension from 0.0 to 1.0; each weighs 25% of the stability score:

1. viewpoint_evolution: have new key viewpoints stopped appearing?
2. conflict_management: are conflicts being resolved rather than multiplying?
3. structural_consistency: is the consensus/conflict framework stable?
4. information_sufficiency: is there enough to write a high-quality answer?

`stability_score` is the weighted aggregate of the four dimensions.

# Output format

You must follow this JSON format exactly:

```json
{
  "stability_score": 0.0,
  "dimension_scores": {
    "viewpoint_evolution": 0.0,
    "conflict_management": 0.0,
    "structural_consistency": 0.0,
    "information_sufficiency": 0.0
  },
  "is_converged": false,
  "consensus_points": ["consensus point 1", "consensus point 2"],
  "conflict_points": ["conflict point 1", "conflict point 2"],
  "explanation": "Why you judge the discussion converged or not, per dimension",
  "questions_for_next_round": ["question 1", "question 2"],
  "final_integrated_conclusion": "The final synthesized answer, if converged"
}
```

## Output rules
- If `is_converged` is true you must provide `final_integrated_conclusion`
- If `is_converged` is false you must provide `questions_for_next_round`
- Respond with the JSON object only
"#,
        );

        if round > 1
            && let Some(previous) = previous
        {
            prompt.push_str("\n# Comparison with the previous round\n\n");
            prompt.push_str(&Self::comparison_context(previous));
        }

        prompt.push_str(&format!(
            "\n# Material\n\n## Question\n{question}\n\n## Responses in round {round}\n"
        ));
        if responses.is_empty() {
            prompt.push_str("\nNo participant produced a response this round.\n");
        }
        for response in responses {
            prompt.push_str(&format!("\n### {}\n{}\n", response.model, response.response));
        }

        prompt.push_str("\nAnalyze the material now and respond strictly in the JSON format above.");
        prompt
    }

    /// Summary of the previous assessment for the chairman to compare against.
    pub fn comparison_context(previous: &ChairmanAssessment) -> String {
        let mut context = format!(
            "Previous stability score: {:.2}\n\n## Previous consensus points\n",
            previous.stability_score
        );
        push_bullets(&mut context, &previous.consensus_points);
        context.push_str("\n## Previous conflict points\n");
        push_bullets(&mut context, &previous.conflict_points);
        context.push_str("\n## Questions asked for this round\n");
        push_bullets(&mut context, previous.next_questions());
        context.push_str(&format!(
            "\n## Previous explanation\n{}\n",
            if previous.explanation.is_empty() {
                "(none)"
            } else {
                previous.explanation.as_str()
            }
        ));
        context
    }

    fn embed_response(response: &ModelResponse) -> String {
        match response.structured() {
            Some(record) => match serde_json::to_string_pretty(record) {
                Ok(json) => format!("```json\n{json}\n```\n"),
                Err(_) => format!("{}\n", response.response),
            },
            None => format!("{}\n", response.response),
        }
    }
}

fn push_bullets(out: &mut String, items: &[String]) {
    if items.is_empty() {
        out.push_str("- (none)\n");
    }
    for item in items {
        out.push_str(&format!("- {item}\n"));
    }
}
