//! Synthesis of individual answers into one structured report

use std::fmt::Write as _;
use std::time::Duration;

use crate::llm::{GenerateRequest, GenerationConfig, LlmError, LlmProvider};

use super::catalog::{model_note, strip_web_search};
use super::fanout::ModelAnswer;

/// Output budget for the synthesis
pub const AGGREGATION_MAX_TOKENS: u32 = 5000;

pub const DEFAULT_AGGREGATION_TIMEOUT: Duration = Duration::from_secs(180);

/// Numbered list of answers as embedded in the synthesis prompt
pub fn format_answers(answers: &[ModelAnswer]) -> String {
    let mut formatted = String::new();
    for (idx, answer) in answers.iter().enumerate() {
        let note = model_note(&answer.model);
        // writing into a String cannot fail
        let _ = match &answer.error {
            Some(error) => writeln!(
                formatted,
                "\n{}. **{}**{}: [ERROR: {}]",
                idx + 1,
                answer.model,
                note,
                error
            ),
            None => writeln!(
                formatted,
                "\n{}. **{}**{}:\n{}",
                idx + 1,
                answer.model,
                note,
                answer.response
            ),
        };
    }
    formatted
}

pub fn build_aggregation_prompt(query: &str, answers: &[ModelAnswer]) -> String {
    format!(
        r###"You are synthesizing responses from multiple AI models that already performed web searches.

DO NOT perform any web searches yourself.
DO NOT include meta-commentary about your process (e.g., "I need to search...", "Now let me...", "Based on my searches...").
Present ONLY the final synthesis in the format below.

Original Query: {query}

Model Responses (already web-searched):
{responses}

Provide a structured synthesis following this exact format:

## KEY CONSENSUS
Facts and findings that 3+ models agree on. Include specific numbers, dates, and names where applicable. Cite sources.

## UNIQUE INSIGHTS
Information found by ONLY 1-2 models that adds unique value:
- Exclusive data points, statistics, or sources not mentioned by others
- Unique URLs, documents, or social media posts (especially X/Twitter from Grok)
- Novel angles or perspectives others missed
DO NOT repeat information already covered in Key Consensus.

## CONTRADICTIONS
Where models disagree on facts, predictions, or interpretations. Explain which models disagree and what evidence each provides.

## ACTIONABLE INTELLIGENCE
Concrete, specific takeaways:
- Immediate next steps (24-72 hour timeline)
- Key decision points to monitor
- Business/planning implications
- Specific people, organizations, or events to track

CRITICAL RULES:
- Work ONLY with the model responses provided above
- Do NOT search the web - the models already did that
- Do NOT include any process commentary or explanations about what you're doing
- Start directly with "## KEY CONSENSUS" (no preamble)
- Do not repeat the same facts across multiple sections
- Prioritize specificity (dates, names, numbers) and source citations from the model responses"###,
        query = query,
        responses = format_answers(answers),
    )
}

/// Ask `aggregator` to synthesize the answers.
///
/// The web-search suffix is stripped: the aggregator only works with what the
/// research models already found.
pub async fn aggregate(
    provider: &dyn LlmProvider,
    query: &str,
    answers: &[ModelAnswer],
    aggregator: &str,
    timeout: Duration,
) -> Result<String, LlmError> {
    let request = GenerateRequest::single_turn(
        strip_web_search(aggregator),
        build_aggregation_prompt(query, answers),
        GenerationConfig::new(AGGREGATION_MAX_TOKENS),
    );

    let response = tokio::time::timeout(timeout, provider.generate(request))
        .await
        .map_err(|_| LlmError::Timeout(timeout))??;
    Ok(response.content)
}

/// Text stored in place of a synthesis when the aggregator fails
pub fn aggregation_failure_text(err: &LlmError) -> String {
    format!("Error during aggregation: {}", err)
}
