//! Prompt rewriting with a cheap offline model

use chrono::NaiveDate;
use std::time::Duration;

use crate::llm::{GenerateRequest, GenerationConfig, LlmError, LlmProvider};

use super::catalog::OPTIMIZER_MODEL;

pub const OPTIMIZER_MAX_TOKENS: u32 = 600;

/// Low temperature keeps the output format consistent
pub const OPTIMIZER_TEMPERATURE: f32 = 0.5;

pub const DEFAULT_OPTIMIZER_TIMEOUT: Duration = Duration::from_secs(60);

/// Lines containing any of these (lowercased) are model commentary, not prompt
const PREAMBLE_PHRASES: &[&str] = &[
    "i'll first",
    "i'll optimize",
    "based on",
    "rationale for",
    "here's the optimized",
    "here's an optimized",
    "the prompt provides",
];

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedPrompt {
    pub optimized: String,
    pub model: &'static str,
    /// Total tokens billed for the call
    pub tokens: u32,
}

/// Render a date the way the prompt asks models to cite it, e.g. `November 10, 2025`
pub fn format_today(today: NaiveDate) -> String {
    today.format("%B %d, %Y").to_string()
}

pub fn build_optimization_prompt(prompt: &str, today: NaiveDate) -> String {
    let today = format_today(today);
    format!(
        r#"You are a prompt optimization assistant for a multi-model AI research tool. The tool queries 5 AI models in parallel (with web search enabled) and synthesizes their responses.

IMPORTANT CONTEXT:
- Today's actual date is: {today}
- The research models will do web searches, not you
- Your job is to optimize the prompt structure, not to search for information

USER'S ORIGINAL PROMPT:
{prompt}

TASK: Rewrite this prompt to get maximum value from web-enabled AI models. Apply these principles:

1. FIX ERRORS: Correct any typos or grammatical mistakes

2. ADD STRUCTURE: Break complex queries into numbered sections (e.g., 1. X, 2. Y, 3. Z)

3. INCREASE SPECIFICITY:
   - For CURRENT EVENTS (e.g., "latest", "current", "today", "recent news", ongoing situations):
     Add "as of {today}" to the prompt
   - For HISTORICAL QUERIES (e.g., "2008 crisis", "World War II", queries about past events with dates):
     Keep the historical timeframe, DO NOT add current dates
   - For queries asking to "compare past to present", add {today} only for the present-day portion
   - Name specific companies, people, metrics instead of generic terms
   - Request quantifiable data (percentages, dollar amounts, counts)

4. DEMAND SOURCES: Add "Cite sources with links" or "Provide specific sources"

5. GUIDE OUTPUT: Specify what format/details you want (timelines, predictions, comparisons)

CRITICAL RULES:
- Determine if this is current/historical based on keywords in the prompt (don't search, just analyze the text)
- Only add {today} for genuinely current/ongoing events
- Keep the core intent and topic the same
- Don't make it overly long (aim for 3-8 lines for simple queries, longer OK for complex multi-part questions)
- Don't add unnecessary complexity if the original is already clear
- If the original is already well-structured, make minimal changes

OUTPUT: Return ONLY the optimized prompt text, no explanations or meta-commentary.

EXAMPLE BAD OUTPUT (do NOT do this):
"I'll analyze this prompt... Based on the keywords, here's the optimized version: [prompt]"

EXAMPLE GOOD OUTPUT (do this):
"[Just the optimized prompt with no preamble or explanation]"
"#
    )
}

fn is_preamble(line: &str) -> bool {
    let lower = line.to_lowercase();
    PREAMBLE_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// Strip commentary that slips through despite the instructions.
///
/// A matching line is dropped along with the lines after it, until a
/// non-blank line that does not start with a space resumes the prompt.
pub fn clean_optimized(text: &str) -> String {
    let mut kept = Vec::new();
    let mut skipping = false;

    for line in text.trim().split('\n') {
        if is_preamble(line) {
            skipping = true;
            continue;
        }
        if skipping && !line.trim().is_empty() && !line.starts_with(' ') {
            skipping = false;
        }
        if !skipping {
            kept.push(line);
        }
    }

    kept.join("\n").trim().to_string()
}

/// Rewrite `prompt` for the research models
pub async fn optimize(
    provider: &dyn LlmProvider,
    prompt: &str,
    today: NaiveDate,
    timeout: Duration,
) -> Result<OptimizedPrompt, LlmError> {
    let request = GenerateRequest::single_turn(
        OPTIMIZER_MODEL,
        build_optimization_prompt(prompt, today),
        GenerationConfig::new(OPTIMIZER_MAX_TOKENS).with_temperature(OPTIMIZER_TEMPERATURE),
    );

    let response = tokio::time::timeout(timeout, provider.generate(request))
        .await
        .map_err(|_| LlmError::Timeout(timeout))??;

    Ok(OptimizedPrompt {
        optimized: clean_optimized(&response.content),
        model: OPTIMIZER_MODEL,
        tokens: response.total_tokens(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 7).unwrap()
    }

    #[test]
    fn test_format_today() {
        assert_eq!(format_today(date()), "November 07, 2025");
    }

    #[test]
    fn test_prompt_injects_date_and_original() {
        let prompt = build_optimization_prompt("faa layoffs impact", date());
        assert!(prompt.contains("Today's actual date is: November 07, 2025"));
        assert!(prompt.contains("Add \"as of November 07, 2025\" to the prompt"));
        assert!(prompt.contains("USER'S ORIGINAL PROMPT:\nfaa layoffs impact\n"));
    }

    #[test]
    fn test_clean_leaves_plain_prompt_untouched() {
        let text = "  What is the latest on the FAA layoffs as of November 07, 2025?\n\nCite sources with links.  ";
        assert_eq!(
            clean_optimized(text),
            "What is the latest on the FAA layoffs as of November 07, 2025?\n\nCite sources with links."
        );
    }

    #[test]
    fn test_clean_drops_preamble_line() {
        let text = "Here's the optimized prompt:\nAnalyze airline stocks.\n1. Delta\n2. United";
        assert_eq!(clean_optimized(text), "Analyze airline stocks.\n1. Delta\n2. United");
    }

    #[test]
    fn test_clean_skips_indented_commentary_after_preamble() {
        let text = "Analyze the shutdown.\n\nRationale for changes:\n  - fixed typos\n  - added date\n\nCite sources.";
        assert_eq!(clean_optimized(text), "Analyze the shutdown.\n\nCite sources.");
    }

    #[test]
    fn test_clean_is_case_insensitive() {
        let text = "BASED ON the keywords this is current.\nLatest FAA news as of today.";
        assert_eq!(clean_optimized(text), "Latest FAA news as of today.");
    }
}
