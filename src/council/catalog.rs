//! Model allow-lists and per-model policy

use std::time::Duration;

/// Suffix asking OpenRouter for web-search-augmented inference
pub const WEB_SEARCH_SUFFIX: &str = ":online";

/// Models a user may fan a prompt out to
pub const QUERY_MODELS: &[&str] = &[
    "openai/gpt-4o:online",
    "anthropic/claude-sonnet-4.5:online",
    // searches natively, no suffix needed
    "perplexity/sonar-pro",
    "x-ai/grok-4:online",
    "meta-llama/llama-3.1-70b-instruct:online",
];

/// Synthesis-only model, accepted as aggregator but not for fan-out
const AGGREGATOR_ONLY_MODELS: &[&str] = &["deepseek/deepseek-chat:online"];

pub const DEFAULT_AGGREGATOR: &str = "anthropic/claude-sonnet-4.5";

/// Cheap model used to rewrite prompts
pub const OPTIMIZER_MODEL: &str = "anthropic/claude-3.5-haiku";

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Grok models need extra time for their X/Twitter search integration
pub const DEFAULT_SLOW_QUERY_TIMEOUT: Duration = Duration::from_secs(120);

/// Every model accepted as aggregator, in display order
pub fn aggregator_models() -> Vec<&'static str> {
    QUERY_MODELS
        .iter()
        .chain(AGGREGATOR_ONLY_MODELS)
        .copied()
        .collect()
}

pub fn is_query_model(model: &str) -> bool {
    QUERY_MODELS.contains(&model)
}

/// Aggregators are compared without the web-search suffix, since synthesis
/// always runs offline.
pub fn is_aggregator_model(model: &str) -> bool {
    let wanted = strip_web_search(model);
    QUERY_MODELS
        .iter()
        .chain(AGGREGATOR_ONLY_MODELS)
        .any(|m| strip_web_search(m) == wanted)
}

pub fn strip_web_search(model: &str) -> String {
    model.replace(WEB_SEARCH_SUFFIX, "")
}

/// Capability hint shown to the aggregator next to a model's answer
pub fn model_note(model: &str) -> &'static str {
    match model {
        "anthropic/claude-sonnet-4.5:online" => " (strong reasoning, detailed analysis)",
        "x-ai/grok-4:online" => " (real-time X/Twitter access)",
        "perplexity/sonar-pro" => " (native web search with citations)",
        _ => "",
    }
}

/// Per-model deadlines for the fan-out phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTimeouts {
    pub default: Duration,
    pub slow: Duration,
}

impl QueryTimeouts {
    pub fn for_model(&self, model: &str) -> Duration {
        if model.to_lowercase().contains("grok") {
            self.slow
        } else {
            self.default
        }
    }
}

impl Default for QueryTimeouts {
    fn default() -> Self {
        Self {
            default: DEFAULT_QUERY_TIMEOUT,
            slow: DEFAULT_SLOW_QUERY_TIMEOUT,
        }
    }
}
