//! Prompt templates for discovery
//!
//! PRIVATE MODULE - Not exported from crate

use regex::{Captures, Regex};
use std::sync::LazyLock;

pub const KEYWORD_QUERIES: &str = include_str!("../assets/prompts/keyword_queries.txt");
pub const SEARCH_PLAN: &str = include_str!("../assets/prompts/search_plan.txt");
pub const FANOUT: &str = include_str!("../assets/prompts/fanout.txt");
pub const SCHEMA_VALIDATION: &str = include_str!("../assets/prompts/schema_validation.txt");
pub const RELEVANCE_SCORE: &str = include_str!("../assets/prompts/relevance_score.txt");

static PLACEHOLDER_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").ok());

/// Fill `{name}` placeholders in one pass. Substituted values are never
/// rescanned, and placeholders without a matching var are left as-is.
pub fn format_prompt(template: &str, vars: &[(&str, &str)]) -> String {
    let Some(pattern) = PLACEHOLDER_PATTERN.as_ref() else {
        return template.to_string();
    };
    pattern
        .replace_all(template, |caps: &Captures| {
            vars.iter()
                .find(|(key, _)| *key == &caps[1])
                .map_or_else(|| caps[0].to_string(), |(_, value)| value.to_string())
        })
        .into_owned()
}
